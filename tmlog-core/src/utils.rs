use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded, unbounded};

use crate::{config::TMLOG_CONFIG, log_writer::LogWriter};

/// Guard that ensures background writers are shut down when dropped.
/// Hold this guard for the lifetime of your logging session.
pub struct LoggerGuard {
    senders: Vec<Arc<LogSender>>,
}

impl LoggerGuard {
    pub fn new(senders: Vec<Arc<LogSender>>) -> Self {
        Self { senders }
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        for sender in &self.senders {
            sender.shutdown();
        }
    }
}

/// Instruction for a writer thread.
#[derive(Debug)]
pub enum LogCommand {
    /// A rendered line, without trailing newline.
    Line(String),
    /// Flush the writer, then acknowledge.
    Flush(Sender<()>),
    Shutdown,
}

pub struct LogSender {
    sender: Sender<LogCommand>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for LogSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl LogSender {
    pub fn new(sender: Sender<LogCommand>, handler: JoinHandle<()>) -> Self {
        Self {
            sender,
            handler: Mutex::new(Some(handler)),
        }
    }

    /// Queues a line. Lines sent after shutdown are dropped.
    pub fn send_line(&self, line: String) {
        self.sender.send(LogCommand::Line(line)).ok();
    }

    /// Blocks until every line queued before this call has been written and flushed.
    pub fn flush(&self) {
        let (ack, done) = bounded(1);
        if self.sender.send(LogCommand::Flush(ack)).is_ok() {
            done.recv().ok();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Writes out pending lines and joins the writer thread. Later calls are no-ops.
    pub fn shutdown(&self) {
        let mut guard = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = guard.take() {
            self.sender.send(LogCommand::Shutdown).ok();
            handle.join().ok();
        }
    }
}

pub fn spawn_log_thread<W: LogWriter + Send + 'static>(mut writer: W) -> LogSender {
    let (sender, receiver) = unbounded::<LogCommand>();
    let handler = std::thread::spawn(move || {
        let batch_size = TMLOG_CONFIG.BATCH_SIZE.max(1);
        let flush_interval = Duration::from_millis(TMLOG_CONFIG.FLUSH_INTERVAL_MS);
        let mut batch = Vec::with_capacity(batch_size);
        let mut last_flush = Instant::now();
        loop {
            let timeout = flush_interval
                .saturating_sub(last_flush.elapsed())
                .max(Duration::from_millis(1));

            match receiver.recv_timeout(timeout) {
                Ok(command) => {
                    batch.push(command);
                    while batch.len() < batch_size {
                        match receiver.try_recv() {
                            Ok(command) => batch.push(command),
                            Err(_) => break,
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_flush.elapsed() >= flush_interval {
                        writer.flush();
                        last_flush = Instant::now();
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    writer.flush();
                    break;
                }
            }

            let mut should_shutdown = false;
            for command in batch.drain(..) {
                match command {
                    LogCommand::Line(line) => writer.regular(&line),
                    LogCommand::Flush(ack) => {
                        writer.flush();
                        last_flush = Instant::now();
                        ack.send(()).ok();
                    }
                    LogCommand::Shutdown => {
                        should_shutdown = true;
                        break;
                    }
                }
            }

            if should_shutdown || last_flush.elapsed() >= flush_interval {
                writer.flush();
                last_flush = Instant::now();
            }

            if should_shutdown {
                break;
            }
        }
    });
    LogSender::new(sender, handler)
}
