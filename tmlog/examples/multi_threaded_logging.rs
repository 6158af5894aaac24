use tmlog::{Logger, logger_config, process_logger};

fn main() {
    process_logger().info("Hello from the process logger!");

    let (file_logger, _guard) = logger_config()
        .with_name("workers")
        .with_log_file("/tmp/tmlog_workers.log")
        .unwrap()
        .in_background()
        .build_with_guard();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let logger = file_logger.with("worker", i);
            std::thread::spawn(move || {
                logger.debug("starting");
                logger.info(&format!("Hello, world from worker {i}!"));
                if i == 4 {
                    logger.error("worker 4 always fails");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    file_logger.flush();
    process_logger().info(&format!(
        "last line of /tmp/tmlog_workers.log is:\n\t{}",
        std::fs::read_to_string("/tmp/tmlog_workers.log")
            .unwrap()
            .trim_end()
            .lines()
            .last()
            .unwrap()
    ));
}
