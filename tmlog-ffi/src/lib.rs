//! # tmlog-ffi
//! C entry points forwarding messages to the tmlog process logger.
//!
//! The library builds as a `cdylib` and a `staticlib`; `include/tmlog.h`
//! declares the exported functions for C and C++ hosts.
//!
//! ```c
//! #include "tmlog.h"
//!
//! tm_log_info("hello");
//! tm_log_error("boom");
//! ```

use std::ffi::{CStr, c_char};

use log::Level;
use tmlog::{Logger, process_logger};

/// Converts `msg` and hands it to `logger` at `level`.
///
/// Invalid UTF-8 is replaced with U+FFFD. A null `msg` is ignored.
///
/// # Safety
/// `msg` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn forward(logger: &dyn Logger, level: Level, msg: *const c_char) {
    if msg.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    let message = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
    match level {
        Level::Error => logger.error(&message),
        Level::Debug => logger.debug(&message),
        _ => logger.info(&message),
    }
}

/// Writes `msg` to the process logger at info level.
///
/// # Safety
/// `msg` must be null or a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tm_log_info(msg: *const c_char) {
    unsafe { forward(process_logger(), Level::Info, msg) }
}

/// Writes `msg` to the process logger at debug level.
///
/// # Safety
/// `msg` must be null or a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tm_log_debug(msg: *const c_char) {
    unsafe { forward(process_logger(), Level::Debug, msg) }
}

/// Writes `msg` to the process logger at error level.
///
/// # Safety
/// `msg` must be null or a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tm_log_error(msg: *const c_char) {
    unsafe { forward(process_logger(), Level::Error, msg) }
}
