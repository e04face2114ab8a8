/*!
    Process-wide FFmpeg initialization and log forwarding.
*/

use std::{
    ffi::{CStr, c_char, c_int, c_void},
    sync::OnceLock,
};

use ffmpeg_next::{ffi, util::log::Level};

use ffmpeg_types::{Error, Result};

static INIT: OnceLock<std::result::Result<(), ffmpeg_next::Error>> = OnceLock::new();

/// Target FFmpeg's own messages are logged under.
pub const LOG_TARGET: &str = "ffmpeg";

const LINE_CAPACITY: usize = 1024;

/**
    Initialize FFmpeg, route its log output through the `log` crate, and align
    its verbosity with the `log` filter.

    Runs once per process; later calls return the first outcome. The callback
    is never unregistered. Install the logger before calling this so the level
    it sets is the one FFmpeg follows.
*/
pub fn init() -> Result<()> {
    INIT.get_or_init(|| {
        ffmpeg_next::init()?;
        let level = ffmpeg_level(log::max_level());
        ffmpeg_next::util::log::set_level(level);
        unsafe { ffi::av_log_set_callback(Some(forward_log)) };
        log::debug!("ffmpeg initialized, log level {level:?}");
        Ok(())
    })
    .map_err(|e| Error::codec(format!("failed to initialize ffmpeg: {e}")))
}

/**
    FFmpeg runs one step quieter than the `log` filter: at `info` only its
    warnings come through.
*/
fn ffmpeg_level(filter: log::LevelFilter) -> Level {
    match filter {
        log::LevelFilter::Off => Level::Quiet,
        log::LevelFilter::Error => Level::Error,
        log::LevelFilter::Warn | log::LevelFilter::Info => Level::Warning,
        log::LevelFilter::Debug => Level::Info,
        log::LevelFilter::Trace => Level::Debug,
    }
}

/**
    Map an FFmpeg message level onto a `log` level. Panic and fatal messages
    are errors.
*/
fn log_level(level: c_int) -> log::Level {
    // the high bits may carry a color override
    let level = level & 0xff;
    if level <= raw(Level::Error) {
        log::Level::Error
    } else if level <= raw(Level::Warning) {
        log::Level::Warn
    } else if level <= raw(Level::Info) {
        log::Level::Info
    } else if level <= raw(Level::Debug) {
        log::Level::Debug
    } else {
        log::Level::Trace
    }
}

fn raw(level: Level) -> c_int {
    level.into()
}

unsafe extern "C" fn forward_log(
    avcl: *mut c_void,
    level: c_int,
    fmt: *const c_char,
    args: ffi::va_list,
) {
    if level & 0xff > unsafe { ffi::av_log_get_level() } {
        return;
    }

    let mut line = [0 as c_char; LINE_CAPACITY];
    let mut print_prefix: c_int = 1;
    let written = unsafe {
        ffi::av_log_format_line2(
            avcl,
            level,
            fmt,
            args,
            line.as_mut_ptr(),
            LINE_CAPACITY as c_int,
            &mut print_prefix,
        )
    };
    if written < 0 {
        return;
    }

    let text = unsafe { CStr::from_ptr(line.as_ptr()) }.to_string_lossy();
    let text = text.trim_end();
    if !text.is_empty() {
        log::log!(target: LOG_TARGET, log_level(level), "{text}");
    }
}
