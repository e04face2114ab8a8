/*!
    Host glue for the export pipeline: a status-code session API over
    [`ffmpeg_sink::Muxer`] and a synthetic frame source.
*/

pub mod session;
pub mod synth;

pub use session::{ExportSession, STATUS_FATAL, STATUS_MORE, STATUS_OK};
