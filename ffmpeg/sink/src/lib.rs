/*!
    Media output and muxing for the ffmpeg crate ecosystem.

    This crate handles the output side of the export pipeline. A [`Muxer`]
    owns the container file and one pipeline per stream; the host submits raw
    frames and samples, and encoded packets come out interleaved into an MP4,
    MKV or MOV file.

    # Lifecycle

    1. [`Muxer::create`] picks the output path. Nothing touches disk.
    2. `configure_video` / `configure_audio` declare the streams.
    3. [`Muxer::open`] creates the file, opens the encoders and writes the header.
    4. `submit_video_frame` / `submit_audio_frame` feed the streams; `None` flushes.
    5. [`Muxer::close`] writes the trailer and reports an [`ExportSummary`].

    Opening with no stream configured is an error and creates no file.
*/

pub mod diagnostics;
mod muxer;
mod writer;

pub use ffmpeg_types::{
    AudioStreamSpec, ChannelLayout, CodecId, ColorSpace, EncoderOptions, Error, FieldOrder, MediaKind,
    PixelFormat, Rational, Result, SubmitStatus, VideoStreamSpec,
};

pub use ffmpeg_encode::StreamStats;
pub use muxer::{ExportSummary, Muxer, MuxerState};
