/*!
    Shared types for the export pipeline crates.

    This crate defines the vocabulary of the pipeline: the types that cross crate
    boundaries. It has no dependency on FFmpeg, so host glue can describe streams
    and read results without pulling in FFmpeg bindings.
*/

mod codec;
mod error;
mod format;
mod options;
mod rational;
mod status;
mod stream;

pub use codec::{CodecId, MediaKind};
pub use error::{Error, Result};
pub use format::{ChannelLayout, ColorSpace, FieldOrder, PixelFormat, SampleFormat};
pub use options::EncoderOptions;
pub use rational::Rational;
pub use status::{DrainStatus, SubmitStatus};
pub use stream::{AudioStreamSpec, DEFAULT_VIDEO_BITRATE, VideoStreamSpec};
