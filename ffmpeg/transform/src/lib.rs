/*!
    Media frame transformation for the ffmpeg crate ecosystem.

    This crate converts frames between the format a host produces and the
    format an encoder consumes. For video: color matrix and pixel format
    conversion. For audio: resampling, channel layout and sample format
    conversion, and regrouping into fixed-size frames.

    Every conversion runs through a [`ConversionGraph`], a libavfilter graph
    with a single source and a single sink.
*/

mod audio;
mod graph;
mod video;

use ffmpeg_types::MediaKind;

pub use audio::AudioOptions;
pub use graph::{ConversionGraph, Received};
pub use video::VideoOptions;

/**
    Description of the frames a conversion graph accepts.
*/
#[derive(Clone, Debug, PartialEq)]
pub enum ConversionOptions {
    Video(VideoOptions),
    Audio(AudioOptions),
}

impl ConversionOptions {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video(_) => MediaKind::Video,
            Self::Audio(_) => MediaKind::Audio,
        }
    }

    pub(crate) fn source_args(&self) -> String {
        match self {
            Self::Video(video) => video.source_args(),
            Self::Audio(audio) => audio.source_args(),
        }
    }
}

impl From<VideoOptions> for ConversionOptions {
    fn from(options: VideoOptions) -> Self {
        Self::Video(options)
    }
}

impl From<AudioOptions> for ConversionOptions {
    fn from(options: AudioOptions) -> Self {
        Self::Audio(options)
    }
}
