/*!
    Audio source options and resampling chains.
*/

use ffmpeg_types::{ChannelLayout, Rational, SampleFormat};

/**
    Shape of the buffers fed into an audio conversion graph.

    Audio graphs are where input and output granularity diverge: with a fixed
    `frame_size` the sink only releases frames of exactly that many samples,
    so one submitted buffer can yield zero, one, or several frames.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct AudioOptions {
    /// Channel layout of the frames sent into the graph.
    pub channel_layout: ChannelLayout,
    /// Sample format of the frames sent into the graph.
    pub sample_format: SampleFormat,
    /// Sample rate of the frames sent into the graph.
    pub sample_rate: u32,
    /// Time base of the frames' presentation timestamps.
    pub time_base: Rational,
    /// Exact number of samples per output frame (None = pass through).
    pub frame_size: Option<u32>,
}

impl AudioOptions {
    /**
        Options for frames timestamped in samples (time base `1/sample_rate`).
    */
    pub fn new(channel_layout: ChannelLayout, sample_format: SampleFormat, sample_rate: u32) -> Self {
        Self {
            channel_layout,
            sample_format,
            sample_rate,
            time_base: Rational::new(1, sample_rate as i32),
            frame_size: None,
        }
    }

    pub fn with_frame_size(mut self, frame_size: Option<u32>) -> Self {
        self.frame_size = frame_size.filter(|&n| n > 0);
        self
    }

    /**
        Arguments for the `abuffer` source filter.
    */
    pub(crate) fn source_args(&self) -> String {
        format!(
            "time_base={}:sample_rate={}:sample_fmt={}:channel_layout={}",
            self.time_base,
            self.sample_rate,
            self.sample_format.name(),
            self.channel_layout.name(),
        )
    }

    /**
        Filter chain resampling, remixing, and reformatting to the encoder's
        layout, sample format, and rate.
    */
    pub fn conversion_chain(
        &self,
        layout: ChannelLayout,
        format: SampleFormat,
        sample_rate: u32,
    ) -> String {
        format!(
            "aformat=channel_layouts={}:sample_fmts={}:sample_rates={}",
            layout.name(),
            format.name(),
            sample_rate
        )
    }
}
