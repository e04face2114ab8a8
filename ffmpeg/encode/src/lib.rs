/*!
    Per-stream encoding pipelines for the ffmpeg crate ecosystem.

    This crate turns raw host media into compressed packets. Each stream gets
    its own pipeline that owns an encoder, a conversion graph from
    `ffmpeg-transform`, and the reusable frames and packet in between.

    # Video

    ```ignore
    use ffmpeg_encode::{StreamBinding, VideoPipeline};
    use ffmpeg_types::{CodecId, EncoderOptions, Rational, VideoStreamSpec};

    let spec = VideoStreamSpec::new(CodecId::H264, 1920, 1080, Rational::new(1, 30));
    let mut video = VideoPipeline::open(&spec, &EncoderOptions::new("keyint=60"), true)?;
    video.bind(StreamBinding { index: 0, time_base: Rational::new(1, 15360) });

    // Host frames: RGBA, bottom row first
    for frame in host_frames {
        video.submit(Some(&frame), &mut writer)?;
    }

    // Flush the conversion graph, then the encoder
    video.submit(None, &mut writer)?;
    ```

    # Audio

    ```ignore
    use ffmpeg_encode::AudioPipeline;
    use ffmpeg_types::{AudioStreamSpec, ChannelLayout, CodecId, Rational};

    let spec = AudioStreamSpec::new(CodecId::Aac, ChannelLayout::Stereo, 192_000, Rational::new(1, 48000));
    let mut audio = AudioPipeline::open(&spec, &EncoderOptions::none(), true)?;

    // One buffer per channel, any number of samples per call
    audio.submit(Some(&[left, right]), 3200, &mut writer)?;
    audio.submit(None, 0, &mut writer)?;
    ```

    # Buffering

    Neither pipeline maps one submission to one packet. The conversion graph
    may hold samples back until it has a full encoder frame, and the encoder
    may hold frames back for lookahead. Packets come out whenever they are
    ready; only a flush guarantees everything has been written.

    # Encoder Options

    Option text is handed to libx264 as `x264opts` and to libx265 as
    `x265-params`. Every other encoder receives it as `key=value` pairs
    separated by `:`.
*/

pub use ffmpeg_types::{
    AudioStreamSpec, CodecId, DrainStatus, EncoderOptions, Error, Rational, Result,
    VideoStreamSpec,
};

mod audio;
pub mod convert;
mod options;
mod pump;
mod video;
mod writer;

pub use audio::AudioPipeline;
pub use options::encoder_dictionary;
pub use video::VideoPipeline;
pub use writer::{PacketWriter, StreamBinding, StreamStats};
