/*!
    Audio stream pipeline: host sample buffers, resampler, encoder, writer.
*/

use ffmpeg_next::{
    Packet,
    codec::{self, encoder::Audio as AudioEncoderFFmpeg},
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_transform::{AudioOptions, ConversionGraph};
use ffmpeg_types::{
    AudioStreamSpec, ChannelLayout, DrainStatus, EncoderOptions, Error, Rational, Result,
    SampleFormat,
};

use crate::convert::{
    channel_layout_to_ffmpeg, find_encoder, preferred_sample_format, rational_to_ffmpeg,
    sample_format_to_ffmpeg,
};
use crate::options::encoder_dictionary;
use crate::pump::{PacketOutput, feed_encoder, make_writable};
use crate::writer::{PacketWriter, StreamBinding, StreamStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    Flushed,
    Failed,
}

/**
    Audio encoding pipeline.

    The host hands over one buffer per channel per call, with an arbitrary
    sample count. The conversion graph resamples and regroups those samples
    into frames of exactly the encoder's frame size, so a call can produce no
    encoder frame at all or several. The partial frame left at the end is
    released on flush.

    Presentation timestamps before conversion count samples: a submission
    carries the total number of samples submitted before it.
*/
pub struct AudioPipeline {
    // Fields drop in declaration order: graph first, encoder last.
    graph: ConversionGraph,
    packet: Packet,
    converted: AudioFrameFFmpeg,
    raw: AudioFrameFFmpeg,
    encoder: AudioEncoderFFmpeg,
    channel_layout: ChannelLayout,
    sample_format: SampleFormat,
    source_format: SampleFormat,
    source_sample_rate: u32,
    frame_size: Option<u32>,
    time_base: Rational,
    binding: Option<StreamBinding>,
    samples_emitted: i64,
    stats: StreamStats,
    state: State,
}

impl AudioPipeline {
    /**
        Open the encoder described by `spec` and build its resampling graph.

        The graph is built after the encoder so it can be told the encoder's
        fixed frame size. Without an explicit sample format the encoder gets
        the first one its codec supports.
    */
    pub fn open(spec: &AudioStreamSpec, options: &EncoderOptions, global_header: bool) -> Result<Self> {
        spec.validate()?;

        let codec = find_encoder(spec.codec)?;
        let encoder_name = codec.name().to_string();
        let sample_format = spec
            .sample_format
            .unwrap_or_else(|| preferred_sample_format(codec));

        let mut encoder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .audio()
            .map_err(|e| Error::codec(e.to_string()))?;

        encoder.set_rate(spec.sample_rate() as i32);
        encoder.set_channel_layout(channel_layout_to_ffmpeg(spec.channel_layout)?);
        encoder.set_format(sample_format_to_ffmpeg(sample_format)?);
        encoder.set_time_base(rational_to_ffmpeg(spec.time_base));
        encoder.set_bit_rate(spec.bitrate as usize);

        if global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |= codec::flag::Flags::GLOBAL_HEADER.bits() as i32;
            }
        }

        let dict = encoder_dictionary(&encoder_name, options)?;
        let encoder = encoder
            .open_with(dict)
            .map_err(|e| Error::codec(format!("failed to open {encoder_name}: {e}")))?;

        let frame_size = Some(encoder.frame_size()).filter(|&n| n > 0);

        let source = AudioOptions::new(spec.channel_layout, spec.source_format, spec.source_sample_rate)
            .with_frame_size(frame_size);
        let chain = source.conversion_chain(spec.channel_layout, sample_format, spec.sample_rate());
        let graph = ConversionGraph::configure(&source.into(), &chain)?;

        log::debug!(
            "opened {encoder_name} {} Hz {} {}, {} b/s, frame size {:?}",
            spec.sample_rate(),
            spec.channel_layout.name(),
            sample_format.name(),
            spec.bitrate,
            frame_size
        );

        Ok(Self {
            graph,
            packet: Packet::empty(),
            converted: AudioFrameFFmpeg::empty(),
            raw: AudioFrameFFmpeg::empty(),
            encoder,
            channel_layout: spec.channel_layout,
            sample_format,
            source_format: spec.source_format,
            source_sample_rate: spec.source_sample_rate,
            frame_size,
            time_base: spec.time_base,
            binding: None,
            samples_emitted: 0,
            stats: StreamStats::default(),
            state: State::Running,
        })
    }

    /**
        Attach the pipeline to its output stream. Must happen before the first
        submission.
    */
    pub fn bind(&mut self, binding: StreamBinding) {
        self.binding = Some(binding);
    }

    /**
        The opened encoder, for copying codec parameters to the output stream.
    */
    pub fn encoder(&self) -> &AudioEncoderFFmpeg {
        &self.encoder
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Sample format the encoder was opened with.
    */
    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /**
        Samples per encoder frame, or `None` when the encoder takes any size.
    */
    pub fn frame_size(&self) -> Option<u32> {
        self.frame_size
    }

    /**
        Host samples submitted so far; the timestamp of the next submission.
    */
    pub fn samples_emitted(&self) -> i64 {
        self.samples_emitted
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /**
        True once a flush has been submitted.
    */
    pub fn is_flushed(&self) -> bool {
        self.state == State::Flushed
    }

    /**
        Submit `sample_count` samples from one buffer per channel, or `None`
        to flush.

        Returns [`DrainStatus::NeedsInput`] while the stream is open and
        [`DrainStatus::EndOfStream`] once a flush has drained everything.
    */
    pub fn submit<W: PacketWriter + ?Sized>(
        &mut self,
        channels: Option<&[&[u8]]>,
        sample_count: usize,
        writer: &mut W,
    ) -> Result<DrainStatus> {
        let binding = self
            .binding
            .ok_or_else(|| Error::invalid_state("bound pipeline", "unbound pipeline"))?;

        match self.state {
            State::Failed => return Err(Error::invalid_state("running pipeline", "failed pipeline")),
            State::Flushed if channels.is_some() => {
                return Err(Error::invalid_state("running pipeline", "flushed pipeline"));
            }
            _ => {}
        }

        let result = self.submit_inner(channels, sample_count, binding, writer);
        if let Err(e) = &result {
            if e.is_fatal() {
                log::error!("audio pipeline failed: {e}");
                self.state = State::Failed;
            }
        }
        result
    }

    fn submit_inner<W: PacketWriter + ?Sized>(
        &mut self,
        channels: Option<&[&[u8]]>,
        sample_count: usize,
        binding: StreamBinding,
        writer: &mut W,
    ) -> Result<DrainStatus> {
        let flush = match channels {
            Some(channels) if sample_count > 0 => {
                self.stage(channels, sample_count)?;
                false
            }
            Some(channels) => {
                self.check_channels(channels, 0)?;
                false
            }
            None => self.state == State::Running,
        };

        let mut output = PacketOutput {
            packet: &mut self.packet,
            encoder_time_base: self.time_base,
            binding,
            writer,
        };

        if flush {
            self.graph.flush()?;
        }
        feed_encoder(
            &mut self.graph,
            &mut self.converted,
            &mut self.encoder,
            &mut output,
            &mut self.stats,
        )?;
        if flush {
            self.encoder
                .send_eof()
                .map_err(|e| Error::encode_submit(format!("failed to flush audio encoder: {e}")))?;
            self.state = State::Flushed;
            log::debug!("audio flushed after {} samples", self.samples_emitted);
        }

        output.drain(&mut self.encoder, &mut self.stats)
    }

    fn check_channels(&self, channels: &[&[u8]], sample_count: usize) -> Result<()> {
        let expected = self.channel_layout.channels() as usize;
        if channels.len() != expected {
            return Err(Error::invalid_data(format!(
                "got {} channel buffers, {} needs {expected}",
                channels.len(),
                self.channel_layout.name()
            )));
        }

        let needed = sample_count * self.source_format.bytes_per_sample();
        if let Some((index, short)) = channels.iter().enumerate().find(|(_, c)| c.len() < needed) {
            return Err(Error::invalid_data(format!(
                "channel {index} holds {} bytes, {sample_count} samples need {needed}",
                short.len()
            )));
        }
        Ok(())
    }

    /**
        Copy `sample_count` host samples into the raw frame, stamp it with the
        running sample count, and send it into the graph.

        The raw frame is reallocated only when the sample count changes.
    */
    fn stage(&mut self, channels: &[&[u8]], sample_count: usize) -> Result<()> {
        self.check_channels(channels, sample_count)?;

        if self.raw.samples() != sample_count {
            self.raw = AudioFrameFFmpeg::new(
                sample_format_to_ffmpeg(self.source_format)?,
                sample_count,
                channel_layout_to_ffmpeg(self.channel_layout)?,
            );
            self.raw.set_rate(self.source_sample_rate);
        } else {
            make_writable(&mut self.raw)?;
        }
        self.raw.set_pts(Some(self.samples_emitted));

        let width = self.source_format.bytes_per_sample();
        let bytes = sample_count * width;

        if self.source_format.is_planar() {
            for (plane, channel) in channels.iter().enumerate() {
                self.raw.data_mut(plane)[..bytes].copy_from_slice(&channel[..bytes]);
            }
        } else {
            let stride = channels.len() * width;
            let data = self.raw.data_mut(0);
            for (c, channel) in channels.iter().enumerate() {
                for (s, sample) in channel[..bytes].chunks_exact(width).enumerate() {
                    let at = s * stride + c * width;
                    data[at..at + width].copy_from_slice(sample);
                }
            }
        }

        self.graph.send_frame(Some(&*self.raw))?;
        self.samples_emitted += sample_count as i64;
        Ok(())
    }
}

impl std::fmt::Debug for AudioPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPipeline")
            .field("channel_layout", &self.channel_layout)
            .field("sample_format", &self.sample_format)
            .field("frame_size", &self.frame_size)
            .field("time_base", &self.time_base)
            .field("binding", &self.binding)
            .field("samples_emitted", &self.samples_emitted)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_transform::Received;
    use ffmpeg_types::CodecId;

    use super::*;
    use crate::writer::testing::RecordingWriter;

    const RATE: i32 = 48000;

    fn spec() -> AudioStreamSpec {
        AudioStreamSpec::new(
            CodecId::Aac,
            ChannelLayout::Stereo,
            128_000,
            Rational::new(1, RATE),
        )
    }

    fn open(spec: &AudioStreamSpec) -> AudioPipeline {
        let mut pipeline = AudioPipeline::open(spec, &EncoderOptions::none(), false).unwrap();
        pipeline.bind(StreamBinding {
            index: 1,
            time_base: Rational::new(1, RATE),
        });
        pipeline
    }

    fn tone(samples: usize) -> Vec<u8> {
        (0..samples)
            .flat_map(|i| ((i as f32 * 0.05).sin() * 0.25).to_ne_bytes())
            .collect()
    }

    #[test]
    fn aac_frame_size_is_fixed() {
        let pipeline = open(&spec());
        assert_eq!(pipeline.frame_size(), Some(1024));
    }

    #[test]
    fn timestamps_count_samples() {
        let mut pipeline = open(&spec());

        let first = tone(1024);
        assert_eq!(pipeline.samples_emitted(), 0);
        pipeline.stage(&[first.as_slice(), first.as_slice()], 1024).unwrap();
        assert_eq!(pipeline.raw.pts(), Some(0));
        assert_eq!(pipeline.samples_emitted(), 1024);

        assert_eq!(
            pipeline.graph.receive_frame(&mut pipeline.converted).unwrap(),
            Received::Frame
        );
        assert_eq!(pipeline.converted.pts(), Some(0));
        assert_eq!(pipeline.converted.samples(), 1024);
        pipeline.converted = AudioFrameFFmpeg::empty();

        let second = tone(1024);
        pipeline.stage(&[second.as_slice(), second.as_slice()], 1024).unwrap();
        assert_eq!(pipeline.raw.pts(), Some(1024));
        assert_eq!(pipeline.samples_emitted(), 2048);

        assert_eq!(
            pipeline.graph.receive_frame(&mut pipeline.converted).unwrap(),
            Received::Frame
        );
        assert_eq!(pipeline.converted.pts(), Some(1024));
    }

    #[test]
    fn raw_frame_is_reused_for_equal_sizes() {
        let mut pipeline = open(&spec());
        let mut writer = RecordingWriter::default();

        let chunk = tone(512);
        pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 512, &mut writer).unwrap();
        assert_eq!(pipeline.raw.samples(), 512);
        assert_eq!(pipeline.raw.pts(), Some(0));

        pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 512, &mut writer).unwrap();
        assert_eq!(pipeline.raw.samples(), 512);
        assert_eq!(pipeline.raw.pts(), Some(512));

        let longer = tone(800);
        pipeline.submit(Some([longer.as_slice(), longer.as_slice()].as_slice()), 800, &mut writer).unwrap();
        assert_eq!(pipeline.raw.samples(), 800);
        assert_eq!(pipeline.raw.pts(), Some(1024));
        assert_eq!(pipeline.raw.rate(), 48000);

        pipeline.submit(None, 0, &mut writer).unwrap();
        assert_eq!(pipeline.stats().frames_encoded, 2);
    }

    #[test]
    fn several_frames_per_submission_keep_flowing() {
        let mut pipeline = open(&spec());
        let mut writer = RecordingWriter::default();

        // each call releases four encoder frames at once
        let chunk = tone(4096);
        for round in 1..=6u64 {
            let status = pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 4096, &mut writer).unwrap();
            assert_eq!(status, DrainStatus::NeedsInput);
            assert_eq!(pipeline.stats().frames_encoded, round * 4);
        }
        assert!(!writer.packets.is_empty());

        assert_eq!(pipeline.submit(None, 0, &mut writer).unwrap(), DrainStatus::EndOfStream);
        assert_eq!(pipeline.stats().frames_encoded, 24);
        assert_eq!(pipeline.stats().packets_written, writer.packets.len() as u64);
    }

    #[test]
    fn encoder_picks_its_own_sample_format() {
        let spec = AudioStreamSpec::new(
            CodecId::Flac,
            ChannelLayout::Stereo,
            0,
            Rational::new(1, RATE),
        );
        let mut pipeline = open(&spec);
        assert_eq!(pipeline.sample_format(), SampleFormat::S16);
        assert_eq!(pipeline.encoder().format(), ffmpeg_next::format::Sample::I16(ffmpeg_next::format::sample::Type::Packed));

        let mut writer = RecordingWriter::default();
        let chunk = tone(10_000);
        pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 10_000, &mut writer).unwrap();
        assert_eq!(pipeline.submit(None, 0, &mut writer).unwrap(), DrainStatus::EndOfStream);

        let stats = pipeline.stats();
        let frame_size = pipeline.frame_size().map_or(1, u64::from);
        assert_eq!(stats.frames_encoded, 10_000u64.div_ceil(frame_size));
        assert!(stats.packets_written >= stats.frames_encoded);
    }

    #[test]
    fn explicit_sample_format_wins() {
        let spec = AudioStreamSpec::new(
            CodecId::Flac,
            ChannelLayout::Stereo,
            0,
            Rational::new(1, RATE),
        )
        .with_sample_format(SampleFormat::S32);
        let pipeline = open(&spec);
        assert_eq!(pipeline.sample_format(), SampleFormat::S32);
    }

    #[test]
    fn odd_sized_buffers_are_regrouped() {
        let mut pipeline = open(&spec());
        let mut writer = RecordingWriter::default();

        let chunk = tone(3200);
        let mut total = 0;
        for _ in 0..20 {
            let status = pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 3200, &mut writer).unwrap();
            assert_eq!(status, DrainStatus::NeedsInput);
            total += 3200;
        }
        assert_eq!(pipeline.submit(None, 0, &mut writer).unwrap(), DrainStatus::EndOfStream);

        // every full frame plus the flushed remainder reached the encoder
        let stats = pipeline.stats();
        assert_eq!(stats.frames_encoded, (total as u64).div_ceil(1024));
        assert!(writer.packets.len() as u64 >= total as u64 / 1024);

        let pts: Vec<i64> = writer.packets.iter().filter_map(|p| p.pts).collect();
        assert!(pts.windows(2).all(|w| w[0] < w[1]));
        assert!(writer.packets.iter().all(|p| p.stream == 1));
    }

    #[test]
    fn packed_host_samples_are_interleaved() {
        let spec = spec().with_source_format(SampleFormat::F32);
        let mut pipeline = open(&spec);
        let mut writer = RecordingWriter::default();

        let left = tone(2048);
        let right = vec![0u8; 2048 * 4];
        pipeline.submit(Some([left.as_slice(), right.as_slice()].as_slice()), 2048, &mut writer).unwrap();
        pipeline.submit(None, 0, &mut writer).unwrap();
        assert_eq!(pipeline.stats().frames_encoded, 2);
    }

    #[test]
    fn host_rate_is_resampled() {
        let spec = spec().with_source_sample_rate(44100);
        let mut pipeline = open(&spec);
        let mut writer = RecordingWriter::default();

        let chunk = tone(4410);
        for _ in 0..10 {
            pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 4410, &mut writer).unwrap();
        }
        pipeline.submit(None, 0, &mut writer).unwrap();

        // one second in, roughly one second of 1024-sample frames out
        let frames = pipeline.stats().frames_encoded;
        assert!((45..=48).contains(&frames), "{frames} frames");
    }

    #[test]
    fn channel_mismatch_is_invalid_data() {
        let mut pipeline = open(&spec());
        let mut writer = RecordingWriter::default();

        let mono = tone(256);
        let err = pipeline.submit(Some([mono.as_slice()].as_slice()), 256, &mut writer).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        let err = pipeline.submit(Some([mono.as_slice(), mono.as_slice()].as_slice()), 512, &mut writer).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(pipeline.samples_emitted(), 0);
    }

    #[test]
    fn flush_twice_is_harmless() {
        let mut pipeline = open(&spec());
        let mut writer = RecordingWriter::default();

        let chunk = tone(700);
        pipeline.submit(Some([chunk.as_slice(), chunk.as_slice()].as_slice()), 700, &mut writer).unwrap();
        assert_eq!(pipeline.submit(None, 0, &mut writer).unwrap(), DrainStatus::EndOfStream);
        let written = writer.packets.len();
        assert_eq!(pipeline.submit(None, 0, &mut writer).unwrap(), DrainStatus::EndOfStream);
        assert_eq!(writer.packets.len(), written);
        assert_eq!(pipeline.stats().frames_encoded, 1);
    }

    #[test]
    fn video_codec_is_rejected() {
        let spec = AudioStreamSpec::new(
            CodecId::Mpeg4,
            ChannelLayout::Stereo,
            128_000,
            Rational::new(1, RATE),
        );
        let err = AudioPipeline::open(&spec, &EncoderOptions::none(), false).unwrap_err();
        assert!(err.is_configuration());
    }
}
