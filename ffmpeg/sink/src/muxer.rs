/*!
    Output container and export session state.
*/

use std::fmt;
use std::path::{Path, PathBuf};

use ffmpeg_next::format::{self, context::Output as OutputContext};

use ffmpeg_encode::{
    AudioPipeline, StreamBinding, StreamStats, VideoPipeline,
    convert::{find_encoder, rational_from_ffmpeg, rational_to_ffmpeg},
};
use ffmpeg_types::{
    AudioStreamSpec, CodecId, EncoderOptions, Error, MediaKind, Rational, Result, SubmitStatus,
    VideoStreamSpec,
};

use crate::diagnostics;
use crate::writer::InterleavedWriter;

/**
    Lifecycle of a [`Muxer`].

    `Created → Configured → Opened → Closing → Closed`. Submissions are only
    accepted while `Opened`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuxerState {
    /// Output path chosen, no stream yet.
    Created,
    /// At least one stream configured, nothing written.
    Configured,
    /// Header written, accepting frames.
    Opened,
    /// Pipelines released, trailer being written.
    Closing,
    /// Output finalized or abandoned.
    Closed,
}

impl MuxerState {
    const fn name(self) -> &'static str {
        match self {
            Self::Created => "created muxer",
            Self::Configured => "configured muxer",
            Self::Opened => "opened muxer",
            Self::Closing => "closing muxer",
            Self::Closed => "closed muxer",
        }
    }
}

impl fmt::Display for MuxerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/**
    What a finished export wrote.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Video frames submitted by the host.
    pub video_frames: u64,
    /// Audio samples submitted by the host, per channel.
    pub audio_samples: u64,
    /// Size of the finished file in bytes.
    pub file_size: u64,
    pub video: Option<StreamStats>,
    pub audio: Option<StreamStats>,
}

impl ExportSummary {
    pub fn total_packets(&self) -> u64 {
        self.video.map_or(0, |s| s.packets_written) + self.audio.map_or(0, |s| s.packets_written)
    }
}

/**
    Muxer for one export.

    Owns the output container and up to one video and one audio pipeline.
    Frames submitted for a stream travel through its pipeline and come out as
    packets written through FFmpeg's interleaving writer, so the file is
    ordered by timestamp across streams.

    ```ignore
    let mut muxer = Muxer::create("out.mp4")?;
    muxer.configure_video(video_spec)?;
    muxer.configure_audio(audio_spec)?;
    muxer.open(&EncoderOptions::none(), &EncoderOptions::none())?;

    muxer.submit_video_frame(Some(&frame))?;
    muxer.submit_audio_frame(Some(&[&left, &right]), 3200)?;

    muxer.submit_video_frame(None)?;
    muxer.submit_audio_frame(None, 0)?;
    let summary = muxer.close()?;
    ```

    Dropping an opened muxer without [`close`](Self::close) releases
    everything but leaves the file without a trailer.
*/
pub struct Muxer {
    // Pipelines drop before the container they write to.
    video: Option<VideoPipeline>,
    audio: Option<AudioPipeline>,
    output: Option<OutputContext>,
    video_spec: Option<VideoStreamSpec>,
    audio_spec: Option<AudioStreamSpec>,
    path: PathBuf,
    format_name: Option<String>,
    state: MuxerState,
}

impl Muxer {
    /**
        Create a muxer writing to `path`, with the container format guessed
        from the extension. Nothing is written until [`open`](Self::open).
    */
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(path.as_ref(), None)
    }

    /**
        Create a muxer writing to `path` as the named container format
        (`"mp4"`, `"matroska"`, `"mov"`, ...).
    */
    pub fn create_as<P: AsRef<Path>>(path: P, format_name: &str) -> Result<Self> {
        Self::new(path.as_ref(), Some(format_name.to_string()))
    }

    fn new(path: &Path, format_name: Option<String>) -> Result<Self> {
        diagnostics::init()?;

        Ok(Self {
            video: None,
            audio: None,
            output: None,
            video_spec: None,
            audio_spec: None,
            path: path.to_path_buf(),
            format_name,
            state: MuxerState::Created,
        })
    }

    pub fn state(&self) -> MuxerState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_stream(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Video => self.video_spec.is_some(),
            MediaKind::Audio => self.audio_spec.is_some(),
        }
    }

    /**
        Add the video stream.

        Fails without adding anything if the codec is not a video codec, no
        encoder for it is available, or the spec is inconsistent.
    */
    pub fn configure_video(&mut self, spec: VideoStreamSpec) -> Result<()> {
        self.expect_configurable()?;
        if self.video_spec.is_some() {
            return Err(Error::config("video stream already configured"));
        }

        spec.validate()?;
        find_encoder(spec.codec)?;

        log::debug!(
            "video stream: {} {}x{} at {} fps",
            spec.codec,
            spec.width,
            spec.height,
            spec.frame_rate()
        );
        self.video_spec = Some(spec);
        self.state = MuxerState::Configured;
        Ok(())
    }

    /**
        Add the audio stream.

        Fails without adding anything if the codec is not an audio codec, no
        encoder for it is available, or the spec is inconsistent.
    */
    pub fn configure_audio(&mut self, spec: AudioStreamSpec) -> Result<()> {
        self.expect_configurable()?;
        if self.audio_spec.is_some() {
            return Err(Error::config("audio stream already configured"));
        }

        spec.validate()?;
        find_encoder(spec.codec)?;

        log::debug!(
            "audio stream: {} {} Hz {}",
            spec.codec,
            spec.sample_rate(),
            spec.channel_layout.name()
        );
        self.audio_spec = Some(spec);
        self.state = MuxerState::Configured;
        Ok(())
    }

    fn expect_configurable(&self) -> Result<()> {
        match self.state {
            MuxerState::Created | MuxerState::Configured => Ok(()),
            other => Err(Error::invalid_state("created or configured muxer", other.name())),
        }
    }

    /**
        Create the file, open every configured encoder, and write the
        container header.

        At least one stream must be configured. On failure everything
        acquired so far is released and the muxer stays `Configured`. A file
        the muxer created is removed; if the output could not be created at
        all, whatever is at the path is left alone.
    */
    pub fn open(&mut self, video_options: &EncoderOptions, audio_options: &EncoderOptions) -> Result<()> {
        match self.state {
            MuxerState::Configured => {}
            MuxerState::Created => return Err(Error::config("no streams configured")),
            other => return Err(Error::invalid_state("configured muxer", other.name())),
        }

        let output = self.create_output()?;
        match self.open_streams(output, video_options, audio_options) {
            Ok((output, video, audio)) => {
                self.output = Some(output);
                self.video = video;
                self.audio = audio;
                self.state = MuxerState::Opened;
                log::info!("writing {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                self.remove_partial_file();
                Err(e)
            }
        }
    }

    fn create_output(&self) -> Result<OutputContext> {
        match &self.format_name {
            Some(name) => format::output_as(&self.path, name),
            None => format::output(&self.path),
        }
        .map_err(|e| Error::config(format!("cannot create {}: {e}", self.path.display())))
    }

    fn open_streams(
        &self,
        mut output: OutputContext,
        video_options: &EncoderOptions,
        audio_options: &EncoderOptions,
    ) -> Result<(OutputContext, Option<VideoPipeline>, Option<AudioPipeline>)> {
        let global_header = output
            .format()
            .flags()
            .contains(format::flag::Flags::GLOBAL_HEADER);

        let mut video = None;
        if let Some(spec) = &self.video_spec {
            let index = add_stream(&mut output, spec.codec, spec.time_base)?;
            let pipeline = VideoPipeline::open(spec, video_options, global_header)?;
            copy_parameters(&mut output, index, pipeline.encoder())?;
            video = Some((index, pipeline));
        }

        let mut audio = None;
        if let Some(spec) = &self.audio_spec {
            let index = add_stream(&mut output, spec.codec, spec.time_base)?;
            let pipeline = AudioPipeline::open(spec, audio_options, global_header)?;
            copy_parameters(&mut output, index, pipeline.encoder())?;
            audio = Some((index, pipeline));
        }

        output
            .write_header()
            .map_err(|e| Error::mux(format!("failed to write header: {e}")))?;

        // The header may have changed the stream time bases.
        let video = video
            .map(|(index, mut pipeline)| {
                pipeline.bind(binding(&output, index)?);
                Ok::<_, Error>(pipeline)
            })
            .transpose()?;
        let audio = audio
            .map(|(index, mut pipeline)| {
                pipeline.bind(binding(&output, index)?);
                Ok::<_, Error>(pipeline)
            })
            .transpose()?;

        Ok((output, video, audio))
    }

    fn remove_partial_file(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("removed partial output {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to remove partial output {}: {e}", self.path.display()),
        }
    }

    /**
        Submit one bottom-up host video frame, or `None` to flush the video
        stream.

        Returns [`SubmitStatus::NoStream`] when no video stream is configured.
    */
    pub fn submit_video_frame(&mut self, frame: Option<&[u8]>) -> Result<SubmitStatus> {
        self.expect_opened()?;
        let (Some(pipeline), Some(output)) = (self.video.as_mut(), self.output.as_mut()) else {
            return Ok(SubmitStatus::NoStream);
        };

        let mut writer = InterleavedWriter::new(output);
        pipeline.submit(frame, &mut writer).map(SubmitStatus::from)
    }

    /**
        Submit `sample_count` samples from one buffer per channel, or `None`
        to flush the audio stream.

        Returns [`SubmitStatus::NoStream`] when no audio stream is configured.
    */
    pub fn submit_audio_frame(
        &mut self,
        channels: Option<&[&[u8]]>,
        sample_count: usize,
    ) -> Result<SubmitStatus> {
        self.expect_opened()?;
        let (Some(pipeline), Some(output)) = (self.audio.as_mut(), self.output.as_mut()) else {
            return Ok(SubmitStatus::NoStream);
        };

        let mut writer = InterleavedWriter::new(output);
        pipeline
            .submit(channels, sample_count, &mut writer)
            .map(SubmitStatus::from)
    }

    fn expect_opened(&self) -> Result<()> {
        if self.state == MuxerState::Opened {
            Ok(())
        } else {
            Err(Error::invalid_state("opened muxer", self.state.name()))
        }
    }

    /**
        Release the pipelines, write the trailer, and close the file.

        Streams should be flushed first; packets still buffered in an
        unflushed pipeline are dropped. Only valid on an opened muxer.
    */
    pub fn close(&mut self) -> Result<ExportSummary> {
        self.expect_opened()?;
        self.state = MuxerState::Closing;

        let mut summary = ExportSummary {
            path: self.path.clone(),
            video_frames: 0,
            audio_samples: 0,
            file_size: 0,
            video: None,
            audio: None,
        };

        if let Some(video) = self.video.take() {
            if !video.is_flushed() {
                log::warn!("closing unflushed video stream; buffered frames are lost");
            }
            summary.video_frames = video.next_presentation_index() as u64;
            summary.video = Some(video.stats());
        }
        if let Some(audio) = self.audio.take() {
            if !audio.is_flushed() {
                log::warn!("closing unflushed audio stream; buffered samples are lost");
            }
            summary.audio_samples = audio.samples_emitted() as u64;
            summary.audio = Some(audio.stats());
        }

        let trailer = match self.output.as_mut() {
            Some(output) => output
                .write_trailer()
                .map_err(|e| Error::mux(format!("failed to write trailer: {e}"))),
            None => Err(Error::invalid_state("open output", "missing output")),
        };
        self.output = None;
        self.state = MuxerState::Closed;
        trailer?;

        summary.file_size = std::fs::metadata(&self.path)?.len();
        log::info!(
            "wrote {} ({} packets, {} bytes)",
            self.path.display(),
            summary.total_packets(),
            summary.file_size
        );
        Ok(summary)
    }
}

fn add_stream(
    output: &mut OutputContext,
    codec: CodecId,
    time_base: Rational,
) -> Result<usize> {
    let encoder = find_encoder(codec)?;
    let mut stream = output
        .add_stream(encoder)
        .map_err(|e| Error::mux(format!("failed to add {codec} stream: {e}")))?;
    stream.set_time_base(rational_to_ffmpeg(time_base));
    Ok(stream.index())
}

fn copy_parameters<P: Into<ffmpeg_next::codec::Parameters>>(
    output: &mut OutputContext,
    index: usize,
    parameters: P,
) -> Result<()> {
    let mut stream = output
        .stream_mut(index)
        .ok_or_else(|| Error::mux(format!("stream {index} missing")))?;
    stream.set_parameters(parameters);
    Ok(())
}

fn binding(output: &OutputContext, index: usize) -> Result<StreamBinding> {
    let stream = output
        .stream(index)
        .ok_or_else(|| Error::mux(format!("stream {index} missing")))?;
    Ok(StreamBinding {
        index,
        time_base: rational_from_ffmpeg(stream.time_base()),
    })
}

impl Drop for Muxer {
    fn drop(&mut self) {
        if self.state == MuxerState::Opened {
            log::warn!(
                "muxer for {} dropped without close; the file has no trailer",
                self.path.display()
            );
        }
    }
}

impl fmt::Debug for Muxer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Muxer")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}
