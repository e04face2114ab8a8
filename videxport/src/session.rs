/*!
    Host-facing export session.

    Wraps a [`Muxer`] behind the calls a host application makes while it
    renders: configuration and open return `Result`, while per-frame
    submissions return plain status codes so a render loop can branch on
    them without matching on error types.
*/

use std::path::Path;

use ffmpeg_sink::{
    AudioStreamSpec, ChannelLayout, CodecId, EncoderOptions, Error, ExportSummary, FieldOrder,
    Muxer, MuxerState, PixelFormat, Rational, Result, VideoStreamSpec,
};

/// Submission accepted, or no stream of that kind is configured.
pub const STATUS_OK: i32 = 0;
/// Submission accepted and the encoder wants more, or the stream has ended.
pub const STATUS_MORE: i32 = 1;
/// Submission failed.
pub const STATUS_FATAL: i32 = -1;

pub struct ExportSession {
    muxer: Muxer,
    last_error: Option<Error>,
}

impl ExportSession {
    /**
        Start a session writing to `path`, the container guessed from its
        extension.
    */
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            muxer: Muxer::create(path)?,
            last_error: None,
        })
    }

    /**
        Start a session writing an explicitly named container format.
    */
    pub fn with_format<P: AsRef<Path>>(path: P, format_name: &str) -> Result<Self> {
        Ok(Self {
            muxer: Muxer::create_as(path, format_name)?,
            last_error: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn configure_video(
        &mut self,
        codec: CodecId,
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        pixel_aspect_ratio: Rational,
        time_base: Rational,
        field_order: FieldOrder,
    ) -> Result<()> {
        let spec = VideoStreamSpec::new(codec, width, height, time_base)
            .with_pixel_format(pixel_format)
            .with_pixel_aspect_ratio(pixel_aspect_ratio)
            .with_field_order(field_order);
        self.muxer.configure_video(spec)
    }

    pub fn configure_audio(
        &mut self,
        codec: CodecId,
        channel_layout: ChannelLayout,
        bitrate: u64,
        time_base: Rational,
    ) -> Result<()> {
        self.configure_audio_spec(AudioStreamSpec::new(codec, channel_layout, bitrate, time_base))
    }

    /**
        Configure audio from a full spec, e.g. when the host renders at a
        different sample rate than the encoder runs at.
    */
    pub fn configure_audio_spec(&mut self, spec: AudioStreamSpec) -> Result<()> {
        self.muxer.configure_audio(spec)
    }

    /**
        Create the file and open the encoders. Option text is `key=value`
        pairs separated by `:`.
    */
    pub fn open(&mut self, video_options: Option<&str>, audio_options: Option<&str>) -> Result<()> {
        self.muxer.open(
            &EncoderOptions::from_optional(video_options),
            &EncoderOptions::from_optional(audio_options),
        )
    }

    /**
        Submit one bottom-up RGBA frame, or `None` to flush the video stream.
    */
    pub fn submit_video_frame(&mut self, frame: Option<&[u8]>) -> i32 {
        let result = self.muxer.submit_video_frame(frame);
        self.status(result)
    }

    /**
        Submit `sample_count` samples per channel, or `None` to flush the
        audio stream.
    */
    pub fn submit_audio_frame(&mut self, channels: Option<&[&[u8]]>, sample_count: usize) -> i32 {
        let result = self.muxer.submit_audio_frame(channels, sample_count);
        self.status(result)
    }

    fn status(&mut self, result: Result<ffmpeg_sink::SubmitStatus>) -> i32 {
        match result {
            Ok(status) => status.code(),
            Err(e) => {
                log::error!("submission failed: {e}");
                self.last_error = Some(e);
                STATUS_FATAL
            }
        }
    }

    /**
        The error behind the most recent [`STATUS_FATAL`].
    */
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /**
        Finish the file. Closing twice is harmless: the second call logs a
        warning and returns `None`.
    */
    pub fn close(&mut self) -> Result<Option<ExportSummary>> {
        if self.muxer.state() == MuxerState::Closed {
            log::warn!("export session already closed");
            return Ok(None);
        }
        self.muxer.close().map(Some)
    }

    pub fn state(&self) -> MuxerState {
        self.muxer.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(dir: &tempfile::TempDir, name: &str) -> ExportSession {
        let mut session = ExportSession::new(dir.path().join(name)).unwrap();
        session
            .configure_video(
                CodecId::Mpeg4,
                32,
                32,
                PixelFormat::Yuv420p,
                Rational::new(1, 1),
                Rational::new(1, 10),
                FieldOrder::Progressive,
            )
            .unwrap();
        session
    }

    #[test]
    fn submissions_report_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir, "codes.mp4");
        session.open(None, None).unwrap();

        let frame = vec![128u8; 32 * 32 * 4];
        assert_eq!(session.submit_video_frame(Some(frame.as_slice())), STATUS_MORE);
        assert_eq!(session.submit_audio_frame(None, 0), STATUS_OK);
        assert_eq!(session.submit_video_frame(None), STATUS_MORE);
        assert!(session.last_error().is_none());

        let summary = session.close().unwrap().unwrap();
        assert_eq!(summary.video_frames, 1);
    }

    #[test]
    fn short_frame_is_fatal_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir, "short.mp4");
        session.open(None, None).unwrap();

        assert_eq!(session.submit_video_frame(Some(&[0u8; 16][..])), STATUS_FATAL);
        assert!(matches!(session.last_error(), Some(Error::InvalidData(_))));
        session.close().unwrap();
    }

    #[test]
    fn submitting_before_open_is_fatal_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir, "early.mp4");

        assert_eq!(session.submit_video_frame(None), STATUS_FATAL);
        assert_eq!(session.state(), MuxerState::Configured);
    }

    #[test]
    fn double_close_is_guarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir, "twice.mkv");
        session.open(None, None).unwrap();
        session.submit_video_frame(None);

        assert!(session.close().unwrap().is_some());
        assert!(session.close().unwrap().is_none());
        assert_eq!(session.state(), MuxerState::Closed);
    }

    #[test]
    fn bad_option_text_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir, "options.mp4");

        let err = session.open(Some("bitrate"), None).unwrap_err();
        assert!(err.is_configuration());
    }
}
