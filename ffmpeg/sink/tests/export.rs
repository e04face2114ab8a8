//! End-to-end exports read back through FFmpeg's demuxer.

use std::path::Path;

use ffmpeg_next::media::Type as MediaType;

use ffmpeg_sink::{
    AudioStreamSpec, ChannelLayout, CodecId, ColorSpace, EncoderOptions, FieldOrder, Muxer,
    MuxerState, Rational, SubmitStatus, VideoStreamSpec,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FPS: i32 = 30;
const SAMPLE_RATE: i32 = 96000;

fn solid_frame(rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((WIDTH * HEIGHT) as usize)
}

fn tone(start: usize, samples: usize, rate: i32) -> Vec<u8> {
    (start..start + samples)
        .flat_map(|i| {
            let t = i as f32 / rate as f32;
            ((t * 440.0 * std::f32::consts::TAU).sin() * 0.2).to_ne_bytes()
        })
        .collect()
}

struct StreamReport {
    kind: MediaType,
    packets: usize,
    dts_increasing: bool,
    last_dts: Option<i64>,
}

/// Per-stream packet counts, in stream index order.
fn read_back(path: &Path) -> Vec<StreamReport> {
    let mut input = ffmpeg_next::format::input(path).unwrap();
    let mut reports: Vec<StreamReport> = input
        .streams()
        .map(|stream| StreamReport {
            kind: stream.parameters().medium(),
            packets: 0,
            dts_increasing: true,
            last_dts: None,
        })
        .collect();

    for (stream, packet) in input.packets() {
        let report = &mut reports[stream.index()];
        report.packets += 1;
        if let Some(dts) = packet.dts() {
            if let Some(previous) = report.last_dts.replace(dts) {
                report.dts_increasing &= dts > previous;
            }
        }
    }
    reports
}

fn report(reports: &[StreamReport], kind: MediaType) -> Option<&StreamReport> {
    reports.iter().find(|r| r.kind == kind)
}

#[test]
fn two_second_export_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.mp4");

    let mut muxer = Muxer::create(&path).unwrap();
    muxer
        .configure_video(VideoStreamSpec::new(
            CodecId::Mpeg4,
            WIDTH,
            HEIGHT,
            Rational::new(1, FPS),
        ))
        .unwrap();
    muxer
        .configure_audio(AudioStreamSpec::new(
            CodecId::Aac,
            ChannelLayout::Stereo,
            192_000,
            Rational::new(1, SAMPLE_RATE),
        ))
        .unwrap();
    muxer
        .open(&EncoderOptions::none(), &EncoderOptions::none())
        .unwrap();
    assert_eq!(muxer.state(), MuxerState::Opened);

    let colors = [solid_frame([220, 40, 40, 255]), solid_frame([40, 40, 220, 255])];
    let per_frame = (SAMPLE_RATE / FPS) as usize;

    for i in 0..60 {
        let status = muxer.submit_video_frame(Some(colors[i % 2].as_slice())).unwrap();
        assert_eq!(status, SubmitStatus::NeedsInput);

        let samples = tone(i * per_frame, per_frame, SAMPLE_RATE);
        let status = muxer
            .submit_audio_frame(Some([samples.as_slice(), samples.as_slice()].as_slice()), per_frame)
            .unwrap();
        assert_eq!(status.code(), 1);
    }

    assert_eq!(muxer.submit_video_frame(None).unwrap(), SubmitStatus::EndOfStream);
    assert_eq!(muxer.submit_audio_frame(None, 0).unwrap(), SubmitStatus::EndOfStream);

    let summary = muxer.close().unwrap();
    assert_eq!(muxer.state(), MuxerState::Closed);
    assert_eq!(summary.video_frames, 60);
    assert_eq!(summary.audio_samples, 192_000);

    let video = summary.video.unwrap();
    assert_eq!(video.frames_encoded, 60);
    assert_eq!(video.packets_written, 60);
    let audio = summary.audio.unwrap();
    assert!(audio.packets_written >= 192_000 / 1024);

    let reports = read_back(&path);
    assert_eq!(reports.len(), 2);
    let video = report(&reports, MediaType::Video).unwrap();
    let audio = report(&reports, MediaType::Audio).unwrap();
    assert_eq!(video.packets, 60);
    assert!(audio.packets >= 187);
    assert!(video.dts_increasing);
    assert!(audio.dts_increasing);
}

#[test]
fn matroska_export_resamples_host_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.mkv");

    let mut muxer = Muxer::create_as(&path, "matroska").unwrap();
    muxer
        .configure_video(
            VideoStreamSpec::new(CodecId::Mpeg4, 176, 144, Rational::new(1, 25))
                .with_color_space(ColorSpace::Bt601)
                .with_field_order(FieldOrder::TopFirst)
                .with_pixel_aspect_ratio(Rational::new(12, 11))
                .with_bitrate(200_000),
        )
        .unwrap();
    muxer
        .configure_audio(
            AudioStreamSpec::new(CodecId::Aac, ChannelLayout::Mono, 64_000, Rational::new(1, 48000))
                .with_source_sample_rate(44100),
        )
        .unwrap();
    muxer
        .open(&EncoderOptions::new("g=10"), &EncoderOptions::none())
        .unwrap();

    let frame = [90u8, 160, 60, 255].repeat(176 * 144);
    for i in 0..25 {
        muxer.submit_video_frame(Some(frame.as_slice())).unwrap();
        let samples = tone(i * 1764, 1764, 44100);
        muxer.submit_audio_frame(Some([samples.as_slice()].as_slice()), 1764).unwrap();
    }
    muxer.submit_video_frame(None).unwrap();
    muxer.submit_audio_frame(None, 0).unwrap();
    let summary = muxer.close().unwrap();
    assert_eq!(summary.video_frames, 25);

    let reports = read_back(&path);
    assert_eq!(report(&reports, MediaType::Video).unwrap().packets, 25);
    // one second at 48 kHz is 46.9 frames of 1024 samples
    assert!(report(&reports, MediaType::Audio).unwrap().packets >= 46);
}

#[test]
fn unsupported_codec_fails_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unsupported.mp4");

    let err = "cinepak".parse::<CodecId>().unwrap_err();
    assert!(err.is_configuration());

    let mut muxer = Muxer::create(&path).unwrap();
    let err = muxer
        .configure_audio(AudioStreamSpec::new(
            CodecId::H264,
            ChannelLayout::Stereo,
            128_000,
            Rational::new(1, 48000),
        ))
        .unwrap_err();
    assert!(err.is_configuration());

    let err = muxer
        .open(&EncoderOptions::none(), &EncoderOptions::none())
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!path.exists());
}

#[test]
fn video_only_export_ignores_audio() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silent.mov");

    let mut muxer = Muxer::create(&path).unwrap();
    muxer
        .configure_video(VideoStreamSpec::new(CodecId::Mpeg4, 64, 64, Rational::new(1, 24)))
        .unwrap();
    muxer
        .open(&EncoderOptions::none(), &EncoderOptions::none())
        .unwrap();

    let frame = [0u8, 0, 0, 255].repeat(64 * 64);
    for _ in 0..12 {
        muxer.submit_video_frame(Some(frame.as_slice())).unwrap();
        assert_eq!(muxer.submit_audio_frame(None, 0).unwrap(), SubmitStatus::NoStream);
    }
    muxer.submit_video_frame(None).unwrap();
    let summary = muxer.close().unwrap();
    assert!(summary.audio.is_none());

    let reports = read_back(&path);
    assert_eq!(reports.len(), 1);
    assert_eq!(report(&reports, MediaType::Video).unwrap().packets, 12);
}
