use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use ffmpeg_sink::{AudioStreamSpec, ChannelLayout, CodecId, FieldOrder, PixelFormat, Rational};
use videxport::synth::{ColorCycle, Tone};
use videxport::{ExportSession, STATUS_FATAL};

/**
    Render a synthetic clip through the export pipeline.
*/
#[derive(Parser, Debug)]
#[command(name = "videxport")]
#[command(about = "Encode and mux a synthetic clip to MP4, MKV or MOV")]
struct Args {
    /// Output file; the container is guessed from the extension
    output: PathBuf,

    /// Container format name, overriding the extension (e.g. "matroska")
    #[arg(short, long)]
    format: Option<String>,

    /// Frame width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// Frames per second
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Clip duration in seconds
    #[arg(short, long, default_value = "5")]
    duration: u32,

    /// Video codec
    #[arg(long, default_value = "mpeg4")]
    video_codec: CodecId,

    /// Audio codec
    #[arg(long, default_value = "aac")]
    audio_codec: CodecId,

    /// Encoder sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Rate the tone is rendered at, if different from the encoder rate
    #[arg(long)]
    source_rate: Option<u32>,

    /// Audio channel count (1, 2, 6 or 8)
    #[arg(long, default_value = "2")]
    channels: u16,

    /// Audio bitrate in bits per second
    #[arg(long, default_value = "192000")]
    audio_bitrate: u64,

    /// Video encoder options as key=value pairs separated by ':'
    #[arg(long)]
    video_options: Option<String>,

    /// Audio encoder options as key=value pairs separated by ':'
    #[arg(long)]
    audio_options: Option<String>,

    /// Export without a video stream
    #[arg(long)]
    no_video: bool,

    /// Export without an audio stream
    #[arg(long)]
    no_audio: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    ffmpeg_sink::diagnostics::init().context("failed to initialize ffmpeg")?;

    if args.no_video && args.no_audio {
        bail!("nothing to export: both --no-video and --no-audio were given");
    }

    let mut session = match &args.format {
        Some(format) => ExportSession::with_format(&args.output, format)?,
        None => ExportSession::new(&args.output)?,
    };

    if !args.no_video {
        session
            .configure_video(
                args.video_codec,
                args.width,
                args.height,
                PixelFormat::Yuv420p,
                Rational::new(1, 1),
                Rational::new(1, args.fps as i32),
                FieldOrder::Progressive,
            )
            .context("failed to configure video")?;
    }

    let source_rate = args.source_rate.unwrap_or(args.sample_rate);
    let layout = ChannelLayout::from_count(args.channels)
        .with_context(|| format!("unsupported channel count {}", args.channels))?;
    if !args.no_audio {
        let spec = AudioStreamSpec::new(
            args.audio_codec,
            layout,
            args.audio_bitrate,
            Rational::new(1, args.sample_rate as i32),
        )
        .with_source_sample_rate(source_rate);
        session.configure_audio_spec(spec).context("failed to configure audio")?;
    }

    session
        .open(args.video_options.as_deref(), args.audio_options.as_deref())
        .with_context(|| format!("failed to open {}", args.output.display()))?;

    let colors = ColorCycle::new(
        args.width,
        args.height,
        [[200, 40, 40, 255], [40, 60, 200, 255]],
        args.fps as u64,
    );
    let mut tone = Tone::new(440.0, source_rate, layout.channels() as usize);
    let frames = args.fps as u64 * args.duration as u64;

    for index in 0..frames {
        if session.submit_video_frame(Some(colors.frame(index))) == STATUS_FATAL {
            return Err(submission_error(&session, "video"));
        }

        // Spread the samples so the audio never drifts from the frame clock.
        let end = (index + 1) * source_rate as u64 / args.fps as u64;
        let samples = (end - tone.position()) as usize;
        let block = tone.next_block(samples);
        let channels: Vec<&[u8]> = block.iter().map(Vec::as_slice).collect();
        if session.submit_audio_frame(Some(channels.as_slice()), samples) == STATUS_FATAL {
            return Err(submission_error(&session, "audio"));
        }
    }

    if session.submit_video_frame(None) == STATUS_FATAL {
        return Err(submission_error(&session, "video"));
    }
    if session.submit_audio_frame(None, 0) == STATUS_FATAL {
        return Err(submission_error(&session, "audio"));
    }

    let Some(summary) = session.close()? else {
        bail!("export session closed twice");
    };
    log::info!(
        "wrote {}: {} video frames, {} audio samples, {} packets, {} bytes",
        summary.path.display(),
        summary.video_frames,
        summary.audio_samples,
        summary.total_packets(),
        summary.file_size
    );
    Ok(())
}

fn submission_error(session: &ExportSession, stream: &str) -> anyhow::Error {
    match session.last_error() {
        Some(e) => anyhow::anyhow!("{stream} submission failed: {e}"),
        None => anyhow::anyhow!("{stream} submission failed"),
    }
}
