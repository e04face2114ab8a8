/*!
    Video stream pipeline: host frame, conversion graph, encoder, writer.
*/

use ffmpeg_next::{
    Packet,
    codec::{self, encoder::Video as VideoEncoderFFmpeg},
    ffi,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_transform::{ConversionGraph, VideoOptions};
use ffmpeg_types::{
    ColorSpace, DrainStatus, EncoderOptions, Error, FieldOrder, Rational, Result,
    VideoStreamSpec,
};

use crate::convert::{find_encoder, pixel_format_to_ffmpeg, rational_to_ffmpeg};
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
    Video encoding pipeline.

    Host frames are packed 4-byte pixels stored bottom-up: the first row in the
    buffer is the bottom row of the picture. Each submitted frame is flipped
    into the raw frame, stamped with the next presentation index, converted to
    the encoder's pixel format and color space, and encoded. Packets go to the
    writer rescaled to the bound stream's time base.

    Presentation timestamps before rescaling are exactly 0, 1, 2, ... in the
    stream's time base, one tick per submitted frame.
*/
pub struct VideoPipeline {
    // Fields drop in declaration order: graph first, encoder last.
    graph: ConversionGraph,
    packet: Packet,
    converted: VideoFrameFFmpeg,
    raw: VideoFrameFFmpeg,
    encoder: VideoEncoderFFmpeg,
    width: u32,
    height: u32,
    time_base: Rational,
    binding: Option<StreamBinding>,
    next_presentation_index: i64,
    stats: StreamStats,
    state: State,
}

impl VideoPipeline {
    /**
        Open the encoder described by `spec` and build its conversion graph.

        `global_header` must be set when the container stores codec headers
        out of band (MP4, MKV, MOV).
    */
    pub fn open(spec: &VideoStreamSpec, options: &EncoderOptions, global_header: bool) -> Result<Self> {
        spec.validate()?;

        let codec = find_encoder(spec.codec)?;
        let encoder_name = codec.name().to_string();

        let mut encoder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        encoder.set_width(spec.width);
        encoder.set_height(spec.height);
        encoder.set_format(pixel_format_to_ffmpeg(spec.pixel_format)?);
        encoder.set_time_base(rational_to_ffmpeg(spec.time_base));
        encoder.set_frame_rate(Some(rational_to_ffmpeg(spec.frame_rate())));
        encoder.set_aspect_ratio(rational_to_ffmpeg(spec.pixel_aspect_ratio));
        encoder.set_bit_rate(spec.bitrate as usize);

        unsafe {
            let ctx = encoder.as_mut_ptr();
            apply_color_tags(ctx, spec.color_space);
            (*ctx).field_order = field_order_to_ffmpeg(spec.field_order);
            if global_header {
                (*ctx).flags |= codec::flag::Flags::GLOBAL_HEADER.bits() as i32;
            }
        }

        let dict = encoder_dictionary(&encoder_name, options)?;
        let encoder = encoder
            .open_with(dict)
            .map_err(|e| Error::codec(format!("failed to open {encoder_name}: {e}")))?;

        let source = VideoOptions::new(spec.width, spec.height, spec.source_format, spec.time_base)
            .with_sample_aspect_ratio(spec.pixel_aspect_ratio);
        let chain = source.conversion_chain(spec.pixel_format, spec.color_space);
        let graph = ConversionGraph::configure(&source.into(), &chain)?;

        let raw = VideoFrameFFmpeg::new(
            pixel_format_to_ffmpeg(spec.source_format)?,
            spec.width,
            spec.height,
        );

        log::debug!(
            "opened {encoder_name} {}x{} at {} fps, {} b/s",
            spec.width,
            spec.height,
            spec.frame_rate(),
            spec.bitrate
        );

        Ok(Self {
            graph,
            packet: Packet::empty(),
            converted: VideoFrameFFmpeg::empty(),
            raw,
            encoder,
            width: spec.width,
            height: spec.height,
            time_base: spec.time_base,
            binding: None,
            next_presentation_index: 0,
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
    pub fn encoder(&self) -> &VideoEncoderFFmpeg {
        &self.encoder
    }

    /**
        Encoder time base, the unit of presentation timestamps before rescaling.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Presentation timestamp the next submitted frame will carry.
    */
    pub fn next_presentation_index(&self) -> i64 {
        self.next_presentation_index
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
        Size in bytes of one host frame.
    */
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /**
        Submit one host frame, or `None` to flush.

        Returns [`DrainStatus::NeedsInput`] while the stream is open and
        [`DrainStatus::EndOfStream`] once a flush has drained everything.
        Flushing again is harmless. A frame after a flush, or anything after a
        fatal error, is an invalid-state error.
    */
    pub fn submit<W: PacketWriter + ?Sized>(
        &mut self,
        frame: Option<&[u8]>,
        writer: &mut W,
    ) -> Result<DrainStatus> {
        let binding = self
            .binding
            .ok_or_else(|| Error::invalid_state("bound pipeline", "unbound pipeline"))?;

        match self.state {
            State::Failed => return Err(Error::invalid_state("running pipeline", "failed pipeline")),
            State::Flushed if frame.is_some() => {
                return Err(Error::invalid_state("running pipeline", "flushed pipeline"));
            }
            _ => {}
        }

        let result = self.submit_inner(frame, binding, writer);
        if let Err(e) = &result {
            if e.is_fatal() {
                log::error!("video pipeline failed: {e}");
                self.state = State::Failed;
            }
        }
        result
    }

    fn submit_inner<W: PacketWriter + ?Sized>(
        &mut self,
        frame: Option<&[u8]>,
        binding: StreamBinding,
        writer: &mut W,
    ) -> Result<DrainStatus> {
        let mut output = PacketOutput {
            packet: &mut self.packet,
            encoder_time_base: self.time_base,
            binding,
            writer,
        };

        match frame {
            Some(bytes) => {
                Self::stage(
                    &mut self.graph,
                    &mut self.raw,
                    self.width,
                    self.height,
                    &mut self.next_presentation_index,
                    bytes,
                )?;
                feed_encoder(
                    &mut self.graph,
                    &mut self.converted,
                    &mut self.encoder,
                    &mut output,
                    &mut self.stats,
                )?;
            }
            None if self.state == State::Running => {
                self.graph.flush()?;
                feed_encoder(
                    &mut self.graph,
                    &mut self.converted,
                    &mut self.encoder,
                    &mut output,
                    &mut self.stats,
                )?;
                self.encoder
                    .send_eof()
                    .map_err(|e| Error::encode_submit(format!("failed to flush video encoder: {e}")))?;
                self.state = State::Flushed;
                log::debug!(
                    "video flushed after {} frames",
                    self.next_presentation_index
                );
            }
            None => {}
        }

        output.drain(&mut self.encoder, &mut self.stats)
    }

    /**
        Flip a bottom-up host frame into the raw frame, stamp it with the next
        presentation index, and send it into the graph.
    */
    fn stage(
        graph: &mut ConversionGraph,
        raw: &mut VideoFrameFFmpeg,
        width: u32,
        height: u32,
        next_presentation_index: &mut i64,
        bytes: &[u8],
    ) -> Result<()> {
        fill_raw(raw, width, height, bytes)?;
        raw.set_pts(Some(*next_presentation_index));
        *next_presentation_index += 1;
        graph.send_frame(Some(&**raw))
    }
}

/**
    Copy a bottom-up host frame into the raw frame top-down.
*/
fn fill_raw(raw: &mut VideoFrameFFmpeg, width: u32, height: u32, bytes: &[u8]) -> Result<()> {
    let row_bytes = width as usize * 4;
    let rows = height as usize;
    if bytes.len() < row_bytes * rows {
        return Err(Error::invalid_data(format!(
            "video frame holds {} bytes, {width}x{height} needs {}",
            bytes.len(),
            row_bytes * rows
        )));
    }

    make_writable(raw)?;

    let stride = raw.stride(0);
    let data = raw.data_mut(0);
    for (y, src) in bytes.chunks_exact(row_bytes).take(rows).enumerate() {
        let dst = (rows - 1 - y) * stride;
        data[dst..dst + row_bytes].copy_from_slice(src);
    }
    Ok(())
}

/**
    Tag the encoder with the matrix, primaries, transfer and limited range of
    `color`.
*/
unsafe fn apply_color_tags(ctx: *mut ffi::AVCodecContext, color: ColorSpace) {
    let (space, primaries, transfer) = match color {
        ColorSpace::Bt709 => (
            ffi::AVColorSpace::AVCOL_SPC_BT709,
            ffi::AVColorPrimaries::AVCOL_PRI_BT709,
            ffi::AVColorTransferCharacteristic::AVCOL_TRC_BT709,
        ),
        ColorSpace::Bt601 => (
            ffi::AVColorSpace::AVCOL_SPC_SMPTE170M,
            ffi::AVColorPrimaries::AVCOL_PRI_SMPTE170M,
            ffi::AVColorTransferCharacteristic::AVCOL_TRC_SMPTE170M,
        ),
    };
    unsafe {
        (*ctx).colorspace = space;
        (*ctx).color_primaries = primaries;
        (*ctx).color_trc = transfer;
        (*ctx).color_range = ffi::AVColorRange::AVCOL_RANGE_MPEG;
    }
}

fn field_order_to_ffmpeg(order: FieldOrder) -> ffi::AVFieldOrder {
    match order {
        FieldOrder::Progressive => ffi::AVFieldOrder::AV_FIELD_PROGRESSIVE,
        FieldOrder::TopFirst => ffi::AVFieldOrder::AV_FIELD_TT,
        FieldOrder::BottomFirst => ffi::AVFieldOrder::AV_FIELD_BB,
        FieldOrder::Unknown => ffi::AVFieldOrder::AV_FIELD_UNKNOWN,
    }
}

impl std::fmt::Debug for VideoPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPipeline")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("time_base", &self.time_base)
            .field("binding", &self.binding)
            .field("next_presentation_index", &self.next_presentation_index)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
