/*!
    The two loops every pipeline runs: graph into encoder, encoder into writer.
*/

use ffmpeg_next::{Packet, encoder::Encoder, error::EAGAIN, ffi, util::frame::Frame};

use ffmpeg_transform::{ConversionGraph, Received};
use ffmpeg_types::{DrainStatus, Error, Rational, Result};

use crate::convert::rational_to_ffmpeg;
use crate::writer::{PacketWriter, StreamBinding, StreamStats};

/**
    Where drained packets go: the reusable packet, the time base they are
    rescaled from, the stream they are bound to, and the writer.
*/
pub(crate) struct PacketOutput<'a, W: PacketWriter + ?Sized> {
    pub packet: &'a mut Packet,
    pub encoder_time_base: Rational,
    pub binding: StreamBinding,
    pub writer: &'a mut W,
}

impl<W: PacketWriter + ?Sized> PacketOutput<'_, W> {
    pub(crate) fn drain(&mut self, encoder: &mut Encoder, stats: &mut StreamStats) -> Result<DrainStatus> {
        drain_packets(
            encoder,
            self.packet,
            self.encoder_time_base,
            self.binding,
            self.writer,
            stats,
        )
    }
}

/**
    Move every frame the graph has ready into the encoder, draining packets
    after each send.

    `converted` is released after each send, so it is empty on return. A
    rejected send is an encode-submit error.
*/
pub(crate) fn feed_encoder<W: PacketWriter + ?Sized>(
    graph: &mut ConversionGraph,
    converted: &mut Frame,
    encoder: &mut Encoder,
    output: &mut PacketOutput<'_, W>,
    stats: &mut StreamStats,
) -> Result<()> {
    loop {
        match graph.receive_frame(converted)? {
            Received::Frame => {
                let sent = send_frame(encoder, converted, output, stats);
                unsafe { ffi::av_frame_unref(converted.as_mut_ptr()) };
                sent.map_err(|e| match e {
                    SendError::Encoder(e) => Error::encode_submit(format!(
                        "encoder rejected {} frame: {e}",
                        graph.kind()
                    )),
                    SendError::Drain(e) => e,
                })?;
                stats.frames_encoded += 1;
                output.drain(encoder, stats)?;
            }
            Received::Pending | Received::Finished => return Ok(()),
        }
    }
}

enum SendError {
    Encoder(ffmpeg_next::Error),
    Drain(Error),
}

/**
    Send one frame, taking pending packets out first if the encoder is full.
*/
fn send_frame<W: PacketWriter + ?Sized>(
    encoder: &mut Encoder,
    frame: &Frame,
    output: &mut PacketOutput<'_, W>,
    stats: &mut StreamStats,
) -> std::result::Result<(), SendError> {
    match encoder.send_frame(frame) {
        Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => {
            output.drain(encoder, stats).map_err(SendError::Drain)?;
            encoder.send_frame(frame).map_err(SendError::Encoder)
        }
        sent => sent.map_err(SendError::Encoder),
    }
}

/**
    Make `frame` safe to refill while the graph may still reference its old
    buffers.
*/
pub(crate) fn make_writable(frame: &mut Frame) -> Result<()> {
    let ret = unsafe { ffi::av_frame_make_writable(frame.as_mut_ptr()) };
    if ret < 0 {
        return Err(Error::codec(format!(
            "failed to make frame writable: {}",
            ffmpeg_next::Error::from(ret)
        )));
    }
    Ok(())
}

/**
    Pull every available packet out of `encoder` and hand it to `writer`.

    Returns why the loop stopped. Calling again after `EndOfStream` returns
    `EndOfStream` and writes nothing.
*/
fn drain_packets<W: PacketWriter + ?Sized>(
    encoder: &mut Encoder,
    packet: &mut Packet,
    encoder_time_base: Rational,
    binding: StreamBinding,
    writer: &mut W,
    stats: &mut StreamStats,
) -> Result<DrainStatus> {
    loop {
        match encoder.receive_packet(packet) {
            Ok(()) => {
                packet.rescale_ts(
                    rational_to_ffmpeg(encoder_time_base),
                    rational_to_ffmpeg(binding.time_base),
                );
                packet.set_stream(binding.index);

                stats.packets_written += 1;
                stats.bytes_written += packet.size() as u64;

                let written = writer.write_packet(packet);
                unsafe { ffi::av_packet_unref(packet.as_mut_ptr()) };
                written?;
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => {
                return Ok(DrainStatus::NeedsInput);
            }
            Err(ffmpeg_next::Error::Eof) => {
                return Ok(DrainStatus::EndOfStream);
            }
            Err(e) => {
                return Err(Error::codec(format!("failed to receive packet: {e}")));
            }
        }
    }
}
