/*!
    Packet output seam shared by the stream pipelines.
*/

use ffmpeg_next::Packet;

use ffmpeg_types::{Rational, Result};

/**
    Destination for encoded packets.

    Packets arrive already rescaled to the output stream's time base and
    tagged with its index. The muxer implements this over its container;
    tests implement it by recording what they receive.
*/
pub trait PacketWriter {
    fn write_packet(&mut self, packet: &mut Packet) -> Result<()>;
}

/**
    The output stream a pipeline writes to.

    The time base is the stream's final one, known only after the container
    header has been written.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamBinding {
    pub index: usize,
    pub time_base: Rational,
}

/**
    Running counters for one stream.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Converted frames accepted by the encoder.
    pub frames_encoded: u64,
    /// Packets handed to the writer.
    pub packets_written: u64,
    /// Payload bytes handed to the writer.
    pub bytes_written: u64,
}
