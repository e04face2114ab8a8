/*!
    Packet writer over an output container.
*/

use ffmpeg_next::{Packet, format::context::Output as OutputContext};

use ffmpeg_encode::PacketWriter;
use ffmpeg_types::{Error, Result};

/**
    Writes packets through FFmpeg's interleaving writer, which buffers per
    stream and emits packets across streams in timestamp order.
*/
pub(crate) struct InterleavedWriter<'a> {
    output: &'a mut OutputContext,
}

impl<'a> InterleavedWriter<'a> {
    pub(crate) fn new(output: &'a mut OutputContext) -> Self {
        Self { output }
    }
}

impl PacketWriter for InterleavedWriter<'_> {
    fn write_packet(&mut self, packet: &mut Packet) -> Result<()> {
        packet
            .write_interleaved(self.output)
            .map_err(|e| Error::mux(format!("failed to write packet on stream {}: {e}", packet.stream())))
    }
}
