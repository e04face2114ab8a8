/*!
    Conversion graph: one source, one sink, a filter chain in between.
*/

use ffmpeg_next::{error::EAGAIN, ffi, filter, util::frame::Frame};

use ffmpeg_types::{Error, MediaKind, Result};

use crate::ConversionOptions;

const SOURCE: &str = "in";
const SINK: &str = "out";

/**
    Result of pulling from a conversion graph.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    /// A converted frame was written into the caller's frame.
    Frame,
    /// Nothing is available until more input arrives.
    Pending,
    /// The graph was flushed and everything buffered has been returned.
    Finished,
}

/**
    A per-stream filter graph converting frames of a fixed source shape into
    the encoder's format.

    The contract mirrors FFmpeg's send/receive model:

    - [`send_frame`](Self::send_frame) pushes one frame in the declared source
      format, or `None` to flush.
    - [`receive_frame`](Self::receive_frame) must be called in a loop until it
      returns something other than [`Received::Frame`]. Stopping early leaves
      converted frames buffered inside the graph, and for audio that means
      dropped samples.

    Calling `receive_frame` again after `Pending` or `Finished` returns the same
    signal and changes nothing.
*/
pub struct ConversionGraph {
    graph: filter::Graph,
    kind: MediaKind,
    flushed: bool,
}

impl ConversionGraph {
    /**
        Build and validate a graph for frames described by `options`, running
        them through the filter chain `chain`.

        Fails if a filter cannot be allocated, the chain does not parse, or the
        chain cannot be negotiated against the declared source format.
    */
    pub fn configure(options: &ConversionOptions, chain: &str) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::filter(e.to_string()))?;

        let kind = options.kind();
        let (source_name, sink_name) = match kind {
            MediaKind::Video => ("buffer", "buffersink"),
            MediaKind::Audio => ("abuffer", "abuffersink"),
        };

        let source = filter::find(source_name)
            .ok_or_else(|| Error::filter(format!("filter '{source_name}' not available")))?;
        let sink = filter::find(sink_name)
            .ok_or_else(|| Error::filter(format!("filter '{sink_name}' not available")))?;

        let mut graph = filter::Graph::new();

        let args = options.source_args();
        graph
            .add(&source, SOURCE, &args)
            .map_err(|e| Error::filter(format!("failed to create {source_name}({args}): {e}")))?;
        graph
            .add(&sink, SINK, "")
            .map_err(|e| Error::filter(format!("failed to create {sink_name}: {e}")))?;

        graph
            .output(SOURCE, 0)
            .and_then(|parser| parser.input(SINK, 0))
            .and_then(|parser| parser.parse(chain))
            .map_err(|e| Error::filter(format!("failed to parse filter chain '{chain}': {e}")))?;

        graph
            .validate()
            .map_err(|e| Error::filter(format!("failed to configure filter chain '{chain}': {e}")))?;

        if let ConversionOptions::Audio(audio) = options {
            if let Some(frame_size) = audio.frame_size {
                graph
                    .get(SINK)
                    .ok_or_else(|| Error::filter("sink filter missing after configure"))?
                    .sink()
                    .set_frame_size(frame_size);
            }
        }

        log::debug!("configured {kind} conversion graph: {args} -> {chain}");

        Ok(Self {
            graph,
            kind,
            flushed: false,
        })
    }

    /**
        Media kind this graph converts.
    */
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /**
        True once the flush signal has been sent.
    */
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /**
        Push one frame into the graph, or `None` to flush.

        The graph takes its own reference to the frame's buffers; the caller
        keeps `frame` and must make it writable before filling it again.

        Flushing more than once is a no-op. Sending a frame after flushing is
        an invalid-state error.
    */
    pub fn send_frame(&mut self, frame: Option<&Frame>) -> Result<()> {
        match frame {
            Some(frame) => {
                if self.flushed {
                    return Err(Error::invalid_state("unflushed graph", "flushed graph"));
                }
                let mut source = self
                    .graph
                    .get(SOURCE)
                    .ok_or_else(|| Error::filter("source filter missing"))?;
                let ret = unsafe { ffi::av_buffersrc_write_frame(source.as_mut_ptr(), frame.as_ptr()) };
                if ret < 0 {
                    return Err(Error::filter(format!(
                        "failed to send {} frame: {}",
                        self.kind,
                        ffmpeg_next::Error::from(ret)
                    )));
                }
                Ok(())
            }
            None => self.flush(),
        }
    }

    /**
        Signal end of input so buffered partial output is released.
    */
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.graph
            .get(SOURCE)
            .ok_or_else(|| Error::filter("source filter missing"))?
            .source()
            .flush()
            .map_err(|e| Error::filter(format!("failed to flush {} graph: {e}", self.kind)))?;
        self.flushed = true;
        Ok(())
    }

    /**
        Pull the next converted frame into `frame`.

        The frame must not hold a reference from a previous call; release it
        before pulling again.
    */
    pub fn receive_frame(&mut self, frame: &mut Frame) -> Result<Received> {
        let pulled = self
            .graph
            .get(SINK)
            .ok_or_else(|| Error::filter("sink filter missing"))?
            .sink()
            .frame(frame);

        match pulled {
            Ok(()) => Ok(Received::Frame),
            Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => Ok(Received::Pending),
            Err(ffmpeg_next::Error::Eof) => Ok(Received::Finished),
            Err(e) => Err(Error::filter(format!(
                "failed to receive {} frame: {e}",
                self.kind
            ))),
        }
    }
}

impl std::fmt::Debug for ConversionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionGraph")
            .field("kind", &self.kind)
            .field("flushed", &self.flushed)
            .finish_non_exhaustive()
    }
}
