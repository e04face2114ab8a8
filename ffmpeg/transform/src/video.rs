/*!
    Video source options and conversion chains.
*/

use ffmpeg_types::{ColorSpace, PixelFormat, Rational};

/**
    Shape of the frames fed into a video conversion graph.

    Fixed for the lifetime of the graph; only content and timestamps vary.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct VideoOptions {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the frames sent into the graph.
    pub pixel_format: PixelFormat,
    /// Time base of the frames' presentation timestamps.
    pub time_base: Rational,
    /// Sample aspect ratio.
    pub sample_aspect_ratio: Rational,
}

impl VideoOptions {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, time_base: Rational) -> Self {
        Self {
            width,
            height,
            pixel_format,
            time_base,
            sample_aspect_ratio: Rational::new(1, 1),
        }
    }

    pub fn with_sample_aspect_ratio(mut self, ratio: Rational) -> Self {
        self.sample_aspect_ratio = ratio;
        self
    }

    /**
        Arguments for the `buffer` source filter.
    */
    pub(crate) fn source_args(&self) -> String {
        format!(
            "video_size={}x{}:pix_fmt={}:time_base={}:pixel_aspect={}",
            self.width,
            self.height,
            self.pixel_format.name(),
            self.time_base,
            self.sample_aspect_ratio,
        )
    }

    /**
        Filter chain converting these frames to `target`, using the matrix of
        `color` and limited range so the output matches the encoder's color tags.
    */
    pub fn conversion_chain(&self, target: PixelFormat, color: ColorSpace) -> String {
        format!(
            "scale=out_color_matrix={}:out_range=tv,format=pix_fmts={}",
            color.matrix_name(),
            target.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_args_describe_the_frame() {
        let options = VideoOptions::new(320, 240, PixelFormat::Rgba, Rational::new(1, 30))
            .with_sample_aspect_ratio(Rational::new(4, 3));
        assert_eq!(
            options.source_args(),
            "video_size=320x240:pix_fmt=rgba:time_base=1/30:pixel_aspect=4/3"
        );
    }

    #[test]
    fn chain_targets_encoder_format() {
        let options = VideoOptions::new(16, 16, PixelFormat::Rgba, Rational::new(1, 25));
        assert_eq!(
            options.conversion_chain(PixelFormat::Yuv420p, ColorSpace::Bt709),
            "scale=out_color_matrix=bt709:out_range=tv,format=pix_fmts=yuv420p"
        );
    }
}
