/*!
    Conversion utilities between ffmpeg-types and ffmpeg-next types.
*/

use ffmpeg_next::{
    ChannelLayout as FFmpegChannelLayout, Codec, Rational as FFmpegRational,
    codec::Id as CodecIdFFmpeg,
    format::{Pixel, Sample, sample::Type},
};

use ffmpeg_types::{ChannelLayout, CodecId, Error, PixelFormat, Rational, Result, SampleFormat};

/**
    Convert our Rational to ffmpeg_next::Rational.
*/
pub fn rational_to_ffmpeg(r: Rational) -> FFmpegRational {
    FFmpegRational::new(r.num, r.den)
}

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: FFmpegRational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
pub fn codec_id_to_ffmpeg(codec: CodecId) -> Result<CodecIdFFmpeg> {
    match codec {
        // Video
        CodecId::H264 => Ok(CodecIdFFmpeg::H264),
        CodecId::H265 => Ok(CodecIdFFmpeg::HEVC),
        CodecId::Vp8 => Ok(CodecIdFFmpeg::VP8),
        CodecId::Vp9 => Ok(CodecIdFFmpeg::VP9),
        CodecId::Av1 => Ok(CodecIdFFmpeg::AV1),
        CodecId::Mpeg4 => Ok(CodecIdFFmpeg::MPEG4),
        CodecId::Mpeg2Video => Ok(CodecIdFFmpeg::MPEG2VIDEO),
        CodecId::ProRes => Ok(CodecIdFFmpeg::PRORES),
        // Audio
        CodecId::Aac => Ok(CodecIdFFmpeg::AAC),
        CodecId::Opus => Ok(CodecIdFFmpeg::OPUS),
        CodecId::Mp3 => Ok(CodecIdFFmpeg::MP3),
        CodecId::Vorbis => Ok(CodecIdFFmpeg::VORBIS),
        CodecId::Flac => Ok(CodecIdFFmpeg::FLAC),
        CodecId::Ac3 => Ok(CodecIdFFmpeg::AC3),
        CodecId::PcmS16Le => Ok(CodecIdFFmpeg::PCM_S16LE),
        CodecId::PcmF32Le => Ok(CodecIdFFmpeg::PCM_F32LE),
        _ => Err(Error::unsupported_format(format!(
            "codec {codec} has no FFmpeg mapping"
        ))),
    }
}

/**
    Look up the default FFmpeg encoder for a codec.

    Fails with an unsupported-format error when the linked FFmpeg was built
    without an encoder for it.
*/
pub fn find_encoder(codec: CodecId) -> Result<Codec> {
    ffmpeg_next::init().map_err(|e| Error::codec(e.to_string()))?;

    let id = codec_id_to_ffmpeg(codec)?;
    ffmpeg_next::encoder::find(id)
        .ok_or_else(|| Error::unsupported_format(format!("no encoder available for {codec}")))
}

/**
    Convert our PixelFormat to FFmpeg's Pixel format.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Result<Pixel> {
    match format {
        PixelFormat::Yuv420p => Ok(Pixel::YUV420P),
        PixelFormat::Nv12 => Ok(Pixel::NV12),
        PixelFormat::Bgra => Ok(Pixel::BGRA),
        PixelFormat::Rgba => Ok(Pixel::RGBA),
        PixelFormat::Argb => Ok(Pixel::ARGB),
        PixelFormat::Yuv422p => Ok(Pixel::YUV422P),
        PixelFormat::Yuv444p => Ok(Pixel::YUV444P),
        PixelFormat::Yuv420p10 => Ok(Pixel::YUV420P10LE),
        _ => Err(Error::unsupported_format(format!(
            "pixel format {format:?} not supported"
        ))),
    }
}

/**
    Convert our SampleFormat to FFmpeg's Sample format, planar variants included.
*/
pub fn sample_format_to_ffmpeg(format: SampleFormat) -> Result<Sample> {
    match format {
        SampleFormat::F32 => Ok(Sample::F32(Type::Packed)),
        SampleFormat::F32p => Ok(Sample::F32(Type::Planar)),
        SampleFormat::F64 => Ok(Sample::F64(Type::Packed)),
        SampleFormat::S16 => Ok(Sample::I16(Type::Packed)),
        SampleFormat::S16p => Ok(Sample::I16(Type::Planar)),
        SampleFormat::S32 => Ok(Sample::I32(Type::Packed)),
        SampleFormat::S32p => Ok(Sample::I32(Type::Planar)),
        SampleFormat::U8 => Ok(Sample::U8(Type::Packed)),
        _ => Err(Error::unsupported_format(format!(
            "sample format {format:?} not supported"
        ))),
    }
}

/**
    Convert FFmpeg's Sample format back to ours, if we have a variant for it.
*/
pub fn sample_format_from_ffmpeg(format: Sample) -> Option<SampleFormat> {
    match format {
        Sample::F32(Type::Packed) => Some(SampleFormat::F32),
        Sample::F32(Type::Planar) => Some(SampleFormat::F32p),
        Sample::F64(Type::Packed) => Some(SampleFormat::F64),
        Sample::I16(Type::Packed) => Some(SampleFormat::S16),
        Sample::I16(Type::Planar) => Some(SampleFormat::S16p),
        Sample::I32(Type::Packed) => Some(SampleFormat::S32),
        Sample::I32(Type::Planar) => Some(SampleFormat::S32p),
        Sample::U8(Type::Packed) => Some(SampleFormat::U8),
        _ => None,
    }
}

/**
    The first sample format `codec` lists that we can express, or planar f32
    when it lists none.
*/
pub fn preferred_sample_format(codec: Codec) -> SampleFormat {
    codec
        .audio()
        .ok()
        .and_then(|audio| audio.formats())
        .and_then(|mut formats| formats.find_map(sample_format_from_ffmpeg))
        .unwrap_or(SampleFormat::F32p)
}

/**
    Convert our ChannelLayout to FFmpeg's ChannelLayout.
*/
pub fn channel_layout_to_ffmpeg(layout: ChannelLayout) -> Result<FFmpegChannelLayout> {
    match layout {
        ChannelLayout::Mono => Ok(FFmpegChannelLayout::MONO),
        ChannelLayout::Stereo => Ok(FFmpegChannelLayout::STEREO),
        ChannelLayout::Surround5_1 => Ok(FFmpegChannelLayout::_5POINT1),
        ChannelLayout::Surround7_1 => Ok(FFmpegChannelLayout::_7POINT1),
        _ => Err(Error::unsupported_format(format!(
            "channel layout {layout:?} not supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_round_trips() {
        let tb = Rational::new(1, 96000);
        assert_eq!(rational_from_ffmpeg(rational_to_ffmpeg(tb)), tb);
    }

    #[test]
    fn planar_sample_formats_keep_their_layout() {
        assert_eq!(
            sample_format_to_ffmpeg(SampleFormat::F32p).unwrap(),
            Sample::F32(Type::Planar)
        );
        assert_eq!(
            sample_format_to_ffmpeg(SampleFormat::S16).unwrap(),
            Sample::I16(Type::Packed)
        );
    }

    #[test]
    fn encoders_prefer_their_own_sample_format() {
        assert_eq!(preferred_sample_format(find_encoder(CodecId::Aac).unwrap()), SampleFormat::F32p);
        assert_eq!(preferred_sample_format(find_encoder(CodecId::Flac).unwrap()), SampleFormat::S16);
        assert_eq!(preferred_sample_format(find_encoder(CodecId::PcmS16Le).unwrap()), SampleFormat::S16);
        assert_eq!(
            sample_format_from_ffmpeg(Sample::I32(Type::Planar)),
            Some(SampleFormat::S32p)
        );
    }

    #[test]
    fn native_encoders_are_found() {
        assert!(find_encoder(CodecId::Mpeg4).is_ok());
        assert!(find_encoder(CodecId::Aac).is_ok());
    }

    #[test]
    fn codec_ids_map() {
        assert_eq!(codec_id_to_ffmpeg(CodecId::H265).unwrap(), CodecIdFFmpeg::HEVC);
        assert_eq!(codec_id_to_ffmpeg(CodecId::Aac).unwrap(), CodecIdFFmpeg::AAC);
    }
}
