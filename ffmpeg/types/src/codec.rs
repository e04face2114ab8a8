/*!
    Codec identifiers and media kinds.
*/

use std::fmt;
use std::str::FromStr;

use crate::Error;

/**
    Kind of media carried by a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => f.write_str("video"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/**
    Codecs the pipeline can ask FFmpeg to encode.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg4,
    Mpeg2Video,
    ProRes,
    // Audio
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    Ac3,
    PcmS16Le,
    PcmF32Le,
}

impl CodecId {
    /**
        Media kind this codec encodes.
    */
    pub const fn kind(self) -> MediaKind {
        match self {
            Self::H264
            | Self::H265
            | Self::Vp8
            | Self::Vp9
            | Self::Av1
            | Self::Mpeg4
            | Self::Mpeg2Video
            | Self::ProRes => MediaKind::Video,
            Self::Aac
            | Self::Opus
            | Self::Mp3
            | Self::Vorbis
            | Self::Flac
            | Self::Ac3
            | Self::PcmS16Le
            | Self::PcmF32Le => MediaKind::Audio,
        }
    }

    /**
        Short lowercase name, the same one `FromStr` accepts.
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Mpeg4 => "mpeg4",
            Self::Mpeg2Video => "mpeg2video",
            Self::ProRes => "prores",
            Self::Aac => "aac",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
            Self::Ac3 => "ac3",
            Self::PcmS16Le => "pcm_s16le",
            Self::PcmF32Le => "pcm_f32le",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let codec = match s.to_ascii_lowercase().as_str() {
            "h264" | "avc" => Self::H264,
            "h265" | "hevc" => Self::H265,
            "vp8" => Self::Vp8,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            "mpeg4" => Self::Mpeg4,
            "mpeg2video" | "mpeg2" => Self::Mpeg2Video,
            "prores" => Self::ProRes,
            "aac" => Self::Aac,
            "opus" => Self::Opus,
            "mp3" => Self::Mp3,
            "vorbis" => Self::Vorbis,
            "flac" => Self::Flac,
            "ac3" => Self::Ac3,
            "pcm_s16le" => Self::PcmS16Le,
            "pcm_f32le" => Self::PcmF32Le,
            other => {
                return Err(Error::unsupported_format(format!("unknown codec '{other}'")));
            }
        };
        Ok(codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_kinds() {
        assert_eq!(CodecId::H264.kind(), MediaKind::Video);
        assert_eq!(CodecId::Mpeg4.kind(), MediaKind::Video);
        assert_eq!(CodecId::Aac.kind(), MediaKind::Audio);
        assert_eq!(CodecId::PcmF32Le.kind(), MediaKind::Audio);
    }

    #[test]
    fn codec_names_parse_back() {
        for codec in [CodecId::H264, CodecId::Vp9, CodecId::Aac, CodecId::PcmS16Le] {
            assert_eq!(codec.name().parse::<CodecId>().unwrap(), codec);
        }
        assert_eq!("HEVC".parse::<CodecId>().unwrap(), CodecId::H265);
    }

    #[test]
    fn unknown_codec_is_unsupported() {
        let err = "cinepak".parse::<CodecId>().unwrap_err();
        assert!(err.is_configuration());
    }
}
