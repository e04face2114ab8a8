/*!
    Encoder option text.
*/

use crate::{Error, Result};

/**
    Codec option text supplied by the host for one stream.

    How the text reaches the encoder depends on the encoder that opens it:
    libx264 and libx265 take it whole as their private parameter string, every
    other encoder takes it as `key=value` pairs separated by `:`.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    text: Option<String>,
}

impl EncoderOptions {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        Self {
            text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_optional(text: Option<&str>) -> Self {
        text.map(Self::new).unwrap_or_default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }

    /**
        Split the text into `key=value` pairs.

        Empty segments are skipped; a segment without `=` or with an empty key
        is a configuration error.
    */
    pub fn pairs(&self) -> Result<Vec<(String, String)>> {
        let Some(text) = self.text.as_deref() else {
            return Ok(Vec::new());
        };

        let mut pairs = Vec::new();
        for segment in text.split(':').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                Error::config(format!("encoder option '{segment}' is not key=value"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::config(format!(
                    "encoder option '{segment}' has an empty key"
                )));
            }
            pairs.push((key.to_string(), value.trim().to_string()));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty() {
        assert!(EncoderOptions::new("   ").is_empty());
        assert!(EncoderOptions::from_optional(None).is_empty());
        assert!(EncoderOptions::none().pairs().unwrap().is_empty());
    }

    #[test]
    fn splits_pairs() {
        let opts = EncoderOptions::new("preset=fast: crf=20 ::tune=film");
        assert_eq!(
            opts.pairs().unwrap(),
            vec![
                ("preset".to_string(), "fast".to_string()),
                ("crf".to_string(), "20".to_string()),
                ("tune".to_string(), "film".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(EncoderOptions::new("crf").pairs().unwrap_err().is_configuration());
        assert!(EncoderOptions::new("=3").pairs().is_err());
    }
}
