/*!
    Encoder option dictionaries.
*/

use ffmpeg_next::Dictionary;

use ffmpeg_types::{EncoderOptions, Result};

/**
    Build the option dictionary for the encoder named `encoder_name`.

    x264 and x265 take the whole text as their private parameter string; every
    other encoder gets one dictionary entry per `key=value` pair.
*/
pub fn encoder_dictionary(encoder_name: &str, options: &EncoderOptions) -> Result<Dictionary<'static>> {
    let mut dict = Dictionary::new();

    let Some(text) = options.text() else {
        return Ok(dict);
    };

    match private_params_key(encoder_name) {
        Some(key) => {
            log::debug!("{encoder_name}: {key}={text}");
            dict.set(key, text);
        }
        None => {
            for (key, value) in options.pairs()? {
                log::debug!("{encoder_name}: {key}={value}");
                dict.set(&key, &value);
            }
        }
    }

    Ok(dict)
}

fn private_params_key(encoder_name: &str) -> Option<&'static str> {
    match encoder_name {
        "libx264" | "libx264rgb" => Some("x264opts"),
        "libx265" => Some("x265-params"),
        _ => None,
    }
}
