use thiserror::Error;

/// Default cap on a single input, in bytes.
pub const DEFAULT_MAX_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    pub max_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_BYTES }
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("input is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// Checks the size cap and decodes UTF-8, stripping a leading byte-order mark.
pub fn decode<'a>(bytes: &'a [u8], limits: &InputLimits) -> Result<&'a str, InputError> {
    if bytes.len() > limits.max_bytes {
        return Err(InputError::TooLarge { size: bytes.len(), limit: limits.max_bytes });
    }
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}
