//! Byte-to-text decoding after pre-initialization
//!
//! A [`Decoder`] can only be obtained from a pre-initialized
//! [`Runtime`](crate::Runtime), which makes "encoding decided before any
//! text is decoded" a structural property rather than a convention.

use crate::{Error, Signal};

/// Decodes raw bytes (environment values, argv, paths) according to the
/// frozen pre-configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    utf8_mode: bool,
}

impl Decoder {
    pub(crate) fn new(utf8_mode: bool) -> Self {
        Self { utf8_mode }
    }

    pub fn utf8_mode(&self) -> bool {
        self.utf8_mode
    }

    /// Decode `bytes`.
    ///
    /// In UTF-8 mode invalid input is a configuration error. Otherwise
    /// invalid bytes are kept as `\xNN` escapes.
    pub fn decode(&self, bytes: &[u8]) -> Signal<String> {
        let mut out = String::new();
        out.try_reserve(bytes.len())
            .map_err(|_| Error::allocation("decode"))?;

        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    return Ok(out);
                }
                Err(err) => {
                    if self.utf8_mode {
                        return Err(Error::config(
                            "decode",
                            format!("invalid UTF-8 at byte {}", bytes.len() - rest.len() + err.valid_up_to()),
                        )
                        .into());
                    }
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    let bad_len = err.error_len().unwrap_or(invalid.len());
                    for byte in &invalid[..bad_len] {
                        out.push_str(&format!("\\x{:02x}", byte));
                    }
                    rest = &invalid[bad_len..];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignalExt;

    #[test]
    fn utf8_mode_decodes_valid_text() {
        let decoder = Decoder::new(true);
        assert_eq!(decoder.decode("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn utf8_mode_rejects_invalid_bytes() {
        let decoder = Decoder::new(true);
        assert!(decoder.decode(b"ab\xffcd").is_error());
    }

    #[test]
    fn locale_mode_escapes_invalid_bytes() {
        let decoder = Decoder::new(false);
        assert_eq!(decoder.decode(b"ab\xffcd\xfe").unwrap(), "ab\\xffcd\\xfe");
    }
}
