use std::borrow::Cow;
use std::fmt;
use std::io;
use std::str::FromStr;

use crate::ConfigurationError;

/// Byte encoding of a substituted stream. Input is decoded and output
/// re-encoded with the same encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
        }
    }

    /// # Errors
    ///
    /// [`io::ErrorKind::InvalidData`] when `bytes` is not valid UTF-8. Latin-1
    /// decoding cannot fail.
    pub fn decode(self, bytes: &[u8]) -> io::Result<Cow<'_, str>> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Self::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
        }
    }

    /// Encode `text`; characters Latin-1 cannot represent become `?`.
    #[must_use]
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
            Self::Latin1 => {
                let mut unmappable = 0_usize;
                let bytes: Vec<u8> = text
                    .chars()
                    .map(|c| match u8::try_from(u32::from(c)) {
                        Ok(b) => b,
                        Err(_) => {
                            unmappable += 1;
                            b'?'
                        }
                    })
                    .collect();
                if unmappable > 0 {
                    tracing::warn!(
                        unmappable,
                        encoding = self.name(),
                        "characters not representable, written as '?'"
                    );
                }
                Cow::Owned(bytes)
            }
        }
    }
}

impl FromStr for Encoding {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase().replace('_', "-");
        match label.as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "8859-1" | "latin1" | "latin-1" | "l1" | "iso-latin-1" => {
                Ok(Self::Latin1)
            }
            _ => Err(ConfigurationError::UnknownEncoding { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
