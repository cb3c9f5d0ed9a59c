//! Encoding-tolerant playlist reader
//!
//! Reads the whole resource, then tries each configured encoding in order.
//! Success means the full resource decoded; there is no partial result.

use std::io::ErrorKind;
use std::path::Path;

use crate::errors::ReadError;

/// Text encodings the reader can try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Ascii,
}

impl TextEncoding {
    /// Parse a configuration label ("utf-8", "latin-1", "iso-8859-1", "ascii")
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Some(Self::Latin1),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Decode the complete byte buffer or report why it failed
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(str::to_string)
                    .map_err(|e| e.to_string())
            }
            // Every byte is a valid code point U+0000..U+00FF
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!("non-ascii byte 0x{:02x} at {}", bytes[pos], pos)),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
            TextEncoding::Ascii => write!(f, "ascii"),
        }
    }
}

/// Reads playlist files as decoded lines
#[derive(Debug, Clone)]
pub struct PlaylistReader {
    encodings: Vec<TextEncoding>,
}

impl PlaylistReader {
    /// Create a reader trying `encodings` in order
    pub fn new(encodings: Vec<TextEncoding>) -> Self {
        Self { encodings }
    }

    /// Read `path` and return its lines
    ///
    /// The file handle is scoped to the read; decoding happens afterwards.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<String>, ReadError> {
        let path = path.as_ref();
        let path_display = path.display().to_string();

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ReadError::NotFound {
                path: path_display.clone(),
            },
            _ => ReadError::Io {
                path: path_display.clone(),
                source: e,
            },
        })?;

        tracing::debug!("Read {} bytes from {}", bytes.len(), path_display);

        self.decode_lines(&path_display, &bytes)
    }

    /// Decode an in-memory buffer into lines
    pub fn decode_lines(&self, path: &str, bytes: &[u8]) -> Result<Vec<String>, ReadError> {
        let mut attempts = Vec::with_capacity(self.encodings.len());

        for encoding in &self.encodings {
            match encoding.decode(bytes) {
                Ok(text) => {
                    if !attempts.is_empty() {
                        tracing::warn!(
                            "Decoded {} with fallback encoding {} after {} failed attempt(s)",
                            path,
                            encoding,
                            attempts.len()
                        );
                    }
                    return Ok(text.lines().map(str::to_string).collect());
                }
                Err(cause) => {
                    tracing::debug!("Decoding {} as {} failed: {}", path, encoding, cause);
                    attempts.push((*encoding, cause));
                }
            }
        }

        Err(ReadError::Decode {
            path: path.to_string(),
            attempts,
        })
    }
}
