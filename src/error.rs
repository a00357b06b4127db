#![forbid(unsafe_code)]

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////

/// Everything that can go wrong while decoding a gzip member.
///
/// `InvalidMagic` and `InvalidMethod` are header refusals raised before any
/// output is produced; `InvalidFile` covers every structural corruption found
/// mid-stream; `NoSpace` is only reachable through [`decompress_into`].
///
/// [`decompress_into`]: crate::decompress_into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("bad magic bytes: expected 1f 8b, got {found:02x?}")]
    InvalidMagic { found: [u8; 2] },

    #[error("unsupported compression method {method}, expected 8 (deflate)")]
    InvalidMethod { method: u8 },

    #[error("corrupt member: {reason}")]
    InvalidFile { reason: &'static str },

    #[error("output buffer too small: need {needed} bytes, have {available}")]
    NoSpace { needed: usize, available: usize },
}

impl DecodeError {
    pub(crate) fn corrupt(reason: &'static str) -> Self {
        Self::InvalidFile { reason }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
