#![forbid(unsafe_code)]

//! In-memory gzip decompression.
//!
//! Decodes one complete gzip member (RFC 1952) whose payload is a DEFLATE
//! stream (RFC 1951): bytes in, bytes out, no I/O. Bytes following the
//! member's own trailer are ignored, so only the first member of a
//! concatenated file is decoded.

mod bit_reader;
mod deflate;
mod error;
mod gzip;
mod huffman_coding;
mod output;

pub use error::{DecodeError, Result};
pub use gzip::{CompressionMethod, MemberHeader};

use gzip::GzipReader;
use output::OutputBuffer;

// DEFLATE cannot expand its input more than ~1032x, which bounds how much a
// hostile ISIZE field may make us pre-allocate.
const MAX_EXPANSION: usize = 1032;

/// Decompress a gzip member into a freshly allocated buffer.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    let hint = (decompressed_size(input) as usize)
        .min(input.len().saturating_mul(MAX_EXPANSION).saturating_add(64));

    let mut output = OutputBuffer::with_capacity(hint);
    GzipReader::new(input).read_member(&mut output)?;
    Ok(output.into_vec())
}

/// Decompress a gzip member into `output`, returning the number of bytes
/// written.
///
/// Fails with [`DecodeError::NoSpace`] when `output` is smaller than the
/// size announced by the trailer, or when the stream produces more bytes
/// than `output` can hold.
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let needed = decompressed_size(input) as usize;
    if output.len() < needed {
        return Err(DecodeError::NoSpace {
            needed,
            available: output.len(),
        });
    }

    let mut sink = OutputBuffer::fixed(output);
    GzipReader::new(input).read_member(&mut sink)?;
    Ok(sink.byte_count())
}

/// The decompressed size recorded in the member trailer (ISIZE, modulo
/// 2^32), or 0 when `input` is too short to hold a member. Useful for
/// sizing the buffer handed to [`decompress_into`].
pub fn decompressed_size(input: &[u8]) -> u32 {
    gzip::decompressed_size(input)
}

/// Parse the member header (method, flags, name, comment, ...) without
/// decoding the payload.
pub fn member_header(input: &[u8]) -> Result<MemberHeader> {
    gzip::member_header(input)
}
