#![forbid(unsafe_code)]

use byteorder::{ByteOrder, LittleEndian};
use crc::Crc;

use crate::deflate::DeflateReader;
use crate::error::{DecodeError, Result};
use crate::output::OutputBuffer;

////////////////////////////////////////////////////////////////////////////////

const ID1: u8 = 0x1f;
const ID2: u8 = 0x8b;

const CM_DEFLATE: u8 = 8;

// Fixed header (10) plus footer (8); anything shorter is refused before the
// magic bytes are even looked at.
pub const MIN_MEMBER_SIZE: usize = 18;

const FOOTER_SIZE: usize = 8;

const FTEXT_OFFSET: u8 = 0;
const FHCRC_OFFSET: u8 = 1;
const FEXTRA_OFFSET: u8 = 2;
const FNAME_OFFSET: u8 = 3;
const FCOMMENT_OFFSET: u8 = 4;

static CRC_CODER: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

const HEADER_TRUNCATED: DecodeError = DecodeError::InvalidFile {
    reason: "member header truncated",
};

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct MemberHeader {
    pub compression_method: CompressionMethod,
    pub modification_time: u32,
    pub extra: Option<Vec<u8>>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub extra_flags: u8,
    pub os: u8,
    pub has_crc: bool,
    pub is_text: bool,
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Copy, Debug)]
pub enum CompressionMethod {
    Deflate,
    Unknown(u8),
}

impl From<u8> for CompressionMethod {
    fn from(value: u8) -> Self {
        match value {
            CM_DEFLATE => Self::Deflate,
            x => Self::Unknown(x),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct MemberFlags(u8);

impl MemberFlags {
    fn bit(&self, n: u8) -> bool {
        (self.0 >> n) & 1 != 0
    }

    pub fn is_text(&self) -> bool {
        self.bit(FTEXT_OFFSET)
    }

    pub fn has_crc(&self) -> bool {
        self.bit(FHCRC_OFFSET)
    }

    pub fn has_extra(&self) -> bool {
        self.bit(FEXTRA_OFFSET)
    }

    pub fn has_name(&self) -> bool {
        self.bit(FNAME_OFFSET)
    }

    pub fn has_comment(&self) -> bool {
        self.bit(FCOMMENT_OFFSET)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct MemberFooter {
    pub data_crc32: u32,
    pub data_size: u32,
}

////////////////////////////////////////////////////////////////////////////////

pub struct GzipReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> GzipReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.input.get(self.pos).ok_or(HEADER_TRUNCATED)?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.input.len())
            .ok_or(HEADER_TRUNCATED)?;

        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn read_zero_terminated(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                return Ok(text);
            }
            text.push(byte as char);
        }
    }

    fn read_header(&mut self) -> Result<MemberHeader> {
        if self.input.len() < MIN_MEMBER_SIZE {
            return Err(DecodeError::corrupt("input shorter than a minimal member"));
        }

        let id1 = self.read_u8()?;
        let id2 = self.read_u8()?;
        if [id1, id2] != [ID1, ID2] {
            return Err(DecodeError::InvalidMagic { found: [id1, id2] });
        }

        let compression_method = CompressionMethod::from(self.read_u8()?);
        let flags = MemberFlags(self.read_u8()?);
        let modification_time = LittleEndian::read_u32(self.take(4)?);
        let extra_flags = self.read_u8()?;
        let os = self.read_u8()?;

        let extra = if flags.has_extra() {
            let xlen = self.read_u16_le()? as usize;
            Some(self.take(xlen)?.to_vec())
        } else {
            None
        };

        let name = if flags.has_name() {
            Some(self.read_zero_terminated()?)
        } else {
            None
        };

        let comment = if flags.has_comment() {
            Some(self.read_zero_terminated()?)
        } else {
            None
        };

        if flags.has_crc() {
            let computed = (CRC_CODER.checksum(&self.input[..self.pos]) & 0xffff) as u16;
            if self.read_u16_le()? != computed {
                return Err(DecodeError::corrupt("header crc16 check failed"));
            }
        }

        Ok(MemberHeader {
            compression_method,
            modification_time,
            extra,
            name,
            comment,
            extra_flags,
            os,
            has_crc: flags.has_crc(),
            is_text: flags.is_text(),
        })
    }

    /// Decode one complete member into `output`, verifying the trailer
    /// against what was produced. Bytes after the member's footer are left
    /// alone.
    pub fn read_member(mut self, output: &mut OutputBuffer<'_>) -> Result<MemberHeader> {
        let header = self.read_header()?;

        match header.compression_method {
            CompressionMethod::Deflate => {}
            CompressionMethod::Unknown(method) => {
                return Err(DecodeError::InvalidMethod { method });
            }
        }

        let mut deflate_reader = DeflateReader::new(&self.input[self.pos..]);
        loop {
            if deflate_reader.decode_block(output)? {
                break;
            }
        }

        let trailer = deflate_reader.into_remaining();
        if trailer.len() < FOOTER_SIZE {
            return Err(DecodeError::corrupt("member footer truncated"));
        }
        let footer = MemberFooter {
            data_crc32: LittleEndian::read_u32(&trailer[0..4]),
            data_size: LittleEndian::read_u32(&trailer[4..8]),
        };

        // ISIZE is the size modulo 2^32, hence the cast on our side
        if footer.data_size != output.byte_count() as u32 {
            return Err(DecodeError::corrupt("length check failed"));
        }

        if footer.data_crc32 != CRC_CODER.checksum(output.produced()) {
            return Err(DecodeError::corrupt("crc32 check failed"));
        }

        Ok(header)
    }
}

/// Parse just the member header, leaving the payload untouched.
pub fn member_header(input: &[u8]) -> Result<MemberHeader> {
    GzipReader::new(input).read_header()
}

/// ISIZE from the member trailer, or 0 when `input` cannot hold a member.
pub fn decompressed_size(input: &[u8]) -> u32 {
    if input.len() < MIN_MEMBER_SIZE {
        return 0;
    }
    LittleEndian::read_u32(&input[input.len() - 4..])
}

////////////////////////////////////////////////////////////////////////////////
