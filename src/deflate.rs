#![forbid(unsafe_code)]

use crate::bit_reader::BitReader;
use crate::error::{DecodeError, Result};
use crate::huffman_coding::{
    decode_litlen_distance_trees, fixed_litlen_distance_trees, DistanceToken, HuffmanCoding,
    LitLenToken,
};
use crate::output::OutputBuffer;

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
pub struct BlockHeader {
    pub is_final: bool,
    pub compression_type: CompressionType,
}

#[derive(Debug)]
pub enum CompressionType {
    Uncompressed = 0,
    FixedTree = 1,
    DynamicTree = 2,
    Reserved = 3,
}

////////////////////////////////////////////////////////////////////////////////

pub struct DeflateReader<'a> {
    bit_reader: BitReader<'a>,
}

impl<'a> DeflateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bit_reader: BitReader::new(data),
        }
    }

    fn read_header(&mut self) -> Result<BlockHeader> {
        let is_final = self.bit_reader.read_bits(1)? != 0;
        let compression_type = match self.bit_reader.read_bits(2)? {
            0 => CompressionType::Uncompressed,
            1 => CompressionType::FixedTree,
            2 => CompressionType::DynamicTree,
            _ => CompressionType::Reserved,
        };

        Ok(BlockHeader {
            is_final,
            compression_type,
        })
    }

    /// Decode one block into `output`. Returns whether it was the final
    /// block of the stream.
    pub fn decode_block(&mut self, output: &mut OutputBuffer<'_>) -> Result<bool> {
        let block_header = self.read_header()?;

        match block_header.compression_type {
            CompressionType::Uncompressed => {
                // LEN/NLEN start on the next byte boundary.
                self.bit_reader.align_to_byte();
                let len = self.bit_reader.read_bits(16)?;
                let nlen = self.bit_reader.read_bits(16)?;

                if nlen != !len {
                    return Err(DecodeError::corrupt("stored block length check failed"));
                }

                let data = self.bit_reader.take_bytes(len as usize)?;
                output.write_all(data)?;
            }

            CompressionType::FixedTree => {
                let (litlen_code, dist_code) = fixed_litlen_distance_trees()?;
                self.decode_body(&litlen_code, &dist_code, output)?;
            }

            CompressionType::DynamicTree => {
                let (litlen_code, dist_code) = decode_litlen_distance_trees(&mut self.bit_reader)?;
                self.decode_body(&litlen_code, &dist_code, output)?;
            }

            CompressionType::Reserved => {
                return Err(DecodeError::corrupt("reserved block type"));
            }
        }

        Ok(block_header.is_final)
    }

    fn decode_body(
        &mut self,
        litlen_code: &HuffmanCoding<LitLenToken>,
        dist_code: &HuffmanCoding<DistanceToken>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        loop {
            match litlen_code.read_symbol(&mut self.bit_reader)? {
                LitLenToken::EndOfBlock => return Ok(()),

                LitLenToken::Literal(byte) => output.write_byte(byte)?,

                LitLenToken::Length { base, extra_bits } => {
                    let length = base + self.bit_reader.read_bits(extra_bits)?;

                    let DistanceToken { base, extra_bits } =
                        dist_code.read_symbol(&mut self.bit_reader)?;
                    let distance = base + self.bit_reader.read_bits(extra_bits)?;

                    output.copy_back(distance as usize, length as usize)?;
                }
            }
        }
    }

    /// Byte-align past the last block and hand back the unconsumed tail.
    pub fn into_remaining(self) -> &'a [u8] {
        self.bit_reader.into_remaining()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Result<Vec<u8>> {
        let mut reader = DeflateReader::new(data);
        let mut output = OutputBuffer::with_capacity(0);
        while !reader.decode_block(&mut output)? {}
        Ok(output.into_vec())
    }

    #[test]
    fn stored_block() -> anyhow::Result<()> {
        // BFINAL=1 BTYPE=00, aligned LEN=5 NLEN=!5, then the raw bytes
        let data = [0x01, 0x05, 0x00, 0xfa, 0xff, b'H', b'e', b'l', b'l', b'o'];
        assert_eq!(decode_all(&data)?, b"Hello");
        Ok(())
    }

    #[test]
    fn stored_block_empty() -> anyhow::Result<()> {
        let data = [0x01, 0x00, 0x00, 0xff, 0xff];
        assert_eq!(decode_all(&data)?, b"");
        Ok(())
    }

    #[test]
    fn stored_block_nlen_mismatch() {
        let data = [0x01, 0x05, 0x00, 0xfa, 0xfe, b'H', b'e', b'l', b'l', b'o'];
        assert!(matches!(
            decode_all(&data),
            Err(DecodeError::InvalidFile { .. })
        ));
    }

    #[test]
    fn stored_block_truncated_payload() {
        let data = [0x01, 0x05, 0x00, 0xfa, 0xff, b'H', b'e'];
        assert!(decode_all(&data).is_err());
    }

    #[test]
    fn fixed_block_empty() -> anyhow::Result<()> {
        // BFINAL=1, BTYPE=01, then the 7-bit end-of-block code 0000000
        assert_eq!(decode_all(&[0x03, 0x00])?, b"");
        Ok(())
    }

    #[test]
    fn two_stored_blocks() -> anyhow::Result<()> {
        let data = [
            0x00, 0x02, 0x00, 0xfd, 0xff, b'a', b'b', // BFINAL=0
            0x01, 0x01, 0x00, 0xfe, 0xff, b'c', // BFINAL=1
        ];
        assert_eq!(decode_all(&data)?, b"abc");
        Ok(())
    }

    #[test]
    fn reserved_block_type() {
        // BFINAL=1, BTYPE=11
        assert!(matches!(
            decode_all(&[0x07]),
            Err(DecodeError::InvalidFile { .. })
        ));
    }

    #[test]
    fn remaining_bytes_after_final_block() -> anyhow::Result<()> {
        let data = [0x01, 0x01, 0x00, 0xfe, 0xff, b'x', 0xde, 0xad];
        let mut reader = DeflateReader::new(&data);
        let mut output = OutputBuffer::with_capacity(0);
        assert!(reader.decode_block(&mut output)?);
        assert_eq!(reader.into_remaining(), &[0xde, 0xad]);
        Ok(())
    }
}
