#![forbid(unsafe_code)]

use crate::error::{DecodeError, Result};

////////////////////////////////////////////////////////////////////////////////

/// Where decoded bytes land: an owned, growing vector, or a caller-supplied
/// region with a fill cursor. Every already-produced byte stays addressable
/// so back-references can read it and the framer can checksum it.
pub struct OutputBuffer<'a> {
    storage: Storage<'a>,
}

enum Storage<'a> {
    Owned(Vec<u8>),
    Fixed { region: &'a mut [u8], filled: usize },
}

impl OutputBuffer<'static> {
    /// Owned storage; `capacity` is a pre-allocation hint only.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Storage::Owned(Vec::with_capacity(capacity)),
        }
    }
}

impl<'a> OutputBuffer<'a> {
    /// Caller-supplied storage. Writes beyond `region` fail with `NoSpace`
    /// and never touch memory past the region.
    pub fn fixed(region: &'a mut [u8]) -> OutputBuffer<'a> {
        OutputBuffer {
            storage: Storage::Fixed { region, filled: 0 },
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        match &mut self.storage {
            Storage::Owned(bytes) => bytes.push(byte),
            Storage::Fixed { region, filled } => {
                if *filled >= region.len() {
                    return Err(DecodeError::NoSpace {
                        needed: *filled + 1,
                        available: region.len(),
                    });
                }
                region[*filled] = byte;
                *filled += 1;
            }
        }
        Ok(())
    }

    /// All-or-nothing append of a whole slice.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.storage {
            Storage::Owned(out) => out.extend_from_slice(bytes),
            Storage::Fixed { region, filled } => {
                let needed = *filled + bytes.len();
                if needed > region.len() {
                    return Err(DecodeError::NoSpace {
                        needed,
                        available: region.len(),
                    });
                }
                region[*filled..needed].copy_from_slice(bytes);
                *filled = needed;
            }
        }
        Ok(())
    }

    /// Append `length` bytes starting `distance` bytes before the cursor.
    /// Copies one byte at a time: an overlapping reference (distance <
    /// length) must see the bytes the same copy just produced.
    pub fn copy_back(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.byte_count() {
            return Err(DecodeError::corrupt(
                "back-reference reaches before the output start",
            ));
        }

        for _ in 0..length {
            let byte = self.produced()[self.byte_count() - distance];
            self.write_byte(byte)?;
        }

        Ok(())
    }

    pub fn byte_count(&self) -> usize {
        self.produced().len()
    }

    pub fn produced(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(bytes) => bytes,
            Storage::Fixed { region, filled } => &region[..*filled],
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Owned(bytes) => bytes,
            Storage::Fixed { region, filled } => region[..filled].to_vec(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
