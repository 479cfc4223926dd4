//! Flat guest memory image.
//!
//! A single contiguous region starting at a base address. Accesses are
//! little-endian and must be naturally aligned.

use mrec_isa::MemoryReader;
use thiserror::Error;

/// Guest memory access error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("access of {width} bytes at {address:#010x} is outside guest memory")]
    OutOfBounds { address: u32, width: u8 },

    #[error("unaligned access of {width} bytes at {address:#010x}")]
    Unaligned { address: u32, width: u8 },
}

/// Guest memory region `[base, base + len)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuestMemory {
    base: u32,
    data: Vec<u8>,
}

impl GuestMemory {
    /// Create a zero-filled region.
    #[must_use]
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            data: vec![0; size],
        }
    }

    /// Create a region holding `image`.
    #[must_use]
    pub const fn from_image(base: u32, image: Vec<u8>) -> Self {
        Self { base, data: image }
    }

    /// Create a region from instruction words laid out from `base`.
    #[must_use]
    pub fn from_words(base: u32, words: &[u32]) -> Self {
        let data = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self { base, data }
    }

    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One past the last mapped address.
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.base) + u64::try_from(self.data.len()).unwrap_or(u64::MAX)
    }

    /// Check if `[address, address + width)` is mapped.
    #[must_use]
    pub fn contains(&self, address: u32, width: u8) -> bool {
        self.offset(address, width).is_some()
    }

    /// Grow the region with zeroes up to `size` bytes.
    pub fn resize(&mut self, size: usize) {
        self.data.resize(size, 0);
    }

    /// Raw bytes of the region.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, address: u32, width: u8) -> Option<usize> {
        let offset = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = offset.checked_add(usize::from(width))?;
        (end <= self.data.len()).then_some(offset)
    }

    fn check(&self, address: u32, width: u8) -> Result<usize, MemoryError> {
        if address % u32::from(width) != 0 {
            return Err(MemoryError::Unaligned { address, width });
        }
        self.offset(address, width)
            .ok_or(MemoryError::OutOfBounds { address, width })
    }

    fn bytes<const N: usize>(&self, address: u32) -> Result<[u8; N], MemoryError> {
        let width = u8::try_from(N).unwrap_or(u8::MAX);
        let offset = self.check(address, width)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[offset..offset + N]);
        Ok(out)
    }

    fn put<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> Result<(), MemoryError> {
        let width = u8::try_from(N).unwrap_or(u8::MAX);
        let offset = self.check(address, width)?;
        self.data[offset..offset + N].copy_from_slice(&bytes);
        Ok(())
    }

    /// Load a byte.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::OutOfBounds` when the address is unmapped.
    pub fn load8(&self, address: u32) -> Result<u8, MemoryError> {
        self.bytes::<1>(address).map(|[b]| b)
    }

    /// Load a little-endian halfword.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is unmapped or not 2-byte aligned.
    pub fn load16(&self, address: u32) -> Result<u16, MemoryError> {
        self.bytes(address).map(u16::from_le_bytes)
    }

    /// Load a little-endian word.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is unmapped or not 4-byte aligned.
    pub fn load32(&self, address: u32) -> Result<u32, MemoryError> {
        self.bytes(address).map(u32::from_le_bytes)
    }

    /// Store a byte.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::OutOfBounds` when the address is unmapped.
    pub fn store8(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        self.put(address, [value])
    }

    /// Store a little-endian halfword.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is unmapped or not 2-byte aligned.
    pub fn store16(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        self.put(address, value.to_le_bytes())
    }

    /// Store a little-endian word.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is unmapped or not 4-byte aligned.
    pub fn store32(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        self.put(address, value.to_le_bytes())
    }

    /// Store `bytes` starting at `address`, with no alignment requirement.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::OutOfBounds` if any byte falls outside the region.
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let out_of_bounds = MemoryError::OutOfBounds {
            address,
            width: u8::try_from(bytes.len()).unwrap_or(u8::MAX),
        };
        let offset = address
            .checked_sub(self.base)
            .and_then(|o| usize::try_from(o).ok())
            .ok_or(out_of_bounds)?;
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= self.data.len())
            .ok_or(out_of_bounds)?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

impl MemoryReader for GuestMemory {
    /// Unmapped or unaligned reads yield `0`, which decodes as `nop`.
    fn read_word(&self, address: u32) -> u32 {
        self.load32(address).unwrap_or(0)
    }
}
