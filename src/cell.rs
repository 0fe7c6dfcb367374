//! Minimal TON cell construction
//!
//! Only what the mine message needs: a bit-level builder for a single cell
//! without references, its representation hash, and a one-cell bag-of-cells
//! container for transport.

use crate::address::Address;
use crate::crypto::{crc32c, Sha256Hasher};
use crate::{Error, Result};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use num_bigint::BigUint;

/// Data capacity of a single cell
pub const MAX_CELL_BITS: usize = 1023;

/// Width of a serialized `addr_std` without anycast
pub const ADDRESS_BITS: usize = 267;

const BOC_MAGIC: u32 = 0xb5ee_9c72;
const BOC_HAS_CRC32C: u8 = 0x40;

/// Bit-level builder for a cell without references
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_CELL_BITS.div_ceil(8)),
            bit_len: 0,
        }
    }

    /// Number of bits stored so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    fn ensure_capacity(&self, bits: usize) -> Result<()> {
        if self.bit_len + bits > MAX_CELL_BITS {
            return Err(Error::encoding(format!(
                "cell overflow: {} + {} bits exceeds {}",
                self.bit_len, bits, MAX_CELL_BITS
            )));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        let offset = self.bit_len % 8;
        if offset == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(byte) = self.data.last_mut() {
                *byte |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.ensure_capacity(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store an unsigned integer of at most 64 bits, big-endian
    pub fn store_u64(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(Error::encoding(format!(
                "value {} does not fit in {} bits",
                value, bits
            )));
        }
        self.ensure_capacity(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store an arbitrary-precision unsigned integer, big-endian
    pub fn store_uint(&mut self, value: &BigUint, bits: usize) -> Result<&mut Self> {
        if value.bits() > bits as u64 {
            return Err(Error::encoding(format!(
                "value needs {} bits but the field is {} bits wide",
                value.bits(),
                bits
            )));
        }
        self.ensure_capacity(bits)?;
        for i in (0..bits as u64).rev() {
            self.push_bit(value.bit(i));
        }
        Ok(self)
    }

    /// Store a two's complement 8-bit integer
    pub fn store_i8(&mut self, value: i8) -> Result<&mut Self> {
        self.store_u64(value as u8 as u64, 8)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.ensure_capacity(bytes.len() * 8)?;
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
        } else {
            for &byte in bytes {
                for i in (0..8).rev() {
                    self.push_bit((byte >> i) & 1 == 1);
                }
            }
        }
        Ok(self)
    }

    /// Store `addr_std$10 anycast:nothing$0 workchain_id:int8 address:bits256`
    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self> {
        self.ensure_capacity(ADDRESS_BITS)?;
        self.store_u64(0b10, 2)?
            .store_bit(false)?
            .store_i8(address.workchain())?
            .store_bytes(address.account_id())
    }

    pub fn build(self) -> Cell {
        Cell {
            data: self.data,
            bit_len: self.bit_len,
        }
    }
}

/// An ordinary cell with data and no references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
}

impl Cell {
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Stored bytes; bits past `bit_len` are zero
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Descriptor bytes d1 (refs, exotic, level) and d2 (data length)
    pub fn descriptors(&self) -> [u8; 2] {
        let floor = self.bit_len / 8;
        let ceil = self.bit_len.div_ceil(8);
        [0, (floor + ceil) as u8]
    }

    /// Data with completion tag: a single 1 bit after the last data bit
    pub fn padded_data(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        let offset = self.bit_len % 8;
        if offset != 0 {
            if let Some(byte) = data.last_mut() {
                *byte |= 0x80 >> offset;
            }
        }
        data
    }

    /// Representation hash
    pub fn hash(&self) -> [u8; 32] {
        self.hash_with(&mut Sha256Hasher::new())
    }

    /// Representation hash computed with a caller-owned hasher
    pub fn hash_with(&self, hasher: &mut Sha256Hasher) -> [u8; 32] {
        hasher.hash_parts(&[&self.descriptors(), &self.padded_data()])
    }

    /// Standard cell serialization: descriptors followed by padded data
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.data.len());
        bytes.extend_from_slice(&self.descriptors());
        bytes.extend_from_slice(&self.padded_data());
        bytes
    }

    /// Serialize as a bag-of-cells with this cell as the only root
    pub fn to_boc(&self) -> Result<Vec<u8>> {
        let cell_bytes = self.serialize();
        // one cell, so every cell index fits in a single byte
        let size_bytes = 1usize;
        let off_bytes = bytes_for(cell_bytes.len() as u64);

        let mut boc = Vec::with_capacity(16 + cell_bytes.len());
        boc.write_u32::<BigEndian>(BOC_MAGIC)?;
        boc.write_u8(BOC_HAS_CRC32C | size_bytes as u8)?;
        boc.write_u8(off_bytes as u8)?;
        boc.write_uint::<BigEndian>(1, size_bytes)?; // cells
        boc.write_uint::<BigEndian>(1, size_bytes)?; // roots
        boc.write_uint::<BigEndian>(0, size_bytes)?; // absent
        boc.write_uint::<BigEndian>(cell_bytes.len() as u64, off_bytes)?;
        boc.write_uint::<BigEndian>(0, size_bytes)?; // root index
        boc.extend_from_slice(&cell_bytes);

        let checksum = crc32c(&boc);
        boc.write_u32::<LittleEndian>(checksum)?;
        Ok(boc)
    }
}

/// Minimal number of bytes needed to hold `value`, at least one
fn bytes_for(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_unaligned_bits() {
        let mut builder = CellBuilder::new();
        builder.store_u64(0b101, 3).unwrap();
        let cell = builder.build();

        assert_eq!(cell.bit_len(), 3);
        assert_eq!(cell.data(), &[0xa0]);
        assert_eq!(cell.padded_data(), vec![0xb0]);
        assert_eq!(cell.descriptors(), [0, 1]);
    }

    #[test]
    fn test_aligned_bits_have_no_tag() {
        let mut builder = CellBuilder::new();
        builder.store_u64(0xab, 8).unwrap().store_u64(0xcd, 8).unwrap();
        let cell = builder.build();

        assert_eq!(cell.padded_data(), vec![0xab, 0xcd]);
        assert_eq!(cell.descriptors(), [0, 4]);
    }

    #[test]
    fn test_empty_cell_hash() {
        let cell = CellBuilder::new().build();
        assert_eq!(
            hex::encode(cell.hash()),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn test_empty_cell_boc() {
        let boc = CellBuilder::new().build().to_boc().unwrap();
        assert_eq!(hex::encode(boc), "b5ee9c724101010100020000004cacb9cd");
    }

    #[test]
    fn test_three_bit_cell() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap().store_bit(false).unwrap().store_bit(true).unwrap();
        let cell = builder.build();

        assert_eq!(
            hex::encode(cell.hash()),
            "c8235418b5cd55bc46073ea5cf9f3aac5a594ed782bee88dcd0acfd8ede4c756"
        );
        assert_eq!(
            hex::encode(cell.to_boc().unwrap()),
            "b5ee9c72410101010003000001b083bd2ec7"
        );
    }

    #[test]
    fn test_hash_with_reused_hasher() {
        let mut hasher = Sha256Hasher::new();
        let mut builder = CellBuilder::new();
        builder.store_u64(0b101, 3).unwrap();
        let cell = builder.build();

        let empty = CellBuilder::new().build();
        assert_eq!(cell.hash_with(&mut hasher), cell.hash());
        assert_eq!(empty.hash_with(&mut hasher), empty.hash());
        assert_eq!(cell.hash_with(&mut hasher), cell.hash());
    }

    #[test]
    fn test_unaligned_bytes() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap().store_bytes(&[0xff, 0x00]).unwrap();
        let cell = builder.build();

        assert_eq!(cell.bit_len(), 17);
        assert_eq!(cell.data(), &[0xff, 0x80, 0x00]);
    }

    #[test]
    fn test_big_uint_storage() {
        let mut builder = CellBuilder::new();
        builder.store_uint(&BigUint::from(0x1234u32), 24).unwrap();
        assert_eq!(builder.build().data(), &[0x00, 0x12, 0x34]);
    }

    #[test]
    fn test_value_too_wide() {
        let mut builder = CellBuilder::new();
        assert_matches!(builder.store_u64(256, 8), Err(Error::Encoding { .. }));

        let too_big = BigUint::from(1u8) << 128usize;
        assert_matches!(builder.store_uint(&too_big, 128), Err(Error::Encoding { .. }));
        assert_eq!(builder.bit_len(), 0);
    }

    #[test]
    fn test_cell_overflow() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&[0u8; 127]).unwrap();
        builder.store_u64(0, 7).unwrap();
        assert_eq!(builder.bit_len(), MAX_CELL_BITS);
        assert_matches!(builder.store_bit(true), Err(Error::Encoding { .. }));
    }

    #[test]
    fn test_address_width() {
        let mut builder = CellBuilder::new();
        builder.store_address(&Address::new(-1, [0u8; 32])).unwrap();
        let cell = builder.build();

        assert_eq!(cell.bit_len(), ADDRESS_BITS);
        // 10 0 11111111 ...
        assert_eq!(cell.data()[0], 0b1001_1111);
        assert_eq!(cell.data()[1], 0b1110_0000);
    }

    #[test]
    fn test_bytes_for() {
        assert_eq!(bytes_for(0), 1);
        assert_eq!(bytes_for(124), 1);
        assert_eq!(bytes_for(256), 2);
    }
}
