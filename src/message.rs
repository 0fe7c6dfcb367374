//! Encoding of the giver's `mine` message
//!
//! Layout, in order: op (32) · expire (32) · mint_to (addr_std, 267) ·
//! data1 = nonce (256) · seed (128) · data2 = nonce (256). The contract checks
//! the representation hash of this cell against its complexity.

use crate::cell::{Cell, CellBuilder, ADDRESS_BITS};
use crate::crypto::Sha256Hasher;
use crate::types::MineMessageParams;
use crate::Result;
use num_bigint::BigUint;

/// `"Mine"` in ASCII
pub const OP_MINE: u32 = 0x4d69_6e65;

pub const OP_BITS: usize = 32;
pub const EXPIRE_BITS: usize = 32;
pub const NONCE_BITS: usize = 256;
pub const SEED_BITS: usize = 128;

/// Total data bits of an encoded `mine` message
pub const MINE_MESSAGE_BITS: usize =
    OP_BITS + EXPIRE_BITS + ADDRESS_BITS + NONCE_BITS + SEED_BITS + NONCE_BITS;

/// A serialized `mine` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEncoding {
    cell: Cell,
}

impl MessageEncoding {
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Representation hash of the message cell
    pub fn hash(&self) -> [u8; 32] {
        self.cell.hash()
    }

    /// Same as [`hash`](Self::hash), reusing `hasher`
    pub fn hash_with(&self, hasher: &mut Sha256Hasher) -> [u8; 32] {
        self.cell.hash_with(hasher)
    }

    /// The hash as an unsigned big-endian integer
    pub fn hash_value(&self) -> BigUint {
        BigUint::from_bytes_be(&self.hash())
    }

    /// Bag-of-cells bytes, the form a wallet attaches as message body
    pub fn to_boc(&self) -> Result<Vec<u8>> {
        self.cell.to_boc()
    }
}

impl MineMessageParams {
    /// Serialize into the canonical message cell
    ///
    /// Fails when a field exceeds its width. Expiry is not checked against
    /// the current time.
    pub fn encode(&self) -> Result<MessageEncoding> {
        let mut builder = CellBuilder::new();
        builder
            .store_u64(OP_MINE as u64, OP_BITS)?
            .store_u64(self.expire, EXPIRE_BITS)?
            .store_address(&self.mint_to)?
            .store_uint(&self.nonce, NONCE_BITS)?
            .store_uint(&self.seed, SEED_BITS)?
            .store_uint(&self.nonce, NONCE_BITS)?;

        Ok(MessageEncoding {
            cell: builder.build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::Error;
    use assert_matches::assert_matches;

    const COLLECTION: &str = "EQDk8N7xM5D669LC2YACrseBJtDyFqwtSPCNhRWXU7kjEptX";

    fn sample_params() -> MineMessageParams {
        MineMessageParams {
            expire: 1_700_000_000,
            mint_to: COLLECTION.parse().unwrap(),
            nonce: BigUint::from(0u32),
            seed: BigUint::parse_bytes(b"1234567890abcdef1234567890abcdef", 16).unwrap(),
        }
    }

    #[test]
    fn test_message_width() {
        let encoding = sample_params().encode().unwrap();
        assert_eq!(MINE_MESSAGE_BITS, 971);
        assert_eq!(encoding.cell().bit_len(), MINE_MESSAGE_BITS);
        assert_eq!(&encoding.cell().data()[..4], b"Mine");
    }

    #[test]
    fn test_known_hash() {
        let encoding = sample_params().encode().unwrap();
        assert_eq!(
            hex::encode(encoding.hash()),
            "9a9c2eb662aa15110dfc9c5749bf0aa0af092acf7a3b750a266e764977d3bc78"
        );
        assert_eq!(encoding.hash_value(), BigUint::from_bytes_be(&encoding.hash()));

        let mut params = sample_params();
        params.nonce = BigUint::from(1u32);
        assert_eq!(
            hex::encode(params.encode().unwrap().hash()),
            "151ac5fdfd11593dba4c21c678b3cc0fa1b9b2db15111ecbf4d02da0091482bc"
        );
    }

    #[test]
    fn test_masterchain_recipient() {
        let params = MineMessageParams {
            expire: 1_700_000_000,
            mint_to: Address::new(-1, [0u8; 32]),
            nonce: BigUint::from(7u32),
            seed: BigUint::from(5u32),
        };
        assert_eq!(
            hex::encode(params.encode().unwrap().hash()),
            "bc88c429c25e6faacc73dce6b75346c9a98db526e63950a81fefd38a5d2061c1"
        );
    }

    #[test]
    fn test_known_boc() {
        let boc = sample_params().encode().unwrap().to_boc().unwrap();
        assert_eq!(boc.len(), 139);
        assert_eq!(
            hex::encode(boc),
            concat!(
                "b5ee9c7241010101007c0000f34d696e656553f100801c9e1bde26721f5d7a585b3000",
                "55d8f024da1e42d585a91e11b0a2b2ea77246240000000000000000000000000000000",
                "0000000000000000000000000000000002468acf121579bde2468acf121579bde00000",
                "0000000000000000000000000000000000000000000000000000000000106faafd00"
            )
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let params = sample_params();
        let first = params.encode().unwrap();
        let second = params.encode().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.hash(), second.hash());
    }

    #[test]
    fn test_expired_message_still_encodes() {
        let mut params = sample_params();
        params.expire = 0;
        assert!(params.encode().is_ok());
    }

    #[test]
    fn test_out_of_range_fields() {
        let mut params = sample_params();
        params.expire = u32::MAX as u64 + 1;
        assert_matches!(params.encode(), Err(Error::Encoding { .. }));

        let mut params = sample_params();
        params.nonce = BigUint::from(1u8) << 256usize;
        assert_matches!(params.encode(), Err(Error::Encoding { .. }));

        let mut params = sample_params();
        params.seed = BigUint::from(1u8) << 128usize;
        assert_matches!(params.encode(), Err(Error::Encoding { .. }));
    }

    #[test]
    fn test_widest_values_fit() {
        let params = MineMessageParams {
            expire: u32::MAX as u64,
            mint_to: Address::new(-1, [0xff; 32]),
            nonce: (BigUint::from(1u8) << 256usize) - 1u32,
            seed: (BigUint::from(1u8) << 128usize) - 1u32,
        };
        assert_eq!(params.encode().unwrap().cell().bit_len(), MINE_MESSAGE_BITS);
    }
}
