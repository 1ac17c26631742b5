use serde::{Deserialize, Serialize};

use codec::{CodecError, Decoder, Encoder, Reader, Writer};
use primitive_types::H256;

use crate::error::TxBlockError;
use crate::{StateHash, TxHash};

pub const EMPTINESS_BITMAP_WIDTH: usize = u32::BITS as usize;
pub const EMPTINESS_BITMAP_SIZE: usize = std::mem::size_of::<u32>();
pub const SHARD_ID_SIZE: usize = std::mem::size_of::<u32>();
/// Shard id followed by the two digests of its hash pair.
pub const SHARD_ENTRY_SIZE: usize = SHARD_ID_SIZE + HashPair::SIZE;

/// Transaction-root and state-delta digests committed by one shard.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashPair {
    tx_root_hash: TxHash,
    state_delta_hash: StateHash,
}

impl HashPair {
    pub const SIZE: usize = 64;

    pub fn new(tx_root_hash: TxHash, state_delta_hash: StateHash) -> Self {
        Self {
            tx_root_hash,
            state_delta_hash,
        }
    }

    pub fn tx_root_hash(&self) -> &TxHash {
        &self.tx_root_hash
    }

    pub fn state_delta_hash(&self) -> &StateHash {
        &self.state_delta_hash
    }
}

impl Encoder for HashPair {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> codec::Result<()> {
        self.tx_root_hash.encode_to(writer)?;
        self.state_delta_hash.encode_to(writer)
    }
}

impl Decoder for HashPair {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> codec::Result<Self> {
        let tx_root_hash = H256::decode_from(reader)?;
        let state_delta_hash = H256::decode_from(reader)?;
        Ok(Self::new(tx_root_hash, state_delta_hash))
    }
}

/// Per-shard "no transactions" flags, packed LSB first into a `u32` on the
/// wire. Never holds more than [`EMPTINESS_BITMAP_WIDTH`] flags.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EmptinessBitmap(Vec<bool>);

impl EmptinessBitmap {
    pub fn from_flags(flags: Vec<bool>) -> Result<Self, TxBlockError> {
        check_width(flags.len())?;
        Ok(Self(flags))
    }

    /// Expands the low `count` bits of `value`; higher bits are ignored.
    pub fn unpack(value: u32, count: usize) -> Result<Self, TxBlockError> {
        check_width(count)?;
        Ok(Self((0..count).map(|i| (value >> i) & 1 == 1).collect()))
    }

    pub fn pack(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, empty)| **empty)
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether shard entry `index` carried no transactions.
    pub fn is_shard_empty(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

fn check_width(count: usize) -> Result<(), TxBlockError> {
    if count > EMPTINESS_BITMAP_WIDTH {
        return Err(TxBlockError::BitmapOverflow {
            count,
            width: EMPTINESS_BITMAP_WIDTH,
        });
    }
    Ok(())
}
