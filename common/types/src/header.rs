use std::cmp::Ordering;
use std::fmt::Formatter;

use getset::{CopyGetters, Getters};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use codec::{CodecError, Decoder, Encoder, Reader, Writer};
use primitive_types::H256;

use crate::BlockHash;

/// Compressed secp256k1 public key of the block proposer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PubKey([u8; PubKey::SIZE]);

impl PubKey {
    pub const SIZE: usize = 33;

    pub fn new(bytes: [u8; PubKey::SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for PubKey {
    fn default() -> Self {
        Self([0; PubKey::SIZE])
    }
}

impl std::fmt::Debug for PubKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)?;
        let bytes: [u8; PubKey::SIZE] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| D::Error::invalid_length(raw.len(), &"33 bytes"))?;
        Ok(Self(bytes))
    }
}

impl Encoder for PubKey {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> codec::Result<()> {
        self.0.encode_to(writer)
    }
}

impl Decoder for PubKey {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> codec::Result<Self> {
        Ok(Self(reader.read_array()?))
    }
}

/// Fixed-width header of a transaction block.
///
/// `num_micro_block_hashes` is the number of shard entries the block body
/// carries.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct TxBlockHeader {
    #[getset(get_copy = "pub")]
    block_type: u8,
    #[getset(get_copy = "pub")]
    version: u32,
    #[getset(get_copy = "pub")]
    gas_limit: u64,
    #[getset(get_copy = "pub")]
    gas_used: u64,
    #[getset(get = "pub")]
    prev_hash: BlockHash,
    #[getset(get_copy = "pub")]
    block_num: u64,
    #[getset(get_copy = "pub")]
    timestamp: u64,
    #[getset(get = "pub")]
    state_root_hash: H256,
    #[getset(get = "pub")]
    state_delta_hash: H256,
    #[getset(get_copy = "pub")]
    num_txs: u32,
    #[getset(get_copy = "pub")]
    num_micro_block_hashes: u32,
    #[getset(get = "pub")]
    miner_pub_key: PubKey,
    #[getset(get_copy = "pub")]
    ds_block_num: u64,
    #[getset(get = "pub")]
    ds_block_hash: BlockHash,
}

impl TxBlockHeader {
    pub const SIZE: usize = 1 + 4 + 8 + 8 + 32 + 8 + 8 + 32 + 32 + 4 + 4 + PubKey::SIZE + 8 + 32;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        block_type: u8,
        version: u32,
        gas_limit: u64,
        gas_used: u64,
        prev_hash: BlockHash,
        block_num: u64,
        timestamp: u64,
        state_root_hash: H256,
        state_delta_hash: H256,
        num_txs: u32,
        num_micro_block_hashes: u32,
        miner_pub_key: PubKey,
        ds_block_num: u64,
        ds_block_hash: BlockHash,
    ) -> Self {
        Self {
            block_type,
            version,
            gas_limit,
            gas_used,
            prev_hash,
            block_num,
            timestamp,
            state_root_hash,
            state_delta_hash,
            num_txs,
            num_micro_block_hashes,
            miner_pub_key,
            ds_block_num,
            ds_block_hash,
        }
    }

    /// The placeholder header carries the maximum block number.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for TxBlockHeader {
    fn default() -> Self {
        Self {
            block_type: 0,
            version: 0,
            gas_limit: 0,
            gas_used: 0,
            prev_hash: H256::zero(),
            block_num: u64::MAX,
            timestamp: 0,
            state_root_hash: H256::zero(),
            state_delta_hash: H256::zero(),
            num_txs: 0,
            num_micro_block_hashes: 0,
            miner_pub_key: PubKey::default(),
            ds_block_num: 0,
            ds_block_hash: H256::zero(),
        }
    }
}

impl Ord for TxBlockHeader {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block_num
            .cmp(&other.block_num)
            .then_with(|| self.ds_block_num.cmp(&other.ds_block_num))
            .then_with(|| {
                let key = |h: &Self| {
                    (
                        h.block_type,
                        h.version,
                        h.gas_limit,
                        h.gas_used,
                        h.prev_hash,
                        h.timestamp,
                        h.state_root_hash,
                        h.state_delta_hash,
                        h.num_txs,
                        h.num_micro_block_hashes,
                        h.miner_pub_key,
                        h.ds_block_hash,
                    )
                };
                key(self).cmp(&key(other))
            })
    }
}

impl PartialOrd for TxBlockHeader {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Encoder for TxBlockHeader {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        Self::SIZE
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> codec::Result<()> {
        writer.put_u8(self.block_type)?;
        writer.put_u32(self.version)?;
        writer.put_u64(self.gas_limit)?;
        writer.put_u64(self.gas_used)?;
        self.prev_hash.encode_to(writer)?;
        writer.put_u64(self.block_num)?;
        writer.put_u64(self.timestamp)?;
        self.state_root_hash.encode_to(writer)?;
        self.state_delta_hash.encode_to(writer)?;
        writer.put_u32(self.num_txs)?;
        writer.put_u32(self.num_micro_block_hashes)?;
        self.miner_pub_key.encode_to(writer)?;
        writer.put_u64(self.ds_block_num)?;
        self.ds_block_hash.encode_to(writer)
    }
}

impl Decoder for TxBlockHeader {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> codec::Result<Self> {
        // Fail before reading any field if the fixed width is not available.
        if reader.remaining() < Self::SIZE {
            return Err(CodecError::UnexpectedEof {
                offset: reader.position(),
                needed: Self::SIZE,
                remaining: reader.remaining(),
            });
        }
        Ok(Self {
            block_type: reader.read_u8()?,
            version: reader.read_u32()?,
            gas_limit: reader.read_u64()?,
            gas_used: reader.read_u64()?,
            prev_hash: H256::decode_from(reader)?,
            block_num: reader.read_u64()?,
            timestamp: reader.read_u64()?,
            state_root_hash: H256::decode_from(reader)?,
            state_delta_hash: H256::decode_from(reader)?,
            num_txs: reader.read_u32()?,
            num_micro_block_hashes: reader.read_u32()?,
            miner_pub_key: PubKey::decode_from(reader)?,
            ds_block_num: reader.read_u64()?,
            ds_block_hash: H256::decode_from(reader)?,
        })
    }
}
