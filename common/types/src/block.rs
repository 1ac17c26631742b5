use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use getset::Getters;
use serde::Serialize;
use tracing::debug;

use codec::{Decoder, Encoder, Reader, Writer};

use crate::config::DecodeLimits;
use crate::cosig::CoSignatures;
use crate::error::TxBlockError;
use crate::header::TxBlockHeader;
use crate::ShardId;
use crate::shard::{EmptinessBitmap, HashPair, EMPTINESS_BITMAP_SIZE, SHARD_ENTRY_SIZE};

const TXBLOCK_LOG_TARGET: &str = "txblock";

/// A transaction block: header, one `(shard id, hash pair, emptiness flag)`
/// entry per shard, and the consensus co-signatures.
///
/// Values come from [`TxBlock::new`], [`TxBlockBuilder`] or decoding, all of
/// which check that every per-shard sequence has the length the header
/// declares and that the co-signatures are encodable. Fields are never
/// mutated afterwards, so every constructed block encodes.
///
/// Identity is the header plus the hash pairs; shard ids, emptiness flags and
/// co-signatures do not take part in equality, ordering or hashing.
#[derive(Serialize, Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct TxBlock {
    header: TxBlockHeader,
    is_micro_block_empty: EmptinessBitmap,
    micro_block_hashes: Vec<HashPair>,
    shard_ids: Vec<ShardId>,
    cosigs: CoSignatures,
}

impl TxBlock {
    /// Smallest prefix that can start a block.
    pub const MIN_SIZE: usize = TxBlockHeader::SIZE;

    pub fn new(
        header: TxBlockHeader,
        is_micro_block_empty: Vec<bool>,
        micro_block_hashes: Vec<HashPair>,
        shard_ids: Vec<ShardId>,
        cosigs: CoSignatures,
    ) -> Result<Self, TxBlockError> {
        let is_micro_block_empty = EmptinessBitmap::from_flags(is_micro_block_empty)?;
        Self::from_parts(header, is_micro_block_empty, micro_block_hashes, shard_ids, cosigs)
    }

    pub fn builder(header: TxBlockHeader) -> TxBlockBuilder {
        TxBlockBuilder::new(header)
    }

    /// The recognised invalid block: placeholder header, no shard entries,
    /// blank co-signatures.
    pub fn placeholder() -> Self {
        Self {
            header: TxBlockHeader::default(),
            is_micro_block_empty: EmptinessBitmap::default(),
            micro_block_hashes: Vec::new(),
            shard_ids: Vec::new(),
            cosigs: CoSignatures::default(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.header.is_placeholder() && self.micro_block_hashes.is_empty()
    }

    /// Number of shard entries, as declared by the header.
    pub fn shard_entry_count(&self) -> usize {
        self.header.num_micro_block_hashes() as usize
    }

    /// Iterates shard entries in block order.
    pub fn shard_entries(&self) -> impl Iterator<Item = (ShardId, &HashPair, bool)> + '_ {
        self.shard_ids
            .iter()
            .zip(self.micro_block_hashes.iter())
            .zip(self.is_micro_block_empty.as_slice().iter())
            .map(|((shard_id, hashes), empty)| (*shard_id, hashes, *empty))
    }

    pub fn serialized_size(&self) -> usize {
        self.encoded_size()
    }

    /// Decodes a block at `offset`, refusing blocks larger than the limits
    /// allow. Only the first `max_block_size` bytes from `offset` are read, so
    /// the buffer may carry further data after the block.
    pub fn decode_with_limits(
        src: &[u8],
        offset: usize,
        limits: &DecodeLimits,
    ) -> Result<(Self, usize), TxBlockError> {
        let window_end = offset.saturating_add(limits.max_block_size);
        let clamped = window_end < src.len();
        let window = &src[..window_end.min(src.len())];

        let mut reader = Reader::new(window, offset);
        let result = Self::read_header(&mut reader).and_then(|header| {
            if header.num_micro_block_hashes() > limits.max_shard_entries {
                return Err(TxBlockError::LimitExceeded {
                    what: "shard entry count",
                    value: header.num_micro_block_hashes() as usize,
                    limit: limits.max_shard_entries as usize,
                });
            }
            Self::read_body(header, &mut reader).map_err(|error| Self::rejected(offset, error))
        });
        match result {
            Ok(block) => Ok((block, reader.position() - offset)),
            Err(error) if clamped && error.is_truncation() => Err(TxBlockError::LimitExceeded {
                what: "block size",
                value: src.len() - offset,
                limit: limits.max_block_size,
            }),
            Err(error) => Err(error),
        }
    }

    fn from_parts(
        header: TxBlockHeader,
        is_micro_block_empty: EmptinessBitmap,
        micro_block_hashes: Vec<HashPair>,
        shard_ids: Vec<ShardId>,
        cosigs: CoSignatures,
    ) -> Result<Self, TxBlockError> {
        let block = Self {
            header,
            is_micro_block_empty,
            micro_block_hashes,
            shard_ids,
            cosigs,
        };
        block.validate()?;
        Ok(block)
    }

    fn check_consistency(&self) -> Result<(), TxBlockError> {
        let declared = self.shard_entry_count();
        if self.micro_block_hashes.len() != declared
            || self.shard_ids.len() != declared
            || self.is_micro_block_empty.len() != declared
        {
            return Err(TxBlockError::Consistency {
                header: declared,
                hash_pairs: self.micro_block_hashes.len(),
                shard_ids: self.shard_ids.len(),
                emptiness: self.is_micro_block_empty.len(),
            });
        }
        Ok(())
    }

    fn read_header(reader: &mut Reader<'_>) -> Result<TxBlockHeader, TxBlockError> {
        let offset = reader.position();
        TxBlockHeader::decode_from(reader)
            .map_err(|error| Self::rejected(offset, TxBlockError::HeaderDecode(error)))
    }

    fn read_body(header: TxBlockHeader, reader: &mut Reader<'_>) -> Result<Self, TxBlockError> {
        let count = header.num_micro_block_hashes() as usize;
        let bitmap = reader.read_u32().map_err(TxBlockError::TruncatedInput)?;
        let is_micro_block_empty = EmptinessBitmap::unpack(bitmap, count)?;

        // Every entry must be present before allocating for them.
        let needed = count * SHARD_ENTRY_SIZE;
        if reader.remaining() < needed {
            return Err(TxBlockError::TruncatedInput(codec::CodecError::UnexpectedEof {
                offset: reader.position(),
                needed,
                remaining: reader.remaining(),
            }));
        }

        let mut shard_ids = Vec::with_capacity(count);
        let mut micro_block_hashes = Vec::with_capacity(count);
        for _ in 0..count {
            shard_ids.push(reader.read_u32().map_err(TxBlockError::TruncatedInput)?);
            micro_block_hashes
                .push(HashPair::decode_from(reader).map_err(TxBlockError::TruncatedInput)?);
        }

        let cosigs = CoSignatures::decode_from(reader).map_err(TxBlockError::EnvelopeDecode)?;

        Self::from_parts(header, is_micro_block_empty, micro_block_hashes, shard_ids, cosigs)
    }

    fn rejected(offset: usize, error: TxBlockError) -> TxBlockError {
        debug!(target: TXBLOCK_LOG_TARGET, offset, error = %error, "Rejected tx block");
        error
    }
}

impl Encoder for TxBlock {
    type Error = TxBlockError;

    fn encoded_size(&self) -> usize {
        TxBlockHeader::SIZE
            + EMPTINESS_BITMAP_SIZE
            + self.micro_block_hashes.len() * SHARD_ENTRY_SIZE
            + self.cosigs.encoded_size()
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> Result<(), TxBlockError> {
        self.validate()?;
        self.header.encode_to(writer)?;
        writer.put_u32(self.is_micro_block_empty.pack())?;
        for (shard_id, hashes) in self.shard_ids.iter().zip(self.micro_block_hashes.iter()) {
            writer.put_u32(*shard_id)?;
            hashes.encode_to(writer)?;
        }
        self.cosigs.encode_to(writer)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), TxBlockError> {
        self.check_consistency()?;
        self.cosigs.validate()?;
        Ok(())
    }
}

impl Decoder for TxBlock {
    type Error = TxBlockError;

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, TxBlockError> {
        let offset = reader.position();
        let header = Self::read_header(reader)?;
        Self::read_body(header, reader).map_err(|error| Self::rejected(offset, error))
    }
}

impl PartialEq for TxBlock {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.micro_block_hashes == other.micro_block_hashes
    }
}

impl Eq for TxBlock {}

impl Hash for TxBlock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.header.hash(state);
        self.micro_block_hashes.hash(state);
    }
}

impl Ord for TxBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.header
            .cmp(&other.header)
            .then_with(|| self.micro_block_hashes.cmp(&other.micro_block_hashes))
    }
}

impl PartialOrd for TxBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Producer-side construction of a [`TxBlock`].
///
/// Entries can be pushed one shard at a time or supplied as the three
/// parallel sequences; `build` validates them against the header either way.
#[derive(Debug, Clone)]
pub struct TxBlockBuilder {
    header: TxBlockHeader,
    is_micro_block_empty: Vec<bool>,
    micro_block_hashes: Vec<HashPair>,
    shard_ids: Vec<ShardId>,
    cosigs: CoSignatures,
}

impl TxBlockBuilder {
    pub fn new(header: TxBlockHeader) -> Self {
        Self {
            header,
            is_micro_block_empty: Vec::new(),
            micro_block_hashes: Vec::new(),
            shard_ids: Vec::new(),
            cosigs: CoSignatures::default(),
        }
    }

    pub fn shard_entry(mut self, shard_id: ShardId, hashes: HashPair, is_empty: bool) -> Self {
        self.shard_ids.push(shard_id);
        self.micro_block_hashes.push(hashes);
        self.is_micro_block_empty.push(is_empty);
        self
    }

    pub fn shard_ids(mut self, shard_ids: Vec<ShardId>) -> Self {
        self.shard_ids = shard_ids;
        self
    }

    pub fn micro_block_hashes(mut self, micro_block_hashes: Vec<HashPair>) -> Self {
        self.micro_block_hashes = micro_block_hashes;
        self
    }

    pub fn is_micro_block_empty(mut self, is_micro_block_empty: Vec<bool>) -> Self {
        self.is_micro_block_empty = is_micro_block_empty;
        self
    }

    pub fn cosigs(mut self, cosigs: CoSignatures) -> Self {
        self.cosigs = cosigs;
        self
    }

    pub fn build(self) -> Result<TxBlock, TxBlockError> {
        TxBlock::new(
            self.header,
            self.is_micro_block_empty,
            self.micro_block_hashes,
            self.shard_ids,
            self.cosigs,
        )
    }
}

#[cfg(test)]
mod tests {
    use codec::{BitVector, CodecError};
    use pretty_assertions::assert_eq;
    use primitive_types::{H256, H512};

    use super::*;
    use crate::header::PubKey;

    fn header(block_num: u64, entries: u32) -> TxBlockHeader {
        TxBlockHeader::new(
            0,
            1,
            100_000,
            42_000,
            H256::repeat_byte(0xaa),
            block_num,
            1_700_000_000,
            H256::repeat_byte(0xbb),
            H256::repeat_byte(0xcc),
            12,
            entries,
            PubKey::new([0x03; PubKey::SIZE]),
            5,
            H256::repeat_byte(0xdd),
        )
    }

    fn pair(a: u8, b: u8) -> HashPair {
        HashPair::new(H256::repeat_byte(a), H256::repeat_byte(b))
    }

    fn cosigs() -> CoSignatures {
        CoSignatures::new(
            H512::repeat_byte(0x51),
            BitVector::new(vec![true, false, true]),
            H512::repeat_byte(0x52),
            BitVector::new(vec![true, true, true, false]),
        )
    }

    fn two_shard_block() -> TxBlock {
        TxBlock::builder(header(10, 2))
            .shard_entry(3, pair(1, 2), false)
            .shard_entry(7, pair(3, 4), true)
            .cosigs(cosigs())
            .build()
            .unwrap()
    }

    #[test]
    fn two_shard_layout() {
        let block = two_shard_block();
        let encoded = block.encode().unwrap();
        let body = &encoded[TxBlockHeader::SIZE..];

        let mut expected: Vec<u8> = vec![2, 0, 0, 0];
        expected.extend([3, 0, 0, 0]);
        expected.extend([1; 32]);
        expected.extend([2; 32]);
        expected.extend([7, 0, 0, 0]);
        expected.extend([3; 32]);
        expected.extend([4; 32]);
        expected.extend(cosigs().encode().unwrap());

        assert_eq!(&encoded[..TxBlockHeader::SIZE], header(10, 2).encode().unwrap().as_slice());
        assert_eq!(body, expected.as_slice());
        assert_eq!(encoded.len(), block.serialized_size());
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let block = two_shard_block();
        let decoded = TxBlock::decode(&block.encode().unwrap()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.shard_ids(), &vec![3, 7]);
        assert_eq!(decoded.is_micro_block_empty().as_slice(), &[false, true]);
        assert_eq!(decoded.cosigs(), &cosigs());
    }

    #[test]
    fn zero_entry_block() {
        let block = TxBlock::builder(header(1, 0)).build().unwrap();
        let encoded = block.encode().unwrap();
        assert_eq!(
            encoded.len(),
            TxBlockHeader::SIZE + 4 + CoSignatures::default().encoded_size()
        );
        assert_eq!(&encoded[TxBlockHeader::SIZE..TxBlockHeader::SIZE + 4], &[0, 0, 0, 0]);
        assert_eq!(TxBlock::decode(&encoded).unwrap(), block);
    }

    #[test]
    fn builder_rejects_count_mismatch() {
        let result = TxBlock::builder(header(1, 2))
            .shard_entry(0, pair(1, 1), false)
            .build();
        assert_eq!(
            result.unwrap_err(),
            TxBlockError::Consistency {
                header: 2,
                hash_pairs: 1,
                shard_ids: 1,
                emptiness: 1
            }
        );

        let result = TxBlock::builder(header(1, 2))
            .micro_block_hashes(vec![pair(1, 1), pair(2, 2)])
            .shard_ids(vec![0, 1])
            .is_micro_block_empty(vec![false])
            .build();
        assert!(matches!(result, Err(TxBlockError::Consistency { emptiness: 1, .. })));
    }

    #[test]
    fn builder_rejects_too_many_flags() {
        let result = TxBlock::builder(header(1, 33))
            .micro_block_hashes(vec![pair(0, 0); 33])
            .shard_ids((0..33).collect())
            .is_micro_block_empty(vec![false; 33])
            .build();
        assert_eq!(
            result.unwrap_err(),
            TxBlockError::BitmapOverflow {
                count: 33,
                width: 32
            }
        );
    }

    #[test]
    fn encode_at_offset_preserves_prefix() {
        let block = two_shard_block();
        let mut buf = vec![0xee; 5];
        let written = block.encode_at(&mut buf, 5).unwrap();
        assert_eq!(written, block.serialized_size());
        assert_eq!(&buf[..5], &[0xee; 5]);
        assert_eq!(TxBlock::decode_at(&buf, 5).unwrap(), (block, written));
    }

    #[test]
    fn decode_errors_by_stage() {
        let encoded = two_shard_block().encode().unwrap();

        assert!(matches!(
            TxBlock::decode(&encoded[..TxBlockHeader::SIZE - 1]),
            Err(TxBlockError::HeaderDecode(_))
        ));
        assert!(matches!(
            TxBlock::decode(&encoded[..TxBlockHeader::SIZE + 2]),
            Err(TxBlockError::TruncatedInput(_))
        ));
        assert!(matches!(
            TxBlock::decode(&encoded[..TxBlockHeader::SIZE + 4 + 68 + 10]),
            Err(TxBlockError::TruncatedInput(_))
        ));
        assert!(matches!(
            TxBlock::decode(&encoded[..encoded.len() - 1]),
            Err(TxBlockError::EnvelopeDecode(_))
        ));

        let mut trailing = encoded.clone();
        trailing.push(0);
        assert_eq!(
            TxBlock::decode(&trailing),
            Err(TxBlockError::Codec(CodecError::TrailingBytes { remaining: 1 }))
        );
    }

    #[test]
    fn decode_rejects_overflowing_shard_count() {
        let mut encoded = TxBlock::builder(header(1, 0)).build().unwrap().encode().unwrap();
        // num_micro_block_hashes sits after num_txs
        let count_offset = TxBlockHeader::SIZE - 8 - 32 - PubKey::SIZE - 4;
        encoded[count_offset..count_offset + 4].copy_from_slice(&40u32.to_le_bytes());
        assert_eq!(
            TxBlock::decode(&encoded),
            Err(TxBlockError::BitmapOverflow {
                count: 40,
                width: 32
            })
        );
    }

    #[test]
    fn equality_ignores_shard_ids_and_cosigs() {
        let a = two_shard_block();
        let b = TxBlock::builder(header(10, 2))
            .shard_entry(30, pair(1, 2), true)
            .shard_entry(70, pair(3, 4), true)
            .build()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn ordering_falls_back_to_hash_pairs() {
        let low = TxBlock::builder(header(10, 1)).shard_entry(0, pair(1, 9), false).build().unwrap();
        let high = TxBlock::builder(header(10, 1)).shard_entry(0, pair(2, 0), false).build().unwrap();
        let later = TxBlock::builder(header(11, 1)).shard_entry(0, pair(0, 0), false).build().unwrap();
        assert!(low < high);
        assert!(high > low);
        assert!(high < later);
        assert!(low < later);
        assert_ne!(low, high);
    }

    #[test]
    fn placeholder_is_explicit_and_encodable() {
        let placeholder = TxBlock::placeholder();
        assert!(placeholder.is_placeholder());
        assert!(!two_shard_block().is_placeholder());
        let decoded = TxBlock::decode(&placeholder.encode().unwrap()).unwrap();
        assert!(decoded.is_placeholder());
    }

    #[test]
    fn limits_are_applied_before_body() {
        let block = two_shard_block();
        let encoded = block.encode().unwrap();

        let tight = DecodeLimits {
            max_block_size: encoded.len() - 1,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            TxBlock::decode_with_limits(&encoded, 0, &tight),
            Err(TxBlockError::LimitExceeded { what: "block size", .. })
        ));

        let one_shard = DecodeLimits {
            max_shard_entries: 1,
            ..DecodeLimits::default()
        };
        assert_eq!(
            TxBlock::decode_with_limits(&encoded, 0, &one_shard),
            Err(TxBlockError::LimitExceeded {
                what: "shard entry count",
                value: 2,
                limit: 1
            })
        );

        assert_eq!(
            TxBlock::decode_with_limits(&encoded, 0, &DecodeLimits::default()).unwrap(),
            (block, encoded.len())
        );
    }

    #[test]
    fn builder_rejects_unencodable_cosigs() {
        let oversized = CoSignatures::new(
            H512::zero(),
            BitVector::new(vec![true; BitVector::MAX_BITS + 1]),
            H512::zero(),
            BitVector::default(),
        );
        let result = TxBlock::builder(header(1, 1))
            .shard_entry(0, pair(1, 1), false)
            .cosigs(oversized)
            .build();
        assert_eq!(
            result.unwrap_err(),
            TxBlockError::Codec(CodecError::LengthOverflow {
                len: BitVector::MAX_BITS + 1,
                max: BitVector::MAX_BITS
            })
        );
    }

    #[test]
    fn failed_encode_leaves_buffer_untouched() {
        // Only reachable by bypassing the constructor.
        let block = TxBlock {
            cosigs: CoSignatures::new(
                H512::zero(),
                BitVector::default(),
                H512::zero(),
                BitVector::new(vec![false; BitVector::MAX_BITS + 1]),
            ),
            ..two_shard_block()
        };
        let mut buf = vec![0xee; 4];
        assert!(matches!(
            block.encode_at(&mut buf, 4),
            Err(TxBlockError::Codec(CodecError::LengthOverflow { .. }))
        ));
        assert_eq!(buf, vec![0xee; 4]);
    }

    #[test]
    fn size_limit_applies_to_the_block_not_the_buffer() {
        let block = two_shard_block();
        let encoded = block.encode().unwrap();
        let exact = DecodeLimits {
            max_block_size: encoded.len(),
            ..DecodeLimits::default()
        };

        let mut buf = vec![0xff; 3];
        buf.extend(&encoded);
        buf.extend(vec![0u8; 4 * encoded.len()]);
        assert_eq!(
            TxBlock::decode_with_limits(&buf, 3, &exact).unwrap(),
            (block, encoded.len())
        );

        let mut second = encoded.clone();
        second.extend(&encoded);
        assert_eq!(
            TxBlock::decode_with_limits(&second, encoded.len(), &exact).unwrap().1,
            encoded.len()
        );
    }

    #[test]
    fn shard_entries_iterate_in_order() {
        let block = two_shard_block();
        let entries: Vec<_> = block.shard_entries().collect();
        assert_eq!(entries, vec![(3, &pair(1, 2), false), (7, &pair(3, 4), true)]);
    }
}
