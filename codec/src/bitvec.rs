use serde::{Deserialize, Serialize};

use crate::{CodecError, Decoder, Encoder, Reader, Result, Writer};

/// Length-prefixed, bit-packed sequence of booleans.
///
/// Wire form is a `u16` bit count followed by `ceil(count / 8)` bytes, bit `i`
/// stored in byte `i / 8` at position `i % 8`. Padding bits are zero, so a
/// sequence has exactly one encoding.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BitVector(Vec<bool>);

impl BitVector {
    pub const MAX_BITS: usize = u16::MAX as usize;

    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|bit| **bit).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }

    fn packed_len(bits: usize) -> usize {
        (bits + 7) / 8
    }
}

impl From<Vec<bool>> for BitVector {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Encoder for BitVector {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        2 + Self::packed_len(self.0.len())
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> Result<()> {
        self.validate()?;
        writer.put_u16(self.0.len() as u16)?;
        let mut packed = vec![0u8; Self::packed_len(self.0.len())];
        for (i, bit) in self.0.iter().enumerate() {
            if *bit {
                packed[i / 8] |= 1 << (i % 8);
            }
        }
        writer.put_slice(&packed)
    }

    fn validate(&self) -> Result<()> {
        if self.0.len() > Self::MAX_BITS {
            return Err(CodecError::LengthOverflow {
                len: self.0.len(),
                max: Self::MAX_BITS,
            });
        }
        Ok(())
    }
}

impl Decoder for BitVector {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u16()? as usize;
        let packed = reader.take(Self::packed_len(count))?;
        if count % 8 != 0 {
            if let Some(last) = packed.last() {
                if *last >> (count % 8) != 0 {
                    return Err(CodecError::NonCanonical("bit vector padding bits set"));
                }
            }
        }
        Ok((0..count)
            .map(|i| packed[i / 8] & (1 << (i % 8)) != 0)
            .collect())
    }
}
