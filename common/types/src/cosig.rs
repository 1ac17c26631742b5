use getset::Getters;
use serde::{Deserialize, Serialize};

use codec::{BitVector, CodecError, Decoder, Encoder, Reader, Writer};
use primitive_types::H512;

/// Consensus co-signatures closing every block.
///
/// `cs1`/`b1` are the first-round collective signature and the participation
/// bitmap of its signers, `cs2`/`b2` the second round.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct CoSignatures {
    cs1: H512,
    b1: BitVector,
    cs2: H512,
    b2: BitVector,
}

impl CoSignatures {
    pub const SIGNATURE_SIZE: usize = 64;

    pub fn new(cs1: H512, b1: BitVector, cs2: H512, b2: BitVector) -> Self {
        Self { cs1, b1, cs2, b2 }
    }
}

impl Encoder for CoSignatures {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        2 * Self::SIGNATURE_SIZE + self.b1.encoded_size() + self.b2.encoded_size()
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> codec::Result<()> {
        self.cs1.encode_to(writer)?;
        self.b1.encode_to(writer)?;
        self.cs2.encode_to(writer)?;
        self.b2.encode_to(writer)
    }

    fn validate(&self) -> codec::Result<()> {
        self.b1.validate()?;
        self.b2.validate()
    }
}

impl Decoder for CoSignatures {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> codec::Result<Self> {
        let cs1 = H512::decode_from(reader)?;
        let b1 = BitVector::decode_from(reader)?;
        let cs2 = H512::decode_from(reader)?;
        let b2 = BitVector::decode_from(reader)?;
        Ok(Self { cs1, b1, cs2, b2 })
    }
}
