use primitive_types::{H256, H512};

pub use crate::bitvec::BitVector;
pub use crate::buffer::{Reader, Writer};
pub use crate::error::CodecError;

mod bitvec;
mod buffer;
mod error;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Canonical byte encoding.
///
/// `encoded_size` is the exact number of bytes `encode_to` writes; the
/// provided methods rely on it to size the output buffer. `validate` must
/// reject every value `encode_to` cannot write, so callers learn about it
/// before any byte is touched.
pub trait Encoder {
    type Error: From<CodecError>;

    fn encoded_size(&self) -> usize;

    fn encode_to(&self, writer: &mut Writer<'_>) -> std::result::Result<(), Self::Error>;

    fn validate(&self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    /// Writes `self` into `dst` starting at `offset` and returns the number of
    /// bytes written. `dst` grows to fit and is never shrunk; on error it is
    /// left at its original length.
    fn encode_at(&self, dst: &mut Vec<u8>, offset: usize) -> std::result::Result<usize, Self::Error> {
        self.validate()?;
        let size = self.encoded_size();
        let end = offset.checked_add(size).ok_or(CodecError::LengthOverflow {
            len: size,
            max: usize::MAX - offset,
        })?;
        let original_len = dst.len();
        if original_len < end {
            dst.resize(end, 0);
        }
        let mut writer = Writer::new(&mut dst[..end], offset);
        let result = self.encode_to(&mut writer).and_then(|_| {
            let written = writer.position() - offset;
            if written != size {
                return Err(CodecError::SizeMismatch {
                    expected: size,
                    written,
                }
                .into());
            }
            Ok(written)
        });
        if result.is_err() {
            dst.truncate(original_len);
        }
        result
    }

    fn encode(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        let mut out = Vec::with_capacity(self.encoded_size());
        self.encode_at(&mut out, 0)?;
        Ok(out)
    }
}

pub trait Decoder: Sized {
    type Error: From<CodecError>;

    fn decode_from(reader: &mut Reader<'_>) -> std::result::Result<Self, Self::Error>;

    /// Decodes one value starting at `offset`, returning it together with the
    /// number of bytes consumed.
    fn decode_at(src: &[u8], offset: usize) -> std::result::Result<(Self, usize), Self::Error> {
        let mut reader = Reader::new(src, offset);
        let value = Self::decode_from(&mut reader)?;
        Ok((value, reader.position() - offset))
    }

    /// Decodes a buffer holding exactly one value.
    fn decode(buf: &[u8]) -> std::result::Result<Self, Self::Error> {
        let (value, consumed) = Self::decode_at(buf, 0)?;
        if consumed != buf.len() {
            return Err(CodecError::TrailingBytes {
                remaining: buf.len() - consumed,
            }
            .into());
        }
        Ok(value)
    }
}

pub trait Codec: Encoder + Decoder {}

impl<T> Codec for T where T: Encoder + Decoder {}

impl<const N: usize> Encoder for [u8; N] {
    type Error = CodecError;

    fn encoded_size(&self) -> usize {
        N
    }

    fn encode_to(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.put_slice(self)
    }
}

impl<const N: usize> Decoder for [u8; N] {
    type Error = CodecError;

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        reader.read_array()
    }
}

// All integers on the wire are little-endian, not network byte order.
// Encoded blocks are hashed and co-signed, so this can never change.
macro_rules! impl_codec_primitives {
    ($type : ty => $path : path) => {
        impl Encoder for $type {
            type Error = CodecError;

            fn encoded_size(&self) -> usize {
                std::mem::size_of::<$type>()
            }

            fn encode_to(&self, writer: &mut Writer<'_>) -> Result<()> {
                writer.put_slice(&self.to_le_bytes())
            }
        }

        impl Decoder for $type {
            type Error = CodecError;

            fn decode_from(reader: &mut Reader<'_>) -> Result<$type> {
                Ok($path(reader.read_array()?))
            }
        }
    };
}

impl_codec_primitives!(u8 => u8::from_le_bytes);
impl_codec_primitives!(u16 => u16::from_le_bytes);
impl_codec_primitives!(u32 => u32::from_le_bytes);
impl_codec_primitives!(u64 => u64::from_le_bytes);
impl_codec_primitives!(u128 => u128::from_le_bytes);

macro_rules! impl_codec_fixed_hash {
    ($type : ty, $len : expr) => {
        impl Encoder for $type {
            type Error = CodecError;

            fn encoded_size(&self) -> usize {
                $len
            }

            fn encode_to(&self, writer: &mut Writer<'_>) -> Result<()> {
                writer.put_slice(self.as_bytes())
            }
        }

        impl Decoder for $type {
            type Error = CodecError;

            fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
                Ok(<$type>::from(reader.read_array::<$len>()?))
            }
        }
    };
}

impl_codec_fixed_hash!(H256, 32);
impl_codec_fixed_hash!(H512, 64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(7u32.encode().unwrap(), vec![7, 0, 0, 0]);
        assert_eq!(0x0102u16.encode().unwrap(), vec![0x02, 0x01]);
        assert_eq!(u64::decode(&[1, 0, 0, 0, 0, 0, 0, 0]).unwrap(), 1);
    }

    #[test]
    fn encode_at_grows_but_never_shrinks() {
        let mut buf = vec![0xaa; 16];
        let written = 0xdeadbeefu32.encode_at(&mut buf, 2).unwrap();
        assert_eq!(written, 4);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[..2], &[0xaa, 0xaa]);
        assert_eq!(&buf[2..6], &[0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(&buf[6..], &[0xaa; 10]);

        let mut short = vec![1, 2, 3];
        H256::repeat_byte(9).encode_at(&mut short, 3).unwrap();
        assert_eq!(short.len(), 35);
        assert_eq!(&short[..3], &[1, 2, 3]);
    }

    struct HalfWritten {
        valid: bool,
    }

    impl Encoder for HalfWritten {
        type Error = CodecError;

        fn encoded_size(&self) -> usize {
            8
        }

        fn encode_to(&self, writer: &mut Writer<'_>) -> Result<()> {
            writer.put_u32(0x0101_0101)?;
            Err(CodecError::NonCanonical("second word"))
        }

        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                Err(CodecError::NonCanonical("invalid"))
            }
        }
    }

    #[test]
    fn invalid_value_leaves_buffer_untouched() {
        let mut buf = vec![0xaa; 4];
        assert_eq!(
            HalfWritten { valid: false }.encode_at(&mut buf, 2),
            Err(CodecError::NonCanonical("invalid"))
        );
        assert_eq!(buf, vec![0xaa; 4]);
    }

    #[test]
    fn failed_encode_drops_grown_bytes() {
        let mut buf = vec![0xaa; 4];
        assert_eq!(
            HalfWritten { valid: true }.encode_at(&mut buf, 4),
            Err(CodecError::NonCanonical("second word"))
        );
        assert_eq!(buf, vec![0xaa; 4]);
        assert!(HalfWritten { valid: true }.encode().is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        assert_eq!(
            u32::decode(&[1, 0, 0, 0, 0]),
            Err(CodecError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn decode_at_reports_consumed() {
        let buf = [0xff, 0xff, 5, 0, 0, 0, 0xff];
        assert_eq!(u32::decode_at(&buf, 2).unwrap(), (5, 4));
        assert!(matches!(
            u32::decode_at(&buf, 4),
            Err(CodecError::UnexpectedEof { offset: 4, needed: 4, remaining: 3 })
        ));
    }

    #[test]
    fn fixed_hashes() {
        let hash = H512::repeat_byte(3);
        let encoded = hash.encode().unwrap();
        assert_eq!(encoded.len(), 64);
        assert_eq!(H512::decode(&encoded).unwrap(), hash);
        assert!(H256::decode(&encoded[..31]).is_err());
    }
}
