use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("write past end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    WriteOverflow {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes { remaining: usize },
    #[error("non canonical encoding: {0}")]
    NonCanonical(&'static str),
    #[error("length {len} exceeds maximum {max}")]
    LengthOverflow { len: usize, max: usize },
    #[error("encoder wrote {written} bytes, expected {expected}")]
    SizeMismatch { expected: usize, written: usize },
}
