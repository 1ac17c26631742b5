use codec::CodecError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxBlockError {
    #[error("failed to decode tx block header: {0}")]
    HeaderDecode(#[source] CodecError),
    #[error("shard entry count {count} exceeds emptiness bitmap width {width}")]
    BitmapOverflow { count: usize, width: usize },
    #[error("truncated shard entries: {0}")]
    TruncatedInput(#[source] CodecError),
    #[error("failed to decode co-signatures: {0}")]
    EnvelopeDecode(#[source] CodecError),
    #[error("header declares {header} shard entries, found {hash_pairs} hash pairs, {shard_ids} shard ids and {emptiness} emptiness flags")]
    Consistency {
        header: usize,
        hash_pairs: usize,
        shard_ids: usize,
        emptiness: usize,
    },
    #[error("`{0}`")]
    Codec(#[from] CodecError),
    #[error("{what} {value} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        value: usize,
        limit: usize,
    },
}

impl TxBlockError {
    /// Whether decoding stopped because the input ran out.
    pub fn is_truncation(&self) -> bool {
        match self {
            TxBlockError::TruncatedInput(_) => true,
            TxBlockError::HeaderDecode(error) | TxBlockError::EnvelopeDecode(error) => {
                matches!(error, CodecError::UnexpectedEof { .. })
            }
            _ => false,
        }
    }
}
