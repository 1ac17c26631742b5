pub mod block;
pub mod config;
pub mod cosig;
pub mod error;
pub mod header;
pub mod shard;

pub use block::{TxBlock, TxBlockBuilder};
pub use config::{DecodeLimits, DEFAULT_DECODE_LIMITS};
pub use cosig::CoSignatures;
pub use error::TxBlockError;
pub use header::{PubKey, TxBlockHeader};
pub use shard::{EmptinessBitmap, HashPair};

pub type TxHash = primitive_types::H256;
pub type StateHash = primitive_types::H256;
pub type BlockHash = primitive_types::H256;
pub type ShardId = u32;
