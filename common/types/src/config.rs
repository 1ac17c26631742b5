use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::block::TxBlock;
use crate::shard::EMPTINESS_BITMAP_WIDTH;

const CONFIG_LOG_TARGET: &str = "config";

/// Bounds a receiver applies to untrusted block bytes before decoding them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_block_size: usize,
    pub max_shard_entries: u32,
}

pub const DEFAULT_DECODE_LIMITS: DecodeLimits = DecodeLimits {
    max_block_size: 1024 * 1024,
    max_shard_entries: EMPTINESS_BITMAP_WIDTH as u32,
};

impl Default for DecodeLimits {
    fn default() -> Self {
        DEFAULT_DECODE_LIMITS
    }
}

impl DecodeLimits {
    pub fn sanitize(&self) -> DecodeLimits {
        let default = DEFAULT_DECODE_LIMITS;
        let mut conf = *self;
        if conf.max_block_size < TxBlock::MIN_SIZE {
            warn!(target: CONFIG_LOG_TARGET, provided = conf.max_block_size, updated = default.max_block_size, "Sanitizing invalid max block size");
            conf.max_block_size = default.max_block_size
        }
        if conf.max_shard_entries < 1 || conf.max_shard_entries as usize > EMPTINESS_BITMAP_WIDTH {
            warn!(target: CONFIG_LOG_TARGET, provided = conf.max_shard_entries, updated = default.max_shard_entries, "Sanitizing invalid max shard entries");
            conf.max_shard_entries = default.max_shard_entries
        }
        conf
    }
}
