use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use codec::Encoder;
use types::{DecodeLimits, TxBlock};

const INSPECT_LOG_TARGET: &str = "inspect";

#[derive(Subcommand, Debug)]
pub enum InspectCommands {
    /// Decode a block and print it as JSON
    Decode(InputArgs),
    /// Decode a block, re-encode it and check the bytes are canonical
    Verify(InputArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// File holding the encoded block
    path: PathBuf,
    /// Treat the file as hex text instead of raw bytes
    #[clap(long)]
    hex: bool,
    /// Byte offset of the block inside the input
    #[clap(long, default_value_t = 0)]
    offset: usize,
    /// JSON file with decode limits
    #[clap(long)]
    config: Option<PathBuf>,
}

pub fn handle_inspect_command(command: InspectCommands) -> Result<()> {
    match command {
        InspectCommands::Decode(args) => {
            let bytes = read_input(&args)?;
            let limits = load_limits(args.config.as_deref());
            let (block, consumed) = TxBlock::decode_with_limits(&bytes, args.offset, &limits)?;
            info!(target: INSPECT_LOG_TARGET, offset = args.offset, consumed, shard_entries = block.shard_entry_count(), "Decoded tx block");
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        InspectCommands::Verify(args) => {
            let bytes = read_input(&args)?;
            let limits = load_limits(args.config.as_deref());
            let (block, consumed) = TxBlock::decode_with_limits(&bytes, args.offset, &limits)?;
            let span = &bytes[args.offset..args.offset + consumed];
            let reencoded = block.encode()?;
            if reencoded.as_slice() != span {
                let diverges_at = reencoded
                    .iter()
                    .zip(span.iter())
                    .position(|(a, b)| a != b)
                    .unwrap_or_else(|| reencoded.len().min(span.len()));
                bail!(
                    "re-encoded block differs from input at byte {}",
                    args.offset + diverges_at
                );
            }
            let trailing = bytes.len() - args.offset - consumed;
            if trailing > 0 {
                warn!(target: INSPECT_LOG_TARGET, trailing, "Input continues past the block");
            }
            info!(target: INSPECT_LOG_TARGET, offset = args.offset, consumed, "Block bytes are canonical");
            println!("ok");
        }
    }
    Ok(())
}

fn read_input(args: &InputArgs) -> Result<Vec<u8>> {
    let raw = std::fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    if !args.hex {
        return Ok(raw);
    }
    let text = String::from_utf8(raw).map_err(|e| anyhow!("hex input is not utf-8: {}", e))?;
    let text: String = text.split_whitespace().collect();
    hex::decode(text.trim_start_matches("0x")).map_err(|e| anyhow!("invalid hex input: {}", e))
}

pub(crate) fn load_limits(config: Option<&Path>) -> DecodeLimits {
    let limits = match config {
        None => DecodeLimits::default(),
        Some(path) => {
            let res: Result<DecodeLimits> = File::open(path)
                .map_err(|e| anyhow!("{}", e))
                .and_then(|file| serde_json::from_reader(file).map_err(|e| anyhow!("{}", e)));
            match res {
                Ok(limits) => limits,
                Err(error) => {
                    warn!(error = ?error, "failed to read config file, reverting to application default");
                    DecodeLimits::default()
                }
            }
        }
    };
    limits.sanitize()
}
