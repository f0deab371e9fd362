//! Ledger constants and default parameters

/// One mebibyte
pub const MB: usize = 1 << 20;

/// Default maximum encoded block size: 2 MiB
pub const MAX_BLOCK_SIZE: usize = 2 * MB;

/// Default maximum encoded transaction size (advisory)
pub const MAX_TX_SIZE: usize = 1024;

/// Target block interval in seconds (informational, no timer is driven by it)
pub const TARGET_BLOCK_TIME_SECS: u64 = 2;

/// Fixed reward paid by every coinbase transaction
pub const BLOCK_REWARD: i64 = 10;

/// Width of every content hash
pub const HASH_SIZE: usize = 32;

/// Width of a compressed secp256k1 public key
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Largest DER-encoded ECDSA signature accepted in an input or block
pub const MAX_SIGNATURE_SIZE: usize = 72;

/// Encoding version byte written in front of outputs, transactions and blocks
pub const ENCODING_VERSION: u8 = 0;

/// Encoded size of a transaction output: version + target hash + amount
pub const OUTPUT_SIZE: usize = 1 + HASH_SIZE + 8;

/// Encoded size of an unsigned transaction input: source hash + index + key
pub const UNSIGNED_INPUT_SIZE: usize = HASH_SIZE + 4 + PUBLIC_KEY_SIZE;

/// Largest element that fits behind a single length byte
pub const MAX_ENVELOPE_LEN: usize = u8::MAX as usize;

/// Maximum number of inputs or outputs (single count byte)
pub const MAX_IO_COUNT: usize = u8::MAX as usize;

/// Source hash of a coinbase input: 𝟎 (no real predecessor)
pub const COINBASE_SOURCE_HASH: [u8; 32] = [0u8; 32];

/// Previous-block hash of the first block in the chain
pub const GENESIS_PREVIOUS_HASH: [u8; 32] = [0u8; 32];
