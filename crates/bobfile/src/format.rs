/// Identifies the very first segment of a BOB container. Segments opened
/// later at cue boundaries carry no magic; see [`crate::BobFile::new_cue`].
pub const FILE_MAGIC: [u8; 4] = *b"BOB\0";

/// Header field id terminating the configuration sequence.
pub const CONFIG_END: u64 = 0;
/// Header field id carrying the resolved block size.
pub const CONFIG_BLOCK_SIZE: u64 = 1;
/// Header field id carrying the resolved cue size.
pub const CONFIG_CUE_SIZE: u64 = 2;

/// Record id for a full rewrite of the object. The only record kind in
/// format version one; further ids are reserved for delta records.
pub const BLOCK_REWRITE: u64 = 1;

/// Fallback block size when the filesystem cannot be probed.
pub const DEFAULT_BLOCK_SIZE: u64 = 32 * 1024;
/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: u64 = 512;
/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: u64 = 4 * 1024 * 1024;

/// Default cue size is the block size times this multiplier.
pub const CUE_SIZE_MULTIPLIER: u64 = 32;
/// Largest possible cue size.
pub const MAX_CUE_SIZE: u64 = 1024 * 1024 * 1024;
