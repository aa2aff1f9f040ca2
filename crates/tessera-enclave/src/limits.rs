//! Wire format limits and constants.
//!
//! Every bound the decoder enforces is defined here.

/// Width of every length and count prefix in bytes (unsigned big-endian).
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Maximum number of recipient boxes or recipient keys in one payload.
pub const MAX_RECIPIENTS: usize = 65_536;

/// Maximum length of a single length-prefixed field (64 MiB).
pub const MAX_FIELD_SIZE: usize = 64 * 1024 * 1024;

/// Maximum size of one encoded payload (128 MiB).
///
/// Bounds the bytes the decoder will consume across both wire sections.
pub const MAX_PAYLOAD_SIZE: usize = 2 * MAX_FIELD_SIZE;
