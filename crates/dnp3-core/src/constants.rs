//! Wire-format and bound constants for the DNP3 streaming dissector.
//!
//! Values come from IEEE 1815-2012 ("DNP3") §9 (data link layer) and §4
//! (transport function) unless noted otherwise.

// ============================================================================
// Link-layer framing
// ============================================================================

/// The two-byte magic that begins every link frame.
///
/// # Examples
///
/// ```
/// use dnp3_core::constants::LINK_MAGIC;
/// assert_eq!(LINK_MAGIC, [0x05, 0x64]);
/// ```
pub const LINK_MAGIC: [u8; 2] = [0x05, 0x64];

/// Length in bytes of the fixed link-layer header: magic (2) + length (1) +
/// control (1) + destination (2) + source (2) + header CRC (2).
pub const LINK_HEADER_LEN: usize = 10;

/// Maximum number of user-data bytes carried by a single data block before a
/// CRC-16 is inserted.
pub const LINK_DATA_BLOCK_SIZE: usize = 16;

/// Size in bytes of every CRC-16/DNP checksum on the wire.
pub const CRC_LEN: usize = 2;

/// Minimum valid value of the link header's `LENGTH` field: `CONTROL` (1) +
/// `DESTINATION` (2) + `SOURCE` (2), with zero bytes of user data.
pub const LINK_MIN_LENGTH_FIELD: u8 = 5;

// ============================================================================
// Transport segment / application layer
// ============================================================================

/// Maximum payload a single transport segment may carry (one link frame's
/// user data, minus the one-byte transport header).
///
/// # Rationale
///
/// A link frame's user-data field is built from data blocks of
/// [`LINK_DATA_BLOCK_SIZE`] bytes each; with the largest link frames seen in
/// practice this bounds the transport segment payload to 249 bytes once the
/// one-byte transport header is subtracted. Values larger than this are
/// rejected by the segment parser as malformed.
pub const MAX_SEGMENT_PAYLOAD: usize = 249;

/// Sequence numbers wrap modulo 64 (6-bit field).
pub const SEQ_MODULUS: u8 = 64;

// ============================================================================
// Context table defaults
// ============================================================================

/// Default number of simultaneously tracked `(source, destination)` contexts.
///
/// Hosts with a large number of concurrent peers should override this.
pub const DEFAULT_CTXMAX: usize = 16;

/// Default per-context raw-byte accumulation buffer size.
///
/// Large enough to hold several maximum-size link frames before a host
/// needs to raise it.
pub const DEFAULT_BUFLEN: usize = 2048;

/// Floor below which a per-context raw buffer is rejected at construction.
///
/// Not itself recommended for production use (see [`DEFAULT_BUFLEN`]); this
/// only guards against configuring a buffer too small to hold even one
/// small link frame.
pub const MIN_BUFLEN: usize = 256;

// ============================================================================
// DNP3 application layer (request/response recognition only)
// ============================================================================

/// Function code marking a solicited response.
pub const APP_FUNC_RESPONSE: u8 = 0x81;

/// Function code marking an unsolicited response.
pub const APP_FUNC_UNSOLICITED_RESPONSE: u8 = 0x82;

/// Length in bytes of the application control octet + function code that
/// begin every application fragment.
pub const APP_HEADER_LEN: usize = 2;

/// Length in bytes of the Internal Indications field that follows the
/// function code in every response fragment.
pub const APP_IIN_LEN: usize = 2;
