//! Link-layer frame synchronization and parsing.
//!
//! Two pieces live here: the concrete [`DnpLinkParser`] that decodes one
//! frame at a known offset, and the free function [`synchronize`] that
//! repeats the "parse at offset 0, else advance one byte" algorithm over
//! an arbitrary buffer.

use dnp3_core::constants::{
    CRC_LEN, LINK_DATA_BLOCK_SIZE, LINK_HEADER_LEN, LINK_MAGIC, LINK_MIN_LENGTH_FIELD,
};
use dnp3_core::{Frame, LinkFunction};

use crate::crc::crc16_dnp;

/// Outcome of attempting to parse one link frame at the start of a buffer.
#[derive(Debug, Clone)]
pub enum LinkParseOutcome {
    /// The buffer is a valid prefix of a frame but doesn't yet hold all of
    /// it; the caller should retry once more bytes arrive.
    NeedMoreData,
    /// The buffer does not begin a valid link frame (bad magic, bad header
    /// CRC, or a `LENGTH` field that can't encode a real frame). The caller
    /// should advance one byte and retry.
    Invalid,
    /// A complete, header-CRC-valid frame was found. `consumed` is the
    /// number of bytes it occupies, including header and every data block.
    Valid { frame: Frame, consumed: usize },
}

/// Decodes a DNP3 link-layer frame (magic, header, CRC-checked data blocks)
/// at offset 0 of a buffer.
pub trait LinkParser {
    fn try_parse(&self, buf: &[u8]) -> LinkParseOutcome;
}

/// Decodes DNP3 link frames: two-byte magic, 8-byte header (`LENGTH`,
/// `CONTROL`, `DESTINATION`, `SOURCE`) with its own CRC, followed by the
/// user-data field split into CRC-16/DNP-protected blocks of up to
/// [`LINK_DATA_BLOCK_SIZE`] bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnpLinkParser;

impl LinkParser for DnpLinkParser {
    fn try_parse(&self, buf: &[u8]) -> LinkParseOutcome {
        if buf.len() < LINK_HEADER_LEN {
            return LinkParseOutcome::NeedMoreData;
        }
        if buf[0..2] != LINK_MAGIC {
            return LinkParseOutcome::Invalid;
        }

        let length = buf[2] as usize;
        let control = buf[3];
        let destination = u16::from_le_bytes([buf[4], buf[5]]);
        let source = u16::from_le_bytes([buf[6], buf[7]]);
        let header_crc = u16::from_le_bytes([buf[8], buf[9]]);

        if crc16_dnp(&buf[0..8]) != header_crc {
            tracing::trace!(header_crc, "link header CRC mismatch");
            return LinkParseOutcome::Invalid;
        }
        if length < LINK_MIN_LENGTH_FIELD as usize {
            return LinkParseOutcome::Invalid;
        }

        let user_data_len = length - LINK_MIN_LENGTH_FIELD as usize;
        let block_sizes = block_sizes_for(user_data_len);
        let total_block_bytes: usize = block_sizes.iter().map(|n| n + CRC_LEN).sum();
        let total_len = LINK_HEADER_LEN + total_block_bytes;

        if buf.len() < total_len {
            return LinkParseOutcome::NeedMoreData;
        }

        let mut payload = Vec::with_capacity(user_data_len);
        let mut crc_ok = true;
        let mut offset = LINK_HEADER_LEN;
        for &block_len in &block_sizes {
            let block = &buf[offset..offset + block_len];
            let expected = u16::from_le_bytes([buf[offset + block_len], buf[offset + block_len + 1]]);
            if crc16_dnp(block) != expected {
                crc_ok = false;
                tracing::trace!(block_offset = offset, expected, "link data block CRC mismatch");
            }
            payload.extend_from_slice(block);
            offset += block_len + CRC_LEN;
        }

        let frame = Frame {
            func: LinkFunction::from_code(control),
            source,
            destination,
            payload: crc_ok.then_some(payload),
        };

        LinkParseOutcome::Valid { frame, consumed: total_len }
    }
}

/// Split `user_data_len` bytes into the block sizes a DNP3 frame carries
/// them in: runs of [`LINK_DATA_BLOCK_SIZE`], with a shorter final block.
fn block_sizes_for(mut user_data_len: usize) -> Vec<usize> {
    let mut blocks = Vec::new();
    while user_data_len > 0 {
        let block_len = user_data_len.min(LINK_DATA_BLOCK_SIZE);
        blocks.push(block_len);
        user_data_len -= block_len;
    }
    blocks
}

/// Outcome of scanning a buffer for the next synchronized frame.
#[derive(Debug)]
pub enum SyncOutcome {
    /// A frame was found. `consumed` counts from the start of the buffer,
    /// including any garbage bytes skipped to resynchronize.
    Frame { frame: Frame, consumed: usize },
    /// No complete frame was found. `skipped` leading bytes are confirmed
    /// garbage (no valid frame can start there) and may be dropped; the
    /// remaining tail should be retained for the next feed.
    NeedMoreData { skipped: usize },
}

/// Scans for the next complete, synchronized frame in `buf`, advancing one
/// byte at a time over anything that doesn't parse. Byte-granular resync is
/// correct because no valid frame can start at an offset whose prefix isn't
/// the two-byte magic.
pub fn synchronize<P: LinkParser>(parser: &P, buf: &[u8]) -> SyncOutcome {
    let mut offset = 0;
    while offset < buf.len() {
        match parser.try_parse(&buf[offset..]) {
            LinkParseOutcome::Valid { frame, consumed } => {
                return SyncOutcome::Frame {
                    frame,
                    consumed: offset + consumed,
                };
            }
            LinkParseOutcome::Invalid => offset += 1,
            LinkParseOutcome::NeedMoreData => {
                return SyncOutcome::NeedMoreData { skipped: offset };
            }
        }
    }
    SyncOutcome::NeedMoreData { skipped: offset }
}
