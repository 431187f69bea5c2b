//! Transport-segment header parsing: one byte of `FIR`/`FIN`/`SEQ`,
//! the remainder is payload.

use dnp3_core::Segment;
use dnp3_core::constants::MAX_SEGMENT_PAYLOAD;

/// Decodes one transport segment from a link frame's user-data field.
pub trait SegmentParser {
    fn parse(&self, data: &[u8]) -> Option<Segment>;
}

/// Reads bit 7 as `FIR`, bit 6 as `FIN`, bits 5..0 as `SEQ`. Rejects empty
/// input (no header byte at all) and oversized payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnpSegmentParser;

impl SegmentParser for DnpSegmentParser {
    fn parse(&self, data: &[u8]) -> Option<Segment> {
        let (&header, payload) = data.split_first()?;
        if payload.len() > MAX_SEGMENT_PAYLOAD {
            return None;
        }
        let fir = header & 0x80 != 0;
        let fin = header & 0x40 != 0;
        let seq = header & 0x3F;
        Some(Segment::new(fir, fin, seq, payload.to_vec()))
    }
}
