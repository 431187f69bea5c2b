//! The transport-function recognizer — the design centerpiece.
//!
//! Encodes the grammar
//!
//! ```text
//! tfun    := (series | any-not-A)*
//! series  := A+ (+ | =)* (Z | any-not-(A|Z|+|=))
//! ```
//!
//! as a hand-coded two-state machine rather than a generated parser:
//! [`State::Idle`] (no series open) and [`State::InSeries`] (accumulating
//! payload since the last `A`).

use dnp3_core::Segment;
use dnp3_core::constants::SEQ_MODULUS;

/// One of the six input tokens derived from an arriving segment relative
/// to the previous segment in its context. `Close` stands for `Z` and is
/// emitted as a second token alongside the others whenever `fin` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `A` — `fir` set: start of a new series.
    A,
    /// `=` — retransmit: `fir` unset, byte-equal to the last segment.
    Equal,
    /// `+` — next in series: `fir` unset, `seq` is `last.seq + 1 (mod 64)`.
    Plus,
    /// `!` — gap: `fir` unset, `seq` doesn't follow, and a last segment exists.
    Gap,
    /// `_` — orphan: `fir` unset and no last segment exists in this context.
    Orphan,
    /// `Z` — the segment that produced the preceding token also had `fin` set.
    Close,
}

/// Classify `seg` against `last` to produce its first token (`A`, `=`, `+`,
/// `!`, or `_`).
pub fn classify(seg: &Segment, last: Option<&Segment>) -> Token {
    if seg.fir {
        Token::A
    } else if let Some(last) = last {
        if is_retransmit(seg, last) {
            Token::Equal
        } else if seg.seq == (last.seq + 1) % SEQ_MODULUS {
            Token::Plus
        } else {
            Token::Gap
        }
    } else {
        Token::Orphan
    }
}

/// Two segments are a retransmit of one another when `fin`, `seq`, and
/// `payload` match. `fir` is deliberately excluded: a retransmitted first
/// segment still carries `fir = true`, same as the original, so comparing
/// it would never change the outcome but would make the intent less clear.
fn is_retransmit(seg: &Segment, last: &Segment) -> bool {
    seg.fin == last.fin && seg.seq == last.seq && seg.payload == last.payload
}

/// Derive the one or two tokens a single arriving segment produces: exactly
/// one of `A|=|+|!|_`, plus `Close` if `seg.fin` is set.
pub fn tokens_for(seg: &Segment, last: Option<&Segment>) -> (Token, Option<Token>) {
    let first = classify(seg, last);
    let second = seg.fin.then_some(Token::Close);
    (first, second)
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    InSeries(Vec<u8>),
}

/// Streaming transport-function recognizer, one per [`Context`](crate::context::Context).
///
/// `step` consumes tokens one at a time. It returns `None` while the
/// top-level alternative (`series` or `any-not-A`) is still open, and
/// `Some(payload)` when one completes — `payload` is `Some(bytes)` for a
/// series that closed on `Z`, or `None` for every other completion (a
/// discarded series, or a trivial `any-not-A` token matched at the top
/// level). The recognizer always eventually accepts: every call to `step`
/// that doesn't return `None`-as-"incomplete" does complete something, so
/// there is no forced-termination case that can fail.
#[derive(Debug, Clone)]
pub struct TransportRecognizer {
    state: State,
}

impl TransportRecognizer {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Feed one token, with the segment it was derived from (for payload
    /// copying on `A`/`Plus`). Returns `Some(result)` when a top-level
    /// alternative completes this call.
    pub fn step(&mut self, token: Token, segment: &Segment) -> Option<Option<Vec<u8>>> {
        match (&mut self.state, token) {
            (State::Idle, Token::A) => {
                self.state = State::InSeries(segment.payload.clone());
                None
            }
            (State::Idle, _) => Some(None),
            (State::InSeries(_), Token::A) => {
                // A second FIR before the series closed: the grammar's
                // greedy `A+` absorbs it, keeping only the latest A's
                // payload — earlier progress is silently superseded.
                self.state = State::InSeries(segment.payload.clone());
                None
            }
            (State::InSeries(buf), Token::Plus) => {
                buf.extend_from_slice(&segment.payload);
                None
            }
            (State::InSeries(_), Token::Equal) => None,
            (State::InSeries(buf), Token::Close) => {
                let payload = std::mem::take(buf);
                self.state = State::Idle;
                Some(Some(payload))
            }
            (State::InSeries(_), Token::Gap | Token::Orphan) => {
                self.state = State::Idle;
                Some(None)
            }
        }
    }

    /// `true` iff a series is currently open (there is in-progress
    /// reassembly state that a reclamation would silently drop).
    pub fn is_in_series(&self) -> bool {
        matches!(self.state, State::InSeries(_))
    }
}

impl Default for TransportRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seg(fir: bool, fin: bool, seq: u8, payload: &[u8]) -> Segment {
        Segment::new(fir, fin, seq, payload.to_vec())
    }

    fn feed(rec: &mut TransportRecognizer, last: Option<&Segment>, s: &Segment) -> Vec<Option<Option<Vec<u8>>>> {
        let (t0, t1) = tokens_for(s, last);
        let mut results = vec![rec.step(t0, s)];
        if let Some(t1) = t1 {
            results.push(rec.step(t1, s));
        }
        results
    }

    #[test]
    fn single_segment_fragment() {
        let mut rec = TransportRecognizer::new();
        let s = seg(true, true, 0, &[0xC0, 0x01]);
        let results = feed(&mut rec, None, &s);
        assert_eq!(results, vec![None, Some(Some(vec![0xC0, 0x01]))]);
    }

    #[test]
    fn two_segment_fragment_concatenates_payloads() {
        let mut rec = TransportRecognizer::new();
        let s1 = seg(true, false, 5, b"hel");
        feed(&mut rec, None, &s1);
        let s2 = seg(false, true, 6, b"lo");
        let results = feed(&mut rec, Some(&s1), &s2);
        assert_eq!(results, vec![None, Some(Some(b"hello".to_vec()))]);
    }

    #[test]
    fn retransmit_is_ignored() {
        let mut rec = TransportRecognizer::new();
        let s1 = seg(true, false, 5, b"hel");
        feed(&mut rec, None, &s1);
        let retransmit = seg(false, false, 5, b"hel");
        let results = feed(&mut rec, Some(&s1), &retransmit);
        assert_eq!(results, vec![None]);
        assert!(rec.is_in_series());
        let s3 = seg(false, true, 6, b"lo");
        let results = feed(&mut rec, Some(&retransmit), &s3);
        assert_eq!(results, vec![None, Some(Some(b"hello".to_vec()))]);
    }

    #[test]
    fn gap_discards_the_series() {
        let mut rec = TransportRecognizer::new();
        let s1 = seg(true, false, 5, b"he");
        feed(&mut rec, None, &s1);
        let s2 = seg(false, false, 9, b"??");
        let results = feed(&mut rec, Some(&s1), &s2);
        assert_eq!(results, vec![Some(None)]);
        assert!(!rec.is_in_series());
    }

    #[test]
    fn a_new_fir_restarts_the_series() {
        let mut rec = TransportRecognizer::new();
        let s1 = seg(true, false, 5, b"he");
        feed(&mut rec, None, &s1);
        assert!(rec.is_in_series());
        let s2 = seg(true, true, 7, b"xx");
        let results = feed(&mut rec, Some(&s1), &s2);
        assert_eq!(results, vec![None, Some(Some(b"xx".to_vec()))]);
    }

    #[test]
    fn orphan_completes_trivially_with_no_payload() {
        let mut rec = TransportRecognizer::new();
        let orphan = seg(false, false, 3, b"?");
        let results = feed(&mut rec, None, &orphan);
        assert_eq!(results, vec![Some(None)]);
    }

    #[test]
    fn classify_wraps_sequence_modulo_64() {
        let last = seg(false, false, 63, b"x");
        let next = seg(false, false, 0, b"y");
        assert_eq!(classify(&next, Some(&last)), Token::Plus);
    }

    #[rstest]
    #[case(true, 0, true)] // fir set -> A, regardless of last
    #[case(false, 6, true)] // next in sequence -> +
    #[case(false, 9, true)] // out of sequence -> !
    #[case(false, 5, true)] // same seq, same payload -> = (retransmit)
    fn classify_table(#[case] fir: bool, #[case] seq: u8, #[case] with_last: bool) {
        let last = seg(false, false, 5, b"hel");
        let s = seg(fir, false, seq, if seq == 5 { b"hel" } else { b"xxx" });
        let last_ref = with_last.then_some(&last);
        let token = classify(&s, last_ref);
        match (fir, seq) {
            (true, _) => assert_eq!(token, Token::A),
            (false, 6) => assert_eq!(token, Token::Plus),
            (false, 9) => assert_eq!(token, Token::Gap),
            (false, 5) => assert_eq!(token, Token::Equal),
            _ => unreachable!(),
        }
    }

    #[test]
    fn classify_is_orphan_with_no_last_segment() {
        let s = seg(false, false, 3, b"x");
        assert_eq!(classify(&s, None), Token::Orphan);
    }
}
