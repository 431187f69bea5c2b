use crate::constants::{APP_FUNC_RESPONSE, APP_FUNC_UNSOLICITED_RESPONSE};

/// A transport-layer segment: one `FIR`/`FIN`/`SEQ`-tagged unit carried
/// inside a single link frame's user data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// First segment of a series.
    pub fir: bool,
    /// Last segment of a series.
    pub fin: bool,
    /// 6-bit sequence number, `0..=63`.
    pub seq: u8,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn new(fir: bool, fin: bool, seq: u8, payload: Vec<u8>) -> Self {
        Self {
            fir,
            fin,
            seq,
            payload,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Link-layer function codes the dissector distinguishes.
///
/// Only the handful of function codes the pipeline branches on are named;
/// everything else round-trips through `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFunction {
    UnconfirmedUserData,
    ConfirmedUserData,
    ResetLinkStates,
    TestLinkStates,
    RequestLinkStatus,
    Other(u8),
}

impl LinkFunction {
    pub fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0x4 => LinkFunction::UnconfirmedUserData,
            0x3 => LinkFunction::ConfirmedUserData,
            0x0 => LinkFunction::ResetLinkStates,
            0x2 => LinkFunction::TestLinkStates,
            0x9 => LinkFunction::RequestLinkStatus,
            other => LinkFunction::Other(other),
        }
    }
}

/// The link-layer unit. Only the fields the core pipeline consumes are kept;
/// everything else (CRC validity of individual data blocks) is folded into
/// `payload` being `None`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub func: LinkFunction,
    pub source: u16,
    pub destination: u16,
    /// The reassembled, CRC-verified user-data bytes, or `None` if any data
    /// block's CRC failed to verify (the header itself is always valid by
    /// the time a `Frame` exists).
    pub payload: Option<Vec<u8>>,
}

/// Which half of the DNP3 application-layer grammar a [`Fragment`] matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Request,
    Response,
}

/// The application-layer unit produced by the app parser.
///
/// Deliberately shallow: object headers and object data are carried
/// opaquely in `objects` and never decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub control: u8,
    pub function: u8,
    /// Internal Indications, present only on responses.
    pub iin: Option<u16>,
    pub objects: Vec<u8>,
}

impl Fragment {
    pub fn kind_for_function(function: u8) -> FragmentKind {
        if function == APP_FUNC_RESPONSE || function == APP_FUNC_UNSOLICITED_RESPONSE {
            FragmentKind::Response
        } else {
            FragmentKind::Request
        }
    }
}

/// Why a reassembled application payload failed the "not an error token"
/// check, short of an outright parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorKind {
    UnknownFunctionCode(u8),
    /// Header identified a response function code but the payload was too
    /// short to also hold the two-byte Internal Indications field.
    TruncatedResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_function_decodes_known_codes() {
        assert_eq!(LinkFunction::from_code(0x04), LinkFunction::UnconfirmedUserData);
        assert_eq!(LinkFunction::from_code(0x03), LinkFunction::ConfirmedUserData);
        assert_eq!(LinkFunction::from_code(0xC4), LinkFunction::UnconfirmedUserData);
    }

    #[test]
    fn link_function_falls_back_to_other() {
        assert_eq!(LinkFunction::from_code(0x0D), LinkFunction::Other(0x0D));
    }

    #[test]
    fn fragment_kind_for_response_codes() {
        assert_eq!(Fragment::kind_for_function(0x81), FragmentKind::Response);
        assert_eq!(Fragment::kind_for_function(0x82), FragmentKind::Response);
        assert_eq!(Fragment::kind_for_function(0x01), FragmentKind::Request);
    }
}
