//! Application-layer request/response recognition.
//!
//! Deliberately shallow: this reads the application control octet, function
//! code, and (for responses) the Internal Indications field, then stops —
//! object headers and object data are carried opaquely in
//! [`Fragment::objects`] and never decoded.

use dnp3_core::constants::{APP_FUNC_RESPONSE, APP_FUNC_UNSOLICITED_RESPONSE, APP_HEADER_LEN, APP_IIN_LEN};
use dnp3_core::{AppErrorKind, Fragment, FragmentKind};

/// Request function codes this dissector recognizes (IEEE 1815-2012 Table
/// 4-1, excluding the object-level detail this crate doesn't decode).
const KNOWN_REQUEST_CODES: &[u8] = &[
    0x00, // CONFIRM
    0x01, // READ
    0x02, // WRITE
    0x03, // SELECT
    0x04, // OPERATE
    0x05, // DIRECT_OPERATE
    0x06, // DIRECT_OPERATE_NO_RESPONSE
    0x07, // IMMED_FREEZE
    0x08, // IMMED_FREEZE_NO_RESPONSE
    0x09, // FREEZE_CLEAR
    0x0A, // FREEZE_CLEAR_NO_RESPONSE
    0x0B, // FREEZE_AT_TIME
    0x0C, // FREEZE_AT_TIME_NO_RESPONSE
    0x0D, // COLD_RESTART
    0x0E, // WARM_RESTART
    0x0F, // INITIALIZE_DATA
    0x10, // INITIALIZE_APPLICATION
    0x11, // START_APPLICATION
    0x12, // STOP_APPLICATION
    0x13, // SAVE_CONFIGURATION
    0x14, // ENABLE_UNSOLICITED
    0x15, // DISABLE_UNSOLICITED
    0x16, // ASSIGN_CLASS
    0x17, // DELAY_MEASURE
    0x18, // RECORD_CURRENT_TIME
    0x19, // OPEN_FILE
    0x1A, // CLOSE_FILE
    0x1B, // DELETE_FILE
    0x1C, // GET_FILE_INFO
    0x1D, // AUTHENTICATE_FILE
    0x1E, // ABORT_FILE
];

fn is_known_function_code(function: u8) -> bool {
    KNOWN_REQUEST_CODES.contains(&function)
        || function == APP_FUNC_RESPONSE
        || function == APP_FUNC_UNSOLICITED_RESPONSE
}

/// Result of successfully parsing a reassembled application payload: either
/// a recognized fragment, or an error token (a well-formed header that
/// doesn't validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOutcome {
    Fragment(Fragment),
    Error(AppErrorKind),
}

/// Recognizes a request or response over a reassembled application
/// payload.
pub trait AppParser {
    fn parse(&self, data: &[u8]) -> Option<AppOutcome>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DnpAppParser;

impl AppParser for DnpAppParser {
    fn parse(&self, data: &[u8]) -> Option<AppOutcome> {
        if data.len() < APP_HEADER_LEN {
            return None;
        }
        let control = data[0];
        let function = data[1];
        let kind = Fragment::kind_for_function(function);

        let (iin, objects_offset) = if kind == FragmentKind::Response {
            if data.len() < APP_HEADER_LEN + APP_IIN_LEN {
                return Some(AppOutcome::Error(AppErrorKind::TruncatedResponse));
            }
            let iin = u16::from_le_bytes([data[APP_HEADER_LEN], data[APP_HEADER_LEN + 1]]);
            (Some(iin), APP_HEADER_LEN + APP_IIN_LEN)
        } else {
            (None, APP_HEADER_LEN)
        };

        if !is_known_function_code(function) {
            return Some(AppOutcome::Error(AppErrorKind::UnknownFunctionCode(function)));
        }

        Some(AppOutcome::Fragment(Fragment {
            kind,
            control,
            function,
            iin,
            objects: data[objects_offset..].to_vec(),
        }))
    }
}
