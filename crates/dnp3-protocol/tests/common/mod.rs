//! Shared helpers for building DNP3 link frames in integration tests.

use dnp3_protocol::crc16_dnp;

const LINK_MAGIC: [u8; 2] = [0x05, 0x64];
const LINK_HEADER_LEN: usize = 10;
const LINK_DATA_BLOCK_SIZE: usize = 16;
const LINK_MIN_LENGTH_FIELD: u8 = 5;

/// Function code for unconfirmed user data, the only one the core pipeline
/// dissects past the link layer.
pub const FUNC_UNCONFIRMED_USER_DATA: u8 = 0x04;
pub const FUNC_CONFIRMED_USER_DATA: u8 = 0x03;

/// Build a complete, CRC-valid link frame carrying `data` as user data.
pub fn link_frame(control: u8, destination: u16, source: u16, data: &[u8]) -> Vec<u8> {
    let length = (LINK_MIN_LENGTH_FIELD as usize + data.len()) as u8;
    let mut header = [0u8; LINK_HEADER_LEN];
    header[0..2].copy_from_slice(&LINK_MAGIC);
    header[2] = length;
    header[3] = control;
    header[4..6].copy_from_slice(&destination.to_le_bytes());
    header[6..8].copy_from_slice(&source.to_le_bytes());
    let header_crc = crc16_dnp(&header[0..8]);
    header[8..10].copy_from_slice(&header_crc.to_le_bytes());

    let mut out = header.to_vec();
    for block in data.chunks(LINK_DATA_BLOCK_SIZE) {
        out.extend_from_slice(block);
        out.extend_from_slice(&crc16_dnp(block).to_le_bytes());
    }
    out
}

/// Build one link frame carrying a single transport segment, as an
/// unconfirmed-user-data frame.
pub fn segment_frame(destination: u16, source: u16, fir: bool, fin: bool, seq: u8, payload: &[u8]) -> Vec<u8> {
    let mut header = 0u8;
    if fir {
        header |= 0x80;
    }
    if fin {
        header |= 0x40;
    }
    header |= seq & 0x3F;
    let mut data = vec![header];
    data.extend_from_slice(payload);
    link_frame(FUNC_UNCONFIRMED_USER_DATA, destination, source, &data)
}
