use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::FrameError;
use crate::message::{Header, HEADER_SIZE};

/// Frame delimiter terminating every hex-encoded frame on the wire.
pub const DELIMITER: u8 = b'\n';

/// Packs `header` and `body` into `hex(gzip(body || header))`, matching the
/// original transport's frame layout.
pub fn encode_frame(header: Header, body: &[u8]) -> Vec<u8> {
    let mut plain = Vec::with_capacity(body.len() + HEADER_SIZE);
    plain.extend_from_slice(body);
    plain.extend_from_slice(&header.to_bytes());

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain).expect("writing to an in-memory buffer never fails");
    let gzipped = encoder.finish().expect("finishing an in-memory gzip stream never fails");

    hex::encode(gzipped).into_bytes()
}

/// Reverses `encode_frame`: hex-decodes, gunzips, and splits the trailing
/// 24-byte header off the body. `spam_limit` bounds the hex-decoded
/// (still-gzipped) size, matching `readString`'s cap in the original
/// reader loop; `max_payload` bounds the decompressed body.
pub fn decode_frame(hex_bytes: &[u8], spam_limit: usize, max_payload: usize) -> Result<(Header, Vec<u8>), FrameError> {
    if hex_bytes.len() > spam_limit {
        return Err(FrameError::TooLarge { limit: spam_limit, got: hex_bytes.len() });
    }
    let gzipped = hex::decode(hex_bytes).map_err(FrameError::HexDecode)?;

    let mut decoder = GzDecoder::new(&gzipped[..]);
    let mut plain = Vec::new();
    decoder.read_to_end(&mut plain).map_err(FrameError::Gunzip)?;

    if plain.len() < HEADER_SIZE {
        return Err(FrameError::ShortFrame { header_size: HEADER_SIZE, got: plain.len() });
    }
    let split_at = plain.len() - HEADER_SIZE;
    let header = Header::from_bytes(&plain[split_at..])?;
    let body = plain[..split_at].to_vec();

    if body.len() > max_payload {
        return Err(FrameError::PayloadTooLarge { limit: max_payload, got: body.len() });
    }
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CommandType, ForwardType};

    #[test]
    fn round_trips_header_and_body() {
        let header = Header { command: CommandType::Instruction, forward_type: ForwardType::Beacon, forward_value: 7 };
        let body = br#"{"meta_type":"PortalCustodianLiquidation"}"#;
        let frame = encode_frame(header, body);
        let (decoded_header, decoded_body) = decode_frame(&frame, 1 << 20, 1 << 20).unwrap();
        assert_eq!(decoded_header, header);
        assert_eq!(decoded_body, body);
    }

    #[test]
    fn oversize_frame_is_rejected_before_decoding() {
        let header = Header { command: CommandType::VerAck, forward_type: ForwardType::Peer, forward_value: 0 };
        let frame = encode_frame(header, b"small");
        let err = decode_frame(&frame, 4, 1 << 20).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
    }

    #[test]
    fn oversize_payload_is_rejected_after_decompression() {
        let header = Header { command: CommandType::VerAck, forward_type: ForwardType::Peer, forward_value: 0 };
        let frame = encode_frame(header, b"this payload is too big for the limit");
        let err = decode_frame(&frame, 1 << 20, 4).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }
}
