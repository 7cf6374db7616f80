//! objectGUID decoding.
//!
//! AD stores objectGUID as 16 bytes with the first three fields in
//! little-endian order (the Windows GUID memory layout). The caller-visible
//! identifier is the canonical lowercase UUID string form.

use uuid::Uuid;

use castellan_connector::error::{ConnectorError, ConnectorResult};

/// Decode a raw objectGUID value into its canonical string form.
///
/// # Errors
/// Returns `InvalidInput` when the value is not exactly 16 bytes.
pub fn decode_guid(raw: &[u8]) -> ConnectorResult<String> {
    let bytes: [u8; 16] = raw.try_into().map_err(|_| {
        ConnectorError::invalid_input(format!(
            "objectGUID must be 16 bytes, got {}",
            raw.len()
        ))
    })?;
    Ok(Uuid::from_bytes_le(bytes).to_string())
}

/// Encode a canonical GUID string back into the AD byte layout.
///
/// Used to address an entry by its GUID (`<GUID=...>` DN form carries the
/// string; a few control operations need the raw bytes).
pub fn encode_guid(guid: &str) -> ConnectorResult<[u8; 16]> {
    let uuid = Uuid::parse_str(guid)
        .map_err(|_| ConnectorError::invalid_input(format!("not a valid GUID: {guid}")))?;
    Ok(uuid.to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_guid_mixed_endian() {
        // Canonical 01020304-0506-0708-090a-0b0c0d0e0f10 in AD byte order:
        // first three fields little-endian, rest big-endian.
        let raw = [
            0x04, 0x03, 0x02, 0x01, // time_low, reversed
            0x06, 0x05, // time_mid, reversed
            0x08, 0x07, // time_hi, reversed
            0x09, 0x0a, // clock_seq
            0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10, // node
        ];
        assert_eq!(
            decode_guid(&raw).unwrap(),
            "01020304-0506-0708-090a-0b0c0d0e0f10"
        );
    }

    #[test]
    fn test_guid_roundtrip() {
        let raw: [u8; 16] = [
            0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
            0x0b, 0x0c,
        ];
        let s = decode_guid(&raw).unwrap();
        assert_eq!(encode_guid(&s).unwrap(), raw);
    }

    #[test]
    fn test_decode_guid_wrong_length() {
        let err = decode_guid(&[0u8; 15]).unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_encode_guid_invalid() {
        assert!(encode_guid("not-a-guid").is_err());
    }
}
