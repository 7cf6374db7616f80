//! Password encoding for the unicodePwd attribute.
//!
//! AD accepts password writes only as the quoted password encoded in
//! UTF-16LE, and only over an encrypted connection. The engine therefore
//! never sends a password at entry creation; the deferred update carries it
//! once the (disabled) entry exists.

use tracing::instrument;

use castellan_connector::error::{ConnectorError, ConnectorResult};

/// Encode a cleartext password for the unicodePwd attribute.
///
/// The password is surrounded with double quotes and encoded as UTF-16LE.
///
/// # Errors
/// Returns an error if the password is empty.
#[instrument(skip(password))]
pub fn encode_password(password: &str) -> ConnectorResult<Vec<u8>> {
    if password.is_empty() {
        return Err(ConnectorError::invalid_input("password cannot be empty"));
    }

    let quoted = format!("\"{password}\"");
    Ok(quoted.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

/// Validate that the connection is suitable for password writes.
///
/// AD rejects unicodePwd modifications over non-encrypted connections.
#[instrument]
pub fn validate_password_connection(use_ssl: bool) -> ConnectorResult<()> {
    if !use_ssl {
        return Err(ConnectorError::InvalidConfiguration {
            message: "LDAPS (SSL) connection required for password operations".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_password_basic() {
        let encoded = encode_password("Test123!").unwrap();
        let expected: Vec<u8> = "\"Test123!\""
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_password_quoted() {
        let encoded = encode_password("P@ssw0rd").unwrap();
        // UTF-16LE '"' is 0x22 0x00 at both ends.
        assert_eq!(&encoded[..2], &[0x22, 0x00]);
        assert_eq!(&encoded[encoded.len() - 2..], &[0x22, 0x00]);
    }

    #[test]
    fn test_encode_password_length() {
        // "abc" -> 5 chars including quotes -> 10 bytes UTF-16LE.
        assert_eq!(encode_password("abc").unwrap().len(), 10);
    }

    #[test]
    fn test_encode_password_unicode() {
        let encoded = encode_password("Pässwörd!").unwrap();
        assert_eq!(encoded.len() % 2, 0);
    }

    #[test]
    fn test_encode_password_empty_rejected() {
        let err = encode_password("").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_password_connection() {
        assert!(validate_password_connection(true).is_ok());
        let err = validate_password_connection(false).unwrap_err();
        assert!(err.to_string().contains("SSL"));
    }
}
