//! Version characteristic decoding.

use crate::error::ProtocolError;

/// Decode the Version characteristic: UTF-8 with NUL padding on either end.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidVersionEncoding`] if the bytes are not
/// UTF-8.
pub fn decode_version(bytes: &[u8]) -> Result<String, ProtocolError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.trim_matches('\0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_nul_padding() -> Result<(), ProtocolError> {
        assert_eq!(decode_version(b"1.0.0.3-S3\0\0\0")?, "1.0.0.3-S3");
        assert_eq!(decode_version(b"\0\0")?, "");
        Ok(())
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            decode_version(&[0x31, 0xFF]),
            Err(ProtocolError::InvalidVersionEncoding(_))
        ));
    }
}
