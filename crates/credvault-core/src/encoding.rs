//! Hex helpers for key material read from configuration.

use crate::error::CoreError;

/// Render bytes as a lowercase hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (surrounding whitespace ignored, either case).
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CoreError> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return Err(CoreError::Decode(format!(
            "hex string has odd length: {}",
            hex.len()
        )));
    }
    if !hex.is_ascii() {
        return Err(CoreError::Decode("hex string contains non-ASCII characters".to_string()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| CoreError::Decode(format!("invalid hex at position {i}: {e}")))
        })
        .collect()
}

/// Short hex prefix for redacted `Debug` output.
pub fn hex_prefix(bytes: &[u8]) -> String {
    bytes_to_hex(&bytes[..bytes.len().min(4)])
}
