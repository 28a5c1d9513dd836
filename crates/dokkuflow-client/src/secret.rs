//! Secret redaction and value encoding

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Replacement for every redacted secret
pub const REDACTED: &str = "*******";

/// Replace every occurrence of every secret with [`REDACTED`]
///
/// Longer secrets are replaced first so a secret that contains another one
/// is not left partially visible.
pub fn redact(text: &str, secrets: &[String]) -> String {
    let mut ordered: Vec<&String> = secrets.iter().filter(|s| !s.is_empty()).collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut result = text.to_string();
    for secret in ordered {
        result = result.replace(secret.as_str(), REDACTED);
    }
    result
}

/// Base64 form used for values crossing the command line
pub fn encode_value(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Decode a base64 value; invalid input yields `None`
pub fn decode_value(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Encode raw bytes (archives, binary payloads)
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
