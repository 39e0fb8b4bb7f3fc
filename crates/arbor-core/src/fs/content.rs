//! Self-describing file content encoding.
//!
//! A file's content is always a single string. Text is stored verbatim;
//! binary payloads are stored as `data:<mime>;base64,<payload>` so that
//! persistence and archive adapters never need a second field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{CoreError, CoreResult};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Fallback MIME type for binary content whose type cannot be guessed.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Splits a base64 data URI into `(mime, payload)`.
pub fn split_data_uri(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(DATA_PREFIX)?;
    let marker = rest.find(BASE64_MARKER)?;
    let mime = &rest[..marker];
    if mime.contains(',') {
        return None;
    }
    Some((mime, &rest[marker + BASE64_MARKER.len()..]))
}

/// Returns `true` if `content` is a base64 data URI.
pub fn is_data_uri(content: &str) -> bool {
    split_data_uri(content).is_some()
}

/// Encodes raw bytes as a data URI carrying `mime`.
pub fn encode_binary(bytes: &[u8], mime: &str) -> String {
    format!("{DATA_PREFIX}{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

/// Encodes bytes as text when they are valid UTF-8 without NUL bytes,
/// otherwise as a data URI. Returns the content and whether it is binary.
pub fn encode_bytes(bytes: &[u8], mime: &str) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.contains('\0') => (text.to_string(), false),
        _ => (encode_binary(bytes, mime), true),
    }
}

/// Decodes stored content back into bytes.
///
/// Text content is returned verbatim, even when it happens to look like a
/// data URI; only `binary` content is base64-decoded.
///
/// # Errors
///
/// - [`CoreError::Encoding`] if binary content is not a well-formed data URI.
pub fn decode(content: &str, binary: bool) -> CoreResult<Vec<u8>> {
    if !binary {
        return Ok(content.as_bytes().to_vec());
    }
    let (_, payload) = split_data_uri(content)
        .ok_or_else(|| CoreError::Encoding("binary content is not a data URI".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Byte length of the payload `content` represents.
///
/// For binary data URIs this is the decoded length, computed without
/// decoding. Text is measured as UTF-8.
pub fn byte_size(content: &str, binary: bool) -> u64 {
    match split_data_uri(content).filter(|_| binary) {
        Some((_, payload)) => {
            let unpadded = payload.trim_end_matches('=').len();
            (unpadded * 3 / 4) as u64
        }
        None => content.len() as u64,
    }
}

/// Guesses a MIME type from the file name's extension.
pub fn guess_mime(path: &str, binary: bool) -> String {
    let guess = mime_guess::from_path(path);
    match guess.first() {
        Some(mime) => mime.essence_str().to_string(),
        None if binary => OCTET_STREAM.to_string(),
        None => "text/plain".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_split_data_uri() {
        let uri = encode_binary(&[0xff, 0x00, 0x10], "image/png");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, payload) = split_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(payload, "/wAQ");
    }

    #[test]
    fn plain_text_is_not_data_uri() {
        assert!(!is_data_uri("hello"));
        assert!(!is_data_uri("data: not really"));
        assert!(!is_data_uri("data:text/plain,hello;base64,x"));
    }

    #[test]
    fn decode_text_and_binary() {
        assert_eq!(decode("abc", false).unwrap(), b"abc");
        let uri = encode_binary(&[1, 2, 3, 4], OCTET_STREAM);
        assert_eq!(decode(&uri, true).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn decode_malformed_base64_is_encoding_error() {
        let err = decode("data:image/png;base64,@@@", true).unwrap_err();
        assert!(matches!(err, CoreError::Encoding(_)));
        let err = decode("plain text", true).unwrap_err();
        assert!(matches!(err, CoreError::Encoding(_)));
    }

    #[test]
    fn byte_size_matches_decoded_length() {
        for len in 0..8 {
            let bytes = vec![7u8; len];
            let uri = encode_binary(&bytes, OCTET_STREAM);
            assert_eq!(byte_size(&uri, true), len as u64);
        }
        assert_eq!(byte_size("héllo", false), 6);
    }

    #[test]
    fn text_that_looks_like_data_uri_stays_text() {
        let text = "data:text/plain;base64,SGk=";
        assert_eq!(byte_size(text, false), text.len() as u64);
        assert_eq!(decode(text, false).unwrap(), text.as_bytes());
    }

    #[test]
    fn encode_bytes_prefers_text() {
        assert_eq!(encode_bytes(b"fn main() {}", OCTET_STREAM), ("fn main() {}".to_string(), false));
        let (content, binary) = encode_bytes(&[0x89, b'P', b'N', b'G'], "image/png");
        assert!(binary);
        assert!(content.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn guess_mime_by_extension() {
        assert_eq!(guess_mime("/index.html", false), "text/html");
        assert_eq!(guess_mime("/logo.png", true), "image/png");
        assert_eq!(guess_mime("/blob", true), OCTET_STREAM);
        assert_eq!(guess_mime("/README", false), "text/plain");
    }
}
