use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;

const PNG_BASE64_PREFIX: &str = "iVBORw0KGgo";

pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}

pub fn decode_base64(data: &str) -> Result<Bytes, base64::DecodeError> {
    BASE64.decode(data.trim()).map(Bytes::from)
}

/// Cheap check for the PNG signature at the start of a base64 payload.
pub fn looks_like_png_base64(data: &str) -> bool {
    data.trim_start().starts_with(PNG_BASE64_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_detection() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let encoded = encode_base64(&png_header);
        assert!(looks_like_png_base64(&encoded));
        assert!(!looks_like_png_base64("aGVsbG8="));

        let decoded = decode_base64(&format!("{}\n", encoded)).unwrap();
        assert_eq!(decoded.as_ref(), &png_header);
    }
}
