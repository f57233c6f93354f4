//! The single-entry response returned by every content call.

use crate::content_type::ContentType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image encodings a pack may serve, detected from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
    Tiff,
    Ico,
    Avif,
}

impl ImageFormat {
    /// Content-based detection; `None` for anything that is not an image.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let kind = infer::get(bytes)?;
        if kind.matcher_type() != infer::MatcherType::Image {
            return None;
        }
        let format = match kind.mime_type() {
            "image/png" => ImageFormat::Png,
            "image/jpeg" => ImageFormat::Jpeg,
            "image/gif" => ImageFormat::Gif,
            "image/webp" => ImageFormat::WebP,
            "image/bmp" if has_bitmap_header(bytes) => ImageFormat::Bmp,
            "image/tiff" => ImageFormat::Tiff,
            "image/vnd.microsoft.icon" | "image/x-icon" => ImageFormat::Ico,
            "image/avif" => ImageFormat::Avif,
            _ => return None,
        };
        Some(format)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Ico => "image/vnd.microsoft.icon",
            ImageFormat::Avif => "image/avif",
        }
    }
}

/// `infer` matches bitmaps on the two-byte `BM` tag alone; also require a
/// known DIB header size at offset 14.
fn has_bitmap_header(bytes: &[u8]) -> bool {
    const DIB_HEADER_SIZES: [u32; 7] = [12, 40, 52, 56, 64, 108, 124];
    match bytes.get(14..18) {
        Some(size) => {
            let size = u32::from_le_bytes([size[0], size[1], size[2], size[3]]);
            DIB_HEADER_SIZES.contains(&size)
        }
        None => false,
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub format: ImageFormat,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EnvelopeValue {
    /// Encoded record list or multi-page info.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Image(ImageData),
    /// Human-readable error, only ever stored under `exception`.
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeEntry {
    pub key: String,
    pub value: EnvelopeValue,
}

/// Byte payloads travel as base64 strings on the JSON plugin wire.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Zero or one keyed values: the request tag on success, `exception` on
/// failure, nothing when the pack does not carry the requested type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    entry: Option<EnvelopeEntry>,
}

impl ResponseEnvelope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn success(key: impl Into<String>, value: EnvelopeValue) -> Self {
        Self {
            entry: Some(EnvelopeEntry {
                key: key.into(),
                value,
            }),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::success(
            ContentType::Exception.tag(),
            EnvelopeValue::Message(message.into()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.entry.is_some())
    }

    pub fn entry(&self) -> Option<&EnvelopeEntry> {
        self.entry.as_ref()
    }

    pub fn into_entry(self) -> Option<EnvelopeEntry> {
        self.entry
    }

    pub fn key(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&EnvelopeValue> {
        self.entry
            .as_ref()
            .filter(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_failure(&self) -> bool {
        self.contains_key(ContentType::Exception.tag())
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.get(ContentType::Exception.tag()) {
            Some(EnvelopeValue::Message(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key) {
            Some(EnvelopeValue::Bytes(bytes)) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageData> {
        match self.get(ContentType::Image.tag()) {
            Some(EnvelopeValue::Image(image)) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_keyed_by_exception() {
        let envelope = ResponseEnvelope::failure("boom");
        assert_eq!(envelope.len(), 1);
        assert_eq!(envelope.key(), Some("exception"));
        assert_eq!(envelope.error_message(), Some("boom"));
        assert!(envelope.is_failure());
        assert!(envelope.bytes("exception").is_none());
    }

    #[test]
    fn success_lookup_is_by_key() {
        let envelope = ResponseEnvelope::success("classes", EnvelopeValue::Bytes(vec![1, 2]));
        assert_eq!(envelope.bytes("classes"), Some(&[1u8, 2][..]));
        assert!(envelope.get("items").is_none());
        assert!(!envelope.is_failure());
        assert!(envelope.error_message().is_none());
    }

    #[test]
    fn empty_has_no_entries() {
        let envelope = ResponseEnvelope::empty();
        assert!(envelope.is_empty());
        assert_eq!(envelope.len(), 0);
        assert!(envelope.key().is_none());
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn bitmap_header() -> Vec<u8> {
        let mut bytes = b"BM".to_vec();
        bytes.extend_from_slice(&[0; 12]);
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 36]);
        bytes
    }

    #[test]
    fn detects_common_formats() {
        assert_eq!(ImageFormat::detect(PNG), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::detect(&[0xff, 0xd8, 0xff, 0xe0, 0, 0x10]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::detect(b"GIF89a\x01\0\x01\0"), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::detect(b"RIFF\x10\0\0\0WEBPVP8 "),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::detect(&bitmap_header()), Some(ImageFormat::Bmp));
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(ImageFormat::detect(b"# not an image"), None);
        assert_eq!(ImageFormat::detect(b""), None);
        assert_eq!(ImageFormat::detect(b"BMX trail notes, not a bitmap"), None);
        assert_eq!(ImageFormat::detect(b"%PDF-1.7\n"), None);
    }

    #[test]
    fn bytes_travel_as_base64() {
        let envelope = ResponseEnvelope::success("classes", EnvelopeValue::Bytes(vec![1, 2]));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["entry"]["value"]["data"], "AQI=");

        let image = ResponseEnvelope::success(
            "image",
            EnvelopeValue::Image(ImageData {
                format: ImageFormat::Png,
                bytes: PNG.to_vec(),
            }),
        );
        let json = serde_json::to_string(&image).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn envelope_serializes_as_tagged_value() {
        let envelope = ResponseEnvelope::failure("bad");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"key\":\"exception\""));
        assert!(json.contains("\"type\":\"message\""));
        let back: ResponseEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }
}
