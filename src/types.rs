//! Shared types used across the gallery.
//!
//! [`ImageDescriptor`] is the input record handed over by an image source
//! provider and is serialized to and from the descriptor list JSON.
//! [`ProcessedImage`] is the derived unit the pipeline publishes to the cache.

use serde::{Deserialize, Serialize};

/// One image as supplied by the provider.
///
/// The provider owns id uniqueness: two descriptors with the same id share a
/// cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub id: String,
    /// Where the original bytes live: `http(s)://`, `file://` or a path
    /// relative to the source root.
    #[serde(alias = "url")]
    pub source_url: String,
    /// Alt text and download filename.
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub known_size: Option<u64>,
    /// Dimension hints from the provider (catalog sorting only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageDescriptor {
    pub fn new(
        id: impl Into<String>,
        source_url: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            display_name: display_name.into(),
            known_size: None,
            width: None,
            height: None,
        }
    }

    /// Pixel area from the provider's hints, 0 when unknown.
    pub fn hinted_area(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

/// An encoded raster (JPEG bytes) with its pixel dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for EncodedRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedRaster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Facts about the original source, captured when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

/// Thumbnail and preview derived from a single load of one original.
///
/// Never mutated after construction; the cache hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub thumbnail: EncodedRaster,
    pub preview: EncodedRaster,
    pub metadata: ImageMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_descriptor_with_aliases() {
        let json = r#"{"id": "p-1", "url": "products/oak.jpg", "name": "Oak panel", "size": 52311}"#;
        let d: ImageDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.source_url, "products/oak.jpg");
        assert_eq!(d.display_name, "Oak panel");
        assert_eq!(d.known_size, Some(52311));
        assert_eq!(d.width, None);
    }

    #[test]
    fn serialize_skips_absent_optionals() {
        let d = ImageDescriptor::new("a", "a.jpg", "A");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"id":"a","source_url":"a.jpg","display_name":"A"}"#);
    }

    #[test]
    fn hinted_area_defaults_to_zero() {
        let mut d = ImageDescriptor::new("a", "a.jpg", "A");
        assert_eq!(d.hinted_area(), 0);
        d.width = Some(40);
        d.height = Some(30);
        assert_eq!(d.hinted_area(), 1200);
    }

    #[test]
    fn encoded_raster_debug_hides_bytes() {
        let raster = EncodedRaster {
            width: 2,
            height: 1,
            data: vec![1, 2, 3],
        };
        assert_eq!(
            format!("{raster:?}"),
            "EncodedRaster { width: 2, height: 1, bytes: 3 }"
        );
    }
}
