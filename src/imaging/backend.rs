//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four primitives every backend must
//! supply: decode, measure, resize and encode. The pipeline in
//! [`operations`](super::operations) composes them; it never touches pixels
//! itself.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below, whose raster is just a
//! pair of dimensions.

use super::params::{Quality, ResizeParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Raster` is whatever in-memory representation the backend decodes into.
/// A raster produced by [`decode`](Self::decode) may be resized any number of
/// times; the source bytes are decoded exactly once per call.
pub trait ImageBackend: Sync {
    type Raster;

    /// Decode encoded source bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Raster, BackendError>;

    /// Dimensions of a decoded raster.
    fn dimensions(&self, raster: &Self::Raster) -> Dimensions;

    /// Resample to exact dimensions.
    fn resize(&self, raster: &Self::Raster, params: &ResizeParams)
    -> Result<Self::Raster, BackendError>;

    /// Encode to the gallery's compressed output format.
    fn encode(&self, raster: &Self::Raster, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching pixels.
    ///
    /// Decoding reads a `WIDTHxHEIGHT` ASCII header, so test sources are plain
    /// strings such as `b"4000x3000"`. Anything else fails to decode.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode { width: u32, height: u32 },
        Resize { from: (u32, u32), to: (u32, u32) },
        Encode { width: u32, height: u32, quality: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn decode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Decode { .. }))
                .count()
        }
    }

    fn parse_header(bytes: &[u8]) -> Option<Dimensions> {
        let text = std::str::from_utf8(bytes).ok()?;
        let (w, h) = text.trim().split_once('x')?;
        Some(Dimensions {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
        })
    }

    impl ImageBackend for MockBackend {
        type Raster = Dimensions;

        fn decode(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            let dims = parse_header(bytes)
                .ok_or_else(|| BackendError::Decode("not a mock image".to_string()))?;
            self.operations.lock().unwrap().push(RecordedOp::Decode {
                width: dims.width,
                height: dims.height,
            });
            Ok(dims)
        }

        fn dimensions(&self, raster: &Dimensions) -> Dimensions {
            *raster
        }

        fn resize(
            &self,
            raster: &Dimensions,
            params: &ResizeParams,
        ) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                from: raster.as_tuple(),
                to: (params.width, params.height),
            });
            Ok(Dimensions {
                width: params.width,
                height: params.height,
            })
        }

        fn encode(&self, raster: &Dimensions, quality: Quality) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: raster.width,
                height: raster.height,
                quality: quality.value(),
            });
            Ok(format!("{}x{}@{}", raster.width, raster.height, quality.value()).into_bytes())
        }
    }

    #[test]
    fn mock_decodes_header() {
        let backend = MockBackend::new();
        let raster = backend.decode(b"800x600").unwrap();
        assert_eq!(backend.dimensions(&raster), Dimensions { width: 800, height: 600 });
        assert_eq!(backend.decode_count(), 1);
    }

    #[test]
    fn mock_rejects_garbage() {
        let backend = MockBackend::new();
        assert!(backend.decode(b"\x89PNG garbage").is_err());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn mock_records_resize_and_encode() {
        let backend = MockBackend::new();
        let raster = backend.decode(b"400x300").unwrap();
        let small = backend
            .resize(&raster, &ResizeParams { width: 200, height: 150 })
            .unwrap();
        backend.encode(&small, Quality::new(90)).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert_eq!(
            ops[1],
            RecordedOp::Resize {
                from: (400, 300),
                to: (200, 150)
            }
        );
        assert!(matches!(
            ops[2],
            RecordedOp::Encode {
                width: 200,
                height: 150,
                quality: 90
            }
        ));
    }
}
