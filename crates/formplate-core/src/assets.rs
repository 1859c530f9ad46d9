//! Asset loading seam: page sizes and backgrounds for the base PDF.
//!
//! Rasterizing a referenced PDF is left to the host; it plugs in through
//! [`AssetLoader`].

use crate::template::BasePdf;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kurbo::Size;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Asset loading errors.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Base PDF reference needs an external loader: {0}")]
    Unsupported(String),
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Asset load failed: {0}")]
    Load(String),
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// One loaded page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAsset {
    /// Page size in millimeters.
    pub size: Size,
    /// Background image reference (empty for a blank page).
    pub background: String,
}

impl PageAsset {
    pub fn blank(size: Size) -> Self {
        Self {
            size,
            background: String::new(),
        }
    }
}

/// Produces per-page assets for a base PDF.
///
/// The core is single-threaded, so implementations need not be `Send`.
pub trait AssetLoader {
    /// Load assets for a template with `page_count` pages.
    fn load_pages<'a>(&'a self, base_pdf: &'a BasePdf, page_count: usize) -> BoxFuture<'a, AssetResult<Vec<PageAsset>>>;
}

/// Loader for blank base PDFs; one blank page per template page.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankPageLoader;

impl AssetLoader for BlankPageLoader {
    fn load_pages<'a>(&'a self, base_pdf: &'a BasePdf, page_count: usize) -> BoxFuture<'a, AssetResult<Vec<PageAsset>>> {
        Box::pin(async move {
            match base_pdf {
                BasePdf::Blank(blank) => {
                    let size = Size::new(blank.width, blank.height);
                    Ok(vec![PageAsset::blank(size); page_count.max(1)])
                }
                BasePdf::Reference(reference) => Err(AssetError::Unsupported(abbreviate(reference))),
            }
        })
    }
}

/// Loader returning a fixed list of pages, for hosts that rasterize
/// externally.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLoader {
    pages: Vec<PageAsset>,
}

impl MemoryAssetLoader {
    pub fn new(pages: Vec<PageAsset>) -> Self {
        Self { pages }
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load_pages<'a>(&'a self, _base_pdf: &'a BasePdf, _page_count: usize) -> BoxFuture<'a, AssetResult<Vec<PageAsset>>> {
        Box::pin(async move {
            if self.pages.is_empty() {
                return Err(AssetError::Load("no pages".to_string()));
            }
            Ok(self.pages.clone())
        })
    }
}

/// Decode a base64 `data:` URI into its media type and bytes.
pub fn decode_data_uri(uri: &str) -> AssetResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUri(abbreviate(uri)))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUri(abbreviate(uri)))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| AssetError::InvalidDataUri(abbreviate(uri)))?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((media_type.to_string(), bytes))
}

/// Encode bytes as a base64 `data:` URI.
pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

fn abbreviate(s: &str) -> String {
    s.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::block_on;

    #[test]
    fn test_blank_loader_one_page_per_template_page() {
        let pages = block_on(BlankPageLoader.load_pages(&BasePdf::a4(), 3)).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].size, Size::new(210.0, 297.0));
        assert!(pages[0].background.is_empty());
    }

    #[test]
    fn test_blank_loader_rejects_reference() {
        let base = BasePdf::Reference("data:application/pdf;base64,JVBERi0=".into());
        let result = block_on(BlankPageLoader.load_pages(&base, 1));
        assert!(matches!(result, Err(AssetError::Unsupported(_))));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryAssetLoader::new(vec![PageAsset {
            size: Size::new(100.0, 100.0),
            background: "page-1.png".into(),
        }]);
        let pages = block_on(loader.load_pages(&BasePdf::a4(), 5)).unwrap();
        assert_eq!(pages.len(), 1);

        let empty = MemoryAssetLoader::default();
        assert!(block_on(empty.load_pages(&BasePdf::a4(), 1)).is_err());
    }

    #[test]
    fn test_data_uri() {
        let uri = encode_data_uri("image/png", b"\x89PNG");
        let (media, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(media, "image/png");
        assert_eq!(bytes, b"\x89PNG");

        assert!(matches!(decode_data_uri("https://x/y.png"), Err(AssetError::InvalidDataUri(_))));
        assert!(matches!(decode_data_uri("data:image/png;base64,@@@"), Err(AssetError::Decode(_))));
    }
}
