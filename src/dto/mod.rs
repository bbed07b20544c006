pub mod manifest;

pub use manifest::{ManifestItem, StockManifest};
