//! Error type for manifest loading.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors raised while fetching or parsing a tileset manifest.
///
/// These propagate to the layer adapter, which logs and leaves the layer
/// empty rather than failing construction.
#[derive(Debug, Error)]
pub enum TilesetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("manifest parse failed for {url}: {message}")]
    Parse { url: String, message: String },
}
