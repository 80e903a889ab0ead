//! Product catalog loading.
//!
//! The catalog is a JSON array of product records read once at startup
//! and pushed into the product directory as one-time initializations.

use std::path::Path;

use entities::{DirectoryError, EntityDirectory, ProductCommand, ProductEntity, ProductRecord};
use thiserror::Error;

/// Errors raised while loading the product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Catalog read error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a valid product list.
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A product entity could not be initialized.
    #[error("Catalog entity error: {0}")]
    Entity(#[from] DirectoryError),
}

/// Reads the catalog at `path` and initializes one product entity per
/// record, returning how many were installed.
///
/// A missing file is not an error: the gateway starts with an empty
/// catalog. Records with a negative price and records whose id is already
/// initialized are skipped with a warning.
pub async fn load_into(
    directory: &EntityDirectory<ProductEntity>,
    path: &Path,
) -> Result<usize, CatalogError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "catalog file missing, starting empty");
            return Ok(0);
        }
        Err(e) => return Err(CatalogError::Io(e)),
    };

    let records: Vec<ProductRecord> = serde_json::from_str(&raw)?;

    let mut loaded = 0;
    for record in records {
        let id = record.id;
        if record.price.is_negative() {
            tracing::warn!(product_id = %id, price = %record.price, "negative price, entry skipped");
            continue;
        }

        let accepted = directory
            .resolve(id)
            .ask(|reply| ProductCommand::Initialize { record, reply })
            .await?;

        if accepted {
            loaded += 1;
        } else {
            tracing::warn!(product_id = %id, "duplicate catalog entry ignored");
        }
    }

    Ok(loaded)
}
