//! Barcode-scan producer glue.
//!
//! The capture subsystem and the product-lookup service are external
//! collaborators: the first emits barcode strings, the second resolves a
//! barcode to a product title. This module turns that pair into ordinary
//! [`Ledger::add_item`] calls -- a scanned product becomes a candidate item
//! with price 0 in the [`Category::Misc`] bucket, to be priced and
//! re-categorized by hand later.

use chrono::Weekday;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Category, Ledger, ResultLedger, ShoppingItem};

/// Failure of the external product-lookup collaborator (timeout, unknown
/// barcode, malformed response). Never fatal to the ledger: a failed lookup
/// falls back to a title derived from the raw barcode.
#[derive(Error, Debug)]
#[error("product lookup failed: {0}")]
pub struct LookupError(pub String);

/// Resolves a scanned barcode to a product title.
///
/// Implementations wrap whatever catalog service the application uses; the
/// HTTP plumbing stays outside the core.
pub trait ProductLookup {
    fn product_title(
        &self,
        barcode: &str,
    ) -> impl Future<Output = Result<String, LookupError>> + Send;
}

/// Feeds de-duplicated scans into the ledger.
///
/// Camera frames resolve the same barcode many times in a row; consecutive
/// identical scans are suppressed so one physical scan produces one item.
/// A different barcode in between re-arms the previous one.
#[derive(Debug)]
pub struct ScanIngestor<'a, L> {
    ledger: &'a Ledger,
    lookup: L,
    last_barcode: Option<String>,
}

impl<'a, L: ProductLookup> ScanIngestor<'a, L> {
    pub fn new(ledger: &'a Ledger, lookup: L) -> Self {
        Self {
            ledger,
            lookup,
            last_barcode: None,
        }
    }

    /// Handles one scanned barcode.
    ///
    /// Returns the id of the item added, or `None` when the scan was a
    /// suppressed duplicate.
    pub async fn handle_scan(&mut self, barcode: &str) -> ResultLedger<Option<i32>> {
        if self.last_barcode.as_deref() == Some(barcode) {
            debug!(barcode, "duplicate scan suppressed");
            return Ok(None);
        }
        self.last_barcode = Some(barcode.to_string());

        let item = match self.lookup.product_title(barcode).await {
            Ok(title) => scanned_item(&title, barcode)
                .unwrap_or_else(|| fallback_item(barcode)),
            Err(err) => {
                warn!(barcode, %err, "product lookup failed; falling back to raw barcode");
                fallback_item(barcode)
            }
        };

        let id = self.ledger.add_item(&item).await?;
        Ok(Some(id))
    }
}

/// Candidate item for a resolved product. `None` when the catalog returned a
/// blank title, in which case the caller falls back to the raw barcode.
fn scanned_item(title: &str, barcode: &str) -> Option<ShoppingItem> {
    ShoppingItem::new(
        title,
        Category::Misc,
        format!("Scanned barcode: {barcode}"),
        0,
        Weekday::Mon,
    )
    .ok()
}

fn fallback_item(barcode: &str) -> ShoppingItem {
    ShoppingItem {
        id: 0,
        title: format!("Barcode: {barcode}"),
        category: Category::Misc,
        description: "Scanned barcode".to_string(),
        price_minor: 0,
        acquired: false,
        day_of_week: Weekday::Mon,
    }
}
