//! Record submission: uploads the optional receipt image (fail-soft), then
//! appends an immutable record with a server-assigned timestamp to the
//! matching collection. The append is what fans the new snapshot out to the
//! dashboard subscription.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::images::{ImageStore, ImageUpload};
use crate::model::{parse_amount, Donation, Expense};
use crate::store::LedgerStore;

/// User-entered donation fields, validated by the caller.
#[derive(Debug, Default)]
pub struct NewDonation {
    pub donor_name: String,
    pub amount: f64,
    pub notes: Option<String>,
    pub image: Option<ImageUpload>,
}

/// User-entered expense fields, validated by the caller.
#[derive(Debug, Default)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Outcome of a CSV bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
}

pub struct Ledger {
    store: Arc<LedgerStore>,
    images: Option<Arc<dyn ImageStore>>,
}

impl Ledger {
    pub fn new(store: Arc<LedgerStore>, images: Option<Arc<dyn ImageStore>>) -> Self {
        Self { store, images }
    }

    pub async fn record_donation(&self, new: NewDonation) -> anyhow::Result<Donation> {
        let image_url = self.upload_image(new.image).await;
        let donation = Donation {
            id: Uuid::new_v4().to_string(),
            donor_name: new.donor_name,
            amount: new.amount,
            notes: new.notes,
            image_url,
            date: Utc::now(),
        };
        self.store.donations().add(donation.clone()).await?;
        Ok(donation)
    }

    pub async fn record_expense(&self, new: NewExpense) -> anyhow::Result<Expense> {
        let image_url = self.upload_image(new.image).await;
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: new.description,
            amount: new.amount,
            category: new.category,
            image_url,
            date: Utc::now(),
        };
        self.store.expenses().add(expense.clone()).await?;
        Ok(expense)
    }

    /// Imports donations from CSV text with a `donor_name,amount,notes`
    /// header row. Rows with a malformed amount are skipped and counted, not
    /// fatal to the batch.
    pub async fn import_donations_csv(&self, csv_text: &str) -> ImportOutcome {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());
        let mut outcome = ImportOutcome {
            imported: 0,
            skipped: 0,
        };

        for record in reader.records() {
            let rec = match record {
                Ok(rec) => rec,
                Err(e) => {
                    tracing::error!("CSV parse error: {e}");
                    outcome.skipped += 1;
                    continue;
                }
            };

            let donor_name = rec.get(0).unwrap_or("").to_string();
            let Some(amount) = rec.get(1).and_then(parse_amount) else {
                outcome.skipped += 1;
                continue;
            };
            let notes = rec
                .get(2)
                .map(|s| s.to_string())
                .filter(|s| !s.trim().is_empty());

            let new = NewDonation {
                donor_name,
                amount,
                notes,
                image: None,
            };
            match self.record_donation(new).await {
                Ok(_) => outcome.imported += 1,
                Err(e) => {
                    tracing::error!("Import write failed: {e:#}");
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }

    // Upload failures are logged and swallowed; the record is still created.
    async fn upload_image(&self, image: Option<ImageUpload>) -> Option<String> {
        let image = image?;
        let Some(images) = &self.images else {
            tracing::warn!("image storage not configured, recording without image");
            return None;
        };
        match images.upload(&image).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("image upload failed, recording without image: {e:#}");
                None
            }
        }
    }
}
