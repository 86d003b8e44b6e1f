//! Embedded document store backing the ledger.
//!
//! Two named collections (`donations`, `expenses`) held in memory and
//! mirrored to an append-only JSON-lines log per collection. Every append
//! delivers the full updated collection snapshot to all subscribers, which
//! is what the dashboard aggregation consumes; per-page lists use the
//! ordered `recent` query instead.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::model::{Donation, Expense};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Page size for the per-collection list views.
pub const PAGE_LIMIT: usize = 20;

pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn recorded_at(&self) -> DateTime<Utc>;
}

impl Document for Donation {
    const COLLECTION: &'static str = "donations";

    fn recorded_at(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Document for Expense {
    const COLLECTION: &'static str = "expenses";

    fn recorded_at(&self) -> DateTime<Utc> {
        self.date
    }
}

/// One named collection of immutable documents.
pub struct Collection<T: Document> {
    docs: RwLock<Vec<T>>,
    updates: broadcast::Sender<Vec<T>>,
    log: Option<Mutex<File>>,
}

impl<T: Document> Collection<T> {
    fn in_memory() -> Self {
        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            docs: RwLock::new(Vec::new()),
            updates,
            log: None,
        }
    }

    fn open(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(format!("{}.jsonl", T::COLLECTION));

        let mut docs = Vec::new();
        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let doc = serde_json::from_str(&line)
                    .with_context(|| format!("corrupt entry in {}", path.display()))?;
                docs.push(doc);
            }
        }

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {} for append", path.display()))?;

        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Ok(Self {
            docs: RwLock::new(docs),
            updates,
            log: Some(Mutex::new(log)),
        })
    }

    /// Appends one document and delivers the full updated snapshot to every
    /// subscriber. Documents are immutable once written; there is no update
    /// or delete path.
    pub async fn add(&self, doc: T) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        if let Some(log) = &self.log {
            let line = serde_json::to_string(&doc)?;
            let mut file = log
                .lock()
                .map_err(|_| anyhow::anyhow!("{} log lock poisoned", T::COLLECTION))?;
            writeln!(file, "{line}")
                .with_context(|| format!("appending to {} log", T::COLLECTION))?;
        }
        docs.push(doc);
        // Receivers that lagged refetch via snapshot(), so send errors only
        // mean nobody is listening yet.
        let _ = self.updates.send(docs.clone());
        Ok(())
    }

    /// The complete current contents, in arrival order.
    pub async fn snapshot(&self) -> Vec<T> {
        self.docs.read().await.clone()
    }

    /// Subscribes to full-collection snapshots. The current contents are not
    /// replayed; callers read `snapshot()` once before listening.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<T>> {
        self.updates.subscribe()
    }

    /// The `limit` most recent documents, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<T> {
        let mut docs = self.docs.read().await.clone();
        docs.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
        docs.truncate(limit);
        docs
    }
}

pub struct LedgerStore {
    donations: Collection<Donation>,
    expenses: Collection<Expense>,
}

impl LedgerStore {
    /// Opens (or creates) the store under `dir`, replaying any existing
    /// collection logs.
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
        Ok(Self {
            donations: Collection::open(dir)?,
            expenses: Collection::open(dir)?,
        })
    }

    /// A store with no backing files. Used by tests to inject synthetic
    /// snapshots without touching disk.
    pub fn in_memory() -> Self {
        Self {
            donations: Collection::in_memory(),
            expenses: Collection::in_memory(),
        }
    }

    pub fn donations(&self) -> &Collection<Donation> {
        &self.donations
    }

    pub fn expenses(&self) -> &Collection<Expense> {
        &self.expenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn donation(donor: &str, amount: f64, date: DateTime<Utc>) -> Donation {
        Donation {
            id: uuid::Uuid::new_v4().to_string(),
            donor_name: donor.to_string(),
            amount,
            notes: None,
            image_url: None,
            date,
        }
    }

    #[tokio::test]
    async fn add_delivers_full_snapshots() {
        let store = LedgerStore::in_memory();
        let mut updates = store.donations().subscribe();

        let base = Utc::now();
        store
            .donations()
            .add(donation("Asha", 100.0, base))
            .await
            .expect("add");
        store
            .donations()
            .add(donation("Ravi", 50.0, base + Duration::seconds(1)))
            .await
            .expect("add");

        let first = updates.recv().await.expect("first snapshot");
        assert_eq!(first.len(), 1);
        let second = updates.recv().await.expect("second snapshot");
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].donor_name, "Asha");
    }

    #[tokio::test]
    async fn recent_returns_the_newest_page() {
        let store = LedgerStore::in_memory();
        let base = Utc::now();
        for i in 0..25 {
            store
                .donations()
                .add(donation(&format!("donor-{i}"), 10.0, base + Duration::seconds(i)))
                .await
                .expect("add");
        }

        let page = store.donations().recent(PAGE_LIMIT).await;
        assert_eq!(page.len(), PAGE_LIMIT);
        assert_eq!(page[0].donor_name, "donor-24");
        assert_eq!(page[PAGE_LIMIT - 1].donor_name, "donor-5");
        assert!(page.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn reopen_replays_the_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = LedgerStore::open(dir.path()).expect("open");
            store
                .donations()
                .add(donation("Asha", 500.0, Utc::now()))
                .await
                .expect("add");
        }

        let reopened = LedgerStore::open(dir.path()).expect("reopen");
        let snapshot = reopened.donations().snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].donor_name, "Asha");
        assert_eq!(snapshot[0].amount, 500.0);
    }
}
