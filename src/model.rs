use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which collection an entry came from. Every record belongs to exactly one
/// kind for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Donation,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub donor_name: String,
    pub amount: f64,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
}

/// One line of the merged recent-activity feed, annotated with its origin
/// kind so the presentation layer can style it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub kind: EntryKind,
    pub label: String,
    pub subtitle: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl Donation {
    pub fn activity_entry(&self) -> ActivityEntry {
        ActivityEntry {
            kind: EntryKind::Donation,
            label: self.donor_name.clone(),
            subtitle: self.notes.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

impl Expense {
    pub fn activity_entry(&self) -> ActivityEntry {
        ActivityEntry {
            kind: EntryKind::Expense,
            label: self.description.clone(),
            subtitle: self.category.clone(),
            amount: self.amount,
            date: self.date,
        }
    }
}

/// Parses a user-entered amount. Anything that is not a finite, non-negative
/// number is rejected here so it can never reach the running totals.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
