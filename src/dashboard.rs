//! Dashboard aggregation: running totals per collection and the merged
//! recent-activity feed, recomputed whenever either collection delivers a
//! snapshot.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use crate::model::{ActivityEntry, Donation, Expense};
use crate::store::LedgerStore;

/// Number of entries shown in the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Running totals and the last snapshot of each collection. State is rebuilt
/// wholesale from every snapshot, never patched incrementally, so it always
/// matches the latest delivery per collection.
#[derive(Debug, Default)]
pub struct DashboardState {
    donation_total: f64,
    expense_total: f64,
    donations: Vec<Donation>,
    expenses: Vec<Expense>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the donation snapshot and recomputes its total.
    pub fn apply_donations(&mut self, snapshot: Vec<Donation>) {
        self.donation_total = snapshot.iter().map(|d| d.amount).sum();
        self.donations = snapshot;
    }

    /// Replaces the expense snapshot and recomputes its total.
    pub fn apply_expenses(&mut self, snapshot: Vec<Expense>) {
        self.expense_total = snapshot.iter().map(|e| e.amount).sum();
        self.expenses = snapshot;
    }

    pub fn donation_total(&self) -> f64 {
        self.donation_total
    }

    pub fn expense_total(&self) -> f64 {
        self.expense_total
    }

    pub fn net_balance(&self) -> f64 {
        self.donation_total - self.expense_total
    }

    /// The merged feed: both collections concatenated, sorted newest first,
    /// truncated to [`RECENT_ACTIVITY_LIMIT`]. The sort is stable, so equal
    /// timestamps keep arrival order (donations ahead of expenses).
    ///
    /// This is a full re-sort on every refresh, which is fine while the
    /// collections stay small; if they grew past a few thousand records this
    /// is the place to switch to a bounded top-K merge.
    pub fn recent_activity(&self) -> Vec<ActivityEntry> {
        let mut merged: Vec<ActivityEntry> = self
            .donations
            .iter()
            .map(Donation::activity_entry)
            .chain(self.expenses.iter().map(Expense::activity_entry))
            .collect();
        merged.sort_by(|a, b| b.date.cmp(&a.date));
        merged.truncate(RECENT_ACTIVITY_LIMIT);
        merged
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            donation_total: self.donation_total,
            expense_total: self.expense_total,
            net_balance: self.net_balance(),
            recent_activity: self.recent_activity(),
        }
    }
}

/// Immutable dashboard snapshot published to readers after every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub donation_total: f64,
    pub expense_total: f64,
    pub net_balance: f64,
    pub recent_activity: Vec<ActivityEntry>,
}

/// Subscribes to both collections and republishes the dashboard summary
/// through a watch channel after every snapshot, including the initial one.
///
/// The two subscriptions stay independent: there is no pairing between a
/// donation snapshot and the expense snapshot it is merged with, so a fresh
/// donation delivery can be combined with a stale expense list. Readers must
/// tolerate that skew; the next delivery on the other side converges it.
pub fn spawn_aggregator(store: Arc<LedgerStore>) -> watch::Receiver<DashboardSummary> {
    let mut donations = store.donations().subscribe();
    let mut expenses = store.expenses().subscribe();
    let (tx, rx) = watch::channel(DashboardSummary::default());

    tokio::spawn(async move {
        let mut state = DashboardState::new();

        // The current contents count as the first snapshot of each collection.
        state.apply_donations(store.donations().snapshot().await);
        state.apply_expenses(store.expenses().snapshot().await);
        let _ = tx.send(state.summary());

        loop {
            tokio::select! {
                received = donations.recv() => match received {
                    Ok(snapshot) => state.apply_donations(snapshot),
                    Err(RecvError::Lagged(_)) => {
                        state.apply_donations(store.donations().snapshot().await);
                    }
                    Err(RecvError::Closed) => break,
                },
                received = expenses.recv() => match received {
                    Ok(snapshot) => state.apply_expenses(snapshot),
                    Err(RecvError::Lagged(_)) => {
                        state.apply_expenses(store.expenses().snapshot().await);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
            if tx.send(state.summary()).is_err() {
                break;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;
    use chrono::{DateTime, Duration, Utc};

    fn donation(amount: f64, date: DateTime<Utc>) -> Donation {
        Donation {
            id: uuid::Uuid::new_v4().to_string(),
            donor_name: "donor".to_string(),
            amount,
            notes: None,
            image_url: None,
            date,
        }
    }

    fn expense(amount: f64, date: DateTime<Utc>) -> Expense {
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            description: "supplies".to_string(),
            amount,
            category: None,
            image_url: None,
            date,
        }
    }

    #[test]
    fn totals_are_recomputed_from_each_snapshot() {
        let now = Utc::now();
        let mut state = DashboardState::new();

        state.apply_donations(vec![
            donation(100.0, now),
            donation(250.0, now),
            donation(50.0, now),
        ]);
        assert_eq!(state.donation_total(), 400.0);

        // A later snapshot replaces the list wholesale, it is not added on.
        state.apply_donations(vec![donation(75.0, now)]);
        assert_eq!(state.donation_total(), 75.0);
    }

    #[test]
    fn empty_snapshot_resets_the_total() {
        let mut state = DashboardState::new();
        state.apply_expenses(vec![expense(300.0, Utc::now())]);
        state.apply_expenses(Vec::new());
        assert_eq!(state.expense_total(), 0.0);
        assert!(state.recent_activity().is_empty());
    }

    #[test]
    fn feed_length_is_capped_at_the_limit() {
        let base = Utc::now();
        let mut state = DashboardState::new();
        state.apply_donations(
            (0..7)
                .map(|i| donation(10.0, base + Duration::seconds(i)))
                .collect(),
        );
        state.apply_expenses(
            (0..8)
                .map(|i| expense(5.0, base + Duration::seconds(100 + i)))
                .collect(),
        );

        assert_eq!(state.recent_activity().len(), RECENT_ACTIVITY_LIMIT);

        state.apply_donations(vec![donation(10.0, base)]);
        state.apply_expenses(vec![expense(5.0, base)]);
        assert_eq!(state.recent_activity().len(), 2);
    }

    #[test]
    fn feed_is_sorted_newest_first() {
        let base = Utc::now();
        let mut state = DashboardState::new();
        state.apply_donations(vec![
            donation(10.0, base + Duration::seconds(5)),
            donation(20.0, base + Duration::seconds(40)),
        ]);
        state.apply_expenses(vec![
            expense(5.0, base + Duration::seconds(20)),
            expense(15.0, base),
        ]);

        let feed = state.recent_activity();
        assert!(feed.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn merging_twice_yields_the_same_sequence() {
        let base = Utc::now();
        let mut state = DashboardState::new();
        state.apply_donations(vec![donation(10.0, base), donation(20.0, base)]);
        state.apply_expenses(vec![expense(5.0, base + Duration::seconds(1))]);

        assert_eq!(state.recent_activity(), state.recent_activity());
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let now = Utc::now();
        let mut state = DashboardState::new();
        state.apply_donations(vec![donation(10.0, now)]);
        state.apply_expenses(vec![expense(5.0, now)]);

        let feed = state.recent_activity();
        assert_eq!(feed[0].kind, EntryKind::Donation);
        assert_eq!(feed[1].kind, EntryKind::Expense);
    }

    #[test]
    fn donation_and_expense_scenario() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(60);
        let mut state = DashboardState::new();
        state.apply_donations(vec![donation(500.0, t2)]);
        state.apply_expenses(vec![expense(200.0, t1)]);

        assert_eq!(state.donation_total(), 500.0);
        assert_eq!(state.expense_total(), 200.0);
        assert_eq!(state.net_balance(), 300.0);

        let feed = state.recent_activity();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, EntryKind::Donation);
        assert_eq!(feed[0].amount, 500.0);
        assert_eq!(feed[1].kind, EntryKind::Expense);
        assert_eq!(feed[1].amount, 200.0);
    }
}
