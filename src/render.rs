//! Thin presentation layer over the dashboard core. The aggregator exposes
//! pure data; everything display-shaped (currency strings, date strings,
//! fallbacks for missing fields) lives here and can be swapped out without
//! touching the core.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::DashboardSummary;
use crate::model::{ActivityEntry, EntryKind};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub total_donations: String,
    pub total_expenses: String,
    pub net_balance: String,
    pub balance_positive: bool,
    pub recent_activity: Vec<ActivityLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLine {
    pub kind: EntryKind,
    pub title: String,
    pub subtitle: String,
    pub amount: String,
    pub date: String,
}

pub fn dashboard_page(summary: &DashboardSummary) -> DashboardPage {
    DashboardPage {
        total_donations: format_inr(summary.donation_total),
        total_expenses: format_inr(summary.expense_total),
        net_balance: format_inr(summary.net_balance),
        balance_positive: summary.net_balance >= 0.0,
        recent_activity: summary.recent_activity.iter().map(activity_line).collect(),
    }
}

fn activity_line(entry: &ActivityEntry) -> ActivityLine {
    let (title, subtitle, sign) = match entry.kind {
        EntryKind::Donation => {
            let title = if entry.label.trim().is_empty() {
                "Anonymous".to_string()
            } else {
                entry.label.clone()
            };
            (title, "Donation".to_string(), '+')
        }
        EntryKind::Expense => {
            let subtitle = entry
                .subtitle
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Expense".to_string());
            (entry.label.clone(), subtitle, '-')
        }
    };

    ActivityLine {
        kind: entry.kind,
        title,
        subtitle,
        amount: format!("{sign}{}", format_inr(entry.amount)),
        date: format_date(&entry.date),
    }
}

/// Indian-locale INR: two decimals, a group of three then groups of two
/// (1234567.8 renders as "₹12,34,567.80").
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            parts.push(&head[end - 2..end]);
            end -= 2;
        }
        parts.push(&head[..end]);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if negative { "-" } else { "" };
    format!("{sign}₹{grouped}.{fraction:02}")
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}
