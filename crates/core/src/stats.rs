//! Aggregates over fetched rows.
//!
//! Everything here is a pure function of the slice it is given; categories
//! are discovered from the data, and rows with an absent or blank value are
//! left out of that category's tally (but still count toward totals).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{CaseRecord, MailEntry, TrackingSession, UserProfile};

/// Category → occurrence count, in category order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tally(BTreeMap<String, usize>);

impl Tally {
    /// Count each present, non-blank value.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts = BTreeMap::new();
        for value in values.into_iter().flatten() {
            let value = value.trim();
            if !value.is_empty() {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }
        Self(counts)
    }

    #[must_use]
    pub fn get(&self, category: &str) -> usize {
        self.0.get(category).copied().unwrap_or(0)
    }

    /// Number of distinct categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn counted(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Categories in order, for filter dropdowns.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries ordered by descending count, ties by category.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Whole-number percentage of `part` in `total`; zero when `total` is zero.
#[must_use]
pub fn percentage(part: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        (part * 100 + total / 2) / total
    }
}

/// Summary of the users table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: usize,
    pub subscribed: usize,
    pub by_country: Tally,
    pub by_city: Tally,
}

impl UserStats {
    #[must_use]
    pub fn compute(users: &[UserProfile]) -> Self {
        Self {
            total: users.len(),
            subscribed: users.iter().filter(|u| u.newsletter_subscribed).count(),
            by_country: Tally::from_values(users.iter().map(|u| u.country.as_deref())),
            by_city: Tally::from_values(users.iter().map(|u| u.city.as_deref())),
        }
    }

    /// Share of users subscribed to the newsletter.
    #[must_use]
    pub fn subscription_rate(&self) -> usize {
        percentage(self.subscribed, self.total)
    }
}

/// Summary of the tracking table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackingStats {
    pub total: usize,
    pub by_device: Tally,
    pub by_country: Tally,
    pub total_visits: i64,
}

impl TrackingStats {
    #[must_use]
    pub fn compute(sessions: &[TrackingSession]) -> Self {
        Self {
            total: sessions.len(),
            by_device: Tally::from_values(sessions.iter().map(|s| s.device_type.as_deref())),
            by_country: Tally::from_values(sessions.iter().map(|s| s.country.as_deref())),
            total_visits: sessions.iter().map(|s| i64::from(s.visit_count)).sum(),
        }
    }
}

/// Summary of the case inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub total_stock: i64,
    /// Σ price × stock.
    pub inventory_value: Decimal,
    pub by_phone_model: Tally,
    pub by_material: Tally,
}

impl InventoryStats {
    #[must_use]
    pub fn compute(cases: &[CaseRecord]) -> Self {
        Self {
            total: cases.len(),
            total_stock: cases.iter().map(|c| i64::from(c.stock)).sum(),
            inventory_value: cases.iter().map(CaseRecord::stock_value).sum(),
            by_phone_model: Tally::from_values(cases.iter().map(|c| Some(c.phone_model.as_str()))),
            by_material: Tally::from_values(cases.iter().map(|c| c.material.as_deref())),
        }
    }
}

/// Summary of the mailing list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailStats {
    pub total: usize,
    pub subscribed: usize,
    pub by_source: Tally,
}

impl MailStats {
    #[must_use]
    pub fn compute(entries: &[MailEntry]) -> Self {
        Self {
            total: entries.len(),
            subscribed: entries.iter().filter(|m| m.subscribed).count(),
            by_source: Tally::from_values(entries.iter().map(|m| m.source.as_deref())),
        }
    }

    #[must_use]
    pub const fn unsubscribed(&self) -> usize {
        self.total - self.subscribed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(country: Option<&str>, city: Option<&str>, subscribed: bool) -> UserProfile {
        serde_json::from_value(json!({
            "id": uuid::Uuid::new_v4(),
            "email": format!("{}@example.com", uuid::Uuid::new_v4()),
            "first_name": "Ana",
            "last_name": "López",
            "country": country,
            "city": city,
            "newsletter_subscribed": subscribed,
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_tally_skips_absent_and_blank() {
        let tally = Tally::from_values([Some("México"), None, Some("  "), Some("México"), Some("Chile")]);
        assert_eq!(tally.get("México"), 2);
        assert_eq!(tally.get("Chile"), 1);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.counted(), 3);
        assert_eq!(tally.categories().collect::<Vec<_>>(), vec!["Chile", "México"]);
        assert_eq!(tally.ranked()[0], ("México", 2));
    }

    #[test]
    fn test_user_stats() {
        let users = vec![
            user(Some("México"), Some("Guadalajara"), true),
            user(Some("México"), Some("Monterrey"), false),
            user(None, None, true),
        ];
        let stats = UserStats::compute(&users);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.subscribed, 2);
        assert_eq!(stats.by_country.get("México"), 2);
        assert_eq!(stats.by_city.len(), 2);
        assert_eq!(stats.subscription_rate(), 67);
    }

    #[test]
    fn test_empty_stats() {
        let stats = UserStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.subscription_rate(), 0);
        assert!(stats.by_country.is_empty());
        assert_eq!(InventoryStats::compute(&[]).inventory_value, Decimal::ZERO);
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
    }
}
