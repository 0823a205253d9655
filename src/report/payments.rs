use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::Serialize;

use crate::db::models::PaymentRecord;
use crate::report::period::parse_record_date;

/// Payment filter: every payment, or one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPeriod {
    All,
    Year(i32),
}

impl PaymentPeriod {
    /// Accepts `all` or a four-digit year.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }

        if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
            return token.parse().ok().map(Self::Year);
        }

        None
    }

    pub fn label(self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Year(year) => year.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountPoint {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStats {
    pub period: String,
    pub total_amount: f64,
    pub payment_count: usize,
    pub series: Vec<AmountPoint>,
    pub years: Vec<i32>,
    pub payments: Vec<PaymentRecord>,
}

/// Totals and a grouped amount series: yearly for `all`, monthly within a year.
pub fn payment_stats(payments: Vec<PaymentRecord>, period: PaymentPeriod) -> PaymentStats {
    let years = payments
        .iter()
        .filter_map(|payment| parse_record_date(&payment.date))
        .map(|paid_at| paid_at.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>();

    let filtered = payments
        .into_iter()
        .filter(|payment| match period {
            PaymentPeriod::All => true,
            PaymentPeriod::Year(year) => {
                parse_record_date(&payment.date).is_some_and(|paid_at| paid_at.year() == year)
            }
        })
        .collect::<Vec<_>>();

    let total_amount = round_cents(filtered.iter().map(|payment| payment.amount).sum());

    let mut grouped: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for payment in &filtered {
        let Some(paid_at) = parse_record_date(&payment.date) else {
            continue;
        };
        let key = match period {
            PaymentPeriod::All => (paid_at.year(), 0),
            PaymentPeriod::Year(_) => (paid_at.year(), paid_at.month()),
        };
        *grouped.entry(key).or_default() += payment.amount;
    }

    let series = grouped
        .into_iter()
        .map(|((year, month), amount)| AmountPoint {
            label: if month == 0 {
                format!("{year}年")
            } else {
                format!("{year}年{month}月")
            },
            amount: round_cents(amount),
        })
        .collect();

    PaymentStats {
        period: period.label(),
        total_amount,
        payment_count: filtered.len(),
        series,
        years,
        payments: filtered,
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::tests::payment;

    fn sample() -> Vec<PaymentRecord> {
        vec![
            payment("a", 100.0, "2025-03-02"),
            payment("b", 50.5, "2025-03-20"),
            payment("c", 20.0, "2025-11-01"),
            payment("d", 300.0, "2026-01-15"),
        ]
    }

    #[test]
    fn parses_period_tokens() {
        assert_eq!(PaymentPeriod::parse("all"), Some(PaymentPeriod::All));
        assert_eq!(PaymentPeriod::parse("2025"), Some(PaymentPeriod::Year(2025)));
        assert_eq!(PaymentPeriod::parse("25"), None);
        assert_eq!(PaymentPeriod::parse("last-year"), None);
    }

    #[test]
    fn all_time_groups_by_year() {
        let stats = payment_stats(sample(), PaymentPeriod::All);

        assert_eq!(stats.payment_count, 4);
        assert_eq!(stats.total_amount, 470.5);
        assert_eq!(
            stats.series,
            vec![
                AmountPoint {
                    label: "2025年".to_string(),
                    amount: 170.5,
                },
                AmountPoint {
                    label: "2026年".to_string(),
                    amount: 300.0,
                },
            ]
        );
        assert_eq!(stats.years, vec![2026, 2025]);
    }

    #[test]
    fn single_year_groups_by_month() {
        let stats = payment_stats(sample(), PaymentPeriod::Year(2025));

        assert_eq!(stats.payment_count, 3);
        assert_eq!(stats.total_amount, 170.5);
        let labels = stats
            .series
            .iter()
            .map(|point| point.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["2025年3月", "2025年11月"]);
        assert_eq!(stats.years, vec![2026, 2025]);
    }

    #[test]
    fn empty_year_has_no_series() {
        let stats = payment_stats(sample(), PaymentPeriod::Year(2019));
        assert_eq!(stats.payment_count, 0);
        assert_eq!(stats.total_amount, 0.0);
        assert!(stats.series.is_empty());
    }
}
