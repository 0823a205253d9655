//! Repair of account rows whose `account` and `row` columns drifted apart.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::db::models::AccountRecord;

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date prefix pattern is valid"));

const BLANK_MARKERS: [&str; 2] = ["null", "undefined"];

/// Outcome of checking one account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCheck {
    Valid,
    /// `account` held a date-like value and `row` held the real account; they were swapped.
    Corrected,
    /// `account` held a date-like value and nothing usable was found; it was cleared.
    Rejected,
}

fn looks_misplaced(value: &str) -> bool {
    value.contains('-') || DATE_PREFIX.is_match(value)
}

fn clean_marker(value: &mut String) {
    if BLANK_MARKERS.contains(&value.as_str()) {
        value.clear();
    }
}

pub fn normalize_account(record: &mut AccountRecord) -> AccountCheck {
    let mut check = AccountCheck::Valid;

    if !record.account.is_empty() && looks_misplaced(&record.account) {
        if !record.row.is_empty() && !looks_misplaced(&record.row) {
            std::mem::swap(&mut record.account, &mut record.row);
            check = AccountCheck::Corrected;
        } else {
            record.account.clear();
            check = AccountCheck::Rejected;
        }
    }

    clean_marker(&mut record.row);
    clean_marker(&mut record.account);

    check
}

/// Normalizes listed accounts in memory, logging each repaired record.
pub fn normalize_accounts(records: &mut [AccountRecord]) {
    for record in records.iter_mut() {
        match normalize_account(record) {
            AccountCheck::Valid => {}
            AccountCheck::Corrected => {
                warn!(account_id = %record.id, "account and row values were swapped");
            }
            AccountCheck::Rejected => {
                warn!(account_id = %record.id, "account value looked like a date and was cleared");
            }
        }
    }
}
