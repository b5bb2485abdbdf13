//! Cadence-based eligibility.
//!
//! `weekly` entities are always eligible. For longer cadences an entity with no
//! history is eligible; otherwise the days since its latest ledger entry must
//! reach the cadence threshold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use syndic_state::{Entity, Frequency, PublicationLedger};

pub const BIWEEKLY_MIN_DAYS: i64 = 13;
pub const MONTHLY_MIN_DAYS: i64 = 27;

/// Why an entity is or is not eligible this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Eligibility {
    WeeklyCadence,
    NoHistory,
    IntervalElapsed { days_since: i64, required: i64 },
    TooSoon { days_since: i64, required: i64 },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Eligibility::TooSoon { .. })
    }
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eligibility::WeeklyCadence => write!(f, "weekly cadence"),
            Eligibility::NoHistory => write!(f, "never published"),
            Eligibility::IntervalElapsed {
                days_since,
                required,
            } => write!(f, "{days_since} days since last publish (>= {required})"),
            Eligibility::TooSoon {
                days_since,
                required,
            } => write!(f, "only {days_since} days since last publish (< {required})"),
        }
    }
}

fn required_days(frequency: Frequency) -> Option<i64> {
    match frequency {
        Frequency::Weekly => None,
        Frequency::Biweekly => Some(BIWEEKLY_MIN_DAYS),
        Frequency::Monthly => Some(MONTHLY_MIN_DAYS),
    }
}

pub fn evaluate_eligibility(
    entity: &Entity,
    ledger: &PublicationLedger,
    today: NaiveDate,
) -> Eligibility {
    let Some(required) = required_days(entity.frequency()) else {
        return Eligibility::WeeklyCadence;
    };
    let Some(last) = ledger.last(&entity.slug) else {
        return Eligibility::NoHistory;
    };
    let days_since = (today - last).num_days();
    if days_since >= required {
        Eligibility::IntervalElapsed {
            days_since,
            required,
        }
    } else {
        Eligibility::TooSoon {
            days_since,
            required,
        }
    }
}

/// Entities that may be promoted on `today`, in input order.
pub fn filter_eligible<'a>(
    entities: &'a [Entity],
    ledger: &PublicationLedger,
    today: NaiveDate,
) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|e| evaluate_eligibility(e, ledger, today).is_eligible())
        .collect()
}
