//! Entity selection: least-published first, week-bucketed tie-break.
//!
//! The choice is a pure function of the eligible set, the ledger and the week
//! number, so re-running within the same week picks the same entity.

use syndic_state::{Entity, PublicationLedger};

/// Pick exactly one entity, or `None` when nothing is eligible.
///
/// Candidates are the entities sharing the minimum ledger count, kept in the
/// order they were supplied; `candidates[week mod len]` wins.
pub fn select_entity<'a>(
    eligible: &[&'a Entity],
    ledger: &PublicationLedger,
    week_number: i64,
) -> Option<&'a Entity> {
    let min = eligible.iter().map(|e| ledger.count(&e.slug)).min()?;
    let candidates: Vec<&'a Entity> = eligible
        .iter()
        .copied()
        .filter(|e| ledger.count(&e.slug) == min)
        .collect();
    let idx = week_number.rem_euclid(candidates.len() as i64) as usize;
    candidates.get(idx).copied()
}
