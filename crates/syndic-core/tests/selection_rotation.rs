use chrono::{Duration, NaiveDate};
use syndic_core::{evaluate_eligibility, filter_eligible, select_entity, week_number, Eligibility};
use syndic_state::{Entity, Frequency, PublicationLedger, Schedule};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn entity(slug: &str, frequency: Frequency) -> Entity {
    Entity {
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        auto_promote: true,
        schedule: Schedule {
            frequency,
            platforms: None,
        },
        ..Entity::default()
    }
}

// ── Eligibility ─────────────────────────────────────────────────────────

#[test]
fn weekly_entities_are_always_eligible() {
    let mut ledger = PublicationLedger::new();
    let today = d(2026, 10, 18);
    ledger.append("alpha", today);
    let verdict = evaluate_eligibility(&entity("alpha", Frequency::Weekly), &ledger, today);
    assert_eq!(verdict, Eligibility::WeeklyCadence);
}

#[test]
fn biweekly_threshold_is_thirteen_days() {
    let today = d(2026, 10, 18);
    let e = entity("alpha", Frequency::Biweekly);

    let mut ledger = PublicationLedger::new();
    ledger.append("alpha", today - Duration::days(12));
    assert!(!evaluate_eligibility(&e, &ledger, today).is_eligible());

    let mut ledger = PublicationLedger::new();
    ledger.append("alpha", today - Duration::days(13));
    assert!(evaluate_eligibility(&e, &ledger, today).is_eligible());
}

#[test]
fn monthly_threshold_is_twenty_seven_days() {
    let today = d(2026, 10, 18);
    let e = entity("alpha", Frequency::Monthly);

    let mut ledger = PublicationLedger::new();
    ledger.append("alpha", today - Duration::days(26));
    assert!(!evaluate_eligibility(&e, &ledger, today).is_eligible());

    let mut ledger = PublicationLedger::new();
    ledger.append("alpha", today - Duration::days(27));
    assert!(evaluate_eligibility(&e, &ledger, today).is_eligible());
}

#[test]
fn monthly_with_no_history_is_eligible() {
    let verdict = evaluate_eligibility(
        &entity("alpha", Frequency::Monthly),
        &PublicationLedger::new(),
        d(2026, 10, 18),
    );
    assert_eq!(verdict, Eligibility::NoHistory);
}

#[test]
fn filter_keeps_catalog_order() {
    let today = d(2026, 10, 18);
    let mut ledger = PublicationLedger::new();
    ledger.append("b", today - Duration::days(3));
    let all = vec![
        entity("a", Frequency::Monthly),
        entity("b", Frequency::Monthly),
        entity("c", Frequency::Weekly),
    ];
    let slugs: Vec<&str> = filter_eligible(&all, &ledger, today)
        .into_iter()
        .map(|e| e.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["a", "c"]);
}

// ── Selection ───────────────────────────────────────────────────────────

#[test]
fn least_published_entity_wins() {
    let mut ledger = PublicationLedger::new();
    ledger.append("a", d(2026, 9, 1));
    ledger.append("a", d(2026, 9, 8));
    ledger.append("b", d(2026, 9, 15));
    let a = entity("a", Frequency::Weekly);
    let b = entity("b", Frequency::Weekly);
    for week in 0..4 {
        let chosen = select_entity(&[&a, &b], &ledger, week).unwrap();
        assert_eq!(chosen.slug, "b");
    }
}

#[test]
fn ties_alternate_across_consecutive_weeks() {
    let ledger = PublicationLedger::new();
    let a = entity("a", Frequency::Weekly);
    let b = entity("b", Frequency::Weekly);
    let week = week_number(d(2026, 10, 18));
    let this_week = select_entity(&[&a, &b], &ledger, week).unwrap();
    let next_week = select_entity(&[&a, &b], &ledger, week + 1).unwrap();
    assert_ne!(this_week.slug, next_week.slug);
}

#[test]
fn same_week_gives_same_choice() {
    let ledger = PublicationLedger::new();
    let a = entity("a", Frequency::Weekly);
    let b = entity("b", Frequency::Weekly);
    let c = entity("c", Frequency::Weekly);
    let monday = week_number(d(2026, 10, 19));
    let first = select_entity(&[&a, &b, &c], &ledger, monday).unwrap();
    let again = select_entity(&[&a, &b, &c], &ledger, monday).unwrap();
    assert_eq!(first.slug, again.slug);
}

#[test]
fn single_entity_is_always_chosen() {
    let ledger = PublicationLedger::new();
    let only = entity("solo", Frequency::Weekly);
    for week in [0, 1, 2917, -5] {
        assert_eq!(select_entity(&[&only], &ledger, week).unwrap().slug, "solo");
    }
}

#[test]
fn empty_candidates_select_nothing() {
    assert!(select_entity(&[], &PublicationLedger::new(), 10).is_none());
}
