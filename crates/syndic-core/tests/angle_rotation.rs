use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use syndic_core::angles::{ARTICLE_ANGLES, SHORT_POST_ANGLES};
use syndic_core::testing::ScriptedGenerator;
use syndic_core::{select_angle, AngleScope, FixedClock, Pipeline, PipelineConfig, RunRequest};
use syndic_state::fakes::MemoryContentStore;
use syndic_state::{Entity, Platform, PostedLog, PostedRecord, PublicationLedger, Schedule};

#[test]
fn consecutive_counts_pick_consecutive_angles() {
    assert_eq!(select_angle(ARTICLE_ANGLES, 0).unwrap().id, ARTICLE_ANGLES[0].id);
    assert_eq!(select_angle(ARTICLE_ANGLES, 1).unwrap().id, ARTICLE_ANGLES[1].id);
}

#[test]
fn no_angle_repeats_back_to_back() {
    for list in [ARTICLE_ANGLES, SHORT_POST_ANGLES] {
        for count in 0..20 {
            let a = select_angle(list, count).unwrap();
            let b = select_angle(list, count + 1).unwrap();
            assert_ne!(a.id, b.id, "count {count}");
        }
    }
}

#[test]
fn rotation_wraps_around() {
    let len = SHORT_POST_ANGLES.len();
    assert_eq!(
        select_angle(SHORT_POST_ANGLES, len).unwrap().id,
        SHORT_POST_ANGLES[0].id
    );
}

fn posted(slug: &str, cref: &str) -> PostedRecord {
    PostedRecord {
        content_reference: cref.into(),
        external_post_id: "1".into(),
        url: String::new(),
        posted_at: NaiveDate::from_ymd_opt(2026, 10, 1),
        entity_slug: slug.into(),
        destination: None,
        title: None,
        angle: None,
    }
}

async fn planned_angle(scope: AngleScope) -> Option<String> {
    let entity = Entity {
        slug: "alpha".into(),
        auto_promote: true,
        schedule: Schedule {
            platforms: Some(vec![Platform::Mastodon]),
            ..Schedule::default()
        },
        ..Entity::default()
    };
    let store = Arc::new(MemoryContentStore::with_entities(vec![entity]).unwrap());
    let mut log = PostedLog::new();
    log.push(posted("alpha", "2026-10-01-alpha"));
    log.push(posted("other", "2026-10-01-other"));
    store.set_posted(Platform::Mastodon, log);
    let mut ledger = PublicationLedger::new();
    for day in [1, 4, 8] {
        ledger.append("alpha", NaiveDate::from_ymd_opt(2026, 9, day).unwrap());
    }
    store.set_ledger(ledger);

    let pipeline = Pipeline::new(
        store,
        Arc::new(ScriptedGenerator::new()),
        HashMap::new(),
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())),
        PipelineConfig {
            angle_scope: scope,
            ..PipelineConfig::default()
        },
    );
    let plan = pipeline.plan(RunRequest::default()).await.unwrap();
    plan.platforms[0].angle.clone()
}

#[tokio::test]
async fn per_platform_scope_counts_this_platforms_posts() {
    assert_eq!(
        planned_angle(AngleScope::PerPlatform).await.as_deref(),
        Some(SHORT_POST_ANGLES[1].id)
    );
}

#[tokio::test]
async fn global_scope_counts_publication_history() {
    assert_eq!(
        planned_angle(AngleScope::Global).await.as_deref(),
        Some(SHORT_POST_ANGLES[3].id)
    );
}
