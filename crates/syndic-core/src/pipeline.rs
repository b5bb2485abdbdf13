//! One promotion cycle.
//!
//! Load the catalog and ledger, pick one entity, then fan out over its
//! platforms. Each platform branch runs gate → angle → generate/validate
//! (with one corrective regeneration) → re-check → publish → record, and
//! fails on its own: a broken branch never stops the others. The shared
//! publication history is appended once, after every branch has finished,
//! and only when at least one platform published.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use syndic_state::{
    Artifact, ContentStore, Entity, Platform, PostedLog, PostedRecord, PublicationLedger,
    StorageError, UsageEntry,
};
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::angles::{select_angle, Angle, AngleScope};
use crate::clock::{week_number, Clock};
use crate::config::PipelineConfig;
use crate::domain::{Result, SyndicError};
use crate::eligibility::{evaluate_eligibility, filter_eligible, Eligibility};
use crate::exit_codes;
use crate::generator::parse::draft_from_text;
use crate::generator::{GenerationError, GenerationRequest, TextGenerator};
use crate::obs;
use crate::platforms::{content_reference, profile_for, select_subreddit, tags_for, PlatformProfile};
use crate::prompt::{build_request, PromptInput};
use crate::publisher::gate::{evaluate_gate, GateCandidate, GateRuleSet, GateVerdict};
use crate::publisher::{build_envelope, PublisherMap};
use crate::retry::{
    generate_validated, Correction, DraftSource, GeneratedDraft, RetryOutcome, RetryPolicy,
    Transition,
};
use crate::selection::select_entity;
use crate::validator::{validate, ValidationContext};

// ---------------------------------------------------------------------------
// Requests and reports
// ---------------------------------------------------------------------------

/// Operator overrides for a run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Promote this entity, bypassing the promotable flag, eligibility and
    /// selection.
    pub entity: Option<String>,
    /// Restrict (or extend) the platform set. Platforms the entity does not
    /// enable are still skipped by the gate.
    pub platforms: Option<Vec<Platform>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Storage,
    Generation,
    Validation,
    Publish,
    /// Published, but the posted log could not be written.
    Record,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Storage => "storage",
            FailureStage::Generation => "generation",
            FailureStage::Validation => "validation",
            FailureStage::Publish => "publish",
            FailureStage::Record => "record",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    Published {
        external_id: String,
        url: String,
    },
    /// Validated, not published because the run is a dry run.
    DryRun { title: String },
    /// Skipped by policy: schedule, interval, credentials, already posted.
    Skipped { reason: String },
    Failed {
        stage: FailureStage,
        kind: String,
        reason: String,
    },
}

impl PlatformOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PlatformOutcome::Published { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PlatformOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformReport {
    pub platform: Platform,
    pub content_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Generation calls made (0 when skipped before generation).
    pub attempts: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    pub outcome: PlatformOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedEntity {
    pub slug: String,
    /// Chosen by operator override rather than selection.
    pub forced: bool,
    pub publication_count: usize,
    /// Entities tied at the minimum count.
    pub candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub date: NaiveDate,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<SelectedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nothing_to_do: Option<String>,
    pub platforms: Vec<PlatformReport>,
    pub ledger_appended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
    pub duration_ms: u64,
}

impl RunReport {
    fn new(run_id: String, date: NaiveDate, dry_run: bool) -> Self {
        Self {
            run_id,
            date,
            dry_run,
            entity: None,
            nothing_to_do: None,
            platforms: Vec::new(),
            ledger_appended: false,
            ledger_error: None,
            duration_ms: 0,
        }
    }

    pub fn published_count(&self) -> usize {
        self.platforms
            .iter()
            .filter(|p| p.outcome.is_published())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.platforms.iter().filter(|p| p.outcome.is_failure()).count()
    }

    /// Zero when every platform published or was cleanly skipped.
    pub fn exit_code(&self) -> i32 {
        if self.failed_count() > 0 || self.ledger_error.is_some() {
            exit_codes::PLATFORM_FAILURES
        } else {
            exit_codes::SUCCESS
        }
    }
}

/// Side-effect-free preview of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub date: NaiveDate,
    pub week: i64,
    pub entities: Vec<EntityPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nothing_to_do: Option<String>,
    pub platforms: Vec<PlatformPlan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityPlan {
    pub slug: String,
    pub auto_promote: bool,
    pub publication_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_published: Option<NaiveDate>,
    pub eligibility: Eligibility,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformPlan {
    pub platform: Platform,
    pub content_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub gate: GateVerdict,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn TextGenerator>,
    publishers: PublisherMap,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

enum Resolution {
    Selected {
        entity: Entity,
        selected: SelectedEntity,
    },
    NothingToDo(String),
}

/// Per-platform facts gathered before any generation call.
struct Prepared {
    profile: PlatformProfile,
    posted: PostedLog,
    content_reference: String,
    destination: Option<&'static str>,
    angle: Option<&'static Angle>,
    angle_count: usize,
    verdict: GateVerdict,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ContentStore>,
        generator: Arc<dyn TextGenerator>,
        publishers: PublisherMap,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            generator,
            publishers,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one cycle.
    ///
    /// Returns `Err` only for faults outside any single platform (catalog or
    /// ledger unreadable, unknown override entity). Platform failures are
    /// reported in the [`RunReport`].
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        self.run_inner(run_id, request).instrument(span).await
    }

    async fn run_inner(&self, run_id: String, request: RunRequest) -> Result<RunReport> {
        let started = Instant::now();
        let today = self.clock.today();
        obs::emit_run_started(&run_id, self.config.dry_run);
        let mut report = RunReport::new(run_id, today, self.config.dry_run);

        let ledger = self.store.load_ledger().await?;
        let entity = match self.resolve_entity(&request, &ledger, today).await? {
            Resolution::Selected { entity, selected } => {
                report.entity = Some(selected);
                entity
            }
            Resolution::NothingToDo(reason) => {
                obs::emit_nothing_to_do(&reason);
                report.nothing_to_do = Some(reason);
                return Ok(self.finish(report, started));
            }
        };

        let targets = target_platforms(&entity, request.platforms.as_deref());
        let concurrency = self.config.concurrency.max(1);
        let mut branches: Vec<(usize, PlatformReport)> = stream::iter(targets.into_iter().enumerate())
            .map(|(idx, platform)| {
                let entity = &entity;
                let ledger = &ledger;
                async move { (idx, self.run_platform(entity, platform, ledger, today).await) }
                    .instrument(obs::platform_span(platform))
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        branches.sort_by_key(|(idx, _)| *idx);
        report.platforms = branches.into_iter().map(|(_, r)| r).collect();

        if !self.config.dry_run && report.published_count() > 0 {
            match self.store.append_publication(&entity.slug, today).await {
                Ok(()) => {
                    report.ledger_appended = true;
                    obs::emit_ledger_appended(&entity.slug, &today.to_string());
                }
                Err(e) => {
                    warn!(slug = %entity.slug, error = %e, "failed to append publication history");
                    report.ledger_error = Some(e.to_string());
                }
            }
        }

        Ok(self.finish(report, started))
    }

    fn finish(&self, mut report: RunReport, started: Instant) -> RunReport {
        report.duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_run_finished(
            &report.run_id,
            report.duration_ms,
            report.published_count(),
            report.failed_count(),
        );
        report
    }

    /// Preview the cycle: eligibility per entity, the selected entity, and
    /// the angle and gate verdict per platform. Writes nothing and never
    /// calls the generator or a publisher.
    pub async fn plan(&self, request: RunRequest) -> Result<PlanReport> {
        let today = self.clock.today();
        let ledger = self.store.load_ledger().await?;
        let entities = self
            .store
            .load_entities()
            .await?
            .into_iter()
            .map(|e| EntityPlan {
                eligibility: evaluate_eligibility(&e, &ledger, today),
                publication_count: ledger.count(&e.slug),
                last_published: ledger.last(&e.slug),
                auto_promote: e.auto_promote,
                slug: e.slug,
            })
            .collect();

        let mut plan = PlanReport {
            date: today,
            week: week_number(today),
            entities,
            selected: None,
            nothing_to_do: None,
            platforms: Vec::new(),
        };

        let entity = match self.resolve_entity(&request, &ledger, today).await? {
            Resolution::Selected { entity, selected } => {
                plan.selected = Some(selected);
                entity
            }
            Resolution::NothingToDo(reason) => {
                plan.nothing_to_do = Some(reason);
                return Ok(plan);
            }
        };

        for platform in target_platforms(&entity, request.platforms.as_deref()) {
            let prepared = self.prepare(&entity, platform, &ledger, today).await?;
            plan.platforms.push(PlatformPlan {
                platform,
                angle: prepared.angle.map(|a| a.id.to_string()),
                destination: prepared.destination.map(str::to_string),
                content_reference: prepared.content_reference,
                gate: prepared.verdict,
            });
        }
        Ok(plan)
    }

    async fn resolve_entity(
        &self,
        request: &RunRequest,
        ledger: &PublicationLedger,
        today: NaiveDate,
    ) -> Result<Resolution> {
        if let Some(slug) = &request.entity {
            let entity = self.store.load_entity(slug).await.map_err(|e| match e {
                StorageError::EntityNotFound { slug } => SyndicError::UnknownEntity(slug),
                other => SyndicError::Storage(other),
            })?;
            let count = ledger.count(&entity.slug);
            obs::emit_entity_selected(&entity.slug, count, 1, true);
            return Ok(Resolution::Selected {
                selected: SelectedEntity {
                    slug: entity.slug.clone(),
                    forced: true,
                    publication_count: count,
                    candidates: 1,
                },
                entity,
            });
        }

        let promotable: Vec<Entity> = self
            .store
            .load_entities()
            .await?
            .into_iter()
            .filter(|e| e.auto_promote)
            .collect();
        if promotable.is_empty() {
            return Ok(Resolution::NothingToDo(
                "no entity has autoPromote enabled".to_string(),
            ));
        }

        let eligible = filter_eligible(&promotable, ledger, today);
        let Some(chosen) = select_entity(&eligible, ledger, week_number(today)) else {
            return Ok(Resolution::NothingToDo(format!(
                "none of {} promotable entities is eligible on {today}",
                promotable.len()
            )));
        };
        let count = ledger.count(&chosen.slug);
        let candidates = eligible
            .iter()
            .filter(|e| ledger.count(&e.slug) == count)
            .count();
        obs::emit_entity_selected(&chosen.slug, count, candidates, false);
        Ok(Resolution::Selected {
            selected: SelectedEntity {
                slug: chosen.slug.clone(),
                forced: false,
                publication_count: count,
                candidates,
            },
            entity: chosen.clone(),
        })
    }

    async fn prepare(
        &self,
        entity: &Entity,
        platform: Platform,
        ledger: &PublicationLedger,
        today: NaiveDate,
    ) -> std::result::Result<Prepared, StorageError> {
        let profile = profile_for(platform);
        let posted = self.store.load_posted(platform).await?;
        let content_reference = content_reference(&entity.slug, today);
        let platform_count = posted.count_for(&entity.slug);
        let destination =
            (platform == Platform::Reddit).then(|| select_subreddit(entity.category, platform_count));
        let angle_count = match self.config.angle_scope {
            AngleScope::PerPlatform => platform_count,
            AngleScope::Global => ledger.count(&entity.slug),
        };
        let angle = select_angle(profile.angles, angle_count);
        let candidate = GateCandidate::gather(
            entity,
            &profile,
            &posted,
            &content_reference,
            destination,
            self.publishers.contains_key(&platform),
            today,
        );
        let verdict = evaluate_gate(&GateRuleSet::standard(), &candidate);
        Ok(Prepared {
            profile,
            posted,
            content_reference,
            destination,
            angle,
            angle_count,
            verdict,
        })
    }

    async fn run_platform(
        &self,
        entity: &Entity,
        platform: Platform,
        ledger: &PublicationLedger,
        today: NaiveDate,
    ) -> PlatformReport {
        let prepared = match self.prepare(entity, platform, ledger, today).await {
            Ok(p) => p,
            Err(e) => {
                return PlatformReport {
                    platform,
                    content_reference: content_reference(&entity.slug, today),
                    angle: None,
                    destination: None,
                    attempts: 0,
                    transitions: Vec::new(),
                    outcome: failed(platform, FailureStage::Storage, "storage", &e),
                }
            }
        };

        let mut report = PlatformReport {
            platform,
            content_reference: prepared.content_reference.clone(),
            angle: prepared.angle.map(|a| a.id.to_string()),
            destination: prepared.destination.map(str::to_string),
            attempts: 0,
            transitions: Vec::new(),
            outcome: PlatformOutcome::Skipped {
                reason: String::new(),
            },
        };

        if let Some(violation) = prepared.verdict.skip_reason() {
            obs::emit_platform_skipped(platform, violation);
            report.outcome = PlatformOutcome::Skipped {
                reason: violation.reason.clone(),
            };
            return report;
        }
        if let Some(angle) = prepared.angle {
            obs::emit_angle_selected(platform, angle.id, prepared.angle_count);
        }

        report.outcome = self.execute(entity, &prepared, today, &mut report).await;
        report
    }

    async fn execute(
        &self,
        entity: &Entity,
        prepared: &Prepared,
        today: NaiveDate,
        report: &mut PlatformReport,
    ) -> PlatformOutcome {
        let platform = prepared.profile.platform;
        let previous_titles = used_titles(&prepared.posted, prepared.destination);
        let request = build_request(&PromptInput {
            entity,
            profile: &prepared.profile,
            angle: prepared.angle,
            destination: prepared.destination,
            previous_titles: &previous_titles,
            today,
            site_url: self.config.site_url.as_deref(),
        });
        let source = PlatformDraftSource {
            generator: self.generator.as_ref(),
            store: self.store.as_ref(),
            profile: &prepared.profile,
            request,
            tags: tags_for(platform, entity),
            destination: prepared.destination.map(str::to_string),
            angle: prepared.angle.map(|a| a.id.to_string()),
            today,
        };
        let ctx = ValidationContext::new(platform, self.clock.current_year())
            .with_previous_titles(previous_titles)
            .with_stack_terms(entity.tech_stack.clone());
        let policy = RetryPolicy {
            max_regenerations: self.config.max_regenerations,
        };

        let outcome = match generate_validated(platform, &source, |d| validate(d, &ctx), policy).await
        {
            Ok(outcome) => outcome,
            Err(SyndicError::Generation(e)) => {
                return failed(platform, FailureStage::Generation, e.kind(), &e)
            }
            Err(e) => return failed(platform, FailureStage::Generation, "internal", &e),
        };
        report.attempts = outcome.attempts.len();
        report.transitions = outcome.transitions.clone();

        if !self.config.dry_run {
            self.archive(prepared, &outcome).await;
        }

        let Some(draft) = outcome.accepted() else {
            let errors = outcome
                .last()
                .map(|a| a.validation.errors.join("; "))
                .unwrap_or_default();
            return failed(
                platform,
                FailureStage::Validation,
                "validation",
                &format!(
                    "discarded after {} attempt(s): {errors}",
                    outcome.attempts.len()
                ),
            );
        };

        if self.config.dry_run {
            return PlatformOutcome::DryRun {
                title: draft.title.clone(),
            };
        }

        match self.recheck(entity, prepared, today).await {
            Ok(verdict) => {
                if let Some(violation) = verdict.skip_reason() {
                    obs::emit_platform_skipped(platform, violation);
                    return PlatformOutcome::Skipped {
                        reason: violation.reason.clone(),
                    };
                }
            }
            Err(e) => return failed(platform, FailureStage::Storage, "storage", &e),
        }

        let Some(publisher) = self.publishers.get(&platform) else {
            return PlatformOutcome::Skipped {
                reason: format!("{platform} credentials are not configured"),
            };
        };
        let envelope = build_envelope(draft, entity, self.config.site_url.as_deref(), today);
        let receipt = match publisher.publish(&envelope).await {
            Ok(receipt) => receipt,
            Err(e) => return failed(platform, FailureStage::Publish, e.kind(), &e),
        };
        obs::emit_platform_published(platform, &receipt.external_id, &receipt.url);

        let record = PostedRecord {
            content_reference: prepared.content_reference.clone(),
            external_post_id: receipt.external_id.clone(),
            url: receipt.url.clone(),
            posted_at: Some(today),
            entity_slug: entity.slug.clone(),
            destination: prepared.destination.map(str::to_string),
            title: Some(draft.title.clone()).filter(|t| !t.is_empty()),
            angle: prepared.angle.map(|a| a.id.to_string()),
        };
        if let Err(e) = self.store.append_posted(platform, record).await {
            return failed(
                platform,
                FailureStage::Record,
                "storage",
                &format!("published at {} but not recorded: {e}", receipt.url),
            );
        }

        PlatformOutcome::Published {
            external_id: receipt.external_id,
            url: receipt.url,
        }
    }

    /// Re-read the entity and posted log and re-run the schedule, duplicate
    /// and interval rules right before publishing.
    async fn recheck(
        &self,
        entity: &Entity,
        prepared: &Prepared,
        today: NaiveDate,
    ) -> std::result::Result<GateVerdict, StorageError> {
        let fresh = self.store.load_entity(&entity.slug).await?;
        let posted = self.store.load_posted(prepared.profile.platform).await?;
        let candidate = GateCandidate::gather(
            &fresh,
            &prepared.profile,
            &posted,
            &prepared.content_reference,
            prepared.destination,
            true,
            today,
        );
        Ok(evaluate_gate(&GateRuleSet::pre_publish(), &candidate))
    }

    /// Save the accepted draft, and rejected attempts where the platform
    /// keeps them. File-drop platforms are their own archive.
    async fn archive(&self, prepared: &Prepared, outcome: &RetryOutcome) {
        let platform = prepared.profile.platform;
        for attempt in &outcome.attempts {
            let rejected = !attempt.validation.valid;
            if rejected && !prepared.profile.archive_rejected {
                continue;
            }
            if !rejected && prepared.profile.front_matter.is_some() {
                continue;
            }
            let name = if rejected {
                format!("{}-attempt{}", prepared.content_reference, attempt.attempt)
            } else {
                prepared.content_reference.clone()
            };
            let artifact = Artifact {
                platform,
                name,
                rejected,
                payload: json!({
                    "contentReference": prepared.content_reference,
                    "attempt": attempt.attempt,
                    "angle": prepared.angle.map(|a| a.id),
                    "destination": prepared.destination,
                    "draft": attempt.draft,
                    "validation": attempt.validation,
                }),
            };
            match self.store.save_artifact(&artifact).await {
                Ok(location) => debug!(
                    platform = %platform,
                    location = %location.location,
                    digest = %location.digest.short(),
                    rejected,
                    "archived draft"
                ),
                Err(e) => warn!(platform = %platform, error = %e, "failed to archive draft"),
            }
        }
    }
}

fn failed(
    platform: Platform,
    stage: FailureStage,
    kind: &str,
    reason: &dyn std::fmt::Display,
) -> PlatformOutcome {
    obs::emit_platform_failed(platform, stage.as_str(), reason);
    PlatformOutcome::Failed {
        stage,
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

/// Override list, or the entity's enabled platforms, without duplicates.
fn target_platforms(entity: &Entity, requested: Option<&[Platform]>) -> Vec<Platform> {
    let source = match requested {
        Some(list) => list.to_vec(),
        None => entity.enabled_platforms(),
    };
    let mut out: Vec<Platform> = Vec::with_capacity(source.len());
    for p in source {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Titles already used on this platform, narrowed to the destination when
/// the platform has sub-destinations.
/// Titles already used on a platform, narrowed to one destination when given.
pub fn used_titles(posted: &PostedLog, destination: Option<&str>) -> Vec<String> {
    posted
        .records()
        .iter()
        .filter(|r| destination.map_or(true, |d| r.destination.as_deref() == Some(d)))
        .filter_map(|r| r.title.clone())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Draft source
// ---------------------------------------------------------------------------

/// Calls the generator for one platform branch, records usage, and shapes
/// the raw text into a draft.
struct PlatformDraftSource<'a> {
    generator: &'a dyn TextGenerator,
    store: &'a dyn ContentStore,
    profile: &'a PlatformProfile,
    request: GenerationRequest,
    tags: Vec<String>,
    destination: Option<String>,
    angle: Option<String>,
    today: NaiveDate,
}

#[async_trait]
impl<'a> DraftSource for PlatformDraftSource<'a> {
    async fn draft(
        &self,
        correction: Option<&Correction>,
    ) -> std::result::Result<GeneratedDraft, GenerationError> {
        let request = match correction {
            Some(c) => self.request.with_correction(&c.prior_raw, &c.errors),
            None => self.request.clone(),
        };
        let output = self.generator.generate(&request).await?;

        let platform = self.profile.platform;
        obs::emit_usage_recorded(platform, output.usage.input_tokens, output.usage.output_tokens);
        let entry = UsageEntry {
            date: self.today,
            platform: platform.to_string(),
            purpose: request.purpose.clone(),
            model: output.model.clone(),
            input_tokens: output.usage.input_tokens,
            output_tokens: output.usage.output_tokens,
        };
        if let Err(e) = self.store.append_usage(entry).await {
            warn!(platform = %platform, error = %e, "failed to record generator usage");
        }

        let draft = draft_from_text(self.profile, &output.text)
            .with_tags(self.tags.clone())
            .with_destination(self.destination.clone())
            .with_angle(self.angle.clone());
        Ok(GeneratedDraft {
            raw: output.text,
            draft,
            usage: output.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndic_state::Schedule;

    #[test]
    fn override_platforms_are_deduplicated_in_order() {
        let entity = Entity::default();
        let targets = target_platforms(
            &entity,
            Some(&[Platform::Reddit, Platform::Devto, Platform::Reddit]),
        );
        assert_eq!(targets, vec![Platform::Reddit, Platform::Devto]);
    }

    #[test]
    fn default_targets_follow_schedule() {
        let entity = Entity {
            schedule: Schedule {
                platforms: Some(vec![Platform::Bluesky]),
                ..Schedule::default()
            },
            ..Entity::default()
        };
        assert_eq!(target_platforms(&entity, None), vec![Platform::Bluesky]);
    }

    #[test]
    fn used_titles_respect_destination() {
        let mut log = PostedLog::new();
        for (cref, dest, title) in [
            ("a", Some("webdev"), "Web title"),
            ("b", Some("SaaS"), "SaaS title"),
            ("c", None, ""),
        ] {
            log.push(PostedRecord {
                content_reference: cref.into(),
                external_post_id: String::new(),
                url: String::new(),
                posted_at: None,
                entity_slug: "x".into(),
                destination: dest.map(String::from),
                title: Some(title.into()),
                angle: None,
            });
        }
        assert_eq!(used_titles(&log, Some("webdev")), vec!["Web title"]);
        assert_eq!(used_titles(&log, None), vec!["Web title", "SaaS title"]);
    }

    #[test]
    fn exit_code_reflects_failures() {
        let mut report = RunReport::new("r".into(), NaiveDate::default(), false);
        assert_eq!(report.exit_code(), exit_codes::SUCCESS);
        report.platforms.push(PlatformReport {
            platform: Platform::Devto,
            content_reference: "c".into(),
            angle: None,
            destination: None,
            attempts: 2,
            transitions: Vec::new(),
            outcome: PlatformOutcome::Failed {
                stage: FailureStage::Validation,
                kind: "validation".into(),
                reason: "x".into(),
            },
        });
        assert_eq!(report.exit_code(), exit_codes::PLATFORM_FAILURES);
    }
}
