//! Structured observability hooks for pipeline lifecycle events.
//!
//! This module provides:
//! - Run- and platform-scoped tracing spans
//! - Emission functions for run, selection, per-platform and ledger events
//!
//! Events are emitted at `info!` level, skips and failures at `warn!`.
//! Set `RUST_LOG` to filter and pass `--json` for newline-delimited output.

use syndic_state::Platform;
use tracing::{info, warn};

/// Span for one run. Attach with `Instrument` so every event emitted while
/// the run future is polled carries `run_id`.
///
/// # Example
///
/// ```ignore
/// pipeline.run_inner(request).instrument(run_span("run-12345")).await
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("syndic.run", run_id = %run_id)
}

/// Span for one platform branch. Used with `Instrument` so it follows the
/// future across await points.
pub fn platform_span(platform: Platform) -> tracing::Span {
    tracing::info_span!("syndic.platform", platform = %platform)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, dry_run: bool) {
    info!(event = "run.started", run_id = %run_id, dry_run = dry_run);
}

/// Emit event: run finished with per-outcome tallies.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, published: usize, failed: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        published = published,
        failed = failed,
    );
}

/// Emit event: nothing to promote this cycle.
pub fn emit_nothing_to_do(reason: &str) {
    info!(event = "run.nothing_to_do", reason = %reason);
}

/// Emit event: entity chosen for this cycle.
pub fn emit_entity_selected(slug: &str, publication_count: usize, candidates: usize, forced: bool) {
    info!(
        event = "entity.selected",
        slug = %slug,
        publication_count = publication_count,
        candidates = candidates,
        forced = forced,
    );
}

/// Emit event: angle chosen for a platform.
pub fn emit_angle_selected(platform: Platform, angle_id: &str, count: usize) {
    info!(event = "angle.selected", platform = %platform, angle = %angle_id, count = count);
}

/// Emit event: platform skipped by policy.
pub fn emit_platform_skipped(platform: Platform, reason: &dyn std::fmt::Display) {
    info!(event = "platform.skipped", platform = %platform, reason = %reason);
}

/// Emit event: draft failed validation.
pub fn emit_validation_failed(platform: Platform, attempt: u32, errors: &[String]) {
    warn!(
        event = "validation.failed",
        platform = %platform,
        attempt = attempt,
        error_count = errors.len(),
        errors = ?errors,
    );
}

/// Emit event: regeneration requested with corrective feedback.
pub fn emit_retry_issued(platform: Platform, feedback_items: usize) {
    info!(event = "retry.issued", platform = %platform, feedback_items = feedback_items);
}

/// Emit event: platform branch failed (warning level).
pub fn emit_platform_failed(platform: Platform, stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "platform.failed", platform = %platform, stage = %stage, error = %error);
}

/// Emit event: post accepted by the platform.
pub fn emit_platform_published(platform: Platform, external_id: &str, url: &str) {
    info!(
        event = "platform.published",
        platform = %platform,
        external_id = %external_id,
        url = %url,
    );
}

/// Emit event: publication appended to the shared history.
pub fn emit_ledger_appended(slug: &str, date: &str) {
    info!(event = "ledger.appended", slug = %slug, date = %date);
}

/// Emit event: generator usage recorded.
pub fn emit_usage_recorded(platform: Platform, input_tokens: u64, output_tokens: u64) {
    info!(
        event = "usage.recorded",
        platform = %platform,
        input_tokens = input_tokens,
        output_tokens = output_tokens,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_and_emitters_do_not_panic() {
        let _span = run_span("test-run-id").entered();
        emit_platform_skipped(Platform::Reddit, &"interval not elapsed");
        emit_validation_failed(Platform::Bluesky, 1, &["too long".to_string()]);
    }
}
