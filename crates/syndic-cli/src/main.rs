//! Syndic - unattended multi-platform publication
//!
//! The `syndic` command runs one promotion cycle per invocation and is meant
//! to be driven by a scheduler.
//!
//! ## Commands
//!
//! - `run`: pick an entity, generate, validate and publish per platform
//! - `plan`: preview the next run without generating or writing anything
//! - `status`: publication history and eligibility per entity
//! - `validate`: check a draft file against a platform's rules
//! - `analytics`: fetch post metrics into `meta/analytics.json`
//! - `verify`: report which platforms are configured

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, Level};

use syndic_core::config::DEFAULT_CONCURRENCY;
use syndic_core::exit_codes;
use syndic_core::generator::parse::draft_from_text;
use syndic_core::http;
use syndic_core::pipeline::used_titles;
use syndic_core::publisher::{publishers_from_credentials, FileDropDirs};
use syndic_core::{
    analytics, evaluate_eligibility, verify, AngleScope, AnthropicGenerator, Clock, ContentDraft,
    Pipeline, PipelineConfig, PlatformOutcome, RunReport, RunRequest, SyndicConfig, SyndicError,
    SystemClock, TextGenerator, UnconfiguredGenerator, ValidationContext,
};
use syndic_state::{
    CatalogStore, Entity, FsContentStore, LedgerStore, Platform, PostedLog, PostedLogStore,
    UsageStore,
};

#[derive(Parser)]
#[command(name = "syndic")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate, validate and publish project write-ups across platforms", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// Content directory holding the catalog, ledgers and meta files
    #[arg(long, global = true, env = "SYNDIC_CONTENT_DIR", default_value = "content")]
    content_dir: PathBuf,

    /// Zenn repository articles directory
    #[arg(long, global = true, env = "SYNDIC_ARTICLES_DIR", default_value = "articles")]
    articles_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AngleScopeArg {
    /// Count this entity's posts on the same platform
    PerPlatform,
    /// Count this entity's entries in the publication history
    Global,
}

impl From<AngleScopeArg> for AngleScope {
    fn from(arg: AngleScopeArg) -> Self {
        match arg {
            AngleScopeArg::PerPlatform => AngleScope::PerPlatform,
            AngleScopeArg::Global => AngleScope::Global,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one promotion cycle
    Run {
        /// Promote this entity regardless of selection
        #[arg(long, env = "TARGET_SLUG")]
        entity: Option<String>,

        /// Comma-separated platforms to target instead of the entity's schedule
        #[arg(long, env = "TARGET_PLATFORMS", value_delimiter = ',')]
        platforms: Vec<Platform>,

        /// Generate and validate, but publish and record nothing
        #[arg(long)]
        dry_run: bool,

        /// What the angle rotation counts
        #[arg(long, value_enum, default_value = "per-platform")]
        angle_scope: AngleScopeArg,

        /// Platforms processed at the same time
        #[arg(long, env = "SYNDIC_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Preview the next run
    Plan {
        #[arg(long, env = "TARGET_SLUG")]
        entity: Option<String>,

        #[arg(long, env = "TARGET_PLATFORMS", value_delimiter = ',')]
        platforms: Vec<Platform>,

        #[arg(long, value_enum, default_value = "per-platform")]
        angle_scope: AngleScopeArg,
    },

    /// Show publication history and eligibility per entity
    Status,

    /// Validate a draft file (JSON draft or raw generator output)
    Validate {
        /// Path to the draft
        path: PathBuf,

        /// Platform whose rules apply
        #[arg(short, long)]
        platform: Platform,

        /// Entity the draft is about; enables its stack-term checks
        #[arg(short, long)]
        entity: Option<String>,
    },

    /// Fetch post metrics from the platforms that expose them
    Analytics,

    /// Report which platforms have the credentials they need
    Verify,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    syndic_core::init_tracing(cli.json, level);

    match dispatch(&cli).await {
        Ok(code) => exit(code),
        Err(err) => {
            error!(error = %format!("{err:#}"), "syndic failed");
            eprintln!("error: {err:#}");
            exit(exit_code_for(&err))
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Configuration problems anywhere in the cause chain map to the config code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let config = err.chain().any(|cause| {
        cause
            .downcast_ref::<SyndicError>()
            .is_some_and(SyndicError::is_config)
    });
    if config {
        exit_codes::CONFIG_ERROR
    } else {
        exit_codes::INTERNAL_ERROR
    }
}

async fn dispatch(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Run {
            entity,
            platforms,
            dry_run,
            angle_scope,
            concurrency,
        } => {
            let config = PipelineConfig {
                angle_scope: (*angle_scope).into(),
                concurrency: *concurrency,
                dry_run: *dry_run,
                ..PipelineConfig::default()
            };
            cmd_run(cli, run_request(entity, platforms), config).await
        }
        Commands::Plan {
            entity,
            platforms,
            angle_scope,
        } => {
            let config = PipelineConfig {
                angle_scope: (*angle_scope).into(),
                ..PipelineConfig::default()
            };
            cmd_plan(cli, run_request(entity, platforms), config).await
        }
        Commands::Status => cmd_status(cli).await,
        Commands::Validate {
            path,
            platform,
            entity,
        } => cmd_validate(cli, path, *platform, entity.as_deref()).await,
        Commands::Analytics => cmd_analytics(cli).await,
        Commands::Verify => cmd_verify(cli),
    }
}

fn run_request(entity: &Option<String>, platforms: &[Platform]) -> RunRequest {
    RunRequest {
        entity: entity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        platforms: (!platforms.is_empty()).then(|| platforms.to_vec()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_pipeline(
    cli: &Cli,
    config: &SyndicConfig,
    client: &reqwest::Client,
    generator: Arc<dyn TextGenerator>,
    mut pipeline_config: PipelineConfig,
) -> Pipeline {
    let dirs = FileDropDirs::new(&cli.articles_dir, &cli.content_dir);
    let publishers = publishers_from_credentials(
        client,
        &config.credentials,
        &dirs,
        config.site_url.as_deref(),
    );
    pipeline_config.site_url = config.site_url.clone();
    Pipeline::new(
        Arc::new(FsContentStore::new(&cli.content_dir)),
        generator,
        publishers,
        Arc::new(SystemClock),
        pipeline_config,
    )
}

// ---------------------------------------------------------------------------
// run / plan
// ---------------------------------------------------------------------------

async fn cmd_run(cli: &Cli, request: RunRequest, pipeline_config: PipelineConfig) -> Result<i32> {
    let config = SyndicConfig::from_env();
    let api_key = config
        .anthropic_api_key
        .clone()
        .ok_or_else(|| SyndicError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;
    let client = http::build_client().context("Failed to build HTTP client")?;
    let generator = Arc::new(AnthropicGenerator::new(
        client.clone(),
        api_key,
        config.model.clone(),
    ));

    let pipeline = build_pipeline(cli, &config, &client, generator, pipeline_config);
    let report = pipeline.run(request).await?;

    if cli.json {
        print_json(&report)?;
    } else {
        print_run(&report);
    }
    Ok(report.exit_code())
}

fn describe(outcome: &PlatformOutcome) -> String {
    match outcome {
        PlatformOutcome::Published { url, .. } => format!("published {url}"),
        PlatformOutcome::DryRun { title } if title.is_empty() => "validated (dry run)".to_string(),
        PlatformOutcome::DryRun { title } => format!("validated (dry run): {title}"),
        PlatformOutcome::Skipped { reason } => format!("skipped: {reason}"),
        PlatformOutcome::Failed { stage, reason, .. } => {
            format!("failed at {}: {reason}", stage.as_str())
        }
    }
}

fn print_run(report: &RunReport) {
    if let Some(reason) = &report.nothing_to_do {
        println!("Nothing to do: {reason}");
        return;
    }
    if let Some(entity) = &report.entity {
        println!(
            "{} {} ({} prior publications{})",
            if report.dry_run { "Dry run for" } else { "Promoting" },
            entity.slug,
            entity.publication_count,
            if entity.forced { ", forced" } else { "" }
        );
    }
    for p in &report.platforms {
        let attempts = match p.attempts {
            0 => String::new(),
            n => format!(" [{n} attempt(s)]"),
        };
        println!("  {:<16} {}{}", p.platform.as_str(), describe(&p.outcome), attempts);
    }
    if let Some(err) = &report.ledger_error {
        println!("Publication history NOT updated: {err}");
    }
    println!(
        "Published: {}  Failed: {}  ({} ms)",
        report.published_count(),
        report.failed_count(),
        report.duration_ms
    );
}

async fn cmd_plan(cli: &Cli, request: RunRequest, pipeline_config: PipelineConfig) -> Result<i32> {
    let config = SyndicConfig::from_env();
    let client = http::build_client().context("Failed to build HTTP client")?;
    let pipeline = build_pipeline(
        cli,
        &config,
        &client,
        Arc::new(UnconfiguredGenerator),
        pipeline_config,
    );
    let plan = pipeline.plan(request).await?;

    if cli.json {
        print_json(&plan)?;
        return Ok(exit_codes::SUCCESS);
    }

    println!("Plan for {} (week {})", plan.date, plan.week);
    for e in &plan.entities {
        println!(
            "  {:<24} {:>3} published  {}{}",
            e.slug,
            e.publication_count,
            e.eligibility,
            if e.auto_promote { "" } else { "  (not promotable)" }
        );
    }
    match (&plan.selected, &plan.nothing_to_do) {
        (Some(selected), _) => println!(
            "Selected: {} (tied with {} candidate(s))",
            selected.slug, selected.candidates
        ),
        (None, Some(reason)) => println!("Nothing to do: {reason}"),
        (None, None) => {}
    }
    for p in &plan.platforms {
        let verdict = match p.gate.skip_reason() {
            Some(v) => format!("skip: {v}"),
            None => "ready".to_string(),
        };
        let detail = [p.angle.as_deref(), p.destination.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<16} {verdict}  {detail}", p.platform.as_str());
    }
    Ok(exit_codes::SUCCESS)
}

// ---------------------------------------------------------------------------
// status / validate
// ---------------------------------------------------------------------------

async fn cmd_status(cli: &Cli) -> Result<i32> {
    let store = FsContentStore::new(&cli.content_dir);
    let entities = store
        .load_entities()
        .await
        .context("Failed to load the catalog")?;
    let ledger = store
        .load_ledger()
        .await
        .context("Failed to load publication history")?;
    let usage = store.load_usage().await.context("Failed to load usage log")?;
    let today = SystemClock.today();

    let mut posted_counts = Vec::new();
    for platform in Platform::ALL {
        let log = store
            .load_posted(platform)
            .await
            .with_context(|| format!("Failed to load the {platform} posted log"))?;
        posted_counts.push((platform, log.len()));
    }

    let rows: Vec<_> = entities
        .iter()
        .map(|e| {
            json!({
                "slug": e.slug,
                "autoPromote": e.auto_promote,
                "frequency": String::from(e.frequency()),
                "publications": ledger.count(&e.slug),
                "lastPublished": ledger.last(&e.slug),
                "eligibility": evaluate_eligibility(e, &ledger, today),
                "platforms": e.enabled_platforms(),
            })
        })
        .collect();
    let (input_tokens, output_tokens) = usage.totals();

    if cli.json {
        print_json(&json!({
            "date": today,
            "entities": rows,
            "posted": posted_counts
                .iter()
                .map(|(p, n)| (p.as_str().to_string(), json!(n)))
                .collect::<serde_json::Map<_, _>>(),
            "usage": {
                "calls": usage.entries.len(),
                "inputTokens": input_tokens,
                "outputTokens": output_tokens,
            },
        }))?;
        return Ok(exit_codes::SUCCESS);
    }

    println!(
        "{} entities, {} promotable",
        entities.len(),
        entities.iter().filter(|e| e.auto_promote).count()
    );
    for e in &entities {
        let last = ledger
            .last(&e.slug)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {:<24} {:>3} published  last {:<10}  {}",
            e.slug,
            ledger.count(&e.slug),
            last,
            evaluate_eligibility(e, &ledger, today)
        );
    }
    let posted: Vec<String> = posted_counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(p, n)| format!("{p} {n}"))
        .collect();
    if !posted.is_empty() {
        println!("Posted: {}", posted.join(", "));
    }
    println!(
        "Generation usage: {} call(s), {input_tokens} input / {output_tokens} output tokens",
        usage.entries.len()
    );
    Ok(exit_codes::SUCCESS)
}

/// JSON drafts are taken as-is; anything else is parsed like generator output.
fn read_draft(path: &Path, platform: Platform) -> Result<ContentDraft> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft {:?}", path))?;
    match serde_json::from_str::<ContentDraft>(&text) {
        Ok(mut draft) => {
            draft.platform = platform;
            Ok(draft)
        }
        Err(_) => Ok(draft_from_text(&syndic_core::profile_for(platform), &text)),
    }
}

/// The context `run` would validate this draft with.
fn validation_context(
    platform: Platform,
    current_year: i32,
    posted: &PostedLog,
    draft: &ContentDraft,
    entity: Option<&Entity>,
) -> ValidationContext {
    let ctx = ValidationContext::new(platform, current_year)
        .with_previous_titles(used_titles(posted, draft.destination.as_deref()));
    match entity {
        Some(e) => ctx.with_stack_terms(e.tech_stack.clone()),
        None => ctx,
    }
}

async fn cmd_validate(
    cli: &Cli,
    path: &Path,
    platform: Platform,
    entity: Option<&str>,
) -> Result<i32> {
    let draft = read_draft(path, platform)?;
    let store = FsContentStore::new(&cli.content_dir);
    let posted = store
        .load_posted(platform)
        .await
        .context("Failed to load the posted log")?;
    let entity = match entity {
        Some(slug) => Some(
            store
                .load_entity(slug)
                .await
                .map_err(SyndicError::from)
                .with_context(|| format!("Failed to load entity {slug}"))?,
        ),
        None => None,
    };
    let ctx = validation_context(
        platform,
        SystemClock.current_year(),
        &posted,
        &draft,
        entity.as_ref(),
    );
    let result = syndic_core::validate(&draft, &ctx);
    info!(platform = %platform, valid = result.valid, errors = result.errors.len(), "validated draft");

    if cli.json {
        print_json(&result)?;
    } else {
        println!("{}: {}", platform, if result.valid { "valid" } else { "INVALID" });
        for e in &result.errors {
            println!("  error   {e}");
        }
        for w in &result.warnings {
            println!("  warning {w}");
        }
    }
    Ok(if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::PLATFORM_FAILURES
    })
}

// ---------------------------------------------------------------------------
// analytics / verify
// ---------------------------------------------------------------------------

async fn cmd_analytics(cli: &Cli) -> Result<i32> {
    let config = SyndicConfig::from_env();
    let client = http::build_client().context("Failed to build HTTP client")?;
    let store = FsContentStore::new(&cli.content_dir);
    let reddit_log = store
        .load_posted(Platform::Reddit)
        .await
        .context("Failed to load the Reddit posted log")?;
    let sources = analytics::sources_from_credentials(&client, &config.credentials, &reddit_log);
    let (report, location) = analytics::refresh(&store, &sources, &SystemClock).await?;

    if cli.json {
        print_json(&report)?;
        return Ok(exit_codes::SUCCESS);
    }
    for s in &report.summaries {
        println!(
            "  {:<10} {:>4} posts  {:>7} views  {:>5} likes  {:>5} comments",
            s.platform.as_str(),
            s.total_posts,
            s.total_views,
            s.total_likes,
            s.total_comments
        );
    }
    for f in &report.failures {
        println!("  {:<10} unavailable: {}", f.platform.as_str(), f.error);
    }
    println!("Saved to {}", location.location);
    Ok(exit_codes::SUCCESS)
}

fn cmd_verify(cli: &Cli) -> Result<i32> {
    let config = SyndicConfig::from_env();
    let report = verify::verify(&config, |key| {
        std::env::var(key).is_ok_and(|v| !v.trim().is_empty())
    });

    if cli.json {
        print_json(&report)?;
    } else {
        println!(
            "Generator: {}",
            if report.generator_ready { "configured" } else { "ANTHROPIC_API_KEY missing" }
        );
        for p in &report.platforms {
            let status = if p.ready {
                "ready".to_string()
            } else if p.missing.is_empty() {
                "unavailable".to_string()
            } else {
                format!("missing {}", p.missing.join(", "))
            };
            let note = p.note.map(|n| format!("  ({n})")).unwrap_or_default();
            println!("  {:<16} {status}{note}", p.platform.as_str());
        }
    }
    Ok(if report.is_usable() {
        exit_codes::SUCCESS
    } else {
        exit_codes::CONFIG_ERROR
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_entity_override_is_ignored() {
        let req = run_request(&Some("  ".into()), &[]);
        assert!(req.entity.is_none());
        assert!(req.platforms.is_none());
    }

    #[test]
    fn platforms_parse_from_comma_list() {
        let cli = Cli::try_parse_from(["syndic", "run", "--platforms", "devto,bluesky"]).unwrap();
        match cli.command {
            Commands::Run { platforms, .. } => {
                assert_eq!(platforms, vec![Platform::Devto, Platform::Bluesky]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["syndic", "run", "--platforms", "myspace"]).is_err());
    }

    #[test]
    fn config_errors_map_to_config_exit_code() {
        let err = anyhow::Error::from(SyndicError::Config("missing".into())).context("run failed");
        assert_eq!(exit_code_for(&err), exit_codes::CONFIG_ERROR);
        let err = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code_for(&err), exit_codes::INTERNAL_ERROR);
    }

    #[test]
    fn raw_text_drafts_are_parsed_like_generator_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.md");
        std::fs::write(&path, "TITLE: Edge notes\n\nBody text.").unwrap();
        let draft = read_draft(&path, Platform::Devto).unwrap();
        assert_eq!(draft.title, "Edge notes");
        assert_eq!(draft.body, "Body text.");
    }

    #[test]
    fn validate_entity_flag_is_optional() {
        let cli = Cli::try_parse_from(["syndic", "validate", "d.json", "-p", "mastodon"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate { entity: None, .. }));
        let cli = Cli::try_parse_from([
            "syndic", "validate", "d.json", "-p", "mastodon", "--entity", "alpha",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Validate { entity: Some(ref e), .. } if e == "alpha"
        ));
    }

    #[test]
    fn validation_context_matches_run_rules() {
        let entity = Entity {
            slug: "alpha".into(),
            tech_stack: vec!["Remix".into()],
            ..Entity::default()
        };
        let draft = ContentDraft::new(
            Platform::Mastodon,
            "",
            "Rebuilt the settings page with Remix over the weekend.",
        );
        let posted = PostedLog::new();

        let bare = validation_context(Platform::Mastodon, 2026, &posted, &draft, None);
        assert!(!syndic_core::validate(&draft, &bare).has_rule("stack_terms"));

        let ctx = validation_context(Platform::Mastodon, 2026, &posted, &draft, Some(&entity));
        assert!(syndic_core::validate(&draft, &ctx).has_rule("stack_terms"));
    }
}
