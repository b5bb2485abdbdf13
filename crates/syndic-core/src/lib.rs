//! Syndic Core Library
//!
//! Picks one catalog entity per run and, for each platform it is enabled
//! on, generates a draft, validates it (with one corrective regeneration),
//! publishes it and records the result.
//!
//! Stages, in order:
//!
//! - `eligibility` / `selection`: who is due, and who goes this week
//! - `angles` / `prompt`: what to write, and how to ask for it
//! - `generator` / `validator` / `retry`: draft, check, correct once
//! - `publisher`: gate, envelope, network or file-drop delivery
//! - `pipeline`: the run itself, fanned out per platform

pub mod analytics;
pub mod angles;
pub mod clock;
pub mod config;
pub mod domain;
pub mod eligibility;
pub mod exit_codes;
pub mod generator;
pub mod http;
pub mod obs;
pub mod pipeline;
pub mod platforms;
pub mod prompt;
pub mod publisher;
pub mod retry;
pub mod selection;
pub mod telemetry;
pub mod testing;
pub mod validator;
pub mod verify;

pub use angles::{select_angle, Angle, AngleScope};
pub use clock::{week_number, Clock, FixedClock, SystemClock};
pub use config::{Credentials, PipelineConfig, SyndicConfig};
pub use domain::{ContentDraft, ContentKind, Result, SyndicError, ValidationResult};
pub use eligibility::{evaluate_eligibility, filter_eligible, Eligibility};
pub use generator::{
    AnthropicGenerator, GenerationError, GenerationRequest, TextGenerator, UnconfiguredGenerator,
};
pub use pipeline::{
    FailureStage, Pipeline, PlanReport, PlatformOutcome, PlatformReport, RunReport, RunRequest,
};
pub use platforms::{content_reference, profile_for, PlatformProfile};
pub use publisher::gate::{evaluate_gate, GateRule, GateRuleSet, GateVerdict};
pub use publisher::{build_envelope, Envelope, PublishError, Publisher, PublisherMap};
pub use retry::{generate_validated, DraftState, RetryOutcome, RetryPolicy};
pub use selection::select_entity;
pub use telemetry::init_tracing;
pub use validator::{validate, ValidationContext};

pub use syndic_state::{
    Entity, FsContentStore, Platform, PostedLog, PostedRecord, PublicationLedger,
};
