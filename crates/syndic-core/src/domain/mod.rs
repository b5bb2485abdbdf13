//! Domain types shared across the pipeline stages.

pub mod draft;
pub mod error;
pub mod validation;

pub use draft::{ContentDraft, ContentKind};
pub use error::{Result, SyndicError};
pub use validation::{Finding, Severity, ValidationResult};
