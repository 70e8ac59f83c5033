pub mod config;
pub mod errors;
pub mod span;

pub use config::{ComparabilityPolicy, Config, ConfigError};
pub use errors::{Diagnostic, DiagnosticBag, Severity};
pub use span::{Position, Span};
