//! endpoint-lint: flags HTTP endpoint call objects that are created but never used
//!
//! Methods annotated with a Retrofit HTTP marker (`@GET`, `@POST`, ...) return
//! a call object that does nothing until it is executed or enqueued. This
//! library parses Java sources, resolves each call to its declaration and
//! reports calls to marked methods whose result is discarded.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod output;
pub mod resolve;
pub mod rules;
pub mod syntax;

pub use config::{CliOptions, Config, ConfigError};
pub use diagnostics::{Diagnostic, Location, Severity};
pub use engine::{LintEngine, LintError, LintReport, LintStatistics, SourceFile};
pub use resolve::{Declaration, FileResolver, ProjectIndex, Resolve};
pub use rules::{MarkerSet, Rule, UnusedCallObject};
pub use syntax::{ParseError, SyntaxTree};
