//! entc-core
//!
//! Semantic core of the entity language compiler: the program model built by the
//! parser, name resolution, and checking.
//!
//! ```text
//! parser ──> Program (unresolved) ──> resolve ──> check ──> Diagnostics
//! ```

pub mod apm;
pub mod diagnostics;
pub mod frontend;
pub mod types;
pub mod utils;

pub use apm::Program;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use frontend::analyze;
pub use types::Pattern;
pub use utils::{CompilerError, Result, Span};
