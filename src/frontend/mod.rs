//! Frontend module - Name Resolution, Checking

pub mod checker;
pub mod resolver;

pub use checker::{check, Checker};
pub use resolver::{resolve, Resolver};

use crate::apm::Program;
use crate::diagnostics::Diagnostics;
use crate::utils::Result;

/// Resolve then check a program built by the parser.
///
/// Resolution diagnostics come first, followed by those of the checker. An error is
/// only returned when the resolved tree is internally inconsistent.
pub fn analyze(program: &mut Program) -> Result<Diagnostics> {
    let mut diagnostics = resolve(program);
    log::debug!("resolution finished with {} diagnostic(s)", diagnostics.len());
    diagnostics.extend(check(program)?);
    Ok(diagnostics)
}
