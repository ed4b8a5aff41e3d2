//! Tern pipeline: source text to bytecode program to execution.
//!
//! ```text
//! Tern Source → Parser (lexing + single-pass codegen) → Program → VM → console
//! ```
//!
//! The stages live in their own crates; this one validates [`Limits`], ties
//! the stages together and produces the serializable [`CompileResult`] and
//! [`RunReport`].

pub mod digest;
pub mod error;
pub mod report;

pub use digest::program_digest;
pub use error::TernError;
pub use report::{CompileResult, ReportedError, RunReport, Stage};

pub use tern_codegen::Program;
pub use tern_types::Limits;
pub use tern_vm::{BufferConsole, Console, StdConsole};

use tern_types::SourceFile;
use tracing::debug;

/// Compile `source` (named `name` in diagnostics) into a program.
pub fn compile(name: &str, source: &str, limits: &Limits) -> Result<Program, TernError> {
    limits.validate().map_err(TernError::Config)?;
    let sf = SourceFile::new(name, source);
    let program = tern_parser::compile(&sf, limits)?;
    debug!(
        file = name,
        code_len = program.code_len(),
        heap_used = program.heap.used(),
        "compiled"
    );
    Ok(program)
}

/// Compile and package the outcome for tooling.
pub fn compile_to_result(name: &str, source: &str, limits: &Limits) -> CompileResult {
    CompileResult::from_outcome(compile(name, source, limits))
}

/// Run a compiled program to completion.
pub fn execute(program: &Program, limits: &Limits, console: &mut dyn Console) -> Result<(), TernError> {
    limits.validate().map_err(TernError::Config)?;
    tern_vm::run(program, limits, console)?;
    Ok(())
}

/// Compile and run `source` against stdout and stdin.
pub fn run(name: &str, source: &str, limits: &Limits) -> Result<(), TernError> {
    let program = compile(name, source, limits)?;
    execute(&program, limits, &mut StdConsole)
}

/// Compile and run `source` with queued `input` lines, capturing output.
pub fn run_to_report<I, S>(name: &str, source: &str, limits: &Limits, input: I) -> RunReport
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let program = match compile(name, source, limits) {
        Ok(p) => p,
        Err(e) => {
            return RunReport {
                success: false,
                output: Vec::new(),
                error: Some(ReportedError::new(&e, None)),
                digest: None,
            }
        }
    };
    let mut console = BufferConsole::with_input(input);
    let error = execute(&program, limits, &mut console)
        .err()
        .map(|e| ReportedError::new(&e, Some(&program)));
    RunReport {
        success: error.is_none(),
        output: console.output,
        error,
        digest: Some(program_digest(&program)),
    }
}
