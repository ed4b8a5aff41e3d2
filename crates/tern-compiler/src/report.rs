//! Serializable outcomes for tooling: one for a compile, one for a run.

use serde::{Deserialize, Serialize};
use tern_codegen::Program;
use tern_types::{CompileError, ErrorCode, Span};

use crate::digest::program_digest;
use crate::error::TernError;

/// Result of compiling one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// Bytecode, present on success.
    pub code: Option<Vec<u8>>,
    /// Disassembly of `code`.
    pub listing: Option<String>,
    pub digest: Option<String>,
    /// At most one error: compilation stops at the first.
    pub errors: Vec<CompileError>,
}

impl CompileResult {
    pub(crate) fn from_outcome(outcome: Result<Program, TernError>) -> Self {
        match outcome {
            Ok(program) => Self {
                success: true,
                listing: Some(program.disassemble()),
                digest: Some(program_digest(&program)),
                code: Some(program.code),
                errors: Vec::new(),
            },
            Err(TernError::Compile(e)) => Self::failed(vec![e]),
            Err(_) => Self::failed(Vec::new()),
        }
    }

    fn failed(errors: Vec<CompileError>) -> Self {
        Self {
            success: false,
            code: None,
            listing: None,
            digest: None,
            errors,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Config,
    Compile,
    Runtime,
}

/// A flattened pipeline error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedError {
    pub stage: Stage,
    pub message: String,
    /// Compile errors only.
    pub code: Option<ErrorCode>,
    /// Statement the error belongs to, when known.
    pub span: Option<Span>,
    /// Faulting instruction, runtime errors only.
    pub pc: Option<usize>,
}

impl ReportedError {
    /// Flatten `err`, locating runtime faults through the program's source map.
    pub fn new(err: &TernError, program: Option<&Program>) -> Self {
        match err {
            TernError::Config(msg) => Self {
                stage: Stage::Config,
                message: msg.clone(),
                code: None,
                span: None,
                pc: None,
            },
            TernError::Compile(e) => Self {
                stage: Stage::Compile,
                message: e.message.clone(),
                code: Some(e.code),
                span: Some(e.span),
                pc: None,
            },
            TernError::Runtime(trap) => Self {
                stage: Stage::Runtime,
                message: trap.error.to_string(),
                code: None,
                span: program.and_then(|p| p.source_map.lookup(trap.pc)),
                pc: Some(trap.pc),
            },
        }
    }
}

/// Everything observable about one run: printed lines up to the end or the
/// first error, the error if any, and the program digest if it compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub success: bool,
    pub output: Vec<String>,
    pub error: Option<ReportedError>,
    pub digest: Option<String>,
}

impl RunReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
