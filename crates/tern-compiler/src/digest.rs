//! Program fingerprint.

use sha2::{Digest, Sha256};
use tern_codegen::Program;

/// Hex SHA-256 over everything the VM starts from: the bytecode, then the
/// allocated heap prefix (identifier records, string literals).
///
/// The two parts are length-prefixed so that moving a byte from the end of
/// the code to the start of the heap changes the digest.
pub fn program_digest(program: &Program) -> String {
    let mut hasher = Sha256::new();
    for part in [&program.code[..], program.heap.as_bytes()] {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
