//! Fixed capacities of the compiler and VM.
//!
//! Every auxiliary stack and arena in the pipeline is bounded. Exceeding a
//! bound is a reported error, never a silent overflow.

use serde::{Deserialize, Serialize};

/// Capacity configuration shared by the compiler and the VM.
///
/// Unknown fields are rejected and missing fields take their defaults, so a
/// partial JSON document such as `{"heap_size": 8192}` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Bytes in the bump-allocated heap (identifier, string and array records).
    pub heap_size: usize,
    /// Maximum bytes of emitted bytecode.
    pub code_size: usize,
    /// Bytes in the VM operand stack (values are 3 bytes, frame words 2).
    pub stack_size: usize,
    /// Identifier hash buckets; must be a power of two.
    pub ident_buckets: usize,
    /// Pending operators (including marks) in one expression.
    pub pending_ops: usize,
    /// Nested control constructs.
    pub control_depth: usize,
    /// Nested loops.
    pub loop_depth: usize,
    /// Unresolved loop-exit jumps across all open loops.
    pub loop_exits: usize,
    /// Unresolved `if`/`else`/function-skip jumps.
    pub forward_jumps: usize,
    /// Parameters plus locals of one func/proc.
    pub max_slots: usize,
    /// Seed of the generator behind `rnd()`. Equal seeds give equal runs.
    pub seed: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            heap_size: 4096,
            code_size: 4096,
            stack_size: 1536,
            ident_buckets: 32,
            pending_ops: 32,
            control_depth: 32,
            loop_depth: 32,
            loop_exits: 32,
            forward_jumps: 32,
            max_slots: 64,
            seed: 0,
        }
    }
}

impl Limits {
    /// Parse limits from JSON, validating the result.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let limits: Limits = serde_json::from_str(json).map_err(|e| e.to_string())?;
        limits.validate()?;
        Ok(limits)
    }

    /// Check that the limits are usable with 16-bit heap offsets and
    /// one-byte slot numbers.
    pub fn validate(&self) -> Result<(), String> {
        if self.heap_size < 16 || self.heap_size > u16::MAX as usize {
            return Err(format!("heap_size must be in 16..=65535, got {}", self.heap_size));
        }
        if self.code_size == 0 || self.code_size > u16::MAX as usize {
            return Err(format!("code_size must be in 1..=65535, got {}", self.code_size));
        }
        if self.stack_size < 3 || self.stack_size > u16::MAX as usize {
            return Err(format!("stack_size must be in 3..=65535, got {}", self.stack_size));
        }
        if !self.ident_buckets.is_power_of_two() {
            return Err(format!(
                "ident_buckets must be a power of two, got {}",
                self.ident_buckets
            ));
        }
        // 0xff is the "no slot" sentinel.
        if self.max_slots == 0 || self.max_slots > 0xff {
            return Err(format!("max_slots must be in 1..=255, got {}", self.max_slots));
        }
        let stacks = [
            ("pending_ops", self.pending_ops),
            ("control_depth", self.control_depth),
            ("loop_depth", self.loop_depth),
            ("loop_exits", self.loop_exits),
            ("forward_jumps", self.forward_jumps),
        ];
        for (name, depth) in stacks {
            if depth == 0 {
                return Err(format!("{name} must be at least 1"));
            }
        }
        Ok(())
    }
}
