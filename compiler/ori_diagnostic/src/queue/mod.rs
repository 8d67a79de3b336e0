//! Diagnostic queue for collecting, deduplicating, and sorting diagnostics.
//!
//! Features:
//! - Error limits to prevent overwhelming output
//! - Deduplication of identical reports (same code, position and message)
//! - Stable ordering by source position on flush

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use ori_ir::Pos;

use crate::{Diagnostic, ErrorCode};

/// Hash a message for dedup comparison without keeping an owned copy.
#[inline]
fn message_hash(msg: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    msg.hash(&mut hasher);
    hasher.finish()
}

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors before stopping (0 = unlimited).
    pub error_limit: usize,
    /// Drop a diagnostic identical to one already queued.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 10,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Create a config with no limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Queued diagnostic with its sort key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct QueuedDiagnostic {
    diagnostic: Diagnostic,
    pos: Pos,
}

/// Queue for collecting, deduplicating, and sorting diagnostics.
///
/// # Example
///
/// ```text
/// let mut queue = DiagnosticQueue::new();
/// queue.add(diagnostic);
/// // ... add more diagnostics
/// let sorted = queue.flush();
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticQueue {
    /// Collected diagnostics, in report order.
    diagnostics: Vec<QueuedDiagnostic>,
    /// Count of errors (not warnings/notes).
    error_count: usize,
    /// Count of warnings.
    warning_count: usize,
    /// Errors dropped because the limit was reached.
    suppressed: usize,
    /// (code, position, message hash) of everything queued so far.
    seen: HashSet<(ErrorCode, Pos, u64)>,
    /// Configuration.
    config: DiagnosticConfig,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue {
    /// Create a new diagnostic queue with default configuration.
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    /// Create a diagnostic queue with custom configuration.
    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
            suppressed: 0,
            seen: HashSet::new(),
            config,
        }
    }

    /// The configuration this queue was built with.
    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    /// Add a diagnostic to the queue.
    ///
    /// Returns `true` if the diagnostic was added, `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();

        if is_error && self.limit_reached() {
            self.suppressed += 1;
            return false;
        }

        let pos = diag.primary_pos().unwrap_or(Pos::NONE);

        if self.config.deduplicate
            && !self
                .seen
                .insert((diag.code, pos, message_hash(&diag.message)))
        {
            return false;
        }

        if is_error {
            self.error_count += 1;
        } else if diag.severity == crate::Severity::Warning {
            self.warning_count += 1;
        }

        self.diagnostics.push(QueuedDiagnostic {
            diagnostic: diag,
            pos,
        });
        true
    }

    /// Check if the error limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    /// Get the number of errors collected.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Get the number of warnings collected.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Number of errors dropped after the limit was reached.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    /// Whether nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by position and return them.
    ///
    /// The sort is stable: reports at the same position keep their report
    /// order. Unknown positions sort last. Clears the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let already_sorted = self.diagnostics.windows(2).all(|w| w[0].pos <= w[1].pos);

        if !already_sorted {
            self.diagnostics.sort_by_key(|d| d.pos);
        }

        let result: Vec<Diagnostic> = self.diagnostics.drain(..).map(|d| d.diagnostic).collect();

        self.error_count = 0;
        self.warning_count = 0;
        self.suppressed = 0;
        self.seen.clear();

        result
    }

    /// Get diagnostics without clearing the queue, in report order.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().map(|d| &d.diagnostic)
    }
}

/// Create a "too many errors" diagnostic.
#[cold]
pub fn too_many_errors(limit: usize, pos: Pos) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9002)
        .with_message(format!("aborting due to {limit} previous errors"))
        .with_label(pos, "error limit reached here")
        .with_note("raise the error limit to see more")
}
