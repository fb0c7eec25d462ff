//! Memory budget estimation and the recurse-or-fallback decision.
//!
//! One level of Strassen expansion keeps 3 full-size matrices (A, B, C)
//! and 15 half-size matrices (8 quadrants + 7 sub-products) alive, or
//! 6.75 n^2 elements in total. Each engine scales that working set by
//! its own overhead factor and compares against currently available
//! memory under a safety threshold. When the check fails the caller
//! falls back to the direct product; the check never fails the run.

use std::sync::Arc;

use parking_lot::Mutex;
use sysinfo::System;
use tracing::warn;

/// Fraction of available memory treated as usable.
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 0.9;

/// Absolute free-memory floor for the distributed per-process check.
pub const DEFAULT_MIN_FREE_BYTES: u64 = 50 * 1024 * 1024;

/// Bytes per matrix element (`i32`).
const ELEMENT_BYTES: f64 = 4.0;

/// Source of the available-memory figure.
///
/// Production code queries the OS; tests inject fixed values to
/// deterministically exercise the fallback paths.
pub trait MemoryProbe: Send + Sync {
    /// Currently available memory in bytes.
    fn available_bytes(&self) -> u64;
}

/// Memory probe backed by the OS via `sysinfo`.
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemProbe {
    fn available_bytes(&self) -> u64 {
        let mut system = self.system.lock();
        system.refresh_memory();
        system.available_memory()
    }
}

/// Memory probe returning a fixed value. Test double.
pub struct FixedProbe {
    bytes: u64,
}

impl FixedProbe {
    #[must_use]
    pub fn new(bytes: u64) -> Self {
        Self { bytes }
    }
}

impl MemoryProbe for FixedProbe {
    fn available_bytes(&self) -> u64 {
        self.bytes
    }
}

/// Memory-gated recursion policy shared by all engines.
#[derive(Clone)]
pub struct MemoryBudget {
    probe: Arc<dyn MemoryProbe>,
    threshold: f64,
    min_free_bytes: u64,
}

impl MemoryBudget {
    /// Create a budget with the default threshold (0.9) and minimum
    /// free-memory floor (50 MB).
    #[must_use]
    pub fn new(probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            probe,
            threshold: DEFAULT_MEMORY_THRESHOLD,
            min_free_bytes: DEFAULT_MIN_FREE_BYTES,
        }
    }

    /// Override the safety threshold (fraction of available memory).
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the minimum free-memory floor for distributed checks.
    #[must_use]
    pub fn with_min_free_bytes(mut self, bytes: u64) -> Self {
        self.min_free_bytes = bytes;
        self
    }

    /// Bytes held live by one level of Strassen expansion at size `n`.
    fn working_set_bytes(n: usize) -> f64 {
        6.75 * (n * n) as f64 * ELEMENT_BYTES
    }

    fn available(&self) -> f64 {
        self.probe.available_bytes() as f64
    }

    /// May the sequential engine recurse at size `n`?
    ///
    /// The sequential call stack holds one level's temporaries at every
    /// depth concurrently, so the estimate scales by the recursion
    /// depth `floor(log2 n)` with a 1.5x overhead for allocator churn.
    #[must_use]
    pub fn may_recurse_sequential(&self, n: usize) -> bool {
        let depth = (n as f64).log2().floor();
        let needed = depth * Self::working_set_bytes(n) * 1.5;
        self.check(n, needed)
    }

    /// May the parallel engine expand at size `n`?
    ///
    /// Only one decomposition level's temporaries are live per branch,
    /// so a flat 2x concurrency overhead applies.
    #[must_use]
    pub fn may_recurse_parallel(&self, n: usize) -> bool {
        let needed = Self::working_set_bytes(n) * 2.0;
        self.check(n, needed)
    }

    /// Per-process check before accepting distributed work at size `n`.
    ///
    /// Normalizes the working set by the safety threshold and
    /// additionally requires the absolute free-memory floor.
    #[must_use]
    pub fn may_accept_task(&self, n: usize) -> bool {
        let available = self.available();
        let required = Self::working_set_bytes(n) / self.threshold;
        let enough = available >= required && available >= self.min_free_bytes as f64;
        if !enough {
            warn!(
                size = n,
                available_mb = available / (1024.0 * 1024.0),
                required_mb = required / (1024.0 * 1024.0),
                threshold = self.threshold,
                min_free_mb = self.min_free_bytes as f64 / (1024.0 * 1024.0),
                "process memory check failed"
            );
        }
        enough
    }

    /// Maximum safe fork-join recursion depth at size `n`.
    ///
    /// Each extra level of depth roughly halves `n^2` and thus the
    /// governing ratio quadratically; the 0.5 factor converts that
    /// quadratic shrink rate into a linear depth bound.
    #[must_use]
    pub fn max_parallel_depth(&self, n: usize) -> usize {
        let safe = self.available() * self.threshold;
        let denom = 105.0 * (n * n) as f64;
        if denom <= 0.0 || safe <= 0.0 {
            return 0;
        }
        let ratio = safe / denom;
        let depth = (0.5 * ratio.log2()).floor();
        if depth.is_sign_negative() {
            0
        } else {
            depth as usize
        }
    }

    fn check(&self, n: usize, needed: f64) -> bool {
        let available = self.available();
        let enough = needed < available * self.threshold;
        if !enough {
            warn!(
                size = n,
                available_mb = available / (1024.0 * 1024.0),
                needed_mb = needed / (1024.0 * 1024.0),
                threshold = self.threshold,
                "memory check failed"
            );
        }
        enough
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget_with(bytes: u64) -> MemoryBudget {
        MemoryBudget::new(Arc::new(FixedProbe::new(bytes)))
    }

    #[test]
    fn plentiful_memory_allows_recursion() {
        let budget = budget_with(16 * 1024 * 1024 * 1024);
        assert!(budget.may_recurse_sequential(1024));
        assert!(budget.may_recurse_parallel(1024));
        assert!(budget.may_accept_task(1024));
    }

    #[test]
    fn scarce_memory_denies_recursion() {
        let budget = budget_with(1024);
        assert!(!budget.may_recurse_sequential(256));
        assert!(!budget.may_recurse_parallel(256));
        assert!(!budget.may_accept_task(256));
    }

    #[test]
    fn distributed_check_enforces_free_floor() {
        // Plenty for a 4x4 working set, but below the 50 MB floor.
        let budget = budget_with(10 * 1024 * 1024);
        assert!(!budget.may_accept_task(4));
        // Lowering the floor lets the same probe pass.
        let budget = budget_with(10 * 1024 * 1024).with_min_free_bytes(1024);
        assert!(budget.may_accept_task(4));
    }

    #[test]
    fn max_depth_zero_when_starved() {
        let budget = budget_with(0);
        assert_eq!(budget.max_parallel_depth(64), 0);
    }

    #[test]
    fn max_depth_matches_formula() {
        // ratio = (avail * 0.9) / (105 * n^2); depth = floor(0.5 * log2(ratio))
        let avail: u64 = 8 * 1024 * 1024 * 1024;
        let n = 512;
        let budget = budget_with(avail);
        let ratio = (avail as f64 * 0.9) / (105.0 * (n * n) as f64);
        let expected = (0.5 * ratio.log2()).floor() as usize;
        assert_eq!(budget.max_parallel_depth(n), expected);
    }

    #[test]
    fn max_depth_shrinks_with_problem_size() {
        let budget = budget_with(8 * 1024 * 1024 * 1024);
        assert!(budget.max_parallel_depth(64) >= budget.max_parallel_depth(4096));
    }
}
