//! Driver configuration from CLI flags and environment.

use clap::{Parser, ValueEnum};

/// Execution strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Single-threaded recursive Strassen.
    Sequential,
    /// Fork-join parallel Strassen.
    Parallel,
    /// Coordinator/worker distribution over a channel mesh.
    Distributed,
}

/// Strassen matrix multiplication driver.
#[derive(Parser, Debug)]
#[command(name = "strassen", version, about)]
pub struct AppConfig {
    /// Execution strategy.
    #[arg(short, long, value_enum, default_value = "sequential")]
    pub mode: Mode,

    /// Matrix side length.
    #[arg(short, long, default_value = "256", env = "STRASSEN_SIZE")]
    pub size: usize,

    /// Number of worker ranks for distributed mode.
    #[arg(short, long, default_value = "7")]
    pub workers: usize,

    /// Number of timed runs to average.
    #[arg(short, long, default_value = "1")]
    pub runs: u32,

    /// Verify the result against the direct O(n^3) product.
    #[arg(long)]
    pub verify: bool,

    /// Fraction of available memory treated as usable.
    #[arg(long, default_value = "0.9", env = "STRASSEN_MEMORY_THRESHOLD")]
    pub memory_threshold: f64,

    /// Minimum free memory (MB) required by distributed per-process checks.
    #[arg(long, default_value = "50", env = "STRASSEN_MIN_FREE_MB")]
    pub min_free_mb: u64,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::try_parse_from(["strassen"]).unwrap();
        assert_eq!(config.mode, Mode::Sequential);
        assert_eq!(config.size, 256);
        assert_eq!(config.workers, 7);
        assert!((config.memory_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.min_free_mb, 50);
    }

    #[test]
    fn parses_distributed_mode() {
        let config =
            AppConfig::try_parse_from(["strassen", "-m", "distributed", "-s", "128", "-w", "3"])
                .unwrap();
        assert_eq!(config.mode, Mode::Distributed);
        assert_eq!(config.size, 128);
        assert_eq!(config.workers, 3);
    }
}
