use std::path::PathBuf;

use clap::Parser;

/// Preemptive priority scheduler demo.
///
/// Starts every task of a scenario in a random (or fixed) arrival order and
/// prints the order in which their work units reached the shared resource.
#[derive(Parser, Debug, Default)]
#[command(name = "presched", version, about = "Preemptive priority task scheduler")]
pub struct CliArgs {
    /// Scenario TOML file with [[tasks]] and an optional [scheduler] table
    #[arg(long, env = "PRESCHED_SCENARIO")]
    pub scenario: Option<PathBuf>,

    /// Time slice granted to the queue head while arrivals are pending
    #[arg(long)]
    pub time_slice_ms: Option<u64>,

    /// External delay after each work unit
    #[arg(long)]
    pub work_unit_ms: Option<u64>,

    /// Seed for the random arrival order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fixed arrival order as comma-separated task ids, e.g. "2,0,1"
    #[arg(long, value_delimiter = ',')]
    pub arrival_order: Option<Vec<u32>>,

    /// Print the full run report as JSON instead of the trace
    #[arg(long)]
    pub json: bool,

    /// Tracing filter, overrides RUST_LOG and PRESCHED_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arrival_order_list() {
        let args = CliArgs::parse_from(["presched", "--arrival-order", "2,0,1", "--json"]);
        assert_eq!(args.arrival_order, Some(vec![2, 0, 1]));
        assert!(args.json);
        assert!(args.time_slice_ms.is_none());
    }

    #[test]
    fn parses_timing_overrides() {
        let args = CliArgs::parse_from([
            "presched",
            "--time-slice-ms",
            "30",
            "--work-unit-ms",
            "10",
            "--seed",
            "9",
        ]);
        assert_eq!(args.time_slice_ms, Some(30));
        assert_eq!(args.work_unit_ms, Some(10));
        assert_eq!(args.seed, Some(9));
    }
}
