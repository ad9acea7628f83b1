use std::path::Path;

use anyhow::{Context, Result};
use presched_core::{reference_tasks, Config, TaskSpec};
use presched_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::CliArgs;

/// Scenario loaded from a TOML file.
///
/// ```toml
/// [scheduler]
/// time_slice_ms = 300
///
/// [[tasks]]
/// id = 0
/// priority = 0
/// burst = 10
/// label = "LOW"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub scheduler: SchedulerOverrides,

    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

/// Optional `[scheduler]` table; unset keys fall through to the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerOverrides {
    pub time_slice_ms: Option<u64>,
    pub work_unit_ms: Option<u64>,
    pub arrival_seed: Option<u64>,
}

/// One `[[tasks]]` entry. Values are validated when converted to a
/// [`TaskSpec`], so a negative priority is reported rather than rejected
/// by the TOML parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: u32,
    pub priority: i64,
    pub burst: i64,
    #[serde(default)]
    pub mark: Option<char>,
    #[serde(default)]
    pub label: Option<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "Loading scenario");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse scenario: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Task set for the run. An empty `[[tasks]]` list keeps the reference set.
    pub fn task_specs(&self) -> Result<Vec<TaskSpec>> {
        if self.tasks.is_empty() {
            return Ok(reference_tasks());
        }

        self.tasks
            .iter()
            .map(|entry| -> Result<TaskSpec> {
                let mut spec = TaskSpec::new(entry.id, entry.priority, entry.burst)
                    .with_context(|| format!("invalid task {}", entry.id))?;
                if let Some(mark) = entry.mark {
                    spec = spec.with_mark(mark);
                }
                if let Some(label) = &entry.label {
                    spec = spec.with_label(label.clone());
                }
                Ok(spec)
            })
            .collect()
    }
}

/// Resolve scheduler settings. Priority: CLI flag > scenario file > environment.
pub fn resolve_scheduler_config(env: &Config, scenario: Option<&Scenario>, args: &CliArgs) -> SchedulerConfig {
    let mut config = SchedulerConfig::from(env);

    if let Some(overrides) = scenario.map(|s| &s.scheduler) {
        if let Some(v) = overrides.time_slice_ms {
            config.time_slice_ms = v;
        }
        if let Some(v) = overrides.work_unit_ms {
            config.work_unit_ms = v;
        }
        if overrides.arrival_seed.is_some() {
            config.arrival_seed = overrides.arrival_seed;
        }
    }

    if let Some(v) = args.time_slice_ms {
        config.time_slice_ms = v;
    }
    if let Some(v) = args.work_unit_ms {
        config.work_unit_ms = v;
    }
    if args.seed.is_some() {
        config.arrival_seed = args.seed;
    }

    config
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use presched_core::{Priority, TaskId};

    use super::*;

    const SCENARIO: &str = r#"
[scheduler]
time_slice_ms = 300
arrival_seed = 11

[[tasks]]
id = 0
priority = 0
burst = 4
label = "LOW"

[[tasks]]
id = 1
priority = 2
burst = 2
mark = "x"
"#;

    fn env_config() -> Config {
        Config {
            profile: String::new(),
            time_slice_ms: 3000,
            work_unit_ms: 1000,
            arrival_seed: Some(5),
            log_filter: "info".to_string(),
        }
    }

    #[test]
    fn parses_tasks_and_overrides() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.scheduler.time_slice_ms, Some(300));
        assert_eq!(scenario.scheduler.work_unit_ms, None);

        let specs = scenario.task_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].label.as_deref(), Some("LOW"));
        assert_eq!(specs[0].mark, 'a');
        assert_eq!(specs[1].priority, Priority(2));
        assert_eq!(specs[1].mark, 'x');
    }

    #[test]
    fn empty_scenario_uses_reference_tasks() {
        let scenario = Scenario::parse("").unwrap();
        let specs = scenario.task_specs().unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[2].id, TaskId(2));
    }

    #[test]
    fn negative_priority_rejected() {
        let scenario = Scenario::parse("[[tasks]]\nid = 0\npriority = -1\nburst = 3\n").unwrap();
        assert!(scenario.task_specs().is_err());
    }

    #[test]
    fn zero_burst_rejected() {
        let scenario = Scenario::parse("[[tasks]]\nid = 3\npriority = 1\nburst = 0\n").unwrap();
        let err = scenario.task_specs().unwrap_err();
        assert!(err.to_string().contains("task 3"), "{err}");
    }

    #[test]
    fn cli_beats_scenario_beats_env() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let args = CliArgs {
            seed: Some(99),
            ..CliArgs::default()
        };
        let config = resolve_scheduler_config(&env_config(), Some(&scenario), &args);

        assert_eq!(config.time_slice_ms, 300);
        assert_eq!(config.work_unit_ms, 1000);
        assert_eq!(config.arrival_seed, Some(99));
    }

    #[test]
    fn env_used_without_scenario() {
        let config = resolve_scheduler_config(&env_config(), None, &CliArgs::default());
        assert_eq!(config.time_slice_ms, 3000);
        assert_eq!(config.arrival_seed, Some(5));
    }

    #[test]
    fn loads_scenario_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.tasks.len(), 2);
        assert_eq!(scenario.scheduler.arrival_seed, Some(11));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Scenario::load(&path).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
