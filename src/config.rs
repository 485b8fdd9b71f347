//! Configuration loading for the triage simulator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::agent::SkillLevel;
use crate::core::default_keywords;
use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the simulator home directory (~/.triage-sim).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".triage-sim"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load and validate settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return default if not found.
///
/// A file that exists but fails validation is still an error.
pub fn load_settings_or_default(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => get_settings_path()?,
    };

    if !path.exists() {
        tracing::warn!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    load_settings_from(&path)
}

pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.agents.is_empty() {
        return Err(Error::Config("at least one agent is required".to_string()));
    }

    let mut ids = HashSet::new();
    for agent in &settings.agents {
        if !ids.insert(agent.id.as_str()) {
            return Err(Error::Config(format!("duplicate agent id '{}'", agent.id)));
        }
        agent.skill.parse::<SkillLevel>()?;
    }

    let mut lowered = HashSet::new();
    for keyword in settings.keywords.keys() {
        if keyword.trim().is_empty() {
            return Err(Error::Config("keywords must not be blank".to_string()));
        }
        if !lowered.insert(keyword.to_lowercase()) {
            return Err(Error::Config(format!(
                "keyword '{}' is listed more than once with different case",
                keyword
            )));
        }
    }

    // A message matching every keyword must still fit a priority.
    let total = settings
        .keywords
        .values()
        .try_fold(0u32, |total, weight| total.checked_add(*weight));
    if total.is_none() {
        return Err(Error::Config(
            "keyword weights add up to more than the maximum priority".to_string(),
        ));
    }
    Ok(())
}

/// Agent configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AgentConfig {
    pub id: String,
    pub skill: String,
}

/// Simulation timing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Simulation {
    /// Wall-clock length of one service time unit.
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,
}

fn default_time_unit_ms() -> u64 {
    1000
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            time_unit_ms: default_time_unit_ms(),
        }
    }
}

fn default_agents() -> Vec<AgentConfig> {
    ["experto", "intermedio", "basico"]
        .into_iter()
        .map(|level| AgentConfig {
            id: level.to_string(),
            skill: level.to_string(),
        })
        .collect()
}

/// Simulator settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default = "default_keywords")]
    pub keywords: BTreeMap<String, u32>,

    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,

    #[serde(default)]
    pub simulation: Simulation,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            agents: default_agents(),
            simulation: Simulation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();

        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.keywords.get("emergencia"), Some(&10));
        assert_eq!(settings.agents.len(), 3);
        assert_eq!(settings.simulation.time_unit_ms, 1000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{ "simulation": { "time_unit_ms": 5 } }"#).unwrap();

        let settings = load_settings_from(&path).unwrap();

        assert_eq!(settings.simulation.time_unit_ms, 5);
        assert_eq!(settings.keywords.len(), 6);
        assert_eq!(settings.agents[0].id, "experto");
    }

    #[test]
    fn test_custom_agents_and_keywords() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "keywords": { "outage": 7 },
                "agents": [ { "id": "ana", "skill": "expert" } ]
            }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();

        assert_eq!(settings.keywords.len(), 1);
        assert_eq!(settings.agents[0].skill, "expert");
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.agents.push(AgentConfig {
            id: "experto".to_string(),
            skill: "expert".to_string(),
        });
        assert!(matches!(validate_settings(&settings), Err(Error::Config(_))));

        let mut settings = Settings::default();
        settings.agents[1].skill = "novato".to_string();
        assert!(matches!(
            validate_settings(&settings),
            Err(Error::InvalidSkillLevel(_))
        ));

        let mut settings = Settings::default();
        settings.agents.clear();
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.keywords.insert("  ".to_string(), 3);
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_case_duplicate_keywords() {
        let mut settings = Settings::default();
        settings.keywords.insert("Duda".to_string(), 3);

        let err = validate_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.to_lowercase().contains("duda")));
    }

    #[test]
    fn test_rejects_overflowing_weights() {
        let mut settings = Settings::default();
        settings.keywords.insert("enorme".to_string(), u32::MAX);
        assert!(matches!(validate_settings(&settings), Err(Error::Config(_))));

        let mut settings = Settings::default();
        settings.keywords.clear();
        settings.keywords.insert("enorme".to_string(), u32::MAX);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_overflowing_file_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{ "keywords": { "a": 4294967295, "b": 2 } }"#).unwrap();

        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));
        let settings = load_settings_or_default(Some(&path)).unwrap();
        assert_eq!(settings.agents.len(), 3);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_settings_from(&path), Err(Error::Json(_))));
    }
}
