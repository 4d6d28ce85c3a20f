//! JSON configuration parsing for headless mode
//!
//! Parses JSON match configurations into validated team rosters.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim::components::ClassKind;

/// Headless match configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    /// Team 1 composition (1-4 class names). The first member is the
    /// controlled combatant for outcome evaluation.
    pub team1: Vec<String>,
    /// Team 2 composition (1-4 class names)
    pub team2: Vec<String>,
    /// Custom output path for the match log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum match duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic match reproduction.
    /// If provided, block/evade rolls are reproducible.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_max_duration() -> f32 {
    300.0
}

impl HeadlessMatchConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessMatchConfig =
            serde_json::from_str(&contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.team1.is_empty() || self.team1.len() > 4 {
            return Err("team1 must have 1-4 members".to_string());
        }
        if self.team2.is_empty() || self.team2.len() > 4 {
            return Err("team2 must have 1-4 members".to_string());
        }

        for class_name in self.team1.iter().chain(self.team2.iter()) {
            Self::parse_class(class_name)?;
        }

        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        Ok(())
    }

    /// Parse a class name string into ClassKind
    pub fn parse_class(name: &str) -> Result<ClassKind, String> {
        match name {
            "Slinger" => Ok(ClassKind::Slinger),
            "Bulwark" => Ok(ClassKind::Bulwark),
            "Medic" => Ok(ClassKind::Medic),
            _ => Err(format!(
                "Unknown class: '{}'. Valid classes: Slinger, Bulwark, Medic",
                name
            )),
        }
    }

    /// Parsed team rosters, valid only after `validate`.
    pub fn rosters(&self) -> Result<(Vec<ClassKind>, Vec<ClassKind>), String> {
        let team1 = self
            .team1
            .iter()
            .map(|s| Self::parse_class(s))
            .collect::<Result<Vec<_>, _>>()?;
        let team2 = self
            .team2
            .iter()
            .map(|s| Self::parse_class(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((team1, team2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> HeadlessMatchConfig {
        HeadlessMatchConfig {
            team1: vec!["Slinger".to_string(), "Medic".to_string()],
            team2: vec!["Bulwark".to_string()],
            output_path: None,
            max_duration_secs: 120.0,
            random_seed: Some(7),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn unknown_class_rejected() {
        let mut config = base_config();
        config.team2 = vec!["Wizard".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.contains("Wizard"));
    }

    #[test]
    fn empty_team_rejected() {
        let mut config = base_config();
        config.team1.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_team_rejected() {
        let mut config = base_config();
        config.team1 = vec!["Slinger".to_string(); 5];
        assert!(config.validate().is_err());
    }

    #[test]
    fn nonpositive_duration_rejected() {
        let mut config = base_config();
        config.max_duration_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_defaults_fill_in() {
        let json = r#"{"team1": ["Slinger"], "team2": ["Bulwark"]}"#;
        let config: HeadlessMatchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_duration_secs, 300.0);
        assert!(config.random_seed.is_none());
        assert!(config.validate().is_ok());
    }
}
