use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub survey: SurveySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySettings {
    /// Channels whose name starts with one of these prefixes are excluded
    /// from all-channel surveys (log-only channels by default).
    #[serde(default = "default_exclude_prefixes", rename = "exclude-prefixes")]
    pub exclude_prefixes: Vec<String>,

    /// Page size for paginated fetches, capped by the API at 1000.
    #[serde(default = "default_page_limit", rename = "page-limit")]
    pub page_limit: u32,
}

fn default_exclude_prefixes() -> Vec<String> {
    vec!["log-".to_string(), "log_".to_string()]
}

fn default_page_limit() -> u32 {
    1000
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            exclude_prefixes: default_exclude_prefixes(),
            page_limit: default_page_limit(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.survey.exclude_prefixes, vec!["log-", "log_"]);
        assert_eq!(settings.survey.page_limit, 1000);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings.survey.exclude_prefixes, vec!["log-", "log_"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[survey]\nexclude-prefixes = [\"bot-\"]\npage-limit = 200"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.survey.exclude_prefixes, vec!["bot-"]);
        assert_eq!(settings.survey.page_limit, 200);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[survey]\npage-limit = 500\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.survey.page_limit, 500);
        assert_eq!(settings.survey.exclude_prefixes, vec!["log-", "log_"]);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(AppError::TomlParse(_))
        ));
    }
}
