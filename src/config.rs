use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::slots::SlotLayout;

pub const DEFAULT_CONFIG_PATH: &str = "Configuration/voluntracker.toml";

/// Stored in the sheet-id file until a spreadsheet is chosen
pub const NO_SHEET_SELECTED: &str = "NO CURRENT SPREADSHEET SELECTED";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backup_dir: PathBuf,
    pub roster_path: PathBuf,
    pub sheet_id_path: PathBuf,
    pub submission_path: PathBuf,
    /// Workbook whose first sheet the submission starts from
    pub template_path: PathBuf,
    pub chart_path: PathBuf,
    pub organization: String,
    pub web_bind: String,
    pub web_port: u16,
    pub layout: SlotLayout,
}

impl Default for Settings {
    fn default() -> Self {
        let config_dir = PathBuf::from("Configuration");
        Self {
            backup_dir: PathBuf::from("Backups"),
            roster_path: config_dir.join("Roster.csv"),
            sheet_id_path: config_dir.join("spreadurl.txt"),
            submission_path: PathBuf::from("FINALIZED_SUBMISSION.xlsx"),
            template_path: config_dir.join("BaseTemplate.xlsx"),
            chart_path: PathBuf::from("hours_chart.png"),
            organization: String::new(),
            web_bind: "127.0.0.1".into(),
            web_port: 8080,
            layout: SlotLayout::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TrackerError::Config(e.to_string()))
    }
}

/// Reads settings from `path`, falling back to defaults when the file does
/// not exist, then applies environment overrides.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => {
            debug!(path = %path.display(), "loading settings file");
            Settings::from_toml(&raw)?
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(e) => return Err(e.into()),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.layout.validate()?;
    Ok(settings)
}

fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("VOLUNTRACKER_BACKUP_DIR") {
        settings.backup_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("VOLUNTRACKER_ROSTER") {
        settings.roster_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("VOLUNTRACKER_SUBMISSION") {
        settings.submission_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("VOLUNTRACKER_TEMPLATE") {
        settings.template_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("VOLUNTRACKER_PORT") {
        settings.web_port = v
            .parse()
            .map_err(|_| TrackerError::Config(format!("VOLUNTRACKER_PORT is not a port: {v}")))?;
    }
    Ok(())
}

/// Extracts the spreadsheet id from a full Google Sheets address, i.e. the
/// path segment after `/d/`.
pub fn spreadsheet_id_from_url(url: &str) -> Result<String> {
    let id = url
        .trim()
        .split_once("/d/")
        .map(|(_, rest)| rest.split('/').next().unwrap_or_default())
        .unwrap_or_default();

    if id.is_empty() {
        return Err(TrackerError::InvalidSheetUrl(url.to_string()));
    }
    Ok(id.to_string())
}

/// Current spreadsheet id. A missing file is created holding the
/// placeholder, which reads back as `None`.
pub fn load_sheet_id(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, NO_SHEET_SELECTED)?;
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let id = raw.trim();
    if id.is_empty() || id == NO_SHEET_SELECTED {
        Ok(None)
    } else {
        Ok(Some(id.to_string()))
    }
}

pub fn save_sheet_id(path: &Path, url: &str) -> Result<String> {
    let id = spreadsheet_id_from_url(url)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &id)?;
    info!(sheet_id = %id, "spreadsheet changed");
    Ok(id)
}
