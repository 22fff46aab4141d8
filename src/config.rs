use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::nav::interaction::POINTER_MOVE_THRESHOLD;
use crate::nav::memory::DEFAULT_FOCUS_MEMORY_LIMIT;

pub const MAX_SLOTS: u8 = 9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_slot_count")]
    pub slot_count: u8,
    #[serde(default = "default_slot")]
    pub default_slot: u8,
    #[serde(default = "default_cell_width")]
    pub cell_width: u16,
    #[serde(default = "default_pointer_threshold")]
    pub pointer_threshold: u16,
    #[serde(default = "default_filter_settle_ms")]
    pub filter_settle_ms: u64,
    #[serde(default = "default_focus_memory_limit")]
    pub focus_memory_limit: usize,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_theme() -> String {
    "meadow".to_string()
}
fn default_slot_count() -> u8 {
    3
}
fn default_slot() -> u8 {
    1
}
fn default_cell_width() -> u16 {
    24
}
fn default_pointer_threshold() -> u16 {
    POINTER_MOVE_THRESHOLD
}
fn default_filter_settle_ms() -> u64 {
    100
}
fn default_focus_memory_limit() -> usize {
    DEFAULT_FOCUS_MEMORY_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            slot_count: default_slot_count(),
            default_slot: default_slot(),
            cell_width: default_cell_width(),
            pointer_threshold: default_pointer_threshold(),
            filter_settle_ms: default_filter_settle_ms(),
            focus_memory_limit: default_focus_memory_limit(),
            api_base_url: None,
            session_token: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shrinetrack")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Clamp values a hand-edited file may have pushed out of range.
    pub fn validate(&mut self) {
        self.slot_count = self.slot_count.clamp(1, MAX_SLOTS);
        self.default_slot = self.default_slot.clamp(1, self.slot_count);
        self.cell_width = self.cell_width.clamp(8, 80);
        self.pointer_threshold = self.pointer_threshold.max(1);
        self.filter_settle_ms = self.filter_settle_ms.min(2_000);
        self.focus_memory_limit = self.focus_memory_limit.clamp(1, 1_024);
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
        if self
            .api_base_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.api_base_url = None;
        }
    }

    /// Remote backend settings, present only when both halves are set.
    pub fn remote(&self) -> Option<(&str, &str)> {
        match (self.api_base_url.as_deref(), self.session_token.as_deref()) {
            (Some(url), Some(token)) => Some((url.trim_end_matches('/'), token)),
            _ => None,
        }
    }
}
