//! Configuration for the questline engine.
//!
//! Maps directly to `questline.toml`. Every section is optional; missing
//! sections and keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::types::{Location, ZoneBounds};

/// Top-level questline configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Directive parsing limits.
    #[serde(default)]
    pub directives: DirectiveConfig,
    /// Zones and characters quests can refer to.
    #[serde(default)]
    pub world: WorldConfig,
    /// Turn-in behaviour.
    #[serde(default)]
    pub turn_in: TurnInConfig,
    /// Journal behaviour.
    #[serde(default)]
    pub journal: JournalConfig,
    /// Snapshot settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl QuestConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `QuestError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::QuestError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether quest directives are acted on at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Limits applied to parsed directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveConfig {
    /// Largest FETCH quantity the spawner accepts.
    #[serde(default = "default_20")]
    pub max_fetch_quantity: u32,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            max_fetch_quantity: 20,
        }
    }
}

/// A named region of the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Canonical zone name.
    pub name: String,
    /// Other names generated text may use for the zone.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Spatial extent.
    pub bounds: ZoneBounds,
}

/// A character quests can name as a recipient or conversation partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Character name.
    pub name: String,
    /// Zone the character lives in.
    pub zone: String,
}

/// World anchors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Known zones.
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
    /// Known characters.
    #[serde(default)]
    pub characters: Vec<CharacterConfig>,
    /// Seed for target placement. `None` seeds from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            characters: Vec::new(),
            spawn_seed: None,
        }
    }
}

/// Turn-in coordinator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInConfig {
    /// Distance at which a character notices the player.
    #[serde(default = "default_interaction_range")]
    pub interaction_range: f32,
    /// Complete EXPLORE/TALK/INTERACT quests on the triggering event instead
    /// of waiting for the player to report back.
    #[serde(default)]
    pub auto_complete_on_event: bool,
}

impl Default for TurnInConfig {
    fn default() -> Self {
        Self {
            interaction_range: 3.0,
            auto_complete_on_event: false,
        }
    }
}

/// Journal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Track a newly added quest when nothing else is tracked.
    #[serde(default = "default_true")]
    pub auto_track_new: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            auto_track_new: true,
        }
    }
}

/// Snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Format version written into snapshots.
    #[serde(default = "default_1_u32")]
    pub snapshot_version: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_version: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_20() -> u32 {
    20
}
fn default_1_u32() -> u32 {
    1
}
fn default_interaction_range() -> f32 {
    3.0
}

/// The stock zone vocabulary, laid out on a 3×3 grid of 50-unit cells.
#[must_use]
pub fn default_zones() -> Vec<ZoneConfig> {
    const CELL: f32 = 50.0;
    let names: [(&str, &[&str]); 9] = [
        ("laboratory", &["lab"]),
        ("hangar", &[]),
        ("market", &["bazaar"]),
        ("security", &[]),
        ("residential", &["quarters"]),
        ("engineering", &[]),
        ("medical", &["medbay"]),
        ("storage", &[]),
        ("ruins", &[]),
    ];

    names
        .iter()
        .enumerate()
        .map(|(i, (name, aliases))| {
            #[allow(clippy::cast_precision_loss)]
            let (col, row) = ((i % 3) as f32, (i / 3) as f32);
            ZoneConfig {
                name: (*name).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
                bounds: ZoneBounds::new(
                    Location::new(col * CELL, row * CELL, 0.0),
                    Location::new((col + 1.0) * CELL, (row + 1.0) * CELL, 10.0),
                ),
            }
        })
        .collect()
}
