use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Identifier reported for players missing from the known players map.
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Deserialize)]
pub struct KnownPlayer {
    /// Display name on Board Game Arena.
    #[serde(rename = "BGA", default)]
    pub bga_name: Option<String>,
    /// Matching username on BoardGameGeek.
    #[serde(rename = "BGG")]
    pub bgg_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KnownGame {
    /// Numeric id of the game in the BoardGameGeek catalogue.
    #[serde(rename = "BGG")]
    pub bgg_id: u64,
}

/// Externally maintained mapping of player ids and game names. Loaded once
/// at startup and threaded read-only through the extractor and printer.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownData {
    pub players: HashMap<String, KnownPlayer>,
    pub games: HashMap<String, KnownGame>,
}

impl KnownData {
    /// BGG username for a raw BGA player id, or the anonymous sentinel.
    pub fn player_identifier(&self, player_id: &str) -> &str {
        self.players
            .get(player_id)
            .map(|p| p.bgg_name.as_str())
            .unwrap_or(ANONYMOUS)
    }

    pub fn player_id_by_bga_name(&self, name: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|(_, player)| player.bga_name.as_deref() == Some(name))
            .map(|(id, _)| id.as_str())
    }
}

pub fn load_known_data(path: &Path) -> Result<KnownData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read known data file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid known data json in {}", path.display()))?;
    if value.get("players").is_none() {
        bail!(
            "known data file {} must contain a \"players\" map",
            path.display()
        );
    }
    if value.get("games").is_none() {
        bail!(
            "known data file {} must contain a \"games\" map",
            path.display()
        );
    }
    serde_json::from_value(value)
        .with_context(|| format!("malformed known data in {}", path.display()))
}
