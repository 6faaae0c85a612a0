use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "npcbot.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptHost {
    #[default]
    Lua,
    Rhai,
}

impl ScriptHost {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lua" => Some(Self::Lua),
            "rhai" => Some(Self::Rhai),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub roster_path: Option<String>,
    pub script_host: ScriptHost,
    /// Passed to the bot AI's can-equip check (level requirements honoured).
    pub strict_can_equip: bool,
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            roster_path: None,
            script_host: ScriptHost::Lua,
            strict_can_equip: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    env_nonempty(name).and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

impl BridgeConfig {
    /// Parses a JSON config document; unknown keys are ignored.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Reads the file named by `NPCBOT_BRIDGE_CONFIG` (or `npcbot.json`), then
    /// applies env overrides. A missing or malformed file falls back to defaults.
    pub fn load() -> Self {
        let path = env_nonempty("NPCBOT_BRIDGE_CONFIG")
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(cfg) => {
                    info!("loaded bridge config from {path}");
                    cfg
                }
                Err(e) => {
                    warn!("failed to parse {path}: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if let Some(path) = env_nonempty("NPCBOT_ROSTER") {
            self.roster_path = Some(path);
        }
        if let Some(host) = env_nonempty("NPCBOT_SCRIPT_HOST") {
            match ScriptHost::parse(&host) {
                Some(host) => self.script_host = host,
                None => warn!("ignoring unknown NPCBOT_SCRIPT_HOST value '{host}'"),
            }
        }
        if let Some(strict) = env_bool("NPCBOT_STRICT_CAN_EQUIP") {
            self.strict_can_equip = strict;
        }
        if let Some(filter) = env_nonempty("NPCBOT_LOG") {
            self.log_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = BridgeConfig::from_json(r#"{ "script_host": "rhai" }"#).expect("parse");
        assert_eq!(cfg.script_host, ScriptHost::Rhai);
        assert!(cfg.strict_can_equip);
        assert_eq!(cfg.log_filter, "info");
        assert!(cfg.roster_path.is_none());
    }

    #[test]
    fn full_document_parses() {
        let cfg = BridgeConfig::from_json(
            r#"{
                "roster_path": "fixtures/demo_roster.json",
                "script_host": "lua",
                "strict_can_equip": false,
                "log_filter": "npcbot_bridge=debug"
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.roster_path.as_deref(), Some("fixtures/demo_roster.json"));
        assert!(!cfg.strict_can_equip);
        assert_eq!(cfg.log_filter, "npcbot_bridge=debug");
    }

    #[test]
    fn host_names_are_case_insensitive() {
        assert_eq!(ScriptHost::parse(" RHAI "), Some(ScriptHost::Rhai));
        assert_eq!(ScriptHost::parse("python"), None);
    }
}
