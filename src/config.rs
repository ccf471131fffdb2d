use std::env;
use std::sync::Arc;

use serenity::prelude::*;
use thiserror::Error;

pub struct BotConfigKey;

impl TypeMapKey for BotConfigKey {
    type Value = Arc<BotConfig>;
}

/// Bot settings, read once at startup from `NTBOT_*` environment variables.
pub struct BotConfig {
    pub secret_token: String,
    pub pug_channel: String,
    pub players_required_total: usize,
    pub pugger_role: String,
    pub pug_admin_roles: Vec<String>,
    pub first_team_name: String,
    pub second_team_name: String,
    pub command_prefix: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required config value: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

const DEFAULT_FIRST_TEAM_NAME: &str = "Team 1";
const DEFAULT_SECOND_TEAM_NAME: &str = "Team 2";
const DEFAULT_COMMAND_PREFIX: &str = "!";

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any string lookup. Keeps parsing and validation
    /// independent of the process environment so tests can feed a map.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let secret_token = required(&lookup, "NTBOT_SECRET_TOKEN")?;
        let pug_channel = required(&lookup, "NTBOT_PUG_CHANNEL")?;
        let pugger_role = required(&lookup, "NTBOT_PUGGER_ROLE")?;
        let players_required_total = required(&lookup, "NTBOT_PLAYERS_REQUIRED_TOTAL")?;
        let players_required_total = parse_player_count(&players_required_total)?;

        let pug_admin_roles = match lookup("NTBOT_PUG_ADMIN_ROLES") {
            Some(roles) => parse_role_list(&roles),
            None => Vec::new(),
        };

        Ok(Self {
            secret_token,
            pug_channel,
            players_required_total,
            pugger_role,
            pug_admin_roles,
            first_team_name: lookup("NTBOT_FIRST_TEAM_NAME")
                .unwrap_or_else(|| DEFAULT_FIRST_TEAM_NAME.into()),
            second_team_name: lookup("NTBOT_SECOND_TEAM_NAME")
                .unwrap_or_else(|| DEFAULT_SECOND_TEAM_NAME.into()),
            command_prefix: lookup("NTBOT_COMMAND_PREFIX")
                .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.into()),
        })
    }
}

fn required<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    key: &'static str,
) -> Result<String, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// Total player count must be positive and even so the roster splits into two
/// equal teams.
fn parse_player_count(raw: &str) -> Result<usize, ConfigError> {
    let key = "NTBOT_PLAYERS_REQUIRED_TOTAL";
    let count: usize = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("expected an integer, got {raw:?}"),
    })?;
    if count == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "need a positive number of players".into(),
        });
    }
    if count % 2 != 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("need an even number of players, got {count}"),
        });
    }
    Ok(count)
}

fn parse_role_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NTBOT_SECRET_TOKEN", "s3cr3t"),
            ("NTBOT_PUG_CHANNEL", "pug-queue"),
            ("NTBOT_PLAYERS_REQUIRED_TOTAL", "10"),
            ("NTBOT_PUGGER_ROLE", "Pugger"),
        ])
    }

    fn load(vars: HashMap<&'static str, &'static str>) -> Result<BotConfig, ConfigError> {
        BotConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load(base_vars()).unwrap();
        assert_eq!(config.players_required_total, 10);
        assert!(config.pug_admin_roles.is_empty());
        assert_eq!(config.first_team_name, "Team 1");
        assert_eq!(config.second_team_name, "Team 2");
        assert_eq!(config.command_prefix, "!");
    }

    #[test]
    fn missing_token_is_fatal() {
        let mut vars = base_vars();
        vars.remove("NTBOT_SECRET_TOKEN");
        assert!(matches!(
            load(vars),
            Err(ConfigError::Missing("NTBOT_SECRET_TOKEN"))
        ));
    }

    #[test]
    fn odd_player_count_rejected() {
        let mut vars = base_vars();
        vars.insert("NTBOT_PLAYERS_REQUIRED_TOTAL", "7");
        assert!(matches!(load(vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_player_count_rejected() {
        let mut vars = base_vars();
        vars.insert("NTBOT_PLAYERS_REQUIRED_TOTAL", "0");
        assert!(matches!(load(vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn non_numeric_player_count_rejected() {
        let mut vars = base_vars();
        vars.insert("NTBOT_PLAYERS_REQUIRED_TOTAL", "ten");
        assert!(matches!(load(vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn admin_roles_split_and_trimmed() {
        let mut vars = base_vars();
        vars.insert("NTBOT_PUG_ADMIN_ROLES", "PUG Admin, Moderator ,,");
        let config = load(vars).unwrap();
        assert_eq!(config.pug_admin_roles, vec!["PUG Admin", "Moderator"]);
    }

    #[test]
    fn overridden_names_and_prefix() {
        let mut vars = base_vars();
        vars.insert("NTBOT_FIRST_TEAM_NAME", "Jinrai");
        vars.insert("NTBOT_SECOND_TEAM_NAME", "NSF");
        vars.insert("NTBOT_COMMAND_PREFIX", "$!");
        let config = load(vars).unwrap();
        assert_eq!(config.first_team_name, "Jinrai");
        assert_eq!(config.second_team_name, "NSF");
        assert_eq!(config.command_prefix, "$!");
    }
}
