//! Application-level configuration: tunables from an optional JSON file and
//! secrets/connection settings from the environment.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZOR_CONFIG_PATH";
/// Weights applied to ranks 1..=5 of a guest submission.
const DEFAULT_RANK_WEIGHTS: [u32; 5] = [5, 4, 3, 2, 1];
/// Weight applied to any rank past the end of the table.
const DEFAULT_WEIGHT: u32 = 1;
const DEFAULT_BROADCAST_CAPACITY: usize = 64;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB: &str = "quizor";
/// Lifetime of the admin session cookie.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Environment variables, each with the legacy name accepted as a fallback.
const JWT_SECRET_VARS: [&str; 2] = ["QUIZOR_JWT_SECRET", "jwt_hash"];
const ADMIN_PASSWORD_VARS: [&str; 2] = ["QUIZOR_ADMIN_PASSWORD", "key_schluessel"];
const MONGO_URI_VARS: [&str; 2] = ["MONGO_URI", "m_db"];

/// Startup configuration problems. Any of these aborts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable absent or blank.
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    /// Variable present but unusable.
    #[error("invalid value for `{var}`: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Rank-to-weight table used by the scoring engine.
///
/// Rank `i` (0-based) scores `weights[i]` when the table has that entry and
/// `default_weight` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankWeights {
    weights: Vec<u32>,
    default_weight: u32,
}

impl RankWeights {
    /// Table for ranks `0..weights.len()`, `default_weight` past it.
    pub fn new(weights: Vec<u32>, default_weight: u32) -> Self {
        Self {
            weights,
            default_weight,
        }
    }

    /// Weight for the 0-based `rank`.
    pub fn weight(&self, rank: usize) -> u32 {
        self.weights
            .get(rank)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Explicit per-rank weights, best rank first.
    pub fn table(&self) -> &[u32] {
        &self.weights
    }
}

impl Default for RankWeights {
    fn default() -> Self {
        Self::new(DEFAULT_RANK_WEIGHTS.to_vec(), DEFAULT_WEIGHT)
    }
}

/// Credentials gating the controller/admin role.
#[derive(Clone)]
pub struct AuthSettings {
    /// HMAC secret used to sign session cookies.
    pub jwt_secret: String,
    /// Shared password accepted by `POST /login`.
    pub admin_password: String,
    /// Lifetime of an issued session cookie.
    pub session_ttl: Duration,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("admin_password", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Connection settings for the question catalog.
#[derive(Clone)]
pub struct StoreSettings {
    /// MongoDB connection string.
    pub uri: String,
    /// Database holding the `questions` and `guest_answers` collections.
    pub database: String,
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("uri", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Tunables that have sensible defaults and may be overridden by the JSON file.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Weights applied by the scoring engine.
    pub rank_weights: RankWeights,
    /// Capacity of the broadcast channel before slow subscribers lose events.
    pub broadcast_capacity: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rank_weights: RankWeights::default(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Admin credentials and cookie signing.
    pub auth: AuthSettings,
    /// Question catalog connection.
    pub store: StoreSettings,
    /// Scoring and fan-out tunables.
    pub game: GameSettings,
    /// HTTP listening port.
    pub port: u16,
}

impl AppConfig {
    /// Load the game tunables from disk and the secrets from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let game = GameSettings::load();
        Self::from_lookup(game, |name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(game: GameSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |names: [&'static str; 2]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
                .ok_or(ConfigError::Missing(names[0]))
        };

        let auth = AuthSettings {
            jwt_secret: required(JWT_SECRET_VARS)?,
            admin_password: required(ADMIN_PASSWORD_VARS)?,
            session_ttl: SESSION_TTL,
        };
        let store = StoreSettings {
            uri: required(MONGO_URI_VARS)?,
            database: lookup("MONGO_DB")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_DB.to_owned()),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|err| ConfigError::Invalid {
                var: "PORT",
                reason: err.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            auth,
            store,
            game,
            port,
        })
    }
}

impl GameSettings {
    /// Read the JSON file, falling back to the built-in defaults when absent or invalid.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let settings: Self = raw.into();
                    info!(
                        path = %path.display(),
                        weights = ?settings.rank_weights.table(),
                        "loaded game settings from config"
                    );
                    settings
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    rank_weights: Option<Vec<u32>>,
    default_weight: Option<u32>,
    broadcast_capacity: Option<usize>,
}

impl From<RawConfig> for GameSettings {
    fn from(value: RawConfig) -> Self {
        let rank_weights = RankWeights::new(
            value
                .rank_weights
                .unwrap_or_else(|| DEFAULT_RANK_WEIGHTS.to_vec()),
            value.default_weight.unwrap_or(DEFAULT_WEIGHT),
        );
        Self {
            rank_weights,
            broadcast_capacity: value
                .broadcast_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_BROADCAST_CAPACITY),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
