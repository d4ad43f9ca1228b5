use std::env;
use std::time::Duration;

use tracing::warn;

pub const FOLLOW_INTERVAL_ENV_VAR: &str = "NPC_FOLLOW_INTERVAL_MS";
/// One host simulation tick (20 TPS).
pub const DEFAULT_FOLLOW_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_LOADER_RADIUS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub follow_interval: Duration,
    pub loader_radius: i32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            follow_interval: DEFAULT_FOLLOW_INTERVAL,
            loader_radius: DEFAULT_LOADER_RADIUS,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            follow_interval: resolve_follow_interval(env::var(FOLLOW_INTERVAL_ENV_VAR)),
            ..Self::default()
        }
    }

    pub(crate) fn normalized(self) -> Self {
        Self {
            follow_interval: if self.follow_interval.is_zero() {
                DEFAULT_FOLLOW_INTERVAL
            } else {
                self.follow_interval
            },
            loader_radius: self.loader_radius.max(0),
        }
    }
}

fn resolve_follow_interval(raw: Result<String, env::VarError>) -> Duration {
    match raw {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!(
                    env_var = FOLLOW_INTERVAL_ENV_VAR,
                    value = value.as_str(),
                    "invalid follow interval env var value; falling back to default"
                );
                DEFAULT_FOLLOW_INTERVAL
            }
        },
        Err(env::VarError::NotPresent) => DEFAULT_FOLLOW_INTERVAL,
        Err(err) => {
            warn!(
                env_var = FOLLOW_INTERVAL_ENV_VAR,
                error = %err,
                "unable to read follow interval env var; falling back to default"
            );
            DEFAULT_FOLLOW_INTERVAL
        }
    }
}
