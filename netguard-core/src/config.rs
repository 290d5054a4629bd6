//! Layered configuration: `config/default.<ext>`, then
//! `config/<RUN_MODE>.<ext>`, then environment-variable overrides, scoped
//! down to what this crate's demo binary actually needs — there is no
//! database URL or JWT secret here, since neither a persistence driver nor
//! an auth layer is this crate's concern.

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Default `priority` stamped on generated `IEAgAgRule`s.
    #[serde(default = "default_rule_priority")]
    pub default_rule_priority: i32,
    /// Whether newly generated `IEAgAgRule`s have `logs` enabled by default.
    #[serde(default)]
    pub default_rule_logs: bool,
}

fn default_rule_priority() -> i32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_rule_priority: default_rule_priority(),
            default_rule_logs: false,
        }
    }
}

impl Settings {
    /// Loads `config/default.{yaml,...}`, then `config/<RUN_MODE>.{yaml,...}`
    /// if present, then `NETGUARD_*` environment overrides — each layer
    /// winning over the last. Falls back to [`Settings::default`] if no
    /// config files exist at all, which is the common case for the demo
    /// binary and for tests.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .set_default("default_rule_priority", default_rule_priority())?
            .set_default("default_rule_logs", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("netguard"))
            .build()?;

        config.try_deserialize()
    }
}
