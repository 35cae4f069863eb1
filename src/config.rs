//! Storefront configuration baked in at build time.
//!
//! Browser builds have no process environment, so values are captured with
//! `option_env!` when the WASM bundle is compiled and parsed at startup.

use std::time::Duration;

use crate::state::session::{DEFAULT_PROFILE_TIMEOUT, DEFAULT_SESSION_TIMEOUT, SessionConfig};

pub const SUPABASE_URL_VAR: &str = "CIPTAIN_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "CIPTAIN_SUPABASE_ANON_KEY";
pub const ADMIN_WHATSAPP_VAR: &str = "CIPTAIN_ADMIN_WHATSAPP";
pub const SESSION_TIMEOUT_VAR: &str = "CIPTAIN_SESSION_TIMEOUT_SECS";
pub const PROFILE_TIMEOUT_VAR: &str = "CIPTAIN_PROFILE_TIMEOUT_SECS";

/// WhatsApp number order confirmations are sent to when none is configured.
pub const DEFAULT_ADMIN_WHATSAPP: &str = "6281234567890";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL without a trailing slash.
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Digits only, international format without `+`.
    pub admin_whatsapp: String,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Build config from the values captured at compile time.
    ///
    /// Required:
    /// - `CIPTAIN_SUPABASE_URL`
    /// - `CIPTAIN_SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `CIPTAIN_ADMIN_WHATSAPP`: default `6281234567890`
    /// - `CIPTAIN_SESSION_TIMEOUT_SECS`: default 10
    /// - `CIPTAIN_PROFILE_TIMEOUT_SECS`: default 10
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_lookup(build_env)
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let supabase_url = required(&lookup, SUPABASE_URL_VAR)?;
        if !(supabase_url.starts_with("https://") || supabase_url.starts_with("http://")) {
            return Err(ConfigError::Invalid { var: SUPABASE_URL_VAR, value: supabase_url });
        }
        let supabase_url = supabase_url.trim_end_matches('/').to_owned();
        let supabase_anon_key = required(&lookup, SUPABASE_ANON_KEY_VAR)?;

        let admin_whatsapp = match lookup(ADMIN_WHATSAPP_VAR).map(|raw| raw.trim().to_owned()) {
            None => DEFAULT_ADMIN_WHATSAPP.to_owned(),
            Some(raw) if raw.is_empty() => DEFAULT_ADMIN_WHATSAPP.to_owned(),
            Some(raw) => {
                let digits = raw.trim_start_matches('+');
                if !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ConfigError::Invalid { var: ADMIN_WHATSAPP_VAR, value: raw });
                }
                digits.to_owned()
            }
        };

        let session = SessionConfig {
            session_timeout: parse_secs(&lookup, SESSION_TIMEOUT_VAR, DEFAULT_SESSION_TIMEOUT),
            profile_timeout: parse_secs(&lookup, PROFILE_TIMEOUT_VAR, DEFAULT_PROFILE_TIMEOUT),
        };

        Ok(Self { supabase_url, supabase_anon_key, admin_whatsapp, session })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<String, ConfigError> {
    lookup(var)
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .ok_or(ConfigError::Missing { var })
}

/// Whole seconds, falling back to `default` when absent, unparsable, or zero.
fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: Duration) -> Duration {
    lookup(var)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}

fn build_env(key: &str) -> Option<String> {
    let raw = match key {
        SUPABASE_URL_VAR => option_env!("CIPTAIN_SUPABASE_URL"),
        SUPABASE_ANON_KEY_VAR => option_env!("CIPTAIN_SUPABASE_ANON_KEY"),
        ADMIN_WHATSAPP_VAR => option_env!("CIPTAIN_ADMIN_WHATSAPP"),
        SESSION_TIMEOUT_VAR => option_env!("CIPTAIN_SESSION_TIMEOUT_SECS"),
        PROFILE_TIMEOUT_VAR => option_env!("CIPTAIN_PROFILE_TIMEOUT_SECS"),
        _ => None,
    };
    raw.map(str::to_owned)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
