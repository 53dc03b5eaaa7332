// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based loading of layered configuration.
//!
//! Merge order, later layers winning:
//! compiled defaults, `/etc/frilans/frilans.toml`,
//! `~/.config/frilans/frilans.toml`, `./frilans.toml`, `FRILANS_*` env vars.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FrilansConfig;

const SYSTEM_CONFIG: &str = "/etc/frilans/frilans.toml";
const LOCAL_CONFIG: &str = "frilans.toml";

/// Top-level sections an environment variable may target.
const SECTIONS: &[&str] = &[
    "daemon",
    "collector",
    "dispatch",
    "digest",
    "retention",
    "storage",
    "telegram",
];

fn user_config() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("frilans/frilans.toml"))
        .unwrap_or_default()
}

/// Build the full layered figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FrilansConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<FrilansConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults.
///
/// Environment variables are not consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<FrilansConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FrilansConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FrilansConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FrilansConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Read every hierarchy file that exists, for diagnostic source spans.
pub fn read_config_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(LOCAL_CONFIG))
        .unwrap_or_else(|_| PathBuf::from(LOCAL_CONFIG));

    [local, user_config(), PathBuf::from(SYSTEM_CONFIG)]
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}

/// Map `FRILANS_<SECTION>_<KEY>` onto `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `FRILANS_TELEGRAM_BOT_TOKEN` lands on `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("FRILANS_").map(|key| section_key(key.as_str()).into())
}

fn section_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
