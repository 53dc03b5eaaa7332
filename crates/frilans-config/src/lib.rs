// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Frilans listing pipeline.
//!
//! TOML files are merged along an XDG-style hierarchy, overridden by
//! `FRILANS_*` environment variables, rejected on unknown keys, and then
//! checked for semantic problems. Errors render as miette diagnostics with
//! "did you mean" suggestions.
//!
//! ```no_run
//! use frilans_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("fetching every {} minutes", config.collector.fetch_interval_mins);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FrilansConfig;

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<FrilansConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => finish(config),
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &loader::read_config_sources(),
        )),
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<FrilansConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => finish(config),
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<FrilansConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => finish(config),
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn finish(mut config: FrilansConfig) -> Result<FrilansConfig, Vec<ConfigError>> {
    validation::validate_config(&config)?;
    validation::apply_floors(&mut config);
    Ok(config)
}
