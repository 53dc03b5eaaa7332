// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `frilans profile` command implementation.
//!
//! Operator access to every profile mutation, applied through the same
//! store operation a chat command layer would use.

use clap::Subcommand;
use frilans_config::FrilansConfig;
use frilans_core::types::{
    ExperienceLevel, NotificationMode, PaymentType, ProjectType, SubscriberProfile, UserId,
};
use frilans_core::{FrilansError, ListingStore, ProfileMutation};
use tracing::info;

use crate::serve::open_store;

#[derive(Subcommand, Debug)]
pub enum ProfileOp {
    /// Print the stored profile as JSON.
    Show,
    Subscribe,
    Unsubscribe,
    AddKeywords {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    RemoveKeywords {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    AddExcluded {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    RemoveExcluded {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    AddTechnologies {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    RemoveTechnologies {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Replace the region filter; no arguments accepts any region.
    SetRegions { regions: Vec<String> },
    /// Set the budget range; omit a bound to leave it open.
    SetBudget {
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },
    /// fixed, hourly. No arguments removes the constraint.
    SetProjectTypes { values: Vec<ProjectType> },
    /// junior, mid, senior. No arguments removes the constraint.
    SetExperience { values: Vec<ExperienceLevel> },
    /// prepay, postpay, escrow. No arguments removes the constraint.
    SetPayment { values: Vec<PaymentType> },
    /// instant or daily_digest.
    SetMode { mode: NotificationMode },
    /// Local digest time in the configured timezone.
    SetDigestTime { hour: u8, minute: u8 },
}

impl ProfileOp {
    /// The mutation this operation applies, or `None` for read-only `show`.
    pub fn into_mutation(self) -> Option<ProfileMutation> {
        let m = match self {
            ProfileOp::Show => return None,
            ProfileOp::Subscribe => ProfileMutation::Subscribe,
            ProfileOp::Unsubscribe => ProfileMutation::Unsubscribe,
            ProfileOp::AddKeywords { terms } => ProfileMutation::AddKeywords(terms),
            ProfileOp::RemoveKeywords { terms } => ProfileMutation::RemoveKeywords(terms),
            ProfileOp::AddExcluded { terms } => ProfileMutation::AddExcludedKeywords(terms),
            ProfileOp::RemoveExcluded { terms } => ProfileMutation::RemoveExcludedKeywords(terms),
            ProfileOp::AddTechnologies { terms } => ProfileMutation::AddTechnologies(terms),
            ProfileOp::RemoveTechnologies { terms } => ProfileMutation::RemoveTechnologies(terms),
            ProfileOp::SetRegions { regions } => ProfileMutation::SetRegions(regions),
            ProfileOp::SetBudget { min, max } => ProfileMutation::SetBudget { min, max },
            ProfileOp::SetProjectTypes { values } => ProfileMutation::SetProjectTypes(values),
            ProfileOp::SetExperience { values } => ProfileMutation::SetExperienceLevels(values),
            ProfileOp::SetPayment { values } => ProfileMutation::SetPaymentTypes(values),
            ProfileOp::SetMode { mode } => ProfileMutation::SetNotificationMode(mode),
            ProfileOp::SetDigestTime { hour, minute } => {
                ProfileMutation::SetDigestTime { hour, minute }
            }
        };
        Some(m)
    }
}

fn print_profile(profile: &SubscriberProfile) -> Result<(), FrilansError> {
    let out = serde_json::to_string_pretty(profile)
        .map_err(|e| FrilansError::Internal(format!("failed to serialize profile: {e}")))?;
    println!("{out}");
    Ok(())
}

pub async fn run_profile(
    config: &FrilansConfig,
    user_id: i64,
    op: ProfileOp,
) -> Result<(), FrilansError> {
    let user_id = UserId(user_id);
    let store = open_store(config).await?;

    let result = match op.into_mutation() {
        None => store.get_profile(user_id).await,
        Some(mutation) => {
            let name = mutation.name();
            let applied = store.apply_profile_mutation(user_id, mutation).await;
            if applied.is_ok() {
                info!(%user_id, op = name, "profile updated");
            }
            applied.map(Some)
        }
    };
    store.close().await?;

    match result? {
        Some(profile) => print_profile(&profile),
        None => {
            println!("no profile for user {user_id}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_is_read_only() {
        assert!(ProfileOp::Show.into_mutation().is_none());
    }

    #[test]
    fn ops_map_onto_mutations() {
        let op = ProfileOp::SetPayment {
            values: vec![PaymentType::Escrow],
        };
        assert_eq!(
            op.into_mutation(),
            Some(ProfileMutation::SetPaymentTypes(vec![PaymentType::Escrow]))
        );
        let op = ProfileOp::AddExcluded {
            terms: vec!["wordpress".into()],
        };
        assert_eq!(op.into_mutation().map(|m| m.name()), Some("add_excluded_keywords"));
    }

    #[tokio::test]
    async fn invalid_mutation_is_reported_and_state_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FrilansConfig::default();
        config.storage.database_path = dir.path().join("p.db").to_string_lossy().into_owned();

        run_profile(
            &config,
            11,
            ProfileOp::AddKeywords {
                terms: vec!["Rust".into()],
            },
        )
        .await
        .unwrap();
        let err = run_profile(&config, 11, ProfileOp::SetDigestTime { hour: 25, minute: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, FrilansError::InvalidProfileMutation(_)));

        let store = open_store(&config).await.unwrap();
        let profile = store.get_profile(UserId(11)).await.unwrap().unwrap();
        assert!(profile.keywords.contains("rust"));
        assert_eq!(profile.digest_hour, config.digest.default_hour);
        store.close().await.unwrap();
    }
}
