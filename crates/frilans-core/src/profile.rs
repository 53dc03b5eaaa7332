// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit, validated updates to a [`SubscriberProfile`].
//!
//! The command layer expresses every profile change as a single
//! [`ProfileMutation`]. A mutation is validated in full before any field
//! changes, so a rejected mutation leaves the profile exactly as it was.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FrilansError;
use crate::types::{
    ExperienceLevel, NotificationMode, PaymentType, ProjectType, SubscriberProfile,
};

/// One atomic change to one field or set of a subscriber profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ProfileMutation {
    Subscribe,
    Unsubscribe,
    AddKeywords(Vec<String>),
    RemoveKeywords(Vec<String>),
    AddExcludedKeywords(Vec<String>),
    RemoveExcludedKeywords(Vec<String>),
    AddTechnologies(Vec<String>),
    RemoveTechnologies(Vec<String>),
    /// Replaces the region set; an empty list accepts any region.
    SetRegions(Vec<String>),
    SetBudget {
        min: Option<f64>,
        max: Option<f64>,
    },
    SetProjectTypes(Vec<ProjectType>),
    SetExperienceLevels(Vec<ExperienceLevel>),
    SetPaymentTypes(Vec<PaymentType>),
    SetNotificationMode(NotificationMode),
    SetDigestTime {
        hour: u8,
        minute: u8,
    },
}

impl ProfileMutation {
    /// Short operation name for logs and command replies.
    pub fn name(&self) -> &'static str {
        match self {
            ProfileMutation::Subscribe => "subscribe",
            ProfileMutation::Unsubscribe => "unsubscribe",
            ProfileMutation::AddKeywords(_) => "add_keywords",
            ProfileMutation::RemoveKeywords(_) => "remove_keywords",
            ProfileMutation::AddExcludedKeywords(_) => "add_excluded_keywords",
            ProfileMutation::RemoveExcludedKeywords(_) => "remove_excluded_keywords",
            ProfileMutation::AddTechnologies(_) => "add_technologies",
            ProfileMutation::RemoveTechnologies(_) => "remove_technologies",
            ProfileMutation::SetRegions(_) => "set_regions",
            ProfileMutation::SetBudget { .. } => "set_budget",
            ProfileMutation::SetProjectTypes(_) => "set_project_types",
            ProfileMutation::SetExperienceLevels(_) => "set_experience_levels",
            ProfileMutation::SetPaymentTypes(_) => "set_payment_types",
            ProfileMutation::SetNotificationMode(_) => "set_notification_mode",
            ProfileMutation::SetDigestTime { .. } => "set_digest_time",
        }
    }
}

impl SubscriberProfile {
    /// Validate and apply a mutation, bumping `updated_at` on success.
    pub fn apply(
        &mut self,
        mutation: ProfileMutation,
        now: DateTime<Utc>,
    ) -> Result<(), FrilansError> {
        match mutation {
            ProfileMutation::Subscribe => self.subscribed = true,
            ProfileMutation::Unsubscribe => self.subscribed = false,
            ProfileMutation::AddKeywords(terms) => {
                self.keywords.extend(normalize_terms(terms, "keyword")?);
            }
            ProfileMutation::RemoveKeywords(terms) => {
                remove_terms(&mut self.keywords, normalize_terms(terms, "keyword")?);
            }
            ProfileMutation::AddExcludedKeywords(terms) => {
                self.excluded_keywords
                    .extend(normalize_terms(terms, "excluded keyword")?);
            }
            ProfileMutation::RemoveExcludedKeywords(terms) => {
                remove_terms(
                    &mut self.excluded_keywords,
                    normalize_terms(terms, "excluded keyword")?,
                );
            }
            ProfileMutation::AddTechnologies(terms) => {
                self.technologies
                    .extend(normalize_terms(terms, "technology")?);
            }
            ProfileMutation::RemoveTechnologies(terms) => {
                remove_terms(&mut self.technologies, normalize_terms(terms, "technology")?);
            }
            ProfileMutation::SetRegions(regions) => {
                self.regions = if regions.is_empty() {
                    BTreeSet::new()
                } else {
                    normalize_terms(regions, "region")?
                };
            }
            ProfileMutation::SetBudget { min, max } => {
                validate_budget(min, max)?;
                self.budget_min = min;
                self.budget_max = max;
            }
            ProfileMutation::SetProjectTypes(types) => {
                self.project_types = explicit_set(types, ProjectType::Unspecified, "project type")?;
            }
            ProfileMutation::SetExperienceLevels(levels) => {
                self.experience_levels =
                    explicit_set(levels, ExperienceLevel::Unspecified, "experience level")?;
            }
            ProfileMutation::SetPaymentTypes(types) => {
                self.payment_types = explicit_set(types, PaymentType::Unspecified, "payment type")?;
            }
            ProfileMutation::SetNotificationMode(mode) => self.notification_mode = mode,
            ProfileMutation::SetDigestTime { hour, minute } => {
                if hour >= 24 || minute >= 60 {
                    return Err(FrilansError::InvalidProfileMutation(format!(
                        "digest time {hour:02}:{minute:02} is not a valid time of day"
                    )));
                }
                self.digest_hour = hour;
                self.digest_minute = minute;
            }
        }
        self.updated_at = now;
        Ok(())
    }
}

fn normalize_terms(terms: Vec<String>, what: &str) -> Result<BTreeSet<String>, FrilansError> {
    if terms.is_empty() {
        return Err(FrilansError::InvalidProfileMutation(format!(
            "at least one {what} is required"
        )));
    }
    terms
        .into_iter()
        .map(|term| {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                Err(FrilansError::InvalidProfileMutation(format!(
                    "{what} must not be blank"
                )))
            } else {
                Ok(term)
            }
        })
        .collect()
}

fn remove_terms(set: &mut BTreeSet<String>, terms: BTreeSet<String>) {
    set.retain(|existing| !terms.contains(existing));
}

fn validate_budget(min: Option<f64>, max: Option<f64>) -> Result<(), FrilansError> {
    for bound in [min, max].into_iter().flatten() {
        if !bound.is_finite() || bound < 0.0 {
            return Err(FrilansError::InvalidProfileMutation(format!(
                "budget bound {bound} must be a non-negative number"
            )));
        }
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(FrilansError::InvalidProfileMutation(format!(
            "budget minimum {lo} exceeds maximum {hi}"
        )));
    }
    Ok(())
}

// "unspecified" is always accepted by the filter, so listing it explicitly is meaningless.
fn explicit_set<T: Ord + Copy + std::fmt::Display>(
    values: Vec<T>,
    unspecified: T,
    what: &str,
) -> Result<BTreeSet<T>, FrilansError> {
    if values.contains(&unspecified) {
        return Err(FrilansError::InvalidProfileMutation(format!(
            "`{unspecified}` cannot be used as a {what} filter"
        )));
    }
    Ok(values.into_iter().collect())
}
