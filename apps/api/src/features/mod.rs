//! Feature flags — role-independent switches that turn unfinished features into
//! "Coming Soon" placeholders.
//!
//! Loaded once at startup (defaults overridden by `FEATURE_<NAME>` env vars)
//! and immutable afterwards. Flags gate rendering, not data access.

pub mod handlers;

use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AiAssistant,
    ResumeBuilder,
    CoverLetterGenerator,
    SalaryEstimator,
    JobDescriptionGenerator,
    EmployerAnalytics,
    CompanyReviews,
    Messaging,
    InterviewPrep,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::AiAssistant,
        Feature::ResumeBuilder,
        Feature::CoverLetterGenerator,
        Feature::SalaryEstimator,
        Feature::JobDescriptionGenerator,
        Feature::EmployerAnalytics,
        Feature::CompanyReviews,
        Feature::Messaging,
        Feature::InterviewPrep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AiAssistant => "ai_assistant",
            Feature::ResumeBuilder => "resume_builder",
            Feature::CoverLetterGenerator => "cover_letter_generator",
            Feature::SalaryEstimator => "salary_estimator",
            Feature::JobDescriptionGenerator => "job_description_generator",
            Feature::EmployerAnalytics => "employer_analytics",
            Feature::CompanyReviews => "company_reviews",
            Feature::Messaging => "messaging",
            Feature::InterviewPrep => "interview_prep",
        }
    }

    /// `FEATURE_AI_ASSISTANT`, ...
    pub fn env_key(&self) -> String {
        format!("FEATURE_{}", self.as_str().to_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub ai_assistant: bool,
    pub resume_builder: bool,
    pub cover_letter_generator: bool,
    pub salary_estimator: bool,
    pub job_description_generator: bool,
    pub employer_analytics: bool,
    pub company_reviews: bool,
    pub messaging: bool,
    pub interview_prep: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ai_assistant: true,
            resume_builder: true,
            cover_letter_generator: true,
            salary_estimator: false,
            job_description_generator: true,
            employer_analytics: false,
            company_reviews: false,
            messaging: false,
            interview_prep: false,
        }
    }
}

impl FeatureFlags {
    /// Defaults with overrides from `lookup(env_key)`. Unparseable values are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut flags = Self::default();
        for feature in Feature::ALL {
            let key = feature.env_key();
            if let Some(raw) = lookup(&key) {
                flags.set(feature, parse_flag(&key, &raw)?);
            }
        }
        Ok(flags)
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::AiAssistant => self.ai_assistant,
            Feature::ResumeBuilder => self.resume_builder,
            Feature::CoverLetterGenerator => self.cover_letter_generator,
            Feature::SalaryEstimator => self.salary_estimator,
            Feature::JobDescriptionGenerator => self.job_description_generator,
            Feature::EmployerAnalytics => self.employer_analytics,
            Feature::CompanyReviews => self.company_reviews,
            Feature::Messaging => self.messaging,
            Feature::InterviewPrep => self.interview_prep,
        }
    }

    /// Name-based lookup. Unknown names are disabled.
    pub fn is_feature_enabled(&self, name: &str) -> bool {
        name.parse::<Feature>()
            .map(|f| self.is_enabled(f))
            .unwrap_or(false)
    }

    pub fn entries(&self) -> Vec<(Feature, bool)> {
        Feature::ALL
            .into_iter()
            .map(|f| (f, self.is_enabled(f)))
            .collect()
    }

    fn set(&mut self, feature: Feature, enabled: bool) {
        let slot = match feature {
            Feature::AiAssistant => &mut self.ai_assistant,
            Feature::ResumeBuilder => &mut self.resume_builder,
            Feature::CoverLetterGenerator => &mut self.cover_letter_generator,
            Feature::SalaryEstimator => &mut self.salary_estimator,
            Feature::JobDescriptionGenerator => &mut self.job_description_generator,
            Feature::EmployerAnalytics => &mut self.employer_analytics,
            Feature::CompanyReviews => &mut self.company_reviews,
            Feature::Messaging => &mut self.messaging,
            Feature::InterviewPrep => &mut self.interview_prep,
        };
        *slot = enabled;
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("{key} must be a boolean (true/false/1/0/on/off), got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let flags = FeatureFlags::from_lookup(lookup(&[])).unwrap();
        assert_eq!(flags, FeatureFlags::default());
    }

    #[test]
    fn test_env_overrides_apply() {
        let flags = FeatureFlags::from_lookup(lookup(&[
            ("FEATURE_MESSAGING", "on"),
            ("FEATURE_AI_ASSISTANT", "0"),
        ]))
        .unwrap();
        assert!(flags.is_enabled(Feature::Messaging));
        assert!(!flags.is_enabled(Feature::AiAssistant));
        assert!(flags.is_enabled(Feature::ResumeBuilder));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = FeatureFlags::from_lookup(lookup(&[("FEATURE_MESSAGING", "maybe")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("FEATURE_MESSAGING"));
    }

    #[test]
    fn test_is_feature_enabled_by_name() {
        let flags = FeatureFlags::default();
        assert!(flags.is_feature_enabled("ai_assistant"));
        assert!(!flags.is_feature_enabled("salary_estimator"));
        assert!(!flags.is_feature_enabled("time_travel"));
    }

    #[test]
    fn test_entries_list_every_feature_once() {
        let entries = FeatureFlags::default().entries();
        assert_eq!(entries.len(), Feature::ALL.len());
        for feature in Feature::ALL {
            assert_eq!(entries.iter().filter(|(f, _)| *f == feature).count(), 1);
        }
    }

    #[test]
    fn test_parse_feature_names() {
        assert_eq!(" messaging ".parse::<Feature>(), Ok(Feature::Messaging));
        assert_eq!(
            "time_travel".parse::<Feature>(),
            Err(UnknownFeature("time_travel".to_string()))
        );
    }

    #[test]
    fn test_env_keys() {
        assert_eq!(Feature::SalaryEstimator.env_key(), "FEATURE_SALARY_ESTIMATOR");
    }
}
