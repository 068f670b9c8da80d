//! View composition — which navigation entries a session sees and whether each
//! one is usable.
//!
//! Two independent gates, evaluated per request:
//! 1. role gate: the entry's capability must be granted, otherwise it is hidden;
//! 2. flag gate: a visible entry whose feature is switched off is shown as
//!    "Coming Soon" instead of a live link.

pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureFlags};
use crate::roles::permissions::{Capability, Permissions};

#[derive(Debug, Clone, Copy)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: &'static str,
    pub capability: Capability,
    pub feature: Option<Feature>,
}

pub const NAV_ENTRIES: &[NavEntry] = &[
    NavEntry {
        label: "Browse Jobs",
        path: "/jobs",
        capability: Capability::BrowseJobs,
        feature: None,
    },
    NavEntry {
        label: "Saved Jobs",
        path: "/saved-jobs",
        capability: Capability::SaveJobs,
        feature: None,
    },
    NavEntry {
        label: "Company Reviews",
        path: "/companies",
        capability: Capability::BrowseJobs,
        feature: Some(Feature::CompanyReviews),
    },
    NavEntry {
        label: "Post a Job",
        path: "/employer/post-job",
        capability: Capability::PostJobs,
        feature: None,
    },
    NavEntry {
        label: "Applicants",
        path: "/employer/applicants",
        capability: Capability::ManageApplications,
        feature: None,
    },
    NavEntry {
        label: "Analytics",
        path: "/employer/analytics",
        capability: Capability::ViewAnalytics,
        feature: Some(Feature::EmployerAnalytics),
    },
    NavEntry {
        label: "AI Assistant",
        path: "/ai-assistant",
        capability: Capability::AccessAiTools,
        feature: Some(Feature::AiAssistant),
    },
    NavEntry {
        label: "Resume Builder",
        path: "/ai-assistant/resume",
        capability: Capability::AccessAiTools,
        feature: Some(Feature::ResumeBuilder),
    },
    NavEntry {
        label: "Cover Letters",
        path: "/ai-assistant/cover-letter",
        capability: Capability::SaveJobs,
        feature: Some(Feature::CoverLetterGenerator),
    },
    NavEntry {
        label: "Interview Prep",
        path: "/ai-assistant/interview-prep",
        capability: Capability::SaveJobs,
        feature: Some(Feature::InterviewPrep),
    },
    NavEntry {
        label: "Salary Estimator",
        path: "/ai-assistant/salary",
        capability: Capability::AccessAiTools,
        feature: Some(Feature::SalaryEstimator),
    },
    NavEntry {
        label: "Job Description Writer",
        path: "/ai-assistant/job-description",
        capability: Capability::PostJobs,
        feature: Some(Feature::JobDescriptionGenerator),
    },
    NavEntry {
        label: "Messages",
        path: "/messages",
        capability: Capability::BrowseJobs,
        feature: Some(Feature::Messaging),
    },
    NavEntry {
        label: "Switch View",
        path: "/account/switch-view",
        capability: Capability::SwitchViews,
        feature: None,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Hidden,
    ComingSoon,
    Enabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub access: Access,
}

/// Evaluates both gates for one capability/feature pair.
pub fn feature_access(
    permissions: &Permissions,
    flags: &FeatureFlags,
    capability: Capability,
    feature: Option<Feature>,
) -> Access {
    if !permissions.allows(capability) {
        return Access::Hidden;
    }
    match feature {
        Some(f) if !flags.is_enabled(f) => Access::ComingSoon,
        _ => Access::Enabled,
    }
}

/// Visible navigation, in table order. Hidden entries are omitted.
pub fn compose_navigation(permissions: &Permissions, flags: &FeatureFlags) -> Vec<NavItem> {
    NAV_ENTRIES
        .iter()
        .filter_map(|entry| {
            match feature_access(permissions, flags, entry.capability, entry.feature) {
                Access::Hidden => None,
                access => Some(NavItem {
                    label: entry.label,
                    path: entry.path,
                    access,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::permissions::{get_permissions, Role};

    fn paths(items: &[NavItem]) -> Vec<&'static str> {
        items.iter().map(|i| i.path).collect()
    }

    #[test]
    fn test_job_seeker_never_sees_employer_entries() {
        let nav =
            compose_navigation(&get_permissions(Role::JobSeeker), &FeatureFlags::default());
        let paths = paths(&nav);
        assert!(paths.contains(&"/jobs"));
        assert!(!paths.iter().any(|p| p.starts_with("/employer")));
        assert!(!paths.contains(&"/account/switch-view"));
    }

    #[test]
    fn test_employer_never_sees_listing_entries() {
        let nav =
            compose_navigation(&get_permissions(Role::Employer), &FeatureFlags::default());
        let paths = paths(&nav);
        assert!(paths.contains(&"/employer/post-job"));
        assert!(!paths.contains(&"/jobs"));
        assert!(!paths.contains(&"/saved-jobs"));
    }

    #[test]
    fn test_dual_sees_every_entry() {
        let nav = compose_navigation(&get_permissions(Role::Dual), &FeatureFlags::default());
        assert_eq!(nav.len(), NAV_ENTRIES.len());
    }

    #[test]
    fn test_disabled_flag_renders_coming_soon() {
        let employer = get_permissions(Role::Employer);
        let access = |flags: &FeatureFlags| {
            compose_navigation(&employer, flags)
                .into_iter()
                .find(|i| i.path == "/employer/analytics")
                .map(|i| i.access)
        };

        let enabled = FeatureFlags {
            employer_analytics: true,
            ..FeatureFlags::default()
        };
        assert_eq!(access(&enabled), Some(Access::Enabled));

        let disabled = FeatureFlags {
            employer_analytics: false,
            ..enabled
        };
        assert_eq!(access(&disabled), Some(Access::ComingSoon));
    }

    fn analytics(permissions: &Permissions, flags: &FeatureFlags) -> Access {
        feature_access(
            permissions,
            flags,
            Capability::ViewAnalytics,
            Some(Feature::EmployerAnalytics),
        )
    }

    #[test]
    fn test_gates_are_orthogonal() {
        let seeker = get_permissions(Role::JobSeeker);
        let on = FeatureFlags {
            employer_analytics: true,
            ..FeatureFlags::default()
        };
        let off = FeatureFlags {
            employer_analytics: false,
            ..FeatureFlags::default()
        };

        // Flag on does not reveal a role-gated entry.
        assert_eq!(analytics(&seeker, &on), Access::Hidden);
        assert_eq!(analytics(&seeker, &off), Access::Hidden);

        let employer = get_permissions(Role::Employer);
        assert_eq!(analytics(&employer, &on), Access::Enabled);
        assert_eq!(analytics(&employer, &off), Access::ComingSoon);
    }

    #[test]
    fn test_ungated_entries_are_always_enabled_when_visible() {
        let nav =
            compose_navigation(&get_permissions(Role::JobSeeker), &FeatureFlags::default());
        let browse = nav.iter().find(|i| i.path == "/jobs").unwrap();
        assert_eq!(browse.access, Access::Enabled);
    }
}
