//! Role → permission table.
//!
//! Permissions are a pure function of the role. Nothing in the service sets a
//! capability flag independently; every `Permissions` value in flight was
//! produced by `get_permissions`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Role
// ────────────────────────────────────────────────────────────────────────────

/// Coarse-grained identity used to gate features. Exactly one is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    JobSeeker,
    Employer,
    Dual,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::JobSeeker, Role::Employer, Role::Dual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
            Role::Dual => "dual",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}' (expected job_seeker, employer or dual)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "job_seeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            "dual" => Ok(Role::Dual),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Capabilities
// ────────────────────────────────────────────────────────────────────────────

/// One boolean flag of the permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    BrowseJobs,
    PostJobs,
    SaveJobs,
    ManageApplications,
    ViewAnalytics,
    AccessAiTools,
    SwitchViews,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::BrowseJobs,
        Capability::PostJobs,
        Capability::SaveJobs,
        Capability::ManageApplications,
        Capability::ViewAnalytics,
        Capability::AccessAiTools,
        Capability::SwitchViews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::BrowseJobs => "browse_jobs",
            Capability::PostJobs => "post_jobs",
            Capability::SaveJobs => "save_jobs",
            Capability::ManageApplications => "manage_applications",
            Capability::ViewAnalytics => "view_analytics",
            Capability::AccessAiTools => "access_ai_tools",
            Capability::SwitchViews => "switch_views",
        }
    }

    /// The flag name the frontend uses (`canBrowseJobs`, ...).
    pub fn flag_name(&self) -> &'static str {
        match self {
            Capability::BrowseJobs => "canBrowseJobs",
            Capability::PostJobs => "canPostJobs",
            Capability::SaveJobs => "canSaveJobs",
            Capability::ManageApplications => "canManageApplications",
            Capability::ViewAnalytics => "canViewAnalytics",
            Capability::AccessAiTools => "canAccessAITools",
            Capability::SwitchViews => "canSwitchViews",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    /// Accepts both `browse_jobs` and `canBrowseJobs` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.flag_name() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Permission record
// ────────────────────────────────────────────────────────────────────────────

/// Fully-populated permission record. Derived from a `Role`, never edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_browse_jobs: bool,
    pub can_post_jobs: bool,
    pub can_save_jobs: bool,
    pub can_manage_applications: bool,
    pub can_view_analytics: bool,
    #[serde(rename = "canAccessAITools")]
    pub can_access_ai_tools: bool,
    pub can_switch_views: bool,
}

impl Permissions {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::BrowseJobs => self.can_browse_jobs,
            Capability::PostJobs => self.can_post_jobs,
            Capability::SaveJobs => self.can_save_jobs,
            Capability::ManageApplications => self.can_manage_applications,
            Capability::ViewAnalytics => self.can_view_analytics,
            Capability::AccessAiTools => self.can_access_ai_tools,
            Capability::SwitchViews => self.can_switch_views,
        }
    }

    pub fn granted(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.allows(*c))
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        get_permissions(Role::default())
    }
}

/// Maps a role to its permission record.
///
/// Job seekers and employers are disjoint on the job-listing side: a job seeker
/// cannot post, an employer cannot browse or save. `Dual` holds every flag,
/// including view switching which neither single role has.
pub fn get_permissions(role: Role) -> Permissions {
    match role {
        Role::JobSeeker => Permissions {
            can_browse_jobs: true,
            can_post_jobs: false,
            can_save_jobs: true,
            can_manage_applications: false,
            can_view_analytics: false,
            can_access_ai_tools: true,
            can_switch_views: false,
        },
        Role::Employer => Permissions {
            can_browse_jobs: false,
            can_post_jobs: true,
            can_save_jobs: false,
            can_manage_applications: true,
            can_view_analytics: true,
            can_access_ai_tools: true,
            can_switch_views: false,
        },
        Role::Dual => Permissions {
            can_browse_jobs: true,
            can_post_jobs: true,
            can_save_jobs: true,
            can_manage_applications: true,
            can_view_analytics: true,
            can_access_ai_tools: true,
            can_switch_views: true,
        },
    }
}
