//! Role Detector — infers a role for signed-in users with no explicit role.
//!
//! Detection is total: every path ends in a `Role`. Activity-signal failures
//! are logged and collapse to the default role.

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::session::Session;
use crate::roles::permissions::Role;
use crate::roles::RoleError;

/// A boolean check of past user behaviour used as a detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PostedJobs,
    SavedJobs,
}

impl ActivitySignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySignal::PostedJobs => "posted_jobs",
            ActivitySignal::SavedJobs => "saved_jobs",
        }
    }
}

/// Source of activity signals. Carried in `AppState` as `Arc<dyn ActivitySignals>`.
#[async_trait]
pub trait ActivitySignals: Send + Sync {
    async fn has_activity(&self, user_id: Uuid, signal: ActivitySignal)
        -> Result<bool, RoleError>;
}

/// Always answers `false`. No backend exposes job-posting or saved-job history
/// yet, so with this source unassigned users always resolve to `JobSeeker`.
pub struct StubActivitySignals;

#[async_trait]
impl ActivitySignals for StubActivitySignals {
    async fn has_activity(
        &self,
        user_id: Uuid,
        signal: ActivitySignal,
    ) -> Result<bool, RoleError> {
        debug!("Activity check {} for {user_id}: stubbed to false", signal.as_str());
        Ok(false)
    }
}

/// Resolves the role for a session.
///
/// - unauthenticated → `JobSeeker`, signals untouched
/// - explicit role on the account → that role, signals untouched
/// - otherwise → posted + saved → `Dual`, posted only → `Employer`, else `JobSeeker`
pub async fn detect_role(session: &Session, signals: &dyn ActivitySignals) -> Role {
    let user = match session {
        Session::Unauthenticated => return Role::default(),
        Session::Assigned { role, .. } => return *role,
        Session::Unassigned { user } => user,
    };

    match infer_from_activity(user.id, signals).await {
        Ok(role) => {
            debug!("Detected role {role} for {}", user.id);
            role
        }
        Err(e) => {
            warn!("Role detection failed for {}, defaulting to job_seeker: {e}", user.id);
            Role::default()
        }
    }
}

async fn infer_from_activity(
    user_id: Uuid,
    signals: &dyn ActivitySignals,
) -> Result<Role, RoleError> {
    let (posted, saved) = tokio::try_join!(
        signals.has_activity(user_id, ActivitySignal::PostedJobs),
        signals.has_activity(user_id, ActivitySignal::SavedJobs),
    )?;

    Ok(match (posted, saved) {
        (true, true) => Role::Dual,
        (true, false) => Role::Employer,
        _ => Role::JobSeeker,
    })
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeSignals;
    use super::*;
    use crate::models::session::test_user;

    #[tokio::test]
    async fn test_unauthenticated_is_job_seeker_without_signals() {
        let signals = FakeSignals::answering(true, true);
        let role = detect_role(&Session::Unauthenticated, &signals).await;
        assert_eq!(role, Role::JobSeeker);
        assert_eq!(signals.call_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_role_skips_signals() {
        let signals = FakeSignals::answering(false, false);
        let session = Session::new(test_user(), Some(Role::Employer));
        assert_eq!(detect_role(&session, &signals).await, Role::Employer);
        assert_eq!(signals.call_count(), 0);
    }

    #[tokio::test]
    async fn test_signal_combinations() {
        let cases = [
            (true, true, Role::Dual),
            (true, false, Role::Employer),
            (false, true, Role::JobSeeker),
            (false, false, Role::JobSeeker),
        ];
        for (posted, saved, expected) in cases {
            let signals = FakeSignals::answering(posted, saved);
            let session = Session::new(test_user(), None);
            assert_eq!(
                detect_role(&session, &signals).await,
                expected,
                "posted={posted} saved={saved}"
            );
            assert_eq!(signals.call_count(), 2);
        }
    }

    #[tokio::test]
    async fn test_signal_failure_falls_back_to_job_seeker() {
        let signals = FakeSignals::failing();
        let session = Session::new(test_user(), None);
        assert_eq!(detect_role(&session, &signals).await, Role::JobSeeker);
    }

    #[tokio::test]
    async fn test_stub_signals_resolve_job_seeker() {
        let session = Session::new(test_user(), None);
        assert_eq!(
            detect_role(&session, &StubActivitySignals).await,
            Role::JobSeeker
        );
    }
}
