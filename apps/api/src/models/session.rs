use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::permissions::Role;

/// Identity data handed over by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// What the service knows about the caller.
///
/// The role store only ever reads this; it is owned by the auth boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Unauthenticated,
    /// Signed in, with a role set explicitly on the account.
    Assigned { user: User, role: Role },
    /// Signed in, no role on the account; the detector infers one.
    Unassigned { user: User },
}

impl Session {
    pub fn new(user: User, role: Option<Role>) -> Self {
        match role {
            Some(role) => Session::Assigned { user, role },
            None => Session::Unassigned { user },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Session::Unauthenticated)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Unauthenticated => None,
            Session::Assigned { user, .. } | Session::Unassigned { user } => Some(user),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }

    pub fn explicit_role(&self) -> Option<Role> {
        match self {
            Session::Assigned { role, .. } => Some(*role),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "casey@example.com".to_string(),
        display_name: Some("Casey".to_string()),
        email_verified: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_picks_variant_from_role() {
        let user = test_user();
        assert!(matches!(
            Session::new(user.clone(), Some(Role::Employer)),
            Session::Assigned {
                role: Role::Employer,
                ..
            }
        ));
        assert!(matches!(
            Session::new(user, None),
            Session::Unassigned { .. }
        ));
    }

    #[test]
    fn test_unauthenticated_has_no_user() {
        let session = Session::Unauthenticated;
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.explicit_role().is_none());
    }

    #[test]
    fn test_explicit_role_only_for_assigned() {
        let user = test_user();
        assert_eq!(
            Session::new(user.clone(), Some(Role::Dual)).explicit_role(),
            Some(Role::Dual)
        );
        assert_eq!(Session::new(user, None).explicit_role(), None);
    }
}
