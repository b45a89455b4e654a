//! Role-based access checks and session authentication
//!
//! The dashboard gates whole views on the session role. The check is a
//! plain capability function evaluated before rendering or handling any
//! protected view; callers decide what to show when it fails.

use crate::domain::types::{AccessRole, Session};
use crate::infra::config::Account;
use tracing::{info, warn};

/// A protected dashboard area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Dashboard,
    LiveFeed,
    Attendance,
    Roster,
    Settings,
    Security,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Dashboard => "dashboard",
            Resource::LiveFeed => "live_feed",
            Resource::Attendance => "attendance",
            Resource::Roster => "roster",
            Resource::Settings => "settings",
            Resource::Security => "security",
        }
    }
}

/// Whether `role` may use `resource`.
///
/// Admins see everything; operators see the monitoring views only.
pub fn has_access(role: AccessRole, resource: Resource) -> bool {
    match role {
        AccessRole::Admin => true,
        AccessRole::Operator => matches!(
            resource,
            Resource::Dashboard | Resource::LiveFeed | Resource::Attendance
        ),
    }
}

/// Check credentials against the configured accounts.
///
/// Plain string comparison, as the system this replaces did. Returns the
/// session on success and logs the attempt either way.
pub fn authenticate(username: &str, password: &str, accounts: &[Account]) -> Option<Session> {
    let matched = accounts
        .iter()
        .find(|account| account.username == username && account.password == password);

    match matched {
        Some(account) => {
            info!(username = %username, role = %account.role.as_str(), "login_succeeded");
            Some(Session { name: account.display_name.clone(), role: account.role })
        }
        None => {
            warn!(username = %username, "login_failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::Config;

    const ALL_RESOURCES: [Resource; 6] = [
        Resource::Dashboard,
        Resource::LiveFeed,
        Resource::Attendance,
        Resource::Roster,
        Resource::Settings,
        Resource::Security,
    ];

    #[test]
    fn test_admin_has_full_access() {
        for resource in ALL_RESOURCES {
            assert!(has_access(AccessRole::Admin, resource), "{:?}", resource);
        }
    }

    #[test]
    fn test_operator_access_matrix() {
        assert!(has_access(AccessRole::Operator, Resource::Dashboard));
        assert!(has_access(AccessRole::Operator, Resource::LiveFeed));
        assert!(has_access(AccessRole::Operator, Resource::Attendance));
        assert!(!has_access(AccessRole::Operator, Resource::Roster));
        assert!(!has_access(AccessRole::Operator, Resource::Settings));
        assert!(!has_access(AccessRole::Operator, Resource::Security));
    }

    #[test]
    fn test_authenticate_default_accounts() {
        let config = Config::default();

        let admin = authenticate("admin", "admin123", config.accounts()).unwrap();
        assert_eq!(admin.role, AccessRole::Admin);

        let operator = authenticate("operator", "op123", config.accounts()).unwrap();
        assert_eq!(operator.role, AccessRole::Operator);
    }

    #[test]
    fn test_authenticate_rejects_bad_credentials() {
        let config = Config::default();

        assert!(authenticate("admin", "wrong", config.accounts()).is_none());
        assert!(authenticate("nobody", "admin123", config.accounts()).is_none());
        assert!(authenticate("", "", config.accounts()).is_none());
    }
}
