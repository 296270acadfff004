//! Page-level access guard over the resolved session.
//!
//! Pages are addressed by path. A user may open a page when one of their
//! `allowed_pages` entries is the page itself or one of its parent paths, so
//! `/tenders` grants `/tenders/42/boq` but not `/tenders-archive`.

use serde::Serialize;

use super::models::{AppUser, ReconciliationState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Session not resolved yet; render a loading state.
    Pending,
    Allow,
    RedirectToLogin,
    Forbidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub path: String,
    pub title: String,
}

impl NavItem {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessGuard {
    public_pages: Vec<String>,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new(["/login"])
    }
}

impl AccessGuard {
    pub fn new<I, S>(public_pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_pages: public_pages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(&self, state: &ReconciliationState, page: &str) -> AccessDecision {
        if self.public_pages.iter().any(|public| covers(public, page)) {
            return AccessDecision::Allow;
        }
        match state {
            ReconciliationState::Uninitialized | ReconciliationState::Resolving => {
                AccessDecision::Pending
            }
            ReconciliationState::Resolved(None) => AccessDecision::RedirectToLogin,
            ReconciliationState::Resolved(Some(user)) if can_open(user, page) => {
                AccessDecision::Allow
            }
            ReconciliationState::Resolved(Some(_)) => AccessDecision::Forbidden,
        }
    }

    /// Navigation entries the user may open, in their original order.
    pub fn visible_pages<'a>(&self, user: &AppUser, nav: &'a [NavItem]) -> Vec<&'a NavItem> {
        nav.iter()
            .filter(|item| {
                self.public_pages.iter().any(|public| covers(public, &item.path))
                    || can_open(user, &item.path)
            })
            .collect()
    }
}

fn can_open(user: &AppUser, page: &str) -> bool {
    user.allowed_pages.iter().any(|allowed| covers(allowed, page))
}

fn covers(allowed: &str, page: &str) -> bool {
    let allowed = allowed.trim_end_matches('/');
    if allowed.is_empty() {
        // "/" grants everything
        return true;
    }
    match page.strip_prefix(allowed) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::UserRow;

    fn user_with(pages: &[&str]) -> AppUser {
        let mut row = UserRow::approved("u1", "u1@example.com");
        row.allowed_pages = Some(pages.iter().map(|p| p.to_string()).collect());
        AppUser::from_row(row)
    }

    #[test]
    fn unresolved_session_is_pending() {
        let guard = AccessGuard::default();
        assert_eq!(
            guard.check(&ReconciliationState::Resolving, "/tenders"),
            AccessDecision::Pending
        );
        assert_eq!(
            guard.check(&ReconciliationState::Uninitialized, "/tenders"),
            AccessDecision::Pending
        );
    }

    #[test]
    fn no_user_redirects_except_on_public_pages() {
        let guard = AccessGuard::default();
        let state = ReconciliationState::Resolved(None);
        assert_eq!(guard.check(&state, "/tenders"), AccessDecision::RedirectToLogin);
        assert_eq!(guard.check(&state, "/login"), AccessDecision::Allow);
    }

    #[test]
    fn allowed_pages_match_by_path_segment() {
        let guard = AccessGuard::default();
        let state = ReconciliationState::Resolved(Some(user_with(&["/tenders", "/boq/"])));
        assert_eq!(guard.check(&state, "/tenders"), AccessDecision::Allow);
        assert_eq!(guard.check(&state, "/tenders/42/boq"), AccessDecision::Allow);
        assert_eq!(guard.check(&state, "/boq"), AccessDecision::Allow);
        assert_eq!(guard.check(&state, "/tenders-archive"), AccessDecision::Forbidden);
        assert_eq!(guard.check(&state, "/admin/users"), AccessDecision::Forbidden);
    }

    #[test]
    fn user_without_pages_sees_only_public_navigation() {
        let guard = AccessGuard::default();
        let nav = vec![
            NavItem::new("/login", "Sign in"),
            NavItem::new("/tenders", "Tenders"),
            NavItem::new("/admin/users", "Users"),
        ];
        let visible = guard.visible_pages(&user_with(&[]), &nav);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].path, "/login");

        let visible = guard.visible_pages(&user_with(&["/tenders"]), &nav);
        let paths: Vec<_> = visible.iter().map(|item| item.path.as_str()).collect();
        assert_eq!(paths, vec!["/login", "/tenders"]);
    }

    #[test]
    fn root_grants_everything() {
        let guard = AccessGuard::new(Vec::<String>::new());
        let state = ReconciliationState::Resolved(Some(user_with(&["/"])));
        assert_eq!(guard.check(&state, "/admin/users"), AccessDecision::Allow);
    }
}
