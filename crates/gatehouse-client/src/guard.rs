//! Route guard for client views
//!
//! The guard is advisory; access control is enforced by the server.

use crate::session::SessionState;
use tokio::sync::watch;

/// Where unauthenticated visitors to protected views are sent
pub const LOGIN_PATH: &str = "/login";

/// Result of resolving a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Render the view at this path
    Render(String),
    /// Go here instead
    Redirect(String),
}

impl Navigation {
    pub fn path(&self) -> &str {
        match self {
            Navigation::Render(path) | Navigation::Redirect(path) => path,
        }
    }
}

/// Set of protected path prefixes
#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(["/", "/chat"])
    }
}

impl RouteGuard {
    pub fn new<I, S>(protected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// `/` only protects the root itself; other prefixes cover their subtree
    pub fn is_protected(&self, path: &str) -> bool {
        let path = normalize(path);
        self.protected.iter().any(|prefix| {
            let prefix = normalize(prefix);
            if prefix == "/" {
                return path == "/";
            }
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn resolve(&self, path: &str, state: &SessionState) -> Navigation {
        if self.is_protected(path) && !state.is_authenticated {
            Navigation::Redirect(LOGIN_PATH.to_string())
        } else {
            Navigation::Render(path.to_string())
        }
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.split(['?', '#']).next().unwrap_or(path);
    match trimmed.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}

/// Resolves each navigation against the latest session state
pub struct Navigator {
    guard: RouteGuard,
    session: watch::Receiver<SessionState>,
    location: String,
}

impl Navigator {
    pub fn new(guard: RouteGuard, session: watch::Receiver<SessionState>) -> Self {
        Self {
            guard,
            session,
            location: LOGIN_PATH.to_string(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn navigate(&mut self, path: &str) -> Navigation {
        let navigation = self.guard.resolve(path, &self.session.borrow_and_update());
        if let Navigation::Redirect(to) = &navigation {
            tracing::debug!(from = %path, to = %to, "Navigation redirected");
        }
        self.location = navigation.path().to_string();
        navigation
    }

    /// Wait for the next session change and re-check the current location
    ///
    /// Returns `None` once the session has been dropped.
    pub async fn changed(&mut self) -> Option<Navigation> {
        self.session.changed().await.ok()?;
        let location = self.location.clone();
        Some(self.navigate(&location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{summary, FakeApi};
    use crate::session::Session;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn signed_in() -> SessionState {
        SessionState {
            user: Some(summary("jane@example.com")),
            is_authenticated: true,
        }
    }

    #[test]
    fn test_protected_paths() {
        let guard = RouteGuard::default();
        assert!(guard.is_protected("/"));
        assert!(guard.is_protected("/chat"));
        assert!(guard.is_protected("/chat/42?draft=1"));
        assert!(guard.is_protected("/chat/"));
        assert!(!guard.is_protected("/chatter"));
        assert!(!guard.is_protected("/login"));
        assert!(!guard.is_protected("/register"));
    }

    #[test]
    fn test_resolve() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.resolve("/chat", &SessionState::default()),
            Navigation::Redirect(LOGIN_PATH.to_string())
        );
        assert_eq!(
            guard.resolve("/chat", &signed_in()),
            Navigation::Render("/chat".to_string())
        );
        assert_eq!(
            guard.resolve("/register", &SessionState::default()),
            Navigation::Render("/register".to_string())
        );
    }

    #[tokio::test]
    async fn test_logout_then_protected_view_redirects() {
        let api = Arc::new(FakeApi {
            password: "SecurePass456!",
        });
        let mut session = Session::restore(api, Arc::new(MemoryStorage::new())).unwrap();
        let mut navigator = Navigator::new(RouteGuard::default(), session.subscribe());

        assert_eq!(
            navigator.navigate("/chat"),
            Navigation::Redirect(LOGIN_PATH.to_string())
        );

        session
            .login("jane@example.com", "SecurePass456!")
            .await
            .unwrap();
        assert_eq!(
            navigator.navigate("/chat"),
            Navigation::Render("/chat".to_string())
        );

        session.logout().unwrap();
        assert_eq!(
            navigator.navigate("/chat"),
            Navigation::Redirect(LOGIN_PATH.to_string())
        );
        assert_eq!(navigator.location(), LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_session_change_reevaluates_location() {
        let (tx, rx) = watch::channel(signed_in());
        let mut navigator = Navigator::new(RouteGuard::default(), rx);
        navigator.navigate("/chat");

        tx.send_replace(SessionState::default());
        assert_eq!(
            navigator.changed().await,
            Some(Navigation::Redirect(LOGIN_PATH.to_string()))
        );

        drop(tx);
        assert_eq!(navigator.changed().await, None);
    }
}
