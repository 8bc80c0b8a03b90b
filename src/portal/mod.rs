//! Page-mount flow.
//!
//! A protected page mounts in two steps. First the session guard runs, and a
//! failed check ends the page with a redirect before any request is made.
//! Then the role's resources are fetched through the gateway inside the
//! page's [`PageScope`].

mod scope;

use serde::Serialize;

use crate::assistant::{ChatSession, HttpCompletionProvider};
use crate::config::PortalConfig;
use crate::error::ApiError;
use crate::gateway::{ApiClient, LawyerSummary, Profile};
use crate::records::{CaseRecord, Dispute, Document, Record, Reminder, Report};
use crate::session::{Access, RedirectReason, Role, Session, SessionGuard};
use crate::store::{LocalStorage, RecordCollection, keys};

pub use scope::{Cancelled, PageScope};

/// Data behind a role's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub role: Role,
    pub profile: Profile,
    pub cases: Vec<CaseRecord>,
    /// Lawyer directory; only fetched for citizens.
    pub lawyers: Vec<LawyerSummary>,
}

/// Shown in place of page content when a fetch fails. Retrying means
/// mounting the page again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub message: String,
    pub status: Option<u16>,
    pub retryable: bool,
}

impl From<ApiError> for ErrorPanel {
    fn from(err: ApiError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
            retryable: true,
        }
    }
}

#[derive(Debug)]
pub enum PageOutcome {
    Ready(Dashboard),
    Redirect { to: String, reason: RedirectReason },
    Failed(ErrorPanel),
    /// The scope was torn down first; nothing to render.
    Cancelled,
}

/// Wires the guard, gateway, local storage and assistant together.
#[derive(Debug, Clone)]
pub struct Portal {
    config: PortalConfig,
    storage: LocalStorage,
    guard: SessionGuard,
}

impl Portal {
    pub fn new(config: PortalConfig, storage: LocalStorage) -> Self {
        let guard = SessionGuard::new(storage.clone(), config.login_route.clone());
        Self {
            config,
            storage,
            guard,
        }
    }

    pub fn from_config(config: PortalConfig) -> Self {
        let storage = LocalStorage::from_config(&config.storage);
        Self::new(config, storage)
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn api_client(&self, session: &Session) -> ApiClient {
        ApiClient::new(self.config.api.clone()).with_token(session.auth_token.clone())
    }

    /// Mount a page that requires `required_role`.
    pub async fn mount(&self, required_role: Role, scope: &PageScope) -> PageOutcome {
        let session = match self.guard.check_session(required_role) {
            Access::Authorized(session) => session,
            Access::Redirect { to, reason } => return PageOutcome::Redirect { to, reason },
        };

        let client = self.api_client(&session);
        let role = session.role;
        let fetch = async {
            let (profile, cases) = futures::try_join!(client.get_profile(), client.list_cases())?;
            let lawyers = match role {
                Role::Citizen => client.list_lawyers().await?,
                Role::Lawyer => Vec::new(),
            };
            Ok::<_, ApiError>(Dashboard {
                role,
                profile,
                cases,
                lawyers,
            })
        };

        match scope.run(fetch).await {
            Ok(Ok(dashboard)) => PageOutcome::Ready(dashboard),
            Ok(Err(e)) => {
                tracing::warn!(role = %role, error = %e, "Dashboard fetch failed");
                PageOutcome::Failed(ErrorPanel::from(e))
            }
            Err(Cancelled) => PageOutcome::Cancelled,
        }
    }

    /// Assistant chat for the session's role.
    pub fn assistant(&self, session: &Session) -> ChatSession<HttpCompletionProvider> {
        let provider = HttpCompletionProvider::new(&self.config.assistant)
            .with_session_token(session.auth_token.clone());
        ChatSession::new(provider, self.storage.clone(), session.role)
    }

    fn collection<T: Record>(&self, key: &str) -> RecordCollection<T> {
        RecordCollection::load(self.storage.clone(), key)
    }

    pub fn reports(&self) -> RecordCollection<Report> {
        self.collection(keys::REPORTS)
    }

    pub fn reminders(&self) -> RecordCollection<Reminder> {
        self.collection(keys::REMINDERS)
    }

    pub fn disputes(&self) -> RecordCollection<Dispute> {
        self.collection(keys::DISPUTES)
    }

    pub fn documents(&self) -> RecordCollection<Document> {
        self.collection(keys::DOCUMENTS)
    }

    /// Log out on the backend (best effort) and clear the local session.
    pub async fn logout(&self) -> Result<(), crate::error::StoreError> {
        if let Some(session) = self.guard.current()
            && let Err(e) = self.api_client(&session).logout().await
        {
            tracing::warn!(error = %e, "Backend logout failed; clearing local session anyway");
        }
        self.guard.logout()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorPanel, PageOutcome, PageScope, Portal};
    use crate::config::PortalConfig;
    use crate::error::ApiError;
    use crate::session::{RedirectReason, Role};
    use crate::settings::Settings;
    use crate::store::LocalStorage;

    fn portal() -> Portal {
        let mut config = PortalConfig::resolve_with(
            &Settings::default(),
            &std::collections::HashMap::<&str, &str>::new(),
        )
        .expect("config");
        // Nothing listens here; a redirect must happen before any request.
        config.api.base_url = "http://127.0.0.1:9".to_string();
        Portal::new(config, LocalStorage::in_memory())
    }

    #[tokio::test]
    async fn mount_without_session_redirects_before_fetching() {
        let portal = portal();
        let scope = PageScope::new();
        for role in [Role::Citizen, Role::Lawyer] {
            match portal.mount(role, &scope).await {
                PageOutcome::Redirect { to, reason } => {
                    assert_eq!(to, "/login");
                    assert_eq!(reason, RedirectReason::MissingToken);
                }
                other => panic!("expected redirect, got {other:?}"),
            }
        }
    }

    #[test]
    fn error_panel_keeps_status_and_message() {
        let panel = ErrorPanel::from(ApiError::Http {
            status: 500,
            message: "Database unavailable".to_string(),
        });
        assert_eq!(panel.message, "Database unavailable");
        assert_eq!(panel.status, Some(500));
        assert!(panel.retryable);
    }

    #[test]
    fn collections_are_isolated() {
        let portal = portal();
        let mut reports = portal.reports();
        reports
            .insert(crate::records::Report::draft("r", "", None))
            .expect("insert");
        assert_eq!(portal.reports().len(), 1);
        assert!(portal.disputes().is_empty());
        assert!(portal.documents().is_empty());
        assert!(portal.reminders().is_empty());
    }
}
