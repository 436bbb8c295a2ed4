//! Session and role derivation.
//!
//! [`SessionProvider`] is the only writer of the persisted session blob.
//! Every page and the navigation bar observe the same derivation through
//! [`SessionProvider::subscribe`]. Each load, login and logout takes a new
//! generation; a load that a later one has overtaken neither writes the
//! blob nor publishes.

use sb_client::{ForumClient, LoginKind};
use sb_core::{CurrentUser, ForumError, Result, Role, SessionStore, UserType, Viewer};
use secrecy::SecretString;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const IS_LOGGED_IN: &str = "isLoggedIn";
pub const CURRENT_USER: &str = "currentUser";
pub const SIDEBAR_COLLAPSED: &str = "sidebarCollapsed";

/// A logged-in user plus the role flags derived for this load.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: CurrentUser,
    is_teacher: bool,
    is_admin: bool,
}

impl Session {
    pub fn new(user: CurrentUser, is_teacher: bool, is_admin: bool) -> Self {
        Self {
            user,
            is_teacher,
            is_admin,
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn is_teacher(&self) -> bool {
        self.is_teacher
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_staff(&self) -> bool {
        self.is_teacher || self.is_admin
    }

    pub fn role(&self) -> Role {
        Role::from_flags(self.is_teacher, self.is_admin)
    }

    /// Identifier sent as `requester_school_id`. The backend also resolves a
    /// bare user id, which covers blobs without a school id.
    pub fn requester(&self) -> &str {
        self.user.school_id.as_deref().unwrap_or(&self.user.user_id)
    }

    pub fn viewer(&self, show_pending: bool) -> Viewer {
        Viewer::new(Some(self.user.user_id.clone()), self.role()).with_show_pending(show_pending)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    Unauthenticated,
    /// Flags taken from the blob while the backend check is in flight.
    Unverified(Session),
    Verified(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Unverified(session) | Self::Verified(session) => Some(session),
            Self::Unknown | Self::Unauthenticated => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// What a page needs before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Teacher,
    Staff,
    Admin,
}

/// Where to send a viewer who does not pass an [`Access`] gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Home,
}

impl Redirect {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
        }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl From<Redirect> for ForumError {
    fn from(redirect: Redirect) -> Self {
        ForumError::Authorization(format!("redirect to {redirect}"))
    }
}

pub struct SessionProvider {
    store: Arc<dyn SessionStore>,
    client: Arc<ForumClient>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn SessionStore>, client: Arc<ForumClient>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            store,
            client,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn publish(&self, state: SessionState) -> SessionState {
        self.state.send_replace(state.clone());
        state
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Runs the per-page-load derivation and publishes every step.
    ///
    /// When a logout or another load overtakes this one while the role check
    /// is in flight, its result is dropped and the current state returned.
    pub async fn load(&self) -> Result<SessionState> {
        let generation = self.next_generation();
        let Some(user) = self.read_blob()? else {
            return Ok(self.publish(SessionState::Unauthenticated));
        };

        let provisional = Session::new(user.clone(), user.claims_teacher(), user.claims_admin());
        debug!(user_id = %user.user_id, role = ?provisional.role(), "provisional session");
        self.publish(SessionState::Unverified(provisional.clone()));

        let Some(school_id) = user.school_id.clone() else {
            debug!(user_id = %user.user_id, "no school id, teacher flag cleared");
            let session = Session::new(user, false, provisional.is_admin);
            return Ok(self.publish(SessionState::Verified(session)));
        };

        let verified = self.client.classes(&school_id).await;
        if !self.is_current(generation) {
            debug!(user_id = %user.user_id, generation, "dropping superseded session load");
            return Ok(self.current());
        }

        let session = match verified {
            Ok(listing) => {
                if listing.is_teacher && user.user_type != Some(UserType::Teacher) {
                    let mut updated = user.clone();
                    updated.user_type = Some(UserType::Teacher);
                    self.write_blob(&updated)?;
                    info!(user_id = %user.user_id, "teacher role confirmed and persisted");
                    Session::new(updated, true, provisional.is_admin)
                } else {
                    Session::new(user, listing.is_teacher, provisional.is_admin)
                }
            }
            Err(err) => {
                warn!(user_id = %user.user_id, error = %err, "role check failed, treating as student");
                Session::new(user, false, false)
            }
        };
        Ok(self.publish(SessionState::Verified(session)))
    }

    /// Checks credentials, persists a normalized blob and derives the session.
    pub async fn login(
        &self,
        kind: LoginKind,
        user_id: &str,
        password: &SecretString,
    ) -> Result<SessionState> {
        let mut user = self.client.login(kind, user_id, password).await?;
        // Overtakes any load still waiting on the previous user's role check.
        self.next_generation();
        user.user_type = Some(kind.user_type());
        user.is_admin = (kind == LoginKind::Admin).then_some(true);

        self.write_blob(&user)?;
        self.store.set(IS_LOGGED_IN, "true")?;
        self.load().await
    }

    pub fn logout(&self) -> Result<()> {
        self.next_generation();
        self.store.remove(IS_LOGGED_IN)?;
        self.store.remove(CURRENT_USER)?;
        self.publish(SessionState::Unauthenticated);
        info!("logged out");
        Ok(())
    }

    /// Gate for the current state. Teacher-level access needs a verified
    /// session.
    pub fn require(&self, access: Access) -> std::result::Result<Session, Redirect> {
        let state = self.current();
        let session = state.session().cloned().ok_or(Redirect::Login)?;
        let allowed = match access {
            Access::Authenticated => true,
            _ if !state.is_verified() => false,
            Access::Teacher => session.is_teacher(),
            Access::Staff => session.is_staff(),
            Access::Admin => session.is_admin(),
        };
        if allowed {
            Ok(session)
        } else {
            Err(Redirect::Home)
        }
    }

    pub fn sidebar_collapsed(&self) -> Result<bool> {
        Ok(self.store.get(SIDEBAR_COLLAPSED)?.as_deref() == Some("true"))
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.store
            .set(SIDEBAR_COLLAPSED, if collapsed { "true" } else { "false" })
    }

    fn read_blob(&self) -> Result<Option<CurrentUser>> {
        if self.store.get(IS_LOGGED_IN)?.as_deref() != Some("true") {
            return Ok(None);
        }
        let Some(raw) = self.store.get(CURRENT_USER)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable session blob");
                Ok(None)
            }
        }
    }

    fn write_blob(&self, user: &CurrentUser) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(CURRENT_USER, &raw)
    }
}
