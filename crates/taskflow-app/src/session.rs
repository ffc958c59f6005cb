//! Authenticated session shared by every service that talks to the API.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

const TOKEN_KEY: &str = "token";
const USER_ID_KEY: &str = "userId";
const CURRENT_USER_KEY: &str = "currentUser";
const DEFAULT_NAME: &str = "User";
const EVENT_CAPACITY: usize = 16;

/// Build the generated avatar URL for a display name.
#[must_use]
pub fn avatar_url(name: &str) -> String {
    let name = if name.trim().is_empty() { DEFAULT_NAME } else { name };
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        urlencoding::encode(name)
    )
}

/// Token plus the profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent with every authenticated request.
    pub token: String,
    /// Server-side user id; may be empty when the server omits it.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Generated avatar URL.
    pub avatar: String,
}

impl Session {
    /// Session for a freshly authenticated user. A blank name becomes `"User"`.
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        name: &str,
        email: impl Into<String>,
    ) -> Self {
        let name = if name.trim().is_empty() { DEFAULT_NAME } else { name };
        Self {
            token: token.into(),
            user_id: user_id.into(),
            name: name.to_owned(),
            email: email.into(),
            avatar: avatar_url(name),
        }
    }
}

/// Profile block persisted under `currentUser`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

/// Session transitions observers can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Login or restore succeeded.
    SignedIn,
    /// The user logged out.
    SignedOut,
    /// The server rejected the token; the user must log in again.
    Invalidated,
}

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    remembered: bool,
}

/// Holder of the current session, injected into the API client and services.
///
/// Reads are free for anyone; writes happen only through the crate's account
/// and HTTP layers.
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<State>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Empty context persisting remembered sessions into `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            state: RwLock::new(State::default()),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the active session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().session.clone()
    }

    /// Bearer token of the active session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().session.as_ref().map(|session| session.token.clone())
    }

    /// Returns true while a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().session.is_some()
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Session persisted by an earlier remembered login, if any.
    ///
    /// Nothing is installed. The token becomes active only once the server
    /// confirms it (see `AccountService::restore`).
    ///
    /// # Errors
    /// Returns an error when the store cannot be read.
    pub fn stored(&self) -> Result<Option<Session>, StorageError> {
        let Some(token) = self.store.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let user_id = self.store.get(USER_ID_KEY)?.unwrap_or_default();
        let user = self
            .store
            .get(CURRENT_USER_KEY)?
            .and_then(|raw| serde_json::from_str::<StoredUser>(&raw).ok());
        let (name, email) = user.map_or_else(Default::default, |user| (user.name, user.email));
        Ok(Some(Session::new(token, user_id, &name, email)))
    }

    /// Install `session`, persisting it when `remember` is set.
    ///
    /// Without `remember` any previously persisted session is dropped, so the
    /// store never outlives the user it belongs to.
    pub(crate) fn establish(&self, session: Session, remember: bool) -> Result<(), StorageError> {
        if remember {
            self.persist(&session)?;
        } else {
            self.discard_stored()?;
        }
        info!(user = %session.email, remember, "signed in");
        {
            let mut state = self.write();
            state.session = Some(session);
            state.remembered = remember;
        }
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(())
    }

    /// Replace name and email of the active session, re-persisting when remembered.
    pub(crate) fn update_profile(&self, name: &str, email: &str) -> Result<(), StorageError> {
        let (session, remembered) = {
            let mut state = self.write();
            let remembered = state.remembered;
            let Some(session) = state.session.as_mut() else {
                return Ok(());
            };
            let name = if name.trim().is_empty() { DEFAULT_NAME } else { name };
            name.clone_into(&mut session.name);
            email.clone_into(&mut session.email);
            session.avatar = avatar_url(name);
            (session.clone(), remembered)
        };
        if remembered {
            self.persist(&session)?;
        }
        Ok(())
    }

    /// End the session after an explicit logout.
    pub(crate) fn clear(&self) -> Result<(), StorageError> {
        let had_session = self.take();
        self.discard_stored()?;
        if had_session {
            info!("signed out");
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(())
    }

    /// Forced logout after the server rejected the token.
    pub(crate) fn invalidate(&self) {
        self.take();
        if let Err(err) = self.discard_stored() {
            warn!(error = %err, "failed to clear stored session");
        }
        warn!("session invalidated by server; log in again");
        let _ = self.events.send(SessionEvent::Invalidated);
    }

    /// Remove the persisted keys without touching the in-memory session.
    pub(crate) fn discard_stored(&self) -> Result<(), StorageError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_ID_KEY)?;
        self.store.remove(CURRENT_USER_KEY)
    }

    fn take(&self) -> bool {
        let mut state = self.write();
        state.remembered = false;
        state.session.take().is_some()
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let user = StoredUser {
            name: session.name.clone(),
            email: session.email.clone(),
        };
        let user = serde_json::to_string(&user).map_err(|source| StorageError::Json {
            path: CURRENT_USER_KEY.into(),
            source,
        })?;
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(USER_ID_KEY, &session.user_id)?;
        self.store.set(CURRENT_USER_KEY, &user)
    }
}
