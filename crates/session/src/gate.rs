//! Session gate: routes between the auth area and the protected area

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::repository::SessionRepository;

/// What the gate knows about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The store read has not resolved yet; nothing may render
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Navigable screens of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Home,
    Helplines,
    Training,
    Community,
    CreatePost,
    Report,
    Profile,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Login,
        Route::Register,
        Route::Home,
        Route::Helplines,
        Route::Training,
        Route::Community,
        Route::CreatePost,
        Route::Report,
        Route::Profile,
    ];

    /// Canonical path of the route
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Home => "/",
            Self::Helplines => "/helplines",
            Self::Training => "/training",
            Self::Community => "/community",
            Self::CreatePost => "/community/create",
            Self::Report => "/report",
            Self::Profile => "/profile",
        }
    }

    /// Parse a path, with or without its `(auth)` / `(tabs)` group prefix
    pub fn from_path(path: &str) -> Option<Self> {
        let mut path = path.trim_end_matches('/');
        for group in ["/(auth)", "/(tabs)"] {
            if let Some(rest) = path.strip_prefix(group) {
                path = rest;
            }
        }
        let path = if path.is_empty() { "/" } else { path };
        match path {
            "/index" => Some(Self::Home),
            _ => Self::ALL.iter().copied().find(|route| route.path() == path),
        }
    }

    /// Screens that require a session
    pub fn is_protected(&self) -> bool {
        !self.is_auth_screen()
    }

    /// The login and register screens
    pub fn is_auth_screen(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

/// Outcome of entering a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render nothing until the session read resolves
    Suspend,
    Render,
    Redirect(Route),
}

/// Decide what happens when `route` is entered in `state`.
///
/// Pure: the same inputs always produce the same decision.
pub fn on_route_enter(route: Route, state: SessionState) -> RouteDecision {
    match state {
        SessionState::Unknown => RouteDecision::Suspend,
        SessionState::Authenticated if route.is_auth_screen() => {
            RouteDecision::Redirect(Route::Home)
        }
        SessionState::Unauthenticated if route.is_protected() => {
            RouteDecision::Redirect(Route::Login)
        }
        _ => RouteDecision::Render,
    }
}

/// Gate resolving the session state once per mount.
///
/// The gate does not watch the store. A logout performed through some other
/// handle is only seen after [`SessionGate::remount`], unless the caller
/// reports it with [`SessionGate::record_sign_out`].
pub struct SessionGate {
    repository: SessionRepository,
    state: watch::Sender<SessionState>,
}

impl SessionGate {
    pub fn new(repository: SessionRepository) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self { repository, state }
    }

    /// Current state without touching the store
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve the session state from the store.
    ///
    /// Only the first resolution after a mount transitions the gate; later
    /// calls return the settled state. Read failures resolve to
    /// [`SessionState::Unauthenticated`].
    pub async fn check_session(&self) -> SessionState {
        let current = self.state();
        if current != SessionState::Unknown {
            return current;
        }

        let resolved = match self.repository.token().await {
            Ok(Some(_)) => SessionState::Authenticated,
            Ok(None) => SessionState::Unauthenticated,
            Err(err) => {
                warn!("Session read failed, treating as signed out: {}", err);
                SessionState::Unauthenticated
            }
        };

        self.transition_from_unknown(resolved);
        self.state()
    }

    /// Like [`SessionGate::check_session`], but abandons the read when
    /// `cancel` fires. A cancelled check leaves the gate untouched.
    pub async fn check_session_until(&self, cancel: &CancellationToken) -> SessionState {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Session check cancelled before resolution");
                self.state()
            }
            state = self.check_session() => state,
        }
    }

    /// Evaluate a route against the current state
    pub fn enter(&self, route: Route) -> RouteDecision {
        on_route_enter(route, self.state())
    }

    /// Explicit login
    pub fn record_sign_in(&self) {
        self.set(SessionState::Authenticated);
    }

    /// Explicit logout
    pub fn record_sign_out(&self) {
        self.set(SessionState::Unauthenticated);
    }

    /// Forget the resolved state, as when the navigation tree mounts again
    pub fn remount(&self) {
        self.set(SessionState::Unknown);
    }

    fn transition_from_unknown(&self, resolved: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Unknown {
                info!("Session resolved: {:?}", resolved);
                *state = resolved;
                true
            } else {
                false
            }
        });
    }

    fn set(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            debug!("Session gate {:?} -> {:?}", *state, next);
            *state = next;
            true
        });
    }
}
