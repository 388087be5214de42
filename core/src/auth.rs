//! Authentication state machine over the session store.
//!
//! # Design
//! `AuthCoordinator` is the single owner of the live `Session` and the only
//! writer of the `SessionStore`. It also owns the `Transport`, so views run
//! every request through it and get the token attached without touching the
//! session directly.
//!
//! States are `Anonymous` and `Authenticated`. Register and login only move
//! to `Authenticated` after the returned session has been persisted; any
//! failure leaves the state alone. Logout always ends `Anonymous`, even when
//! the server could not be told.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::request::RequestClient;
use crate::session::{KeyValueStore, Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug)]
pub struct AuthCoordinator<T, S> {
    client: RequestClient,
    transport: T,
    store: SessionStore<S>,
    session: Option<Session>,
}

impl<T: Transport, S: KeyValueStore> AuthCoordinator<T, S> {
    /// Create the coordinator and restore any persisted session.
    pub fn new(client: RequestClient, transport: T, store: SessionStore<S>) -> Self {
        let session = store.load();
        if let Some(s) = &session {
            debug!(user = %s.username, "restored persisted session");
        }
        Self {
            client,
            transport,
            store,
            session,
        }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn state(&self) -> AuthState {
        if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.access_token.is_empty())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn require_token(&self) -> Result<&str, ApiError> {
        self.access_token().ok_or(ApiError::NotAuthenticated)
    }

    /// Whether the current user owns a record with `owner_id`.
    pub fn is_owner(&self, owner_id: &str) -> bool {
        self.user_id().is_some_and(|id| id == owner_id)
    }

    /// Execute a prebuilt request through the owned transport.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.execute(request)?;
        debug!(method = method.as_str(), %path, status = response.status, "request completed");
        Ok(response)
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<&Session, ApiError> {
        let body = RegisterBody {
            username,
            email,
            password,
        };
        let request = self
            .client
            .build_request("/users/register", HttpMethod::Post, Some(&body), None)?;
        let session = self.client.parse_as::<Session>(self.execute(request)?)?;
        info!(user = %session.username, "registered");
        self.establish(session)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&Session, ApiError> {
        let body = LoginBody { email, password };
        let request = self
            .client
            .build_request("/users/login", HttpMethod::Post, Some(&body), None)?;
        let session = self.client.parse_as::<Session>(self.execute(request)?)?;
        info!(user = %session.username, "logged in");
        self.establish(session)
    }

    /// Tell the server (best effort) and drop the local session.
    ///
    /// The local session is cleared before this returns in every case; an
    /// `Err` reports only that the server notification or the storage clear
    /// failed.
    pub fn logout(&mut self) -> Result<(), ApiError> {
        let Some(token) = self.access_token().map(str::to_string) else {
            return Ok(());
        };
        let request = self.client.build_empty("/users/logout", HttpMethod::Get, Some(&token));
        let notified = self
            .execute(request)
            .and_then(|response| self.client.parse_response(response).map(|_| ()));
        if let Err(e) = &notified {
            warn!(error = %e, "logout notification failed; clearing session anyway");
        }

        self.session = None;
        self.store.clear()?;
        info!("logged out");
        notified
    }

    /// Check the stored token against the server.
    ///
    /// A 401 or 403 means the token was rejected and the session is
    /// cleared. Any other failure, including a 5xx or a transport error,
    /// leaves the session in place and is returned to the caller.
    pub fn verify(&mut self) -> Result<AuthState, ApiError> {
        let Some(token) = self.access_token().map(str::to_string) else {
            return Ok(AuthState::Anonymous);
        };
        let request = self.client.build_empty("/users/me", HttpMethod::Get, Some(&token));
        let response = self.execute(request)?;
        match self.client.parse_response(response) {
            Ok(_) => Ok(AuthState::Authenticated),
            Err(ApiError::Request { status, message }) if matches!(status, 401 | 403) => {
                warn!(status, %message, "stored token rejected; clearing session");
                self.session = None;
                self.store.clear()?;
                Ok(AuthState::Anonymous)
            }
            Err(e) => Err(e),
        }
    }

    /// Build, execute and parse a request, attaching the token when
    /// `authorized` is set.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&B>,
        authorized: bool,
    ) -> Result<Value, ApiError> {
        let token = if authorized { Some(self.require_token()?) } else { None };
        let request = self.client.build_request(path, method, body, token)?;
        self.client.parse_response(self.execute(request)?)
    }

    fn establish(&mut self, session: Session) -> Result<&Session, ApiError> {
        if session.access_token.is_empty() {
            return Err(ApiError::Deserialization("session without access token".to_string()));
        }
        self.store.save(&session)?;
        Ok(&*self.session.insert(session))
    }
}
