//! Wiring of the client: config → request client → auth + catalog API.

use tracing::warn;

use crate::auth::{AuthCoordinator, AuthState};
use crate::catalog::CatalogApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::request::RequestClient;
use crate::session::{KeyValueStore, SessionStore};
use crate::views::Outcome;

/// Everything a view needs: the catalog endpoints, the auth coordinator
/// (which owns the transport and session) and the config.
#[derive(Debug)]
pub struct Library<T, S> {
    api: CatalogApi,
    auth: AuthCoordinator<T, S>,
    config: ClientConfig,
}

impl<T: Transport, S: KeyValueStore> Library<T, S> {
    pub fn new(config: ClientConfig, transport: T, storage: S) -> Self {
        let client = RequestClient::new(&config.base_url);
        let store = SessionStore::with_key(storage, &config.session_key);
        Self {
            api: CatalogApi::new(client.clone()),
            auth: AuthCoordinator::new(client, transport, store),
            config,
        }
    }

    /// Verify any restored session against the server. A rejected token has
    /// already been cleared when this returns; an unreachable server is
    /// reported once and the session is kept.
    pub fn start(&mut self) -> Outcome {
        match self.auth.verify() {
            Ok(AuthState::Authenticated) | Ok(AuthState::Anonymous) => Outcome::Stay,
            Err(e) => {
                warn!(error = %e, "could not verify stored session");
                Outcome::Notify(e.to_string())
            }
        }
    }

    pub fn api(&self) -> &CatalogApi {
        &self.api
    }

    pub fn auth(&self) -> &AuthCoordinator<T, S> {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthCoordinator<T, S> {
        &mut self.auth
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request` and hand the response to one of the catalog parsers.
    pub fn fetch<R>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(&CatalogApi, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let response = self.auth.execute(request)?;
        parse(&self.api, response)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::RecordingTransport;
    use crate::views::fixtures;

    #[test]
    fn start_without_session_sends_nothing() {
        let transport = RecordingTransport::new();
        let mut lib = fixtures::anonymous(&transport);
        assert_eq!(lib.start(), Outcome::Stay);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn start_clears_rejected_token() {
        let transport = RecordingTransport::new();
        let mut lib = fixtures::signed_in(&transport, "u1");
        transport.push_json(403, json!({"message": "Invalid access token"}));

        assert_eq!(lib.start(), Outcome::Stay);
        assert!(!lib.auth().is_authenticated());
        assert_eq!(lib.auth().store().load(), None);
    }

    #[test]
    fn start_keeps_session_when_server_unreachable() {
        let transport = RecordingTransport::new();
        let mut lib = fixtures::signed_in(&transport, "u1");
        transport.push_failure("connection refused");

        assert!(matches!(lib.start(), Outcome::Notify(_)));
        assert!(lib.auth().is_authenticated());
    }

    #[test]
    fn fetch_runs_request_through_parser() {
        let transport = RecordingTransport::new();
        let lib = fixtures::anonymous(&transport);
        transport.push_json(200, json!([fixtures::book_json("b1", "u1")]));

        let books = lib.fetch(lib.api().build_list_books(), CatalogApi::parse_books).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "b1");

        let requests = transport.requests();
        assert_eq!(requests[0].path, "http://localhost:3030/data/books");
    }
}
