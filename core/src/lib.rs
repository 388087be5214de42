//! Client core for the library catalog service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values for the
//! catalog backend, validates and submits forms, and keeps the signed-in
//! session persisted across restarts. Network I/O happens only inside a
//! host-supplied `Transport`.
//!
//! # Design
//! - `RequestClient` is stateless: it holds only `base_url` and turns any
//!   response into parsed JSON or an `ApiError`.
//! - `CatalogApi` splits every endpoint into `build_*` and `parse_*`.
//! - `AuthCoordinator` is the single owner of the session and the transport.
//! - `FormState` + `Validator` drive every form; `views` are headless
//!   view-models returning an `Outcome` instead of rendering.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod request;
pub mod session;
pub mod types;
pub mod validate;
pub mod views;

#[cfg(test)]
mod testing;

pub use app::Library;
pub use auth::{AuthCoordinator, AuthState};
pub use catalog::CatalogApi;
pub use config::ClientConfig;
pub use error::ApiError;
pub use form::{FieldBinding, FormErrors, FormState, ResetHandle, SubmitOutcome};
#[cfg(feature = "ureq-transport")]
pub use http::UreqTransport;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use request::RequestClient;
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore};
pub use types::{Book, BorrowRecord, BorrowedBook, Comment, NewBook, NewComment};
pub use validate::{FieldRule, FormValues, LengthBounds, Validator};
pub use views::{Outcome, Route};
