//! Headless feature views.
//!
//! # Design
//! Each view holds its own local state (fetched records, a `FormState`) and
//! takes the `Library` on every call. Instead of rendering or routing, a call
//! returns an `Outcome` telling the host what to do next. Request failures are
//! reported as a single `Notify`; owner-check failures as `Denied` with the
//! route to fall back to. Nothing is retried.

mod account;
mod add_book;
mod borrowed;
mod catalog;
mod comments;
mod details;
mod edit_book;

pub use account::{logout, LoginView, RegisterView};
pub use add_book::AddBookView;
pub use borrowed::BorrowedView;
pub use catalog::{CatalogView, HomeView, LATEST_LIMIT};
pub use comments::CommentsView;
pub use details::DetailsView;
pub use edit_book::EditBookView;

use crate::error::ApiError;
use crate::form::SubmitOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Catalog,
    Login,
    Register,
    Details(String),
    Edit(String),
    Borrowed,
}

/// What the host should do after a view call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; re-render with the view's current state.
    Stay,
    Navigate(Route),
    /// Show a blocking notification and stay.
    Notify(String),
    /// The user may not do this; show `message` and go to `redirect`.
    Denied { message: String, redirect: Route },
}

/// Map an error to an outcome. Missing sessions go to login, owner-check
/// failures go to `denied`, everything else is a notification.
pub(crate) fn error_outcome(err: ApiError, denied: Route) -> Outcome {
    match err {
        ApiError::NotAuthenticated => Outcome::Navigate(Route::Login),
        ApiError::Forbidden(message) => Outcome::Denied {
            message,
            redirect: denied,
        },
        other => Outcome::Notify(other.to_string()),
    }
}

/// Invalid or duplicate submits stay on the form; finished submits go to
/// `success` or through `error_outcome`.
pub(crate) fn submit_outcome<R>(
    outcome: SubmitOutcome<Result<R, ApiError>>,
    success: Route,
    denied: Route,
) -> Outcome {
    match outcome {
        SubmitOutcome::Invalid | SubmitOutcome::Busy => Outcome::Stay,
        SubmitOutcome::Submitted(Ok(_)) => Outcome::Navigate(success),
        SubmitOutcome::Submitted(Err(e)) => error_outcome(e, denied),
    }
}
