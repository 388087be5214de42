use tracing::warn;

use crate::app::Library;
use crate::catalog::CatalogApi;
use crate::error::ApiError;
use crate::form::{FormState, SubmitOutcome};
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::{Comment, NewComment};
use crate::validate::Validator;
use crate::views::{error_outcome, Outcome, Route};

/// Comments under a book, plus the form for adding one.
#[derive(Debug)]
pub struct CommentsView {
    pub book_id: String,
    pub owner_id: String,
    pub comments: Vec<Comment>,
    pub form: FormState,
}

impl CommentsView {
    pub fn new(book_id: &str, owner_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            owner_id: owner_id.to_string(),
            comments: Vec::new(),
            form: FormState::blank(Validator::comment()),
        }
    }

    /// A failed load leaves the list empty and is reported once.
    pub fn load<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        match lib.fetch(lib.api().build_list_comments(&self.book_id), CatalogApi::parse_comments) {
            Ok(comments) => {
                self.comments = comments;
                Outcome::Stay
            }
            Err(e) => {
                warn!(book = %self.book_id, error = %e, "failed to load comments");
                self.comments.clear();
                error_outcome(e, Route::Details(self.book_id.clone()))
            }
        }
    }

    /// Signed-in users other than the book's owner may comment.
    pub fn can_post<T: Transport, S: KeyValueStore>(&self, lib: &Library<T, S>) -> bool {
        lib.auth().is_authenticated() && !lib.auth().is_owner(&self.owner_id)
    }

    pub fn post<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        let book_id = self.book_id.clone();
        let owner_id = self.owner_id.clone();
        let outcome = self.form.handle_submit(|values, reset| {
            let token = lib.auth().require_token()?;
            if lib.auth().is_owner(&owner_id) {
                return Err(ApiError::Forbidden("You cannot comment on your own book.".to_string()));
            }
            let session = lib.auth().session().ok_or(ApiError::NotAuthenticated)?;
            let input = NewComment {
                book_id: book_id.clone(),
                text: values.get("comment").cloned().unwrap_or_default(),
                username: session.username.clone(),
            };
            let request = lib.api().build_create_comment(&input, token)?;
            let saved = lib.fetch(request, CatalogApi::parse_comment)?;
            reset.reset();
            Ok(saved)
        });
        match outcome {
            SubmitOutcome::Invalid | SubmitOutcome::Busy => Outcome::Stay,
            SubmitOutcome::Submitted(Ok(comment)) => {
                self.comments.push(comment);
                Outcome::Stay
            }
            SubmitOutcome::Submitted(Err(ApiError::Request { message, .. })) => {
                Outcome::Notify(format!("Failed to post comment: {message}"))
            }
            SubmitOutcome::Submitted(Err(e)) => error_outcome(e, Route::Details(self.book_id.clone())),
        }
    }
}
