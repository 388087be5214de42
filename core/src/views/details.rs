use crate::app::Library;
use crate::catalog::CatalogApi;
use crate::error::ApiError;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::Book;
use crate::views::{error_outcome, Outcome, Route};

#[derive(Debug, Default)]
pub struct DetailsView {
    pub book: Option<Book>,
}

impl DetailsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>, book_id: &str) -> Outcome {
        match lib.fetch(lib.api().build_get_book(book_id), CatalogApi::parse_book) {
            Ok(book) => {
                self.book = Some(book);
                Outcome::Stay
            }
            Err(e) => error_outcome(e, Route::Catalog),
        }
    }

    /// Whether the edit and delete actions apply to the current user.
    pub fn is_owner<T: Transport, S: KeyValueStore>(&self, lib: &Library<T, S>) -> bool {
        self.book.as_ref().is_some_and(|b| lib.auth().is_owner(&b.owner_id))
    }

    /// Question to put to the user before `delete`.
    pub fn confirm_prompt(&self) -> Option<String> {
        self.book
            .as_ref()
            .map(|b| format!("Are you sure you want to delete the book \"{}\"?", b.title))
    }

    /// Delete the loaded book. Only the owner may; anyone else is sent back
    /// to the details page without a request.
    pub fn delete<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        let Some(book) = &self.book else {
            return Outcome::Stay;
        };
        let details = Route::Details(book.id.clone());
        let result = lib.auth().require_token().and_then(|token| {
            if !lib.auth().is_owner(&book.owner_id) {
                return Err(ApiError::Forbidden("You are not authorized to delete this book!".to_string()));
            }
            lib.fetch(lib.api().build_delete_book(&book.id, token), CatalogApi::parse_empty)
        });
        match result {
            Ok(()) => {
                self.book = None;
                Outcome::Navigate(Route::Catalog)
            }
            Err(e) => error_outcome(e, details),
        }
    }
}
