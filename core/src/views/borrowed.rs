use crate::app::Library;
use crate::catalog::{join_borrowed, CatalogApi};
use crate::error::ApiError;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::BorrowedBook;
use crate::views::{error_outcome, Outcome, Route};

/// The current user's borrowed books.
#[derive(Debug, Default)]
pub struct BorrowedView {
    pub items: Vec<BorrowedBook>,
}

impl BorrowedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        let user_id = match lib.auth().user_id() {
            Some(id) if lib.auth().is_authenticated() => id,
            _ => return Outcome::Navigate(Route::Login),
        };
        let records = match lib.fetch(lib.api().build_list_borrowed(user_id), CatalogApi::parse_borrowed) {
            Ok(records) => records,
            Err(e) => return error_outcome(e, Route::Home),
        };
        if records.is_empty() {
            self.items.clear();
            return Outcome::Stay;
        }
        match lib.fetch(lib.api().build_list_books(), CatalogApi::parse_books) {
            Ok(books) => {
                self.items = join_borrowed(records, &books);
                Outcome::Stay
            }
            Err(e) => error_outcome(e, Route::Home),
        }
    }

    /// Return a borrowed book by deleting its record.
    pub fn return_book<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>, record_id: &str) -> Outcome {
        let result = lib.auth().require_token().and_then(|token| {
            lib.fetch(lib.api().build_return_book(record_id, token), CatalogApi::parse_empty)
        });
        match result {
            Ok(()) => {
                self.items.retain(|item| item.record.id != record_id);
                Outcome::Stay
            }
            Err(ApiError::Request { message, .. }) => {
                Outcome::Notify(format!("Failed to return the book: {message}"))
            }
            Err(e) => error_outcome(e, Route::Borrowed),
        }
    }
}
