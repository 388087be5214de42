use crate::app::Library;
use crate::catalog::CatalogApi;
use crate::form::FormState;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::NewBook;
use crate::validate::{LengthBounds, Validator};
use crate::views::{submit_outcome, Outcome, Route};

#[derive(Debug)]
pub struct AddBookView {
    pub form: FormState,
}

impl AddBookView {
    pub fn new(summary: LengthBounds) -> Self {
        Self {
            form: FormState::blank(Validator::book(summary)),
        }
    }

    /// Anonymous users are sent to the login page before they can fill the
    /// form in.
    pub fn guard<T: Transport, S: KeyValueStore>(&self, lib: &Library<T, S>) -> Outcome {
        if lib.auth().is_authenticated() {
            Outcome::Stay
        } else {
            Outcome::Navigate(Route::Login)
        }
    }

    pub fn submit<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        let outcome = self.form.handle_submit(|values, _| {
            let token = lib.auth().require_token()?;
            let request = lib.api().build_create_book(&NewBook::from_values(values), token)?;
            lib.fetch(request, CatalogApi::parse_book)
        });
        submit_outcome(outcome, Route::Catalog, Route::Catalog)
    }
}
