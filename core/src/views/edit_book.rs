use crate::app::Library;
use crate::catalog::CatalogApi;
use crate::error::ApiError;
use crate::form::FormState;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::NewBook;
use crate::validate::{LengthBounds, Validator};
use crate::views::{error_outcome, submit_outcome, Outcome, Route};

const NOT_OWNER: &str = "You are not authorized to edit this book!";

#[derive(Debug)]
pub struct EditBookView {
    pub book_id: String,
    pub form: FormState,
    owner_id: Option<String>,
}

impl EditBookView {
    pub fn new(book_id: &str, summary: LengthBounds) -> Self {
        Self {
            book_id: book_id.to_string(),
            form: FormState::blank(Validator::book(summary)),
            owner_id: None,
        }
    }

    /// Fetch the book and prefill the form. Non-owners are turned away to the
    /// details page.
    pub fn load<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        if !lib.auth().is_authenticated() {
            return Outcome::Navigate(Route::Login);
        }
        let request = lib.api().build_get_book(&self.book_id);
        let book = match lib.fetch(request, CatalogApi::parse_book) {
            Ok(book) => book,
            Err(e) => return error_outcome(e, self.details()),
        };
        if !lib.auth().is_owner(&book.owner_id) {
            return error_outcome(ApiError::Forbidden(NOT_OWNER.to_string()), self.details());
        }
        self.form.set_values(book.to_form_values());
        self.owner_id = Some(book.owner_id);
        Outcome::Stay
    }

    pub fn submit<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        let owned = self.owner_id.as_deref().is_some_and(|owner| lib.auth().is_owner(owner));
        let book_id = self.book_id.clone();
        let outcome = self.form.handle_submit(|values, _| {
            let token = lib.auth().require_token()?;
            if !owned {
                return Err(ApiError::Forbidden(NOT_OWNER.to_string()));
            }
            let request = lib
                .api()
                .build_update_book(&book_id, &NewBook::from_values(values), token)?;
            lib.fetch(request, CatalogApi::parse_book)
        });
        submit_outcome(outcome, self.details(), self.details())
    }

    fn details(&self) -> Route {
        Route::Details(self.book_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::RecordingTransport;
    use crate::views::fixtures;

    #[test]
    fn owner_gets_prefilled_form() {
        let transport = RecordingTransport::new();
        let lib = fixtures::signed_in(&transport, "u1");
        transport.push_json(200, fixtures::book_json("b1", "u1"));

        let mut view = EditBookView::new("b1", LengthBounds::default());
        assert_eq!(view.load(&lib), Outcome::Stay);
        assert_eq!(view.form.value("title"), "Dune");
        assert!(!view.form.is_touched("title"));
    }

    #[test]
    fn non_owner_is_redirected_without_update() {
        let transport = RecordingTransport::new();
        let lib = fixtures::signed_in(&transport, "u2");
        transport.push_json(200, fixtures::book_json("b1", "u1"));

        let mut view = EditBookView::new("b1", LengthBounds::default());
        assert_eq!(
            view.load(&lib),
            Outcome::Denied {
                message: NOT_OWNER.to_string(),
                redirect: Route::Details("b1".into())
            }
        );

        view.form.set_values(
            [
                ("title", "Hijacked"),
                ("author", "X"),
                ("genre", "Y"),
                ("date", "2024-01-01"),
                ("summary", "Long enough summary."),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        );
        assert!(matches!(view.submit(&lib), Outcome::Denied { .. }));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
    }

    #[test]
    fn owner_update_goes_to_details() {
        let transport = RecordingTransport::new();
        let lib = fixtures::signed_in(&transport, "u1");
        transport.push_json(200, fixtures::book_json("b1", "u1"));
        let mut updated = fixtures::book_json("b1", "u1");
        updated["title"] = json!("Dune Messiah");
        transport.push_json(200, updated);

        let mut view = EditBookView::new("b1", LengthBounds::default());
        view.load(&lib);
        view.form.register("title").on_change("Dune Messiah");

        assert_eq!(view.submit(&lib), Outcome::Navigate(Route::Details("b1".into())));
        let requests = transport.requests();
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].path, "http://localhost:3030/data/books/b1");
        let body: serde_json::Value = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Dune Messiah");
    }

    #[test]
    fn missing_book_is_notified() {
        let transport = RecordingTransport::new();
        let lib = fixtures::signed_in(&transport, "u1");
        transport.push_json(404, json!({"message": "Resource not found"}));

        let mut view = EditBookView::new("nope", LengthBounds::default());
        assert_eq!(view.load(&lib), Outcome::Notify("Resource not found".into()));
    }

    #[test]
    fn anonymous_user_is_sent_to_login() {
        let transport = RecordingTransport::new();
        let lib = fixtures::anonymous(&transport);
        let mut view = EditBookView::new("b1", LengthBounds::default());
        assert_eq!(view.load(&lib), Outcome::Navigate(Route::Login));
        assert_eq!(transport.request_count(), 0);
    }
}
