use crate::app::Library;
use crate::catalog::CatalogApi;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::types::Book;
use crate::views::{error_outcome, Outcome, Route};

/// Number of books shown on the home page.
pub const LATEST_LIMIT: usize = 3;

/// All books.
#[derive(Debug, Default)]
pub struct CatalogView {
    pub books: Vec<Book>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        match lib.fetch(lib.api().build_list_books(), CatalogApi::parse_books) {
            Ok(books) => {
                self.books = books;
                Outcome::Stay
            }
            Err(e) => error_outcome(e, Route::Home),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// The newest few books.
#[derive(Debug, Default)]
pub struct HomeView {
    pub latest: Vec<Book>,
}

impl HomeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_latest<T: Transport, S: KeyValueStore>(&mut self, lib: &Library<T, S>) -> Outcome {
        match lib.fetch(lib.api().build_latest_books(LATEST_LIMIT), CatalogApi::parse_books) {
            Ok(mut books) => {
                books.sort_by(|a, b| b.created_on.cmp(&a.created_on));
                books.truncate(LATEST_LIMIT);
                self.latest = books;
                Outcome::Stay
            }
            Err(e) => error_outcome(e, Route::Home),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::RecordingTransport;
    use crate::views::fixtures;

    #[test]
    fn catalog_loads_all_books() {
        let transport = RecordingTransport::new();
        let lib = fixtures::anonymous(&transport);
        transport.push_json(200, json!([fixtures::book_json("b1", "u1"), fixtures::book_json("b2", "u2")]));

        let mut view = CatalogView::new();
        assert_eq!(view.load(&lib), Outcome::Stay);
        assert_eq!(view.books.len(), 2);
    }

    #[test]
    fn catalog_load_failure_notifies() {
        let transport = RecordingTransport::new();
        let lib = fixtures::anonymous(&transport);
        transport.push_failure("connection refused");

        let mut view = CatalogView::new();
        assert!(matches!(view.load(&lib), Outcome::Notify(_)));
        assert!(view.is_empty());
    }

    #[test]
    fn home_keeps_newest_three() {
        let transport = RecordingTransport::new();
        let lib = fixtures::anonymous(&transport);
        let books: Vec<_> = (1..=4)
            .map(|i| {
                let mut b = fixtures::book_json(&format!("b{i}"), "u1");
                b["_createdOn"] = json!(i);
                b
            })
            .collect();
        transport.push_json(200, json!(books));

        let mut view = HomeView::new();
        view.load_latest(&lib);
        let ids: Vec<_> = view.latest.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b4", "b3", "b2"]);
        assert!(transport.requests()[0].path.ends_with("pageSize=3"));
    }
}
