//! Typed endpoints for books, comments and borrow records.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! caller executes the round-trip in between, usually through
//! `AuthCoordinator::execute`. Status and error-body handling is shared with
//! `RequestClient::parse_response`.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::RequestClient;
use crate::types::{Book, BorrowRecord, BorrowedBook, Comment, NewBook, NewComment};

#[derive(Debug, Clone)]
pub struct CatalogApi {
    client: RequestClient,
}

/// `where` clause matching `field` exactly, percent-encoded for the query.
/// Quotes and backslashes inside `value` are backslash-escaped.
fn where_eq(field: &str, value: &str) -> String {
    let value = value.replace('\\', "\\\\").replace('"', "\\\"");
    urlencoding::encode(&format!("{field}=\"{value}\"")).into_owned()
}

/// `base` followed by one percent-encoded path segment.
fn item_path(base: &str, id: &str) -> String {
    format!("{base}/{}", urlencoding::encode(id))
}

impl CatalogApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn build_list_books(&self) -> HttpRequest {
        self.client.build_empty("/data/books", HttpMethod::Get, None)
    }

    /// The `limit` most recently created books, newest first.
    pub fn build_latest_books(&self, limit: usize) -> HttpRequest {
        let path = format!("/data/books?sortBy={}&pageSize={limit}", urlencoding::encode("_createdOn desc"));
        self.client.build_empty(&path, HttpMethod::Get, None)
    }

    pub fn build_get_book(&self, id: &str) -> HttpRequest {
        self.client.build_empty(&item_path("/data/books", id), HttpMethod::Get, None)
    }

    pub fn build_create_book(&self, input: &NewBook, token: &str) -> Result<HttpRequest, ApiError> {
        self.client
            .build_request("/data/books", HttpMethod::Post, Some(input), Some(token))
    }

    pub fn build_update_book(&self, id: &str, input: &NewBook, token: &str) -> Result<HttpRequest, ApiError> {
        self.client
            .build_request(&item_path("/data/books", id), HttpMethod::Put, Some(input), Some(token))
    }

    pub fn build_delete_book(&self, id: &str, token: &str) -> HttpRequest {
        self.client
            .build_empty(&item_path("/data/books", id), HttpMethod::Delete, Some(token))
    }

    pub fn build_list_comments(&self, book_id: &str) -> HttpRequest {
        let path = format!("/data/comments?where={}", where_eq("bookId", book_id));
        self.client.build_empty(&path, HttpMethod::Get, None)
    }

    pub fn build_create_comment(&self, input: &NewComment, token: &str) -> Result<HttpRequest, ApiError> {
        self.client
            .build_request("/data/comments", HttpMethod::Post, Some(input), Some(token))
    }

    pub fn build_list_borrowed(&self, user_id: &str) -> HttpRequest {
        let path = format!("/data/borrowedBooks?where={}", where_eq("_ownerId", user_id));
        self.client.build_empty(&path, HttpMethod::Get, None)
    }

    pub fn build_return_book(&self, record_id: &str, token: &str) -> HttpRequest {
        self.client
            .build_empty(&item_path("/data/borrowedBooks", record_id), HttpMethod::Delete, Some(token))
    }

    pub fn parse_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        self.client.parse_as(response)
    }

    pub fn parse_book(&self, response: HttpResponse) -> Result<Book, ApiError> {
        self.client.parse_as(response)
    }

    pub fn parse_comments(&self, response: HttpResponse) -> Result<Vec<Comment>, ApiError> {
        self.client.parse_as(response)
    }

    pub fn parse_comment(&self, response: HttpResponse) -> Result<Comment, ApiError> {
        self.client.parse_as(response)
    }

    pub fn parse_borrowed(&self, response: HttpResponse) -> Result<Vec<BorrowRecord>, ApiError> {
        self.client.parse_as(response)
    }

    /// For deletes: any 2xx is success, the body is ignored.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.client.parse_response(response).map(|_| ())
    }
}

/// Pair each borrow record with its book, preserving record order.
pub fn join_borrowed(records: Vec<BorrowRecord>, books: &[Book]) -> Vec<BorrowedBook> {
    records
        .into_iter()
        .map(|record| {
            let book = books.iter().find(|b| b.id == record.book_id).cloned();
            BorrowedBook { record, book }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AUTH_HEADER;

    fn api() -> CatalogApi {
        CatalogApi::new(RequestClient::new("http://localhost:3030"))
    }

    fn new_book() -> NewBook {
        NewBook {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            genre: "Sci-fi".into(),
            date: "1965-08-01".into(),
            image_url: "/images/dune.jpg".into(),
            summary: "A desert planet and its spice.".into(),
        }
    }

    #[test]
    fn build_list_books_produces_correct_request() {
        let req = api().build_list_books();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3030/data/books");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_latest_books_sorts_and_pages() {
        let req = api().build_latest_books(3);
        assert_eq!(
            req.path,
            "http://localhost:3030/data/books?sortBy=_createdOn%20desc&pageSize=3"
        );
    }

    #[test]
    fn build_create_book_is_authorized_json() {
        let req = api().build_create_book(&new_book(), "tok").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header(AUTH_HEADER), Some("tok"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["imageUrl"], "/images/dune.jpg");
    }

    #[test]
    fn ids_are_encoded_as_one_path_segment() {
        assert_eq!(
            api().build_get_book("a/b c").path,
            "http://localhost:3030/data/books/a%2Fb%20c"
        );
        assert_eq!(
            api().build_delete_book("../users", "tok").path,
            "http://localhost:3030/data/books/..%2Fusers"
        );
        assert_eq!(
            api().build_return_book("r?1", "tok").path,
            "http://localhost:3030/data/borrowedBooks/r%3F1"
        );
    }

    #[test]
    fn where_clause_escapes_quotes() {
        let req = api().build_list_comments(r#"b"1"#);
        assert!(req.path.ends_with("where=bookId%3D%22b%5C%221%22"), "{}", req.path);
    }

    #[test]
    fn build_update_and_delete_target_the_record() {
        let req = api().build_update_book("b1", &new_book(), "tok").unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3030/data/books/b1");

        let req = api().build_delete_book("b1", "tok");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.header(AUTH_HEADER), Some("tok"));
        assert!(req.body.is_none());
    }

    #[test]
    fn where_clauses_are_encoded() {
        let req = api().build_list_comments("b1");
        assert_eq!(
            req.path,
            "http://localhost:3030/data/comments?where=bookId%3D%22b1%22"
        );
        let req = api().build_list_borrowed("u1");
        assert_eq!(
            req.path,
            "http://localhost:3030/data/borrowedBooks?where=_ownerId%3D%22u1%22"
        );
    }

    #[test]
    fn parse_book_not_found() {
        let err = api()
            .parse_book(HttpResponse::new(404, r#"{"message":"Resource not found","code":404}"#))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Resource not found");
    }

    #[test]
    fn parse_books_bad_json() {
        let err = api().parse_books(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_empty_accepts_no_content() {
        assert!(api().parse_empty(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn join_keeps_records_with_missing_books() {
        let records = vec![
            BorrowRecord { id: "r1".into(), owner_id: "u1".into(), book_id: "b1".into() },
            BorrowRecord { id: "r2".into(), owner_id: "u1".into(), book_id: "gone".into() },
        ];
        let books: Vec<Book> =
            serde_json::from_str(r#"[{"_id":"b1","title":"Dune"},{"_id":"b2","title":"Emma"}]"#).unwrap();

        let joined = join_borrowed(records, &books);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].book.as_ref().map(|b| b.title.as_str()), Some("Dune"));
        assert!(joined[1].book.is_none());
    }
}
