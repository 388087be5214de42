//! Domain DTOs for the catalog backend.
//!
//! # Design
//! Field names follow the backend's JSON (`_id`, `_ownerId`, camelCase).
//! Records are mostly opaque to the client: only the fields the views show or
//! the owner check needs are typed, and missing display fields default to
//! empty strings so a sparse record still deserializes.

use serde::{Deserialize, Serialize};

use crate::validate::FormValues;

/// Image used when a book is saved without one.
pub const NO_IMAGE_URL: &str = "/images/book-no-image-available.jpg";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_ownerId", default)]
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "_createdOn", default)]
    pub created_on: i64,
}

impl Book {
    /// The editable fields as form values.
    pub fn to_form_values(&self) -> FormValues {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("genre", &self.genre),
            ("date", &self.date),
            ("imageUrl", &self.image_url),
            ("summary", &self.summary),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// Payload for creating or replacing a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub date: String,
    pub image_url: String,
    pub summary: String,
}

impl NewBook {
    /// Build from submitted form values; a blank image URL falls back to
    /// `NO_IMAGE_URL`.
    pub fn from_values(values: &FormValues) -> Self {
        let field = |name: &str| values.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
        let image_url = field("imageUrl");
        Self {
            title: field("title"),
            author: field("author"),
            genre: field("genre"),
            date: field("date"),
            image_url: if image_url.is_empty() {
                NO_IMAGE_URL.to_string()
            } else {
                image_url
            },
            summary: field("summary"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_ownerId", default)]
    pub owner_id: String,
    pub book_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub book_id: String,
    pub text: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_ownerId", default)]
    pub owner_id: String,
    pub book_id: String,
}

/// A borrow record joined with its book. `book` is `None` when the book no
/// longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedBook {
    pub record: BorrowRecord,
    pub book: Option<Book>,
}
