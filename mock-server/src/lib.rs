//! In-memory stand-in for the catalog's practice backend.
//!
//! Serves `/users/{register,login,logout,me}` and generic `/data/{collection}`
//! CRUD. Records are schemaless JSON objects stamped with `_id`, `_ownerId`
//! and `_createdOn`. Writes need an `X-Authorization` token; only a record's
//! owner may replace or delete it.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

pub const AUTH_HEADER: &str = "x-authorization";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(rename = "_createdOn")]
    pub created_on: i64,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct Store {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    collections: HashMap<String, Vec<Value>>,
}

impl Store {
    fn user_for(&self, headers: &HeaderMap) -> Result<&User, ServerError> {
        let token = headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::new(StatusCode::UNAUTHORIZED, "Unauthorized"))?;
        self.tokens
            .get(token)
            .and_then(|id| self.users.get(id))
            .ok_or_else(|| ServerError::new(StatusCode::FORBIDDEN, "Invalid access token"))
    }

    fn issue_session(&mut self, user: &User) -> Value {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user.id.clone());
        json!({
            "_id": user.id,
            "username": user.username,
            "email": user.email,
            "accessToken": token,
            "_createdOn": user.created_on,
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error reply in the backend's `{ message, code }` shape.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    message: String,
}

impl ServerError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found")
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.message, "code": self.status.as_u16() });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", get(logout))
        .route("/users/me", get(me))
        .route("/data/{collection}", get(list_records).post(create_record))
        .route(
            "/data/{collection}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterUser>) -> Result<Json<Value>, ServerError> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ServerError::new(StatusCode::BAD_REQUEST, "Missing fields"));
    }
    let mut store = db.write().await;
    if store.users.values().any(|u| u.email == input.email) {
        return Err(ServerError::new(
            StatusCode::CONFLICT,
            "A user with the same email already exists",
        ));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: input.username,
        email: input.email,
        password: input.password,
        created_on: now_millis(),
    };
    store.users.insert(user.id.clone(), user.clone());
    debug!(user = %user.id, "registered");
    Ok(Json(store.issue_session(&user)))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginUser>) -> Result<Json<Value>, ServerError> {
    let mut store = db.write().await;
    let user = store
        .users
        .values()
        .find(|u| u.email == input.email && u.password == input.password)
        .cloned()
        .ok_or_else(|| ServerError::new(StatusCode::FORBIDDEN, "Login or password don't match"))?;
    Ok(Json(store.issue_session(&user)))
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, ServerError> {
    let mut store = db.write().await;
    store.user_for(&headers)?;
    if let Some(token) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        store.tokens.remove(token);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, ServerError> {
    let store = db.read().await;
    store.user_for(&headers).cloned().map(Json)
}

/// Query options understood by collection listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "where")]
    pub filter: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
    pub offset: Option<usize>,
}

/// Parse `field="value"` (quotes optional) into its parts. Inside quotes,
/// `\"` and `\\` stand for a literal quote and backslash.
pub fn parse_where(clause: &str) -> Option<(String, String)> {
    let (field, value) = clause.split_once('=')?;
    let value = value.trim();
    let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(quoted) => unescape(quoted),
        None => value.to_string(),
    };
    Some((field.trim().to_string(), value))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            other => out.push(other),
        }
    }
    out
}

fn field_matches(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

async fn list_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Value>>, ServerError> {
    let store = db.read().await;
    let mut records: Vec<Value> = store.collections.get(&collection).cloned().unwrap_or_default();

    if let Some(clause) = &query.filter {
        let (field, value) = parse_where(clause)
            .ok_or_else(|| ServerError::new(StatusCode::BAD_REQUEST, "Invalid where clause"))?;
        records.retain(|r| field_matches(r, &field, &value));
    }
    if let Some(sort) = &query.sort_by {
        let mut parts = sort.split_whitespace();
        let field = parts.next().unwrap_or_default().to_string();
        let descending = parts.next().is_some_and(|d| d.eq_ignore_ascii_case("desc"));
        records.sort_by(|a, b| {
            let ord = compare_field(a, b, &field);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
    let offset = query.offset.unwrap_or(0);
    let records = records
        .into_iter()
        .skip(offset)
        .take(query.page_size.unwrap_or(usize::MAX))
        .collect();
    Ok(Json(records))
}

async fn create_record(
    State(db): State<Db>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ServerError> {
    let mut store = db.write().await;
    let owner = store.user_for(&headers)?.id.clone();
    let Value::Object(mut fields) = input else {
        return Err(ServerError::new(StatusCode::BAD_REQUEST, "Expected a JSON object"));
    };
    fields.insert("_id".into(), json!(Uuid::new_v4().to_string()));
    fields.insert("_ownerId".into(), json!(owner));
    fields.insert("_createdOn".into(), json!(now_millis()));
    let record = Value::Object(fields);
    store
        .collections
        .entry(collection.clone())
        .or_default()
        .push(record.clone());
    debug!(%collection, "record created");
    Ok(Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    let store = db.read().await;
    store
        .collections
        .get(&collection)
        .and_then(|records| records.iter().find(|r| r["_id"] == id.as_str()))
        .cloned()
        .map(Json)
        .ok_or_else(ServerError::not_found)
}

/// Locate a record the caller owns, returning its index.
fn owned_index(store: &Store, headers: &HeaderMap, collection: &str, id: &str) -> Result<usize, ServerError> {
    let user_id = store.user_for(headers)?.id.clone();
    let records = store.collections.get(collection).ok_or_else(ServerError::not_found)?;
    let index = records
        .iter()
        .position(|r| r["_id"] == id)
        .ok_or_else(ServerError::not_found)?;
    if records[index]["_ownerId"] != user_id.as_str() {
        return Err(ServerError::new(StatusCode::FORBIDDEN, "You are not the owner of this record"));
    }
    Ok(index)
}

async fn update_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ServerError> {
    let mut store = db.write().await;
    let index = owned_index(&store, &headers, &collection, &id)?;
    let Value::Object(mut fields) = input else {
        return Err(ServerError::new(StatusCode::BAD_REQUEST, "Expected a JSON object"));
    };
    let records = store.collections.get_mut(&collection).ok_or_else(ServerError::not_found)?;
    let existing: Map<String, Value> = records[index].as_object().cloned().unwrap_or_default();
    for key in ["_id", "_ownerId", "_createdOn"] {
        if let Some(v) = existing.get(key) {
            fields.insert(key.to_string(), v.clone());
        }
    }
    fields.insert("_updatedOn".into(), json!(now_millis()));
    records[index] = Value::Object(fields);
    Ok(Json(records[index].clone()))
}

async fn delete_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let mut store = db.write().await;
    let index = owned_index(&store, &headers, &collection, &id)?;
    if let Some(records) = store.collections.get_mut(&collection) {
        records.remove(index);
    }
    Ok(StatusCode::NO_CONTENT)
}
