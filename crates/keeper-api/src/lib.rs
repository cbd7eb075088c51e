//! JSON REST API for the Keeper address book.
//!
//! Exposes an axum [`Router`] backed by any [`keeper_core::store::ContactStore`].
//! Every `/api` route authenticates the caller with HTTP Basic credentials
//! checked against the store's users.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = keeper_api::router(Arc::new(store));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod contacts;
pub mod error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, put},
};
use keeper_core::store::ContactStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `KEEPER_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the `/api` router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route("/contacts/{id}", put(contacts::update::<S>).delete(contacts::delete::<S>))
    .route("/auth", get(auth::whoami::<S>))
    .with_state(store)
}

/// The full application: `/health`, the API under `/api`, and request tracing.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(store))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use keeper_core::{
    contact::{Contact, ContactFields, NewContact},
    user::User,
  };
  use keeper_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::{auth::hash_password, contacts::ContactView};

  const PASSWORD: &str = "secret";

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn add_user(store: &SqliteStore, username: &str) -> User {
    store
      .add_user(username, &hash_password(PASSWORD).unwrap())
      .await
      .unwrap()
  }

  fn auth_header(user: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{PASSWORD}")))
  }

  async fn send(
    store:  Arc<SqliteStore>,
    method: &str,
    uri:    &str,
    user:   Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(u) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(u));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(store).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn create(store: &Arc<SqliteStore>, user: &str, name: &str) -> ContactView {
    let resp = send(
      store.clone(),
      "POST",
      "/api/contacts",
      Some(user),
      Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(json_body(resp).await).unwrap()
  }

  async fn list(store: &Arc<SqliteStore>, user: &str) -> Vec<ContactView> {
    let resp = send(store.clone(), "GET", "/api/contacts", Some(user), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(json_body(resp).await).unwrap()
  }

  // ── Health ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let resp = send(make_store().await, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn every_contact_route_requires_auth() {
    let store = make_store().await;
    let id = Uuid::new_v4();
    for (method, uri) in [
      ("GET", "/api/contacts".to_string()),
      ("POST", "/api/contacts".to_string()),
      ("PUT", format!("/api/contacts/{id}")),
      ("DELETE", format!("/api/contacts/{id}")),
      ("GET", "/api/auth".to_string()),
    ] {
      let resp = send(store.clone(), method, &uri, None, Some(json!({ "name": "x" }))).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
  }

  #[tokio::test]
  async fn whoami_returns_caller() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;
    let resp = send(store, "GET", "/api/auth", Some("alice"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["id"], json!(alice.user_id));
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());
  }

  // ── Create ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_assigns_id_and_owner() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;

    let resp = send(
      store.clone(),
      "POST",
      "/api/contacts",
      Some("alice"),
      Some(json!({ "name": "Ana" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["owner"], json!(alice.user_id));
    assert!(body["id"].as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()));
    assert_eq!(body["email"], Value::Null);
    assert_eq!(body["type"], Value::Null);
  }

  #[tokio::test]
  async fn create_ignores_owner_in_body() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;
    let bob = add_user(&store, "bob").await;

    let resp = send(
      store.clone(),
      "POST",
      "/api/contacts",
      Some("alice"),
      Some(json!({ "name": "Ana", "owner": bob.user_id, "user": bob.user_id })),
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["owner"], json!(alice.user_id));
    assert!(list(&store, "bob").await.is_empty());
  }

  #[tokio::test]
  async fn create_keeps_optional_fields() {
    let store = make_store().await;
    add_user(&store, "alice").await;

    let resp = send(
      store,
      "POST",
      "/api/contacts",
      Some("alice"),
      Some(json!({
        "name": "Ana", "email": "ana@example.com", "phone": "555-0100", "type": "professional"
      })),
    )
    .await;
    let body = json_body(resp).await;
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["phone"], "555-0100");
    assert_eq!(body["type"], "professional");
  }

  #[tokio::test]
  async fn create_without_name_is_rejected() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;

    for body in [json!({}), json!({ "name": "" }), json!({ "name": "   " })] {
      let resp = send(store.clone(), "POST", "/api/contacts", Some("alice"), Some(body)).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
      let body = json_body(resp).await;
      let errors = body["errors"].as_array().unwrap();
      assert!(errors.iter().any(|e| e["field"] == "name"), "{body}");
    }

    assert!(store.list_contacts(alice.user_id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn optional_fields_are_stored_as_sent() {
    let store = make_store().await;
    add_user(&store, "alice").await;

    for (email, phone) in [("", ""), ("ana at home", "call after 6")] {
      let resp = send(
        store.clone(),
        "POST",
        "/api/contacts",
        Some("alice"),
        Some(json!({ "name": "Ana", "email": email, "phone": phone, "type": "personal" })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK, "{email:?}");
      let view: ContactView = serde_json::from_value(json_body(resp).await).unwrap();
      assert_eq!(view.email.as_deref(), Some(email));
      assert_eq!(view.phone.as_deref(), Some(phone));
    }

    assert_eq!(list(&store, "alice").await.len(), 2);
  }

  #[tokio::test]
  async fn name_whitespace_is_preserved() {
    let store = make_store().await;
    add_user(&store, "alice").await;

    let view = create(&store, "alice", "  Ana  ").await;
    assert_eq!(view.name, "  Ana  ");
    assert_eq!(list(&store, "alice").await[0].name, "  Ana  ");
  }

  async fn send_raw(
    store:        Arc<SqliteStore>,
    content_type: Option<&str>,
    body:         &str,
  ) -> Response {
    let mut builder = Request::builder()
      .method("POST")
      .uri("/api/contacts")
      .header(header::AUTHORIZATION, auth_header("alice"));
    if let Some(ct) = content_type {
      builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(store).oneshot(req).await.unwrap()
  }

  #[tokio::test]
  async fn unreadable_bodies_use_the_errors_shape() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;

    for (content_type, body) in [
      (Some("application/json"), r#"{"name":5}"#),
      (Some("application/json"), r#"{"name":"Ana""#),
      (None, r#"{"name":"Ana"}"#),
    ] {
      let resp = send_raw(store.clone(), content_type, body).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
      let json = json_body(resp).await;
      let errors = json["errors"].as_array().unwrap();
      assert_eq!(errors.len(), 1, "{json}");
      assert_eq!(errors[0]["field"], "body");
      assert_eq!(errors[0]["location"], "body");
      assert!(errors[0]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let resp = send_raw(store.clone(), Some("application/json"), r#"{"name":5}"#).await;
    let json = json_body(resp).await;
    assert!(json["errors"][0]["message"].as_str().unwrap().contains("name"), "{json}");

    assert!(store.list_contacts(alice.user_id).await.unwrap().is_empty());
  }

  // ── List ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_is_newest_first() {
    let store = make_store().await;
    add_user(&store, "alice").await;

    let a = create(&store, "alice", "A").await;
    let b = create(&store, "alice", "B").await;
    let c = create(&store, "alice", "C").await;

    let ids: Vec<Uuid> = list(&store, "alice").await.into_iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
  }

  #[tokio::test]
  async fn list_never_shows_other_users_contacts() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;
    add_user(&store, "bob").await;

    create(&store, "alice", "Ana").await;
    create(&store, "bob", "Ben").await;

    let listed = list(&store, "alice").await;
    assert_eq!(listed.len(), 1);
    assert!(listed.iter().all(|v| v.owner == alice.user_id));
  }

  #[tokio::test]
  async fn list_empty_is_empty_array() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    let resp = send(store, "GET", "/api/contacts", Some("alice"), None).await;
    assert_eq!(json_body(resp).await, json!([]));
  }

  // ── Update ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_overwrites_fields() {
    let store = make_store().await;
    let alice = add_user(&store, "alice").await;
    let original = store
      .add_contact(NewContact::new(
        alice.user_id,
        ContactFields {
          name:  "Ana".into(),
          email: Some("ana@example.com".into()),
          phone: Some("555-0100".into()),
          kind:  Some("personal".into()),
        },
      ))
      .await
      .unwrap();
    let id = original.contact_id;

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{id}"),
      Some("alice"),
      Some(json!({ "_id": id, "name": "Ana Maria", "phone": "555-0199", "type": "professional" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: ContactView = serde_json::from_value(json_body(resp).await).unwrap();
    assert_eq!(view.id, id);
    assert_eq!(view.owner, alice.user_id);
    assert_eq!(view.name, "Ana Maria");
    assert_eq!(view.email, None);
    assert_eq!(view.phone.as_deref(), Some("555-0199"));
    assert_eq!(view.kind.as_deref(), Some("professional"));

    let stored: Contact = store.get_contact(id).await.unwrap().unwrap();
    assert_eq!(stored.fields.name, "Ana Maria");
    assert_eq!(stored.fields.email, None);
    assert_eq!(stored.created_at, original.created_at);
  }

  #[tokio::test]
  async fn update_rejects_mismatched_body_id() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    let c = create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{}", c.id),
      Some("alice"),
      Some(json!({ "_id": Uuid::new_v4(), "name": "Eve" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(list(&store, "alice").await[0].name, "Ana");
  }

  #[tokio::test]
  async fn update_requires_name() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    let c = create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{}", c.id),
      Some("alice"),
      Some(json!({ "email": "ana@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(list(&store, "alice").await[0].name, "Ana");
  }

  #[tokio::test]
  async fn update_of_foreign_contact_is_forbidden() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    add_user(&store, "bob").await;
    let c = create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{}", c.id),
      Some("bob"),
      Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(list(&store, "alice").await[0].name, "Ana");
  }

  #[tokio::test]
  async fn update_missing_is_404() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    let resp = send(
      store,
      "PUT",
      &format!("/api/contacts/{}", Uuid::new_v4()),
      Some("alice"),
      Some(json!({ "name": "Ghost" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn ownership_is_checked_before_the_body() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    add_user(&store, "bob").await;
    let c = create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{}", c.id),
      Some("bob"),
      Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      store.clone(),
      "PUT",
      &format!("/api/contacts/{}", Uuid::new_v4()),
      Some("alice"),
      Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn non_uuid_path_id_is_400() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "PUT",
      "/api/contacts/not-a-uuid",
      Some("alice"),
      Some(json!({ "name": "Eve" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(store.clone(), "DELETE", "/api/contacts/not-a-uuid", Some("alice"), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let listed = list(&store, "alice").await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Ana");
  }

  // ── Delete ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_removes_only_target() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    let keep = create(&store, "alice", "Keep").await;
    let gone = create(&store, "alice", "Gone").await;

    let resp = send(
      store.clone(),
      "DELETE",
      &format!("/api/contacts/{}", gone.id),
      Some("alice"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "id": gone.id }));

    let remaining = list(&store, "alice").await;
    assert_eq!(remaining, vec![keep]);
  }

  #[tokio::test]
  async fn delete_missing_leaves_others() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "DELETE",
      &format!("/api/contacts/{}", Uuid::new_v4()),
      Some("alice"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(list(&store, "alice").await.len(), 1);
  }

  #[tokio::test]
  async fn delete_of_foreign_contact_is_forbidden() {
    let store = make_store().await;
    add_user(&store, "alice").await;
    add_user(&store, "bob").await;
    let c = create(&store, "alice", "Ana").await;

    let resp = send(
      store.clone(),
      "DELETE",
      &format!("/api/contacts/{}", c.id),
      Some("bob"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(list(&store, "alice").await.len(), 1);
  }

  // ── Store failures ───────────────────────────────────────────────────────────

  /// Knows one user but fails every contact operation.
  struct BrokenStore {
    user: User,
  }

  impl ContactStore for BrokenStore {
    type Error = std::io::Error;
    async fn add_user(&self, _: &str, _: &str) -> Result<User, Self::Error> { unimplemented!() }
    async fn get_user_by_username(&self, name: &str) -> Result<Option<User>, Self::Error> {
      Ok((name == self.user.username).then(|| self.user.clone()))
    }
    async fn list_contacts(&self, _: Uuid) -> Result<Vec<Contact>, Self::Error> { Err(std::io::Error::other("down")) }
    async fn get_contact(&self, _: Uuid) -> Result<Option<Contact>, Self::Error> { Err(std::io::Error::other("down")) }
    async fn add_contact(&self, _: NewContact) -> Result<Contact, Self::Error> { Err(std::io::Error::other("down")) }
    async fn update_contact(&self, _: Uuid, _: ContactFields) -> Result<Option<Contact>, Self::Error> { Err(std::io::Error::other("down")) }
    async fn delete_contact(&self, _: Uuid) -> Result<bool, Self::Error> { Err(std::io::Error::other("down")) }
  }

  #[tokio::test]
  async fn store_failures_are_generic_500() {
    let store = Arc::new(BrokenStore {
      user: User {
        user_id:       Uuid::new_v4(),
        username:      "alice".into(),
        password_hash: hash_password(PASSWORD).unwrap(),
        created_at:    chrono::Utc::now(),
      },
    });
    let id = Uuid::new_v4();

    for (method, uri, body) in [
      ("GET", "/api/contacts".to_string(), None),
      ("POST", "/api/contacts".to_string(), Some(json!({ "name": "Ana" }))),
      ("PUT", format!("/api/contacts/{id}"), Some(json!({ "name": "Ana" }))),
      ("DELETE", format!("/api/contacts/{id}"), None),
    ] {
      let mut builder = Request::builder()
        .method(method)
        .uri(&uri)
        .header(header::AUTHORIZATION, auth_header("alice"));
      let req = match body {
        Some(v) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          builder.body(Body::from(v.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
      };
      let resp = router(store.clone()).oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      assert_eq!(&bytes[..], b"Server Error");
    }
  }
}
