//! Handlers for `/contacts` endpoints.
//!
//! Every route requires an authenticated [`AuthUser`]; contacts are only ever
//! visible to and mutable by their owner.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | Caller's contacts, newest first |
//! | `POST`   | `/contacts` | Body: [`ContactBody`]; 400 `{"errors":[…]}` on validation failure |
//! | `PUT`    | `/contacts/:id` | Full overwrite; returns the updated contact |
//! | `DELETE` | `/contacts/:id` | Returns `{"id":"…"}` |

use std::sync::{Arc, LazyLock};

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use keeper_core::{
  contact::{Contact, ContactFields, NewContact},
  store::ContactStore,
  validate::{Check, Rule, Schema},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

/// Upper bound on `name`, well above any real name.
const MAX_NAME_LEN: usize = 1000;

// ─── Request / response shapes ────────────────────────────────────────────────

/// JSON body accepted by `POST /contacts` and `PUT /contacts/:id`.
///
/// Unknown keys (including any attempt to set an owner) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ContactBody {
  /// Optional echo of the target id on update; must match the path if set.
  #[serde(rename = "_id")]
  pub id:    Option<Uuid>,
  pub name:  Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  #[serde(rename = "type")]
  pub kind:  Option<String>,
}

impl ContactBody {
  fn into_fields(self) -> ContactFields {
    ContactFields {
      name:  self.name.unwrap_or_default(),
      email: self.email,
      phone: self.phone,
      kind:  self.kind,
    }
  }
}

fn body_name(b: &ContactBody) -> Option<&str> { b.name.as_deref() }

/// Rules applied to every contact body, on create and on update.
///
/// `email`, `phone` and `type` are free-form and stored exactly as sent.
static CONTACT_SCHEMA: LazyLock<Schema<ContactBody>> = LazyLock::new(|| {
  Schema::new()
    .rule(Rule::new("name", body_name, Check::NotEmpty, "Name is required"))
    .rule(Rule::new("name", body_name, Check::MaxLength(MAX_NAME_LEN), "Name is too long"))
});

/// The JSON shape of a contact sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
  pub id:         Uuid,
  pub owner:      Uuid,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  #[serde(rename = "type")]
  pub kind:       Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<Contact> for ContactView {
  fn from(c: Contact) -> Self {
    ContactView {
      id:         c.contact_id,
      owner:      c.owner_id,
      name:       c.fields.name,
      email:      c.fields.email,
      phone:      c.fields.phone,
      kind:       c.fields.kind,
      created_at: c.created_at,
    }
  }
}

/// Response body of `DELETE /contacts/:id`.
#[derive(Debug, Serialize)]
pub struct Deleted {
  pub id: Uuid,
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
) -> Result<Json<Vec<ContactView>>, ApiError>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contacts = store
    .list_contacts(user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(contacts.into_iter().map(ContactView::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /contacts` — the owner is always the caller.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  body: Result<Json<ContactBody>, JsonRejection>,
) -> Result<Json<ContactView>, ApiError>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Json(body) = body?;
  CONTACT_SCHEMA.validate(&body)?;

  let contact = store
    .add_contact(NewContact::new(user.user_id, body.into_fields()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(contact_id = %contact.contact_id, owner = %user.username, "contact created");
  Ok(Json(ContactView::from(contact)))
}

// ─── Ownership ────────────────────────────────────────────────────────────────

/// Load `id` and check that `user` owns it.
async fn owned_contact<S>(store: &S, user: &AuthUser, id: Uuid) -> Result<Contact, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let contact = store
    .get_contact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;

  if !contact.is_owned_by(user.user_id) {
    return Err(ApiError::Forbidden(id));
  }
  Ok(contact)
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /contacts/:id` — overwrites name, email, phone and type.
///
/// Fields missing from the body are cleared. The path id selects the record;
/// a body `_id`, if present, must agree with it. Ownership is settled before
/// the body is looked at.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(id): Path<Uuid>,
  body: Result<Json<ContactBody>, JsonRejection>,
) -> Result<Json<ContactView>, ApiError>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_contact(store.as_ref(), &user, id).await?;

  let Json(body) = body?;
  if let Some(body_id) = body.id
    && body_id != id
  {
    return Err(ApiError::BadRequest(format!(
      "body _id {body_id} does not match path id {id}"
    )));
  }
  CONTACT_SCHEMA.validate(&body)?;

  let contact = store
    .update_contact(id, body.into_fields())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;

  tracing::info!(contact_id = %id, owner = %user.username, "contact updated");
  Ok(Json(ContactView::from(contact)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  user: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  owned_contact(store.as_ref(), &user, id).await?;

  let removed = store
    .delete_contact(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !removed {
    return Err(ApiError::NotFound(format!("contact {id} not found")));
  }

  tracing::info!(contact_id = %id, owner = %user.username, "contact deleted");
  Ok(Json(Deleted { id }))
}
