//! Contact — the address-book entry owned by exactly one user.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted contact, as returned by the store.
///
/// `contact_id`, `owner_id` and `created_at` are fixed at insert time.
/// Only the [`ContactFields`] portion is ever rewritten.
///
/// Not serialisable: the HTTP layer maps it to its own view type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
  pub contact_id: Uuid,
  pub owner_id:   Uuid,
  pub created_at: DateTime<Utc>,
  pub fields:     ContactFields,
}

/// The client-editable part of a contact.
///
/// An update replaces every field, so `None` clears a previously stored
/// value rather than leaving it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
  pub name:  String,
  pub email: Option<String>,
  pub phone: Option<String>,
  /// Free-form category label such as `personal` or `professional`.
  pub kind:  Option<String>,
}

impl ContactFields {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }
}

/// Input to [`ContactStore::add_contact`](crate::store::ContactStore::add_contact).
///
/// The store assigns `contact_id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub owner_id: Uuid,
  pub fields:   ContactFields,
}

impl NewContact {
  pub fn new(owner_id: Uuid, fields: ContactFields) -> Self {
    Self { owner_id, fields }
  }
}

impl Contact {
  /// Whether `user_id` owns this contact.
  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.owner_id == user_id }
}
