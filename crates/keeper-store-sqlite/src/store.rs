//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use keeper_core::{
  contact::{Contact, ContactFields, NewContact},
  store::ContactStore,
  user::User,
};

use crate::{
  encode::{CONTACT_COLUMNS, RawContact, RawUser, encode_dt, encode_uuid, now},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Keeper store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, username: &str, password_hash: &str) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      username.to_owned(),
      password_hash: password_hash.to_owned(),
      created_at:    now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.clone();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(user.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, hash, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(keeper_core::Error::UsernameTaken(user.username).into());
    }
    tracing::debug!(user_id = %user.user_id, username = %user.username, "user created");
    Ok(user)
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let name = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, password_hash, created_at
             FROM users WHERE username = ?1",
            rusqlite::params![name],
            |row| {
              Ok(RawUser {
                user_id:       row.get(0)?,
                username:      row.get(1)?,
                password_hash: row.get(2)?,
                created_at:    row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn list_contacts(&self, owner_id: Uuid) -> Result<Vec<Contact>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE owner_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn get_contact(&self, contact_id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(contact_id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1"),
            rusqlite::params![id_str],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn add_contact(&self, input: NewContact) -> Result<Contact> {
    let contact = Contact {
      contact_id: Uuid::new_v4(),
      owner_id:   input.owner_id,
      created_at: now(),
      fields:     input.fields,
    };

    let id_str    = encode_uuid(contact.contact_id);
    let owner_str = encode_uuid(contact.owner_id);
    let at_str    = encode_dt(contact.created_at);
    let fields    = contact.fields.clone();

    let owner_exists: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![owner_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO contacts (
             contact_id, owner_id, name, email, phone, kind, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            owner_str,
            fields.name,
            fields.email,
            fields.phone,
            fields.kind,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !owner_exists {
      return Err(keeper_core::Error::UserNotFound(contact.owner_id).into());
    }
    Ok(contact)
  }

  async fn update_contact(
    &self,
    contact_id: Uuid,
    fields:     ContactFields,
  ) -> Result<Option<Contact>> {
    let id_str = encode_uuid(contact_id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE contacts SET name = ?2, email = ?3, phone = ?4, kind = ?5
           WHERE contact_id = ?1",
          rusqlite::params![id_str, fields.name, fields.email, fields.phone, fields.kind],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE contact_id = ?1"),
          rusqlite::params![id_str],
          RawContact::from_row,
        )?))
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn delete_contact(&self, contact_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(contact_id);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contacts WHERE contact_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
