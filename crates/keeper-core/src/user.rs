//! User — the account that owns contacts and authenticates requests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered account.
///
/// Deliberately not `Serialize`: the password hash must never reach a
/// response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}
