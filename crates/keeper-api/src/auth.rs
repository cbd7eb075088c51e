//! HTTP Basic-auth extractor resolving the calling user.
//!
//! Credentials are checked against the argon2 hash stored with each user.
//! A handler that takes an [`AuthUser`] argument only runs for an
//! authenticated request.

use std::sync::{Arc, LazyLock};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use keeper_core::{store::ContactStore, user::User};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// The identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

impl From<User> for AuthUser {
  fn from(u: User) -> Self {
    Self {
      user_id:    u.user_id,
      username:   u.username,
      created_at: u.created_at,
    }
  }
}

/// Hash `password` into an argon2 PHC string suitable for
/// [`ContactStore::add_user`].
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Verified against when the named user does not exist, so an unknown
/// username costs the same argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<String> =
  LazyLock::new(|| hash_password("keeper-absent-user").unwrap_or_default());

/// Whether `password` matches the PHC string `hash`.
fn password_matches(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Split a `Basic` authorization header into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Resolve the user named in `headers` and verify their password.
pub async fn authenticate<S>(headers: &HeaderMap, store: &S) -> Result<AuthUser, ApiError>
where
  S: ContactStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let (username, password) = basic_credentials(headers)?;

  let user = store
    .get_user_by_username(&username)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let Some(user) = user else {
    password_matches(&password, &DUMMY_HASH);
    tracing::debug!(%username, "unknown user");
    return Err(ApiError::Unauthorized);
  };

  if !password_matches(&password, &user.password_hash) {
    tracing::debug!(%username, "password mismatch");
    return Err(ApiError::Unauthorized);
  }

  Ok(AuthUser::from(user))
}

impl<S> FromRequestParts<Arc<S>> for AuthUser
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, store.as_ref()).await
  }
}

// ─── Who am I ─────────────────────────────────────────────────────────────────

/// Public view of the calling user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
  pub id:         Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// `GET /auth`
pub async fn whoami<S>(user: AuthUser) -> Json<UserView>
where
  S: ContactStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Json(UserView {
    id:         user.user_id,
    username:   user.username,
    created_at: user.created_at,
  })
}
