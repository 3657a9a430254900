//! Credential store: user rows, password hashes and external identity links

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::User;
use super::validators::MAX_PASSWORD_BYTES;
use crate::common::{safe_email_log, ApiError};
use crate::oauth::Provider;

const USER_COLUMNS: &str = "id, created_at, updated_at, email, password_hash, first_name, \
                            last_name, phone, is_active, google_id, github_id, avatar_url, \
                            auth_provider";

/// Returned when a plaintext password does not match the stored hash
#[derive(Debug, Error, PartialEq, Eq)]
#[error("password does not match")]
pub struct PasswordMismatch;

/// Profile data for an account created through an external provider
#[derive(Debug, Clone)]
pub struct NewExternalUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: Provider,
    pub subject_id: String,
    pub avatar_url: Option<String>,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
}

fn violates_email_index(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation() && d.message().contains("users.email"))
        .unwrap_or(false)
}

pub struct UserRepository {
    db: SqlitePool,
    hash_cost: u32,
}

impl UserRepository {
    pub fn new(db: SqlitePool, hash_cost: u32) -> Self {
        Self { db, hash_cost }
    }

    // ============================================================================
    // Password hashing
    // ============================================================================

    async fn hash_password(&self, plaintext: &str) -> Result<String, ApiError> {
        let plaintext = plaintext.to_string();
        let cost = self.hash_cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| ApiError::InternalServer(format!("hashing task failed: {}", e)))?
            .map_err(|e| ApiError::InternalServer(format!("password hashing failed: {}", e)))
    }

    /// Constant-time check of a plaintext password against a bcrypt hash.
    /// An empty or malformed hash never matches, and neither does a
    /// plaintext longer than bcrypt's input limit.
    pub async fn verify_password(
        &self,
        plaintext: &str,
        stored_hash: &str,
    ) -> Result<(), PasswordMismatch> {
        if stored_hash.is_empty() || plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordMismatch);
        }

        let plaintext = plaintext.to_string();
        let stored_hash = stored_hash.to_string();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored_hash)).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(PasswordMismatch),
            Ok(Err(e)) => {
                warn!(error = %e, "Stored password hash could not be parsed");
                Err(PasswordMismatch)
            }
            Err(e) => {
                error!(error = %e, "Password verification task failed");
                Err(PasswordMismatch)
            }
        }
    }

    // ============================================================================
    // Local accounts
    // ============================================================================

    pub async fn create_local_user(
        &self,
        email: &str,
        plaintext_password: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<User, ApiError> {
        let password_hash = self.hash_password(plaintext_password).await?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                email, password_hash, first_name, last_name, phone, is_active,
                auth_provider, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, 1, 'email', ?, ?)
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::DuplicateEmail
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, email = %safe_email_log(email), "Created local user");

        self.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? AND is_active = 1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ? AND is_active = 1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ApiError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND is_active = 1)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    pub async fn update_profile(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, phone = ?, updated_at = ?
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn update_password(&self, id: i64, new_plaintext: &str) -> Result<(), ApiError> {
        let password_hash = self.hash_password(new_plaintext).await?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(&password_hash)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Soft delete: the row stays, lookups by id and email stop finding it
    pub async fn deactivate(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        info!(user_id = id, "User account deactivated");
        Ok(())
    }

    // ============================================================================
    // External identities
    // ============================================================================

    /// Looks up inactive rows too, so callers can refuse a deactivated
    /// account instead of creating a second one for the same subject.
    pub async fn find_by_external_id(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE {} = ?",
            USER_COLUMNS,
            provider.id_column()
        ))
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn create_external_user(&self, profile: &NewExternalUser) -> Result<User, ApiError> {
        let now = Utc::now().to_rfc3339();
        let (google_id, github_id) = match profile.provider {
            Provider::Google => (Some(profile.subject_id.as_str()), None),
            Provider::Github => (None, Some(profile.subject_id.as_str())),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                email, password_hash, first_name, last_name, is_active,
                google_id, github_id, avatar_url, auth_provider, created_at, updated_at
            )
            VALUES (?, '', ?, ?, 1, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(google_id)
        .bind(github_id)
        .bind(profile.avatar_url.as_deref())
        .bind(profile.provider.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if violates_email_index(&e) {
                ApiError::DuplicateEmail
            } else if is_unique_violation(&e) {
                ApiError::IdentityAlreadyLinked
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        let id = result.last_insert_rowid();
        info!(
            user_id = id,
            email = %safe_email_log(&profile.email),
            provider = profile.provider.as_str(),
            "Created user from external identity"
        );

        self.find_by_id(id).await
    }

    /// Attach external identity fields to an existing account and switch its
    /// provider tag. `None` subject ids keep whatever is already stored, so a
    /// previously linked provider stays linked.
    pub async fn link_external_identity(
        &self,
        user_id: i64,
        provider: Provider,
        google_id: Option<&str>,
        github_id: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET google_id = COALESCE(?, google_id),
                github_id = COALESCE(?, github_id),
                avatar_url = COALESCE(?, avatar_url),
                auth_provider = ?,
                updated_at = ?
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(google_id)
        .bind(github_id)
        .bind(avatar_url)
        .bind(provider.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::IdentityAlreadyLinked
            } else {
                ApiError::DatabaseError(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        info!(user_id = user_id, provider = provider.as_str(), "Linked external identity");
        Ok(())
    }

    /// Remove one provider's identity from an account. Refuses when the
    /// account would be left without any way to sign in.
    pub async fn unlink_external_identity(
        &self,
        user_id: i64,
        provider: Provider,
    ) -> Result<(), ApiError> {
        let user = self.find_by_id(user_id).await?;

        let (linked, other_linked, other) = match provider {
            Provider::Google => (user.google_id.is_some(), user.github_id.is_some(), Provider::Github),
            Provider::Github => (user.github_id.is_some(), user.google_id.is_some(), Provider::Google),
        };

        if !linked {
            return Err(ApiError::BadRequest(format!(
                "{} account is not linked",
                provider.as_str()
            )));
        }

        if !user.has_password() && !other_linked {
            return Err(ApiError::BadRequest(
                "Cannot unlink the only sign-in method for this account".to_string(),
            ));
        }

        // The tag only moves when it names the identity being removed
        let next_tag = if user.auth_provider != provider.as_str() {
            user.auth_provider.as_str()
        } else if user.has_password() {
            "email"
        } else {
            other.as_str()
        };

        sqlx::query(&format!(
            "UPDATE users SET {} = NULL, auth_provider = ?, updated_at = ? WHERE id = ?",
            provider.id_column()
        ))
        .bind(next_tag)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        info!(user_id = user_id, provider = provider.as_str(), "Unlinked external identity");
        Ok(())
    }
}
