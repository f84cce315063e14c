use std::{collections::HashMap, io::Error, path::PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::{PendingAuthorization, UserToken};

#[derive(Debug)]
pub enum StoreError {
    IoError(Error),
    SerdeError(serde_json::Error),
    /// A write would break (or a read observed a break of) the uniqueness
    /// invariants on user token records.
    InvariantViolation(String),
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        StoreError::IoError(err)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    pending: HashMap<String, PendingAuthorization>,
    users: HashMap<String, UserToken>,
}

/// Durable keyed storage for short-lived PKCE verifiers and long-lived
/// per-user OAuth token records.
///
/// The whole store is a single JSON document guarded by a `RwLock`; every
/// mutation rewrites the document while still holding the write lock, so
/// concurrent request handlers see last-write-wins updates and never a torn
/// record.
pub struct CredentialStore {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl CredentialStore {
    /// Opens the store at `path`, loading the existing document if present.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let data = match async_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(StoreError::SerdeError)?,
            Err(_) => StoreData::default(),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Stores a pending authorization, overwriting any record with the same
    /// session id. Expired records are swept opportunistically on this write
    /// path; `get_pending` never returns them either way.
    pub async fn put_pending(
        &self,
        session_id: &str,
        code_verifier: Option<String>,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let mut data = self.data.write().await;
        data.pending.retain(|_, p| p.expires_at > now);
        data.pending.insert(
            session_id.to_string(),
            PendingAuthorization {
                session_id: session_id.to_string(),
                code_verifier,
                created_at: now,
                expires_at: now + ttl_secs,
            },
        );
        self.persist(&data).await
    }

    /// Returns the pending authorization for `session_id`, or `None` if the
    /// record is absent or past its expiry.
    pub async fn get_pending(&self, session_id: &str) -> Option<PendingAuthorization> {
        let now = Utc::now().timestamp();
        let data = self.data.read().await;
        data.pending
            .get(session_id)
            .filter(|p| now < p.expires_at)
            .cloned()
    }

    /// Removes the pending authorization for `session_id`; removing an
    /// absent record is not an error.
    pub async fn delete_pending(&self, session_id: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.pending.remove(session_id).is_none() {
            return Ok(());
        }
        self.persist(&data).await
    }

    /// Creates or overwrites the single token record for `user_id`.
    ///
    /// When `refresh_token` is `None` the previously stored refresh token is
    /// preserved unchanged; the provider does not rotate it on every refresh.
    /// Rejects writes that would leave two live records sharing an access
    /// token value.
    pub async fn upsert_user_token(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<String>,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().await;

        if data
            .users
            .values()
            .any(|u| u.access_token == access_token && u.user_id != user_id)
        {
            return Err(StoreError::InvariantViolation(format!(
                "access token already held by another user record (user {})",
                user_id
            )));
        }

        let refresh_token = match refresh_token {
            Some(token) => Some(token),
            None => data
                .users
                .get(user_id)
                .and_then(|u| u.refresh_token.clone()),
        };

        data.users.insert(
            user_id.to_string(),
            UserToken {
                user_id: user_id.to_string(),
                access_token: access_token.to_string(),
                refresh_token,
                expires_at,
            },
        );
        self.persist(&data).await
    }

    /// Looks a token record up by its access token value.
    ///
    /// Returns an `InvariantViolation` if more than one record matches. The
    /// write path makes that structurally impossible, so a hit here means the
    /// store document was tampered with and must not be trusted.
    pub async fn find_user_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<UserToken>, StoreError> {
        let data = self.data.read().await;
        let mut matches = data.users.values().filter(|u| u.access_token == access_token);

        let found = matches.next().cloned();
        if matches.next().is_some() {
            return Err(StoreError::InvariantViolation(
                "multiple user records share one access token".to_string(),
            ));
        }
        Ok(found)
    }

    /// Removes the token record for `user_id`.
    ///
    /// Nothing in the request path calls this; user records are never
    /// deleted automatically. Administrative use only.
    pub async fn delete_user_token(&self, user_id: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.users.remove(user_id).is_none() {
            return Ok(());
        }
        self.persist(&data).await
    }

    /// Looks a token record up by provider user id.
    pub async fn find_user_by_user_id(&self, user_id: &str) -> Option<UserToken> {
        let data = self.data.read().await;
        data.users.get(user_id).cloned()
    }

    async fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(data).map_err(StoreError::SerdeError)?;
        async_fs::write(&self.path, json)
            .await
            .map_err(StoreError::IoError)
    }
}
