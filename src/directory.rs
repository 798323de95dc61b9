use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::UserRecord;

/// UserDirectory
///
/// Resolves a token subject to the current identity and role. Looked up on every
/// request, so a demoted or deleted user loses access without waiting for token expiry.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Option<UserRecord>;
}

/// DirectoryState
///
/// The concrete type used to share directory access across the application state.
pub type DirectoryState = Arc<dyn UserDirectory>;

/// PostgresUserDirectory
///
/// Directory backed by the `public.profiles` table.
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn get_user(&self, id: Uuid) -> Option<UserRecord> {
        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, role
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(user) => user,
            Err(e) => {
                // Lookup failures resolve to an unknown user, i.e. a guest session.
                tracing::error!(error = %e, user_id = %id, "profile lookup failed");
                None
            }
        }
    }
}

/// InMemoryUserDirectory
///
/// Directory for local runs without a database, and for tests.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub async fn insert(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, id: Uuid) -> Option<UserRecord> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, id: Uuid) -> Option<UserRecord> {
        self.users.read().await.get(&id).cloned()
    }
}
