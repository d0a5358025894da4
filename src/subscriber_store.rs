use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::{EmailAddress, Subscriber};
use crate::utils::error_chain_fmt;

/// Persistent set of subscriber emails
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn insert(&self, email: &EmailAddress) -> Result<(), StoreError>;

    /// Remove a subscriber, returning `false` if the address was not subscribed
    async fn delete(&self, email: &EmailAddress) -> Result<bool, StoreError>;

    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError>;
}

/// Subscriber store error type
#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("{0} is already subscribed")]
    AlreadySubscribed(EmailAddress),
    #[error("Failed to query the subscribers table")]
    Unexpected(#[from] sqlx::Error),
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Postgres-backed subscriber store
pub struct PgSubscriberStore {
    db_pool: PgPool,
}

impl PgSubscriberStore {
    pub const fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(name = "Saving new subscriber in the database", skip(self))]
    async fn insert(&self, email: &EmailAddress) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO subscribers (email, subscribed_at)
            VALUES ($1, $2)
            ",
        )
        .bind(email.as_ref())
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadySubscribed(email.clone())
            }
            e => StoreError::Unexpected(e),
        })?;
        Ok(())
    }

    #[tracing::instrument(name = "Removing subscriber from the database", skip(self))]
    async fn delete(&self, email: &EmailAddress) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM subscribers
            WHERE email = $1
            ",
        )
        .bind(email.as_ref())
        .execute(&self.db_pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "Get all subscribers", skip(self))]
    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let emails: Vec<String> = sqlx::query_scalar(
            r"
            SELECT email FROM subscribers
            ORDER BY subscribed_at
            ",
        )
        .fetch_all(&self.db_pool)
        .await?;

        // Rows written before validation existed may hold garbage: skip them
        let subscribers = emails
            .into_iter()
            .filter_map(|email| match EmailAddress::parse(email) {
                Ok(email) => Some(Subscriber { email }),
                Err(error) => {
                    tracing::warn!(
                        error.message = %error,
                        "Skipping a subscriber because their stored email is invalid"
                    );
                    None
                }
            })
            .collect();

        Ok(subscribers)
    }
}
