//! Cache holding the running account balances.
//!
//! Entries live under `balance:<account_id>` and expire after a TTL. A miss
//! (expired or never written) is reported as `None`, never as zero.

use std::{collections::HashMap, sync::Arc, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Clock, SystemClock, error::CacheError};

pub fn balance_key(account_id: &str) -> String {
    format!("balance:{account_id}")
}

#[async_trait]
pub trait BalanceCache: Send + Sync {
    async fn set_balance(
        &self,
        account_id: &str,
        balance_minor: i64,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn balance(&self, account_id: &str) -> Result<Option<i64>, CacheError>;
}

/// Process-local cache with lazy expiry against an injectable clock.
pub struct MemoryBalanceCache {
    entries: Mutex<HashMap<String, (i64, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryBalanceCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryBalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBalanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBalanceCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl BalanceCache for MemoryBalanceCache {
    async fn set_balance(
        &self,
        account_id: &str,
        balance_minor: i64,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| CacheError::Backend(format!("invalid ttl: {err}")))?;
        let expires_at = self.clock.now() + ttl;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("balance cache lock poisoned".to_string()))?;
        entries.insert(balance_key(account_id), (balance_minor, expires_at));
        Ok(())
    }

    async fn balance(&self, account_id: &str) -> Result<Option<i64>, CacheError> {
        let now = self.clock.now();
        let key = balance_key(account_id);
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("balance cache lock poisoned".to_string()))?;
        match entries.get(&key) {
            Some((balance, expires_at)) if *expires_at > now => Ok(Some(*balance)),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(feature = "redis")]
pub use redis_cache::RedisBalanceCache;

#[cfg(feature = "redis")]
mod redis_cache {
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::{AsyncCommands, aio::MultiplexedConnection};

    use super::{BalanceCache, balance_key};
    use crate::error::CacheError;

    /// Redis-backed cache shared by every process of the deployment.
    #[derive(Clone)]
    pub struct RedisBalanceCache {
        connection: MultiplexedConnection,
    }

    impl RedisBalanceCache {
        pub async fn connect(url: &str) -> Result<Self, CacheError> {
            let client = redis::Client::open(url)?;
            let connection = client.get_multiplexed_async_connection().await?;
            Ok(Self { connection })
        }
    }

    #[async_trait]
    impl BalanceCache for RedisBalanceCache {
        async fn set_balance(
            &self,
            account_id: &str,
            balance_minor: i64,
            ttl: Duration,
        ) -> Result<(), CacheError> {
            let mut connection = self.connection.clone();
            connection
                .set_ex::<_, _, ()>(balance_key(account_id), balance_minor, ttl.as_secs().max(1))
                .await?;
            Ok(())
        }

        async fn balance(&self, account_id: &str) -> Result<Option<i64>, CacheError> {
            let mut connection = self.connection.clone();
            Ok(connection
                .get::<_, Option<i64>>(balance_key(account_id))
                .await?)
        }
    }
}
