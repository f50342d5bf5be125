//! Nonce ledger with optional Redis persistence
//!
//! The whole ledger lives in memory behind one mutex. When Redis is
//! configured each touched order is written inside the critical section:
//! its nonces go to a hash keyed by order id and its recency to a sorted
//! set. Both are read back once at startup.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{NonceLedger, NonceVerdict};
use crate::shared::error::{AppError, AppResult};

/// Nonces recorded for one order
#[derive(Debug, Clone, Default, PartialEq)]
struct OrderNonces {
    order_id: String,
    nonces: Vec<String>,
    /// Ledger clock value of the last touch
    touched: u64,
}

/// Effect of one record call on the ledger
#[derive(Debug, Clone, PartialEq)]
struct Touch {
    verdict: NonceVerdict,
    touched: u64,
    evicted: Vec<String>,
}

/// Orders ordered from least to most recently touched
#[derive(Debug, Clone, Default, PartialEq)]
struct LedgerSnapshot {
    orders: VecDeque<OrderNonces>,
    clock: u64,
}

impl LedgerSnapshot {
    fn position(&self, order_id: &str) -> Option<usize> {
        self.orders.iter().position(|o| o.order_id == order_id)
    }

    fn entry(&self, order_id: &str) -> Option<&OrderNonces> {
        self.position(order_id).map(|idx| &self.orders[idx])
    }

    fn usage(&self, order_id: &str) -> usize {
        self.entry(order_id).map(|o| o.nonces.len()).unwrap_or(0)
    }

    fn record(&mut self, order_id: &str, nonce: &str, ceiling: usize, capacity: usize) -> Touch {
        let mut entry = self
            .position(order_id)
            .and_then(|idx| self.orders.remove(idx))
            .unwrap_or_else(|| OrderNonces {
                order_id: order_id.to_string(),
                ..Default::default()
            });

        let verdict = if entry.nonces.len() >= ceiling {
            NonceVerdict::CeilingReached
        } else {
            entry.nonces.push(nonce.to_string());
            NonceVerdict::Accepted { uses: entry.nonces.len() }
        };

        // Touching an order, even a rejected one, makes it most recent
        self.clock += 1;
        entry.touched = self.clock;
        if !entry.nonces.is_empty() {
            self.orders.push_back(entry);
        }

        let mut evicted = Vec::new();
        while self.orders.len() > capacity {
            if let Some(oldest) = self.orders.pop_front() {
                debug!(order_id = %oldest.order_id, "Evicted order from nonce ledger");
                evicted.push(oldest.order_id);
            }
        }
        Touch { verdict, touched: self.clock, evicted }
    }

    /// Rebuild from persisted recency scores and nonce lists, keeping the
    /// `capacity` most recent orders
    fn rebuild(recency: Vec<(String, u64)>, mut nonces: HashMap<String, String>, capacity: usize) -> AppResult<Self> {
        let mut snapshot = LedgerSnapshot::default();
        for (order_id, touched) in recency {
            let Some(raw) = nonces.remove(&order_id) else {
                continue;
            };
            let list: Vec<String> = serde_json::from_str(&raw)
                .map_err(|e| AppError::Storage(format!("Corrupt nonce ledger entry for {}: {}", order_id, e)))?;
            if list.is_empty() {
                continue;
            }
            snapshot.clock = snapshot.clock.max(touched);
            snapshot.orders.push_back(OrderNonces { order_id, nonces: list, touched });
        }
        snapshot.orders.make_contiguous().sort_by_key(|o| o.touched);
        while snapshot.orders.len() > capacity {
            snapshot.orders.pop_front();
        }
        Ok(snapshot)
    }
}

/// In-memory nonce ledger, mirrored to Redis when configured
pub struct LedgerStore {
    redis: Option<Arc<ConnectionManager>>,
    orders_key: String,
    recency_key: String,
    ceiling: usize,
    capacity: usize,
    state: Mutex<LedgerSnapshot>,
}

impl LedgerStore {
    /// `key` prefixes the Redis hash (`<key>:orders`) and sorted set
    /// (`<key>:recency`) backing the ledger
    pub fn new(redis: Option<Arc<ConnectionManager>>, key: impl Into<String>, ceiling: usize, capacity: usize) -> Self {
        let key = key.into();
        Self {
            redis,
            orders_key: format!("{}:orders", key),
            recency_key: format!("{}:recency", key),
            ceiling: ceiling.max(1),
            capacity: capacity.max(1),
            state: Mutex::new(LedgerSnapshot::default()),
        }
    }

    /// Memory-only ledger
    pub fn in_memory(ceiling: usize, capacity: usize) -> Self {
        Self::new(None, "", ceiling, capacity)
    }

    /// Open a Redis connection manager for the ledger
    pub async fn connect(redis_url: &str) -> AppResult<Arc<ConnectionManager>> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::Storage(format!("Failed to create Redis client: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create Redis connection manager: {}", e)))?;
        info!("Nonce ledger connected to Redis");
        Ok(Arc::new(manager))
    }

    /// Load the persisted ledger, if any, replacing the in-memory state
    pub async fn restore(&self) -> AppResult<usize> {
        let Some(redis) = &self.redis else {
            return Ok(0);
        };
        let mut conn = (**redis).clone();
        let scored: Vec<(String, f64)> = conn.zrange_withscores(&self.recency_key, 0, -1).await?;
        let recency = scored.into_iter().map(|(id, score)| (id, score as u64)).collect();
        let nonces: HashMap<String, String> = conn.hgetall(&self.orders_key).await?;

        let snapshot = LedgerSnapshot::rebuild(recency, nonces, self.capacity)?;
        let restored = snapshot.orders.len();
        *self.state.lock().await = snapshot;
        info!(orders = restored, "Restored nonce ledger");
        Ok(restored)
    }

    /// Write the touched order and drop evicted ones in one MULTI/EXEC
    async fn persist(&self, snapshot: &LedgerSnapshot, order_id: &str, touch: &Touch) -> AppResult<()> {
        let Some(redis) = &self.redis else {
            return Ok(());
        };

        let mut pipe = redis::pipe();
        pipe.atomic();
        if let (NonceVerdict::Accepted { .. }, Some(entry)) = (&touch.verdict, snapshot.entry(order_id)) {
            let nonces = serde_json::to_string(&entry.nonces)
                .map_err(|e| AppError::Internal(format!("serialize nonce ledger entry: {}", e)))?;
            pipe.hset(&self.orders_key, order_id, nonces).ignore();
        }
        pipe.zadd(&self.recency_key, order_id, touch.touched).ignore();
        for evicted in &touch.evicted {
            pipe.hdel(&self.orders_key, evicted).ignore();
            pipe.zrem(&self.recency_key, evicted).ignore();
        }

        let mut conn = (**redis).clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Storage(format!("redis ledger write: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl NonceLedger for LedgerStore {
    async fn record(&self, order_id: &str, nonce: &str) -> AppResult<NonceVerdict> {
        let mut state = self.state.lock().await;
        let touch = state.record(order_id, nonce, self.ceiling, self.capacity);
        let persisted = self.persist(&state, order_id, &touch).await;

        match (touch.verdict, persisted) {
            (NonceVerdict::Accepted { uses }, Ok(())) => {
                debug!(order_id = %order_id, uses, "Recorded nonce");
            }
            // A failed write still leaves the attempt counted in memory
            (NonceVerdict::Accepted { .. }, Err(e)) => {
                warn!(order_id = %order_id, error = %e, "Failed to persist nonce ledger");
                return Err(e);
            }
            (NonceVerdict::CeilingReached, Err(e)) => {
                warn!(order_id = %order_id, error = %e, "Failed to persist nonce ledger recency");
            }
            (NonceVerdict::CeilingReached, Ok(())) => {}
        }
        Ok(touch.verdict)
    }

    async fn usage(&self, order_id: &str) -> usize {
        self.state.lock().await.usage(order_id)
    }

    async fn tracked_orders(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}
