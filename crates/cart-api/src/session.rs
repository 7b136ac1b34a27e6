//! # Checkout Sessions
//!
//! In-memory checkout-session records and the idempotency gate that keeps
//! one checkout intent from producing two sessions.

use cart_core::{CartError, CartResult, FeeBreakdown, LineItem};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// How long a session stays usable, and stays in memory
pub const SESSION_TTL_SECS: i64 = 3600;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    /// Older than `SESSION_TTL_SECS`; dropped on the next purge
    Expired,
}

/// A checkout session created by this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSessionRecord {
    pub id: String,
    pub merchant_id: String,
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub fees: FeeBreakdown,
    pub currency: String,
    pub status: SessionStatus,
    pub checkout_url: String,
    /// Set when the backend was unreachable and a local session was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Canonical form of the request payload (idempotency comparison)
    #[serde(skip)]
    pub fingerprint: String,
}

impl CheckoutSessionRecord {
    pub fn new(
        merchant_id: impl Into<String>,
        items: Vec<LineItem>,
        fees: FeeBreakdown,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_session_id(now),
            merchant_id: merchant_id.into(),
            items,
            fees,
            currency: currency.into(),
            status: SessionStatus::Pending,
            checkout_url: String::new(),
            warning: None,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
            fingerprint: String::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::seconds(SESSION_TTL_SECS)
    }
}

/// `cs_<unix millis>_<9 random characters>`
pub fn new_session_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("cs_{}_{}", now.timestamp_millis(), &random[..9])
}

/// Canonical payload used to compare requests sharing an idempotency key
pub fn fingerprint(merchant_id: &str, items: &[LineItem], total: f64) -> CartResult<String> {
    let value = serde_json::json!({
        "merchant_id": merchant_id,
        "items": items,
        "total": total,
    });
    Ok(serde_json::to_string(&value)?)
}

/// Result of an idempotent create
#[derive(Debug, Clone)]
pub struct Created {
    pub record: CheckoutSessionRecord,
    /// True when an earlier session for the same key was returned
    pub replayed: bool,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, CheckoutSessionRecord>,
}

type KeyGate = Arc<Mutex<Option<String>>>;

/// Shared session storage
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Inner>>,
    /// Per idempotency key: the session id once one has been created
    keys: Arc<StdMutex<HashMap<String, KeyGate>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: CheckoutSessionRecord) {
        self.inner
            .write()
            .await
            .sessions
            .insert(record.id.clone(), record);
    }

    /// Look up a session; ones past their TTL come back as `Expired`.
    pub async fn get(&self, session_id: &str) -> CartResult<CheckoutSessionRecord> {
        let mut record = self
            .inner
            .read()
            .await
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| CartError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        if record.is_expired(Utc::now()) {
            record.status = SessionStatus::Expired;
        }
        Ok(record)
    }

    /// Sessions of one merchant, oldest first
    pub async fn for_merchant(&self, merchant_id: &str) -> Vec<CheckoutSessionRecord> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<_> = inner
            .sessions
            .values()
            .filter(|s| s.merchant_id == merchant_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn key_table(&self) -> CartResult<MutexGuard<'_, HashMap<String, KeyGate>>> {
        self.keys
            .lock()
            .map_err(|_| CartError::Internal("idempotency table poisoned".to_string()))
    }

    fn key_gate(&self, key: &str) -> CartResult<KeyGate> {
        Ok(self.key_table()?.entry(key.to_string()).or_default().clone())
    }

    /// Drop an unused gate nobody else is waiting on.
    ///
    /// Gates are only cloned under the table lock, so the strong count
    /// seen here is stable.
    fn release_gate(&self, key: &str, gate: &KeyGate) -> CartResult<()> {
        let mut keys = self.key_table()?;
        if Arc::strong_count(gate) == 2 {
            keys.remove(key);
        }
        Ok(())
    }

    /// Remove sessions past their TTL and the idempotency keys bound to them.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> CartResult<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now));
        let purged = before - inner.sessions.len();

        let mut keys = self.key_table()?;
        keys.retain(|_, gate| {
            if Arc::strong_count(gate) > 1 {
                return true;
            }
            match gate.try_lock() {
                Ok(slot) => slot
                    .as_ref()
                    .is_some_and(|id| inner.sessions.contains_key(id)),
                Err(_) => true,
            }
        });

        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    #[cfg(test)]
    fn gate_count(&self) -> usize {
        self.keys.lock().map(|k| k.len()).unwrap_or_default()
    }

    /// Create a session, collapsing requests that share an idempotency key.
    ///
    /// Requests with the same key run one at a time. The first one to
    /// succeed stores its session; later ones with the same fingerprint get
    /// that session back, later ones with a different fingerprint fail with
    /// `IdempotencyConflict`. A failed create leaves the key unused.
    /// Expired sessions are purged first, so their keys can be reused.
    pub async fn create<F, Fut>(
        &self,
        key: Option<&str>,
        fingerprint: &str,
        create: F,
    ) -> CartResult<Created>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CartResult<CheckoutSessionRecord>>,
    {
        self.purge_expired(Utc::now()).await?;

        let Some(key) = key else {
            let mut record = create().await?;
            record.fingerprint = fingerprint.to_string();
            self.insert(record.clone()).await;
            return Ok(Created {
                record,
                replayed: false,
            });
        };

        let gate = self.key_gate(key)?;
        let mut slot = gate.lock().await;

        if let Some(existing_id) = slot.clone() {
            match self.get(&existing_id).await {
                Ok(existing) if existing.status != SessionStatus::Expired => {
                    if existing.fingerprint != fingerprint {
                        return Err(CartError::IdempotencyConflict {
                            key: key.to_string(),
                        });
                    }
                    debug!("Replaying session {} for key {}", existing.id, key);
                    return Ok(Created {
                        record: existing,
                        replayed: true,
                    });
                }
                // Expired between the purge and this lookup
                Ok(_) | Err(CartError::SessionNotFound { .. }) => *slot = None,
                Err(e) => return Err(e),
            }
        }

        let mut record = match create().await {
            Ok(record) => record,
            Err(e) => {
                self.release_gate(key, &gate)?;
                return Err(e);
            }
        };
        record.fingerprint = fingerprint.to_string();
        record.idempotency_key = Some(key.to_string());
        self.insert(record.clone()).await;
        *slot = Some(record.id.clone());

        info!("Created session {} for key {}", record.id, key);
        Ok(Created {
            record,
            replayed: false,
        })
    }
}
