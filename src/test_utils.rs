//! In-memory stores, a scripted push transport and fixtures for tests.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use p256::{elliptic_curve::sec1::ToEncodedPoint, SecretKey};
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    error::{AppError, Result},
    push::{PushError, PushPayload, PushTransport},
    reminder::{Reminder, ReminderStatus, ReminderStore},
    state::{AppState, Config},
    subscription::{NewPushSubscription, PushSubscription, Registration, SubscriptionStore},
};

pub const JOB_SECRET: &str = "job-secret";

pub fn reminder_due_at(id: i64, due_at: DateTime<Utc>) -> Reminder {
    Reminder {
        id,
        title: format!("Reminder {}", id),
        notes: None,
        due_at,
        priority: "medium".to_string(),
        repeat: "none".to_string(),
        status: ReminderStatus::Pending,
        last_notified_at: None,
        created_at: due_at - Duration::days(1),
        updated_at: due_at - Duration::days(1),
    }
}

pub fn subscription(id: i64, endpoint: &str) -> PushSubscription {
    PushSubscription {
        id,
        endpoint: endpoint.to_string(),
        p256dh: "p256dh".to_string(),
        auth: "auth".to_string(),
        created_at: Utc::now(),
    }
}

/// A subscription whose keys a real browser could have produced.
pub fn subscription_with_keys(id: i64, endpoint: &str) -> PushSubscription {
    let secret = SecretKey::random(&mut OsRng);
    let mut auth = [0u8; 16];
    OsRng.fill_bytes(&mut auth);

    PushSubscription {
        p256dh: URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes()),
        auth: URL_SAFE_NO_PAD.encode(auth),
        ..subscription(id, endpoint)
    }
}

/// `(public, private)` in the base64url form the config expects.
pub fn generate_vapid_keys() -> (String, String) {
    let secret = SecretKey::random(&mut OsRng);
    (
        URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes()),
        URL_SAFE_NO_PAD.encode(secret.to_bytes()),
    )
}

pub fn test_config() -> Config {
    let (public_key, private_key) = generate_vapid_keys();
    Config {
        job_api_secret: Some(JOB_SECRET.to_string()),
        check_window_minutes: 5,
        vapid_public_key: Some(public_key),
        vapid_private_key: Some(private_key),
        vapid_subject: "mailto:test@example.com".to_string(),
        push_ttl_seconds: 60,
        push_timeout_seconds: 5,
        notification_cron: None,
    }
}

pub fn test_state(
    reminders: Arc<InMemoryReminderStore>,
    subscriptions: Arc<InMemorySubscriptionStore>,
    transport: Option<Arc<FakeTransport>>,
) -> AppState {
    AppState {
        config: Arc::new(test_config()),
        reminder_store: reminders,
        subscription_store: subscriptions,
        push_transport: transport.map(|t| t as Arc<dyn PushTransport>),
    }
}

fn store_error() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct InMemoryReminderStore {
    reminders: Mutex<Vec<Reminder>>,
    failing_writes: Mutex<HashSet<i64>>,
    fail_reads: AtomicBool,
    find_calls: AtomicUsize,
    mark_calls: AtomicUsize,
}

impl InMemoryReminderStore {
    pub fn with_reminders(reminders: Vec<Reminder>) -> Self {
        Self {
            reminders: Mutex::new(reminders),
            ..Self::default()
        }
    }

    pub fn get(&self, id: i64) -> Option<Reminder> {
        self.reminders
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, id: i64) {
        self.failing_writes.lock().unwrap().insert(id);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn find_due_for_notification(
        &self,
        now: DateTime<Utc>,
        check_window: Duration,
        suppress_window: Duration,
    ) -> Result<Vec<Reminder>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_error());
        }

        let mut due: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_due_for_notification(now, check_window, suppress_window))
            .cloned()
            .collect();
        due.sort_by_key(|r| r.due_at);

        Ok(due)
    }

    async fn mark_notified(&self, id: i64, notified_at: DateTime<Utc>) -> Result<()> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_writes.lock().unwrap().contains(&id) {
            return Err(store_error());
        }

        if let Some(reminder) = self.reminders.lock().unwrap().iter_mut().find(|r| r.id == id) {
            reminder.last_notified_at = Some(notified_at);
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<Vec<PushSubscription>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
    list_calls: AtomicUsize,
}

impl InMemorySubscriptionStore {
    pub fn with_subscriptions(subscriptions: Vec<PushSubscription>) -> Self {
        let next_id = subscriptions.iter().map(|s| s.id).max().unwrap_or(0);
        Self {
            subscriptions: Mutex::new(subscriptions),
            next_id: AtomicI64::new(next_id),
            ..Self::default()
        }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.endpoint.clone())
            .collect()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert_if_absent(&self, subscription: NewPushSubscription) -> Result<Registration> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions
            .iter()
            .find(|s| s.endpoint == subscription.endpoint)
        {
            return Ok(Registration::Existing(existing.clone()));
        }

        let created = PushSubscription {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            endpoint: subscription.endpoint,
            p256dh: subscription.p256dh,
            auth: subscription.auth,
            created_at: Utc::now(),
        };
        subscriptions.push(created.clone());

        Ok(Registration::Created(created))
    }

    async fn list_all(&self) -> Result<Vec<PushSubscription>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(store_error());
        }

        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<u64> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.endpoint != endpoint);

        Ok((before - subscriptions.len()) as u64)
    }
}

/// Transport that answers per endpoint from a script and records every send.
#[derive(Default)]
pub struct FakeTransport {
    gone: HashSet<String>,
    transient: HashSet<String>,
    delay: Option<std::time::Duration>,
    public_key: String,
    sends: Mutex<Vec<(String, PushPayload)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gone(mut self, endpoint: &str) -> Self {
        self.gone.insert(endpoint.to_string());
        self
    }

    pub fn transient(mut self, endpoint: &str) -> Self {
        self.transient.insert(endpoint.to_string());
        self
    }

    pub fn with_public_key(mut self, public_key: &str) -> Self {
        self.public_key = public_key.to_string();
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sends(&self) -> Vec<(String, PushPayload)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn sends_to(&self, endpoint: &str) -> usize {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> std::result::Result<(), PushError> {
        self.sends
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload.clone()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.gone.contains(&subscription.endpoint) {
            Err(PushError::Gone { status: 410 })
        } else if self.transient.contains(&subscription.endpoint) {
            Err(PushError::Rejected { status: 503 })
        } else {
            Ok(())
        }
    }

    fn public_key(&self) -> &str {
        &self.public_key
    }
}
