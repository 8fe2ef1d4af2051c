//! Local-first sync engine.
//!
//! Every mutation lands in memory and in the local store first, then is pushed
//! to the remote store as a whole-document versioned snapshot. Remote changes
//! are applied with last-writer-wins on the snapshot version.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::retry::{RetryEntry, RetryQueue};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{CollectionKey, Collections, Snapshot};
use crate::remote::{RemoteError, RemoteEvent, RemoteResult, RemoteStore};
use crate::state::SyncStatus;
use crate::store::{generate_device_id, LocalStore};
use crate::util::unix_millis_now;

const UPDATE_CHANNEL_CAPACITY: usize = 64;
const CONNECTION_TEST_KEY: &str = "test";

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum SubscriptionSlot {
    Connecting,
    Active(JoinHandle<()>),
}

impl SubscriptionSlot {
    fn is_live(&self) -> bool {
        match self {
            Self::Connecting => true,
            Self::Active(handle) => !handle.is_finished(),
        }
    }
}

struct EngineInner {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    config: SyncConfig,
    device_id: String,
    collections: Mutex<Collections>,
    versions: StdMutex<HashMap<CollectionKey, i64>>,
    status: watch::Sender<SyncStatus>,
    updates: broadcast::Sender<CollectionKey>,
    retry: RetryQueue,
    subscriptions: StdMutex<HashMap<CollectionKey, SubscriptionSlot>>,
    pending_pushes: StdMutex<Vec<JoinHandle<()>>>,
    /// Held across each remote write so writes reach the remote in stamp order
    push_lock: Mutex<()>,
    shut_down: AtomicBool,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        let subscriptions = self
            .subscriptions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, slot) in subscriptions.drain() {
            if let SubscriptionSlot::Active(handle) = slot {
                handle.abort();
            }
        }
    }
}

/// Owns the in-memory collections and keeps them in step with the local and
/// remote stores.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncEngine")
            .field("device_id", &self.inner.device_id)
            .field("user_id", &self.inner.config.user_id)
            .field("remote", &self.inner.remote.is_some())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Build an engine over `local`, loading both collections from it.
    ///
    /// Without a `remote` the engine runs local-only and stays `Offline`.
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        config: SyncConfig,
    ) -> Self {
        let device_id = local.device_id().unwrap_or_else(|error| {
            tracing::warn!("Failed to persist device id, using a session id: {error}");
            generate_device_id()
        });

        let mut collections = Collections::default();
        let mut versions = HashMap::new();
        for key in CollectionKey::ALL {
            load_collection(local.as_ref(), &mut collections, key);
            versions.insert(key, read_stored_version(local.as_ref(), key));
        }

        let (status, _) = watch::channel(SyncStatus::Offline);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        tracing::debug!(
            "Sync engine ready for {} on {device_id} ({})",
            config.user_id,
            if remote.is_some() { "cloud" } else { "local only" }
        );

        Self {
            inner: Arc::new(EngineInner {
                local,
                remote,
                config,
                device_id,
                collections: Mutex::new(collections),
                versions: StdMutex::new(versions),
                status,
                updates,
                retry: RetryQueue::new(),
                subscriptions: StdMutex::new(HashMap::new()),
                pending_pushes: StdMutex::new(Vec::new()),
                push_lock: Mutex::new(()),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Local-only engine with default settings.
    pub fn local_only(local: Arc<dyn LocalStore>) -> Self {
        Self::new(local, None, SyncConfig::default())
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.inner.remote.is_some()
    }

    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// Observe status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Receive the key of every collection whose in-memory copy changed.
    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<CollectionKey> {
        self.inner.updates.subscribe()
    }

    /// Last-known version of a collection.
    #[must_use]
    pub fn version(&self, key: CollectionKey) -> i64 {
        lock(&self.inner.versions)
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn retry_queue_len(&self) -> usize {
        self.inner.retry.len()
    }

    #[must_use]
    pub fn pending_retries(&self) -> Vec<RetryEntry> {
        self.inner.retry.entries()
    }

    /// Run `read` against the current in-memory collections.
    pub async fn read<R>(&self, read: impl FnOnce(&Collections) -> R) -> R {
        let collections = self.inner.collections.lock().await;
        read(&collections)
    }

    /// Clone of the current in-memory collections.
    pub async fn collections(&self) -> Collections {
        self.inner.collections.lock().await.clone()
    }

    pub(crate) fn set_status(&self, next: SyncStatus) {
        self.inner.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if !current.can_transition_to(next) {
                tracing::debug!("Skipping sync status change {current} -> {next}");
                return false;
            }
            tracing::debug!("Sync status {current} -> {next}");
            *current = next;
            true
        });
    }

    fn notify(&self, key: CollectionKey) {
        // No receivers is fine
        let _ = self.inner.updates.send(key);
    }

    fn write_local(&self, key: CollectionKey, data: &Value) {
        if let Err(error) = self.inner.local.write(key, data) {
            tracing::warn!("Failed to save {key} locally, keeping in-memory copy: {error}");
        }
    }

    fn store_version(&self, key: CollectionKey, version: i64) {
        if let Err(error) = self.inner.local.write_version(key, version) {
            tracing::warn!("Failed to save {key} version marker: {error}");
        }
    }

    /// Stamp the next push version for `key` and record it locally.
    ///
    /// Versions are wall-clock ms but always strictly above the last known
    /// version, so same-millisecond pushes still increase.
    fn next_version(&self, key: CollectionKey) -> i64 {
        let mut versions = lock(&self.inner.versions);
        let current = versions.get(&key).copied().unwrap_or_default();
        let version = unix_millis_now().max(current + 1);
        versions.insert(key, version);
        self.store_version(key, version);
        version
    }

    /// Apply `snapshot` if it is strictly newer than the local version.
    fn accept_remote(
        &self,
        collections: &mut Collections,
        key: CollectionKey,
        snapshot: &Snapshot,
    ) -> bool {
        {
            let mut versions = lock(&self.inner.versions);
            let local_version = versions.get(&key).copied().unwrap_or_default();
            if !snapshot.is_newer_than(local_version) {
                return false;
            }
            if let Err(error) = collections.replace(key, snapshot.data.clone()) {
                tracing::warn!(
                    "Ignoring malformed {key} snapshot version {}: {error}",
                    snapshot.version
                );
                return false;
            }
            versions.insert(key, snapshot.version);
            self.store_version(key, snapshot.version);
        }
        self.write_local(key, &snapshot.data);
        true
    }

    /// Re-read both collections and their versions from the local store.
    ///
    /// Absent or unreadable documents load as empty.
    pub async fn load_local(&self) {
        {
            let mut collections = self.inner.collections.lock().await;
            let local = self.inner.local.as_ref();
            for key in CollectionKey::ALL {
                load_collection(local, &mut collections, key);
                let version = read_stored_version(local, key);
                lock(&self.inner.versions).insert(key, version);
            }
        }
        for key in CollectionKey::ALL {
            self.notify(key);
        }
    }

    /// Replace a whole collection with `data`, persist it, and push it.
    ///
    /// Fails only when `data` is not a valid document for `key`.
    pub async fn persist(&self, key: CollectionKey, data: Value) -> Result<()> {
        self.update(key, |collections| collections.replace(key, data))
            .await
    }

    /// Mutate one collection in place, then persist and push it.
    ///
    /// When `mutate` fails nothing is written. The push version is stamped
    /// here, so pushes carry versions in mutation order.
    pub async fn update<R>(
        &self,
        key: CollectionKey,
        mutate: impl FnOnce(&mut Collections) -> Result<R>,
    ) -> Result<R> {
        let (result, document, version) = {
            let mut collections = self.inner.collections.lock().await;
            let result = mutate(&mut collections)?;
            let document = collections.to_value(key)?;
            self.write_local(key, &document);
            let version = self.inner.remote.is_some().then(|| self.next_version(key));
            (result, document, version)
        };

        self.notify(key);
        if let Some(version) = version {
            self.spawn_push(key, document, version);
        }
        Ok(result)
    }

    fn spawn_push(&self, key: CollectionKey, document: Value, version: i64) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            engine.deliver(key, document, version).await;
        });

        let mut pending = lock(&self.inner.pending_pushes);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    /// Wait for every push started by `persist`/`update` to finish.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *lock(&self.inner.pending_pushes));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(error) = handle.await {
                    if !error.is_cancelled() {
                        tracing::warn!("Remote push task failed: {error}");
                    }
                }
            }
        }
    }

    /// Push `data` as the new version of `key`.
    ///
    /// Failures are queued for retry and reported through the status only.
    pub async fn push_remote(&self, key: CollectionKey, data: Value) {
        if self.inner.remote.is_none() {
            return;
        }
        let version = self.next_version(key);
        self.deliver(key, data, version).await;
    }

    /// Send one stamped write unless a later write for `key` exists.
    ///
    /// Returns `true` when the remote accepted it.
    async fn deliver(&self, key: CollectionKey, data: Value, version: i64) -> bool {
        let _ordered = self.inner.push_lock.lock().await;
        let current = self.version(key);
        if version < current {
            tracing::debug!("Skipping {key} push {version}, superseded by {current}");
            return false;
        }

        match self.try_push(key, &data, version).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!("Failed to save {key} to server, queued for retry: {error}");
                self.enqueue_retry(RetryEntry::new(key, data, version));
                false
            }
        }
    }

    async fn try_push(&self, key: CollectionKey, data: &Value, version: i64) -> RemoteResult<()> {
        let Some(remote) = self.inner.remote.clone() else {
            return Ok(());
        };

        self.set_status(SyncStatus::Syncing);
        let snapshot = Snapshot::new(data.clone(), version, self.inner.device_id.clone());

        match remote
            .upsert_merge(&self.inner.config.user_id, key.as_str(), &snapshot)
            .await
        {
            Ok(()) => {
                tracing::debug!("Saved {key} to server (version {version})");
                self.set_status(SyncStatus::Synced);
                self.ensure_subscription(key).await;
                Ok(())
            }
            Err(error) => {
                self.set_status(SyncStatus::Offline);
                Err(error)
            }
        }
    }

    fn enqueue_retry(&self, entry: RetryEntry) {
        if self.inner.retry.enqueue(entry) {
            self.schedule_retry();
        }
    }

    fn schedule_retry(&self) {
        let delay = self.inner.config.retry_delay;
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let engine = Self { inner };
            engine.inner.retry.clear_scheduled();
            engine.drain().await;
        });
    }

    /// Retry every queued write once, in order. Returns how many were delivered.
    ///
    /// Entries superseded by a later write to the same collection are dropped;
    /// the later write carries newer data. The rest are re-stamped so they win
    /// over remote versions written while this device was offline. Entries that
    /// fail again go back to the tail of the queue.
    pub async fn drain(&self) -> usize {
        if self.inner.remote.is_none() {
            return 0;
        }
        let entries = self.inner.retry.take_all();
        if entries.is_empty() {
            return 0;
        }

        tracing::info!("Processing retry queue: {} items", entries.len());
        let mut delivered = 0;
        for entry in entries {
            let key = entry.collection;
            if entry.is_superseded_by(self.version(key)) {
                tracing::debug!("Dropping queued {key} write {}, superseded", entry.version);
                continue;
            }
            let version = self.next_version(key);
            if self.deliver(key, entry.data, version).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Reconcile both collections with the remote store.
    ///
    /// Newer remote snapshots replace local data. Collections the remote lacks
    /// (or holds an older version of) are pushed from local. On failure both
    /// collections are reloaded from the local store.
    pub async fn pull_remote(&self) {
        let Some(remote) = self.inner.remote.clone() else {
            self.load_local().await;
            return;
        };

        self.set_status(SyncStatus::Syncing);
        let user_id = self.inner.config.user_id.clone();
        let mut fetched = Vec::with_capacity(CollectionKey::ALL.len());
        for key in CollectionKey::ALL {
            match remote.get(&user_id, key.as_str()).await {
                Ok(snapshot) => fetched.push((key, snapshot)),
                Err(error) => {
                    tracing::warn!("Failed to load {key} from server, using local data: {error}");
                    self.set_status(SyncStatus::Offline);
                    self.load_local().await;
                    return;
                }
            }
        }

        let mut outgoing = Vec::new();
        for (key, snapshot) in fetched {
            if let Some(document) = self.reconcile(key, snapshot).await {
                outgoing.push((key, document));
            }
        }

        for key in CollectionKey::ALL {
            self.ensure_subscription(key).await;
        }
        self.set_status(SyncStatus::Synced);

        for (key, document) in outgoing {
            self.push_remote(key, document).await;
        }
    }

    /// Returns the local document when it should be pushed to the remote.
    async fn reconcile(&self, key: CollectionKey, remote: Option<Snapshot>) -> Option<Value> {
        let mut collections = self.inner.collections.lock().await;

        let Some(snapshot) = remote else {
            if collections.is_empty(key) {
                return None;
            }
            tracing::info!("Server has no {key}, seeding it from local data");
            return local_document(&collections, key);
        };

        if self.accept_remote(&mut collections, key, &snapshot) {
            drop(collections);
            tracing::info!("Loaded {key} from server (version {})", snapshot.version);
            self.notify(key);
            return None;
        }

        if self.version(key) > snapshot.version {
            tracing::info!(
                "Local {key} is ahead of server ({} > {}), pushing",
                self.version(key),
                snapshot.version
            );
            return local_document(&collections, key);
        }
        None
    }

    /// Apply a snapshot delivered by a change subscription.
    ///
    /// Returns `false` when the snapshot is not newer than the local copy,
    /// which includes echoes of this device's own pushes.
    pub async fn on_remote_change(&self, key: CollectionKey, snapshot: Snapshot) -> bool {
        let accepted = {
            let mut collections = self.inner.collections.lock().await;
            self.accept_remote(&mut collections, key, &snapshot)
        };

        if !accepted {
            tracing::debug!(
                "Ignoring {key} snapshot version {} from {}",
                snapshot.version,
                snapshot.device_id
            );
            return false;
        }

        tracing::info!(
            "Received newer {key} data from server (version {})",
            snapshot.version
        );
        self.notify(key);
        self.set_status(SyncStatus::Syncing);
        self.set_status(SyncStatus::Synced);
        true
    }

    /// Subscribe to remote changes of `key` unless a listener is already live.
    async fn ensure_subscription(&self, key: CollectionKey) {
        let Some(remote) = self.inner.remote.clone() else {
            return;
        };
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut subscriptions = lock(&self.inner.subscriptions);
            if subscriptions.get(&key).is_some_and(SubscriptionSlot::is_live) {
                return;
            }
            subscriptions.insert(key, SubscriptionSlot::Connecting);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        if let Err(error) = remote
            .subscribe(&self.inner.config.user_id, key.as_str(), sender)
            .await
        {
            tracing::warn!("Failed to listen for {key} changes: {error}");
            lock(&self.inner.subscriptions).remove(&key);
            self.set_status(SyncStatus::Offline);
            return;
        }

        let handle = tokio::spawn(listen(Arc::downgrade(&self.inner), key, receiver));
        {
            let mut subscriptions = lock(&self.inner.subscriptions);
            if self.inner.shut_down.load(Ordering::SeqCst) {
                handle.abort();
                subscriptions.remove(&key);
                return;
            }
            subscriptions.insert(key, SubscriptionSlot::Active(handle));
        }
        tracing::debug!("Listening for remote {key} changes");
    }

    /// Number of live change listeners.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        lock(&self.inner.subscriptions)
            .values()
            .filter(|slot| slot.is_live())
            .count()
    }

    /// Stop every change listener. Later pushes do not re-subscribe.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        let slots: Vec<_> = lock(&self.inner.subscriptions)
            .drain()
            .map(|(_, slot)| slot)
            .collect();
        for slot in slots {
            if let SubscriptionSlot::Active(handle) = slot {
                handle.abort();
            }
        }
        tracing::debug!("Sync engine listeners stopped");
    }

    /// Write, read back, and delete a probe document.
    ///
    /// Permission problems surface as `RemoteError::PermissionDenied`.
    pub async fn test_connection(&self) -> Result<()> {
        let Some(remote) = self.inner.remote.clone() else {
            return Err(Error::InvalidInput(
                "cloud sync is not configured".to_string(),
            ));
        };

        self.set_status(SyncStatus::Syncing);
        match self.probe(remote.as_ref()).await {
            Ok(()) => {
                tracing::info!("Connection test passed");
                self.set_status(SyncStatus::Synced);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Connection test failed: {error}");
                self.set_status(SyncStatus::Offline);
                Err(error.into())
            }
        }
    }

    async fn probe(&self, remote: &dyn RemoteStore) -> RemoteResult<()> {
        let user_id = &self.inner.config.user_id;
        let now = unix_millis_now();
        let payload = json!({
            "test": true,
            "timestamp": now,
            "message": "Connection test successful",
        });
        let snapshot = Snapshot::new(payload, now, self.inner.device_id.clone());

        remote
            .upsert_merge(user_id, CONNECTION_TEST_KEY, &snapshot)
            .await?;
        if remote.get(user_id, CONNECTION_TEST_KEY).await?.is_none() {
            return Err(RemoteError::InvalidPayload(
                "connection test document could not be read back".to_string(),
            ));
        }
        remote.delete(user_id, CONNECTION_TEST_KEY).await
    }

    /// Cheap reachability check used to drive the connectivity monitor.
    pub async fn probe_remote(&self) -> bool {
        let Some(remote) = self.inner.remote.clone() else {
            return false;
        };
        remote
            .get(&self.inner.config.user_id, CollectionKey::Jobs.as_str())
            .await
            .is_ok()
    }
}

async fn listen(
    inner: Weak<EngineInner>,
    key: CollectionKey,
    mut events: mpsc::UnboundedReceiver<RemoteEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let engine = SyncEngine { inner };
        match event {
            RemoteEvent::Changed(snapshot) => {
                engine.on_remote_change(key, snapshot).await;
            }
            RemoteEvent::Failed(error) => {
                tracing::warn!("Real-time sync error for {key}: {error}");
                lock(&engine.inner.subscriptions).remove(&key);
                engine.set_status(SyncStatus::Offline);
                break;
            }
        }
    }
}

fn local_document(collections: &Collections, key: CollectionKey) -> Option<Value> {
    collections
        .to_value(key)
        .inspect_err(|error| tracing::warn!("Failed to serialize local {key}: {error}"))
        .ok()
}

fn load_collection(local: &dyn LocalStore, collections: &mut Collections, key: CollectionKey) {
    let document = local.read(key).unwrap_or_else(|error| {
        tracing::warn!("Failed to read local {key}, starting empty: {error}");
        None
    });
    if let Err(error) = collections.replace(key, document.unwrap_or(Value::Null)) {
        tracing::warn!("Local {key} is malformed, starting empty: {error}");
        let _ = collections.replace(key, Value::Null);
    }
}

fn read_stored_version(local: &dyn LocalStore, key: CollectionKey) -> i64 {
    local.read_version(key).unwrap_or_else(|error| {
        tracing::warn!("Failed to read {key} version marker: {error}");
        0
    })
}
