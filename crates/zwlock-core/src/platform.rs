// ── Platform engine ──
//
// Owns the gateway client, the tracked locks and accessory records, and the
// background tasks. All mutable engine state sits behind one mutex that is
// never held across gateway I/O or host callbacks.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zwlock_api::{
    Credentials, DeviceSnapshot, GatewayClient, Invocation, TlsMode, TokenStore, TransportConfig,
    command_class,
};

use crate::command::{Command, CommandEnvelope};
use crate::config::PlatformConfig;
use crate::discovery;
use crate::error::CoreError;
use crate::host::AccessoryHost;
use crate::mapping::{StateChange, apply_values};
use crate::model::{
    AccessoryRecord, Characteristic, CharacteristicValue, ChargingState, ConfigurationOption,
    FALLBACK_NAME, FIRMWARE_VERSION, NodeId, TrackedLock,
};
use crate::poll::{Admission, AntiFlood, PendingQueries, RefreshRequest, stale_requests};
use crate::reconcile::reconcile;

const COMMAND_CHANNEL_SIZE: usize = 64;

/// Engine context bridging one Z-Way gateway to an accessory host.
///
/// Cheaply cloneable via `Arc<PlatformInner>`. Lifecycle: construct, hand
/// back persisted records with [`restore_accessory`](Self::restore_accessory),
/// then [`launch`](Self::launch) (daemon) or [`connect`](Self::connect)
/// (single command), and finally [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct Platform {
    inner: Arc<PlatformInner>,
}

struct PlatformInner {
    config: PlatformConfig,
    client: GatewayClient,
    host: Arc<dyn AccessoryHost>,
    state: Mutex<EngineState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Default)]
struct EngineState {
    locks: BTreeMap<NodeId, TrackedLock>,
    accessories: BTreeMap<NodeId, AccessoryRecord>,
    pending: PendingQueries,
    anti_flood: AntiFlood,
}

impl Platform {
    /// Build a platform and its gateway client. No network I/O happens
    /// until [`connect`](Self::connect) or [`launch`](Self::launch).
    pub fn new(config: PlatformConfig, host: Arc<dyn AccessoryHost>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: if config.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: config.timeout,
        };
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let store = TokenStore::in_dir(&config.storage_dir);
        let client = GatewayClient::new(config.url.clone(), credentials, store, &transport)?;
        Ok(Self::with_client(config, client, host))
    }

    /// Build a platform around an existing gateway client.
    pub fn with_client(
        config: PlatformConfig,
        client: GatewayClient,
        host: Arc<dyn AccessoryHost>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        Self {
            inner: Arc::new(PlatformInner {
                config,
                client,
                host,
                state: Mutex::new(EngineState::default()),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &GatewayClient {
        &self.inner.client
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Hand back an accessory the host persisted in a previous run.
    pub async fn restore_accessory(&self, record: AccessoryRecord) {
        info!(
            node_id = record.node_id,
            name = %record.display_name,
            "restoring accessory"
        );
        self.inner
            .state
            .lock()
            .await
            .accessories
            .insert(record.node_id, record);
    }

    /// Discover locks, reconcile accessories, publish values once, and
    /// start the command processor.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let snapshot = self.inner.client.snapshot().await?;
        self.apply_discovery(&snapshot).await;
        self.spawn_command_processor().await;
        Ok(())
    }

    /// [`connect`](Self::connect), then poll the gateway until shutdown.
    pub async fn launch(&self) -> Result<(), CoreError> {
        self.connect().await?;

        let platform = self.clone();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(poll_task(platform, cancel));
        self.inner.task_handles.lock().await.push(handle);

        info!(
            interval = ?self.inner.config.poll_interval,
            "platform launched"
        );
        Ok(())
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("platform shut down");
    }

    /// One-shot: connect, run closure, shut down.
    pub async fn oneshot<F, Fut, T>(
        config: PlatformConfig,
        host: Arc<dyn AccessoryHost>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Platform) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let platform = Platform::new(config, host)?;
        platform.connect().await?;
        let result = f(platform.clone()).await;
        platform.shutdown().await;
        result
    }

    async fn apply_discovery(&self, snapshot: &DeviceSnapshot) {
        let config = &self.inner.config;
        let discovered = discovery::discover(snapshot, &config.ignore);

        let (registered, removed, published) = {
            let mut guard = self.inner.state.lock().await;
            let EngineState {
                locks, accessories, ..
            } = &mut *guard;

            let existing: Vec<NodeId> = accessories.keys().copied().collect();
            let found: Vec<NodeId> = discovered.keys().copied().collect();
            let mut delta = reconcile(&existing, &found, config.nuke);
            delta.skip_ignored(&config.ignore);
            *locks = discovered;

            let mut registered = Vec::with_capacity(delta.added.len());
            for &node_id in &delta.added {
                let Some(lock) = locks.get(&node_id) else {
                    continue;
                };
                let display_name = match lock.device.given_name() {
                    "" => {
                        warn!(node_id, "lock has no name on the gateway, using fallback");
                        FALLBACK_NAME.to_owned()
                    }
                    name => name.to_owned(),
                };
                info!(node_id, name = %display_name, "adding accessory");
                let record = AccessoryRecord::new(node_id, display_name);
                accessories.insert(node_id, record.clone());
                registered.push(record);
            }
            for node_id in &delta.removed {
                info!(node_id, "removing accessory");
                accessories.remove(node_id);
            }

            refresh_records(accessories, locks);
            let published: Vec<AccessoryRecord> = accessories.values().cloned().collect();
            (registered, delta.removed, published)
        };

        let host = &self.inner.host;
        for record in &registered {
            host.register(record);
        }
        for node_id in removed {
            host.unregister(node_id);
        }
        for record in &published {
            host.publish(record);
        }
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Run one poll cycle: fetch a snapshot, queue refreshes for stale
    /// values, and republish every accessory.
    pub async fn poll_once(&self) -> Result<(), CoreError> {
        self.inner.state.lock().await.anti_flood.tick();

        let snapshot = self.inner.client.snapshot().await?;
        let now = snapshot.update_time;
        let tolerances = self.inner.config.tolerances;

        let (dispatch, published) = {
            let mut guard = self.inner.state.lock().await;
            let EngineState {
                locks,
                accessories,
                pending,
                anti_flood,
            } = &mut *guard;

            for (node_id, lock) in locks.iter_mut() {
                match snapshot.devices.get(node_id) {
                    Some(device) => {
                        lock.instances = discovery::resolve_instances(device);
                        lock.device = device.clone();
                    }
                    None => warn!(node_id, "lock missing from snapshot, keeping last state"),
                }
            }

            let mut requests: Vec<RefreshRequest> = Vec::new();
            for (node_id, lock) in locks.iter() {
                if let Some(record) = accessories.get_mut(node_id) {
                    requests.extend(stale_requests(lock, record, now, &tolerances));
                }
            }

            let mut dispatch = Vec::new();
            if anti_flood.suppresses_dispatch() {
                if !requests.is_empty() {
                    debug!(
                        cycle = anti_flood.cycles(),
                        held = requests.len(),
                        "startup anti-flood holding back refresh queries"
                    );
                }
            } else {
                for request in requests {
                    match pending.admit(&request, now) {
                        Admission::Skip => {}
                        Admission::Retry => {
                            warn!(
                                query = %request.invocation(),
                                waited = now - request.time,
                                "query has been waiting over 100 seconds with no update, retrying"
                            );
                            dispatch.push(request);
                        }
                        Admission::Dispatch => dispatch.push(request),
                    }
                }
            }

            refresh_records(accessories, locks);
            let published: Vec<AccessoryRecord> = accessories.values().cloned().collect();
            (dispatch, published)
        };

        for request in dispatch {
            info!(query = %request.invocation(), time = request.time, "querying");
            self.spawn_query(request.invocation());
        }
        for record in &published {
            self.inner.host.publish(record);
        }
        Ok(())
    }

    fn spawn_query(&self, invocation: Invocation) {
        let client = self.inner.client.clone();
        tokio::spawn(async move {
            match client.invoke(&invocation).await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    debug!(error = %e, query = %invocation, "refresh query failed, gateway busy");
                }
                Err(e) => warn!(error = %e, query = %invocation, "refresh query failed"),
            }
        });
    }

    // ── Characteristic access ────────────────────────────────────────

    /// Serve a characteristic read from cached values.
    pub async fn handle_get(
        &self,
        node_id: NodeId,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue, CoreError> {
        let record = self.record(node_id).await?;
        let value = match characteristic {
            Characteristic::LockCurrentState => CharacteristicValue::Lock(record.lock_state),
            Characteristic::LockTargetState => CharacteristicValue::Lock(record.target_state),
            Characteristic::AudioFeedback => {
                CharacteristicValue::Bool(record.configuration.get(ConfigurationOption::Beeper))
            }
            Characteristic::Version => CharacteristicValue::Text(FIRMWARE_VERSION.to_owned()),
            Characteristic::BatteryLevel => record
                .battery
                .map_or(CharacteristicValue::Unknown, CharacteristicValue::Percent),
            Characteristic::ChargingState => {
                CharacteristicValue::Charging(ChargingState::NotChargeable)
            }
            Characteristic::StatusLowBattery => CharacteristicValue::Bool(record.low_battery()),
            Characteristic::LockControlPoint => {
                return Err(CoreError::NotSupported { characteristic });
            }
        };
        Ok(value)
    }

    /// Accept a characteristic write.
    ///
    /// Writes are acknowledged as soon as they are queued; the gateway call
    /// happens on the command processor and failures are only logged.
    pub async fn handle_set(
        &self,
        node_id: NodeId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), CoreError> {
        if !characteristic.is_writable() {
            return Err(CoreError::ReadOnly { characteristic });
        }
        let command = match (characteristic, value) {
            (Characteristic::LockControlPoint, value) => {
                info!(node_id, %value, "write to lock control point ignored");
                return Err(CoreError::NotSupported { characteristic });
            }
            (Characteristic::LockTargetState, CharacteristicValue::Lock(target)) => {
                let mut state = self.inner.state.lock().await;
                let record = state
                    .accessories
                    .get_mut(&node_id)
                    .ok_or(CoreError::LockNotFound { node_id })?;
                record.target_state = target;
                Command::SetLockTarget { node_id, target }
            }
            (Characteristic::AudioFeedback, CharacteristicValue::Bool(enabled)) => {
                if !self.inner.state.lock().await.accessories.contains_key(&node_id) {
                    return Err(CoreError::LockNotFound { node_id });
                }
                Command::SetAudioFeedback { node_id, enabled }
            }
            (_, value) => {
                return Err(CoreError::InvalidValue {
                    characteristic,
                    reason: format!("unexpected value {value}"),
                });
            }
        };
        self.enqueue(command, None).await
    }

    /// Log an identify request through the host.
    pub async fn identify(&self, node_id: NodeId) -> Result<(), CoreError> {
        let record = self.record(node_id).await?;
        self.inner.host.identify(&record);
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a command and wait for the gateway to accept it.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(command, Some(tx)).await?;
        rx.await.map_err(|_| CoreError::ShutDown)?
    }

    async fn enqueue(
        &self,
        command: Command,
        response_tx: Option<oneshot::Sender<Result<(), CoreError>>>,
    ) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ShutDown);
        }
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx,
            })
            .await
            .map_err(|_| CoreError::ShutDown)
    }

    async fn spawn_command_processor(&self) {
        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return;
        };
        let platform = self.clone();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(command_processor_task(platform, rx, cancel));
        self.inner.task_handles.lock().await.push(handle);
    }

    async fn route_command(&self, command: &Command) -> Result<(), CoreError> {
        let node_id = command.node_id();
        let invocation = {
            let state = self.inner.state.lock().await;
            let lock = state
                .locks
                .get(&node_id)
                .ok_or(CoreError::LockNotFound { node_id })?;
            match *command {
                Command::SetLockTarget { target, .. } => Invocation::set(
                    node_id,
                    lock.instances.door_lock,
                    command_class::DOOR_LOCK,
                    [u32::from(target.door_lock_mode())],
                ),
                Command::SetAudioFeedback { enabled, .. } => Invocation::set(
                    node_id,
                    lock.instances.configuration,
                    command_class::CONFIGURATION,
                    [
                        ConfigurationOption::Beeper.parameter(),
                        if enabled { 255 } else { 0 },
                        0,
                    ],
                ),
            }
        };
        info!(node_id, command = %invocation, "sending command");
        self.inner.client.invoke(&invocation).await?;
        Ok(())
    }

    // ── State observation ────────────────────────────────────────────

    /// Cached record for one accessory.
    pub async fn record(&self, node_id: NodeId) -> Result<AccessoryRecord, CoreError> {
        self.inner
            .state
            .lock()
            .await
            .accessories
            .get(&node_id)
            .cloned()
            .ok_or(CoreError::LockNotFound { node_id })
    }

    /// All accessory records, ordered by node id.
    pub async fn records(&self) -> Vec<AccessoryRecord> {
        self.inner
            .state
            .lock()
            .await
            .accessories
            .values()
            .cloned()
            .collect()
    }

    /// All tracked locks, ordered by node id.
    pub async fn locks(&self) -> Vec<TrackedLock> {
        self.inner
            .state
            .lock()
            .await
            .locks
            .values()
            .cloned()
            .collect()
    }
}

/// Copy snapshot values into every accessory with a tracked lock.
fn refresh_records(
    accessories: &mut BTreeMap<NodeId, AccessoryRecord>,
    locks: &BTreeMap<NodeId, TrackedLock>,
) {
    for (node_id, record) in accessories.iter_mut() {
        let Some(lock) = locks.get(node_id) else {
            continue;
        };
        if let Some(StateChange { from, to }) = apply_values(record, lock) {
            info!(
                node_id,
                name = %record.display_name,
                %from,
                %to,
                "lock changed state"
            );
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Sleep, poll, repeat. Cycles never overlap; a failed cycle is logged and
/// the next one runs on schedule.
async fn poll_task(platform: Platform, cancel: CancellationToken) {
    let interval = platform.inner.config.poll_interval;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = platform.poll_once() => {
                if let Err(e) = result {
                    warn!(error = %e, "poll cycle failed");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel. Each command is posted on its
/// own task so a slow lock never holds up the queue.
async fn command_processor_task(
    platform: Platform,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(CommandEnvelope { command, response_tx }) = envelope else { break };
                let platform = platform.clone();
                tokio::spawn(async move {
                    let result = platform.route_command(&command).await;
                    match response_tx {
                        Some(tx) => {
                            let _ = tx.send(result);
                        }
                        None => {
                            if let Err(e) = result {
                                warn!(error = %e, ?command, "command failed");
                            }
                        }
                    }
                });
            }
        }
    }
}
