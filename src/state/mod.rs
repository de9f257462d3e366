/// First-buzz-wins arbitration.
pub mod buzzer;
/// Role-channel fan-out.
pub mod hub;
/// Reporting of dropped real-time events.
pub mod monitor;
/// Session phases and plan/apply/abort transitions.
pub mod state_machine;

use std::{sync::Arc, time::Duration};

use axum::extract::ws::Message;
use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::question_store::QuestionStore,
    dto::events::{Channel, ServerEvent},
    error::ServiceError,
};

pub use self::hub::{BroadcastHub, Subscription};
pub use self::monitor::{DeliveryMonitor, DropReason, TracingMonitor};
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::{
    buzzer::BuzzerRace,
    state_machine::{SessionEvent, SessionState, Transition},
};

/// Application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;
/// Upper bound for the store work of a session transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle used to push frames to one connected real-time client.
#[derive(Clone)]
pub struct ClientConnection {
    /// Channel the client subscribed to.
    pub role: Channel,
    /// Writer queue of the client's socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

impl ClientConnection {
    /// Wrap the writer queue of a socket connected as `role`.
    pub fn new(role: Channel, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { role, tx }
    }
}

/// Central application state: configuration, the question store, the live
/// session and the connections listening to it.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn QuestionStore>,
    hub: BroadcastHub,
    clients: DashMap<Uuid, ClientConnection>,
    session: RwLock<SessionState>,
    buzzer: Mutex<BuzzerRace>,
    monitor: Arc<dyn DeliveryMonitor>,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn QuestionStore>) -> SharedState {
        Self::with_monitor(config, store, Arc::new(TracingMonitor::new()))
    }

    /// Same as [`AppState::new`] with a custom delivery monitor.
    pub fn with_monitor(
        config: AppConfig,
        store: Arc<dyn QuestionStore>,
        monitor: Arc<dyn DeliveryMonitor>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            hub: BroadcastHub::new(config.game.broadcast_capacity),
            config,
            store,
            clients: DashMap::new(),
            session: RwLock::new(SessionState::new()),
            buzzer: Mutex::new(BuzzerRace::new()),
            monitor,
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Startup configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Question catalog backend.
    pub fn store(&self) -> Arc<dyn QuestionStore> {
        Arc::clone(&self.store)
    }

    /// Hub fanning out events to every connected client.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Add a real-time connection to the registry.
    pub fn register_client(&self, id: Uuid, connection: ClientConnection) {
        self.clients.insert(id, connection);
    }

    /// Remove a connection from the registry, returning it when it was known.
    pub fn unregister_client(&self, id: &Uuid) -> Option<ClientConnection> {
        self.clients.remove(id).map(|(_, connection)| connection)
    }

    /// Push a frame to a single registered client.
    ///
    /// Returns `false` when the client is unknown or its writer is gone.
    pub fn send_to(&self, id: &Uuid, message: Message) -> bool {
        self.clients
            .get(id)
            .is_some_and(|connection| connection.tx.send(message).is_ok())
    }

    /// Number of open real-time connections.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Open real-time connections per role, every role listed.
    pub fn clients_by_role(&self) -> IndexMap<Channel, usize> {
        let mut counts: IndexMap<Channel, usize> =
            Channel::ALL.into_iter().map(|role| (role, 0)).collect();
        for connection in self.clients.iter() {
            *counts.entry(connection.role).or_default() += 1;
        }
        counts
    }

    /// Sink for dropped real-time events.
    pub fn monitor(&self) -> &dyn DeliveryMonitor {
        self.monitor.as_ref()
    }

    /// Broadcast an event to its audience.
    pub fn broadcast(&self, event: ServerEvent) {
        self.hub.broadcast(event);
    }

    /// Current buzzer race.
    pub fn buzzer(&self) -> &Mutex<BuzzerRace> {
        &self.buzzer
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Copy of the session position.
    pub async fn snapshot(&self) -> Snapshot {
        self.session.read().await.snapshot()
    }

    /// Serialize a session transition behind the transition gate.
    ///
    /// `work` runs while the session sits in the planned state and must return
    /// its value together with the catalog length the transition is resolved
    /// against. A failing or timed out `work` aborts the plan and leaves the
    /// session where it was.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, Transition), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(T, usize), ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.session.write().await.plan(event)?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    self.abort_transition(event, plan_id, "timeout").await;
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok((value, catalog_len)) => {
                let transition = self.session.write().await.apply(plan_id, catalog_len)?;
                drop(gate);
                Ok((value, transition))
            }
            Err(err) => {
                self.abort_transition(event, plan_id, "work error").await;
                drop(gate);
                Err(err)
            }
        }
    }

    async fn abort_transition(&self, event: SessionEvent, plan_id: PlanId, cause: &str) {
        if let Err(abort_err) = self.session.write().await.abort(plan_id) {
            warn!(
                event = ?event,
                plan_id = %plan_id,
                error = ?abort_err,
                cause = %cause,
                "failed to abort session transition"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use crate::config::{AppConfig, GameSettings};

    /// Configuration with fixed test secrets.
    pub fn config() -> AppConfig {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("QUIZOR_JWT_SECRET", "test-secret"),
            ("QUIZOR_ADMIN_PASSWORD", "letmein"),
            ("MONGO_URI", "mongodb://localhost:27017"),
        ]);
        AppConfig::from_lookup(GameSettings::default(), move |name: &str| {
            vars.get(name).map(|value| value.to_string())
        })
        .expect("test configuration is complete")
    }
}
