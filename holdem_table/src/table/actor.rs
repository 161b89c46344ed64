//! Table actor implementation with async message handling.

use super::{
    config::{TableConfig, TableId},
    messages::{Resync, TableMessage, TableResponse},
    repository::TableRepository,
    sequencer::{EventSequencer, Sequenced, TableSnapshot},
};
use crate::game::{
    GameSettings, TableEngine, UserError,
    entities::{ActionType, Chips, HandId, PlayerId, SeatIndex},
    events::{Notification, TableEvent},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

const INBOX_CAPACITY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Table {0} is closed")]
pub struct TableClosed(pub TableId);

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
    subscriber_buffer: usize,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(
        sender: mpsc::Sender<TableMessage>,
        table_id: TableId,
        subscriber_buffer: usize,
    ) -> Self {
        Self {
            sender,
            table_id,
            subscriber_buffer,
        }
    }

    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableClosed> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableClosed(self.table_id))
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> TableMessage,
    ) -> Result<R, TableClosed> {
        let (response, receiver) = oneshot::channel();
        self.send(build(response)).await?;
        receiver.await.map_err(|_| TableClosed(self.table_id))
    }

    async fn command(
        &self,
        build: impl FnOnce(oneshot::Sender<TableResponse>) -> TableMessage,
    ) -> TableResponse {
        self.request(build)
            .await
            .unwrap_or(TableResponse::TableClosed)
    }

    pub async fn sit_down(
        &self,
        player_id: &PlayerId,
        name: &str,
        seat: SeatIndex,
        buy_in: Chips,
    ) -> TableResponse {
        self.command(|response| TableMessage::SitDown {
            player_id: player_id.clone(),
            name: name.to_string(),
            seat,
            buy_in,
            response,
        })
        .await
    }

    pub async fn stand_up(&self, player_id: &PlayerId) -> TableResponse {
        self.command(|response| TableMessage::StandUp {
            player_id: player_id.clone(),
            response,
        })
        .await
    }

    pub async fn act(
        &self,
        player_id: &PlayerId,
        hand_id: HandId,
        action: ActionType,
        amount: Option<Chips>,
    ) -> TableResponse {
        self.command(|response| TableMessage::TakeAction {
            player_id: player_id.clone(),
            hand_id,
            action,
            amount,
            response,
        })
        .await
    }

    pub async fn resync(
        &self,
        player_id: Option<&PlayerId>,
        last_seq: u64,
    ) -> Result<Resync, TableClosed> {
        self.request(|response| TableMessage::Resync {
            player_id: player_id.cloned(),
            last_seq,
            response,
        })
        .await
    }

    pub async fn snapshot(&self, player_id: Option<&PlayerId>) -> Result<TableSnapshot, TableClosed> {
        self.request(|response| TableMessage::GetSnapshot {
            player_id: player_id.cloned(),
            response,
        })
        .await
    }

    /// Join as an observer and receive every event this player may see.
    pub async fn subscribe(
        &self,
        player_id: &PlayerId,
        name: &str,
    ) -> Result<mpsc::Receiver<Sequenced<TableEvent>>, TableClosed> {
        let (sender, receiver) = mpsc::channel(self.subscriber_buffer);
        self.send(TableMessage::Subscribe {
            player_id: player_id.clone(),
            name: name.to_string(),
            sender,
        })
        .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, player_id: &PlayerId) -> Result<(), TableClosed> {
        self.send(TableMessage::Unsubscribe {
            player_id: player_id.clone(),
        })
        .await
    }

    pub async fn close(&self) -> TableResponse {
        self.command(|response| TableMessage::Close { response }).await
    }
}

#[derive(Debug)]
enum PersistOp {
    Event(Sequenced<Notification>),
    Snapshot(TableSnapshot),
}

/// Table actor owning one engine. Every request, timer, and read for the
/// table is processed here, one at a time.
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    engine: TableEngine,

    sequencer: EventSequencer,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    repository: Arc<dyn TableRepository>,

    /// Forwarding channel to the persistence task, open while running
    persist: Option<mpsc::UnboundedSender<PersistOp>>,

    /// Engine wakeup token and when it is due
    armed: Option<(u64, Instant)>,

    events_since_snapshot: usize,

    /// Is table closed
    is_closed: bool,

    /// Subscribers for table events
    subscribers: HashMap<PlayerId, mpsc::Sender<Sequenced<TableEvent>>>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        config: TableConfig,
        repository: Arc<dyn TableRepository>,
    ) -> (Self, TableHandle) {
        let engine = TableEngine::new(GameSettings::from(&config));
        Self::with_engine(id, config, engine, repository)
    }

    /// Create an actor around an existing engine, e.g. one with a pinned
    /// shuffle seed.
    pub fn with_engine(
        id: TableId,
        config: TableConfig,
        engine: TableEngine,
        repository: Arc<dyn TableRepository>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = TableHandle::new(sender, id, config.subscriber_buffer);

        let actor = Self {
            id,
            sequencer: EventSequencer::new(config.replay_capacity, config.replay_threshold),
            config,
            engine,
            inbox,
            repository,
            persist: None,
            armed: None,
            events_since_snapshot: 0,
            is_closed: false,
            subscribers: HashMap::new(),
        };

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        let (persist, ops) = mpsc::unbounded_channel();
        let persist_task = tokio::spawn(persist_loop(self.id, Arc::clone(&self.repository), ops));
        self.persist = Some(persist);
        // The engine may have been prepared before the actor started.
        self.flush();

        loop {
            let deadline = self.armed.map(|(_, deadline)| deadline);
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    self.handle_message(message);
                    if self.is_closed {
                        break;
                    }
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((token, _)) = self.armed.take() {
                        self.engine.fire_wakeup(token);
                        self.flush();
                    }
                }
            }
        }

        // Let the persistence task drain before reporting closed.
        self.persist = None;
        if let Err(e) = persist_task.await {
            log::error!("Table {}: persistence task failed: {}", self.id, e);
        }
        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::SitDown {
                player_id,
                name,
                seat,
                buy_in,
                response,
            } => {
                let result = self.engine.sit_down(&player_id, &name, seat, buy_in);
                self.log_rejection(&player_id, "sit down", &result);
                self.flush();
                let _ = response.send(result.into());
            }

            TableMessage::StandUp {
                player_id,
                response,
            } => {
                let result = self.engine.stand_up(&player_id);
                self.log_rejection(&player_id, "stand up", &result);
                self.flush();
                let _ = response.send(result.into());
            }

            TableMessage::TakeAction {
                player_id,
                hand_id,
                action,
                amount,
                response,
            } => {
                let result = self
                    .engine
                    .request_action(&player_id, hand_id, action, amount);
                self.log_rejection(&player_id, "action", &result);
                self.flush();
                let _ = response.send(result.into());
            }

            TableMessage::Resync {
                player_id,
                last_seq,
                response,
            } => {
                let resync = match self.sequencer.replay_for(player_id.as_ref(), last_seq) {
                    Some(events) => Resync::Replay(events),
                    None => Resync::Snapshot(self.snapshot_for(player_id.as_ref())),
                };
                let _ = response.send(resync);
            }

            TableMessage::GetSnapshot {
                player_id,
                response,
            } => {
                let _ = response.send(self.snapshot_for(player_id.as_ref()));
            }

            TableMessage::Subscribe {
                player_id,
                name,
                sender,
            } => {
                log::debug!("{} subscribed to table {}", player_id, self.id);
                self.subscribers.insert(player_id.clone(), sender);
                self.publish(Notification::broadcast(TableEvent::PlayerJoin { player_id, name }));
                self.flush();
            }

            TableMessage::Unsubscribe { player_id } => {
                if self.subscribers.remove(&player_id).is_some() {
                    log::debug!("{} unsubscribed from table {}", player_id, self.id);
                    self.publish(Notification::broadcast(TableEvent::PlayerLeave { player_id }));
                    self.flush();
                }
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }
        }
    }

    fn log_rejection(&self, player_id: &PlayerId, what: &str, result: &Result<(), UserError>) {
        if let Err(e) = result {
            log::debug!("Table {}: {} from {} rejected: {}", self.id, what, player_id, e);
        }
    }

    /// Sequence and deliver everything the engine queued and follow the
    /// engine's wakeup.
    fn flush(&mut self) {
        let mut hand_ended = false;
        for notification in self.engine.drain_notifications() {
            hand_ended |= matches!(notification.event, TableEvent::HandEnd { .. });
            self.publish(notification);
        }
        self.rearm();

        if hand_ended || self.events_since_snapshot >= self.config.snapshot_every {
            self.events_since_snapshot = 0;
            let snapshot = self.snapshot_for(None);
            self.forward(PersistOp::Snapshot(snapshot));
        }
    }

    fn publish(&mut self, notification: Notification) {
        let entry = self.sequencer.stamp(notification);
        self.deliver(&entry);
        self.events_since_snapshot += 1;
        self.forward(PersistOp::Event(entry));
    }

    /// Hand an event to every subscriber allowed to see it.
    fn deliver(&mut self, entry: &Sequenced<Notification>) {
        let event = Sequenced {
            seq: entry.seq,
            inner: entry.inner.event.clone(),
        };
        self.subscribers.retain(|player_id, sender| {
            if !entry.inner.delivery.is_visible_to(Some(player_id)) {
                return true;
            }
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping event {}",
                        player_id,
                        event.seq
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", player_id);
                    false
                }
            }
        });
    }

    fn forward(&self, op: PersistOp) {
        if let Some(persist) = &self.persist
            && persist.send(op).is_err()
        {
            log::warn!("Table {}: persistence task is gone", self.id);
        }
    }

    /// Track the engine's pending wakeup. An unchanged token keeps its
    /// original deadline.
    fn rearm(&mut self) {
        self.armed = match self.engine.wakeup() {
            Some(wakeup) => match self.armed {
                Some((token, deadline)) if token == wakeup.token => Some((token, deadline)),
                _ => Some((wakeup.token, Instant::now() + wakeup.delay)),
            },
            None => None,
        };
    }

    fn snapshot_for(&self, viewer: Option<&PlayerId>) -> TableSnapshot {
        let mut view = self.engine.table_view(viewer);
        if let (Some(legal), Some((_, deadline))) = (view.legal_action.as_mut(), self.armed) {
            legal.time_left_secs = deadline.saturating_duration_since(Instant::now()).as_secs();
        }
        TableSnapshot {
            seq: self.sequencer.current_seq(),
            table_id: self.id,
            view,
        }
    }
}

async fn persist_loop(
    table_id: TableId,
    repository: Arc<dyn TableRepository>,
    mut ops: mpsc::UnboundedReceiver<PersistOp>,
) {
    while let Some(op) = ops.recv().await {
        let result = match op {
            PersistOp::Event(event) => repository.append_event(table_id, event).await,
            PersistOp::Snapshot(snapshot) => repository.save_snapshot(snapshot).await,
        };
        if let Err(e) = result {
            log::error!("Table {}: failed to persist: {}", table_id, e);
        }
    }
}
