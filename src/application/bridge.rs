use crate::config::BridgeConfig;
use crate::domain::event::{AckDetail, InboundEvent};
use crate::domain::message::{CorrelationId, DeliveryState, Message, PendingEntry};
use crate::domain::ports::{EventHandlerHandle, TransportHandle};
use crate::error::{BridgeError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Number of settled (acked or exhausted) ids remembered for `delivery_state`.
pub const SETTLED_HISTORY: usize = 128;

struct InflightEntry {
    entry: PendingEntry,
    /// Identifies the dispatch that armed `timer`. Unique per bridge.
    dispatch: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct SessionState {
    ready: bool,
    disposed: bool,
    transport: Option<TransportHandle>,
    pending: VecDeque<PendingEntry>,
    inflight: HashMap<CorrelationId, InflightEntry>,
    dispatches: u64,
    settled: VecDeque<(CorrelationId, DeliveryState)>,
}

impl SessionState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.inflight.is_empty()
    }

    fn is_current(&self, id: &CorrelationId, dispatch: u64) -> bool {
        matches!(self.inflight.get(id), Some(i) if i.dispatch == dispatch)
    }

    fn record_settled(&mut self, id: CorrelationId, outcome: DeliveryState) {
        if self.settled.len() == SETTLED_HISTORY {
            self.settled.pop_front();
        }
        self.settled.push_back((id, outcome));
    }

    /// Cancels every timer and empties all queues. Returns the number of
    /// timers cancelled.
    fn clear(&mut self) -> usize {
        let cancelled = self.inflight.len();
        for (_, inflight) in self.inflight.drain() {
            inflight.timer.abort();
        }
        self.pending.clear();
        self.settled.clear();
        self.transport = None;
        cancelled
    }
}

struct Inner {
    config: BridgeConfig,
    runtime: Handle,
    handler: EventHandlerHandle,
    state: Mutex<SessionState>,
    idle: Notify,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().clear();
    }
}

/// Snapshot of a bridge's queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStatus {
    pub ready: bool,
    pub transport_attached: bool,
    pub pending: usize,
    pub inflight: usize,
    pub disposed: bool,
}

/// Reliable messaging bridge to a single embedded page.
///
/// Outbound messages are held until the page signals readiness, then sent in
/// enqueue order. Ack-expecting messages are redelivered with the same
/// correlation id whenever `ack_timeout` passes without an acknowledgment, up
/// to `max_retries` times, after which they are dropped.
///
/// Every state change happens inside short synchronous critical sections; the
/// lock is never held while the transport or a domain callback runs, so both
/// may call back into the bridge.
///
/// Cloning is cheap and yields another handle to the same session.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    /// Creates a bridge whose acknowledgment timers run on the current Tokio
    /// runtime.
    pub fn new(config: BridgeConfig, handler: EventHandlerHandle) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                runtime,
                handler,
                state: Mutex::new(SessionState::default()),
                idle: Notify::new(),
            }),
        })
    }

    pub fn config(&self) -> BridgeConfig {
        self.inner.config
    }

    /// Installs the channel into the page and flushes anything queued.
    pub fn attach_transport(&self, transport: TransportHandle) {
        {
            let mut state = self.inner.state.lock();
            if state.disposed {
                debug!("Ignoring transport attached after teardown");
                return;
            }
            state.transport = Some(transport);
        }
        self.flush();
    }

    /// Removes the channel. Messages dispatched from now on are requeued until
    /// a transport is attached again.
    pub fn detach_transport(&self) {
        self.inner.state.lock().transport = None;
    }

    /// Queues a message for delivery.
    ///
    /// Never blocks and never fails. Returns the correlation id when an ack is
    /// expected; returns `None` otherwise, or when the bridge has been torn
    /// down and the message was discarded.
    pub fn enqueue(&self, message: Message, expect_ack: bool) -> Option<CorrelationId> {
        let entry = PendingEntry::new(message, expect_ack, self.inner.config.max_retries);
        let id = entry.correlation_id.clone();

        let ready = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                debug!(kind = %entry.message.kind, "Discarding message enqueued after teardown");
                return None;
            }
            debug!(kind = %entry.message.kind, message_id = ?id, "Enqueued message");
            state.pending.push_back(entry);
            state.ready
        };

        if ready {
            self.flush();
        }
        id
    }

    /// Sends everything queued, in order, once the page is ready.
    ///
    /// The queue is drained before anything is dispatched, so messages
    /// enqueued by a dispatch are picked up by a nested flush rather than by
    /// this one.
    pub fn flush(&self) {
        let queued: Vec<PendingEntry> = {
            let mut state = self.inner.state.lock();
            if !state.ready || state.disposed {
                return;
            }
            state.pending.drain(..).collect()
        };

        for entry in queued {
            self.dispatch(entry);
        }
        self.notify_if_idle();
    }

    fn dispatch(&self, mut entry: PendingEntry) {
        let transport = self.inner.state.lock().transport.clone();
        let transport = match transport {
            Some(transport) if transport.is_available() => transport,
            _ => {
                debug!(
                    kind = %entry.message.kind,
                    reason = %BridgeError::TransportUnavailable,
                    "Message requeued"
                );
                self.requeue(entry);
                return;
            }
        };

        entry.attempts += 1;
        let attempt = entry.attempts;
        let mut dispatch = 0;

        // The inflight record must exist before injection so that an ack
        // delivered synchronously by the transport is matched.
        if let Some(id) = entry.correlation_id.clone() {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.dispatches += 1;
            dispatch = state.dispatches;
            let timer = self.arm_timer(id.clone(), dispatch);
            let inflight = InflightEntry {
                entry: entry.clone(),
                dispatch,
                timer,
            };
            if let Some(previous) = state.inflight.insert(id, inflight) {
                previous.timer.abort();
            }
        }

        match transport.inject(&entry.outbound()) {
            Ok(()) => {
                debug!(
                    kind = %entry.message.kind,
                    message_id = ?entry.correlation_id,
                    attempt,
                    "Dispatched message"
                );
            }
            Err(e) => {
                warn!(kind = %entry.message.kind, error = %e, "Injection failed, message requeued");
                entry.attempts -= 1;
                self.rollback(entry, dispatch);
            }
        }
    }

    fn requeue(&self, entry: PendingEntry) {
        let mut state = self.inner.state.lock();
        if !state.disposed {
            state.pending.push_back(entry);
        }
    }

    /// Undoes a dispatch whose injection failed.
    fn rollback(&self, entry: PendingEntry, dispatch: u64) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        if let Some(id) = &entry.correlation_id {
            if !state.is_current(id, dispatch) {
                return;
            }
            if let Some(inflight) = state.inflight.remove(id) {
                inflight.timer.abort();
            }
        }
        state.pending.push_back(entry);
    }

    fn arm_timer(&self, id: CorrelationId, dispatch: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let timeout = self.inner.config.ack_timeout;
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                Bridge { inner }.on_ack_timeout(&id, dispatch);
            }
        })
    }

    fn on_ack_timeout(&self, id: &CorrelationId, dispatch: u64) {
        let requeued = {
            let mut state = self.inner.state.lock();
            if !state.is_current(id, dispatch) {
                return;
            }
            let Some(InflightEntry { mut entry, .. }) = state.inflight.remove(id) else {
                return;
            };

            if entry.retries_remaining > 0 {
                entry.retries_remaining -= 1;
                warn!(
                    message_id = %id,
                    attempt = entry.attempts,
                    retries_remaining = entry.retries_remaining,
                    error = %BridgeError::AckTimeout(id.clone()),
                    "Redelivering message"
                );
                state.pending.push_back(entry);
                true
            } else {
                warn!(
                    message_id = %id,
                    kind = %entry.message.kind,
                    attempts = entry.attempts,
                    error = %BridgeError::RetryExhausted(id.clone()),
                    "Dropping message"
                );
                state.record_settled(id.clone(), DeliveryState::Exhausted);
                false
            }
        };

        if requeued {
            self.flush();
        } else {
            self.notify_if_idle();
        }
    }

    /// Parses and routes one raw payload from the page. Malformed payloads are
    /// logged and dropped.
    pub fn handle_inbound(&self, raw: &str) {
        match InboundEvent::parse(raw) {
            Ok(event) => self.route(event),
            Err(e) => warn!(error = %e, "Ignoring malformed inbound event"),
        }
    }

    pub fn route(&self, event: InboundEvent) {
        if self.inner.state.lock().disposed {
            debug!(?event, "Ignoring inbound event after teardown");
            return;
        }

        match event {
            InboundEvent::Ready => self.on_ready(),
            InboundEvent::Ack(detail) => self.on_ack(detail),
            InboundEvent::Domain(kind, payload) => {
                debug!(event = kind.name(), "Forwarding domain event");
                self.inner.handler.handle(kind, &payload);
            }
            InboundEvent::Console(lines) => debug!(?lines, "Embedded page console"),
            InboundEvent::Unrecognized(name) => {
                debug!(%name, "Ignoring unrecognized inbound event");
            }
        }
    }

    fn on_ready(&self) {
        let first = {
            let mut state = self.inner.state.lock();
            let first = !state.ready;
            state.ready = true;
            first
        };
        if first {
            info!("Embedded page ready");
        }
        self.flush();
    }

    fn on_ack(&self, detail: AckDetail) {
        let Some(id) = detail.message_id.as_ref() else {
            debug!("Ignoring ack without messageId");
            return;
        };

        let acked = {
            let mut state = self.inner.state.lock();
            match state.inflight.remove(id) {
                Some(inflight) => {
                    inflight.timer.abort();
                    state.record_settled(id.clone(), DeliveryState::Acked);
                    true
                }
                None => false,
            }
        };

        if !acked {
            debug!(message_id = %id, "Ignoring ack for unknown or settled message");
            return;
        }

        if detail.is_failure() {
            warn!(
                message_id = %id,
                detail = detail.failure_message(),
                "Embedded page reported an error for message"
            );
        } else {
            debug!(message_id = %id, "Message acknowledged");
        }
        self.notify_if_idle();
    }

    /// Cancels all timers and drops everything queued or inflight. The bridge
    /// ignores all further input. Safe to call repeatedly.
    pub fn teardown(&self) {
        let (first, cancelled) = {
            let mut state = self.inner.state.lock();
            let first = !state.disposed;
            state.disposed = true;
            (first, state.clear())
        };
        if first {
            info!(cancelled_timers = cancelled, "Bridge torn down");
        }
        self.inner.idle.notify_waiters();
    }

    pub fn delivery_state(&self, id: &CorrelationId) -> Option<DeliveryState> {
        let state = self.inner.state.lock();
        if state.inflight.contains_key(id) {
            return Some(DeliveryState::Inflight);
        }
        if state
            .pending
            .iter()
            .any(|entry| entry.correlation_id.as_ref() == Some(id))
        {
            return Some(DeliveryState::Queued);
        }
        state
            .settled
            .iter()
            .rev()
            .find(|(settled, _)| settled == id)
            .map(|(_, outcome)| *outcome)
    }

    /// Retry budget left for a queued or inflight message.
    pub fn retries_remaining(&self, id: &CorrelationId) -> Option<u32> {
        let state = self.inner.state.lock();
        state
            .inflight
            .get(id)
            .map(|inflight| &inflight.entry)
            .or_else(|| {
                state
                    .pending
                    .iter()
                    .find(|entry| entry.correlation_id.as_ref() == Some(id))
            })
            .map(|entry| entry.retries_remaining)
    }

    pub fn status(&self) -> BridgeStatus {
        let state = self.inner.state.lock();
        BridgeStatus {
            ready: state.ready,
            transport_attached: state.transport.is_some(),
            pending: state.pending.len(),
            inflight: state.inflight.len(),
            disposed: state.disposed,
        }
    }

    /// Waits until nothing is queued or awaiting acknowledgment.
    ///
    /// Before the page is ready this only completes once teardown runs, so
    /// callers normally bound it with `tokio::time::timeout`.
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.state.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn notify_if_idle(&self) {
        if self.inner.state.lock().is_idle() {
            self.inner.idle.notify_waiters();
        }
    }
}
