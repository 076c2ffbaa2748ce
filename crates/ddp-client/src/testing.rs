//! Test transport: records outbound frames and plays back scripted
//! responses, optionally synchronously from within the send call itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::transport::{Transport, TransportEvents};

type SendHook = Arc<dyn Fn(&Value, &TransportEvents) + Send + Sync>;

pub(crate) struct FakeTransport {
    events: TransportEvents,
    alive: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<String>>,
    connected_to: Mutex<Option<String>>,
    on_send: Mutex<Option<SendHook>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            events: TransportEvents::new(),
            alive: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            connected_to: Mutex::new(None),
            on_send: Mutex::new(None),
        })
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Signals the socket-open event, as a real transport would once its
    /// connection is established.
    pub(crate) fn open(&self) {
        self.events.opened().emit(&());
    }

    /// Feeds an inbound text frame through the discriminator filter.
    pub(crate) fn deliver(&self, raw: &str) {
        self.events.dispatch_raw(raw);
    }

    /// Scripts a response: the hook runs synchronously inside `send`,
    /// before `send` returns, with the parsed outbound frame and the event
    /// channels to answer on.
    pub(crate) fn respond_on_send(
        &self,
        hook: impl Fn(&Value, &TransportEvents) + Send + Sync + 'static,
    ) {
        *self.on_send.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Every frame sent so far, parsed.
    pub(crate) fn sent_frames(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("sent frame is valid JSON"))
            .collect()
    }

    /// Every frame sent so far, raw.
    pub(crate) fn sent_raw(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Frames sent so far whose `msg` field equals `msg`.
    pub(crate) fn sent_with_msg(&self, msg: &str) -> Vec<Value> {
        self.sent_frames()
            .into_iter()
            .filter(|frame| frame["msg"] == msg)
            .collect()
    }

    pub(crate) fn connected_to(&self) -> Option<String> {
        self.connected_to
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for FakeTransport {
    fn connect(&self, url: &str) -> ClientResult<()> {
        *self
            .connected_to
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
        Ok(())
    }

    fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.events.closed().emit(&());
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn send(&self, frame: &str) -> ClientResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("scripted send failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.to_string());

        // Clone the hook out so a response that triggers another send does
        // not re-enter the lock.
        let hook = self
            .on_send
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            let parsed: Value = serde_json::from_str(frame).expect("sent frame is valid JSON");
            hook(&parsed, &self.events);
        }
        Ok(())
    }

    fn events(&self) -> &TransportEvents {
        &self.events
    }
}
