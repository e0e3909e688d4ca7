use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use crate::models::{EMAIL_ATTRIBUTE, QUESTIONS_REMAINING_ATTRIBUTE, ZIPNUM_ATTRIBUTE};

pub const EVENT_READY: &str = "webchat:ready";
pub const EVENT_OPENED: &str = "webchat:opened";
pub const EVENT_CLOSED: &str = "webchat:closed";
pub const EVENT_ERROR: &str = "error";

pub const MAX_ATTACH_ATTEMPTS: u32 = 10;
pub const ATTACH_RETRY_INTERVAL: Duration = Duration::from_secs(1);

pub type ChatHandler = Arc<dyn Fn(Option<&str>) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat widget is not available")]
    Unavailable,
    #[error("Chat widget rejected user data: {0}")]
    Rejected(String),
}

// Pushed to the widget when the chat window opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatUserData {
    pub email: String,
    pub usr: String,
    pub zipnum: String,
    pub qs_remain: String,
    pub time_sent: String,
}

impl ChatUserData {
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        let get = |key: &str| attributes.get(key).cloned().unwrap_or_default();
        Self {
            email: get(EMAIL_ATTRIBUTE),
            usr: get(EMAIL_ATTRIBUTE),
            zipnum: get(ZIPNUM_ATTRIBUTE),
            qs_remain: get(QUESTIONS_REMAINING_ATTRIBUTE),
            time_sent: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

pub trait ChatWidget: Send + Sync {
    fn on(&self, event: &str, handler: ChatHandler);
    fn open(&self);
    fn close(&self);
    fn update_user(&self, data: ChatUserData) -> Result<(), ChatError>;
}

#[derive(Default)]
struct BridgeState {
    // Bumped on detach; listeners from an older attach ignore their events.
    generation: AtomicU64,
    attached: AtomicBool,
    ready: AtomicBool,
    // Set when the window opened before the widget reported ready.
    pending_push: AtomicBool,
    attributes: RwLock<Option<HashMap<String, String>>>,
}

impl BridgeState {
    fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn push_user(&self, widget: &Weak<dyn ChatWidget>) {
        let Some(widget) = widget.upgrade() else {
            error!("Error in webchat:opened handler: {}", ChatError::Unavailable);
            return;
        };
        let data = match self.attributes.read() {
            Ok(guard) => guard.as_ref().map(ChatUserData::from_attributes),
            Err(_) => None,
        };
        let Some(data) = data else {
            error!("Error in webchat:opened handler: user attributes not available");
            return;
        };
        if let Err(e) = widget.update_user(data) {
            error!("Error in webchat:opened handler: {}", e);
        }
    }
}

#[derive(Clone, Default)]
pub struct ChatBridge {
    state: Arc<BridgeState>,
}

impl ChatBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_attributes(&self, attributes: HashMap<String, String>) {
        if let Ok(mut guard) = self.state.attributes.write() {
            *guard = Some(attributes);
        }
    }

    // Returns false if the listeners were already added.
    pub fn attach(&self, widget: &Arc<dyn ChatWidget>) -> bool {
        if self.state.attached.swap(true, Ordering::SeqCst) {
            debug!("Chat listeners already added");
            return false;
        }
        let generation = self.state.generation.load(Ordering::SeqCst);
        let weak = Arc::downgrade(widget);

        let state = Arc::clone(&self.state);
        let target = weak.clone();
        widget.on(
            EVENT_READY,
            Arc::new(move |_: Option<&str>| {
                if !state.is_live(generation) {
                    return;
                }
                state.ready.store(true, Ordering::SeqCst);
                if state.pending_push.swap(false, Ordering::SeqCst) {
                    state.push_user(&target);
                }
            }),
        );

        let state = Arc::clone(&self.state);
        widget.on(
            EVENT_OPENED,
            Arc::new(move |conversation_id: Option<&str>| {
                if !state.is_live(generation) {
                    return;
                }
                debug!("Webchat opened with conversation ID: {:?}", conversation_id);
                if state.ready.load(Ordering::SeqCst) {
                    state.push_user(&weak);
                } else {
                    state.pending_push.store(true, Ordering::SeqCst);
                }
            }),
        );

        widget.on(EVENT_CLOSED, Arc::new(|_: Option<&str>| {}));
        let state = Arc::clone(&self.state);
        widget.on(
            EVENT_ERROR,
            Arc::new(move |err: Option<&str>| {
                if state.is_live(generation) {
                    error!("Chat widget error: {}", err.unwrap_or("unknown"));
                }
            }),
        );
        true
    }

    pub async fn attach_when_available<F>(&self, lookup: F) -> Option<Arc<dyn ChatWidget>>
    where
        F: Fn() -> Option<Arc<dyn ChatWidget>>,
    {
        for attempt in 1..=MAX_ATTACH_ATTEMPTS {
            if let Some(widget) = lookup() {
                self.attach(&widget);
                return Some(widget);
            }
            if attempt < MAX_ATTACH_ATTEMPTS {
                tokio::time::sleep(ATTACH_RETRY_INTERVAL).await;
            }
        }
        warn!("Failed to initialize chat widget after {} attempts", MAX_ATTACH_ATTEMPTS);
        None
    }

    // A later `attach` registers fresh listeners; the old ones go quiet.
    pub fn detach(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.attached.store(false, Ordering::SeqCst);
        self.state.ready.store(false, Ordering::SeqCst);
        self.state.pending_push.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.state.attributes.write() {
            *guard = None;
        }
    }
}

// Chat widget for headless sessions: events fire synchronously and the pushed
// user data goes to the log.
#[derive(Default)]
pub struct LogChatWidget {
    handlers: Mutex<HashMap<String, Vec<ChatHandler>>>,
    ready: AtomicBool,
    last_user: Mutex<Option<ChatUserData>>,
}

impl LogChatWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_user(&self) -> Option<ChatUserData> {
        self.last_user.lock().ok().and_then(|u| u.clone())
    }

    fn fire(&self, event: &str, payload: Option<&str>) {
        let handlers = match self.handlers.lock() {
            Ok(handlers) => handlers.get(event).cloned().unwrap_or_default(),
            Err(_) => return,
        };
        for handler in handlers {
            handler(payload);
        }
    }
}

impl ChatWidget for LogChatWidget {
    // A ready listener added after the widget became ready runs at once.
    fn on(&self, event: &str, handler: ChatHandler) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.entry(event.to_string()).or_default().push(handler.clone());
        }
        if event == EVENT_READY && self.ready.load(Ordering::SeqCst) {
            handler(None);
        }
    }

    fn open(&self) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            self.fire(EVENT_READY, None);
        }
        self.fire(EVENT_OPENED, None);
    }

    fn close(&self) {
        self.fire(EVENT_CLOSED, None);
    }

    fn update_user(&self, data: ChatUserData) -> Result<(), ChatError> {
        let json = serde_json::to_string(&data).map_err(|e| ChatError::Rejected(e.to_string()))?;
        info!("Chat user data: {}", json);
        if let Ok(mut last) = self.last_user.lock() {
            *last = Some(data);
        }
        Ok(())
    }
}
