//! Agent event system: decoupled communication between the loop and its observers.
//!
//! The agent publishes what it is doing; a UI, a logger or a test harness
//! listens. Two delivery paths share one bus:
//!
//! - `on(kind, listener)`: synchronous callbacks, invoked during `publish`
//!   in emission order, for the named event only.
//! - `subscribe()`: a `tokio::sync::broadcast` receiver of every event, for
//!   async consumers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::broadcast;

/// All events the agent emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A run started
    AgentStart { task_id: String },

    /// The model's raw turn (final answers travel here too)
    AgentThought { content: String },

    /// A tool is about to run
    ToolCall {
        tool_name: String,
        args: serde_json::Value,
    },

    /// A tool finished, successfully or not
    ToolResult {
        tool_name: String,
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// History is about to be sent to the model
    LlmRequest { model: String, token_count: usize },

    /// The model answered
    LlmResponse { content: String, token_count: usize },

    /// The user's instruction entered the conversation
    UiInput { content: String },
}

/// Event names, for named subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AgentStart,
    AgentThought,
    ToolCall,
    ToolResult,
    LlmRequest,
    LlmResponse,
    UiInput,
}

impl EventKind {
    /// The wire name, e.g. `agent:start`.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::AgentStart => "agent:start",
            EventKind::AgentThought => "agent:thought",
            EventKind::ToolCall => "tool:call",
            EventKind::ToolResult => "tool:result",
            EventKind::LlmRequest => "llm:request",
            EventKind::LlmResponse => "llm:response",
            EventKind::UiInput => "ui:input",
        }
    }
}

impl AgentEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AgentEvent::AgentStart { .. } => EventKind::AgentStart,
            AgentEvent::AgentThought { .. } => EventKind::AgentThought,
            AgentEvent::ToolCall { .. } => EventKind::ToolCall,
            AgentEvent::ToolResult { .. } => EventKind::ToolResult,
            AgentEvent::LlmRequest { .. } => EventKind::LlmRequest,
            AgentEvent::LlmResponse { .. } => EventKind::LlmResponse,
            AgentEvent::UiInput { .. } => EventKind::UiInput,
        }
    }

    /// The wire name, e.g. `tool:result`.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

type Listener = Arc<dyn Fn(&AgentEvent) + Send + Sync>;

struct Registration {
    id: u64,
    kind: EventKind,
    listener: Listener,
}

type Listeners = RwLock<Vec<Registration>>;

/// The event bus passed explicitly to whoever publishes or listens.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
    listeners: Arc<Listeners>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a new event bus with the given broadcast capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publish an event to all listeners, then to broadcast subscribers.
    pub fn publish(&self, event: AgentEvent) {
        let kind = event.kind();
        // Snapshot so listeners may (un)subscribe without deadlocking.
        let matching: Vec<Listener> = match self.listeners.read() {
            Ok(regs) => regs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.listener.clone())
                .collect(),
            Err(_) => Vec::new(),
        };
        for listener in matching {
            listener(&event);
        }
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Register a synchronous listener for one event kind.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&AgentEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut regs) = self.listeners.write() {
            regs.push(Registration {
                id,
                kind,
                listener: Arc::new(listener),
            });
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Subscribe to receive every event asynchronously.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Handle for a listener registered with [`EventBus::on`].
///
/// The listener stays registered until [`Subscription::dispose`] is called.
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Remove the listener from the bus.
    pub fn dispose(self) {
        if let Some(listeners) = self.listeners.upgrade()
            && let Ok(mut regs) = listeners.write()
        {
            regs.retain(|r| r.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(AgentEvent::ToolCall {
            tool_name: "echo".into(),
            args: serde_json::json!({"x": 1}),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            AgentEvent::ToolCall { tool_name, args } => {
                assert_eq!(tool_name, "echo");
                assert_eq!(args["x"], 1);
            }
            _ => panic!("Expected ToolCall event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(AgentEvent::UiInput {
            content: "no subscribers".into(),
        });
    }

    #[test]
    fn named_listeners_receive_only_their_kind_in_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let _sub = bus.on(EventKind::AgentThought, move |e| {
            if let AgentEvent::AgentThought { content } = e {
                s.lock().unwrap().push(content.clone());
            }
        });

        bus.publish(AgentEvent::AgentThought { content: "a".into() });
        bus.publish(AgentEvent::UiInput { content: "ignored".into() });
        bus.publish(AgentEvent::AgentThought { content: "b".into() });

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn disposed_listener_stops_receiving() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicU64::new(0));

        let c = count.clone();
        let sub = bus.on(EventKind::UiInput, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(AgentEvent::UiInput { content: "1".into() });
        sub.dispose();
        bus.publish(AgentEvent::UiInput { content: "2".into() });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_subscribe_during_delivery() {
        let bus = Arc::new(EventBus::default());
        let inner = bus.clone();
        let _sub = bus.on(EventKind::AgentStart, move |_| {
            let _nested = inner.on(EventKind::UiInput, |_| {});
        });
        bus.publish(AgentEvent::AgentStart { task_id: "t".into() });
    }

    #[test]
    fn event_names() {
        let e = AgentEvent::ToolResult {
            tool_name: "x".into(),
            result: None,
            error: Some("boom".into()),
        };
        assert_eq!(e.name(), "tool:result");
        assert_eq!(EventKind::LlmRequest.name(), "llm:request");
    }
}
