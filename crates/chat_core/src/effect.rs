use std::time::Duration;

use crate::{ChatConfig, ChatMessage, NetworkStatus, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the query to the chat endpoint and report back with `Msg::QueryAnswered`/`QueryFailed`.
    SendQuery {
        request_id: RequestId,
        url: String,
        query: String,
    },
    /// Post `Msg::FallbackElapsed` after `delay`.
    ScheduleFallback {
        request_id: RequestId,
        delay: Duration,
    },
    /// Probe the health endpoint and report back with `Msg::HealthChecked`.
    CheckHealth { url: String },
    /// Open the WebSocket transport. Currently a no-op.
    ConnectWebSocket { url: String },
    PersistHistory(Vec<ChatMessage>),
    PersistConfig(ChatConfig),
    ShowBusy(bool),
    ShowNetworkStatus(NetworkStatus),
    Notify(Notification),
    ScrollToBottom(ScrollBehavior),
    CopyToClipboard { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
    pub duration: Duration,
}

impl Notification {
    pub fn new(text: impl Into<String>, kind: NotificationKind, duration: Duration) -> Self {
        Self {
            text: text.into(),
            kind,
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump immediately; used when the viewer prefers reduced motion.
    Instant,
    Smooth,
}
