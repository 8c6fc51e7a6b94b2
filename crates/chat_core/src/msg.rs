use chrono::{DateTime, Utc};

use crate::{ChatConfig, ChatMessage, RequestId, SettingsForm, Source};

/// A validated answer from the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    pub sources: Vec<Source>,
    /// `usage.latency_ms` as reported by the server.
    pub latency_ms: Option<f64>,
}

/// Scroll geometry of the message list, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Restore the history snapshot loaded at startup.
    RestoreHistory(Vec<ChatMessage>),
    /// Replace the configuration with the one loaded at startup.
    RestoreConfig(ChatConfig),
    /// The view is ready; triggers the first render and the health probe.
    Started,
    /// User edited the composer.
    InputChanged(String),
    /// User submitted the composer, e.g. entered a plain line in the terminal.
    SubmitClicked { at: DateTime<Utc> },
    /// The chat endpoint returned a valid answer.
    QueryAnswered {
        request_id: RequestId,
        reply: ChatReply,
        at: DateTime<Utc>,
    },
    /// The chat request failed for any reason.
    QueryFailed { request_id: RequestId, reason: String },
    /// The post-failure delay for `request_id` has passed.
    FallbackElapsed {
        request_id: RequestId,
        at: DateTime<Utc>,
    },
    /// The user asked for a fresh health probe.
    HealthCheckRequested,
    HealthChecked { online: bool },
    /// The message list was scrolled.
    Scrolled(ScrollMetrics),
    JumpToBottomClicked,
    /// The viewer's reduced-motion preference is known or changed.
    ReducedMotionChanged(bool),
    /// User asked to copy message `index` to the clipboard.
    CopyClicked { index: usize },
    CopyFinished { ok: bool },
    SettingsOpened,
    SettingsCancelled,
    SettingsSubmitted(SettingsForm),
    /// Fallback for placeholder wiring.
    NoOp,
}
