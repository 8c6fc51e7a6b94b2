//! Chat core: pure send-lifecycle state machine and view-model helpers.
mod config;
mod effect;
mod message;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use config::ChatConfig;
pub use effect::{Effect, Notification, NotificationKind, ScrollBehavior};
pub use message::{ChatMessage, Sender, Source};
pub use msg::{ChatReply, Msg, ScrollMetrics};
pub use settings::{SettingsForm, ValidationError};
pub use state::{AppState, NetworkStatus, RequestId, SendPhase};
pub use update::{
    update, FALLBACK_ANSWER, FALLBACK_DELAY, JUMP_TO_BOTTOM_THRESHOLD_PX,
};
pub use view_model::{AppViewModel, SettingsView};
