use crate::{ChatMessage, NetworkStatus, SendPhase, SettingsForm};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub can_submit: bool,
    pub busy: bool,
    pub phase: SendPhase,
    pub network: NetworkStatus,
    pub show_empty_state: bool,
    pub show_jump_to_bottom: bool,
    /// Upper bound on rendered sources per message (`maxContextDocs`).
    pub max_sources: usize,
    pub settings: Option<SettingsView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub form: SettingsForm,
    /// Inline validation message shown under the base URL field.
    pub error: Option<String>,
}
