use std::collections::BTreeSet;

use crate::view_model::{AppViewModel, SettingsView};
use crate::{ChatConfig, ChatMessage, ScrollBehavior, SettingsForm, ValidationError};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    #[default]
    Connecting,
    Online,
    Offline,
}

/// Where the composer is in the send lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    Composing,
    Sending,
    /// A request failed and its canned answer has not been appended yet.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    history: Vec<ChatMessage>,
    config: ChatConfig,
    input: String,
    busy: bool,
    network: NetworkStatus,
    next_request_id: RequestId,
    in_flight: BTreeSet<RequestId>,
    pending_fallbacks: BTreeSet<RequestId>,
    reduced_motion: bool,
    jump_to_bottom_visible: bool,
    settings: Option<SettingsDialog>,
    dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SettingsDialog {
    form: SettingsForm,
    error: Option<ValidationError>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ChatConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            messages: self.history.clone(),
            input: self.input.clone(),
            can_submit: self.can_submit(),
            busy: self.busy,
            phase: self.phase(),
            network: self.network,
            show_empty_state: self.history.is_empty(),
            show_jump_to_bottom: self.jump_to_bottom_visible,
            max_sources: self.config.max_context_docs,
            settings: self.settings.as_ref().map(|dialog| SettingsView {
                form: dialog.form.clone(),
                error: dialog.error.as_ref().map(ToString::to_string),
            }),
            dirty: self.dirty,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn network(&self) -> NetworkStatus {
        self.network
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty()
    }

    pub fn phase(&self) -> SendPhase {
        if !self.pending_fallbacks.is_empty() {
            SendPhase::Fallback
        } else if self.busy {
            SendPhase::Sending
        } else if self.can_submit() {
            SendPhase::Composing
        } else {
            SendPhase::Idle
        }
    }

    pub fn scroll_behavior(&self) -> ScrollBehavior {
        if self.reduced_motion {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        }
    }

    /// Returns whether anything visible changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.history.push(message);
        self.dirty = true;
    }

    pub(crate) fn restore_history(&mut self, history: Vec<ChatMessage>) {
        self.history = history.into_iter().map(ChatMessage::normalized).collect();
        self.dirty = true;
    }

    pub(crate) fn set_config(&mut self, config: ChatConfig) {
        self.config = config;
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.dirty = true;
        }
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.dirty = true;
        }
    }

    pub(crate) fn set_network(&mut self, network: NetworkStatus) {
        if self.network != network {
            self.network = network;
            self.dirty = true;
        }
    }

    pub(crate) fn begin_request(&mut self) -> RequestId {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.in_flight.insert(request_id);
        request_id
    }

    /// Marks a request as settled; false when the id was not in flight.
    pub(crate) fn settle_request(&mut self, request_id: RequestId) -> bool {
        self.in_flight.remove(&request_id)
    }

    pub(crate) fn add_pending_fallback(&mut self, request_id: RequestId) {
        self.pending_fallbacks.insert(request_id);
        self.dirty = true;
    }

    pub(crate) fn take_pending_fallback(&mut self, request_id: RequestId) -> bool {
        self.pending_fallbacks.remove(&request_id)
    }

    pub(crate) fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
    }

    pub(crate) fn set_jump_to_bottom_visible(&mut self, visible: bool) {
        if self.jump_to_bottom_visible != visible {
            self.jump_to_bottom_visible = visible;
            self.dirty = true;
        }
    }

    pub(crate) fn open_settings(&mut self) {
        self.settings = Some(SettingsDialog {
            form: SettingsForm::from_config(&self.config),
            error: None,
        });
        self.dirty = true;
    }

    pub(crate) fn close_settings(&mut self) {
        if self.settings.take().is_some() {
            self.dirty = true;
        }
    }

    pub(crate) fn reject_settings(&mut self, form: SettingsForm, error: ValidationError) {
        self.settings = Some(SettingsDialog {
            form,
            error: Some(error),
        });
        self.dirty = true;
    }
}
