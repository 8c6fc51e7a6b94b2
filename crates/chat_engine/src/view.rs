use std::sync::{Arc, Mutex};

use chat_core::{AppViewModel, NetworkStatus, Notification, ScrollBehavior};

/// What the controller needs from a front end.
pub trait ChatView: Send {
    /// Redraws everything from the full view model.
    fn render(&mut self, view: &AppViewModel);
    fn set_busy(&mut self, busy: bool);
    fn set_network_status(&mut self, status: NetworkStatus);
    fn notify(&mut self, notification: &Notification);
    fn scroll_to_bottom(&mut self, behavior: ScrollBehavior);
    /// Returns whether the text reached the clipboard.
    fn copy_to_clipboard(&mut self, text: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Rendered(AppViewModel),
    Busy(bool),
    NetworkStatus(NetworkStatus),
    Notified(Notification),
    Scrolled(ScrollBehavior),
    Copied(String),
}

/// Headless view that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
    clipboard_fails: bool,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view whose clipboard always rejects writes.
    pub fn without_clipboard() -> Self {
        Self {
            clipboard_fails: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<ViewEvent> {
        self.events
            .lock()
            .map(|mut e| e.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn last_render(&self) -> Option<AppViewModel> {
        self.events().into_iter().rev().find_map(|event| match event {
            ViewEvent::Rendered(view) => Some(view),
            _ => None,
        })
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Notified(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ViewEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ChatView for RecordingView {
    fn render(&mut self, view: &AppViewModel) {
        self.push(ViewEvent::Rendered(view.clone()));
    }

    fn set_busy(&mut self, busy: bool) {
        self.push(ViewEvent::Busy(busy));
    }

    fn set_network_status(&mut self, status: NetworkStatus) {
        self.push(ViewEvent::NetworkStatus(status));
    }

    fn notify(&mut self, notification: &Notification) {
        self.push(ViewEvent::Notified(notification.clone()));
    }

    fn scroll_to_bottom(&mut self, behavior: ScrollBehavior) {
        self.push(ViewEvent::Scrolled(behavior));
    }

    fn copy_to_clipboard(&mut self, text: &str) -> bool {
        if self.clipboard_fails {
            return false;
        }
        self.push(ViewEvent::Copied(text.to_string()));
        true
    }
}
