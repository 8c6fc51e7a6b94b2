//! Runs the chat state machine against real (or test) IO.
//!
//! The controller owns the only copy of [`AppState`]. Front-end events are applied with
//! [`ChatController::dispatch`]; network calls and timers run as tokio tasks that post their
//! results back to the controller's inbox, which is drained by [`ChatController::process_next`].

use std::sync::Arc;

use chat_core::{update, AppState, ChatConfig, Effect, Msg};
use chat_logging::{chat_debug, chat_info, chat_warn};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::storage::ChatStorage;
use crate::transport::ChatTransport;
use crate::view::ChatView;

/// Wall-clock source for message timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct ChatController {
    state: AppState,
    transport: Arc<dyn ChatTransport>,
    view: Box<dyn ChatView>,
    storage: ChatStorage,
    clock: Clock,
    inbox_tx: mpsc::UnboundedSender<Msg>,
    inbox_rx: mpsc::UnboundedReceiver<Msg>,
    /// Spawned tasks whose result message has not been processed yet.
    outstanding: usize,
}

impl ChatController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        view: impl ChatView + 'static,
        storage: ChatStorage,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(),
            transport,
            view: Box::new(view),
            storage,
            clock: Arc::new(Utc::now),
            inbox_tx,
            inbox_rx,
            outstanding: 0,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Restores the persisted config and history, renders, and runs the startup probes.
    pub fn start(&mut self, defaults: &ChatConfig) {
        let config = self.storage.load_config(defaults);
        let history = self.storage.load_history();
        chat_info!(
            "Starting chat with {} stored messages against {}",
            history.len(),
            config.base_api_url
        );

        let state = std::mem::take(&mut self.state);
        let (state, _) = update(state, Msg::RestoreConfig(config));
        let (state, _) = update(state, Msg::RestoreHistory(history));
        self.state = state;
        self.dispatch(Msg::Started);
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.dispatch(Msg::InputChanged(text.into()));
    }

    pub fn submit(&mut self) {
        let at = (self.clock)();
        self.dispatch(Msg::SubmitClicked { at });
    }

    /// Types `text` into the composer and submits it.
    pub fn send(&mut self, text: impl Into<String>) {
        self.set_input(text);
        self.submit();
    }

    /// Applies one message, re-renders when something visible changed, then runs its effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty {
            self.view.render(&self.state.view());
        }
        for effect in effects {
            self.run_effect(effect);
        }
    }

    pub fn has_outstanding(&self) -> bool {
        self.outstanding > 0
    }

    /// Waits for the next task result and applies it. Pends forever when nothing is outstanding.
    pub async fn process_next(&mut self) {
        if let Some(msg) = self.inbox_rx.recv().await {
            self.outstanding = self.outstanding.saturating_sub(1);
            self.dispatch(msg);
        }
    }

    /// Processes task results until no request, probe or fallback timer is left.
    pub async fn settle(&mut self) {
        while self.has_outstanding() {
            self.process_next().await;
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SendQuery {
                request_id,
                url,
                query,
            } => {
                chat_info!(
                    "SendQuery request_id={} query_len={} url={}",
                    request_id,
                    query.len(),
                    url
                );
                let transport = self.transport.clone();
                let clock = self.clock.clone();
                self.spawn(async move {
                    match transport.send_query(&url, &query).await {
                        Ok(reply) => Msg::QueryAnswered {
                            request_id,
                            reply,
                            at: clock(),
                        },
                        Err(err) => {
                            chat_warn!(
                                "Chat request {} failed, using offline answer: {}",
                                request_id,
                                err
                            );
                            Msg::QueryFailed {
                                request_id,
                                reason: err.to_string(),
                            }
                        }
                    }
                });
            }
            Effect::ScheduleFallback { request_id, delay } => {
                let clock = self.clock.clone();
                self.spawn(async move {
                    tokio::time::sleep(delay).await;
                    Msg::FallbackElapsed {
                        request_id,
                        at: clock(),
                    }
                });
            }
            Effect::CheckHealth { url } => {
                let transport = self.transport.clone();
                self.spawn(async move {
                    let online = transport.check_health(&url).await;
                    chat_debug!("Health {} -> {}", url, if online { "online" } else { "offline" });
                    Msg::HealthChecked { online }
                });
            }
            Effect::ConnectWebSocket { url } => {
                chat_info!("WebSocket transport requested for {} but not available; using HTTP", url);
            }
            Effect::PersistHistory(history) => self.storage.save_history(&history),
            Effect::PersistConfig(config) => self.storage.save_config(&config),
            Effect::ShowBusy(busy) => self.view.set_busy(busy),
            Effect::ShowNetworkStatus(status) => self.view.set_network_status(status),
            Effect::Notify(notification) => self.view.notify(&notification),
            Effect::ScrollToBottom(behavior) => self.view.scroll_to_bottom(behavior),
            Effect::CopyToClipboard { text } => {
                let ok = self.view.copy_to_clipboard(&text);
                if !ok {
                    chat_warn!("Clipboard rejected {} chars", text.len());
                }
                self.dispatch(Msg::CopyFinished { ok });
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = Msg> + Send + 'static,
    {
        self.outstanding += 1;
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = inbox.send(task.await);
        });
    }
}
