use std::time::Duration;

use crate::{
    AppState, ChatMessage, Effect, Msg, NetworkStatus, Notification, NotificationKind,
};

/// Delay between a failed request and the canned offline answer.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(1500);

/// Answer appended when the chat endpoint cannot be used.
pub const FALLBACK_ANSWER: &str =
    "Sorry, the server is not available right now. This is a demo answer.\n\nPlease try again later.";

/// Distance from the bottom at which the "jump to bottom" affordance appears.
pub const JUMP_TO_BOTTOM_THRESHOLD_PX: f64 = 100.0;

const LATENCY_TOAST: Duration = Duration::from_millis(2500);
const OFFLINE_TOAST: Duration = Duration::from_millis(4000);
const COPY_TOAST: Duration = Duration::from_millis(2000);
const SETTINGS_SAVED_TOAST: Duration = Duration::from_millis(2500);
const SETTINGS_ERROR_TOAST: Duration = Duration::from_millis(3000);
const WEBSOCKET_TOAST: Duration = Duration::from_millis(3000);

/// Pure update function: applies a message to state and returns any effects.
///
/// Rendering is not an effect: callers re-render whenever `consume_dirty` reports a change,
/// before executing the returned effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreHistory(history) => {
            state.restore_history(history);
            Vec::new()
        }
        Msg::RestoreConfig(config) => {
            state.set_config(config);
            Vec::new()
        }
        Msg::Started => {
            state.mark_dirty();
            let mut effects = vec![
                Effect::ShowNetworkStatus(state.network()),
                Effect::ScrollToBottom(state.scroll_behavior()),
                Effect::CheckHealth {
                    url: state.config().health_url(),
                },
            ];
            if state.config().use_websocket {
                effects.push(Effect::ConnectWebSocket {
                    url: state.config().websocket_url.clone(),
                });
                effects.push(Effect::Notify(Notification::new(
                    "Live updates are not available yet, using HTTP requests.",
                    NotificationKind::Info,
                    WEBSOCKET_TOAST,
                )));
            }
            effects
        }
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SubmitClicked { at } => {
            let query = state.input().trim().to_string();
            if query.is_empty() {
                return (state, Vec::new());
            }

            state.push_message(ChatMessage::user(query.clone(), at));
            state.set_input(String::new());
            state.set_busy(true);
            let request_id = state.begin_request();

            vec![
                Effect::ScrollToBottom(state.scroll_behavior()),
                Effect::PersistHistory(state.history().to_vec()),
                Effect::ShowBusy(true),
                Effect::SendQuery {
                    request_id,
                    url: state.config().chat_url(),
                    query,
                },
            ]
        }
        Msg::QueryAnswered {
            request_id,
            reply,
            at,
        } => {
            if !state.settle_request(request_id) {
                return (state, Vec::new());
            }

            state.push_message(ChatMessage::bot(reply.answer, reply.sources, at));
            state.set_network(NetworkStatus::Online);
            state.set_busy(false);

            let latency_text = match reply.latency_ms {
                Some(ms) => format!("Response received in {ms} ms"),
                None => "Response received".to_string(),
            };

            vec![
                Effect::ScrollToBottom(state.scroll_behavior()),
                Effect::PersistHistory(state.history().to_vec()),
                Effect::Notify(Notification::new(
                    latency_text,
                    NotificationKind::Success,
                    LATENCY_TOAST,
                )),
                Effect::ShowNetworkStatus(NetworkStatus::Online),
                Effect::ShowBusy(false),
            ]
        }
        Msg::QueryFailed { request_id, .. } => {
            if !state.settle_request(request_id) {
                return (state, Vec::new());
            }

            state.set_network(NetworkStatus::Offline);
            // Busy clears now, before the fallback answer arrives.
            state.set_busy(false);
            state.add_pending_fallback(request_id);

            vec![
                Effect::ShowNetworkStatus(NetworkStatus::Offline),
                Effect::Notify(Notification::new(
                    "Could not reach the server, using the offline demo.",
                    NotificationKind::Error,
                    OFFLINE_TOAST,
                )),
                Effect::ScheduleFallback {
                    request_id,
                    delay: FALLBACK_DELAY,
                },
                Effect::ShowBusy(false),
            ]
        }
        Msg::FallbackElapsed { request_id, at } => {
            if !state.take_pending_fallback(request_id) {
                return (state, Vec::new());
            }

            state.push_message(ChatMessage::bot(FALLBACK_ANSWER, Vec::new(), at));
            vec![
                Effect::ScrollToBottom(state.scroll_behavior()),
                Effect::PersistHistory(state.history().to_vec()),
            ]
        }
        Msg::HealthCheckRequested => vec![Effect::CheckHealth {
            url: state.config().health_url(),
        }],
        Msg::HealthChecked { online } => {
            let status = if online {
                NetworkStatus::Online
            } else {
                NetworkStatus::Offline
            };
            state.set_network(status);
            vec![Effect::ShowNetworkStatus(status)]
        }
        Msg::Scrolled(metrics) => {
            let far_from_bottom = metrics.distance_from_bottom() >= JUMP_TO_BOTTOM_THRESHOLD_PX;
            state.set_jump_to_bottom_visible(far_from_bottom);
            Vec::new()
        }
        Msg::JumpToBottomClicked => {
            state.set_jump_to_bottom_visible(false);
            vec![Effect::ScrollToBottom(state.scroll_behavior())]
        }
        Msg::ReducedMotionChanged(reduced) => {
            state.set_reduced_motion(reduced);
            Vec::new()
        }
        Msg::CopyClicked { index } => match state.history().get(index) {
            Some(message) => vec![Effect::CopyToClipboard {
                text: message.text().to_string(),
            }],
            None => Vec::new(),
        },
        Msg::CopyFinished { ok } => {
            if ok {
                vec![Effect::Notify(Notification::new(
                    "Message copied to clipboard",
                    NotificationKind::Success,
                    COPY_TOAST,
                ))]
            } else {
                Vec::new()
            }
        }
        Msg::SettingsOpened => {
            state.open_settings();
            Vec::new()
        }
        Msg::SettingsCancelled => {
            state.close_settings();
            Vec::new()
        }
        Msg::SettingsSubmitted(form) => match form.apply_to(state.config()) {
            Ok(config) => {
                state.set_config(config);
                state.close_settings();
                vec![
                    Effect::PersistConfig(state.config().clone()),
                    Effect::Notify(Notification::new(
                        "Settings saved",
                        NotificationKind::Success,
                        SETTINGS_SAVED_TOAST,
                    )),
                    Effect::CheckHealth {
                        url: state.config().health_url(),
                    },
                ]
            }
            Err(err) => {
                let text = err.to_string();
                state.reject_settings(form, err);
                vec![Effect::Notify(Notification::new(
                    text,
                    NotificationKind::Error,
                    SETTINGS_ERROR_TOAST,
                ))]
            }
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
