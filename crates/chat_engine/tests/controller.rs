use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_core::{
    ChatConfig, ChatMessage, ChatReply, Msg, NetworkStatus, NotificationKind, Sender,
    SettingsForm, Source, FALLBACK_ANSWER,
};
use chat_engine::{
    ChatController, ChatStorage, ChatTransport, Clock, MemoryStore, RecordingView,
    ReqwestTransport, TransportError, TransportSettings, ViewEvent, CONFIG_KEY, HISTORY_KEY,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers queries from a script, in call order.
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
    healthy: AtomicBool,
}

impl ScriptedTransport {
    fn with_replies(replies: Vec<Result<ChatReply, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            healthy: AtomicBool::new(true),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send_query(&self, _url: &str, query: &str) -> Result<ChatReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::NetworkFailure("script exhausted".into())))
    }

    async fn check_health(&self, _url: &str) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

fn fixed_clock() -> Clock {
    Arc::new(|| Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

fn controller(
    transport: Arc<dyn ChatTransport>,
    store: &MemoryStore,
) -> (ChatController, RecordingView) {
    let view = RecordingView::new();
    let controller = ChatController::new(transport, view.clone(), ChatStorage::new(store.clone()))
        .with_clock(fixed_clock());
    (controller, view)
}

fn stored_history(store: &MemoryStore) -> Vec<ChatMessage> {
    serde_json::from_str(&store.raw(HISTORY_KEY).expect("history persisted")).unwrap()
}

fn reply(answer: &str, latency_ms: Option<f64>) -> ChatReply {
    ChatReply {
        answer: answer.to_string(),
        sources: vec![Source {
            title: Some("Guide".to_string()),
            url: "https://docs.example.com/guide".to_string(),
            snippet: None,
        }],
        latency_ms,
    }
}

#[tokio::test(start_paused = true)]
async fn failed_request_falls_back_to_demo_answer() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(vec![Err(TransportError::HttpStatus(400))]);
    let (mut controller, view) = controller(transport.clone(), &store);

    controller.send("hello");
    assert!(controller.state().is_busy());
    controller.settle().await;

    let history = controller.state().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender(), Sender::User);
    assert_eq!(history[0].text(), "hello");
    assert_eq!(history[1].sender(), Sender::Bot);
    assert_eq!(history[1].text(), FALLBACK_ANSWER);
    assert!(!controller.state().is_busy());
    assert_eq!(controller.state().network(), NetworkStatus::Offline);
    assert_eq!(transport.calls(), 1);

    let errors: Vec<_> = view
        .notifications()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(stored_history(&store), history);
}

#[tokio::test(start_paused = true)]
async fn busy_clears_before_fallback_arrives() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(vec![Err(TransportError::NetworkFailure(
        "refused".into(),
    ))]);
    let (mut controller, _view) = controller(transport, &store);

    controller.send("hello");
    // Request result first, fallback timer second.
    controller.process_next().await;
    assert!(!controller.state().is_busy());
    assert_eq!(controller.state().history().len(), 1);
    assert!(controller.has_outstanding());

    controller.process_next().await;
    assert_eq!(controller.state().history().len(), 2);
    assert!(!controller.has_outstanding());
}

#[tokio::test(start_paused = true)]
async fn successful_answer_is_rendered_and_persisted() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(vec![Ok(reply("Hi", Some(42.0)))]);
    let (mut controller, view) = controller(transport.clone(), &store);

    controller.send("  hello  ");
    controller.settle().await;

    assert_eq!(*transport.queries.lock().unwrap(), vec!["hello".to_string()]);
    let history = controller.state().history().to_vec();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].text(), "Hi");
    assert_eq!(history[1].sources().len(), 1);
    assert_eq!(controller.state().network(), NetworkStatus::Online);

    let notifications = view.notifications();
    assert!(notifications
        .iter()
        .any(|n| n.kind == NotificationKind::Success && n.text.contains("42")));

    let rendered = view.last_render().expect("rendered");
    assert_eq!(rendered.messages, history);
    assert!(!rendered.busy);
    assert_eq!(stored_history(&store), history);

    let busy: Vec<_> = view
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ViewEvent::Busy(busy) => Some(busy),
            _ => None,
        })
        .collect();
    assert_eq!(busy, vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn blank_input_sends_nothing() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(Vec::new());
    let (mut controller, _view) = controller(transport.clone(), &store);

    controller.send(" \n\t ");
    assert!(!controller.has_outstanding());
    controller.settle().await;

    assert_eq!(transport.calls(), 0);
    assert!(controller.state().history().is_empty());
    assert!(store.raw(HISTORY_KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn start_restores_history_and_probes_health() {
    let store = MemoryStore::new();
    let at = Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap();
    let earlier = vec![
        ChatMessage::user("old question", at),
        ChatMessage::bot("old answer", Vec::new(), at),
    ];
    store.insert_raw(HISTORY_KEY, &serde_json::to_string(&earlier).unwrap());
    store.insert_raw(CONFIG_KEY, r#"{"BASE_API_URL":"https://chat.example.com"}"#);

    let transport = ScriptedTransport::with_replies(Vec::new());
    transport.healthy.store(false, Ordering::SeqCst);
    let (mut controller, view) = controller(transport, &store);

    controller.start(&ChatConfig::default());
    assert_eq!(controller.state().history(), earlier.as_slice());
    assert_eq!(controller.state().config().base_api_url, "https://chat.example.com");
    assert_eq!(controller.state().network(), NetworkStatus::Connecting);

    let rendered = view.last_render().expect("rendered on start");
    assert_eq!(rendered.messages, earlier);
    assert!(!rendered.show_empty_state);

    controller.settle().await;
    assert_eq!(controller.state().network(), NetworkStatus::Offline);
    assert_eq!(
        view.events().last(),
        Some(&ViewEvent::NetworkStatus(NetworkStatus::Offline))
    );
}

#[tokio::test(start_paused = true)]
async fn copy_uses_original_text() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(vec![Ok(reply("a < b", None))]);
    let (mut controller, view) = controller(transport, &store);

    controller.send("show <code>");
    controller.settle().await;
    view.take();

    controller.dispatch(Msg::CopyClicked { index: 1 });
    let events = view.take();
    assert_eq!(events[0], ViewEvent::Copied("a < b".to_string()));
    assert!(matches!(
        &events[1],
        ViewEvent::Notified(n) if n.text == "Message copied to clipboard"
    ));

    controller.dispatch(Msg::CopyClicked { index: 9 });
    assert!(view.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_copy_is_silent() {
    let store = MemoryStore::new();
    let transport: Arc<dyn ChatTransport> = ScriptedTransport::with_replies(Vec::new());
    let view = RecordingView::without_clipboard();
    let mut controller =
        ChatController::new(transport, view.clone(), ChatStorage::new(store.clone()));

    let at = Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap();
    store.insert_raw(
        HISTORY_KEY,
        &serde_json::to_string(&vec![ChatMessage::user("q", at)]).unwrap(),
    );
    controller.start(&ChatConfig::default());
    view.take();

    controller.dispatch(Msg::CopyClicked { index: 0 });
    assert!(view.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn saved_settings_are_persisted_and_used() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(Vec::new());
    let (mut controller, view) = controller(transport, &store);
    controller.start(&ChatConfig::default());
    controller.settle().await;

    controller.dispatch(Msg::SettingsOpened);
    assert!(view.last_render().unwrap().settings.is_some());

    controller.dispatch(Msg::SettingsSubmitted(SettingsForm {
        base_api_url: "  https://chat.example.com  ".to_string(),
        streaming_enabled: true,
        use_websocket: false,
    }));
    assert!(view.last_render().unwrap().settings.is_none());
    assert!(view
        .notifications()
        .iter()
        .any(|n| n.text == "Settings saved"));

    let saved: serde_json::Value =
        serde_json::from_str(&store.raw(CONFIG_KEY).expect("config persisted")).unwrap();
    assert_eq!(saved["BASE_API_URL"], "https://chat.example.com");
    assert_eq!(saved["STREAMING"], true);

    // Health is re-probed against the new base URL.
    assert!(controller.has_outstanding());
    controller.settle().await;
    assert_eq!(controller.state().network(), NetworkStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn invalid_settings_keep_dialog_open() {
    let store = MemoryStore::new();
    let transport = ScriptedTransport::with_replies(Vec::new());
    let (mut controller, view) = controller(transport, &store);

    controller.dispatch(Msg::SettingsOpened);
    controller.dispatch(Msg::SettingsSubmitted(SettingsForm {
        base_api_url: "ftp://files.example.com".to_string(),
        streaming_enabled: false,
        use_websocket: false,
    }));

    let settings = view.last_render().unwrap().settings.expect("dialog open");
    assert!(settings.error.is_some());
    assert!(store.raw(CONFIG_KEY).is_none());
    assert!(!controller.has_outstanding());
}

#[tokio::test]
async fn malformed_server_reply_uses_offline_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let transport = Arc::new(ReqwestTransport::new(TransportSettings::default()).unwrap());
    let (mut controller, _view) = controller(transport, &store);
    let defaults = ChatConfig {
        base_api_url: server.uri(),
        ..ChatConfig::default()
    };

    controller.start(&defaults);
    controller.settle().await;
    assert_eq!(controller.state().network(), NetworkStatus::Online);

    controller.send("hello");
    controller.settle().await;

    let history = controller.state().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].text(), FALLBACK_ANSWER);
    assert_eq!(controller.state().network(), NetworkStatus::Offline);
}
