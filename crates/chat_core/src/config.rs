use serde::{Deserialize, Serialize};

/// Endpoint and feature configuration for the chat client.
///
/// Serialized with the same keys the browser widget stored under `chatConfig`,
/// so existing snapshots load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    #[serde(rename = "BASE_API_URL")]
    pub base_api_url: String,
    #[serde(rename = "ENDPOINT_CHAT")]
    pub chat_endpoint_path: String,
    #[serde(rename = "ENDPOINT_HEALTH")]
    pub health_endpoint_path: String,
    /// Declared for a future history sync; nothing requests it yet.
    #[serde(rename = "ENDPOINT_HISTORY")]
    pub history_endpoint_path: String,
    #[serde(rename = "STREAMING")]
    pub streaming_enabled: bool,
    #[serde(rename = "USE_WEBSOCKET")]
    pub use_websocket: bool,
    #[serde(rename = "WEBSOCKET_URL")]
    pub websocket_url: String,
    #[serde(rename = "MAX_CONTEXT_DOCS")]
    pub max_context_docs: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_api_url: "http://127.0.0.1:8000".to_string(),
            chat_endpoint_path: "/api/chat".to_string(),
            health_endpoint_path: "/api/health".to_string(),
            history_endpoint_path: "/api/history".to_string(),
            streaming_enabled: false,
            use_websocket: false,
            websocket_url: "ws://127.0.0.1:8000/ws".to_string(),
            max_context_docs: 3,
        }
    }
}

impl ChatConfig {
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_api_url, self.chat_endpoint_path)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_api_url, self.health_endpoint_path)
    }
}
