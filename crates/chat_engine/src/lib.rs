//! Chat engine: transport, persistence, rendering and effect execution.
mod controller;
pub mod dom;
mod persist;
pub mod render;
mod storage;
mod transport;
mod view;

pub use controller::{ChatController, Clock};
pub use persist::{ensure_store_dir, AtomicFileWriter, PersistError};
pub use render::RenderOptions;
pub use storage::{
    ChatStorage, FileStore, KeyValueStore, MemoryStore, StorageError, CONFIG_KEY, HISTORY_KEY,
};
pub use transport::{
    parse_chat_reply, ChatTransport, ReqwestTransport, TransportError, TransportSettings,
};
pub use view::{ChatView, RecordingView, ViewEvent};
