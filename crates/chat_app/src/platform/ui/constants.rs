// Store layout, relative to the working directory.
pub const STORE_DIR: &str = "./.chat_widget";
pub const PAGE_FILE: &str = "chat.html";

pub const USER_PROMPT: &str = "you";
pub const BOT_PROMPT: &str = "bot";
