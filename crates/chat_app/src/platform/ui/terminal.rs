//! Line-oriented front end: prints new messages and status to a writer and keeps a
//! rendered HTML page of the conversation next to the store.

use std::io::Write;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chat_core::{
    AppViewModel, ChatMessage, NetworkStatus, Notification, NotificationKind, ScrollBehavior,
    Sender,
};
use chat_engine::render::render_page;
use chat_engine::{AtomicFileWriter, ChatView, RenderOptions};
use chat_logging::{chat_debug, chat_warn};

use super::constants::{BOT_PROMPT, PAGE_FILE, USER_PROMPT};

pub struct TerminalView<W: Write + Send> {
    out: W,
    page: Option<AtomicFileWriter>,
    options: RenderOptions,
    /// Number of history entries already printed.
    printed: usize,
    empty_state_shown: bool,
    settings_open: bool,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self {
            out,
            page: None,
            options,
            printed: 0,
            empty_state_shown: false,
            settings_open: false,
        }
    }

    /// Also mirror every render into `<dir>/chat.html`.
    pub fn with_page_dir(mut self, dir: PathBuf) -> Self {
        self.page = Some(AtomicFileWriter::new(dir));
        self
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if writeln!(self.out, "{text}").and_then(|_| self.out.flush()).is_err() {
            chat_warn!("Could not write to the terminal");
        }
    }

    fn write_page(&self, view: &AppViewModel) {
        let Some(writer) = &self.page else {
            return;
        };
        let page = render_page(view, &self.options);
        if let Err(err) = writer.write(PAGE_FILE, &page) {
            chat_warn!("Could not write chat page to {:?}: {}", writer.dir(), err);
        }
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn render(&mut self, view: &AppViewModel) {
        self.write_page(view);

        if view.messages.len() < self.printed {
            self.printed = 0;
        }
        if view.show_empty_state && !self.empty_state_shown {
            self.line("No messages yet. Ask something to get started.");
        }
        self.empty_state_shown = view.show_empty_state;
        for index in self.printed..view.messages.len() {
            let text = format_message(index, &view.messages[index], view.max_sources, &self.options);
            self.line(&text);
        }
        self.printed = view.messages.len();

        match &view.settings {
            Some(settings) => {
                if !self.settings_open {
                    let form = &settings.form;
                    self.line(&format!(
                        "settings: base url {} | streaming {} | websocket {}",
                        form.base_api_url, form.streaming_enabled, form.use_websocket
                    ));
                }
                if let Some(error) = &settings.error {
                    self.line(&format!("settings: {error}"));
                }
                self.settings_open = true;
            }
            None => self.settings_open = false,
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            self.line("Typing...");
        }
    }

    fn set_network_status(&mut self, status: NetworkStatus) {
        self.line(&format!("[{}]", status_label(status)));
    }

    fn notify(&mut self, notification: &Notification) {
        let marker = match notification.kind {
            NotificationKind::Success => "+",
            NotificationKind::Error => "!",
            NotificationKind::Info => "*",
        };
        self.line(&format!("{marker} {}", notification.text));
    }

    fn scroll_to_bottom(&mut self, behavior: ScrollBehavior) {
        chat_debug!("Scroll to bottom ({:?})", behavior);
    }

    fn copy_to_clipboard(&mut self, text: &str) -> bool {
        let sequence = osc52_sequence(text);
        self.out
            .write_all(sequence.as_bytes())
            .and_then(|_| self.out.flush())
            .is_ok()
    }
}

fn status_label(status: NetworkStatus) -> &'static str {
    match status {
        NetworkStatus::Connecting => "Connecting...",
        NetworkStatus::Online => "Online",
        NetworkStatus::Offline => "Offline",
    }
}

/// `[n] HH:MM who> text`, followed by up to `max_sources` source lines for bot replies.
pub fn format_message(
    index: usize,
    message: &ChatMessage,
    max_sources: usize,
    options: &RenderOptions,
) -> String {
    let who = match message.sender() {
        Sender::User => USER_PROMPT,
        Sender::Bot => BOT_PROMPT,
    };
    let time = message
        .timestamp()
        .with_timezone(&options.utc_offset)
        .format("%H:%M");
    let mut out = format!("[{}] {} {}> {}", index + 1, time, who, message.text());

    if message.sender() == Sender::Bot && !message.sources().is_empty() {
        out.push_str("\n    Sources:");
        for source in message.sources().iter().take(max_sources) {
            out.push_str(&format!("\n    - {} <{}>", source.label(), source.url));
            if let Some(snippet) = source.snippet() {
                out.push_str(&format!("\n      {snippet}"));
            }
        }
    }
    out
}

/// Terminal escape that asks the emulator to place `text` on the system clipboard.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}
