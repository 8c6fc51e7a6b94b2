//! Renders chat state into a [`dom`](crate::dom) tree.
//!
//! Every function here is pure: the same input always yields an equal tree.

use chat_core::{AppViewModel, ChatMessage, NetworkStatus, ScrollBehavior, Sender, Source};
use chrono::{FixedOffset, Offset, SecondsFormat, Utc};
use url::Url;

use crate::dom::{Element, Node};

const CODE_FENCE: &str = "```";
const EMPTY_STATE_TEXT: &str = "No messages yet. Ask something to get started.";

const PAGE_STYLE: &str = "\
body{margin:0;font-family:sans-serif;background:#0f172a;color:#cbd5e1}\
#chat-area{display:flex;flex-direction:column;gap:12px;padding:16px}\
.message-bubble{max-width:75%;border-radius:16px;padding:16px;position:relative;white-space:pre-wrap}\
.message-bubble.user{align-self:flex-end;background:rgba(37,99,235,.15);color:#67e8f9}\
.message-bubble.bot{align-self:flex-start;background:rgba(15,23,42,.6);border:1px solid rgba(255,255,255,.1)}\
.sources{margin-top:12px;border-top:1px solid rgba(255,255,255,.1);font-size:12px}\
.status-chip{border-radius:999px;padding:4px 12px;font-family:monospace;font-size:12px}\
.status-chip.online{background:#0e7490}.status-chip.offline{background:#b91c1c}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Upper bound on sources rendered per bot message.
    pub max_sources: usize,
    pub scroll_behavior: ScrollBehavior,
    /// Offset used for the `HH:MM` labels.
    pub utc_offset: FixedOffset,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_sources: 3,
            scroll_behavior: ScrollBehavior::Smooth,
            utc_offset: Utc.fix(),
        }
    }
}

/// Renders the message list, or the empty-state placeholder when there are no messages.
pub fn render_history(messages: &[ChatMessage], options: &RenderOptions) -> Element {
    let area = Element::new("section")
        .attr("id", "chat-area")
        .attr("role", "log")
        .attr("aria-live", "polite")
        .attr("data-scroll-behavior", scroll_behavior_label(options.scroll_behavior));

    if messages.is_empty() {
        return area.child(
            Element::new("div")
                .class("empty-state")
                .attr("id", "empty-state")
                .text(EMPTY_STATE_TEXT),
        );
    }

    area.children(
        messages
            .iter()
            .enumerate()
            .map(|(index, message)| render_message(index, message, options)),
    )
}

pub fn render_message(index: usize, message: &ChatMessage, options: &RenderOptions) -> Element {
    let sender_class = match message.sender() {
        Sender::User => "message-bubble user",
        Sender::Bot => "message-bubble bot",
    };

    // The copy button carries the original text, not the rendered markup.
    let copy_button = Element::new("button")
        .attr("type", "button")
        .class("copy-btn")
        .attr("aria-label", "Copy message to clipboard")
        .attr("data-copy", message.text())
        .attr("data-index", index.to_string())
        .text("Copy");

    let content = Element::new("div")
        .class("content")
        .children(format_message_text(message.text()))
        .child(copy_button);

    let mut bubble = Element::new("article")
        .class(sender_class)
        .attr("data-index", index.to_string())
        .child(content);

    if message.sender() == Sender::Bot && !message.sources().is_empty() {
        bubble = bubble.child(render_sources(message.sources(), options.max_sources));
    }

    let timestamp = message.timestamp();
    bubble.child(
        Element::new("time")
            .attr(
                "datetime",
                timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .text(
                timestamp
                    .with_timezone(&options.utc_offset)
                    .format("%H:%M")
                    .to_string(),
            ),
    )
}

/// Splits message text into nodes: fenced blocks become `<pre><code>`, other newlines `<br />`.
///
/// An opening fence without a closing one is kept as literal text.
pub fn format_message_text(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(CODE_FENCE) {
        let body_start = start + CODE_FENCE.len();
        let Some(len) = rest[body_start..].find(CODE_FENCE) else {
            break;
        };
        push_lines(&mut nodes, &rest[..start]);
        let code = rest[body_start..body_start + len].trim();
        nodes.push(
            Element::new("pre")
                .attr("tabindex", "0")
                .child(Element::new("code").text(code))
                .into(),
        );
        rest = &rest[body_start + len + CODE_FENCE.len()..];
    }
    push_lines(&mut nodes, rest);
    nodes
}

fn push_lines(nodes: &mut Vec<Node>, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Element::new("br").into());
        }
        if !line.is_empty() {
            nodes.push(Node::text(line));
        }
    }
}

/// Renders at most `max_sources` citations.
pub fn render_sources(sources: &[Source], max_sources: usize) -> Element {
    let items = sources.iter().take(max_sources).map(|source| {
        let mut item = Element::new("li").child(render_source_link(source));
        if let Some(snippet) = source.snippet() {
            item = item.child(Element::new("p").class("snippet").text(snippet));
        }
        item
    });

    Element::new("section")
        .class("sources")
        .child(Element::new("h3").text("Sources:"))
        .child(Element::new("ul").children(items))
}

fn render_source_link(source: &Source) -> Element {
    if is_linkable(&source.url) {
        Element::new("a")
            .attr("href", source.url.as_str())
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .text(source.label())
    } else {
        Element::new("span").class("source-label").text(source.label())
    }
}

fn is_linkable(url: &str) -> bool {
    Url::parse(url)
        .map(|url| matches!(url.scheme(), "http" | "https" | "mailto"))
        .unwrap_or(false)
}

pub fn render_status_chip(status: NetworkStatus) -> Element {
    let (class, label) = match status {
        NetworkStatus::Connecting => ("status-chip connecting", "Connecting..."),
        NetworkStatus::Online => ("status-chip online", "Online"),
        NetworkStatus::Offline => ("status-chip offline", "Offline"),
    };
    Element::new("span")
        .class(class)
        .attr("id", "status-chip")
        .attr("role", "status")
        .text(label)
}

/// Renders a complete standalone page for the current view.
pub fn render_page(view: &AppViewModel, options: &RenderOptions) -> String {
    let options = RenderOptions {
        max_sources: view.max_sources,
        ..options.clone()
    };

    let header = Element::new("header")
        .child(Element::new("h1").text("Chat"))
        .child(render_status_chip(view.network));

    let typing = Element::new("div")
        .attr("id", "typing-indicator")
        .attr("aria-live", "polite")
        .flag("hidden", !view.busy)
        .text("Typing...");

    let jump = Element::new("button")
        .attr("type", "button")
        .attr("id", "btn-scroll-bottom")
        .flag("hidden", !view.show_jump_to_bottom)
        .text("Jump to latest");

    let composer = Element::new("form")
        .attr("id", "form-composer")
        .child(
            Element::new("textarea")
                .attr("id", "input-message")
                .attr("aria-label", "Message")
                .text(view.input.as_str()),
        )
        .child(
            Element::new("button")
                .attr("type", "submit")
                .attr("id", "btn-send")
                .flag("disabled", !view.can_submit)
                .text("Send"),
        );

    let mut body = Element::new("body")
        .child(header)
        .child(render_history(&view.messages, &options))
        .child(typing)
        .child(jump)
        .child(composer);

    if let Some(settings) = &view.settings {
        let mut form = Element::new("form")
            .attr("id", "form-settings")
            .child(
                Element::new("input")
                    .attr("id", "input-base-api")
                    .attr("type", "url")
                    .attr("value", settings.form.base_api_url.as_str()),
            )
            .child(
                Element::new("input")
                    .attr("id", "input-streaming")
                    .attr("type", "checkbox")
                    .flag("checked", settings.form.streaming_enabled),
            )
            .child(
                Element::new("input")
                    .attr("id", "input-use-websocket")
                    .attr("type", "checkbox")
                    .flag("checked", settings.form.use_websocket),
            );
        if let Some(error) = &settings.error {
            form = form.child(Element::new("p").class("field-error").text(error.as_str()));
        }
        body = body.child(
            Element::new("div")
                .attr("id", "modal-settings")
                .attr("role", "dialog")
                .child(form),
        );
    }

    let html = Element::new("html")
        .attr("lang", "en")
        .child(
            Element::new("head")
                .child(Element::new("meta").attr("charset", "utf-8"))
                .child(Element::new("title").text("Chat"))
                .child(Element::new("style").text(PAGE_STYLE)),
        )
        .child(body);

    format!("<!DOCTYPE html>\n{}\n", html.to_html())
}

fn scroll_behavior_label(behavior: ScrollBehavior) -> &'static str {
    match behavior {
        ScrollBehavior::Instant => "auto",
        ScrollBehavior::Smooth => "smooth",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(nodes: &[Node]) -> String {
        nodes.iter().map(Node::to_html).collect()
    }

    #[test]
    fn newlines_become_line_breaks() {
        assert_eq!(html(&format_message_text("a\nb")), "a<br />b");
    }

    #[test]
    fn fenced_code_becomes_preformatted_block() {
        let nodes = format_message_text("see:\n```\nfn main() {}\n```\ndone");
        assert_eq!(
            html(&nodes),
            "see:<br /><pre tabindex=\"0\"><code>fn main() {}</code></pre><br />done"
        );
    }

    #[test]
    fn code_is_escaped_once() {
        let nodes = format_message_text("```a && b < c```");
        assert_eq!(
            html(&nodes),
            "<pre tabindex=\"0\"><code>a &amp;&amp; b &lt; c</code></pre>"
        );
    }

    #[test]
    fn unmatched_fence_is_literal() {
        assert_eq!(html(&format_message_text("x ``` y")), "x ``` y");
    }

    #[test]
    fn non_web_urls_are_not_links() {
        assert!(is_linkable("https://example.com/a"));
        assert!(is_linkable("mailto:team@example.com"));
        assert!(!is_linkable("javascript:alert(1)"));
        assert!(!is_linkable("not a url"));
    }
}
