use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chat_core::ChatConfig;
use chat_engine::{
    ensure_store_dir, ChatController, ChatStorage, FileStore, RenderOptions, ReqwestTransport,
    TransportSettings,
};
use chat_logging::{chat_info, LogSettings};
use chrono::{Local, Offset};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::commands::{self, Command, HELP};
use super::ui::constants::STORE_DIR;
use super::ui::terminal::TerminalView;

pub async fn run_app() -> anyhow::Result<()> {
    chat_logging::initialize(&LogSettings::default());

    let store_dir = PathBuf::from(STORE_DIR);
    ensure_store_dir(&store_dir)
        .with_context(|| format!("preparing store directory {}", store_dir.display()))?;

    let transport =
        ReqwestTransport::new(TransportSettings::default()).context("building HTTP client")?;
    let options = RenderOptions {
        utc_offset: Local::now().offset().fix(),
        ..RenderOptions::default()
    };
    let view = TerminalView::new(std::io::stdout(), options).with_page_dir(store_dir.clone());
    let storage = ChatStorage::new(FileStore::new(store_dir));

    let mut controller = ChatController::new(Arc::new(transport), view, storage);
    println!("{HELP}");
    controller.start(&ChatConfig::default());

    run_lines(&mut controller, BufReader::new(tokio::io::stdin())).await?;

    chat_info!("Chat session ended");
    Ok(())
}

/// Feeds composer lines to the controller until `/quit` or end of input.
///
/// At end of input, requests and fallback timers still running are allowed to finish.
async fn run_lines<R>(controller: &mut ChatController, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    controller.settle().await;
                    return Ok(());
                };
                match commands::parse_line(&line) {
                    Command::Send(text) => controller.send(text),
                    Command::Dispatch(msgs) => {
                        for msg in msgs {
                            controller.dispatch(msg);
                        }
                    }
                    Command::Help => println!("{HELP}"),
                    Command::Quit => return Ok(()),
                    Command::Invalid(reason) => eprintln!("{reason} (try /help)"),
                }
            }
            _ = controller.process_next() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chat_core::{ChatReply, FALLBACK_ANSWER};
    use chat_engine::{ChatTransport, MemoryStore, RecordingView, TransportError};
    use pretty_assertions::assert_eq;

    use super::*;

    struct Unreachable;

    #[async_trait]
    impl ChatTransport for Unreachable {
        async fn send_query(&self, _url: &str, _query: &str) -> Result<ChatReply, TransportError> {
            Err(TransportError::NetworkFailure("connection refused".into()))
        }

        async fn check_health(&self, _url: &str) -> bool {
            false
        }
    }

    fn controller() -> ChatController {
        ChatController::new(
            Arc::new(Unreachable),
            RecordingView::new(),
            ChatStorage::new(MemoryStore::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_waits_for_pending_answers() {
        let mut controller = controller();
        run_lines(&mut controller, "hello\n".as_bytes()).await.unwrap();

        let history = controller.state().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text(), FALLBACK_ANSWER);
        assert!(!controller.has_outstanding());
    }

    #[tokio::test(start_paused = true)]
    async fn quit_returns_without_waiting() {
        let mut controller = controller();
        run_lines(&mut controller, "hello\n/quit\nignored\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(controller.state().history().len(), 1);
        assert!(controller.has_outstanding());
    }
}
