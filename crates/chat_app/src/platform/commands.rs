//! Maps composer lines to controller input.

use chat_core::{Msg, SettingsForm};

pub const HELP: &str = "\
Type a question and press Enter to send it.
  /copy N                               copy message N to the clipboard
  /settings                             show the current settings
  /settings <url> [streaming] [websocket]  save a new base URL and flags
  /cancel                               close the settings dialog
  /health                               probe the server again
  /bottom                               jump to the newest message
  /motion reduce|full                   set the motion preference
  /quit                                 leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text for the composer.
    Send(String),
    Dispatch(Vec<Msg>),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (name, args.as_slice()) {
        ("quit" | "exit", []) => Command::Quit,
        ("help", []) => Command::Help,
        ("health", []) => Command::Dispatch(vec![Msg::HealthCheckRequested]),
        ("bottom", []) => Command::Dispatch(vec![Msg::JumpToBottomClicked]),
        ("cancel", []) => Command::Dispatch(vec![Msg::SettingsCancelled]),
        ("copy", [n]) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Dispatch(vec![Msg::CopyClicked { index: n - 1 }]),
            _ => Command::Invalid(format!("not a message number: {n}")),
        },
        ("motion", ["reduce"]) => Command::Dispatch(vec![Msg::ReducedMotionChanged(true)]),
        ("motion", ["full"]) => Command::Dispatch(vec![Msg::ReducedMotionChanged(false)]),
        ("settings", []) => Command::Dispatch(vec![Msg::SettingsOpened]),
        ("settings", [url, flags @ ..]) => parse_settings(url, flags),
        _ => Command::Invalid(format!("unknown command: /{command}")),
    }
}

fn parse_settings(url: &str, flags: &[&str]) -> Command {
    let mut form = SettingsForm {
        base_api_url: url.to_string(),
        streaming_enabled: false,
        use_websocket: false,
    };
    for flag in flags {
        match *flag {
            "streaming" => form.streaming_enabled = true,
            "websocket" => form.use_websocket = true,
            other => return Command::Invalid(format!("unknown settings flag: {other}")),
        }
    }
    Command::Dispatch(vec![Msg::SettingsOpened, Msg::SettingsSubmitted(form)])
}
