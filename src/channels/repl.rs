//! Interactive REPL channel with line editing and markdown rendering.
//!
//! Uses rustyline for line editing, history, and tab-completion, and
//! termimad for rendering markdown replies inline.
//!
//! ## Local commands
//!
//! - `/quit` or `/exit` - Exit the REPL
//! - `/debug` - Toggle progress output
//!
//! Everything else, including `/help`, goes to the agent.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use regex::Regex;
use rustyline::completion::Completer;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use termimad::MadSkin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::config::ReplConfig;
use crate::error::ChannelError;

/// Max characters for status messages in the terminal.
const CLI_STATUS_MAX: usize = 200;

/// Slash commands available in the REPL.
const SLASH_COMMANDS: &[&str] = &[
    "/help",
    "/quit",
    "/exit",
    "/debug",
    "/transfer",
    "/swap",
    "/wrap",
    "/transaction",
    "/receive",
    "/ask",
];

/// Rustyline helper for slash-command tab completion.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<String> = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| cmd.to_string())
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }

        SLASH_COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

fn make_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Yellow);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.italic
        .set_fg(termimad::crossterm::style::Color::Magenta);
    skin.inline_code
        .set_fg(termimad::crossterm::style::Color::Green);
    skin.code_block
        .set_fg(termimad::crossterm::style::Color::Green);
    skin.code_block.left_margin = 2;
    skin
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
}

/// REPL channel with line editing and markdown rendering.
pub struct ReplChannel {
    /// Optional single message to send (for -m flag).
    single_message: Option<String>,
    history_file: PathBuf,
    show_banner: bool,
    /// Shared with the input thread.
    debug_mode: Arc<AtomicBool>,
}

impl ReplChannel {
    pub fn new(config: &ReplConfig) -> Self {
        Self {
            single_message: None,
            history_file: config.history_file.clone(),
            show_banner: config.show_banner,
            debug_mode: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a REPL channel that sends a single message and exits.
    pub fn with_message(config: &ReplConfig, message: String) -> Self {
        Self {
            single_message: Some(message),
            ..Self::new(config)
        }
    }

    fn is_debug(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }
}

fn truncate_for_preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Mask credentials that may appear in status text, such as RPC URLs with
/// embedded keys.
fn redact_sensitive_preview(raw: &str) -> String {
    let mut value = raw.to_string();

    let patterns = [
        (r"(?i)\b(bearer)\s+[a-z0-9._\-~+/]+=*", "$1 [REDACTED]"),
        (
            r"(?i)\b(token|api[_\-]?key|secret|password|private[_\-]?key)\b(\s*[:=]\s*)([^,\s]+)",
            "$1$2[REDACTED]",
        ),
        (r"(?i)(https?://[^\s/]+/v\d+/)[a-z0-9_\-]{16,}", "$1[REDACTED]"),
    ];

    for (pattern, replacement) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            value = re.replace_all(&value, replacement).to_string();
        }
    }

    value
}

fn build_status_line(status: &StatusUpdate) -> String {
    match status {
        StatusUpdate::Thinking(msg) => {
            let display = truncate_for_preview(&redact_sensitive_preview(msg), CLI_STATUS_MAX);
            format!("  \x1b[90m\u{25CB} {display}\x1b[0m")
        }
        StatusUpdate::StageCompleted { stage, success } => {
            if *success {
                format!("  \x1b[32m\u{25CF} {stage}\x1b[0m")
            } else {
                format!("  \x1b[31m\u{2717} {stage} (failed)\x1b[0m")
            }
        }
    }
}

#[async_trait]
impl Channel for ReplChannel {
    fn name(&self) -> &str {
        "repl"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let single_message = self.single_message.clone();
        let debug_mode = Arc::clone(&self.debug_mode);
        let history_file = self.history_file.clone();
        let show_banner = self.show_banner;

        std::thread::spawn(move || {
            if let Some(msg) = single_message {
                let _ = tx.blocking_send(IncomingMessage::new("repl", "default", msg));
                return;
            }

            let builder = match Config::builder().history_ignore_dups(true) {
                Ok(builder) => builder,
                Err(e) => {
                    eprintln!("Failed to configure line editor: {e}");
                    return;
                }
            };
            let config = builder
                .auto_add_history(true)
                .completion_type(CompletionType::List)
                .build();

            let mut rl = match Editor::with_config(config) {
                Ok(editor) => editor,
                Err(e) => {
                    eprintln!("Failed to initialize line editor: {e}");
                    return;
                }
            };
            rl.set_helper(Some(ReplHelper));

            if let Some(parent) = history_file.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(&history_file);

            if show_banner {
                println!("\x1b[1monchain-agent\x1b[0m  /help for commands, /quit to exit");
                println!();
            }

            loop {
                let prompt = if debug_mode.load(Ordering::Relaxed) {
                    "\x1b[33m[debug]\x1b[0m \x1b[1;36m\u{203A}\x1b[0m "
                } else {
                    "\x1b[1;36m\u{203A}\x1b[0m "
                };

                match rl.readline(prompt) {
                    Ok(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }

                        match line.to_lowercase().as_str() {
                            "/quit" | "/exit" => break,
                            "/debug" => {
                                let current = debug_mode.load(Ordering::Relaxed);
                                debug_mode.store(!current, Ordering::Relaxed);
                                if !current {
                                    println!("\x1b[90mdebug mode on\x1b[0m");
                                } else {
                                    println!("\x1b[90mdebug mode off\x1b[0m");
                                }
                                continue;
                            }
                            _ => {}
                        }

                        if tx
                            .blocking_send(IncomingMessage::new("repl", "default", line))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => break,
                    Err(e) => {
                        eprintln!("Input error: {e}");
                        break;
                    }
                }
            }

            let _ = rl.save_history(&history_file);
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let width = terminal_width();
        eprintln!("\x1b[90m{}\x1b[0m", "\u{2500}".repeat(width.min(80)));

        let skin = make_skin();
        let text = termimad::FmtText::from(&skin, &response.content, Some(width));
        print!("{text}");
        println!();
        Ok(())
    }

    async fn send_status(&self, status: StatusUpdate) -> Result<(), ChannelError> {
        if self.is_debug() {
            eprintln!("{}", build_status_line(&status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_sensitive_preview_tokens() {
        let message = "connect failed bearer abc.def.ghi api_key: xyz987 private_key=0xdeadbeef \
                       https://base-sepolia.g.alchemy.com/v2/abcdefghijklmnop1234";
        let redacted = redact_sensitive_preview(message);
        assert!(!redacted.contains("abc.def.ghi"));
        assert!(!redacted.contains("xyz987"));
        assert!(!redacted.contains("0xdeadbeef"));
        assert!(!redacted.contains("abcdefghijklmnop1234"));
        assert!(redacted.contains("https://base-sepolia.g.alchemy.com/v2/[REDACTED]"));
    }

    #[test]
    fn status_lines_show_stage_outcome() {
        let ok = build_status_line(&StatusUpdate::StageCompleted {
            stage: "validate".to_string(),
            success: true,
        });
        assert!(ok.contains("validate"));
        assert!(!ok.contains("failed"));

        let failed = build_status_line(&StatusUpdate::StageCompleted {
            stage: "execute".to_string(),
            success: false,
        });
        assert!(failed.contains("execute (failed)"));
    }

    #[test]
    fn truncates_long_previews_on_char_boundaries() {
        let long = "\u{00e9}".repeat(300);
        let preview = truncate_for_preview(&long, 10);
        assert_eq!(preview.chars().count(), 13);
    }

    #[test]
    fn slash_commands_cover_agent_verbs() {
        for verb in ["/transfer", "/swap", "/wrap", "/receive", "/ask", "/help"] {
            assert!(SLASH_COMMANDS.contains(&verb), "{verb}");
        }
    }
}
