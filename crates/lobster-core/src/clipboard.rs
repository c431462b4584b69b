use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use tracing::debug;

/// How long the "copied" acknowledgment stays up.
pub const COPY_ACK_DURATION: Duration = Duration::from_millis(2000);

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Pipes text into the platform's clipboard command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_COMMANDS {
            let Ok(mut child) = Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            else {
                continue;
            };

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes())?;
            }
            if child.wait()?.success() {
                debug!(program, bytes = text.len(), "copied to clipboard");
                return Ok(());
            }
        }
        Err(anyhow!("no clipboard command available"))
    }
}

/// Transient "copied" flag that clears itself after [`COPY_ACK_DURATION`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyAck {
    copied_at: Option<Instant>,
}

impl CopyAck {
    pub fn mark(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn is_copied(&self) -> bool {
        self.copied_at.is_some()
    }

    /// Clear the flag once it has been up long enough. Returns true if it cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) >= COPY_ACK_DURATION => {
                self.copied_at = None;
                true
            }
            _ => false,
        }
    }
}
