//! The Vibe Coder: prompt in, single-file HTML app out.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, error};

use crate::ai::{Content, ContentGenerator, GenerateConfig, GenerateRequest};
use crate::clipboard::{Clipboard, CopyAck};
use crate::config::Config;
use crate::persona::{VIBE_CODER_SYSTEM_INSTRUCTION, VIBE_CODER_TEMPERATURE};

pub const PREVIEW_FILE_NAME: &str = "lobster-vibe-preview.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Preview,
    Source,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Preview => ViewMode::Source,
            ViewMode::Source => ViewMode::Preview,
        }
    }
}

#[derive(Debug, Default)]
pub struct VibeCoder {
    pub prompt: String,
    document: Option<String>,
    busy: bool,
    pub view_mode: ViewMode,
    pub copied: CopyAck,
}

impl VibeCoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Start a generation for the current prompt.
    ///
    /// Rejected (returns `None`) for a blank prompt or while busy. Otherwise
    /// drops the previous document and sets busy. The prompt stays in place.
    pub fn submit(&mut self) -> Option<String> {
        if self.prompt.trim().is_empty() || self.busy {
            return None;
        }
        self.document = None;
        self.busy = true;
        Some(self.prompt.clone())
    }

    pub fn settle(&mut self, outcome: Result<String>) {
        match outcome {
            Ok(text) => {
                self.document = Some(strip_code_fence(&text).to_string());
                self.view_mode = ViewMode::Preview;
            }
            Err(err) => {
                error!(error = %err, "vibe coder generation failed");
            }
        }
        self.busy = false;
    }

    /// Submit and await the generation in one go. Returns false when rejected.
    pub async fn generate(&mut self, generator: &dyn ContentGenerator, model: &str) -> bool {
        let Some(prompt) = self.submit() else {
            return false;
        };
        let outcome = generate_document(generator, model, &prompt).await;
        self.settle(outcome);
        true
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = self.view_mode.toggled();
    }

    /// Copy the stored document verbatim. Returns false when there is nothing to copy.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> Result<bool> {
        let Some(document) = self.document.as_deref() else {
            return Ok(false);
        };
        clipboard.set_text(document)?;
        self.copied.mark(now);
        Ok(true)
    }

    /// Drop the "copied" acknowledgment once it has expired.
    pub fn tick(&mut self, now: Instant) {
        self.copied.expire(now);
    }
}

/// Ask the model for a document. Returns its raw text, possibly still fenced.
pub async fn generate_document(
    generator: &dyn ContentGenerator,
    model: &str,
    prompt: &str,
) -> Result<String> {
    let response = generator
        .generate_content(GenerateRequest {
            model: model.to_string(),
            contents: vec![Content::user_text(prompt)],
            config: GenerateConfig {
                system_instruction: VIBE_CODER_SYSTEM_INSTRUCTION.to_string(),
                temperature: VIBE_CODER_TEMPERATURE,
                tools: Vec::new(),
            },
        })
        .await?;

    debug!(len = response.text.len(), "vibe coder document received");
    Ok(response.text)
}

fn leading_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A```html\n?").expect("valid regex"))
}

fn trailing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\z").expect("valid regex"))
}

/// Remove one leading "```html" and one trailing "```" marker, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let start = leading_fence().find(text).map(|m| m.end()).unwrap_or(0);
    let rest = &text[start..];
    let end = trailing_fence().find(rest).map(|m| m.start()).unwrap_or(rest.len());
    &rest[..end]
}

/// Contents of the first `<title>` element, if any.
pub fn document_title(document: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
    re.captures(document)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Where the TUI writes previews: a private directory under the config dir.
pub fn preview_dir() -> Result<PathBuf> {
    Ok(Config::config_dir()?.join("preview"))
}

/// Write the document untouched to a standalone file for a browser to open.
///
/// Whatever already sits at the preview path (a symlink included) is replaced,
/// never written through.
pub fn write_preview_file(dir: &Path, document: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(PREVIEW_FILE_NAME);

    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    file.write_all(document.as_bytes())?;
    debug!(path = %path.display(), bytes = document.len(), "wrote vibe preview");
    Ok(path)
}
