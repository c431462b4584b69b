use std::time::Instant;

use anyhow::{Result, anyhow};
use lobster_core::{
    generate_document, get_ai, run_turn, vibe, CoinGeckoClient, Config, Oracle, SystemClipboard,
    VibeCoder,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Oracle,
    Vibe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

type TextTask = JoinHandle<Result<String>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Settings
    pub config: Config,
    pub model: String,
    pub coder_model: String,

    // Lobster Oracle
    pub oracle: Oracle,
    pub oracle_cursor: usize, // cursor position (chars) in oracle.input
    pub oracle_task: Option<TextTask>,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat pane, set during render
    pub chat_follow: bool, // keep the newest turn in view; resolved at render time

    // Vibe Coder
    pub vibe: VibeCoder,
    pub vibe_cursor: usize,
    pub vibe_task: Option<TextTask>,
    pub document_scroll: u16,
    pub document_height: u16,
    pub document_lines: u16,

    /// One-line feedback shown in the footer (preview opened, copy failed, ...)
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub document_area: Option<Rect>,
}

impl App {
    pub fn new(config: Config, model_override: Option<String>) -> Self {
        let model = model_override
            .clone()
            .unwrap_or_else(|| config.model().to_string());
        let coder_model = model_override.unwrap_or_else(|| config.coder_model().to_string());

        Self {
            should_quit: false,
            screen: Screen::Oracle,
            input_mode: InputMode::Editing,

            config,
            model,
            coder_model,

            oracle: Oracle::new(),
            oracle_cursor: 0,
            oracle_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_follow: true,

            vibe: VibeCoder::new(),
            vibe_cursor: 0,
            vibe_task: None,
            document_scroll: 0,
            document_height: 0,
            document_lines: 0,

            status: None,

            animation_frame: 0,

            chat_area: None,
            document_area: None,
        }
    }

    /// Send the Oracle input, if the widget accepts it.
    pub fn send_oracle(&mut self) {
        let Some(message) = self.oracle.submit() else {
            return;
        };
        self.oracle_cursor = 0;

        // A fresh client per send, built from the settings at send time.
        let config = self.config.clone();
        let model = self.model.clone();
        self.oracle_task = Some(tokio::spawn(async move {
            let client = get_ai(&config);
            let prices = CoinGeckoClient::new(config.price_base_url());
            run_turn(&client, &prices, &model, &message).await
        }));

        self.scroll_chat_to_bottom();
    }

    /// Start a Vibe Coder generation, if the widget accepts it.
    pub fn send_vibe(&mut self) {
        let Some(prompt) = self.vibe.submit() else {
            return;
        };
        self.document_scroll = 0;
        self.status = None;

        let config = self.config.clone();
        let model = self.coder_model.clone();
        self.vibe_task = Some(tokio::spawn(async move {
            let client = get_ai(&config);
            generate_document(&client, &model, &prompt).await
        }));
    }

    /// Settle widgets whose background work has finished.
    pub async fn poll_tasks(&mut self) {
        if let Some(outcome) = take_finished(&mut self.oracle_task).await {
            self.oracle.settle(outcome);
            self.scroll_chat_to_bottom();
        }
        if let Some(outcome) = take_finished(&mut self.vibe_task).await {
            self.vibe.settle(outcome);
            self.document_scroll = 0;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.oracle.is_busy() || self.vibe.is_busy()
    }

    /// Tick animation frame and timers (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.vibe.tick(now);
    }

    pub fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Oracle => Screen::Vibe,
            Screen::Vibe => Screen::Oracle,
        };
        self.status = None;
    }

    /// The input line and cursor of the current screen.
    pub fn active_input(&mut self) -> (&mut String, &mut usize) {
        match self.screen {
            Screen::Oracle => (&mut self.oracle.input, &mut self.oracle_cursor),
            Screen::Vibe => (&mut self.vibe.prompt, &mut self.vibe_cursor),
        }
    }

    pub fn copy_document(&mut self) {
        match self.vibe.copy(&mut SystemClipboard, Instant::now()) {
            Ok(true) => self.status = None,
            Ok(false) => self.status = Some("Nothing to copy yet".to_string()),
            Err(err) => {
                warn!(error = %err, "copy failed");
                self.status = Some(format!("Copy failed: {}", err));
            }
        }
    }

    /// Write the document to a standalone file and hand it to the browser.
    pub fn open_preview(&mut self) {
        let Some(document) = self.vibe.document() else {
            self.status = Some("Nothing to preview yet".to_string());
            return;
        };

        let opened = vibe::preview_dir()
            .and_then(|dir| vibe::write_preview_file(&dir, document))
            .and_then(|path| {
                webbrowser::open(&path.to_string_lossy())
                    .map_err(|e| anyhow!("could not open browser: {}", e))?;
                Ok(path)
            });

        self.status = Some(match opened {
            Ok(path) => {
                info!(path = %path.display(), "opened vibe preview");
                format!("Preview opened: {}", path.display())
            }
            Err(err) => {
                warn!(error = %err, "preview failed");
                format!("Preview failed: {}", err)
            }
        });
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_follow = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_document_down(&mut self, lines: u16) {
        let max_scroll = self.document_lines.saturating_sub(self.document_height);
        self.document_scroll = (self.document_scroll.saturating_add(lines)).min(max_scroll);
    }

    pub fn scroll_document_up(&mut self, lines: u16) {
        self.document_scroll = self.document_scroll.saturating_sub(lines);
    }

    /// Keep the newest turn (or "Snapping...") in view.
    ///
    /// The wrapped height is only known once the pane is laid out, so the
    /// renderer resolves the actual offset.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_follow = true;
    }
}

async fn take_finished(slot: &mut Option<TextTask>) -> Option<Result<String>> {
    if !slot.as_ref().is_some_and(|task| task.is_finished()) {
        return None;
    }
    let task = slot.take()?;
    Some(
        task.await
            .unwrap_or_else(|e| Err(anyhow!("background task failed: {}", e))),
    )
}
