use lobster_core::vibe::document_title;
use lobster_core::{ChatRole, ViewMode};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Screen};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            // Single * stays literal (*clicks claws*)
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Oracle => render_oracle_screen(app, frame, body_area),
        Screen::Vibe => render_vibe_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let tab = |label: &'static str, screen: Screen| {
        if app.screen == screen {
            Span::styled(label, Style::default().fg(Color::Black).bg(Color::Red).bold())
        } else {
            Span::styled(label, Style::default().fg(Color::Gray))
        }
    };

    let title = Line::from(vec![
        Span::styled(" $LLM Large Lobster Model ", Style::default().fg(Color::Red).bold()),
        Span::raw(" "),
        tab(" Oracle ", Screen::Oracle),
        Span::raw(" "),
        tab(" Vibe Coder ", Screen::Vibe),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Oracle => " ORACLE ",
        Screen::Vibe => " VIBE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match (app.screen, app.input_mode) {
        (_, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(
                if app.screen == Screen::Oracle { " send " } else { " generate " },
                label_style,
            ),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" switch ", label_style),
        ],
        (Screen::Oracle, InputMode::Normal) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" vibe coder ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::Vibe, InputMode::Normal) => vec![
            Span::styled(" v ", key_style),
            Span::styled(
                match app.vibe.view_mode {
                    ViewMode::Preview => " source ",
                    ViewMode::Source => " preview ",
                },
                label_style,
            ),
            Span::styled(" c ", key_style),
            Span::styled(" copy ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" open ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" prompt ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" oracle ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    if let Some(status) = &app.status {
        hints.push(Span::styled(format!(" {}", status), Style::default().fg(Color::Yellow)));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn loading_dots(app: &App) -> String {
    // Animated ellipsis: cycles through ".", "..", "..."
    ".".repeat((app.animation_frame as usize) + 1)
}

fn render_oracle_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(chat_area);
    app.document_area = None;

    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    let chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" 🦞 Lobster Oracle: {} ", app.model));

    let mut lines: Vec<Line> = Vec::new();
    for turn in app.oracle.turns() {
        match turn.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(turn.content.as_str()));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Lobster:",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
                for line in turn.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.oracle.is_busy() {
        lines.push(Line::from(Span::styled(
            "Lobster:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("Snapping{}", loading_dots(app)),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

    // Measure the wrapped height before the border is attached
    let wrapped = u16::try_from(chat.line_count(chat_width)).unwrap_or(u16::MAX);
    let max_scroll = wrapped.saturating_sub(app.chat_height);
    app.chat_scroll = if app.chat_follow {
        max_scroll
    } else {
        app.chat_scroll.min(max_scroll)
    };

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing;
    render_input(
        frame,
        input_area,
        " Ask the Oracle (price of bitcoin?) ",
        &app.oracle.input,
        app.oracle_cursor,
        editing,
    );
}

fn render_vibe_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [side_area, document_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(area);

    let [input_area, info_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(side_area);

    app.chat_area = None;
    app.document_area = Some(document_area);

    let editing = app.input_mode == InputMode::Editing;
    render_input(
        frame,
        input_area,
        " Describe your app ",
        &app.vibe.prompt,
        app.vibe_cursor,
        editing,
    );

    // Info panel: model and generation state
    let mut info = vec![
        Line::from(vec![
            Span::styled("Model: ", Style::default().fg(Color::DarkGray)),
            Span::raw(app.coder_model.clone()),
        ]),
        Line::default(),
    ];
    if app.vibe.is_busy() {
        info.push(Line::from(Span::styled(
            format!("Vibe coding{}", loading_dots(app)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    } else if app.vibe.document().is_some() {
        info.push(Line::from(Span::styled(
            "Ready. Press o to open it in your browser.",
            Style::default().fg(Color::Green),
        )));
    } else {
        info.push(Line::from(Span::styled(
            "Describe a single-page app, then press Enter.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let info_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Vibe Coder ");
    frame.render_widget(
        Paragraph::new(info).block(info_block).wrap(Wrap { trim: true }),
        info_area,
    );

    render_document(app, frame, document_area);
}

fn render_document(app: &mut App, frame: &mut Frame, area: Rect) {
    let view_label = match app.vibe.view_mode {
        ViewMode::Preview => " Preview ",
        ViewMode::Source => " Source ",
    };
    let mut title = vec![Span::raw(view_label)];
    if app.vibe.copied.is_copied() {
        title.push(Span::styled(" Copied! ", Style::default().fg(Color::Green).bold()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Line::from(title));

    app.document_height = area.height.saturating_sub(2);

    let Some(document) = app.vibe.document() else {
        app.document_lines = 0;
        let placeholder = if app.vibe.is_busy() {
            format!("Generating{}", loading_dots(app))
        } else {
            "Your creation will appear here".to_string()
        };
        let empty = Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let text = match app.vibe.view_mode {
        ViewMode::Source => Text::from(
            document
                .lines()
                .map(|line| {
                    Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Green),
                    ))
                })
                .collect::<Vec<_>>(),
        ),
        ViewMode::Preview => {
            let title = document_title(document).unwrap_or_else(|| "Untitled app".to_string());
            Text::from(vec![
                Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
                Line::default(),
                Line::from(format!(
                    "{} lines, {} bytes of self-contained HTML",
                    document.lines().count(),
                    document.len()
                )),
                Line::default(),
                Line::from(Span::styled(
                    "o: open in browser   v: view source   c: copy",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        }
    };

    app.document_lines = text.lines.len() as u16;

    let widget = Paragraph::new(text)
        .block(block)
        .scroll((app.document_scroll, 0));
    frame.render_widget(widget, area);
}

/// Single-line input box with horizontal scrolling that keeps the cursor visible.
fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: &str,
    cursor: usize,
    editing: bool,
) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor = cursor.min(text.chars().count());
    let scroll_offset = if inner_width > 0 && cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
