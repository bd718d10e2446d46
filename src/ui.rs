//! UI rendering module.
//!
//! All rendering flows one direction: the filtered set is computed once per
//! frame from (records, filter state) and handed to whichever view is
//! active. Nothing here mutates application state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputMode, LogLevel};
use crate::filter::{compute_stats, PipelineStats, View};
use crate::models::{display_date, TrialRecord};
use crate::theme::{colors, styles};
use crate::timeline::TimelineWidget;

/// Height of one asset card in the grid view, borders included.
const CARD_HEIGHT: u16 = 12;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Fill background with theme color
    let bg_block = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Title bar / view tabs
            Constraint::Length(3),  // Filter bar
            Constraint::Length(1),  // Stat tiles
            Constraint::Min(10),    // Main content
            Constraint::Length(5),  // System log
        ])
        .split(area);

    // One filter pass per frame feeds both the stats and the active view.
    let filtered = app.visible_trials();
    let stats = filtered.as_deref().map(compute_stats).unwrap_or_default();

    render_tabs(frame, app, chunks[0]);
    render_filter_bar(frame, app, chunks[1]);
    render_stats(frame, stats, chunks[2]);
    render_main_content(frame, app, filtered.as_deref(), chunks[3]);
    render_logs(frame, app, chunks[4]);

    if app.input_mode == InputMode::Indication {
        render_suggestions(frame, app, chunks[1]);
    }

    if app.error_popup.is_some() {
        render_error_popup(frame, app, area);
    }

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

/// Render the title bar with the view tabs
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = [View::Grid, View::Timeline]
        .iter()
        .map(|view| {
            let style = if *view == app.filters.view {
                styles::tab_active()
            } else {
                styles::tab_inactive()
            };
            Line::from(Span::styled(format!(" {} ", view.name()), style))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" trialscope — Clinical Pipeline Intelligence ")
                .title_style(styles::title())
                .title_bottom(Line::from(app.status_text()).right_aligned())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .select(match app.filters.view {
            View::Grid => 0,
            View::Timeline => 1,
        })
        .style(styles::text())
        .highlight_style(styles::tab_active())
        .divider(Span::styled(" | ", styles::border_dim()));

    frame.render_widget(tabs, area);
}

/// Render the filter bar: two text inputs and three selectors on one line
fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Filters ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(if app.input_mode == InputMode::Normal {
            styles::border()
        } else {
            styles::border_focused()
        })
        .style(Style::default().bg(colors::BG_DARK));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text_field = |value: &str, focused: bool| {
        let cursor = if focused { "█" } else { "" };
        let body = if value.is_empty() && !focused {
            "…".to_string()
        } else {
            format!("{}{}", value, cursor)
        };
        Span::styled(
            format!(" {:<16.16} ", body),
            if focused {
                styles::form_input_focused()
            } else {
                styles::form_input()
            },
        )
    };

    let line = Line::from(vec![
        Span::styled("/", styles::text_hint()),
        Span::styled(" Search", styles::form_label()),
        text_field(&app.filters.search_text, app.input_mode == InputMode::Search),
        Span::styled(" i", styles::text_hint()),
        Span::styled(" Indication", styles::form_label()),
        text_field(
            &app.filters.indication_text,
            app.input_mode == InputMode::Indication,
        ),
        Span::styled(" c", styles::text_hint()),
        Span::styled(" Sponsor ", styles::form_label()),
        Span::styled(app.company_label(), styles::text()),
        Span::styled("  a", styles::text_hint()),
        Span::styled(" Area ", styles::form_label()),
        Span::styled(app.filters.domain_area.label(), styles::text()),
        Span::styled("  o", styles::text_hint()),
        Span::styled(" Role ", styles::form_label()),
        Span::styled(app.filters.role.label(), styles::text()),
    ]);

    frame.render_widget(Paragraph::new(line), inner);
}

/// Render the stat tiles line
fn render_stats(frame: &mut Frame, stats: PipelineStats, area: Rect) {
    let line = Line::from(vec![
        Span::styled("  Assets: ", styles::form_label()),
        Span::styled(
            stats.asset_count.to_string(),
            Style::default()
                .fg(colors::BLUE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("    Phase 3: ", styles::form_label()),
        Span::styled(
            stats.phase3_count.to_string(),
            Style::default()
                .fg(colors::GREEN)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the main content area based on load state, query state, and view
fn render_main_content(
    frame: &mut Frame,
    app: &App,
    filtered: Option<&[&TrialRecord]>,
    area: Rect,
) {
    if app.is_loading && !app.loaded {
        render_empty_state(frame, area, "Loading pipeline dataset...", styles::text_dim());
        return;
    }

    if app.load_failed {
        render_empty_state(
            frame,
            area,
            "Dataset unavailable — press r to retry.",
            styles::error(),
        );
        return;
    }

    let Some(filtered) = filtered else {
        // The deliberate zero-query prompt, never the full dataset.
        render_empty_state(
            frame,
            area,
            "Please initiate a search or select a filter to view the pipeline.",
            styles::text_dim(),
        );
        return;
    };

    if filtered.is_empty() {
        render_empty_state(
            frame,
            area,
            "No Assets Found.",
            Style::default()
                .fg(colors::FG_DIM)
                .add_modifier(Modifier::BOLD),
        );
        return;
    }

    match app.filters.view {
        View::Grid => render_grid(frame, app, filtered, area),
        View::Timeline => render_timeline_view(frame, app, filtered, area),
    }
}

/// Render the card grid view
fn render_grid(frame: &mut Frame, app: &App, filtered: &[&TrialRecord], area: Rect) {
    let block = Block::default()
        .title(" Asset Grid ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = usize::from((inner.height / CARD_HEIGHT).max(1));
    let selected = app.selected.min(filtered.len() - 1);
    let offset = if selected < visible {
        0
    } else {
        selected + 1 - visible
    };

    for (slot, (index, trial)) in filtered
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .enumerate()
    {
        let card_area = Rect::new(
            inner.x,
            inner.y + slot as u16 * CARD_HEIGHT,
            inner.width,
            CARD_HEIGHT.min(inner.height.saturating_sub(slot as u16 * CARD_HEIGHT)),
        );
        if card_area.height < 3 {
            break;
        }
        render_card(frame, app, trial, index == selected, card_area);
    }
}

/// Render one asset card
fn render_card(frame: &mut Frame, app: &App, trial: &TrialRecord, is_selected: bool, area: Rect) {
    let color = app.palette.terminal_color(&trial.actual_company);
    let details = app.meta.company_details(&trial.actual_company);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_selected {
            Style::default().fg(color)
        } else {
            styles::border_dim()
        })
        .style(Style::default().bg(colors::BG_MEDIUM));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = usize::from(inner.width);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                details.name.to_uppercase(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({})", details.ticker), styles::text_dim()),
            Span::styled(format!("  {}", trial.role_label()), styles::text_hint()),
        ]),
        Line::from(Span::styled(
            truncate(&trial.title, width),
            Style::default()
                .fg(colors::FG_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                format!(" {} ", trial.phase),
                Style::default()
                    .fg(colors::YELLOW)
                    .bg(colors::BG_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                trial.nct_id.clone(),
                Style::default()
                    .fg(colors::BLUE)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        Line::from(Span::styled(trial.registry_url(), styles::text_hint())),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Pipeline IMP:"), styles::form_label()),
            Span::styled(
                trial.imp_label().to_string(),
                Style::default()
                    .fg(colors::FG_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Enrollment:"), styles::form_label()),
            Span::styled(
                format!("N: {}", trial.sample_size),
                Style::default()
                    .fg(colors::FG_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(trial.enrollment_type.qualifier(), styles::text_hint()),
        ]),
        date_line(
            "Study Start:",
            &trial.start_date_iso,
            trial.start_date_type.qualifier(),
        ),
        date_line(
            "Primary Readout:",
            &trial.primary_completion_date_iso,
            trial.primary_completion_date_type.qualifier(),
        ),
        date_line(
            "Study End:",
            &trial.completion_date_iso,
            trial.completion_date_type.qualifier(),
        ),
    ];

    if let Some(summary) = trial.readout_summary.as_deref().filter(|s| !s.is_empty()) {
        let source = trial
            .readout_source
            .as_deref()
            .map(|s| format!(" — {}", s))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(
                " Asset Intel ",
                Style::default()
                    .fg(colors::BG_DARK)
                    .bg(colors::PURPLE)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                truncate(&format!("{}{}", summary, source), width.saturating_sub(14)),
                styles::info(),
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the timeline view: Gantt rows plus a detail panel for the selection
fn render_timeline_view(frame: &mut Frame, app: &App, filtered: &[&TrialRecord], area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let selected = app.selected.min(filtered.len() - 1);
    // Rows available inside the widget: borders (2) plus the year axis (2).
    let rows = usize::from(chunks[0].height.saturating_sub(4).max(1));
    let offset = if selected < rows { 0 } else { selected + 1 - rows };

    let widget = TimelineWidget::new(filtered, &app.meta, &app.palette, Some(selected), offset);
    frame.render_widget(widget, chunks[0]);

    render_detail_panel(frame, app, filtered.get(selected).copied(), chunks[1]);
}

/// Render the detail panel (the hover-tooltip analog) for the selected row
fn render_detail_panel(frame: &mut Frame, app: &App, trial: Option<&TrialRecord>, area: Rect) {
    let block = Block::default()
        .title(" Asset Detail ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_MEDIUM));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(trial) = trial else {
        let msg = Paragraph::new("Awaiting selection...")
            .style(styles::text_dim())
            .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    };

    let color = app.palette.terminal_color(&trial.actual_company);
    let details = app.meta.company_details(&trial.actual_company);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                details.name,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" ({})  {}", details.ticker, trial.role_label()),
                styles::text_dim(),
            ),
        ]),
        Line::from(Span::styled(
            trial.title.clone(),
            Style::default()
                .fg(colors::FG_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Phase:      ", styles::form_label()),
            Span::styled(trial.phase.clone(), styles::warning()),
        ]),
        Line::from(vec![
            Span::styled("Registry:   ", styles::form_label()),
            Span::styled(
                trial.nct_id.clone(),
                Style::default()
                    .fg(colors::BLUE)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        Line::from(vec![
            Span::styled("Enrollment: ", styles::form_label()),
            Span::styled(format!("N: {}", trial.sample_size), styles::text()),
            Span::raw(" "),
            Span::styled(trial.enrollment_type.qualifier(), styles::text_hint()),
        ]),
        Line::from(vec![
            Span::styled("Trial Span: ", styles::form_label()),
            Span::styled(display_date(&trial.start_date_iso).to_string(), styles::text()),
            Span::styled(" to ", styles::text_dim()),
            Span::styled(
                display_date(&trial.completion_date_iso).to_string(),
                styles::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Primary:    ", styles::form_label()),
            Span::styled(
                display_date(&trial.primary_completion_date_iso).to_string(),
                if trial.primary_completion_date_type.is_actual() {
                    styles::success()
                } else {
                    styles::text()
                },
            ),
            Span::raw(" "),
            Span::styled(
                trial.primary_completion_date_type.qualifier(),
                styles::text_hint(),
            ),
        ]),
    ];

    if let Some(summary) = trial.readout_summary.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Asset Intel ",
            Style::default()
                .fg(colors::BG_DARK)
                .bg(colors::PURPLE)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(summary.to_string(), styles::info())));
        if let Some(source) = trial.readout_source.as_deref().filter(|s| !s.is_empty()) {
            lines.push(Line::from(Span::styled(
                format!("— {}", source),
                styles::text_hint(),
            )));
        }
        if let Some(url) = trial.source_url.as_deref().filter(|s| !s.is_empty()) {
            lines.push(Line::from(Span::styled(url.to_string(), styles::text_hint())));
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Render the indication autocomplete popup under the filter bar
fn render_suggestions(frame: &mut Frame, app: &App, filter_area: Rect) {
    let matches = app.matching_suggestions();
    if matches.is_empty() {
        return;
    }

    let width = matches
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .max(12) as u16
        + 4;
    let height = matches.len() as u16 + 2;
    let popup_area = Rect::new(
        filter_area.x + 24,
        filter_area.y + filter_area.height,
        width.min(filter_area.width),
        height,
    )
    .intersection(frame.area());
    if popup_area.height < 3 {
        return;
    }

    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = matches
        .iter()
        .map(|s| ListItem::new(Line::from(Span::styled(s.to_string(), styles::text()))))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Suggestions ")
            .title_style(styles::title())
            .borders(Borders::ALL)
            .border_style(styles::border_focused())
            .style(Style::default().bg(colors::BG_MEDIUM)),
    );

    frame.render_widget(list, popup_area);
}

/// Render the system log pane
fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Info => ("i", colors::BLUE),
                LogLevel::Success => ("+", colors::GREEN),
                LogLevel::Warning => ("!", colors::YELLOW),
                LogLevel::Error => ("x", colors::RED),
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", prefix), Style::default().fg(color)),
                Span::styled(&entry.message, styles::text_dim()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" System Log ")
            .title_style(Style::default().fg(colors::FG_DIM))
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(list, area);
}

/// Render a centered state message inside a bordered frame
fn render_empty_state(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_dim())
        .style(Style::default().bg(colors::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(message)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    let y = inner.y + inner.height / 2;
    let centered = Rect::new(inner.x, y, inner.width, 1.min(inner.height));
    frame.render_widget(paragraph, centered);
}

/// Render error popup
fn render_error_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(popup) = app.error_popup.as_ref() else {
        return;
    };

    let popup_width = (area.width * 60 / 100).clamp(30, 60);
    let popup_height = 7;
    let popup_area = centered_rect(popup_width, popup_height, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", popup.title))
        .title_style(
            Style::default()
                .fg(colors::FG_PRIMARY)
                .bg(colors::RED)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::RED))
        .style(Style::default().bg(ratatui::style::Color::Rgb(0x2A, 0x18, 0x18)));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = Paragraph::new(popup.message.as_str())
        .style(styles::text())
        .wrap(Wrap { trim: true });
    frame.render_widget(text, inner);

    let hint = Paragraph::new("Press ESC or ENTER to dismiss")
        .style(styles::text_hint())
        .alignment(Alignment::Center);
    let hint_area = Rect::new(
        popup_area.x,
        popup_area.y + popup_area.height - 1,
        popup_area.width,
        1,
    );
    frame.render_widget(hint, hint_area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(58, 24, area);
    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", k), Style::default().fg(colors::BLUE)),
            Span::raw(desc),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(colors::BLUE)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Filters",
            Style::default()
                .fg(colors::PURPLE)
                .add_modifier(Modifier::BOLD),
        )),
        key("/", "Edit free-text search"),
        key("i", "Edit indication (with suggestions)"),
        key("c / C", "Cycle sponsor forward / back"),
        key("a", "Cycle domain area (all/onco/non-onco)"),
        key("o", "Cycle role (all/lead/collab)"),
        key("x", "Clear all filters"),
        key("Esc / Enter", "Leave a text field"),
        Line::from(""),
        Line::from(Span::styled(
            "Views",
            Style::default()
                .fg(colors::PURPLE)
                .add_modifier(Modifier::BOLD),
        )),
        key("g / t", "Grid / Timeline view"),
        key("Tab", "Toggle view"),
        key("j/k, Up/Down", "Move selection"),
        key("Home / End", "Jump to first / last"),
        Line::from(""),
        Line::from(Span::styled(
            "General",
            Style::default()
                .fg(colors::PURPLE)
                .add_modifier(Modifier::BOLD),
        )),
        key("r", "Reload dataset"),
        key("?", "Toggle this help"),
        key("q / Ctrl+C", "Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .style(styles::text());

    frame.render_widget(paragraph, popup_area);
}

/// One milestone-date line for a card: label, value (or "TBD"), qualifier.
fn date_line(label: &str, iso: &Option<String>, qualifier: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<16}", label), styles::form_label()),
        Span::styled(
            display_date(iso).to_string(),
            Style::default()
                .fg(colors::FG_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(qualifier, styles::text_hint()),
    ])
}

/// Helper to create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Truncate to `max` display characters, ellipsized.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
