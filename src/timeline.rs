//! Fixed-window Gantt timeline.
//!
//! The coordinate mapper converts a record's date span into normalized
//! positions within the fixed 2020-01-01..2032-12-31 calendar window; the
//! widget renders one row per filtered record with a positioned bar and an
//! optional primary-readout marker. The window is a constant, not derived
//! from the data: records entirely outside it simply draw no bar.

use chrono::{Datelike, NaiveDate};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::models::{DatasetMeta, TrialRecord};
use crate::theme::{colors, styles, CompanyPalette};

/// Block characters for bar rendering. Clipped edges draw squared (full
/// block, the span continues beyond the window); true boundaries draw with a
/// half block so the bar end reads as tapered.
const BLOCK_FULL: char = '█';
const BLOCK_END_LEFT: char = '▐';
const BLOCK_END_RIGHT: char = '▌';

/// Primary-readout marker glyph.
const MARKER: char = '◆';

/// First day of the display window.
pub fn window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid window start")
}

/// Last day of the display window.
pub fn window_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2032, 12, 31).expect("valid window end")
}

/// Window span in days, the denominator for every percentage.
fn window_days() -> f64 {
    (window_end() - window_start()).num_days() as f64
}

fn percent_of_window(date: NaiveDate) -> f64 {
    (date - window_start()).num_days() as f64 / window_days() * 100.0
}

/// Horizontal placement of one record's bar within the window, scaled 0-100.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub left_pct: f64,
    pub width_pct: f64,
    /// The raw start precedes the window: draw the left edge squared off.
    pub clip_left: bool,
    /// The raw completion exceeds the window: draw the right edge squared off.
    pub clip_right: bool,
    /// Primary-completion position, present only when the date parses and
    /// falls inside the clipped span.
    pub marker_pct: Option<f64>,
}

/// Map a record onto the window. None when either boundary date is missing
/// or unparseable, or the span misses the window entirely — no partial bars.
pub fn layout_bar(record: &TrialRecord) -> Option<BarLayout> {
    let start = record.start_date()?;
    let completion = record.completion_date()?;

    if !(completion > window_start() && start < window_end()) {
        return None;
    }

    let clipped_start = start.max(window_start());
    let clipped_end = completion.min(window_end());

    let left_pct = percent_of_window(clipped_start);
    // An inverted span (start after completion) collapses to a zero-width
    // bar rather than being rejected.
    let width_pct = (percent_of_window(clipped_end) - left_pct).max(0.0);

    let marker_pct = record
        .primary_completion_date()
        .filter(|p| *p >= clipped_start && *p <= clipped_end)
        .map(percent_of_window);

    Some(BarLayout {
        left_pct,
        width_pct,
        clip_left: start < window_start(),
        clip_right: completion > window_end(),
        marker_pct,
    })
}

/// Width of the frozen info column (ticker, registry id, indication).
const INFO_COL: u16 = 30;

/// Gantt widget: year axis on top, one row per record below.
pub struct TimelineWidget<'a> {
    trials: &'a [&'a TrialRecord],
    meta: &'a DatasetMeta,
    palette: &'a CompanyPalette,
    selected: Option<usize>,
    offset: usize,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(
        trials: &'a [&'a TrialRecord],
        meta: &'a DatasetMeta,
        palette: &'a CompanyPalette,
        selected: Option<usize>,
        offset: usize,
    ) -> Self {
        Self {
            trials,
            meta,
            palette,
            selected,
            offset,
        }
    }

    /// Column for a window percentage within a bar area of `width` cells.
    fn pct_to_col(pct: f64, width: u16) -> u16 {
        let col = (pct / 100.0 * f64::from(width)).floor() as i64;
        col.clamp(0, i64::from(width.saturating_sub(1)).max(0)) as u16
    }

    /// Render the year labels and the rule beneath them.
    fn render_year_axis(&self, area: Rect, buf: &mut Buffer) {
        let mut last_end: i64 = -1;
        for year in window_start().year()..=window_end().year() {
            let first = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
            let col = i64::from(Self::pct_to_col(percent_of_window(first), area.width));
            let label = year.to_string();

            // Skip labels that would collide with the previous one.
            if col <= last_end || col + label.len() as i64 > i64::from(area.width) {
                continue;
            }
            buf.set_string(
                area.x + col as u16,
                area.y,
                &label,
                Style::default()
                    .fg(colors::PURPLE)
                    .add_modifier(Modifier::BOLD),
            );
            last_end = col + label.len() as i64;
        }

        let today = chrono::Local::now().date_naive();
        for col in 0..area.width {
            buf.set_string(area.x + col, area.y + 1, "─", styles::border_dim());
        }
        if (window_start()..=window_end()).contains(&today) {
            let col = Self::pct_to_col(percent_of_window(today), area.width);
            buf.set_string(
                area.x + col,
                area.y + 1,
                "▼",
                Style::default()
                    .fg(colors::TODAY_MARKER)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }

    /// Vertical "today" line drawn over empty bar-cell space.
    fn render_today_line(&self, area: Rect, buf: &mut Buffer) {
        let today = chrono::Local::now().date_naive();
        if !(window_start()..=window_end()).contains(&today) {
            return;
        }
        let col = Self::pct_to_col(percent_of_window(today), area.width);
        for row in 0..area.height {
            let pos = (area.x + col, area.y + row);
            if buf[pos].symbol() == " " {
                buf[pos].set_char('│');
                buf[pos].set_style(
                    Style::default()
                        .fg(colors::TODAY_MARKER)
                        .add_modifier(Modifier::DIM),
                );
            }
        }
    }

    fn render_row(
        &self,
        info_area: Rect,
        bar_area: Rect,
        buf: &mut Buffer,
        trial: &TrialRecord,
        row: u16,
        is_selected: bool,
    ) {
        let color = self.palette.terminal_color(&trial.actual_company);
        let y = info_area.y + row;

        // Frozen info column: selection marker, ticker + role, registry id,
        // first indication.
        let prefix = if is_selected { '▸' } else { ' ' };
        let ticker = self.meta.ticker(&trial.actual_company);
        let info = format!(
            "{}{:<7.7}{:<12.12}{:<10.10}",
            prefix,
            ticker,
            trial.nct_id,
            trial.first_indication(),
        );
        let info_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::FG_PRIMARY)
        };
        buf.set_string(info_area.x, y, &info, info_style);

        let Some(layout) = layout_bar(trial) else {
            // Record passed the filters but has no drawable span.
            return;
        };

        let x0 = Self::pct_to_col(layout.left_pct, bar_area.width);
        let x1 = Self::pct_to_col(layout.left_pct + layout.width_pct, bar_area.width).max(x0);

        let bar_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };

        for col in x0..=x1 {
            let glyph = if col == x0 && col == x1 {
                BLOCK_FULL
            } else if col == x0 {
                if layout.clip_left { BLOCK_FULL } else { BLOCK_END_LEFT }
            } else if col == x1 {
                if layout.clip_right { BLOCK_FULL } else { BLOCK_END_RIGHT }
            } else {
                BLOCK_FULL
            };
            let pos = (bar_area.x + col, y);
            buf[pos].set_char(glyph);
            buf[pos].set_style(bar_style);
        }

        // Enrollment label inside the bar when it fits.
        let label = format!("N:{}", trial.sample_size);
        if usize::from(x1 - x0) >= label.len() + 2 {
            buf.set_string(
                bar_area.x + x0 + 1,
                y,
                &label,
                Style::default().fg(colors::BG_DARK).bg(color),
            );
        }

        if let Some(marker_pct) = layout.marker_pct {
            let col = Self::pct_to_col(marker_pct, bar_area.width);
            let marker_color = if trial.primary_completion_date_type.is_actual() {
                colors::MARKER_ACTUAL
            } else {
                colors::MARKER_ESTIMATED
            };
            let pos = (bar_area.x + col, y);
            buf[pos].set_char(MARKER);
            buf[pos].set_style(
                Style::default()
                    .fg(marker_color)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Pipeline Timeline 2020–2032 ")
            .title_style(styles::title_accent())
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_DARK));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < INFO_COL + 20 || inner.height < 4 {
            return; // Too small to render
        }

        let bar_x = inner.x + INFO_COL;
        let bar_width = inner.width - INFO_COL;

        self.render_year_axis(Rect::new(bar_x, inner.y, bar_width, 2), buf);

        let rows_height = inner.height - 2;
        let info_area = Rect::new(inner.x, inner.y + 2, INFO_COL, rows_height);
        let bar_area = Rect::new(bar_x, inner.y + 2, bar_width, rows_height);

        for (row, (index, trial)) in self
            .trials
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(rows_height as usize)
            .enumerate()
        {
            self.render_row(
                info_area,
                bar_area,
                buf,
                trial,
                row as u16,
                self.selected == Some(index),
            );
        }

        self.render_today_line(bar_area, buf);

        // Legend in the bottom border.
        let legend = " ◆ Readout (green = actual)  │ Today  █ edge = clipped ";
        if area.width > legend.len() as u16 + 2 {
            buf.set_string(
                area.x + 2,
                area.y + area.height - 1,
                legend,
                styles::text_hint(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated_record(start: &str, completion: &str, primary: Option<&str>) -> TrialRecord {
        TrialRecord {
            nct_id: "NCT900".to_string(),
            start_date_iso: Some(start.to_string()),
            completion_date_iso: Some(completion.to_string()),
            primary_completion_date_iso: primary.map(|p| p.to_string()),
            ..TrialRecord::default()
        }
    }

    #[test]
    fn test_clip_left_starts_at_zero() {
        let record = dated_record("2019-06-01", "2021-01-01", None);
        let layout = layout_bar(&record).unwrap();
        assert!(layout.clip_left);
        assert!(!layout.clip_right);
        assert_eq!(layout.left_pct, 0.0);

        let expected_width = (NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
            - window_start())
        .num_days() as f64
            / (window_end() - window_start()).num_days() as f64
            * 100.0;
        assert!((layout.width_pct - expected_width).abs() < 1e-9);
    }

    #[test]
    fn test_fully_after_window_invisible() {
        // Inverted dates on top of being out of range: the window test alone
        // rejects it.
        let record = dated_record("2033-06-01", "2033-01-01", None);
        assert!(layout_bar(&record).is_none());
    }

    #[test]
    fn test_fully_before_window_invisible() {
        let record = dated_record("2012-01-01", "2015-01-01", None);
        assert!(layout_bar(&record).is_none());
    }

    #[test]
    fn test_missing_date_means_no_bar() {
        let mut record = dated_record("2021-01-01", "2024-06-01", None);
        record.completion_date_iso = None;
        assert!(layout_bar(&record).is_none());

        let mut record = dated_record("2021-01-01", "2024-06-01", None);
        record.start_date_iso = Some("not a date".to_string());
        assert!(layout_bar(&record).is_none());
    }

    #[test]
    fn test_exact_window_span() {
        let record = dated_record("2020-01-01", "2032-12-31", None);
        let layout = layout_bar(&record).unwrap();
        assert_eq!(layout.left_pct, 0.0);
        assert_eq!(layout.width_pct, 100.0);
        assert!(!layout.clip_left);
        assert!(!layout.clip_right);
    }

    #[test]
    fn test_clip_right_flag() {
        let record = dated_record("2030-01-01", "2035-01-01", None);
        let layout = layout_bar(&record).unwrap();
        assert!(!layout.clip_left);
        assert!(layout.clip_right);
        assert!((layout.left_pct + layout.width_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_inside_span() {
        let record = dated_record("2021-01-01", "2024-06-01", Some("2023-01-01"));
        let layout = layout_bar(&record).unwrap();
        let marker = layout.marker_pct.unwrap();
        assert!(marker > layout.left_pct);
        assert!(marker < layout.left_pct + layout.width_pct);
    }

    #[test]
    fn test_marker_outside_clipped_span_absent() {
        // Primary completion before the window start is outside the clipped
        // bar even though the bar itself is visible.
        let record = dated_record("2019-01-01", "2021-01-01", Some("2019-06-01"));
        let layout = layout_bar(&record).unwrap();
        assert!(layout.marker_pct.is_none());
    }

    #[test]
    fn test_inverted_span_collapses_to_zero_width() {
        let record = dated_record("2024-01-01", "2021-01-01", None);
        let layout = layout_bar(&record).unwrap();
        assert_eq!(layout.width_pct, 0.0);
        assert!(layout.marker_pct.is_none());
    }
}
