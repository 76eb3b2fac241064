//! Layout and drawing: title screen, field, sidebar, end screens.

use crate::game::{EndReason, Session, SessionState};
use crate::stack::Segment;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;
/// Widest board in columns; the field is scaled to fit.
const MAX_BOARD_COLS: u16 = 50;
/// Rows above the stack: spacer + oscillation lane.
const LANE_ROW: i32 = 1;
/// Duration of the perfect-landing flash (TachyonFX).
const PERFECT_FLASH_MS: u32 = 450;

/// Per-frame inputs the app hands to [`draw`].
pub struct DrawContext<'a> {
    pub session: &'a Session,
    pub theme: &'a Theme,
    pub now: Instant,
    pub show_outline: bool,
    /// Stack level of a perfect landing still flashing.
    pub flash_level: Option<usize>,
}

/// Board size (inner columns, inner rows) for a terminal area.
fn board_size(area: Rect, session: &Session) -> (u16, u16) {
    let config = session.config();
    let cols = area
        .width
        .saturating_sub(2 + SIDEBAR_WIDTH)
        .min(MAX_BOARD_COLS);
    let natural_rows = (config.field_height / config.segment_height).round() as u16;
    let min_rows = u16::try_from(config.win_threshold)
        .unwrap_or(u16::MAX)
        .saturating_add(LANE_ROW as u16 + 3);
    let rows = area
        .height
        .saturating_sub(2)
        .min(natural_rows.max(min_rows));
    (cols, rows)
}

/// Inner board rect (no border), laid out the same way as [`draw_game`].
fn board_rect(area: Rect, session: &Session) -> Rect {
    let (cols, rows) = board_size(area, session);
    let total_w = cols + 2 + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(rows + 2) / 2;
    Rect {
        x: x + 1,
        y: y + 1,
        width: cols.min(area.width.saturating_sub(2)),
        height: rows.min(area.height.saturating_sub(2)),
    }
}

/// Glyph for terminal column `col` covering `[left, right)` in field units.
/// Half blocks keep edges within half a column of the true position.
fn span_glyph(left: f64, right: f64, col: u16, units_per_col: f64) -> Option<&'static str> {
    let col_left = f64::from(col) * units_per_col;
    let col_right = col_left + units_per_col;
    let cov_left = left.max(col_left);
    let cov_right = right.min(col_right);
    if cov_right <= cov_left {
        return None;
    }
    let fraction = (cov_right - cov_left) / units_per_col;
    if fraction >= 0.75 {
        Some("█")
    } else if fraction >= 0.25 {
        let mid = (cov_left + cov_right) / 2.0;
        Some(if mid < col_left + units_per_col / 2.0 {
            "▌"
        } else {
            "▐"
        })
    } else {
        None
    }
}

/// Buffer row of stack level `level` (0 = plate) on a board.
fn level_row(board: Rect, level: usize) -> i32 {
    i32::from(board.y) + i32::from(board.height) - 1 - level as i32
}

fn paint_span(
    buf: &mut Buffer,
    board: Rect,
    row: i32,
    left: f64,
    right: f64,
    units_per_col: f64,
    glyph_override: Option<&'static str>,
    style: Style,
) {
    if row < i32::from(board.y) || row >= i32::from(board.y + board.height) {
        return;
    }
    let y = row as u16;
    for col in 0..board.width {
        if let Some(glyph) = span_glyph(left, right, col, units_per_col) {
            buf[(board.x + col, y)]
                .set_symbol(glyph_override.unwrap_or(glyph))
                .set_style(style);
        }
    }
}

/// Main draw entry. `flash` holds the perfect-landing effect across frames.
pub fn draw(
    frame: &mut Frame,
    ctx: &DrawContext,
    area: Rect,
    flash: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
) {
    let bg = Block::default().style(Style::default().bg(ctx.theme.bg));
    bg.render(area, frame.buffer_mut());
    match ctx.session.state() {
        SessionState::Idle => draw_menu(frame, ctx.theme, area),
        SessionState::Running => {
            draw_game(frame, ctx, area);
            if let Some(level) = ctx.flash_level {
                apply_perfect_flash(frame, ctx, area, level, flash, flash_process_time);
            }
        }
        SessionState::Ended(_) | SessionState::Won => {
            draw_game(frame, ctx, area);
            draw_end(frame, ctx, area);
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 44u16;
    let popup_h = 13u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let fg = Style::default().fg(theme.main_fg);
    let hint = Style::default().fg(theme.inactive_fg);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                " Pancake ",
                Style::default()
                    .fg(theme.pancake[0])
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Stack ", fg.add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Drop each pancake onto the stack.", fg)),
        Line::from(Span::styled("Overhangs are cut off; miss and it's over.", fg)),
        Line::from(Span::styled("Stack ten before the clock runs out!", fg)),
        Line::from(""),
        Line::from(Span::styled("Space  Drop      B  Hit-box outline", hint)),
        Line::from(Span::styled("Enter  Start     Q  Quit", hint)),
        Line::from(""),
        Line::from(Span::styled(
            " Press Enter ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Field + sidebar, centered in the full area.
fn draw_game(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let board = board_rect(area, ctx.session);
    let field = Rect {
        x: board.x - 1,
        y: board.y - 1,
        width: board.width + 2,
        height: board.height + 2,
    };
    let sidebar_x = field.x + field.width;
    let sidebar = Rect {
        x: sidebar_x,
        y: field.y,
        width: SIDEBAR_WIDTH.min((area.x + area.width).saturating_sub(sidebar_x)),
        height: field.height,
    };
    draw_field(frame, ctx, field);
    draw_sidebar(frame, ctx, sidebar);
}

fn draw_field(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let session = ctx.session;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Pancake Stack ", theme.title));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());
    if board.width == 0 || board.height == 0 {
        return;
    }

    let units_per_col = session.config().field_width / f64::from(board.width);
    let buf = frame.buffer_mut();
    let segments = session.stack().segments();

    for (level, segment) in segments.iter().enumerate() {
        let style = Style::default().bg(theme.bg).fg(segment_color(theme, segment, level));
        paint_span(
            buf,
            board,
            level_row(board, level),
            segment.left(),
            segment.right(),
            units_per_col,
            segment.is_base.then_some("▀"),
            style,
        );
    }

    // Crumbs: the overhang cut off the most recent landing.
    if let Some(landing) = session.last_landing() {
        let row = level_row(board, segments.len() - 1);
        let crumb = Style::default().fg(theme.inactive_fg).bg(theme.bg);
        let left = landing.falling_left;
        let right = left + landing.falling_width;
        if landing.left_inset > 0.0 {
            paint_span(buf, board, row, left, left + landing.left_inset, units_per_col, Some("░"), crumb);
        }
        if landing.right_inset > 0.0 {
            paint_span(buf, board, row, right - landing.right_inset, right, units_per_col, Some("░"), crumb);
        }
    }

    let mut falling_style = Style::default().fg(theme.falling).bg(theme.bg);
    if session.is_oscillating() {
        falling_style = falling_style.add_modifier(Modifier::BOLD);
    }
    let lane = i32::from(board.y) + LANE_ROW;
    if let Some(block) = session.falling() {
        if ctx.show_outline {
            let margin = session.config().margin_for(session.stack().top().width);
            let outline = Style::default().fg(theme.outline).bg(theme.bg);
            paint_span(
                buf,
                board,
                lane,
                block.x - margin,
                block.right() + margin,
                units_per_col,
                Some("─"),
                outline,
            );
        }
        paint_span(buf, board, lane, block.x, block.right(), units_per_col, None, falling_style);
    } else if let Some((ticket, progress)) = session.drop_in_flight(ctx.now) {
        let target = level_row(board, segments.len());
        let row = lane + (f64::from(target - lane) * progress).round() as i32;
        paint_span(
            buf,
            board,
            row,
            ticket.left,
            ticket.left + ticket.width,
            units_per_col,
            None,
            falling_style,
        );
    }
}

fn segment_color(theme: &Theme, segment: &Segment, level: usize) -> Color {
    if segment.is_base {
        theme.plate
    } else if segment.perfect {
        theme.perfect
    } else {
        theme.pancake_color(level)
    }
}

fn draw_sidebar(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let session = ctx.session;
    let config = session.config();
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Time (label + gauge)
            Constraint::Length(1),
            Constraint::Length(6), // Stats
            Constraint::Length(1),
            Constraint::Length(5), // Keys
        ])
        .split(area);

    let time_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let time_inner = time_block.inner(chunks[0]);
    time_block.render(chunks[0], frame.buffer_mut());
    let time_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(time_inner);
    let remaining = session.remaining_secs();
    let clock_note = if session.is_clock_running() { "" } else { " (stopped)" };
    Paragraph::new(Line::from(vec![
        Span::styled("Time: ", title_style),
        Span::styled(format!("{remaining}s{clock_note}"), fg_style),
    ]))
    .render(time_layout[0], frame.buffer_mut());
    let ratio = (f64::from(remaining) / f64::from(config.round_secs)).clamp(0.0, 1.0);
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(time_layout[1], frame.buffer_mut());

    let perfect = session
        .stack()
        .segments()
        .iter()
        .filter(|s| s.perfect)
        .count();
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    Paragraph::new(vec![
        stat("Stacked: ", format!("{} / {}", session.score(), config.win_threshold)),
        stat("Perfect: ", perfect.to_string()),
        stat("Speed:   ", format!("{:.1}", session.speed())),
        stat("Width:   ", format!("{:.0}", session.next_width())),
    ])
    .render(stats_inner, frame.buffer_mut());

    let keys_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let hint = Style::default().fg(theme.inactive_fg);
    let outline_state = if ctx.show_outline { "on" } else { "off" };
    Paragraph::new(vec![
        Line::from(Span::styled("Space  drop", hint)),
        Line::from(Span::styled(format!("B      outline ({outline_state})"), hint)),
        Line::from(Span::styled("Q      quit", hint)),
    ])
    .render(keys_inner, frame.buffer_mut());
}

fn draw_end(frame: &mut Frame, ctx: &DrawContext, area: Rect) {
    let theme = ctx.theme;
    let session = ctx.session;
    let popup_w = 36u16;
    let popup_h = 9u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let (title, title_style, reason) = match session.state() {
        SessionState::Won => (
            " You win! ",
            Style::default().fg(Color::Black).bg(theme.perfect),
            "The stack is complete.",
        ),
        SessionState::Ended(EndReason::TimeUp) => (
            " Game over ",
            Style::default().fg(Color::White).bg(Color::Red),
            "Time's up.",
        ),
        _ => (
            " Game over ",
            Style::default().fg(Color::White).bg(Color::Red),
            "Missed the stack.",
        ),
    };
    let fg = Style::default().fg(theme.main_fg);
    let count = session.score();
    let noun = if count == 1 { "pancake" } else { "pancakes" };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, title_style)),
        Line::from(""),
        Line::from(Span::styled(reason, fg)),
        Line::from(Span::styled(format!("You stacked {count} {noun}."), fg)),
        Line::from(""),
        Line::from(Span::styled(
            " R: Restart    Q: Quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Widget::render(ratatui::widgets::Clear, popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Create or update the flash over a perfect landing and process it.
fn apply_perfect_flash(
    frame: &mut Frame,
    ctx: &DrawContext,
    area: Rect,
    level: usize,
    flash: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
) {
    let board = board_rect(area, ctx.session);
    let row = level_row(board, level);
    if row < i32::from(board.y) || board.width == 0 {
        return;
    }
    let row_rect = Rect {
        x: board.x,
        y: row as u16,
        width: board.width,
        height: 1,
    };
    let delta = flash_process_time
        .map(|t| ctx.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *flash_process_time = Some(ctx.now);

    if flash.is_none() {
        let effect = fx::fade_from(Color::White, ctx.theme.bg, (PERFECT_FLASH_MS, Interpolation::Linear))
            .with_area(row_rect);
        *flash = Some(effect);
    }
    if let Some(effect) = flash {
        frame.render_effect(effect, row_rect, TfxDuration::from_millis(delta_ms));
    }
}
