//! App: terminal init, main loop, session updates and key handling.

use crate::Args;
use crate::config::GameConfig;
use crate::game::{Session, SessionEvent, SessionState};
use crate::input::{Action, key_to_action, mouse_to_action};
use crate::theme::Theme;
use crate::ui::DrawContext;
use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

const MIN_FRAME_RATE: f64 = 1.0;
const MAX_FRAME_RATE: f64 = 240.0;

pub struct App {
    theme: Theme,
    session: Session,
    show_outline: bool,
    /// Render frame budget (event poll timeout).
    frame_duration: Duration,
    /// Stack level of the latest perfect landing while its flash plays.
    flash_level: Option<usize>,
    /// TachyonFX flash effect (created by the UI on first draw).
    flash_effect: Option<Effect>,
    flash_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Result<Self> {
        config.validate()?;
        let rate = if args.frame_rate.is_nan() {
            60.0
        } else {
            args.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
        };
        let mut session = Session::new(config);
        if args.no_menu {
            session.start(Instant::now());
        }
        Ok(Self {
            theme,
            session,
            show_outline: args.show_outline,
            frame_duration: Duration::from_secs_f64(1.0 / rate),
            flash_level: None,
            flash_effect: None,
            flash_process_time: None,
        })
    }

    fn reset_game(&mut self, now: Instant) {
        self.session.start(now);
        self.clear_flash();
    }

    fn clear_flash(&mut self) {
        self.flash_level = None;
        self.flash_effect = None;
        self.flash_process_time = None;
    }

    /// Apply one action. Returns false when the app should exit.
    fn apply_action(&mut self, action: Action, now: Instant) -> bool {
        if action == Action::Quit {
            return false;
        }
        match (self.session.state(), action) {
            (SessionState::Idle, Action::Start | Action::Drop) => self.reset_game(now),
            (SessionState::Ended(_) | SessionState::Won, Action::Start) => self.reset_game(now),
            (SessionState::Running, Action::Drop) => {
                self.session.begin_drop(now);
            }
            (_, Action::ToggleOutline) => self.show_outline = !self.show_outline,
            _ => {}
        }
        true
    }

    fn handle_session_events(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::Resolved(outcome) => {
                    if outcome.landing().is_some_and(|l| l.is_perfect) {
                        self.clear_flash();
                        self.flash_level = Some(self.session.score());
                    }
                }
                SessionEvent::Ticked { remaining } if *remaining <= 5 => {
                    log::debug!("{remaining}s left");
                }
                SessionEvent::Finished(state) => {
                    log::debug!("session finished: {:?}", state);
                    self.clear_flash();
                }
                _ => {}
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let events = self.session.update(now);
            self.handle_session_events(&events);

            let ctx = DrawContext {
                session: &self.session,
                theme: &self.theme,
                now,
                show_outline: self.show_outline,
                flash_level: self.flash_level,
            };
            let flash = &mut self.flash_effect;
            let flash_time = &mut self.flash_process_time;
            terminal.draw(|f| {
                let area = f.area();
                crate::ui::draw(f, &ctx, area, flash, flash_time);
            })?;

            if self.flash_effect.as_ref().is_some_and(|e| e.done()) {
                self.clear_flash();
            }

            let timeout = self.frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let action = match event::read()? {
                        // Ignore releases/repeats where the terminal reports them.
                        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(key),
                        Event::Mouse(mouse) => mouse_to_action(mouse),
                        _ => continue,
                    };
                    if !self.apply_action(action, Instant::now()) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let mut argv = vec!["stacktui"];
        argv.extend_from_slice(extra);
        let args = Args::parse_from(argv);
        let config = args.game_config();
        App::new(&args, config, Theme::default()).unwrap()
    }

    #[test]
    fn test_menu_start_then_drop() {
        let mut app = app(&[]);
        let now = Instant::now();
        assert_eq!(app.session.state(), SessionState::Idle);
        assert!(app.apply_action(Action::Start, now));
        assert_eq!(app.session.state(), SessionState::Running);
        assert!(app.apply_action(Action::Drop, now));
        assert!(app.session.falling().is_none());
        assert!(app.session.drop_in_flight(now).is_some());
    }

    #[test]
    fn test_click_drops_like_space() {
        use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        let mut app = app(&[]);
        let now = Instant::now();
        assert!(app.apply_action(mouse_to_action(click), now));
        assert_eq!(app.session.state(), SessionState::Running);
        assert!(app.apply_action(mouse_to_action(click), now));
        assert!(app.session.falling().is_none());
        assert!(app.session.drop_in_flight(now).is_some());
    }

    #[test]
    fn test_start_ignored_mid_round() {
        let mut app = app(&["--no-menu"]);
        let now = Instant::now();
        app.apply_action(Action::Drop, now);
        app.apply_action(Action::Start, now);
        // Still the same round: the drop is pending.
        assert!(app.session.drop_in_flight(now).is_some());
    }

    #[test]
    fn test_quit_and_outline_toggle() {
        let mut app = app(&["--no-menu"]);
        let now = Instant::now();
        assert!(!app.show_outline);
        assert!(app.apply_action(Action::ToggleOutline, now));
        assert!(app.show_outline);
        assert!(!app.apply_action(Action::Quit, now));
    }

    #[test]
    fn test_perfect_landing_starts_flash() {
        let mut app = app(&["--no-menu", "--field-width", "150", "--no-animation"]);
        let now = Instant::now();
        app.apply_action(Action::Drop, now);
        let events = app.session.update(now);
        app.handle_session_events(&events);
        assert_eq!(app.flash_level, Some(1));
    }

    #[test]
    fn test_frame_rate_is_clamped() {
        assert_eq!(app(&["--frame-rate", "inf"]).frame_duration, Duration::from_secs_f64(1.0 / 240.0));
        assert_eq!(app(&["--frame-rate", "1e-300"]).frame_duration, Duration::from_secs(1));
        assert_eq!(app(&["--frame-rate", "0"]).frame_duration, Duration::from_secs(1));
        assert_eq!(app(&["--frame-rate", "NaN"]).frame_duration, Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let args = Args::parse_from(["stacktui", "--plate-width", "999"]);
        assert!(App::new(&args, args.game_config(), Theme::default()).is_err());
    }
}
