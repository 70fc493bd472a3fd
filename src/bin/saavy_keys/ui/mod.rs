//! TUI module for saavy-keys
//!
//! Turns terminal key events into synth messages and shows which voices are
//! sounding, rebuilt from the synth's note events.

mod keyboard;
pub mod state;

use std::{
    collections::HashMap,
    io::stdout,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use saavy_keys::{KeyId, KeyboardHandle, PitchTable, VoiceEvent};
use tracing::{info, warn};

use keyboard::render_keyboard;
use state::KeyboardState;

/// Without key release reporting a note is released this long after the
/// last press (or auto-repeat) of its key.
const AUTO_RELEASE: Duration = Duration::from_millis(600);

/// UI application state
pub struct UiApp {
    /// Sends key and pedal messages to the audio thread
    keys: KeyboardHandle,
    /// Note events coming back from the audio thread
    events: Consumer<VoiceEvent>,
    state: KeyboardState,
    /// Keys that have a pitch; nothing else reaches the audio thread
    layout: PitchTable,
    /// Dropped note events already accounted for
    dropped_events: u64,
    sample_rate: f32,
    /// Terminal reports key releases
    enhanced: bool,
    /// Auto-release deadlines when releases are not reported
    pending_releases: HashMap<KeyId, Instant>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        keys: KeyboardHandle,
        events: Consumer<VoiceEvent>,
        layout: PitchTable,
        sample_rate: f32,
    ) -> Self {
        Self {
            keys,
            events,
            state: KeyboardState::new(&layout),
            layout,
            dropped_events: 0,
            sample_rate,
            enhanced: false,
            pending_releases: HashMap::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
        if self.enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        info!(key_release = self.enhanced, "Keyboard input ready");

        let result = self.event_loop(terminal);

        if self.enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        self.keys.all_notes_off();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_events();
            self.release_expired();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (~60fps), draining everything queued so
            // chords arrive in the same block
            if event::poll(Duration::from_millis(16))? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply note events from the audio thread
    fn poll_events(&mut self) {
        while let Ok(event) = self.events.pop() {
            self.state.apply(event);
        }
        self.keys.log_rejected();

        // Lost events leave stale key states behind; start over from the
        // events that follow
        let dropped = self.keys.dropped_events();
        if dropped != self.dropped_events {
            warn!(
                lost = dropped - self.dropped_events,
                "Note events dropped by the audio thread, resetting key display"
            );
            self.dropped_events = dropped;
            self.state.reset_voices();
        }
    }

    fn release_expired(&mut self) {
        let now = Instant::now();
        let keys = &mut self.keys;
        self.pending_releases.retain(|&key, deadline| {
            let keep = *deadline > now;
            if !keep {
                keys.key_up(key);
            }
            keep
        });
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char(' ') => self.handle_pedal(key.kind),
            KeyCode::Char(c) => {
                let note = KeyId::new(c.to_ascii_uppercase());
                if self.layout.index_of(note).is_some() {
                    self.handle_note(note, key.kind);
                }
            }
            _ => {}
        }
    }

    fn handle_note(&mut self, key: KeyId, kind: KeyEventKind) {
        match kind {
            KeyEventKind::Press if self.enhanced => {
                self.keys.key_down(key);
            }
            KeyEventKind::Press => {
                // auto-repeat only pushes the deadline back
                let deadline = Instant::now() + AUTO_RELEASE;
                if self.pending_releases.insert(key, deadline).is_none() {
                    self.keys.key_down(key);
                }
            }
            KeyEventKind::Release => {
                self.keys.key_up(key);
            }
            KeyEventKind::Repeat => {}
        }
    }

    /// Space holds the pedal, or toggles it when releases are not reported
    fn handle_pedal(&mut self, kind: KeyEventKind) {
        let engaged = match kind {
            KeyEventKind::Press if self.enhanced => true,
            KeyEventKind::Press => !self.state.pedal,
            KeyEventKind::Release => false,
            KeyEventKind::Repeat => return,
        };
        if engaged != self.state.pedal && self.keys.pedal(engaged) {
            self.state.pedal = engaged;
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(4), // Keys
                Constraint::Min(3),    // Played notes
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        render_keyboard(frame, chunks[1], &self.state);
        self.render_history(frame, chunks[2]);

        let help = if self.enhanced {
            " [A-Z] Play  [Space] Hold pedal  [Esc] Quit"
        } else {
            " [A-Z] Play  [Space] Toggle pedal  [Esc] Quit"
        };
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" saavy-keys ").borders(Borders::ALL);

        let (pedal_text, pedal_color) = if self.state.pedal {
            ("Pedal: ON   ", Color::Green)
        } else {
            ("Pedal: off  ", Color::DarkGray)
        };

        let line = Line::from(vec![
            Span::styled(
                format!(" Voices: {:<3} ", self.state.sounding()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(pedal_text, Style::default().fg(pedal_color)),
            Span::styled(
                format!("t = {:.2}s  ", self.state.last_event_time),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{:.1}kHz", self.sample_rate / 1000.0),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" Played ").borders(Borders::ALL);

        let lines: Vec<Line> = self
            .state
            .history()
            .map(|note| {
                Line::from(vec![
                    Span::styled(format!(" {} ", note.key), Style::default().fg(Color::Yellow)),
                    Span::raw(format!("{:>10}", note.frequency.to_string())),
                    Span::styled(
                        format!("  @ {:.2}s", note.timestamp),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
