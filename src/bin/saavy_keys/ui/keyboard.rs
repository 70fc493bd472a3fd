//! Key row widget - one cell per layout key, lit while its voice sounds

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::state::{KeyStatus, KeyboardState};

/// Semitones within an octave that fall on black piano keys
const BLACK_KEYS: [usize; 5] = [1, 3, 6, 8, 10];

fn is_black(index: usize) -> bool {
    BLACK_KEYS.contains(&(index % 12))
}

pub fn render_keyboard(frame: &mut Frame, area: Rect, state: &KeyboardState) {
    let block = Block::default().title(" Keys ").borders(Borders::ALL);

    let mut letters = Vec::with_capacity(state.keys.len());
    let mut pitches = Vec::with_capacity(state.keys.len());

    for (index, &(key, hz)) in state.keys.iter().enumerate() {
        let base = if is_black(index) {
            Style::default().fg(Color::White).bg(Color::Black)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        };
        let style = match state.status(key) {
            KeyStatus::Held => base.bg(Color::Green).add_modifier(Modifier::BOLD),
            KeyStatus::Releasing => base.bg(Color::Yellow),
            KeyStatus::Idle => base,
        };

        letters.push(Span::styled(format!(" {key} "), style));
        letters.push(Span::raw(" "));

        // Octave markers under every C
        let marker = if index % 12 == 0 {
            format!("{:<4}", hz.round() as u32)
        } else {
            "    ".to_string()
        };
        pitches.push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
    }

    let paragraph = Paragraph::new(vec![Line::from(letters), Line::from(pitches)]).block(block);
    frame.render_widget(paragraph, area);
}
