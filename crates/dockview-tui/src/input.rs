//! Keystrokes to dashboard commands
//!
//! Most keys map to a command on their own. `g` is a prefix: `gg` jumps to the
//! top if the second `g` arrives before the sequence deadline. Any other key,
//! or a late one, drops the pending prefix and is handled as a fresh key.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Everything a key can ask the dashboard to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NavigateUp,
    NavigateDown,
    JumpTop,
    JumpBottom,
    Start,
    Stop,
    Restart,
    StartAll,
    StopAll,
    RestartAll,
    OpenLogs,
    ForceRefresh,
    ToggleStopped,
    ToggleHelp,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceState {
    Idle,
    AwaitingContinuation { prefix: char, deadline: Instant },
}

/// Turns key events into commands, tracking multi-key sequences
#[derive(Debug, Clone)]
pub struct KeySequencer {
    state: SequenceState,
    timeout: Duration,
}

impl KeySequencer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: SequenceState::Idle,
            timeout,
        }
    }

    /// The prefix key waiting for its continuation, if any
    pub fn pending(&self) -> Option<char> {
        match self.state {
            SequenceState::Idle => None,
            SequenceState::AwaitingContinuation { prefix, .. } => Some(prefix),
        }
    }

    /// Feed one key observed at `now`
    pub fn feed(&mut self, key: KeyEvent, now: Instant) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        if let SequenceState::AwaitingContinuation { prefix, deadline } = self.state {
            self.state = SequenceState::Idle;
            if now < deadline {
                if let Some(command) = continuation(prefix, &key) {
                    return Some(command);
                }
            } else {
                tracing::trace!("Sequence prefix '{}' expired", prefix);
            }
        }

        if let Some(prefix) = sequence_prefix(&key) {
            self.state = SequenceState::AwaitingContinuation {
                prefix,
                deadline: now + self.timeout,
            };
            return None;
        }

        single(&key)
    }

    /// Drop a pending prefix whose deadline has passed
    pub fn expire(&mut self, now: Instant) {
        if let SequenceState::AwaitingContinuation { deadline, .. } = self.state {
            if now >= deadline {
                self.state = SequenceState::Idle;
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = SequenceState::Idle;
    }
}

fn plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn sequence_prefix(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char('g') if plain(key) => Some('g'),
        _ => None,
    }
}

fn continuation(prefix: char, key: &KeyEvent) -> Option<Command> {
    match (prefix, key.code) {
        ('g', KeyCode::Char('g')) if plain(key) => Some(Command::JumpTop),
        _ => None,
    }
}

fn single(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }

    let command = match key.code {
        KeyCode::Char('j') | KeyCode::Down => Command::NavigateDown,
        KeyCode::Char('k') | KeyCode::Up => Command::NavigateUp,
        KeyCode::Home => Command::JumpTop,
        KeyCode::Char('G') | KeyCode::End => Command::JumpBottom,
        KeyCode::Char('s') => Command::Start,
        KeyCode::Char('c') => Command::Stop,
        KeyCode::Char('r') => Command::Restart,
        KeyCode::Char('S') => Command::StartAll,
        KeyCode::Char('C') => Command::StopAll,
        KeyCode::Char('R') => Command::RestartAll,
        KeyCode::Char('l') => Command::OpenLogs,
        KeyCode::F(5) => Command::ForceRefresh,
        KeyCode::Char('h') => Command::ToggleStopped,
        KeyCode::Char('?') => Command::ToggleHelp,
        KeyCode::Char('q') => Command::Quit,
        _ => return None,
    };
    Some(command)
}
