use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{TerminalController, INTERRUPT_KEY};

/// Console-mode controller for Windows.
///
/// crossterm clears line input and echo on the console input handle and
/// remembers the original mode for `disable_raw_mode`.
#[derive(Debug, Default)]
pub struct WindowsConsoleMode {
    raw: AtomicBool,
}

impl WindowsConsoleMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalController for WindowsConsoleMode {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enter_raw_mode(&self) -> io::Result<()> {
        enable_raw_mode()?;
        self.raw.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn restore_mode(&self) -> io::Result<()> {
        if self.raw.swap(false, Ordering::SeqCst) {
            disable_raw_mode()?;
        }
        Ok(())
    }

    fn poll_byte(&self) -> io::Result<Option<u8>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }
        match event::read()? {
            // Raw mode delivers Ctrl-C as a key event instead of a console signal
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) if modifiers.contains(KeyModifiers::CONTROL) => Ok(Some(INTERRUPT_KEY)),
            Event::Key(KeyEvent {
                code: KeyCode::Char(c),
                kind: KeyEventKind::Press,
                ..
            }) if c.is_ascii() => Ok(Some(c as u8)),
            _ => Ok(None),
        }
    }
}
