//! Stop-key detection during a search.
//!
//! The controlling terminal is switched to non-canonical, no-echo input for
//! the duration of a search so a single `s` keypress is visible without
//! Enter. A [`CancellationListener`] owns that switch and always undoes it
//! when dropped.
//!
//! Ctrl-C while listening stops the search, restores the terminal and then
//! ends the process the way an unhandled interrupt would.
//!
//! Platform differences live behind [`TerminalController`]; everything else
//! only talks to the trait.

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(unix)]
use once_cell::sync::Lazy;

use crate::search::cancel::CancellationSignal;

/// Key that stops an in-flight search (either case)
pub const STOP_KEY: u8 = b's';

/// Capacity of the key notification channel
pub const KEY_CHANNEL_CAPACITY: usize = 16;

/// Ctrl-C as delivered by consoles that pass it through as input
pub const INTERRUPT_KEY: u8 = 0x03;

/// Exit status after an interrupt where the signal cannot be re-raised
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Raw-mode control and non-blocking input for the controlling terminal
pub trait TerminalController: Send + Sync {
    /// Whether input comes from an interactive terminal
    fn is_interactive(&self) -> bool;

    /// Saves the current mode and switches to non-canonical, no-echo input
    fn enter_raw_mode(&self) -> io::Result<()>;

    /// Restores the mode saved by `enter_raw_mode`
    fn restore_mode(&self) -> io::Result<()>;

    /// Reads one byte if one is available, without blocking
    fn poll_byte(&self) -> io::Result<Option<u8>>;
}

/// Controller for platforms without raw-mode support; never interactive
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl TerminalController for Unsupported {
    fn is_interactive(&self) -> bool {
        false
    }

    fn enter_raw_mode(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw terminal mode is not supported on this platform",
        ))
    }

    fn restore_mode(&self) -> io::Result<()> {
        Ok(())
    }

    fn poll_byte(&self) -> io::Result<Option<u8>> {
        Ok(None)
    }
}

/// The controller for this platform's standard input
pub fn platform_terminal() -> Arc<dyn TerminalController> {
    #[cfg(unix)]
    {
        Arc::new(unix::UnixTermios::stdin())
    }
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsConsoleMode::new())
    }
    #[cfg(not(any(unix, windows)))]
    {
        Arc::new(Unsupported)
    }
}

pub fn is_stop_key(byte: u8) -> bool {
    byte.eq_ignore_ascii_case(&STOP_KEY)
}

/// Observable listener state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Polling for the stop key
    Listening,
    /// The stop key was seen; the terminal is not restored yet
    Tripped,
    /// Finished, or never started because input is not a terminal
    Stopped,
}

/// Watches the terminal for the stop key while a search runs.
///
/// Dropping the listener stops the polling thread and restores the terminal.
pub struct CancellationListener {
    terminal: Arc<dyn TerminalController>,
    signal: CancellationSignal,
    done: Arc<AtomicBool>,
    poller: Option<JoinHandle<()>>,
    keys: Option<Receiver<u8>>,
    interrupted: Arc<AtomicBool>,
    #[cfg(unix)]
    routes_sigint: bool,
    raw_mode: bool,
    stopped: bool,
}

impl CancellationListener {
    /// Switches the terminal to raw mode and starts polling.
    ///
    /// Without an interactive terminal the listener is inert and its signal
    /// never trips.
    pub fn start(terminal: Arc<dyn TerminalController>, poll_interval: Duration) -> Self {
        let mut listener = Self {
            terminal,
            signal: CancellationSignal::new(),
            done: Arc::new(AtomicBool::new(false)),
            poller: None,
            keys: None,
            interrupted: Arc::new(AtomicBool::new(false)),
            #[cfg(unix)]
            routes_sigint: false,
            raw_mode: false,
            stopped: false,
        };

        if !listener.terminal.is_interactive() {
            debug!("Input is not a terminal; search cannot be interrupted");
            listener.stopped = true;
            return listener;
        }

        if let Err(e) = listener.terminal.enter_raw_mode() {
            debug!("Could not enter raw terminal mode: {}", e);
            listener.stopped = true;
            return listener;
        }
        listener.raw_mode = true;

        // Ctrl-C's default action would exit with the terminal still raw
        #[cfg(unix)]
        {
            if let Some(route) = SIGINT_ROUTE.as_ref() {
                route.pending.store(false, Ordering::Release);
                route.idle.store(false, Ordering::Release);
                listener.interrupted = Arc::clone(&route.pending);
                listener.routes_sigint = true;
            }
        }

        let (tx, rx) = mpsc::sync_channel(KEY_CHANNEL_CAPACITY);
        let terminal = Arc::clone(&listener.terminal);
        let signal = listener.signal.clone();
        let done = Arc::clone(&listener.done);
        let interrupted = Arc::clone(&listener.interrupted);

        match thread::Builder::new()
            .name("fcf-key-listener".to_string())
            .spawn(move || {
                let end = poll_keys(
                    terminal.as_ref(),
                    &signal,
                    &done,
                    &interrupted,
                    &tx,
                    poll_interval,
                );
                if end == PollEnd::Interrupted {
                    restore_after_interrupt(terminal.as_ref());
                    exit_interrupted();
                }
            })
        {
            Ok(handle) => {
                listener.poller = Some(handle);
                listener.keys = Some(rx);
                debug!("Listening for stop key");
            }
            Err(e) => {
                warn!("Could not start key listener: {}", e);
                listener.stop();
            }
        }
        listener
    }

    /// The signal tripped by the stop key
    pub fn signal(&self) -> CancellationSignal {
        self.signal.clone()
    }

    /// Every byte read while listening, best effort
    pub fn keys(&self) -> Option<&Receiver<u8>> {
        self.keys.as_ref()
    }

    /// Whether the stop key can currently interrupt the search
    pub fn is_active(&self) -> bool {
        self.poller.is_some() && !self.stopped
    }

    pub fn state(&self) -> ListenerState {
        if self.stopped {
            ListenerState::Stopped
        } else if self.signal.is_tripped() {
            ListenerState::Tripped
        } else {
            ListenerState::Listening
        }
    }

    /// Stops polling and restores the terminal. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.stopped && !self.raw_mode {
            return;
        }
        self.stopped = true;
        self.done.store(true, Ordering::Release);

        if let Some(handle) = self.poller.take() {
            if handle.join().is_err() {
                warn!("Key listener thread panicked");
            }
        }

        if self.raw_mode {
            self.raw_mode = false;
            match self.terminal.restore_mode() {
                Ok(()) => debug!("Terminal mode restored"),
                Err(e) => warn!("Failed to restore terminal mode: {}", e),
            }
        }

        #[cfg(unix)]
        {
            if self.routes_sigint {
                self.routes_sigint = false;
                if let Some(route) = SIGINT_ROUTE.as_ref() {
                    route.idle.store(true, Ordering::Release);
                }
            }
        }

        // Ctrl-C that arrived after the poller had already finished
        if self.interrupted.load(Ordering::Acquire) {
            exit_interrupted();
        }
    }
}

impl Drop for CancellationListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Process-wide SIGINT handling.
///
/// While `idle` is set the signal keeps its default action. A listener
/// clears it for the time the terminal is raw, and the signal then only
/// raises `pending`.
#[cfg(unix)]
struct SigintRoute {
    idle: Arc<AtomicBool>,
    pending: Arc<AtomicBool>,
}

#[cfg(unix)]
static SIGINT_ROUTE: Lazy<Option<SigintRoute>> = Lazy::new(|| {
    use signal_hook::consts::SIGINT;

    let idle = Arc::new(AtomicBool::new(true));
    let pending = Arc::new(AtomicBool::new(false));
    let installed = signal_hook::flag::register_conditional_default(SIGINT, Arc::clone(&idle))
        .and_then(|_| signal_hook::flag::register(SIGINT, Arc::clone(&pending)));

    match installed {
        Ok(_) => Some(SigintRoute { idle, pending }),
        Err(e) => {
            warn!("Could not install Ctrl-C handler: {}", e);
            None
        }
    }
});

fn restore_after_interrupt(terminal: &dyn TerminalController) {
    match terminal.restore_mode() {
        Ok(()) => debug!("Interrupted; terminal mode restored"),
        Err(e) => warn!("Failed to restore terminal mode: {}", e),
    }
}

/// Ends the process as an unhandled SIGINT would
fn exit_interrupted() -> ! {
    #[cfg(unix)]
    {
        if let Err(e) = signal_hook::low_level::emulate_default_handler(signal_hook::consts::SIGINT) {
            debug!("Could not re-raise SIGINT: {}", e);
        }
    }
    std::process::exit(INTERRUPTED_EXIT_CODE)
}

/// Why the polling loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollEnd {
    Finished,
    StopKey,
    Interrupted,
}

fn poll_keys(
    terminal: &dyn TerminalController,
    signal: &CancellationSignal,
    done: &AtomicBool,
    interrupted: &AtomicBool,
    keys: &SyncSender<u8>,
    poll_interval: Duration,
) -> PollEnd {
    let mut reading = true;
    while !done.load(Ordering::Acquire) {
        if interrupted.load(Ordering::Acquire) {
            signal.trip();
            return PollEnd::Interrupted;
        }
        if !reading {
            thread::sleep(poll_interval);
            continue;
        }

        match terminal.poll_byte() {
            Ok(Some(INTERRUPT_KEY)) => interrupted.store(true, Ordering::Release),
            Ok(Some(byte)) => {
                match keys.try_send(byte) {
                    Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                    Err(TrySendError::Full(_)) => debug!("Key channel full, dropping keypress"),
                }
                if is_stop_key(byte) {
                    if signal.trip() {
                        debug!("Stop key pressed");
                    }
                    return PollEnd::StopKey;
                }
            }
            Ok(None) => thread::sleep(poll_interval),
            Err(e) => {
                // Ctrl-C must still be honoured while raw mode is on
                debug!("Key polling failed, stop key disabled: {}", e);
                reading = false;
            }
        }
    }
    PollEnd::Finished
}
