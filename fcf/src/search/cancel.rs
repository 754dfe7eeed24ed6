use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot cancellation flag shared between the key listener and a backend.
///
/// Once tripped it stays tripped; a fresh signal is created per search.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    tripped: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the signal. Returns true only for the call that tripped it.
    pub fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_trip_is_one_shot() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_tripped());
        assert!(signal.trip());
        assert!(signal.is_tripped());
        assert!(!signal.trip());
        assert!(signal.is_tripped());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancellationSignal::new();
        let remote = signal.clone();
        thread::spawn(move || remote.trip()).join().unwrap();
        assert!(signal.is_tripped());
    }

    #[test]
    fn test_exactly_one_concurrent_trip_wins() {
        let signal = CancellationSignal::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = signal.clone();
                thread::spawn(move || s.trip())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
