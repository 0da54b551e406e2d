use std::sync::atomic::{AtomicBool, Ordering};

/// Connection status for one client instance.
///
/// The flag is owned by the session and shared with the response path, which
/// reads it from concurrently completing handler tasks. True only between a
/// confirmed authenticated handshake and the following disconnect; connection
/// attempts in flight read as "not connected".
#[derive(Debug, Default)]
pub struct SessionState {
    connected: AtomicBool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
