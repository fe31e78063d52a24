//! The fixed-period tick context.
//!
//! A dedicated thread stands in for the hardware timer interrupt: it
//! locks the panel once per period, runs one multiplex + scan step and
//! sleeps. Dropping the `Ticker` stops the thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::panel::{PanelIo, SharedPanel};

/// Default tick period, matching the hardware's 1 kHz timer interrupt.
pub const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Handle to the running tick thread.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking `panel` against the given I/O backend.
    pub fn spawn<I: PanelIo + 'static>(panel: SharedPanel, mut io: I, period: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                panel.with(|p| p.tick(&mut io));
                thread::sleep(period);
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
