use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::Result;
use crate::segment::SegmentManager;

/// Periodic background compaction, cancellable at shutdown.
///
/// A dedicated thread blocks on the shutdown channel with a timeout equal
/// to the compaction interval: each timeout is one tick, and a message (or
/// a dropped sender) ends the loop. The first tick fires one full interval
/// after startup, so a freshly opened engine never compacts immediately.
///
/// Each tick takes the segment manager's write lock for the duration of
/// the compaction, which serializes it against foreground reads and
/// flushes. Compaction failures are logged and the loop keeps going;
/// they never surface to foreground callers.
pub struct CompactionScheduler {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl CompactionScheduler {
    /// Spawn the scheduler thread over a shared segment manager.
    pub fn start(segments: Arc<RwLock<SegmentManager>>, interval: Duration) -> Result<Self> {
        let (shutdown, signal) = crossbeam_channel::unbounded::<()>();

        let handle = std::thread::Builder::new()
            .name("lsmkv-compaction".into())
            .spawn(move || {
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            debug!("compaction tick");
                            if let Err(e) = segments.write().compact() {
                                error!("background compaction failed: {e}");
                            }
                        }
                        // Shutdown signal, or the engine dropped the sender.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(CompactionScheduler {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it — and any in-flight compaction —
    /// to finish. Idempotent; called from `Db::close` and on drop.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown.send(());
            if handle.join().is_err() {
                error!("compaction thread panicked");
            }
        }
    }
}

impl Drop for CompactionScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
