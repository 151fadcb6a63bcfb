//! # Shutdown Handler
//!
//! A tokio task that waits for SIGINT/SIGTERM, writes the tally one last
//! time and then completes. `app::run` joins this task before exiting, so
//! the final save always lands before the process goes away.

use std::future::Future;
use std::io;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::core::saver::Saver;

/// Which termination signal arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

/// Resolves when the process receives SIGINT or SIGTERM.
pub async fn wait_for_signal() -> io::Result<Signal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                Ok(Signal::Interrupt)
            }
            _ = terminate.recv() => Ok(Signal::Terminate),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(Signal::Interrupt)
    }
}

/// Spawns the handler listening for real OS signals.
pub fn spawn(saver: Arc<Saver>) -> JoinHandle<io::Result<Signal>> {
    spawn_with(saver, wait_for_signal())
}

/// Spawns the handler with a custom trigger. When `trigger` resolves with a
/// signal, the tally is saved once and the task completes with that signal.
pub fn spawn_with<F>(saver: Arc<Saver>, trigger: F) -> JoinHandle<io::Result<Signal>>
where
    F: Future<Output = io::Result<Signal>> + Send + 'static,
{
    tokio::spawn(async move {
        let signal = trigger.await?;
        info!("Caught {:?}, saving tally", signal);
        if let Err(e) = saver.flush_now() {
            warn!("Final save to {} failed: {}", saver.path().display(), e);
        }
        Ok(signal)
    })
}
