//! # Application
//!
//! Wires the pieces together for one run:
//!
//! 1. Load the previous tally (best effort).
//! 2. Open keyboard capture and print the banner.
//! 3. Run the blocking capture loop on a `spawn_blocking` thread while the
//!    shutdown handler (and, for interval saves, the periodic saver) run as
//!    tokio tasks.
//! 4. Whichever finishes first decides how we exit.
//!
//! | Trigger            | Final save              | Exit              |
//! |--------------------|-------------------------|-------------------|
//! | ESC                | flush if anything changed | return `Ok`     |
//! | Ctrl+C key         | unconditional           | return `Ok`       |
//! | SIGINT / SIGTERM   | by the shutdown task    | `process::exit(0)`|
//! | capture error      | none                    | return `Err`      |

use log::{error, info, warn};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::capture::{self, CaptureError, CaptureSession, LoopExit, run_capture_loop};
use crate::core::config::ResolvedConfig;
use crate::core::saver::{SavePolicy, Saver, spawn_periodic};
use crate::core::tally::{Tally, top_keys};
use crate::shutdown::{self, Signal};

pub const BANNER: &str = "Keytally is running. Press ESC to exit.";
pub const EXIT_MESSAGE: &str = "Exiting...";

enum Exit {
    Capture(Result<LoopExit, CaptureError>),
    Signal(Signal),
}

/// Loads the tally at `path` into `tally`, logging instead of failing.
pub fn load_existing(tally: &Tally, path: &Path) {
    match tally.load(path) {
        Ok(keys) => info!("Loaded {} keys from {}", keys, path.display()),
        Err(e) if e.is_not_found() => {
            info!("No existing tally at {}, starting fresh", path.display())
        }
        Err(e) => warn!(
            "Could not load tally from {}: {}. Starting fresh",
            path.display(),
            e
        ),
    }
}

pub async fn run(config: ResolvedConfig) -> io::Result<()> {
    let tally = Arc::new(Tally::new());
    load_existing(&tally, &config.data_file);
    let saver = Arc::new(Saver::new(
        tally,
        config.data_file.clone(),
        config.save_policy,
    ));

    let mut session = CaptureSession::open()?;
    // Raw mode: no implicit carriage return
    print!("{BANNER}\r\n");
    io::stdout().flush()?;

    let periodic = match config.save_policy {
        SavePolicy::Interval(period) => Some(spawn_periodic(Arc::clone(&saver), period)),
        SavePolicy::EveryKey => None,
    };
    let mut shutdown = shutdown::spawn(Arc::clone(&saver));
    let mut shutdown_live = true;

    let capture_saver = Arc::clone(&saver);
    let fold_case = config.fold_case;
    let mut capture = tokio::task::spawn_blocking(move || {
        let result = run_capture_loop(&mut session, &capture_saver, fold_case);
        session.close();
        result
    });

    let exit = loop {
        tokio::select! {
            joined = &mut capture => break Exit::Capture(joined.map_err(io::Error::other)?),
            joined = &mut shutdown, if shutdown_live => match joined {
                Ok(Ok(signal)) => break Exit::Signal(signal),
                Ok(Err(e)) => {
                    warn!("Signal listener unavailable: {}", e);
                    shutdown_live = false;
                }
                Err(e) => {
                    warn!("Signal listener task failed: {}", e);
                    shutdown_live = false;
                }
            },
        }
    };

    if let Some(handle) = periodic {
        handle.abort();
    }

    match exit {
        Exit::Capture(Ok(LoopExit::ExitKey)) => {
            shutdown.abort();
            if let Err(e) = saver.flush() {
                warn!("Final save to {} failed: {}", saver.path().display(), e);
            }
            info!("Exit key pressed, {} presses tallied", saver.tally().total());
            println!("{EXIT_MESSAGE}");
            Ok(())
        }
        Exit::Capture(Ok(LoopExit::Interrupted)) => {
            shutdown.abort();
            if let Err(e) = saver.flush_now() {
                warn!("Final save to {} failed: {}", saver.path().display(), e);
            }
            info!("Interrupted from keyboard");
            println!("\n{EXIT_MESSAGE}");
            Ok(())
        }
        Exit::Capture(Err(e)) => {
            shutdown.abort();
            capture::restore_terminal();
            error!("Keyboard capture failed: {}", e);
            Err(e.into())
        }
        Exit::Signal(signal) => {
            // The capture thread is parked in a blocking read; the runtime
            // would wait on it forever, so leave directly.
            capture::restore_terminal();
            info!("Shut down by {:?}", signal);
            println!("\n{EXIT_MESSAGE}");
            log::logger().flush();
            std::process::exit(0);
        }
    }
}

/// Prints the `limit` most pressed keys from the tally at `path`.
pub fn print_summary(path: &Path, limit: usize) -> io::Result<()> {
    let tally = Tally::new();
    if let Err(e) = tally.load(path) {
        if e.is_not_found() {
            println!("No tally at {} yet.", path.display());
            return Ok(());
        }
        return Err(io::Error::new(io::ErrorKind::InvalidData, e));
    }

    let mut out = io::stdout().lock();
    write_summary(&mut out, &tally, limit)
}

/// Renders the summary table for `tally`.
pub fn write_summary<W: Write>(out: &mut W, tally: &Tally, limit: usize) -> io::Result<()> {
    let total = tally.total();
    writeln!(out, "{} presses across {} keys", total, tally.len())?;

    let top = top_keys(&tally.snapshot(), limit);
    let width = top.iter().map(|(key, _)| key.chars().count()).max().unwrap_or(0);
    for (key, count) in top {
        let share = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        writeln!(out, "  {key:<width$}  {count:>8}  {share:5.1}%")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_existing_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let tally = Tally::new();
        load_existing(&tally, &dir.path().join("missing.json"));
        assert!(tally.is_empty());
    }

    #[test]
    fn test_load_existing_tolerates_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key_counts.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let tally = Tally::new();
        load_existing(&tally, &path);
        assert!(tally.is_empty());
    }

    #[test]
    fn test_load_existing_resumes_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key_counts.json");
        fs::write(&path, r#"{"a": 12, "ESC": 1}"#).unwrap();

        let tally = Tally::new();
        load_existing(&tally, &path);
        assert_eq!(tally.count("a"), 12);
        assert_eq!(tally.count("ESC"), 1);
    }

    #[test]
    fn test_write_summary_lists_top_keys() {
        let tally = Tally::new();
        for _ in 0..3 {
            tally.increment("a");
        }
        tally.increment("ENTER");

        let mut out = Vec::new();
        write_summary(&mut out, &tally, 1).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "4 presses across 2 keys");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains('a'));
        assert!(lines[1].contains("75.0%"));
    }

    #[test]
    fn test_write_summary_empty_tally() {
        let mut out = Vec::new();
        write_summary(&mut out, &Tally::new(), 10).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 presses across 0 keys\n");
    }
}
