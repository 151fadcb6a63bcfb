//! # Core Logic
//!
//! Counting and persistence. Knows nothing about terminals or signals.
//!
//! ```text
//!      capture loop ──┐             ┌── shutdown task
//!                     ▼             ▼
//!                 ┌─────────────────────┐
//!                 │        Saver        │  when to write
//!                 └──────────┬──────────┘
//!                            ▼
//!                 ┌─────────────────────┐
//!                 │        Tally        │  Mutex<HashMap<String, u64>>
//!                 └──────────┬──────────┘
//!                            ▼
//!                     key_counts.json
//! ```
//!
//! ## Modules
//!
//! - [`tally`]: the counter store and its JSON file format
//! - [`saver`]: save policy (every key or periodic)
//! - [`key`]: key-press events and key-identifier derivation
//! - [`config`]: layered settings

pub mod config;
pub mod key;
pub mod saver;
pub mod tally;
