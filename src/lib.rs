//! Keytally library exports for testing

pub mod app;
pub mod capture;
pub mod core;
pub mod shutdown;

#[cfg(test)]
pub mod test_support;
