//! CineList shared utilities.

pub mod logging;
