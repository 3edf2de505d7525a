//! retrace library
//!
//! This module exports the command line tool's configuration, output and
//! replay driver for use in integration tests and as a library.

pub mod config;
pub mod output;
pub mod run;
