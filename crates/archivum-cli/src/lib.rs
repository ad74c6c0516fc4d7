//! archivum CLI library
//!
//! Argument definitions and command handlers behind the `arq` binary.

pub mod cli;
pub mod commands;
pub mod input;
pub mod logging;
