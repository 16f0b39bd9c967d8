//! Terminal host for the hrlink connect flow.
//!
//! The binary plays the part a browser plays for the dashboard: it owns the
//! widget global (a [`terminal::TerminalWidget`] reading answers from stdin),
//! optionally bootstraps it from a script URL, polls its availability, and
//! renders the [`hrlink::ShellView`] before and after the attempt.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod styles;
pub mod terminal;
