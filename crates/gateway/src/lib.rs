//! `ch-gateway` — the chitthi HTTP service and `chitthi` CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod state;
