//! # okr
//!
//! The OKR tracker application: the REST API server, its configuration and
//! the command line. All business rules live in `okr-core`.

pub mod api;
pub mod cli;
pub mod config;
