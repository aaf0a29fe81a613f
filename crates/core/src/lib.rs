//! Core utilities for the xcspm tools
//!
//! This crate provides shared functionality used by the project crate and
//! the command-line binary:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Validation**: required-field checks that report every failure at once
//! - **Configuration**: TOML-based configuration with defaults

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};
