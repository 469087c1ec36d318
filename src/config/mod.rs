//! # rowvers Configuration Module
//!
//! This module centralizes configuration constants. Interdependent values are
//! grouped and checked with compile-time assertions so that a change to one
//! layout constant cannot silently desynchronize the record and undo codecs.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation
//!
//! Runtime behaviour is selected per call rather than globally: see
//! [`crate::vers::BuildMode`].

pub mod constants;
pub use constants::*;
