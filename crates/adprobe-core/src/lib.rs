//! # adprobe-core
//!
//! Core types shared by the Active Directory LDAP probe.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`config`] - Probe configuration and environment loading

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{AuthMechanism, ProbeConfig};
pub use error::{Error, Result};
