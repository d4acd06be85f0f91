//! Packaging pipeline and container acceptance harness for rattomail.
//!
//! The three bins are thin wrappers; everything testable lives here.

pub mod assemble;
pub mod config;
pub mod control;
pub mod harness;
pub mod identity;
pub mod mail;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod staging;
pub mod validate;
pub mod version;
