//! CLI Commands

pub mod env;
pub mod wait;
