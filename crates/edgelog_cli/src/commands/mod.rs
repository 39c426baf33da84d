//! CLI command implementations.

pub mod dump;
pub mod exec;
pub mod inspect;
pub mod merge;
pub mod publish;
pub mod verify;
