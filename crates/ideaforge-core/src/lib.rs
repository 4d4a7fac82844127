pub mod config;
pub mod context;
pub mod error;
pub mod hosting;
pub mod io;
pub mod lock;
pub mod manifest;
pub mod mutator;
pub mod orchestrator;
pub mod parser;
pub mod paths;
pub mod prompts;
pub mod publish;
pub mod selector;
pub mod transport;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ForgeError, Result};
