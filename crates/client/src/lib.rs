//! Push relay command-line client.

pub mod cli;
pub mod relay_client;
