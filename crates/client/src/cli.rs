//! CLI argument parsing.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relay-client")]
#[command(about = "Push relay client — listen, send, chat")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect and print every message broadcast by other clients [default]
    Listen,

    /// Broadcast one message to every other connected client
    Send {
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Parse MESSAGE as JSON and send it as a structured value
        #[arg(long)]
        json: bool,
    },

    /// Interactive: stdin lines are broadcast, received messages are printed
    Chat,

    /// Ensure the relay's connection table exists
    Init,
}
