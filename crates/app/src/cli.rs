//! Command-line arguments

use clap::{Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[clap(name = "stayspot", version, about = "Chat with StaySpot hosts and renters")]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// API base URL, overriding the config file and environment
    #[clap(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        email: String,
        /// Read from stdin when omitted
        #[clap(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        name: String,
        email: String,
        #[clap(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List conversations
    Conversations,
    /// Open a conversation; type to send, `/quit` to leave
    Chat { conversation_id: i64 },
}
