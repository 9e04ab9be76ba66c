use std::path::PathBuf;

use clap::{Parser, Subcommand};
use http::Method;

/// Resilient REST client
#[derive(Debug, Parser)]
#[command(name = "tether", about = "Call REST backends with retries, PKCE and multipart downloads")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tether.toml", env = "TETHER_CONFIG")]
    pub config: PathBuf,

    /// Log filter directive, overriding the configured one
    #[arg(long, env = "TETHER_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the PKCE exchange and print the bearer token
    Token,

    /// Send a JSON request with any method and print the decoded response
    Request {
        /// Endpoint pattern, e.g. `/items/%s`
        endpoint: String,

        /// Positional arguments for the endpoint pattern
        args: Vec<String>,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },

    /// Download every part of a multipart response into a directory
    Download {
        /// Endpoint pattern, e.g. `/files/%s`
        endpoint: String,

        /// Positional arguments for the endpoint pattern
        args: Vec<String>,

        /// Directory the parts are written to
        #[arg(short, long)]
        dest: PathBuf,
    },
}
