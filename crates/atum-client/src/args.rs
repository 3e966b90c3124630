#![doc(hidden)]

use clap::{Parser, Subcommand};

/// Arguments for the `atum` CLI
#[derive(Parser, Debug)]
#[command(version, about = "Atum trusted-timestamping client")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[clap(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Don't print any messages except for errors",
        default_value_t = false
    )]
    pub quiet: bool,

    #[clap(
        short = 'v',
        long,
        global = true,
        conflicts_with = "quiet",
        action = clap::ArgAction::Count,
        help = "Output details about requests and responses; specify multiple times for more detail"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Request a timestamp on a file or a raw nonce
    Stamp(StampArgs),

    /// Verify a previously obtained timestamp
    Verify(VerifyArgs),
}

#[derive(clap::Args, Debug)]
pub struct StampArgs {
    #[clap(
        short = 's',
        long,
        value_name = "URL",
        help = "Base URL of the Atum server",
        default_value = "https://atum.stethoscoop.net"
    )]
    pub server: String,

    #[clap(
        short = 'f',
        long,
        value_name = "FILE",
        conflicts_with = "nonce",
        help = "File to timestamp; its contents are hashed, never uploaded"
    )]
    pub file: Option<String>,

    #[clap(
        short = 'n',
        long,
        value_name = "NONCE",
        help = "Raw nonce to timestamp (hex or base64)"
    )]
    pub nonce: Option<String>,

    #[clap(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Where to write the timestamp [default: <FILE>.atum-timestamp, or stdout for a raw nonce]"
    )]
    pub output: Option<String>,

    #[clap(
        short = 'a',
        long,
        value_name = "ALG",
        help = "Preferred signature algorithm (ed25519 or xmssmt)"
    )]
    pub alg: Option<String>,

    #[clap(
        long,
        value_name = "UNIX",
        requires = "nonce",
        help = "Unix time to request on the timestamp [default: now]"
    )]
    pub time: Option<i64>,

    #[clap(
        short = 't',
        long,
        value_name = "TIMEOUT",
        help = "Seconds to wait for the server's response",
        default_value_t = 10
    )]
    pub timeout: u16,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    #[clap(
        short = 's',
        long,
        value_name = "URL",
        help = "Only accept a timestamp set by this Atum server"
    )]
    pub server: Option<String>,

    #[clap(
        short = 'f',
        long,
        value_name = "FILE",
        conflicts_with = "nonce",
        help = "File the timestamp was set on"
    )]
    pub file: Option<String>,

    #[clap(
        short = 'n',
        long,
        value_name = "NONCE",
        help = "Raw nonce the timestamp was set on (hex or base64)"
    )]
    pub nonce: Option<String>,

    #[clap(
        short = 'T',
        long = "timestamp",
        value_name = "FILE",
        help = "Timestamp to verify, or `-` for stdin [default: <FILE>.atum-timestamp]"
    )]
    pub timestamp: Option<String>,

    #[clap(
        short = 't',
        long,
        value_name = "TIMEOUT",
        help = "Seconds to wait for the server's response",
        default_value_t = 10
    )]
    pub timeout: u16,
}
