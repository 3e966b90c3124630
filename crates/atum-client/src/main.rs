//! The main client CLI

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::time::Duration;

use atum_client::args::{Args, Command, StampArgs, VerifyArgs};
use atum_client::{Client, Timestamp};
use atum_protocol::SignatureAlgorithm;
use clap::Parser;
use data_encoding::{BASE64, HEXLOWER};
use tracing::{debug, error, info};

/// Suffix appended to the stamped file's name when no output is given.
const TIMESTAMP_SUFFIX: &str = ".atum-timestamp";

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Client(#[from] atum_client::ClientError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("'{0}' is neither hex nor base64")]
    MalformedNonce(String),

    #[error("specify either --file or --nonce (see --help for details)")]
    NoInput,

    #[error("timestamp was set by '{actual}', not by '{expected}'")]
    WrongServer { expected: String, actual: String },
}

fn main() {
    let args = Args::parse();

    enable_logging(&args);
    debug!("command line: {:?}", args);

    let result = match &args.command {
        Command::Stamp(stamp_args) => stamp(stamp_args),
        Command::Verify(verify_args) => verify(verify_args),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(-1);
    }
}

fn stamp(args: &StampArgs) -> Result<(), CliError> {
    let client = Client::builder(&args.server)
        .timeout(Duration::from_secs(args.timeout as u64))
        .build();

    match (&args.file, &args.nonce) {
        (Some(path), None) => {
            let mut message = BufReader::new(File::open(path)?);
            let stamp = client.stamp_message(&mut message)?;

            let output = args
                .output
                .clone()
                .unwrap_or_else(|| format!("{path}{TIMESTAMP_SUFFIX}"));
            write_timestamp(&stamp, Some(&output))?;
            info!("wrote timestamp for '{path}' to '{output}'");
            Ok(())
        }
        (None, Some(encoded)) => {
            let nonce = decode_nonce(encoded)?;
            let mut request = atum_protocol::Request::new(nonce);
            request.time = args.time;
            request.preferred_sig_alg = args.alg.as_deref().map(SignatureAlgorithm::from);

            let stamp = client.send_request(request)?;
            write_timestamp(&stamp, args.output.as_deref())?;
            Ok(())
        }
        _ => Err(CliError::NoInput),
    }
}

fn verify(args: &VerifyArgs) -> Result<(), CliError> {
    let timestamp_path = match (&args.timestamp, &args.file) {
        (Some(path), _) => path.clone(),
        (None, Some(file)) => format!("{file}{TIMESTAMP_SUFFIX}"),
        (None, None) => return Err(CliError::NoInput),
    };

    let stamp: Timestamp = if timestamp_path == "-" {
        serde_json::from_reader(std::io::stdin().lock())?
    } else {
        serde_json::from_reader(BufReader::new(File::open(&timestamp_path)?))?
    };
    debug!("loaded timestamp from '{timestamp_path}': {}", stamp.sig);

    if let Some(server) = &args.server
        && !same_server(server, &stamp.server_url)
    {
        return Err(CliError::WrongServer {
            expected: server.clone(),
            actual: stamp.server_url,
        });
    }

    let client = Client::builder(&stamp.server_url)
        .timeout(Duration::from_secs(args.timeout as u64))
        .build();

    let valid = match (&args.file, &args.nonce) {
        (Some(path), None) => {
            let mut message = BufReader::new(File::open(path)?);
            client.verify_from(&stamp, &mut message)?
        }
        (None, Some(encoded)) => client.verify(&stamp, &decode_nonce(encoded)?)?,
        _ => return Err(CliError::NoInput),
    };

    if valid {
        info!(
            "timestamp is valid: set at {} by {}",
            stamp.time, stamp.server_url
        );
        Ok(())
    } else {
        error!("TIMESTAMP IS NOT VALID");
        std::process::exit(-1);
    }
}

/// Writes the timestamp as JSON to the given file, or to stdout.
fn write_timestamp(stamp: &Timestamp, output: Option<&str>) -> Result<(), CliError> {
    let json = serde_json::to_string(stamp)?;
    match output {
        Some(path) => File::create(path)?.write_all(json.as_bytes())?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Compares server URLs, ignoring a trailing slash on either side.
fn same_server(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// Accepts a nonce as hex or base64, or `-` to read raw bytes from stdin.
fn decode_nonce(encoded: &str) -> Result<Vec<u8>, CliError> {
    if encoded == "-" {
        let mut nonce = Vec::new();
        std::io::stdin().read_to_end(&mut nonce)?;
        return Ok(nonce);
    }

    HEXLOWER
        .decode(encoded.to_lowercase().as_bytes())
        .or_else(|_| BASE64.decode(encoded.as_bytes()))
        .map_err(|_| CliError::MalformedNonce(encoded.to_string()))
}


fn enable_logging(args: &Args) {
    let mut builder = tracing_subscriber::fmt().compact();

    if args.quiet {
        builder = builder.with_max_level(tracing::Level::ERROR);
    } else {
        match args.verbose {
            2.. => builder = builder.with_max_level(tracing::Level::TRACE),
            1 => builder = builder.with_max_level(tracing::Level::DEBUG),
            _ => builder = builder.with_max_level(tracing::Level::INFO),
        }
    }

    builder.init();
}
