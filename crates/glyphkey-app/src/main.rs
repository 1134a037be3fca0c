//! Glyphkey command-line front end.
//!
//! # Usage
//!
//! ```bash
//! # Dispatch decoded QR payloads, one per line, from a QR decoder
//! zbarcam --raw | glyphkey scan
//!
//! # Start a 256-bit ECDH request, then wait for the response payload
//! glyphkey scan --initiate 256 --partner Bob --stop-after-first-key
//!
//! # Type a code by hand: selector block first, then the key blocks
//! glyphkey manual
//!
//! # Show which key an encrypted file needs
//! glyphkey inspect report.pdf.enc
//! ```

use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use glyphkey_app::{
    Bridge, CaptureSender, Display, DisplayAction, Runtime, RuntimeConfig, SystemEnv, TextDisplay,
    capture_channel,
};
use glyphkey_codec::{
    BLOCK_CHECK_SYMBOLS, BLOCK_DATA_SYMBOLS, Block, BlockState, CodecError, GroupState,
};
use glyphkey_core::{
    EcdhWidth, EncryptedFileHeader, ManualEntry, MemoryKeyStore, file_header::HEADER_LEN,
    is_encrypted_path,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Glyphkey key exchange
#[derive(Parser, Debug)]
#[command(name = "glyphkey")]
#[command(about = "Exchange session keys by QR code or typed blocks")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch decoded QR payloads, one per line
    Scan {
        /// Read payloads from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Start an ECDH request of this width before scanning
        #[arg(long, value_enum)]
        initiate: Option<Width>,

        /// Partner label for an initiated request
        #[arg(long, default_value = "Remote")]
        partner: String,

        /// Stop after the first payload that stored a key
        #[arg(long)]
        stop_after_first_key: bool,

        /// Capacity of the capture channel
        #[arg(long, default_value = "16")]
        channel_capacity: usize,
    },

    /// Enter a code block by block on stdin
    Manual,

    /// Print the key identity of an encrypted file
    Inspect {
        /// Encrypted file
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Width {
    #[value(name = "256")]
    W256,
    #[value(name = "512")]
    W512,
}

impl From<Width> for EcdhWidth {
    fn from(width: Width) -> Self {
        match width {
            Width::W256 => Self::W256,
            Width::W512 => Self::W512,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.command {
        Command::Scan { input, initiate, partner, stop_after_first_key, channel_capacity } => {
            let config = RuntimeConfig {
                channel_capacity,
                stop_after_first_key,
                ..RuntimeConfig::default()
            };
            scan(config, input, initiate.map(EcdhWidth::from), &partner).await
        },
        Command::Manual => manual().await,
        Command::Inspect { file } => inspect(file).await,
    }
}

async fn scan(
    config: RuntimeConfig,
    input: Option<PathBuf>,
    initiate: Option<EcdhWidth>,
    partner: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = capture_channel(config.channel_capacity);
    let display = TextDisplay::new(std::io::stdout());
    let mut runtime = Runtime::new(SystemEnv::new(), MemoryKeyStore::new(), display, config);

    if let Some(width) = initiate {
        let request = runtime.bridge_mut().initiate(width, partner)?;
        tracing::info!(session_id = %request.session_id, "request initiated");
        runtime.display_mut().show(&DisplayAction::ShowRequest { request });
    }

    let capture = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path).await?;
            tokio::spawn(read_lines(file, tx))
        },
        None => tokio::spawn(read_lines(tokio::io::stdin(), tx)),
    };

    let summary = runtime.run(rx).await?;
    capture.abort();

    tracing::info!(
        payloads = summary.payloads,
        duplicates = summary.duplicates,
        stored = summary.stored_payloads,
        errors = summary.reported_errors,
        "scan finished"
    );
    Ok(())
}

/// Capture task: forward each non-empty line as a payload.
async fn read_lines<R: AsyncRead + Unpin>(source: R, tx: CaptureSender) {
    let mut lines = BufReader::new(source).lines();
    loop {
        let item = match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => Ok(line),
            Ok(None) => break,
            Err(err) => Err(err.into()),
        };
        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            break;
        }
    }
}

async fn manual() -> Result<(), Box<dyn std::error::Error>> {
    let mut display = TextDisplay::new(std::io::stdout());
    let mut bridge = Bridge::new(SystemEnv::new(), MemoryKeyStore::new(), &RuntimeConfig::default());
    let mut entry = ManualEntry::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_block = 0;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if entry.session_id().is_none() {
            match entry.update_selector(text) {
                Ok(BlockState::Valid) => {
                    tracing::info!(blocks = ?entry.block_count(), "selector accepted");
                },
                Ok(state) => {
                    let reason = block_defect(text);
                    tracing::warn!(?state, %reason, "selector block not valid, retype it");
                },
                Err(err) => tracing::warn!(error = %err, "selector rejected"),
            }
            continue;
        }

        match entry.update_block(next_block, text) {
            Ok(GroupState::Valid) => {
                let Some((session_id, key_text)) = entry.completed() else {
                    continue;
                };
                for action in bridge.handle_manual(session_id, key_text) {
                    display.show(&action);
                }
                entry.reset();
                next_block = 0;
            },
            Ok(GroupState::AggregateMismatch) => {
                tracing::warn!("aggregate does not match, retype from the first block");
                next_block = 0;
            },
            Ok(GroupState::Incomplete { .. }) => {
                let valid = entry
                    .group()
                    .and_then(|group| group.block(next_block))
                    .is_some_and(Block::is_valid);
                if valid {
                    next_block += 1;
                } else {
                    tracing::warn!(
                        block = next_block,
                        reason = %block_defect(text),
                        "block not valid, retype it"
                    );
                }
            },
            Err(err) => tracing::warn!(block = next_block, error = %err, "block rejected"),
        }
    }

    Ok(())
}

/// Why a typed block is not valid.
fn block_defect(text: &str) -> String {
    match Block::parse(text, BLOCK_DATA_SYMBOLS, BLOCK_CHECK_SYMBOLS) {
        Err(CodecError::InvalidLength { expected, actual }) if actual < expected => {
            "incomplete".to_owned()
        },
        Err(err) => err.to_string(),
        Ok(_) => "valid".to_owned(),
    }
}

async fn inspect(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !is_encrypted_path(&path) {
        tracing::warn!(path = %path.display(), "file does not carry the encrypted extension");
    }

    let mut file = tokio::fs::File::open(&path).await?;
    let mut bytes = [0u8; HEADER_LEN];
    file.read_exact(&mut bytes).await?;

    let header = EncryptedFileHeader::parse(&bytes)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "key id: {}", header.key_id())?;
    match header.session_id() {
        Ok(session_id) => writeln!(out, "session type: {:?}", session_id.session_type())?,
        Err(err) => writeln!(out, "session type: unknown ({err})")?,
    }
    Ok(())
}
