//! Tessera node tool
//!
//! Drives the node-local privacy engine from the command line: generate
//! keys, seal files for recipients, open received payloads, and project or
//! inspect payloads before they are handed to a transport. A stored payload
//! can also be sealed for a recipient added after the fact.

#![forbid(unsafe_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use tessera_crypto::{EncryptorType, PublicKey};
use tessera_enclave::{EnclaveConfig, EncodedPayloadWithRecipients};

/// Tessera privacy engine
///
/// Seals one payload for many recipients and opens it on any of them.
#[derive(Parser, Debug)]
#[command(name = "tessera-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Log level or filter directives (e.g. `debug`, `info,tessera_enclave=trace`)
    #[arg(long, env = "TESSERA_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "TESSERA_LOG_FORMAT", default_value = "plain", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and print it as configuration
    Keygen {
        /// Encryptor the configuration selects
        #[arg(long, default_value = "nacl")]
        encryptor: EncryptorType,
    },

    /// Seal a file for a set of recipients
    Encrypt {
        /// Enclave configuration file
        #[arg(short, long, env = "TESSERA_CONFIG")]
        config: PathBuf,

        /// Plaintext input file
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the encoded payload
        #[arg(short, long)]
        output: PathBuf,

        /// Base64 sender key (defaults to the first configured key)
        #[arg(long)]
        sender: Option<String>,

        /// Base64 recipient key (repeatable)
        #[arg(short, long = "recipient", required = true)]
        recipients: Vec<String>,
    },

    /// Open an encoded payload
    Decrypt {
        /// Enclave configuration file
        #[arg(short, long, env = "TESSERA_CONFIG")]
        config: PathBuf,

        /// Encoded payload input file
        #[arg(short, long)]
        input: PathBuf,

        /// Base64 key: a local key, or the payload's sender
        #[arg(short, long)]
        key: String,

        /// Where to write the plaintext (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep only one recipient's box of an encoded payload
    Project {
        /// Encoded payload input file
        #[arg(short, long)]
        input: PathBuf,

        /// Base64 recipient key
        #[arg(short, long)]
        recipient: String,

        /// Where to write the projected payload
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Seal a stored payload for one more recipient
    AddRecipient {
        /// Enclave configuration file (must hold the payload's sender key)
        #[arg(short, long, env = "TESSERA_CONFIG")]
        config: PathBuf,

        /// Encoded payload input file, with recipient keys
        #[arg(short, long)]
        input: PathBuf,

        /// Base64 key of the new recipient
        #[arg(short, long)]
        recipient: String,

        /// Where to write the extended payload
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Describe an encoded payload without opening it
    Inspect {
        /// Encoded payload input file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn log_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log level or filter: {}", log_level))
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(log_filter(log_level)?)
        .with_writer(std::io::stderr);

    let installed = match log_format.to_lowercase().as_str() {
        "json" => tracing::subscriber::set_global_default(
            builder
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish(),
        ),
        "plain" => tracing::subscriber::set_global_default(
            builder
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        ),
        other => anyhow::bail!("Unknown log format: {}", other),
    };

    installed.context("Failed to set subscriber")
}

fn parse_key(text: &str, what: &str) -> Result<PublicKey> {
    PublicKey::from_base64(text).with_context(|| format!("Invalid {} key", what))
}

fn read_payload(path: &Path) -> Result<EncodedPayloadWithRecipients> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read payload {}", path.display()))?;
    EncodedPayloadWithRecipients::from_bytes(&bytes)
        .with_context(|| format!("Failed to decode payload {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Explicit recipients first, then forwarding keys, each key once.
fn recipient_list(explicit: Vec<PublicKey>, forwarding: Vec<PublicKey>) -> Vec<PublicKey> {
    let mut recipients: Vec<PublicKey> = Vec::with_capacity(explicit.len() + forwarding.len());
    for key in explicit.into_iter().chain(forwarding) {
        if !recipients.contains(&key) {
            recipients.push(key);
        }
    }
    recipients
}

fn keygen(encryptor: EncryptorType) -> Result<String> {
    let pair = encryptor.create().generate_new_keys();
    info!(key = %pair.public_key(), encryptor = %encryptor, "Generated key pair");

    EnclaveConfig::builder()
        .with_encryptor(encryptor)
        .with_key_pair(&pair)
        .build()
        .to_toml_string()
        .context("Failed to render configuration")
}

fn encrypt(
    config: &Path,
    input: &Path,
    output: &Path,
    sender: Option<&str>,
    recipients: &[String],
) -> Result<usize> {
    let config = EnclaveConfig::load(config)
        .with_context(|| format!("Failed to load configuration {}", config.display()))?;
    let enclave = config.build_enclave().context("Failed to build enclave")?;

    let sender = match sender {
        Some(text) => parse_key(text, "sender")?,
        None => enclave.default_public_key().clone(),
    };

    let explicit = recipients
        .iter()
        .map(|text| parse_key(text, "recipient"))
        .collect::<Result<Vec<_>>>()?;
    let forwarding = config
        .forwarding_public_keys()
        .context("Invalid forwarding keys")?;
    let recipients = recipient_list(explicit, forwarding);

    let message =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let payload = enclave
        .encrypt_payload(&message, &sender, &recipients)
        .context("Failed to encrypt payload")?;

    let bytes = payload.to_bytes().context("Failed to encode payload")?;
    write_file(output, &bytes)?;
    info!(
        recipients = recipients.len(),
        output = %output.display(),
        "Encrypted payload"
    );
    Ok(recipients.len())
}

fn decrypt(config: &Path, input: &Path, key: &str) -> Result<Vec<u8>> {
    let config = EnclaveConfig::load(config)
        .with_context(|| format!("Failed to load configuration {}", config.display()))?;
    let enclave = config.build_enclave().context("Failed to build enclave")?;

    let key = parse_key(key, "provided")?;
    let payload = read_payload(input)?;
    debug!(?payload, "Decoded payload");

    enclave
        .unencrypt_transaction(&payload, &key)
        .context("Failed to decrypt payload")
}

fn project(input: &Path, recipient: &str, output: &Path) -> Result<()> {
    let recipient = parse_key(recipient, "recipient")?;
    let payload = read_payload(input)?;

    let projected = payload
        .project_for(&recipient)
        .context("Failed to project payload")?;
    let bytes = projected.to_bytes().context("Failed to encode payload")?;
    write_file(output, &bytes)?;

    info!(output = %output.display(), "Projected payload");
    Ok(())
}

fn add_recipient(config: &Path, input: &Path, recipient: &str, output: &Path) -> Result<()> {
    let config = EnclaveConfig::load(config)
        .with_context(|| format!("Failed to load configuration {}", config.display()))?;
    let enclave = config.build_enclave().context("Failed to build enclave")?;

    let recipient = parse_key(recipient, "recipient")?;
    let payload = read_payload(input)?;

    let recipient_box = enclave
        .create_new_recipient_box(&payload, &recipient)
        .context("Failed to create recipient box")?;
    let extended = payload
        .with_recipient(recipient, recipient_box)
        .context("Failed to extend payload")?;

    let bytes = extended.to_bytes().context("Failed to encode payload")?;
    write_file(output, &bytes)?;
    info!(
        recipients = extended.recipient_keys().len(),
        output = %output.display(),
        "Added recipient"
    );
    Ok(())
}

fn inspect(input: &Path) -> Result<String> {
    let payload = read_payload(input)?;
    let inner = payload.payload();

    let mut report = String::new();
    report.push_str(&format!("sender_key = {}\n", inner.sender_key().to_base64()));
    report.push_str(&format!("cipher_text_len = {}\n", inner.cipher_text().len()));
    report.push_str(&format!(
        "recipient_boxes = {}\n",
        inner.recipient_boxes().len()
    ));
    for key in payload.recipient_keys() {
        report.push_str(&format!("recipient_key = {}\n", key.to_base64()));
    }
    Ok(report)
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Keygen { encryptor } => {
            print!("{}", keygen(encryptor)?);
        }
        Command::Encrypt {
            config,
            input,
            output,
            sender,
            recipients,
        } => {
            encrypt(&config, &input, &output, sender.as_deref(), &recipients)?;
        }
        Command::Decrypt {
            config,
            input,
            key,
            output,
        } => {
            let plaintext = decrypt(&config, &input, &key)?;
            match output {
                Some(path) => write_file(&path, &plaintext)?,
                None => std::io::stdout()
                    .write_all(&plaintext)
                    .context("Failed to write plaintext")?,
            }
        }
        Command::Project {
            input,
            recipient,
            output,
        } => {
            project(&input, &recipient, &output)?;
        }
        Command::AddRecipient {
            config,
            input,
            recipient,
            output,
        } => {
            add_recipient(&config, &input, &recipient, &output)?;
        }
        Command::Inspect { input } => {
            print!("{}", inspect(&input)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, &args.log_format)?;

    run(args.command).map_err(|err| {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        err
    })
}
