//! certflow CLI - retrieve, verify and share certificates.
//!
//! This binary drives the orchestration engine from the command line and
//! prints the session outcome.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use certflow_core::{
    CertflowConfig, CertflowEngine, CertflowError, Certificate, CertificateReference,
    VerificationOutcome,
};
use certflow_crypto::{decrypt_string, encrypt_string, EncryptedDocument};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// certflow - certificate retrieval and verification.
///
/// Fetches a (possibly encrypted) certificate, runs it through the
/// verification engine and reports which checks failed, in order:
/// tampered, not issued, revoked, unregistered issuer.
#[derive(Parser)]
#[command(name = "certflow")]
#[command(version = VERSION)]
#[command(about = "Certificate retrieval and verification")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve and verify a certificate
    Verify {
        /// Certificate location
        #[arg(long)]
        uri: String,

        /// Hex decryption key
        #[arg(long)]
        key: Option<String>,
    },

    /// Verify a certificate stored in a local file
    VerifyFile {
        /// Path to the certificate JSON
        path: PathBuf,
    },

    /// Retrieve and verify the certificate named by an action request
    Action {
        /// Action JSON, e.g. {"type":"DOCUMENT","payload":{"uri":"..."}}
        action: String,
    },

    /// Retrieve a certificate and email it
    Send {
        /// Certificate location
        #[arg(long)]
        uri: String,

        /// Hex decryption key
        #[arg(long)]
        key: Option<String>,

        /// Recipient address
        #[arg(long)]
        email: String,

        /// Captcha token
        #[arg(long)]
        captcha: String,
    },

    /// Retrieve a certificate and create a share link
    Share {
        /// Certificate location
        #[arg(long)]
        uri: String,

        /// Hex decryption key
        #[arg(long)]
        key: Option<String>,
    },

    /// Encrypt a certificate file into an envelope
    Encrypt {
        /// Path to the certificate JSON
        path: PathBuf,

        /// Hex key to use instead of a fresh one
        #[arg(long)]
        key: Option<String>,
    },

    /// Decrypt an envelope file
    Decrypt {
        /// Path to the envelope JSON
        path: PathBuf,

        /// Hex decryption key
        #[arg(long)]
        key: String,
    },
}

fn load_config(path: Option<&Path>) -> Result<CertflowConfig, CertflowError> {
    match path {
        Some(path) => CertflowConfig::from_json_file(path),
        None => Ok(CertflowConfig::default()),
    }
}

fn read_file(path: &Path) -> Result<String, CertflowError> {
    std::fs::read_to_string(path).map_err(|e| CertflowError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })
}

fn parse_json(path: &Path, raw: &str) -> Result<Value, CertflowError> {
    serde_json::from_str(raw).map_err(|e| CertflowError::Config {
        message: format!("{} is not valid JSON: {}", path.display(), e),
    })
}

fn reference(uri: String, key: Option<String>) -> CertificateReference {
    CertificateReference { uri, key }
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn print_outcome(outcome: &VerificationOutcome, json_output: bool) {
    if json_output {
        print_json(&json!({
            "valid": outcome.classification.valid,
            "categories": outcome.classification.categories,
            "fragments": outcome.report,
        }));
        return;
    }

    println!("\nVERIFICATION RESULT");
    println!("===================\n");
    if outcome.is_valid() {
        println!("  Status: \x1b[32mVALID\x1b[0m");
        return;
    }

    println!("  Status: \x1b[31mINVALID\x1b[0m\n");
    for (index, category) in outcome.classification.categories.iter().enumerate() {
        let marker = if index == 0 { "*" } else { "-" };
        println!("  {} {}", marker, category.title());
        println!("    {}", category.message());
    }
    println!();
    println!("  Fragments:");
    for fragment in outcome.report.fragments() {
        println!(
            "    {:<48} {:?} {:?}",
            fragment.name, fragment.check, fragment.status
        );
    }
}

async fn run(cli: Cli) -> Result<(), CertflowError> {
    let json_output = cli.format == "json";
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify { uri, key } => {
            let engine = CertflowEngine::new(config)?;
            let outcome = engine.retrieve_certificate(reference(uri, key)).await?;
            print_outcome(&outcome, json_output);
        },
        Commands::VerifyFile { path } => {
            let raw = read_file(&path)?;
            let document = parse_json(&path, &raw)?;
            let engine = CertflowEngine::new(config)?;
            let outcome = engine.load_certificate(Certificate::new(document)).await?;
            print_outcome(&outcome, json_output);
        },
        Commands::Action { action } => {
            let reference = CertificateReference::from_action_str(&action)?;
            let engine = CertflowEngine::new(config)?;
            let outcome = engine.retrieve_certificate(reference).await?;
            print_outcome(&outcome, json_output);
        },
        Commands::Send {
            uri,
            key,
            email,
            captcha,
        } => {
            let engine = CertflowEngine::new(config)?;
            engine.retrieve_certificate(reference(uri, key)).await?;
            engine.send_certificate(&email, &captcha).await?;
            if json_output {
                print_json(&json!({ "sent": true, "to": email }));
            } else {
                println!("Certificate sent to {}", email);
            }
        },
        Commands::Share { uri, key } => {
            let engine = CertflowEngine::new(config)?;
            engine.retrieve_certificate(reference(uri, key)).await?;
            let link = engine.generate_share_link().await?;
            let resolved = engine.share_reference(&link);
            if json_output {
                print_json(&json!({ "link": link, "reference": resolved }));
            } else {
                println!("Share link: {}", link.as_value());
                if let Some(resolved) = resolved {
                    match resolved.key {
                        Some(key) => println!(
                            "  Retrieve with: certflow verify --uri {} --key {}",
                            resolved.uri, key
                        ),
                        None => println!("  Retrieve with: certflow verify --uri {}", resolved.uri),
                    }
                }
            }
        },
        Commands::Encrypt { path, key } => {
            let raw = read_file(&path)?;
            // Normalize to compact JSON before encrypting.
            let document = parse_json(&path, &raw)?.to_string();
            let result = encrypt_string(&document, key.as_deref())?;
            print_json(&json!(result));
        },
        Commands::Decrypt { path, key } => {
            let raw = read_file(&path)?;
            let envelope: EncryptedDocument =
                serde_json::from_value(parse_json(&path, &raw)?).map_err(|e| {
                    CertflowError::Config {
                        message: format!("{} is not an encrypted envelope: {}", path.display(), e),
                    }
                })?;
            let plaintext = decrypt_string(&envelope, &key)?;
            match serde_json::from_str::<Value>(&plaintext) {
                Ok(document) => print_json(&document),
                Err(_) => println!("{}", plaintext),
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_output = cli.format == "json";

    // Initialize logging (errors only for JSON output)
    if json_output {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json_output {
                print_json(&json!({ "error": e.to_string() }));
            } else {
                eprintln!("\x1b[31mError:\x1b[0m {}", e);
            }
            ExitCode::FAILURE
        },
    }
}
