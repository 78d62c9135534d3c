//! PassForge CLI - Bridge interface for build scripts
//!
//! Commands: validate, images, manifest
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use passforge::{DigestAlgorithm, Localizations, Pass, PassError, PassImages, PassOptions};

#[derive(Parser)]
#[command(name = "passforge-cli")]
#[command(about = "PassForge CLI - Signed Wallet Pass Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Accept http:// web service URLs
    #[arg(long, global = true)]
    allow_http: bool,

    /// Manifest digest (sha1 or sha256)
    #[arg(long, global = true, default_value = "sha1")]
    digest: DigestAlgorithm,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pass directory (pass.json plus images)
    Validate {
        dir: PathBuf,
    },

    /// List the images recognised in a pass directory
    Images {
        dir: PathBuf,
    },

    /// Print the manifest that would be signed
    Manifest {
        dir: PathBuf,

        /// Serial number override, or "auto" for a fresh UUID
        #[arg(long)]
        serial_number: Option<String>,
    },
}

fn load_pass(dir: &Path, options: PassOptions) -> Result<Pass, PassError> {
    let raw = fs::read_to_string(dir.join("pass.json"))?;
    let descriptor: serde_json::Value = serde_json::from_str(&raw)?;
    let mut images = PassImages::new();
    images.load(dir)?;
    Pass::from_json(&descriptor, &images, &Localizations::new(), options)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = PassOptions {
        allow_http: cli.allow_http,
        digest: cli.digest,
    };

    match cli.command {
        Commands::Validate { dir } => {
            let result = load_pass(&dir, options).and_then(|pass| pass.validate());
            match result {
                Ok(()) => {
                    println!("{}", serde_json::json!({"valid": true}));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("{}", serde_json::json!({"valid": false, "error": e.to_string()}));
                    ExitCode::from(2)  // Validation failure
                }
            }
        }

        Commands::Images { dir } => {
            let mut images = PassImages::new();
            if let Err(e) = images.load(&dir) {
                println!("{}", serde_json::json!({"success": false, "error": e.to_string()}));
                return ExitCode::FAILURE;
            }
            let listing: Vec<_> = images
                .iter()
                .map(|(path, entry)| serde_json::json!({
                    "path": path,
                    "type": entry.name.image_type,
                    "density": entry.name.density,
                    "locale": entry.name.locale,
                    "size": [entry.width, entry.height],
                }))
                .collect();
            println!("{}", serde_json::json!({"success": true, "images": listing}));
            ExitCode::SUCCESS
        }

        Commands::Manifest { dir, serial_number } => {
            let mut pass = match load_pass(&dir, options) {
                Ok(p) => p,
                Err(e) => {
                    println!("{}", serde_json::json!({"success": false, "error": e.to_string()}));
                    return ExitCode::FAILURE;
                }
            };

            match serial_number.as_deref() {
                Some("auto") => pass
                    .fields_mut()
                    .set_serial_number(&uuid::Uuid::new_v4().to_string()),
                Some(serial) => pass.fields_mut().set_serial_number(serial),
                None => {}
            }

            match pass.manifest() {
                Ok(contents) => {
                    let output = serde_json::json!({
                        "success": true,
                        "engineVersion": passforge::ENGINE_VERSION,
                        "serialNumber": pass.fields().serial_number(),
                        "manifest": contents.manifest,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", output);
                    ExitCode::from(2)  // Validation failure
                }
            }
        }
    }
}
