//! Label Engine Command Line Interface
//!
//! Drives the label engine over JSON files: an invoice record as exported by
//! the document store, and the volume collection the caller keeps between
//! steps.
//!
//! # Usage
//!
//! ```bash
//! # Generate 3 volumes for invoice 417536
//! label_cli generate --invoice 417536 --count 3 --invoice-file nf.json --out volumes.json
//!
//! # Print (asks for --confirm when printed volumes of another batch exist)
//! label_cli print --volumes volumes.json --volume-id NF417536-001-11082025-2313 --confirm
//!
//! # Reprint a single volume on the partner layout
//! label_cli reprint --volumes volumes.json --volume-id NF417536-002-11082025-2313 --layout transul_enhanced
//!
//! # Link volumes to a pallet label and print it
//! label_cli link --volumes volumes.json --parent PAL-1 --ids NF417536-001-11082025-2313,NF417536-002-11082025-2313
//! label_cli parent-print --volumes volumes.json --parent PAL-1 --kind pallet
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use wms_labels::{
    CargoKind, ConfigLoader, FormatSpec, GenerateRequest, InvoiceData, LabelEngine, LabelSink,
    LocalLabelSink, ParentLabel, ParentLabelKind, PrintJob, PrintValidationResult, Volume,
};

#[derive(Parser)]
#[command(name = "label_cli")]
#[command(version = "0.1.0")]
#[command(about = "Receiving label engine: generate, link and print volume labels")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding label_engine.yaml
    #[arg(long, global = true, env = "WMS_LABELS_CONFIG_DIR")]
    config_dir: Option<String>,

    /// Directory print jobs are written to
    #[arg(long, global = true, default_value = "print_jobs")]
    jobs_dir: PathBuf,

    /// Output format: json or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(clap::Args, Clone)]
struct FormatArgs {
    /// Paper format passed to the renderer (e.g. 50x100, A4)
    #[arg(long)]
    paper: Option<String>,

    /// Layout style (e.g. enhanced, transul_enhanced)
    #[arg(long)]
    layout: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a batch of volumes for an invoice
    Generate {
        /// Invoice number (taken from the invoice file when omitted)
        #[arg(long)]
        invoice: Option<String>,

        #[arg(long, short = 'n', allow_hyphen_values = true)]
        count: i64,

        /// Invoice record (JSON) from the document store
        #[arg(long)]
        invoice_file: Option<PathBuf>,

        /// Gross weight, e.g. "12,50 Kg"
        #[arg(long)]
        weight: Option<String>,

        #[arg(long, default_value = "general")]
        cargo_kind: String,

        #[arg(long)]
        un_number: Option<String>,

        #[arg(long)]
        risk_code: Option<String>,

        /// Fill a missing risk code from the hazmat catalog
        #[arg(long)]
        complete_hazmat: bool,

        #[arg(long, default_value = "01")]
        area: String,

        /// Existing collection to append to
        #[arg(long)]
        volumes: Option<PathBuf>,

        /// Where to write the collection (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print every volume of the selected volume's invoice
    Print {
        #[arg(long)]
        volumes: PathBuf,

        #[arg(long)]
        volume_id: String,

        #[arg(long)]
        invoice_file: Option<PathBuf>,

        /// Print even when printed volumes from another batch exist
        #[arg(long)]
        confirm: bool,

        #[command(flatten)]
        format_args: FormatArgs,
    },

    /// Reprint a single volume
    Reprint {
        #[arg(long)]
        volumes: PathBuf,

        #[arg(long)]
        volume_id: String,

        #[arg(long)]
        invoice_file: Option<PathBuf>,

        #[command(flatten)]
        format_args: FormatArgs,
    },

    /// Link volumes to a parent label
    Link {
        #[arg(long)]
        volumes: PathBuf,

        #[arg(long)]
        parent: String,

        /// Comma-separated volume ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
    },

    /// Print a parent label; without --volumes a standalone label is created
    ParentPrint {
        #[arg(long)]
        volumes: Option<PathBuf>,

        /// Parent label id (generated when omitted)
        #[arg(long)]
        parent: Option<String>,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "general")]
        kind: String,

        #[command(flatten)]
        format_args: FormatArgs,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::new(dir.clone()),
        None => ConfigLoader::from_env(),
    };
    let mut engine = LabelEngine::from_loader(&loader)?;
    let sink = LocalLabelSink::new(&cli.jobs_dir);
    let output = cli.format;

    match cli.command {
        Commands::Generate {
            invoice,
            count,
            invoice_file,
            weight,
            cargo_kind,
            un_number,
            risk_code,
            complete_hazmat,
            area,
            volumes,
            out,
        } => {
            let invoice_data = read_invoice(invoice_file.as_deref())?;
            let invoice_number = invoice
                .or_else(|| {
                    invoice_data
                        .as_ref()
                        .and_then(|i| i.invoice_number().map(str::to_string))
                })
                .unwrap_or_default();
            let cargo_kind: CargoKind = cargo_kind.parse()?;

            let mut request = GenerateRequest::new(invoice_number, count);
            request.gross_weight = weight.unwrap_or_default();
            request.cargo_kind = cargo_kind;
            request.area = area;
            if complete_hazmat {
                let profile = engine.complete_hazard(wms_labels::HazardProfile::from_cargo(
                    cargo_kind,
                    un_number.as_deref(),
                    risk_code.as_deref(),
                ));
                request.un_number = Some(profile.un_number);
                request.risk_code = Some(profile.risk_code);
            } else {
                request.un_number = un_number;
                request.risk_code = risk_code;
            }

            let mut collection = match volumes {
                Some(path) => read_volumes(&path)?,
                None => Vec::new(),
            };
            let batch = engine.generate_batch(&request, invoice_data.as_ref(), &collection)?;

            if output == OutputFormat::Pretty {
                eprintln!(
                    "{} Generated {} volume(s) for invoice {}",
                    "OK".green(),
                    batch.len(),
                    request.invoice_number.trim()
                );
                for volume in &batch {
                    eprintln!("  {}  {}", volume.id.bold(), volume.description);
                }
            }
            collection.extend(batch);
            write_volumes(out.as_deref(), &collection)
        }

        Commands::Print {
            volumes,
            volume_id,
            invoice_file,
            confirm,
            format_args,
        } => {
            let collection = read_volumes(&volumes)?;
            let invoice_data = read_invoice(invoice_file.as_deref())?;
            let format = format_spec(&engine, &format_args);
            let volume = find_volume(&collection, &volume_id)?;

            let invoice_ref = invoice_data.as_ref();
            let outcome = match engine.request_print(&volume, &collection, invoice_ref, &format) {
                PrintValidationResult::Printed(outcome) => outcome,
                PrintValidationResult::NeedsConfirmation {
                    pending,
                    existing_volumes_count,
                } => {
                    if !confirm {
                        eprintln!(
                            "{} {} printed volume(s) already exist for invoice {}; \
                             rerun with --confirm",
                            "WARN".yellow().bold(),
                            existing_volumes_count,
                            pending.invoice_number
                        );
                        return Ok(());
                    }
                    engine.confirm_print(&pending, &collection, invoice_ref, &format)
                }
            };

            submit(&sink, &outcome.job, output).await?;
            write_volumes(Some(volumes.as_path()), &outcome.volumes)
        }

        Commands::Reprint {
            volumes,
            volume_id,
            invoice_file,
            format_args,
        } => {
            let collection = read_volumes(&volumes)?;
            let invoice_data = read_invoice(invoice_file.as_deref())?;
            let format = format_spec(&engine, &format_args);

            let outcome =
                engine.reprint_single(&volume_id, &collection, invoice_data.as_ref(), &format)?;
            submit(&sink, &outcome.job, output).await?;
            write_volumes(Some(volumes.as_path()), &outcome.volumes)
        }

        Commands::Link { volumes, parent, ids } => {
            let collection = read_volumes(&volumes)?;
            let ids: HashSet<String> = ids.into_iter().map(|s| s.trim().to_string()).collect();
            let linked = engine.link_volumes(&parent, &ids, &collection);

            if output == OutputFormat::Pretty {
                eprintln!(
                    "{} {} volume(s) linked to {} ({})",
                    "OK".green(),
                    wms_labels::linkage::linked_count(&parent, &linked),
                    parent.bold(),
                    engine.parent_weight(&parent, &linked)
                );
            }
            write_volumes(Some(volumes.as_path()), &linked)
        }

        Commands::ParentPrint {
            volumes,
            parent,
            description,
            kind,
            format_args,
        } => {
            let kind: ParentLabelKind = kind.parse()?;
            let format = format_spec(&engine, &format_args);

            let print = match volumes {
                Some(path) => {
                    let collection = read_volumes(&path)?;
                    let invoice_number = parent
                        .as_deref()
                        .and_then(|id| collection.iter().find(|v| v.is_linked_to(id)))
                        .map(|v| v.invoice_number.clone())
                        .unwrap_or_default();
                    let label: ParentLabel = engine.create_parent_label(
                        parent.as_deref(),
                        &description,
                        kind,
                        &invoice_number,
                    )?;
                    engine.print_parent_label(&label, &collection, &format)
                }
                None => engine.create_and_print_parent_label(
                    parent.as_deref(),
                    &description,
                    kind,
                    &format,
                )?,
            };

            submit(&sink, &print.job, output).await?;
            if output == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&print.label)?);
            }
            Ok(())
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn format_spec(engine: &LabelEngine, args: &FormatArgs) -> FormatSpec {
    let default = engine.default_format();
    FormatSpec::new(
        args.paper.clone().unwrap_or_else(|| default.paper_format.clone()),
        args.layout.clone().unwrap_or_else(|| default.layout_style.clone()),
    )
}

fn find_volume(collection: &[Volume], volume_id: &str) -> Result<Volume> {
    collection
        .iter()
        .find(|v| v.id == volume_id)
        .cloned()
        .with_context(|| format!("Volume {} not found in collection", volume_id))
}

fn read_invoice(path: Option<&Path>) -> Result<Option<InvoiceData>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(InvoiceData::from_json(value)?))
}

fn read_volumes(path: &Path) -> Result<Vec<Volume>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_volumes(path: Option<&Path>, volumes: &[Volume]) -> Result<()> {
    let json = serde_json::to_string_pretty(volumes)?;
    match path {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

async fn submit(sink: &impl LabelSink, job: &PrintJob, output: OutputFormat) -> Result<()> {
    let job_ref = sink.submit(job).await?;
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job.job_id,
                "job_ref": job_ref,
                "labels": job.label_count(),
                "carrier": job.header.carrier,
            }))?
        ),
        OutputFormat::Pretty => eprintln!(
            "{} {} label(s) sent to {} (carrier: {})",
            "OK".green(),
            job.label_count(),
            job_ref,
            job.header.carrier
        ),
    }
    Ok(())
}
