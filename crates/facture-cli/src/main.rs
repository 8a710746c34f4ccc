//! Facture CLI - invoice generation tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facture::prelude::*;
use facture::{generate_batch, generate_invoice, safe_filename};
use facture_pdf::PdfRenderer;
use facture_server::ServerConfig;
use facture_tunnel::{TunnelConfig, TunnelSupervisor};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facture")]
#[command(
    author,
    version,
    about = "Generate Excel invoices from a template workbook"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the template interactively and write one invoice
    Generate {
        /// Template workbook (xlsx, xlsm, xls)
        #[arg(short, long, default_value = "template.xlsx")]
        template: PathBuf,

        /// Directory for generated files
        #[arg(short, long, default_value = "uploads")]
        output_dir: PathBuf,
    },

    /// Run every job in a JSON job file against the template
    Batch {
        /// Job file: a JSON array of {output_name, invoice?, changes?}
        jobs: PathBuf,

        /// Template workbook (xlsx, xlsm, xls)
        #[arg(short, long, default_value = "template.xlsx")]
        template: PathBuf,

        /// Directory for generated files
        #[arg(short, long, default_value = "uploads")]
        output_dir: PathBuf,
    },

    /// Serve the invoice API over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Template workbook (xlsx, xlsm, xls)
        #[arg(short, long, default_value = "template.xlsx")]
        template: PathBuf,

        /// Directory for generated files
        #[arg(short, long, default_value = "uploads")]
        output_dir: PathBuf,
    },

    /// Expose the server through a Cloudflare quick tunnel
    Tunnel {
        /// Port the spawned server listens on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// cloudflared binary
        #[arg(short, long, default_value = "./cloudflared")]
        binary: PathBuf,

        /// Template workbook, passed through to the spawned server
        #[arg(short, long, default_value = "template.xlsx")]
        template: PathBuf,

        /// Output directory, passed through to the spawned server
        #[arg(short, long, default_value = "uploads")]
        output_dir: PathBuf,
    },

    /// Convert a generated workbook to PDF
    Pdf {
        /// Workbook to convert
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            template,
            output_dir,
        } => generate(&template, &output_dir).await,
        Commands::Batch {
            jobs,
            template,
            output_dir,
        } => run_batch(&jobs, &template, &output_dir),
        Commands::Serve {
            port,
            template,
            output_dir,
        } => serve(port, template, output_dir).await,
        Commands::Tunnel {
            port,
            binary,
            template,
            output_dir,
        } => tunnel(port, binary, &template, &output_dir).await,
        Commands::Pdf { input, out_dir } => convert_pdf(&input, out_dir).await,
    }
}

async fn generate(template_path: &Path, output_dir: &Path) -> Result<()> {
    // Load the template before asking anything, so a bad path fails fast
    let template = Template::open(template_path)
        .with_context(|| format!("Failed to open '{}'", template_path.display()))?;

    println!("{}", "=".repeat(50));
    println!("Excel Template Generator");
    println!("{}", "=".repeat(50));

    let output_name = prompt("\nEnter output filename (e.g., output.xlsx): ")?;

    let mut payload = InvoicePayload {
        company_name: prompt("Enter company name (A12): ")?,
        sakadastro: prompt("Enter sakadastro (A13): ")?,
        address: prompt("Enter address (A14): ")?,
        invoice_number: prompt("Enter invoice number (D5): ")?,
        items: Vec::new(),
    };

    // Optional items, one template row each
    for row in 17..25 {
        if prompt(&format!("\nAdd item in row {row}? (y/n): "))?.to_lowercase() != "y" {
            break;
        }
        let item_type = prompt(&format!("  Type (A{row}): "))?;
        if item_type.is_empty() {
            break;
        }
        let quantity = prompt(&format!("  Quantity (B{row}): "))?;
        let price = prompt(&format!("  Price (C{row}): "))?;

        println!("  Added: {item_type}");
        payload.items.push(InvoiceItem {
            item_type,
            quantity: amount_input(&quantity),
            price: amount_input(&price),
        });
    }

    println!("\nEnter additional cell changes (optional, format: CELL=VALUE)");
    println!("Press Enter twice to finish:");

    let mut changes = ChangeSet::new();
    loop {
        let line = prompt("")?;
        if line.is_empty() {
            break;
        }
        match ChangeSet::parse_assignment(&line) {
            Ok((address, value)) => {
                println!("  Added: {address} = {value}");
                changes.set_at(address, value);
            }
            Err(_) => println!("  Invalid format. Use CELL=VALUE (e.g., A1=Hello)"),
        }
    }

    let generated =
        generate_invoice(&template, &payload, &changes).context("Failed to generate the invoice")?;
    let writer = OutputWriter::new(output_dir).guard_template(template_path);
    let excel_path = writer
        .write(&generated, &output_name)
        .with_context(|| format!("Failed to write '{output_name}'"))?;
    println!("\nExcel file generated: {}", excel_path.display());

    if prompt("\nGenerate PDF from the Excel file? (y/n): ")?.to_lowercase() == "y" {
        let custom = prompt("Enter PDF filename (leave empty for auto-generated name): ")?;
        let renderer = PdfRenderer::new();
        let mut pdf_path = renderer
            .render(&excel_path, output_dir)
            .await
            .context("Failed to convert to PDF")?;
        if !custom.is_empty() {
            let target = output_dir.join(pdf_name(&custom));
            std::fs::rename(&pdf_path, &target)
                .with_context(|| format!("Failed to rename the PDF to '{}'", target.display()))?;
            pdf_path = target;
        }
        println!("PDF file generated: {}", pdf_path.display());
    }

    Ok(())
}

fn run_batch(jobs_path: &Path, template_path: &Path, output_dir: &Path) -> Result<()> {
    let template = Template::open(template_path)
        .with_context(|| format!("Failed to open '{}'", template_path.display()))?;
    let body = std::fs::read_to_string(jobs_path)
        .with_context(|| format!("Failed to read '{}'", jobs_path.display()))?;
    let jobs: Vec<BatchJob> = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse '{}'", jobs_path.display()))?;

    let writer = OutputWriter::new(output_dir).guard_template(template_path);
    let report = generate_batch(&template, &writer, &jobs);

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(path) => println!("ok\t{}\t{}", outcome.output_name, path.display()),
            Err(e) => println!("failed\t{}\t{}", outcome.output_name, e),
        }
    }
    eprintln!("{} of {} jobs succeeded", report.succeeded(), report.len());

    if report.failed() > 0 {
        bail!("{} of {} jobs failed", report.failed(), report.len());
    }
    Ok(())
}

async fn serve(port: u16, template: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = ServerConfig {
        template_path: template,
        output_dir,
        port,
        ..ServerConfig::default()
    };
    facture_server::run(config).await.context("Server failed")
}

async fn tunnel(port: u16, binary: PathBuf, template: &Path, output_dir: &Path) -> Result<()> {
    let config = TunnelConfig {
        binary,
        port,
        server_args: vec![
            "--template".into(),
            template.display().to_string(),
            "--output-dir".into(),
            output_dir.display().to_string(),
        ],
        ..TunnelConfig::default()
    };
    let supervisor = TunnelSupervisor::start(config)
        .await
        .context("Failed to start the tunnel")?;

    match supervisor.public_url() {
        Some(url) => println!("Public URL: {url}"),
        None => println!(
            "No public URL detected yet; check cloudflared.log for the \
             https://*.trycloudflare.com line."
        ),
    }
    println!("Press Ctrl-C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;
    supervisor.shutdown().await.context("Shutdown failed")
}

async fn convert_pdf(input: &Path, out_dir: Option<PathBuf>) -> Result<()> {
    if !input.is_file() {
        bail!("Excel file not found: {}", input.display());
    }

    let dir = match out_dir {
        Some(dir) => dir,
        None => {
            let parent = input.parent().unwrap_or(Path::new("."));
            if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            }
        }
    };

    let renderer = PdfRenderer::new();
    let pdf = renderer
        .render(input, &dir)
        .await
        .with_context(|| format!("Failed to convert '{}'", input.display()))?;
    println!("{}", pdf.display());
    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read stdin")?;
    Ok(line.trim().to_string())
}

/// Empty or non-numeric answers leave the cell blank, matching the
/// optional amounts of the web form.
fn amount_input(raw: &str) -> Option<NumberInput> {
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(NumberInput::Number(n)),
        _ => None,
    }
}

/// Sanitized PDF filename carrying exactly one `.pdf` extension.
fn pdf_name(raw: &str) -> String {
    let name = safe_filename(raw);
    if name.to_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{name}.pdf")
    }
}
