//! docpane CLI - document page viewer

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docpane::{Docpane, DocumentKind, DocumentSession, JsonFormat, StyleMap, DEFAULT_ROWS_PER_PAGE};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docpane")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Render PDF, DOCX and XLSX files as pages of HTML", long_about = None)]
struct Cli {
    /// Input file (shows the first page)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the markup of one page
    Show {
        #[command(flatten)]
        session: SessionArgs,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document information
    Info {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Write every page to its own HTML file
    Export {
        #[command(flatten)]
        session: SessionArgs,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print the session state as JSON
    Json {
        #[command(flatten)]
        session: SessionArgs,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

/// Options shared by every command that opens a file.
#[derive(Args)]
struct SessionArgs {
    /// Input file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Declared MIME type (guessed from the file if not specified)
    #[arg(long = "type", value_name = "MIME")]
    mime: Option<String>,

    /// Spreadsheet rows per page
    #[arg(long, env = "DOCPANE_ROWS_PER_PAGE", default_value_t = DEFAULT_ROWS_PER_PAGE)]
    rows_per_page: usize,

    /// Extra DOCX style rules, one per line
    #[arg(long, value_name = "FILE")]
    style_map: Option<PathBuf>,
}

impl SessionArgs {
    fn open(&self) -> Result<DocumentSession, Box<dyn std::error::Error>> {
        let mut builder = Docpane::new().with_rows_per_page(self.rows_per_page);
        if let Some(path) = &self.style_map {
            let rules = StyleMap::parse(&fs::read_to_string(path)?)?;
            log::debug!("Loaded {} style rules from {}", rules.len(), path.display());
            builder = builder.with_style_rules(rules);
        }
        if let Some(mime) = &self.mime {
            builder = builder.with_declared_type(mime.clone());
        }

        Ok(builder.open(&self.input)?)
    }

    /// Open the file and fail if it could not be processed.
    fn open_ready(&self) -> Result<DocumentSession, Box<dyn std::error::Error>> {
        let session = self.open()?;
        match session.error() {
            Some(message) => Err(message.into()),
            None => Ok(session),
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Show {
            session,
            page,
            output,
        }) => cmd_show(&session, page, output.as_deref()),
        Some(Commands::Info { session }) => cmd_info(&session),
        Some(Commands::Export { session, output }) => cmd_export(&session, output.as_deref()),
        Some(Commands::Json {
            session,
            output,
            compact,
        }) => cmd_json(&session, output.as_deref(), compact),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: show the first page if input is provided
            if let Some(input) = cli.input {
                let session = SessionArgs {
                    input,
                    mime: None,
                    rows_per_page: DEFAULT_ROWS_PER_PAGE,
                    style_map: None,
                };
                cmd_show(&session, 1, None)
            } else {
                println!("{}", "Usage: docpane <FILE>".yellow());
                println!("       docpane --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_show(args: &SessionArgs, page: u32, output: Option<&Path>) -> CliResult {
    let mut session = args.open_ready()?;

    if !session.go_to_page(page) {
        return Err(docpane::Error::PageOutOfRange(page, session.total_pages()).into());
    }

    if let Some(blob) = session.pdf_blob() {
        println!(
            "{}: PDF document, {} bytes ({}); PDFs have no markup to show",
            args.input.display(),
            blob.data.len(),
            blob.mime_type
        );
        return Ok(());
    }

    let text = session.content().to_string();

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_info(args: &SessionArgs) -> CliResult {
    let session = args.open()?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), args.input.display());
    println!("{}: {}", "Name".bold(), session.file_name());
    println!("{}: {}", "Type".bold(), session.file_type());
    if let Some(kind) = session.kind() {
        println!("{}: {}", "Kind".bold(), kind);
    }

    match session.error() {
        Some(message) => println!("{}: {}", "Status".bold(), message.red()),
        None => println!("{}: {}", "Status".bold(), "ready".green()),
    }

    if session.error().is_none() {
        println!("{}: {}", "Pages".bold(), session.total_pages());
        if session.kind().is_some_and(|kind| kind.is_paginated()) {
            println!("{}: {}", "Rows per page".bold(), session.options().rows_per_page);
        }
        if let Some(blob) = session.pdf_blob() {
            println!("{}: {} bytes", "Size".bold(), blob.data.len());
        }
    }

    Ok(())
}

fn cmd_export(args: &SessionArgs, output: Option<&Path>) -> CliResult {
    let session = args.open_ready()?;
    if session.kind() == Some(DocumentKind::Pdf) {
        return Err("PDF documents have no markup pages to export".into());
    }

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = args.input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_pages", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let total = session.total_pages();
    let pb = ProgressBar::new(u64::from(total));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    for number in 1..=total {
        let filename = format!("page-{:03}.html", number);
        pb.set_message(filename.clone());
        let markup = session.page(number).unwrap_or_default();
        fs::write(output_dir.join(&filename), markup)?;
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!(
        "\n{} {} pages written to {}",
        "Done!".green().bold(),
        total,
        output_dir.display()
    );

    Ok(())
}

fn cmd_json(args: &SessionArgs, output: Option<&Path>, compact: bool) -> CliResult {
    let session = args.open()?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = session.snapshot().to_json(format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docpane".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document page viewer for PDF, DOCX and XLSX");
    println!();
    println!("Default rows per page: {}", DEFAULT_ROWS_PER_PAGE);
    println!("License: MIT");
}
