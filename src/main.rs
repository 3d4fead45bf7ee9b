use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use examstruct::core::config::Config;
use examstruct::core::model::ExamType;
use examstruct::layout::{DocumentLayout, LayoutSource, PdfInfo, PopplerLayout};
use examstruct::pipeline::{issue_summary, parse_layout, run_batch, PipelineConfig, Stage, UnitOutcome, UnitReport, YearRange};

#[derive(Parser, Debug)]
#[command(name = "examstruct")]
#[command(version, about = "Structured question extraction from two-column multiple-choice exam PDFs", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply to anything it omits)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse exam PDFs into question JSON and a parsing report
    Parse(BatchArgs),

    /// Crop question images for already parsed exams and write the answer key
    Images(BatchArgs),

    /// Parse, then extract images
    Run(BatchArgs),

    /// Dump the positioned-word layout of a PDF as JSON
    Layout {
        /// Input PDF file path
        input: PathBuf,

        /// Only this page (1-based)
        #[arg(short, long)]
        page: Option<usize>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a layout JSON written by `layout` instead of a PDF
    ParseDump {
        /// Layout dump of the whole exam
        input: PathBuf,

        /// Exam year the dump belongs to
        #[arg(short, long)]
        year: u32,

        #[arg(short = 't', long, value_enum, default_value_t = ExamType::National)]
        exam_type: ExamType,

        /// Root of the per-year parsed output
        #[arg(long)]
        parsed_dir: Option<PathBuf>,
    },

    /// Show information about a PDF file
    Info {
        /// Input PDF file path
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Exam years, e.g. `2000-2025` or `2018`
    #[arg(short, long, default_value = "2000-2025")]
    years: YearRange,

    #[arg(short = 't', long, value_enum, default_value_t = ExamType::National)]
    exam_type: ExamType,

    /// Directory holding the exam PDFs
    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Root of the per-year parsed output
    #[arg(long)]
    parsed_dir: Option<PathBuf>,

    /// Root of the per-year question images
    #[arg(long)]
    image_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Parse(args) => batch(config, args, Stage::Parse),
        Commands::Images(args) => batch(config, args, Stage::Images),
        Commands::Run(args) => batch(config, args, Stage::All),
        Commands::Layout { input, page, output } => dump_layout(input, page, output),
        Commands::ParseDump {
            input,
            year,
            exam_type,
            parsed_dir,
        } => parse_dump(config, input, year, exam_type, parsed_dir),
        Commands::Info { input } => show_info(input),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "examstruct=debug" } else { "examstruct=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn batch(mut config: Config, args: BatchArgs, stage: Stage) -> Result<()> {
    if let Some(dir) = args.pdf_dir {
        config.paths.pdf_dir = dir;
    }
    if let Some(dir) = args.parsed_dir {
        config.paths.parsed_dir = dir;
    }
    if let Some(dir) = args.image_dir {
        config.paths.image_dir = dir;
    }
    let issue_limit = config.parser.summary_issue_limit;

    println!("[*] {stage:?} {} exams, years {}", args.exam_type, args.years);
    println!("[*] PDFs: {}", config.paths.pdf_dir.display());
    println!("[*] Parsed output: {}\n", config.paths.parsed_dir.display());

    let pipeline = PipelineConfig::new(config, args.years, args.exam_type);
    let units = run_batch(&pipeline, stage);

    let mut completed = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for unit in &units {
        print!("[{} {}] ", unit.year, unit.exam_type);
        match &unit.outcome {
            Ok(UnitOutcome::Completed(report)) => {
                completed += 1;
                print_report(report, issue_limit);
            }
            Ok(UnitOutcome::Skipped { reason }) => {
                skipped += 1;
                println!("[!] Skipped: {reason}");
            }
            Err(e) => {
                failed += 1;
                eprintln!("[✗] Failed: {e:#}");
            }
        }
    }

    println!("\n[*] Summary: {completed} completed, {skipped} skipped, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} exam(s) failed to process");
    }
    Ok(())
}

fn print_report(report: &UnitReport, issue_limit: usize) {
    let result = &report.result;
    println!("[✓] {} questions", result.total_questions);

    if let Some(summary) = &report.extraction {
        println!("  Extracted: {} questions", summary.extracted);
        if summary.failed > 0 {
            println!("  Without image: {}", summary.failed);
        }
        println!("  Images: {}", summary.output_dir.display());
        if let Some(avg) = summary.average_kb {
            println!("  Avg size: {avg:.1} KB");
        }
    }

    if result.parsing_issues.is_empty() {
        println!("  No issues detected");
    } else {
        println!("  Issues ({}):", result.parsing_issues.len());
        for line in issue_summary(result, issue_limit) {
            println!("    {line}");
        }
    }

    println!("  Output files:");
    for path in &report.outputs {
        println!("    - {}", path.display());
    }
}

fn dump_layout(input: PathBuf, page: Option<usize>, output: Option<PathBuf>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let layout = PopplerLayout::new()
        .load(&input)
        .with_context(|| format!("Failed to read layout: {}", input.display()))?;
    let layout = match page {
        Some(number) => DocumentLayout::new(vec![layout.page(number)?.clone()]),
        None => layout,
    };

    let json = serde_json::to_string_pretty(&layout)?;
    match output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Failed to write: {}", path.display()))?;
            println!("[✓] Layout written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn parse_dump(
    mut config: Config,
    input: PathBuf,
    year: u32,
    exam_type: ExamType,
    parsed_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(dir) = parsed_dir {
        config.paths.parsed_dir = dir;
    }

    let layout = DocumentLayout::from_json_file(&input)
        .with_context(|| format!("Failed to read layout dump: {}", input.display()))?;
    println!("[*] Parsing {} pages from {}", layout.page_count(), input.display());

    let report = parse_layout(&config, year, exam_type, &layout)?;
    print!("[{year} {exam_type}] ");
    print_report(&report, config.parser.summary_issue_limit);
    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let info = PdfInfo::probe(&input).with_context(|| format!("Failed to open PDF: {}", input.display()))?;

    println!("PDF Information");
    println!("===============");
    println!("File: {}", input.display());
    println!("Pages: {}", info.pages);
    if let Some(title) = &info.title {
        println!("Title: {title}");
    }
    if let Some(size) = &info.page_size {
        println!("Page size: {size}");
    }

    Ok(())
}
