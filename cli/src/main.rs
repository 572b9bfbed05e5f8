//! pdfpix CLI - PDF image extraction tool

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use pdfpix::{
    Error, ExtractOptions, ExtractReport, ExtractionVisitor, ImageExtractor, JsonFormat,
    PageSelection, PdfBackend, SavedImage, SkippedImage, VisitorAction,
};

#[derive(Parser)]
#[command(name = "pdfpix")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract embedded images from PDF files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE", env = "PDFPIX_INPUT")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT", env = "PDFPIX_OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Clone, Default)]
struct RunArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long, global = true)]
    pages: Option<String>,

    /// Skip images that cannot be decoded instead of aborting
    #[arg(long, global = true)]
    skip_errors: bool,

    /// JSON config file with extraction options
    #[arg(long, value_name = "FILE", env = "PDFPIX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print the extraction report as JSON instead of progress lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all images from a PDF
    #[command(alias = "x")]
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List the images of a PDF without writing anything
    #[command(alias = "ls")]
    List {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Some(Commands::Extract { input, output }) => {
            cmd_extract(Some(input), output, &cli.run, &mut stdout)
        }
        Some(Commands::List { input }) => cmd_list(&input, &cli.run),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => cmd_extract(cli.input, cli.output, &cli.run, &mut stdout),
    };

    if let Err(e) = result {
        eprintln!("{}", error_line(e.as_ref()));
        std::process::exit(1);
    }
}

fn error_line(error: &dyn std::error::Error) -> String {
    format!("{}: {}", "Error".red().bold(), error)
}

/// Merge command-line values over the config file over built-in defaults.
fn resolve_options(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    args: &RunArgs,
) -> Result<ExtractOptions, Error> {
    let mut options = match &args.config {
        Some(path) => ExtractOptions::from_json_file(path)?,
        None => ExtractOptions::default(),
    };

    if let Some(input) = input {
        options.input_path = input;
    }
    if let Some(output) = output {
        options.output_dir = output;
    }
    if let Some(pages) = &args.pages {
        options.pages = PageSelection::parse(pages)?;
    }
    if args.skip_errors {
        options = options.lenient();
    }
    log::debug!("Resolved options: {:?}", options);
    Ok(options)
}

fn cmd_extract<W: Write>(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    args: &RunArgs,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(input, output, args)?;

    if args.json {
        let report = ImageExtractor::open(options)?
            .run_with_visitor(&mut pdfpix::extract::DefaultVisitor)?;
        writeln!(out, "{}", report.to_json(JsonFormat::Pretty)?)?;
        return Ok(());
    }

    writeln!(out, "{} {}", "Opening".cyan(), options.input_path.display())?;
    let extractor = ImageExtractor::open(options)?;
    extractor.run_with_visitor(&mut ConsoleVisitor::new(out))?;

    Ok(())
}

fn cmd_list(input: &Path, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(Some(input.to_path_buf()), None, args)?;
    let extractor = ImageExtractor::open(options)?;
    let planned = extractor.plan()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    let backend = extractor.backend();
    println!(
        "{} (PDF {}, {} pages)\n",
        input.display().to_string().cyan(),
        backend.version(),
        backend.page_count()
    );

    for item in &planned {
        let size = match (item.image.width, item.image.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "?".to_string(),
        };
        println!(
            "{} {:>3}  {} {:>2}  {:<10} {:<8} {}",
            "page".dimmed(),
            item.page,
            "img".dimmed(),
            item.position,
            item.image.xref.to_string(),
            item.image.name,
            size
        );
    }
    println!("\n{} {} images", "Total:".green().bold(), planned.len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfpix".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF image extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfpix".dimmed());
    println!("License: MIT");
}

/// Prints one progress line per page and per saved image.
///
/// Write failures on the progress stream are ignored.
struct ConsoleVisitor<W: Write> {
    out: W,
}

impl<W: Write> ConsoleVisitor<W> {
    fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ExtractionVisitor for ConsoleVisitor<W> {
    fn visit_page(&mut self, page: u32, image_count: usize) -> VisitorAction {
        let _ = writeln!(self.out, "Page {} has {} images", page, image_count);
        VisitorAction::Continue
    }

    fn image_saved(&mut self, saved: &SavedImage) {
        let _ = writeln!(self.out, "{} {}", "Saved".green(), saved.path.display());
    }

    fn image_skipped(&mut self, skipped: &SkippedImage, error: &Error) {
        eprintln!(
            "{} page {} image {}: {}",
            "Skipped".yellow(),
            skipped.page,
            skipped.position,
            error
        );
    }

    fn finish(&mut self, report: &ExtractReport) {
        let _ = writeln!(
            self.out,
            "\n{} Extracted {} images",
            "Done!".green().bold(),
            report.count()
        );
    }
}
