//! CLI binary for doccheck.
//!
//! A thin shim over the library crate that maps CLI flags to `ScanConfig`
//! and prints the audit. Exit codes: 0 = every page signed, 1 = missing
//! signatures found, 2 = fatal error.

use anyhow::{Context, Result};
use clap::Parser;
use doccheck::{
    inspect, save_missing_annotations, scan, PageSelection, RescissionCalculator, ScanConfig,
    ScanProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif]. Designed to work correctly when pages complete
/// out-of-order (concurrent classification).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Count of pages flagged as missing a signature.
    missing: AtomicUsize,
    /// Count of pages that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_scan_start` (called before any pages are rendered).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_scan_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            missing: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Scanning");
        self.bar.reset_eta();
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_scan_start(&self, total_pages: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual page count.
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scanning {total_pages} pages for signatures…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, is_signed: bool) {
        if is_signed {
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}  {}",
                green("✓"),
                page_num,
                total,
                dim("signed"),
            ));
        } else {
            self.missing.fetch_add(1, Ordering::SeqCst);
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}  {}",
                red("✗"),
                page_num,
                total,
                red("missing signature"),
            ));
        }
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            yellow("⚠"),
            page_num,
            total,
            yellow(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_scan_complete(&self, total_pages: usize, missing_count: usize) {
        self.bar.finish_and_clear();

        if missing_count == 0 {
            eprintln!(
                "{} {} pages scanned, no missing signatures",
                green("✔"),
                bold(&total_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages need attention",
                red("✘"),
                bold(&missing_count.to_string()),
                total_pages,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan a loan package before it ships
  doccheck closing_package.pdf

  # Scan and save annotated images of the flagged pages
  doccheck closing_package.pdf --save-annotated ./flagged

  # Scan specific pages at higher resolution
  doccheck --pages 10-40 --dpi 200 package.pdf

  # Full machine-readable report
  doccheck --json package.pdf > report.json

  # Scan straight from a URL
  doccheck https://example.com/package.pdf

  # Rescission deadline for a signing date (no PDF needed)
  doccheck --deadline 01/20/2026

  # Also scan text layers for an expired driver license
  doccheck --license-scan package.pdf

  # Inspect PDF metadata, no scan
  doccheck --inspect-only package.pdf

EXIT CODES:
  0   every scanned page carries a signature
  1   at least one page is missing a signature
  2   fatal error (bad input, unreadable PDF, …)

HOW THE DETECTOR WORKS:
  Each page is rendered at --dpi (default 150), cropped to the central
  scan region (letterhead, hole punches and scan edges excluded), adaptively
  binarised, stripped of ruled lines, and segmented into ink regions. A page
  counts as signed when at least one region is big enough, not a thin
  vertical artifact, and sparse enough to be handwriting rather than a
  stamp or header bar. It is a safety net, not a verification system —
  always eyeball the flagged pages.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH    Path to an existing libpdfium shared library
  DOCCHECK_DPI       Default for --dpi
  DOCCHECK_PAGES     Default for --pages

SETUP:
  PDFium is loaded from the executable's directory or the system library
  path. Install it once (e.g. from bblanchon/pdfium-binaries) and every
  scan afterwards is offline — documents never leave the machine.
"#;

/// Scan loan-document PDFs for missing signatures.
#[derive(Parser, Debug)]
#[command(
    name = "doccheck",
    version,
    about = "Scan loan-document PDFs for pages missing a handwritten signature",
    long_about = "Scan scanned loan-document PDFs page by page and flag pages that appear \
to be missing a handwritten signature, entirely offline. Also computes rescission \
deadlines from a signing date (three business days; Sundays and federal holidays \
excluded, Saturdays counted).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL. Not required with --deadline.
    input: Option<String>,

    /// Compute the rescission deadline for a signing date (MM/DD/YYYY) and exit.
    #[arg(long, value_name = "DATE")]
    deadline: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "DOCCHECK_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Number of pages classified concurrently.
    #[arg(short, long, env = "DOCCHECK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "DOCCHECK_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCCHECK_PASSWORD")]
    password: Option<String>,

    /// Write annotated PNGs of the flagged pages into this directory.
    #[arg(long, value_name = "DIR")]
    save_annotated: Option<PathBuf>,

    /// Also scan each page's text layer for a driver-license expiry date.
    #[arg(long, env = "DOCCHECK_LICENSE_SCAN")]
    license_scan: bool,

    /// Output the full report as JSON instead of the audit table.
    #[arg(long, env = "DOCCHECK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCCHECK_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no scan.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCCHECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final summary.
    #[arg(short, long, env = "DOCCHECK_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCCHECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", red("error:"));
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Deadline-only mode ───────────────────────────────────────────────
    if let Some(ref sign_date) = cli.deadline {
        let calc = RescissionCalculator::default();
        match calc.compute(sign_date) {
            Ok(deadline) => {
                println!("{deadline}");
                if !cli.quiet {
                    eprintln!(
                        "{} rescission deadline for {} is {}",
                        cyan("◆"),
                        bold(sign_date),
                        bold(&deadline)
                    );
                }
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) => anyhow::bail!("{e}"),
        }
    }

    let input = cli
        .input
        .clone()
        .context("missing PDF input (or use --deadline DATE)")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar is initialised with a spinner (no page count yet);
    // `on_scan_start` resizes it to the correct total once the PDF has
    // been inspected.
    let mut builder = ScanConfig::builder()
        .dpi(cli.dpi)
        .concurrency(cli.concurrency)
        .pages(parse_pages(&cli.pages)?)
        .scan_license_text(cli.license_scan)
        .download_timeout_secs(cli.download_timeout);

    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new_dynamic());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run scan ─────────────────────────────────────────────────────────
    let report = scan(&input, &config).await.context("Scan failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        print_audit(&report, cli.quiet);
    }

    // ── Save annotated pages ─────────────────────────────────────────────
    if let Some(ref dir) = cli.save_annotated {
        let written =
            save_missing_annotations(&report, dir).context("Failed to save annotated pages")?;
        if !cli.quiet {
            eprintln!(
                "{} {} annotated page{} written to {}",
                cyan("◆"),
                written.len(),
                if written.len() == 1 { "" } else { "s" },
                bold(&dir.display().to_string()),
            );
        }
    }

    Ok(if report.summary.all_signed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Print the human-readable audit: flagged pages first, then the table.
fn print_audit(report: &doccheck::ScanReport, quiet: bool) {
    let summary = &report.summary;

    if summary.missing_count == 0 {
        println!(
            "{} All {} scanned pages carry a signature.",
            green("✔"),
            summary.total_pages
        );
    } else {
        println!(
            "{} {} page{} missing a signature:",
            red("✘"),
            summary.missing_count,
            if summary.missing_count == 1 { "" } else { "s" },
        );
        for page in report.missing_pages() {
            println!("    page {}", page.page_num);
        }
    }

    for page in report.failed_pages() {
        if let Some(ref e) = page.error {
            println!("{} {}", yellow("⚠"), e);
        }
    }

    // Expired-license findings, if the text scan ran.
    for page in &report.pages {
        if let Some(ref finding) = page.license_expiry {
            println!(
                "{} page {}: driver license expiry {}",
                cyan("◆"),
                page.page_num,
                finding.raw
            );
        }
    }

    if quiet {
        return;
    }

    println!();
    println!("  {:<8} {}", bold("Page"), bold("Status"));
    for page in &report.pages {
        let status = if page.error.is_some() {
            yellow("error")
        } else if page.is_signed {
            green("signed")
        } else {
            red("MISSING")
        };
        println!("  {:<8} {}", page.page_num, status);
    }
    println!();
    println!(
        "  {} total · {} signed · {} missing · {}ms",
        summary.total_pages,
        summary.signed_count,
        summary.missing_count,
        report.stats.total_duration_ms,
    );
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
