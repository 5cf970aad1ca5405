use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use emptyspace::export::text_export::{format_report, format_summary};
use emptyspace::parser::PdfReader;
use emptyspace::pipeline::{build_report, export_report, PageSelection, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "emptyspace")]
#[command(version, about = "Measure empty space at the top and bottom of PDF pages", long_about = None)]
struct Cli {
    /// Log progress details (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one PDF file and print the per-page report
    Analyze {
        /// Input PDF file path
        input: PathBuf,

        /// Output directory (default: ./<input_name>_emptyspace)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: AnalyzeOptions,
    },

    /// Analyze multiple PDF files
    Batch {
        /// Input PDF files
        inputs: Vec<PathBuf>,

        /// Output directory for all results
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: AnalyzeOptions,
    },

    /// Show page count and page sizes of a PDF file
    Info {
        /// Input PDF file path
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct AnalyzeOptions {
    /// Pages to analyze, e.g. "1,3-5" (default: all)
    #[arg(short, long, default_value = "all")]
    pages: PageSelection,

    /// Write HTML overlays of the measured regions
    #[arg(long)]
    visualize: bool,

    /// Also write report.json
    #[arg(long)]
    json: bool,

    /// Analyze pages one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// pdftotext binary to use (overrides $PDFTOTEXT)
    #[arg(long)]
    pdftotext: Option<PathBuf>,

    /// Only print the report
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            options,
        } => analyze_single(input, output, &options),
        Commands::Batch {
            inputs,
            output,
            options,
        } => analyze_batch(inputs, output, &options),
        Commands::Info { input } => show_info(input),
    }
}

fn build_config(input: PathBuf, output: PathBuf, options: &AnalyzeOptions) -> PipelineConfig {
    let mut config = PipelineConfig::new(input, output);
    config.pages = options.pages.clone();
    config.visualize = options.visualize;
    config.json = options.json;
    config.parallel = !options.sequential;
    if let Some(binary) = &options.pdftotext {
        config.pdftotext = binary.clone();
    }
    config
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{stem}_emptyspace"))
}

/// One output directory per input under `base`. Inputs sharing a file stem
/// get `_2`, `_3`, ... suffixes so no result overwrites another.
fn batch_output_dirs(inputs: &[PathBuf], base: &Path) -> Vec<PathBuf> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let name = default_output(input);
            let mut candidate = name.clone();
            let mut n = 1;
            while !used.insert(candidate.clone()) {
                n += 1;
                candidate = PathBuf::from(format!("{}_{n}", name.display()));
            }
            base.join(candidate)
        })
        .collect()
}

fn analyze_single(input: PathBuf, output: Option<PathBuf>, options: &AnalyzeOptions) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output(&input));
    let quiet = options.quiet;

    if !quiet {
        println!("[*] Processing: {}", input.display());
        println!("[*] Output: {}\n", output_dir.display());
    }

    let config = build_config(input.clone(), output_dir.clone(), options);

    let report = build_report(&config)
        .with_context(|| format!("Failed to analyze PDF: {}", input.display()))?;

    print!("{}", format_report(&report));

    export_report(&report, &config)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!();
        print!("{}", format_summary(&report.summary()));
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn analyze_batch(inputs: Vec<PathBuf>, output: Option<PathBuf>, options: &AnalyzeOptions) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("emptyspace_batch"));

    println!("[*] Batch processing {} file(s)", inputs.len());
    println!("[*] Base output: {}\n", base_output.display());

    let mut success = 0;
    let mut failed = 0;

    let output_dirs = batch_output_dirs(&inputs, &base_output);

    for (i, (input, output_dir)) in inputs.iter().zip(output_dirs).enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, inputs.len(), input.display());

        if !input.exists() {
            eprintln!("  [!] Skipped: file does not exist");
            failed += 1;
            continue;
        }

        let file_options = AnalyzeOptions {
            quiet: true,
            ..options.clone()
        };

        match analyze_single(input.clone(), Some(output_dir), &file_options) {
            Ok(_) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {e:#}");
                failed += 1;
            }
        }
        println!();
    }

    println!("\n[*] Summary: {} succeeded, {} failed", success, failed);

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to process", failed);
    }

    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    let reader = PdfReader::new(input.clone())
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;

    let sizes = reader.page_sizes()?;

    println!("PDF Information");
    println!("===============");
    println!("File: {}", reader.path().display());
    println!("Pages: {}", reader.page_count()?);
    for (idx, size) in sizes.iter().enumerate() {
        println!("  Page {}: {:.2} x {:.2} pts", idx + 1, size.width, size.height);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn batch_outputs_do_not_collide_on_shared_stems() {
        let inputs = vec![
            PathBuf::from("a/report.pdf"),
            PathBuf::from("b/report.pdf"),
            PathBuf::from("c/other.pdf"),
            PathBuf::from("report.pdf"),
        ];
        let dirs = batch_output_dirs(&inputs, Path::new("out"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("out/report_emptyspace"),
                PathBuf::from("out/report_emptyspace_2"),
                PathBuf::from("out/other_emptyspace"),
                PathBuf::from("out/report_emptyspace_3"),
            ]
        );
    }
}
