//! Command line front end: argument parsing, file checks and reporting.

use clap::Parser;
use clap::builder::styling::{AnsiColor, Style};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xdt_transform::{ErrorPolicy, TransformError, TransformOptions, Transformer, is_supported};

/// Applies an XDT transform file to an XML document.
#[derive(Parser, Debug)]
#[command(name = "xdt", version, about, long_about = None)]
pub struct Args {
    /// Path of the file to be transformed
    pub source: PathBuf,

    /// Path of the XDT transform to apply to the file
    pub transform: PathBuf,

    /// Path of the resulting file. Defaults to <source>_transformed.<extension>
    pub destination: Option<PathBuf>,

    /// Stop at the first directive that fails
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Write the result even if some directives failed
    #[arg(long, default_value_t = false, conflicts_with = "fail_fast")]
    pub allow_partial: bool,

    /// Leave whitespace around inserted and removed elements as is
    #[arg(long, default_value_t = false)]
    pub no_tidy: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn options(&self) -> TransformOptions {
        let mut options = TransformOptions::default().with_tidy_whitespace(!self.no_tidy);
        if self.fail_fast {
            options.error_policy = ErrorPolicy::FailFast;
        }
        options
    }

    /// Default `env_logger` filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| default_destination(&self.source))
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Source file not found")]
    SourceNotFound(PathBuf),

    #[error("Source file not supported, invalid format")]
    SourceNotSupported(PathBuf),

    #[error("Transform file not found")]
    TransformNotFound(PathBuf),

    #[error("Transform file not supported, invalid format")]
    TransformNotSupported(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Transform(#[from] TransformError),
}

impl CliError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
        move |source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a successful run wrote, plus the directive errors tolerated by
/// `--allow-partial`.
#[derive(Debug)]
pub struct Report {
    pub destination: PathBuf,
    pub warnings: Vec<TransformError>,
}

/// `dir/web.config` becomes `dir/web_transformed.config`.
pub fn default_destination(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(extension) => format!("{}_transformed.{}", stem, extension.to_string_lossy()),
        None => format!("{}_transformed", stem),
    };
    source.with_file_name(name)
}

/// Reads a document, returning `None` if it is not UTF-8 XML with a root.
fn read_document(path: &Path) -> Result<Option<String>, CliError> {
    let bytes = fs::read(path).map_err(CliError::io(path))?;
    let Ok(text) = String::from_utf8(bytes) else {
        return Ok(None);
    };
    let text = match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    };
    Ok(is_supported(&text).then_some(text))
}

/// Runs the transform described by `args` and writes the destination file.
///
/// Nothing is written unless the run succeeds, or fails only on directives
/// while `--allow-partial` is set.
pub fn execute(args: &Args) -> Result<Report, CliError> {
    if !args.source.is_file() {
        return Err(CliError::SourceNotFound(args.source.clone()));
    }
    let source = read_document(&args.source)?
        .ok_or_else(|| CliError::SourceNotSupported(args.source.clone()))?;

    if !args.transform.is_file() {
        return Err(CliError::TransformNotFound(args.transform.clone()));
    }
    let transform = read_document(&args.transform)?
        .ok_or_else(|| CliError::TransformNotSupported(args.transform.clone()))?;

    let destination = args.destination();
    debug!(
        "Transforming {} with {} into {}",
        args.source.display(),
        args.transform.display(),
        destination.display()
    );

    let outcome = Transformer::new(args.options()).run(&source, &transform)?;
    if !outcome.is_complete() && !args.allow_partial {
        return Err(TransformError::Directives(outcome.diagnostics).into());
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            info!("Creating directory {}", parent.display());
            fs::create_dir_all(parent).map_err(CliError::io(parent))?;
        }
    }
    fs::write(&destination, outcome.output).map_err(CliError::io(&destination))?;

    Ok(Report {
        destination,
        warnings: outcome.diagnostics,
    })
}

fn paint(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

/// Lines to print on stderr for a failed run, in red.
pub fn error_lines(error: &CliError) -> Vec<String> {
    let red = AnsiColor::Red.on_default();
    let mut lines = vec![paint(red, &error.to_string())];
    if let CliError::Transform(TransformError::Directives(errors)) = error {
        lines.extend(errors.iter().map(|e| paint(red, &format!("  {}", e))));
    }
    lines
}

/// A tolerated directive error, in yellow.
pub fn warning_line(warning: &TransformError) -> String {
    paint(AnsiColor::Yellow.on_default(), &warning.to_string())
}
