mod common;

use clap::Parser;
use common::{TestResult, fixture, fixture_path};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use xdt::TransformError;
use xdt::cli::{Args, CliError, execute};

fn args(items: &[&Path]) -> Args {
    let mut argv = vec![OsStr::new("xdt")];
    argv.extend(items.iter().map(|p| p.as_os_str()));
    Args::try_parse_from(argv).expect("valid arguments")
}

/// Copies the named fixtures into a fresh temporary directory.
fn workspace(names: &[&str]) -> std::io::Result<TempDir> {
    let dir = TempDir::new()?;
    for name in names {
        fs::copy(fixture_path(name), dir.path().join(name))?;
    }
    Ok(dir)
}

#[test]
fn test_writes_default_destination_next_to_source() -> TestResult {
    let dir = workspace(&["web.config", "web.release.config"])?;
    let source = dir.path().join("web.config");
    let report = execute(&args(&[&source, &dir.path().join("web.release.config")]))?;

    let expected = dir.path().join("web_transformed.config");
    assert_eq!(report.destination, expected);
    assert!(report.warnings.is_empty());
    assert_eq!(fs::read_to_string(&expected)?, fixture("web.expected.config"));
    // The source itself is left alone.
    assert_eq!(fs::read_to_string(&source)?, fixture("web.config"));
    Ok(())
}

#[test]
fn test_creates_missing_destination_directories() -> TestResult {
    let dir = workspace(&["web.config", "web.release.config"])?;
    let destination = dir.path().join("out").join("release").join("web.config");
    execute(&args(&[
        &dir.path().join("web.config"),
        &dir.path().join("web.release.config"),
        &destination,
    ]))?;
    assert_eq!(fs::read_to_string(&destination)?, fixture("web.expected.config"));
    Ok(())
}

#[test]
fn test_missing_and_unsupported_inputs() -> TestResult {
    let dir = workspace(&["web.config", "web.release.config"])?;
    let source = dir.path().join("web.config");
    let transform = dir.path().join("web.release.config");
    let missing = dir.path().join("missing.config");
    let text = dir.path().join("notes.txt");
    fs::write(&text, "not xml at all")?;

    let error = execute(&args(&[&missing, &transform])).unwrap_err();
    assert!(matches!(error, CliError::SourceNotFound(_)));
    assert_eq!(error.to_string(), "Source file not found");

    let error = execute(&args(&[&text, &transform])).unwrap_err();
    assert_eq!(error.to_string(), "Source file not supported, invalid format");

    let error = execute(&args(&[&source, &missing])).unwrap_err();
    assert_eq!(error.to_string(), "Transform file not found");

    let error = execute(&args(&[&source, &text])).unwrap_err();
    assert_eq!(error.to_string(), "Transform file not supported, invalid format");

    // A directory is not a source file.
    let error = execute(&args(&[dir.path(), &transform])).unwrap_err();
    assert!(matches!(error, CliError::SourceNotFound(_)));

    assert!(!dir.path().join("web_transformed.config").exists());
    Ok(())
}

#[test]
fn test_directive_failure_writes_nothing() -> TestResult {
    let dir = workspace(&["web.config", "web.broken.config"])?;
    let error = execute(&args(&[
        &dir.path().join("web.config"),
        &dir.path().join("web.broken.config"),
    ]))
    .unwrap_err();
    assert!(matches!(
        error,
        CliError::Transform(TransformError::Directives(ref errors)) if errors.len() == 1
    ));
    assert!(!dir.path().join("web_transformed.config").exists());
    Ok(())
}

#[test]
fn test_allow_partial_writes_result_with_warnings() -> TestResult {
    let dir = workspace(&["web.config", "web.broken.config"])?;
    let mut parsed = args(&[
        &dir.path().join("web.config"),
        &dir.path().join("web.broken.config"),
    ]);
    parsed.allow_partial = true;
    let report = execute(&parsed)?;
    assert_eq!(report.warnings.len(), 1);
    let written = fs::read_to_string(&report.destination)?;
    assert!(written.contains(r#"<add key="CacheSeconds" value="300"/>"#));
    Ok(())
}

#[test]
fn test_binary_exit_codes() -> TestResult {
    let dir = workspace(&["web.config", "web.release.config", "web.broken.config"])?;
    let binary = env!("CARGO_BIN_EXE_xdt");

    let status = Command::new(binary)
        .arg(dir.path().join("web.config"))
        .arg(dir.path().join("web.release.config"))
        .arg(dir.path().join("ok.config"))
        .output()?;
    assert!(status.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("ok.config"))?,
        fixture("web.expected.config")
    );

    let failed = Command::new(binary)
        .arg(dir.path().join("web.config"))
        .arg(dir.path().join("web.broken.config"))
        .arg(dir.path().join("broken.config"))
        .output()?;
    assert_eq!(failed.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&failed.stderr).contains("found no matching node"));
    assert!(!dir.path().join("broken.config").exists());

    let missing = Command::new(binary)
        .arg(dir.path().join("nope.config"))
        .arg(dir.path().join("web.release.config"))
        .output()?;
    assert_eq!(missing.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&missing.stderr).contains("Source file not found"));
    Ok(())
}
