use clap::Parser;
use std::process::ExitCode;
use xdt::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    match cli::execute(&args) {
        Ok(report) => {
            for warning in &report.warnings {
                eprintln!("{}", cli::warning_line(warning));
            }
            println!("Transformed file written to {}", report.destination.display());
            ExitCode::SUCCESS
        }
        Err(error) => {
            for line in cli::error_lines(&error) {
                eprintln!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}
