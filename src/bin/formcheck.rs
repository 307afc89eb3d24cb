use anyhow::{Context, Result};
use formcheck::config::{Config, OutputFormat};
use formcheck::declarations::{self, Declarations};
use formcheck::report;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    // Parse configuration from command line and environment
    let config = Config::from_args_and_env()?;

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .parse_default_env()
        .init();

    let declarations = Declarations::load(&config.forms_path).with_context(|| {
        format!(
            "Failed to load declarations from {}",
            config.forms_path.display()
        )
    })?;
    log::info!(
        "Loaded {} form(s) from {}",
        declarations.forms.len(),
        config.forms_path.display()
    );

    let values = declarations::load_values(&config.values_path).with_context(|| {
        format!("Failed to load values from {}", config.values_path.display())
    })?;

    let report = report::check(declarations, &values);
    match config.format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
