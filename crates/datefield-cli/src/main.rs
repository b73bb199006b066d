// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::{Config, parse_config_date};
use datefield_app::{DateInputState, FieldProps};
use runtime::OwnerRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use time::{Date, OffsetDateTime};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `datefield --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let props = field_props(&config, &options)?;

    let log_path = config.log_path()?;
    logging::init(config.log_level(), &log_path)?;
    if options.check_only {
        return Ok(());
    }

    info!(
        config = %options.config_path.display(),
        value = ?props.value,
        min_date = ?props.min_date,
        "starting date field"
    );
    let mut state = DateInputState::new(props.clone(), local_today());
    let mut runtime = OwnerRuntime::new(props.value);
    datefield_tui::run_app(&mut state, &mut runtime)?;
    info!(commits = runtime.transcript().len(), "date field closed");

    runtime.write_summary(&mut io::stdout().lock(), options.json)
}

/// Config values with command-line overrides applied.
fn field_props(config: &Config, options: &CliOptions) -> Result<FieldProps> {
    let value = match &options.value {
        Some(raw) => {
            parse_config_date(raw).context("--value")?;
            Some(raw.clone())
        }
        None => config.value().map(str::to_owned),
    };
    let min_date = match &options.min_date {
        Some(raw) => Some(parse_config_date(raw).context("--min-date")?),
        None => config.min_date()?,
    };

    Ok(FieldProps {
        value,
        min_date,
        placeholder: config.placeholder().to_owned(),
        clearable: options.clearable || config.clearable(),
        label: config.label().to_owned(),
    })
}

fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    value: Option<String>,
    min_date: Option<String>,
    clearable: bool,
    json: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        value: None,
        min_date: None,
        clearable: false,
        json: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--value" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--value requires a YYYY-MM-DD date"))?;
                options.value = Some(value.as_ref().to_owned());
            }
            "--min-date" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--min-date requires a YYYY-MM-DD date"))?;
                options.min_date = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--clearable" => {
                options.clearable = true;
            }
            "--json" => {
                options.json = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("datefield");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --value <YYYY-MM-DD>     Start with this value");
    println!("  --min-date <YYYY-MM-DD>  Reject days before this date");
    println!("  --clearable              Allow clearing the value");
    println!("  --json                   Print every commit as a JSON line on exit");
    println!("  --check                  Validate config and log setup, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, field_props, parse_cli_args};
    use crate::config::Config;
    use anyhow::Result;
    use std::path::PathBuf;
    use time::{Date, Month};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/datefield-config.toml")
    }

    fn load(content: &str) -> Result<(tempfile::TempDir, Config)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        let config = Config::load(&path)?;
        Ok((temp, config))
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                value: None,
                min_date: None,
                clearable: false,
                json: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        for (flag, expected) in [
            ("--config", "--config requires a file path"),
            ("--value", "--value requires a YYYY-MM-DD date"),
            ("--min-date", "--min-date requires a YYYY-MM-DD date"),
        ] {
            let error = parse_cli_args(vec![flag], default_options_path())
                .expect_err("missing value should fail");
            assert!(error.to_string().contains(expected), "flag {flag}");
        }
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_field_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--value",
                "2024-03-15",
                "--min-date",
                "2024-01-01",
                "--clearable",
                "--json",
                "--check",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.value.as_deref(), Some("2024-03-15"));
        assert_eq!(options.min_date.as_deref(), Some("2024-01-01"));
        assert!(options.clearable);
        assert!(options.json);
        assert!(options.check_only);
        assert!(!options.print_example);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn flags_override_config_field_values() -> Result<()> {
        let (_temp, config) = load(
            "version = 1\n[field]\nlabel = \"Due\"\nvalue = \"2023-06-01\"\nmin_date = \"2023-01-01\"\n",
        )?;
        let options = parse_cli_args(
            vec!["--value", "2024-03-15", "--min-date", "2024-01-01", "--clearable"],
            default_options_path(),
        )?;
        let props = field_props(&config, &options)?;
        assert_eq!(props.value.as_deref(), Some("2024-03-15"));
        assert_eq!(
            props.min_date,
            Some(Date::from_calendar_date(2024, Month::January, 1)?)
        );
        assert!(props.clearable);
        assert_eq!(props.label, "Due");
        assert_eq!(props.placeholder, "MM/DD/YYYY");
        Ok(())
    }

    #[test]
    fn config_values_apply_without_flags() -> Result<()> {
        let (_temp, config) = load(
            "version = 1\n[field]\nvalue = \"2023-06-01\"\nclearable = true\n",
        )?;
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        let props = field_props(&config, &options)?;
        assert_eq!(props.value.as_deref(), Some("2023-06-01"));
        assert_eq!(props.min_date, None);
        assert!(props.clearable);
        Ok(())
    }

    #[test]
    fn malformed_flag_dates_name_the_flag() -> Result<()> {
        let config = Config::default();
        let options = parse_cli_args(vec!["--min-date", "1/1/2024"], default_options_path())?;
        let error = field_props(&config, &options).expect_err("bad flag date should fail");
        let message = format!("{error:#}");
        assert!(message.contains("--min-date"), "unexpected message: {message}");
        assert!(message.contains("YYYY-MM-DD"), "unexpected message: {message}");
        Ok(())
    }
}
