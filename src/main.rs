//! # Housekeeper CLI
//!
//! Command surface over the library:
//!
//! - `diff` - compile the target schema, extract the live schema, compute
//!   the plan, and write it as a new hash-chained migration
//! - `migrate` - apply pending migrations with statement-level resume
//! - `status` - local migration files against recorded revisions
//! - `fmt` - canonical formatting of schema files
//! - `verify` - integrity check of the `housekeeper.sum` chain
//!
//! # Exit Codes
//!
//! - `0` - success (plan empty or applied)
//! - `2` - validation, planning, import, or config failure
//! - `3` - parse error in input
//! - `4` - runtime failure during execution
//! - `5` - integrity failure (sum or hash chain mismatch)

use std::fs;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use housekeeper::cli::{Cli, Commands};
use housekeeper::client::HttpClient;
use housekeeper::compiler::{compile_dir, compile_file};
use housekeeper::config::Config;
use housekeeper::diff::{DiffOptions, diff_with_options};
use housekeeper::error::{Result, runtime_error};
use housekeeper::executor::Executor;
use housekeeper::extract::{ExtractOptions, extract_schema};
use housekeeper::format::render_statements;
use housekeeper::migration::{Migration, SumFile, list_migration_files, version_stamp};
use housekeeper::output::{render_plan_summary, render_status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code())
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = Config::load(&cli.project)?;
    let colored = !cli.no_color;

    match cli.command {
        Commands::Diff { dry_run } => cmd_diff(&config, dry_run, colored).await,
        Commands::Migrate => cmd_migrate(&config).await,
        Commands::Status => cmd_status(&config, colored).await,
        Commands::Fmt { check, paths } => cmd_fmt(&config, check, paths),
        Commands::Verify => cmd_verify(&config)
    }
}

fn compile_target(config: &Config) -> Result<Vec<housekeeper::ast::Statement>> {
    if config.schema.is_dir() {
        compile_dir(&config.schema)
    } else {
        compile_file(&config.schema)
    }
}

async fn cmd_diff(config: &Config, dry_run: bool, colored: bool) -> Result<i32> {
    config.require_endpoint()?;
    let target = compile_target(config)?;

    let client = HttpClient::connect(&config.clickhouse)?;
    let current = extract_schema(
        &client,
        &ExtractOptions {
            cluster:        config.clickhouse.cluster.clone(),
            inject_cluster: config.inject_cluster
        }
    )
    .await?;

    let options = DiffOptions {
        default_database: config.default_database.clone()
    };
    let plan = diff_with_options(&current, &target, &options)?;

    if plan.is_empty() {
        println!("Schema is up to date.");
        return Ok(0);
    }

    print!("{}", render_plan_summary(&plan, colored));

    if dry_run {
        println!("\n{}", plan.render());
        return Ok(0);
    }

    // Refuse to extend a chain that is already broken.
    let sum = SumFile::load(&config.migrations)?;
    if !sum.entries.is_empty() {
        sum.verify_dir(&config.migrations)?;
    }

    fs::create_dir_all(&config.migrations)
        .map_err(|e| runtime_error(format!("cannot create migrations directory: {}", e)))?;
    let now = Utc::now();
    let version = version_stamp(now);
    let path = config.migrations.join(format!("{}.sql", version));
    fs::write(&path, Migration::render_new(&plan, now))
        .map_err(|e| runtime_error(format!("cannot write {}: {}", path.display(), e)))?;
    SumFile::write(&config.migrations)?;

    println!("Wrote {}", path.display());
    Ok(0)
}

async fn cmd_migrate(config: &Config) -> Result<i32> {
    config.require_endpoint()?;

    let sum = SumFile::load(&config.migrations)?;
    if !sum.entries.is_empty() {
        sum.verify_dir(&config.migrations)?;
    }

    let mut migrations = Vec::new();
    for path in list_migration_files(&config.migrations)? {
        migrations.push(Migration::read(&path)?);
    }
    if migrations.is_empty() {
        println!("No migrations to apply.");
        return Ok(0);
    }

    let client = HttpClient::connect(&config.clickhouse)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_flag.store(true, Ordering::Relaxed);
        }
    });

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    let progress_bar = bar.clone();

    let executor = Executor::new(&client)
        .with_cancel(cancel)
        .with_progress(Box::new(move |version, applied, total| {
            progress_bar.set_message(format!("{}: {}/{}", version, applied, total));
        }));

    let result = executor.apply_all(&migrations).await;
    bar.finish_and_clear();

    let outcomes = result?;
    for (version, outcome) in &outcomes {
        match outcome {
            housekeeper::executor::ApplyOutcome::AlreadyApplied => {
                println!("{}: already applied", version);
            }
            housekeeper::executor::ApplyOutcome::Applied { executed } => {
                println!("{}: applied {} statement(s)", version, executed);
            }
            housekeeper::executor::ApplyOutcome::Cancelled { applied } => {
                println!("{}: cancelled at {} statement(s); rerun to resume", version, applied);
            }
        }
    }
    Ok(0)
}

async fn cmd_status(config: &Config, colored: bool) -> Result<i32> {
    config.require_endpoint()?;
    let client = HttpClient::connect(&config.clickhouse)?;
    let executor = Executor::new(&client);
    executor.ensure_revisions_table().await?;
    let revisions = executor.revisions().await?;

    let local_versions: Vec<String> = list_migration_files(&config.migrations)?
        .iter()
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();

    print!("{}", render_status(&local_versions, &revisions, colored));
    Ok(0)
}

fn cmd_fmt(config: &Config, check: bool, paths: Vec<std::path::PathBuf>) -> Result<i32> {
    let paths = if paths.is_empty() {
        vec![config.schema.clone()]
    } else {
        paths
    };
    let mut dirty = Vec::new();
    for path in paths {
        let original = fs::read_to_string(&path)
            .map_err(|e| runtime_error(format!("cannot read {}: {}", path.display(), e)))?;
        // Comments after the last statement (often trailing import
        // directives) have no statement to attach to and would be lost.
        if has_dangling_trailing_comments(&original)? {
            eprintln!("Skipping {}: comments after the last statement", path.display());
            continue;
        }
        // Formatting is per-file and must not expand imports.
        let statements = housekeeper::compiler::compile_text(&original)?;
        let formatted = render_statements(&statements);
        if formatted != original {
            if check {
                dirty.push(path.display().to_string());
            } else {
                fs::write(&path, &formatted)
                    .map_err(|e| runtime_error(format!("cannot write {}: {}", path.display(), e)))?;
                println!("Formatted {}", path.display());
            }
        }
    }
    if check && !dirty.is_empty() {
        for path in &dirty {
            println!("Would format {}", path);
        }
        return Ok(1);
    }
    Ok(0)
}

fn has_dangling_trailing_comments(text: &str) -> Result<bool> {
    let tokens = housekeeper::lexer::tokenize(text)?;
    let last_semicolon = tokens
        .iter()
        .rposition(|t| t.is_punct(';'))
        .map(|i| i + 1)
        .unwrap_or(0);
    Ok(tokens[last_semicolon..].iter().any(|t| t.is_comment()))
}

fn cmd_verify(config: &Config) -> Result<i32> {
    let sum = SumFile::load(&config.migrations)?;
    sum.verify_dir(&config.migrations)?;
    for path in list_migration_files(&config.migrations)? {
        Migration::read(&path)?;
    }
    println!("Checksum chain is valid ({} migration(s)).", sum.entries.len());
    Ok(0)
}
