use std::collections::BTreeMap;
use std::process::ExitCode;

use gather::{CancellationToken, Dispatcher, Metadata};
use serde::Serialize;

mod args;
mod error;
mod fetch;
mod manifest;
mod progress;

use args::{OutputFormat, ValidatedCommand};
use error::AppError;

fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(AppError::output),
        OutputFormat::Toml => toml::to_string(value).map_err(AppError::output),
    }
}

fn classify(inputs: &[String]) -> Result<(), AppError> {
    let mut failed = 0usize;
    for input in inputs {
        match gather::classify(input) {
            Ok(uri_type) => println!("{input}\t{uri_type}"),
            Err(err) => {
                eprintln!("❌ {:#}", anyhow::Error::new(AppError::classify(input.clone(), err)));
                failed += 1;
            }
        }
    }
    match failed {
        0 => Ok(()),
        n => Err(AppError::classify_many(n)),
    }
}

async fn get(
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    source: String,
    destination: std::path::PathBuf,
    no_clobber: bool,
    format: Option<OutputFormat>,
) -> Result<(), AppError> {
    let metadata = fetch::gather_to(dispatcher, cancel, &source, &destination, no_clobber)
        .await
        .map_err(|err| AppError::gather_one(source, err))?;
    match format {
        Some(format) => println!("{}", format_output(&metadata, format)?),
        None => println!("✅ {metadata}"),
    }
    Ok(())
}

async fn sync(
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    manifest: std::path::PathBuf,
    out_dir: std::path::PathBuf,
    no_clobber: bool,
    format: Option<OutputFormat>,
) -> Result<(), AppError> {
    let manifest_name = manifest.display().to_string();
    let document = std::fs::read_to_string(&manifest)
        .map_err(|err| AppError::manifest_read(manifest_name.clone(), err))?;
    let entries = manifest::try_parse_toml(&document)
        .map_err(|err| AppError::manifest_parse(manifest_name, err))?;
    log::debug!("gathering {} source(s) into {}", entries.len(), out_dir.display());

    let mut gathered = BTreeMap::<String, Metadata>::new();
    let mut errors = 0usize;
    for result in fetch::concurrent_gather(dispatcher, cancel, entries, &out_dir, no_clobber).await
    {
        match result {
            Ok((name, metadata)) => {
                gathered.insert(name, metadata);
            }
            Err(err) => {
                eprintln!("❌ {:#}", anyhow::Error::new(err));
                errors += 1;
            }
        }
    }

    match format {
        Some(format) => println!("{}", format_output(&gathered, format)?),
        None => {
            for metadata in gathered.values() {
                println!("✅ {metadata}");
            }
            println!("\n🎉 Successfully gathered {} source(s)!", gathered.len());
        }
    }

    if errors > 0 {
        return Err(AppError::gather());
    }
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let args = args::parse()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.to_string()),
    )
    .init();
    log::debug!("{args:?}");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, cancelling in-flight gathers");
            on_interrupt.cancel();
        }
    });

    let dispatcher = Dispatcher::default();
    log::debug!("registered protocols: {:?}", dispatcher.registry().protocols());

    match args.command {
        ValidatedCommand::Get {
            source,
            destination,
            no_clobber,
            format,
        } => get(&dispatcher, &cancel, source, destination, no_clobber, format).await,
        ValidatedCommand::Classify { inputs } => classify(&inputs),
        ValidatedCommand::Sync {
            manifest,
            out_dir,
            no_clobber,
            format,
        } => sync(&dispatcher, &cancel, manifest, out_dir, no_clobber, format).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("Error: {:?}", anyhow::Error::new(err));
            code
        }
    }
}
