pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod hadoop_conf;
pub mod platform;
pub mod properties;
pub mod provision;

pub use error::NodestrapError;

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::executor::CommandExecutor;
use crate::hadoop_conf::Header;
use crate::platform::Platform;
use crate::provision::SetupContext;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(filter)
            .with_writer(io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Loads and validates a profile, then selects its platform.
fn load_platform(file: &camino::Utf8Path) -> Result<(config::Profile, Platform)> {
    let profile = config::load_profile(file)
        .with_context(|| format!("failed to load profile from {}", file))?;
    profile.validate().context("profile validation failed")?;
    let descriptor = profile.descriptor()?;
    let platform = Platform::select(descriptor, &profile.properties);
    Ok((profile, platform))
}

/// Provisions the node: derive platform properties, then run the setup sequence.
pub fn run_apply(opts: &cli::ApplyArgs, executor: &dyn CommandExecutor) -> Result<()> {
    let (profile, platform) = load_platform(&opts.common.file)?;
    let setup = platform.as_setup();

    let mut properties = profile.properties.clone();
    setup.init_properties(&mut properties);

    let ctx = SetupContext::new(executor, profile.setup.clone())
        .with_root(opts.root.clone())
        .with_dry_run(opts.dry_run);
    setup
        .setup(&properties, &ctx)
        .with_context(|| format!("{} setup failed", setup.name()))?;

    info!("setup completed successfully");
    Ok(())
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let (profile, platform) = load_platform(&opts.common.file)?;
    info!("validation successful: platform {}\n{:#?}", profile.descriptor()?, profile);
    tracing::debug!("selected {:?}", platform);

    let mut properties = profile.properties.clone();
    platform.as_setup().init_properties(&mut properties);
    for (key, value) in properties.iter() {
        info!("property {} = {}", key, value);
    }
    Ok(())
}

/// Returns the remote bootstrap commands of the profile's platform.
pub fn run_bootstrap(opts: &cli::BootstrapArgs) -> Result<Vec<String>> {
    let (_, platform) = load_platform(&opts.common.file)?;
    Ok(platform.as_setup().remote_bootstrap())
}

/// Serializes a property file to `opts.output`, or stdout.
pub fn run_conf(opts: &cli::ConfArgs) -> Result<()> {
    let file = config::load_property_file(&opts.file)
        .with_context(|| format!("failed to load property file {}", opts.file))?;
    file.validate().context("property file validation failed")?;

    let header = Header::now();
    match &opts.output {
        Some(path) => hadoop_conf::write_file(path, &header, &file.properties, &file.final_keys)?,
        None => {
            let mut stdout = io::stdout().lock();
            hadoop_conf::serialize(&mut stdout, &header, &file.properties, &file.final_keys)
                .and_then(|()| stdout.flush())
                .context("failed to write configuration to stdout")?;
        }
    }
    Ok(())
}
