use anyhow::Result;
use clap::{CommandFactory, Parser};
use mediascribe::cli::{Cli, Commands, ConfigAction};
use mediascribe::config::Config;
use mediascribe::diagnostics::{check_dependencies, list_models};
use mediascribe::models::ModelTier;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        None => {
            let Some(input) = cli.input.clone() else {
                Cli::command().print_help()?;
                std::process::exit(2);
            };
            let config = effective_config(&cli)?;
            mediascribe::app::run_transcribe(&config, input, cli.quiet)?;
        }
        Some(Commands::Check) => {
            let config = effective_config(&cli)?;
            check_dependencies(&config.decode.ffmpeg);
        }
        Some(Commands::Models) => {
            list_models();
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Path => {
                println!("{}", Config::default_path().display());
            }
            ConfigAction::Show => {
                let config = effective_config(&cli)?;
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "mediascribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Assemble the effective configuration.
///
/// Priority order, lowest to highest:
/// 1. Built-in defaults
/// 2. Config file (--config path, or the default location if it exists)
/// 3. Environment variable overrides
/// 4. CLI flags
fn effective_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(path) = cli.config.as_deref() {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    let mut config = config.with_env_overrides();

    if let Some(model) = &cli.model {
        config.stt.model = model.parse::<ModelTier>().map_err(anyhow::Error::msg)?;
    }
    if let Some(language) = &cli.language {
        config.stt.language = language.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(batch_size) = cli.batch_size {
        config.stt.batch_size = batch_size;
    }
    if let Some(timeout) = cli.timeout {
        config.decode.timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}
