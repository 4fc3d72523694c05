use bank_segchart::cli;
use bank_segchart::config::Config;
use bank_segchart::constants::DEFAULT_CONFIG_FILE;
use bank_segchart::error::{self, Result};
use bank_segchart::logging;
use clap::Parser;
use log::info;
use std::path::Path;

fn main() -> Result<()> {
    let cli = cli::opts::Cli::parse();

    match &cli.command {
        Some(cli::opts::Commands::Init { output, force }) => {
            logging::init_simple_logging(cli.verbose, cli.quiet);
            cli::init::handle_init(output, *force)
        }
        Some(cli::opts::Commands::Completions { shell }) => {
            cli::opts::Cli::generate_completions(*shell);
            Ok(())
        }
        Some(cli::opts::Commands::Run { config, no_show }) => {
            let mut cfg = prepare(config, cli.verbose, cli.quiet)?;
            if *no_show {
                cfg.chart.show = false;
            }
            cli::run::handle_run(&cfg).map(|_| ())
        }
        Some(cli::opts::Commands::Validate { config }) => {
            let cfg = prepare(config, cli.verbose, cli.quiet)?;
            cli::validate::handle_validate(&cfg)
        }
        // 无参数运行时等同于 `run`
        None => {
            let cfg = prepare(DEFAULT_CONFIG_FILE, cli.verbose, cli.quiet)?;
            cli::run::handle_run(&cfg).map(|_| ())
        }
    }
}

/// 加载配置、应用环境变量、验证并初始化日志
fn prepare(config_path: &str, verbose: bool, quiet: bool) -> Result<Config> {
    let mut cfg = load_config(config_path)?;
    cfg.apply_env_overrides()?;
    cfg.validate()?;
    eprintln!("Configuration validation passed");

    if verbose {
        cfg.logging.level = "debug".to_string();
    } else if quiet {
        cfg.logging.level = "error".to_string();
    }

    logging::init_logging(&cfg.logging)?;
    info!("Application started");
    Ok(cfg)
}

fn load_config(config_path: &str) -> Result<Config> {
    let path = Path::new(config_path);
    match Config::from_file(path) {
        Ok(c) => {
            eprintln!("Loaded configuration file: {config_path}");
            Ok(c)
        }
        Err(e) => {
            if let error::Error::Config(error::ConfigError::NotFound(_)) = &e {
                eprintln!(
                    "Configuration file not found: {config_path}, using default configuration"
                );
                eprintln!("Tip: run 'segchart init' to generate a configuration file");
                Ok(Config::default())
            } else {
                Err(e)
            }
        }
    }
}
