use clap::Parser;
use std::io;

use crate::action::interactive::process_interactive_mode;
use crate::config::config::{pair_directories, validate_config, Cli};
use crate::config::ports::{AppConfig, ConfigPort};
use crate::facade::conversion_facade::ConversionFacade;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::BatchOutcome;
use crate::service::config_service::{load_config_file, ConfigService};
use crate::utils::utils::setup_logging;

pub fn process_args(args: Vec<String>) -> io::Result<BatchOutcome> {
    if args.len() == 1 {
        process_interactive_mode()
    } else {
        process_cli_mode(Cli::parse_from(args))
    }
}

pub fn process_cli_mode(cli: Cli) -> io::Result<BatchOutcome> {
    let config_service = ConfigService::new(Box::new(CliConfigAdapter::new(cli.clone())));
    // 設定檔也可指定日誌等級，合併後才初始化
    let config = config_service.resolve()?;
    setup_logging(&config.log_level)?;
    validate_config(&config)?;

    // 若啟用 --show-config，先顯示實際使用的配置
    if cli.show_config {
        println!("實際使用的配置：{:#?}", config);
    }

    run_batch(&config)
}

pub fn run_batch(config: &AppConfig) -> io::Result<BatchOutcome> {
    let facade = ConversionFacade::from_config(config);
    facade.execute_batch(config)
}

// CLI 配置適配器：以設定檔（或預設值）為基礎，再套用命令列參數
pub struct CliConfigAdapter {
    cli: Cli,
}

impl CliConfigAdapter {
    pub fn new(cli: Cli) -> Self {
        CliConfigAdapter { cli }
    }
}

impl ConfigPort for CliConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let cli = &self.cli;
        let mut config = match &cli.config {
            Some(path) => load_config_file(path)?,
            None => AppConfig::default(),
        };

        if !cli.input.is_empty() || !cli.output.is_empty() {
            config.pairs = pair_directories(&cli.input, &cli.output)?;
        }
        if let Some(extensions) = &cli.extension {
            config.extensions = extensions.clone();
        }
        if let Some(exclude) = &cli.exclude {
            config.exclude = exclude.clone();
        }
        if let Some(reference) = &cli.reference {
            config.reference_file = Some(reference.clone());
        }
        if let Some(max_concurrent) = cli.max_concurrent {
            config.max_concurrent = max_concurrent;
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(backoff) = cli.backoff {
            config.backoff_secs = backoff;
        }
        if let Some(jitter_ms) = cli.jitter_ms {
            config.jitter_ms = jitter_ms;
        }
        if let Some(export_timeout) = cli.export_timeout {
            config.export_timeout_secs = export_timeout;
        }
        if let Some(office_bin) = &cli.office_bin {
            config.office_binary = Some(office_bin.clone());
        }
        if let Some(log_level) = &cli.log_level {
            config.log_level = log_level.clone();
        }
        config.no_dialog |= cli.no_dialog;
        config.no_progress |= cli.no_progress;
        Ok(config)
    }
}
