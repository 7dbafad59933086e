use anyhow::Context;
use clap::Parser;

use thriftstock_cli::{App, Cli, Command, execute};
use thriftstock_infra::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_env();
    cli.apply_overrides(&mut config);

    thriftstock_observability::init(config.logging.format);

    let store = config
        .build_store()
        .context("failed to set up inventory storage")?;
    let mut app = App::open(store, &config).with_context(|| {
        format!("failed to load inventory from {}", config.data.path.display())
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.command.unwrap_or(Command::Interactive), &mut app, &mut out)
}
