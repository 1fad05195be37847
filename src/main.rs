//! Binary entry point for the knife-joyent CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use knife_joyent::{
    BootstrapError, BootstrapOptions, ConfigError, JoyentConfig, JoyentError, JoyentProvider,
    KnifeBootstrapper, KnifeConfig, Provider, ProvisionError, ProvisionOrchestrator,
    ProvisionOutcome, ProvisionRequest, RequestError, TcpProber, WaitConfig, parse_run_list,
    render_flavor_table,
};

mod cli;

use cli::{Cli, CreateCommand, FlavorCommand, ServerCommand};

const LOG_ENV: &str = "KNIFE_JOYENT_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("provider error: {0}")]
    Provider(#[from] JoyentError),
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
    #[error("{0}")]
    Provision(#[from] ProvisionError<JoyentError, BootstrapError>),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Server(ServerCommand::Create(command)) => create_server(command).await,
        Cli::Flavor(FlavorCommand::List) => list_flavors().await,
    }
}

fn load_provider() -> Result<JoyentProvider, CliError> {
    let config = JoyentConfig::load_without_cli_args()?;
    config.validate()?;
    Ok(JoyentProvider::new(config)?)
}

async fn create_server(command: CreateCommand) -> Result<i32, CliError> {
    let (request, options) = build_inputs(command)?;
    let provider = load_provider()?;
    let wait = WaitConfig::load_without_cli_args()?;
    wait.validate()?;
    let knife = KnifeConfig::load_without_cli_args()?;

    let orchestrator = ProvisionOrchestrator::new(
        provider,
        TcpProber::new(wait.probe_timeout()),
        KnifeBootstrapper::streaming(knife.knife_bin),
    )
    .with_readiness_poller(wait.readiness_poller())
    .with_reachability_policy(wait.reachability_policy());

    let mut stdout = io::stdout();
    let outcome = orchestrator
        .provision(&request, &options, &mut stdout)
        .await?;
    if let ProvisionOutcome::Rejected { message } = &outcome {
        write_rejection(io::stderr(), &message.message);
    }
    Ok(outcome.exit_code())
}

async fn list_flavors() -> Result<i32, CliError> {
    let provider = load_provider()?;
    let flavors = provider.list_flavors().await?;
    write!(io::stdout(), "{}", render_flavor_table(&flavors))?;
    Ok(0)
}

fn build_inputs(command: CreateCommand) -> Result<(ProvisionRequest, BootstrapOptions), CliError> {
    let request = ProvisionRequest::builder()
        .name(command.name)
        .image(command.image)
        .flavor(command.flavor)
        .build()?;
    let options = BootstrapOptions {
        run_list: parse_run_list(&command.run_list),
        ssh_user: command.ssh_user,
        identity_file: command.identity_file.map(Utf8PathBuf::from),
        node_name: command.node_name,
        prerelease: command.prerelease,
        distro: command.distro,
        host_key_verify: !command.no_host_key_verify,
        environment: command.environment,
        do_not_bootstrap: command.do_not_bootstrap,
    };
    Ok((request, options))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "ERROR: {err}").ok();
}

fn write_rejection(mut target: impl Write, message: &str) {
    writeln!(target, "ERROR: {message}").ok();
}
