use clap::Parser;
use panbatch::cli::{self, Cli};
use panbatch::error::{describe_error_code, PanbatchError};
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("panbatch started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            if let Some(err) = e.downcast_ref::<PanbatchError>() {
                debug!("{}", describe_error_code(err.code()));
            }
            eprintln!("Error: {e:#}");
            cli::exit_code_for(&e)
        }
    };
    std::process::exit(code);
}
