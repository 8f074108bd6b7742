use clap::CommandFactory as _;
use clap::error::ErrorKind;
use h2yaml::cli::{Args, initialize};
use h2yaml::h2yaml;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::from_env();

    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match initialize(&args) {
        Ok(Some(config)) => config,
        Ok(None) => return,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    if config.input.as_os_str().is_empty() {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no input header given; pass a file or '-' for standard input",
            )
            .exit();
    }

    match h2yaml(&config) {
        Ok(yaml) => print!("{yaml}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
