use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::info;

use enginegui::frontend::run;
use enginegui::logger::init_logging;
use enginegui::Config;

/// Headless chess board backed by a UCI-style engine process.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Engine executable, overrides ENGINE_PATH
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Arguments passed to the engine
    #[arg(long = "engine-arg")]
    engine_args: Vec<String>,

    /// Directory for the engine conversation log, overrides ENGINE_LOG_DIR
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Give up on an engine reply after this long, overrides ENGINE_WAIT_TIMEOUT_MS
    #[arg(long)]
    wait_timeout_ms: Option<u64>,

    /// Side of one board square in pixels
    #[arg(long)]
    square_size: Option<f32>,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::from_env();

        if let Some(engine) = self.engine {
            config.engine_path = engine;
        }
        if !self.engine_args.is_empty() {
            config.engine_args = self.engine_args;
        }
        if let Some(dir) = self.log_dir {
            config.log_dir = Some(dir);
        }
        if let Some(ms) = self.wait_timeout_ms {
            config.wait_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(size) = self.square_size {
            config.square_size = size;
        }

        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Args::parse().into_config();

    match init_logging(config.log_dir.as_deref()) {
        Ok(Some(path)) => info!("logging engine conversation to {path:?}"),
        Ok(None) => {}
        Err(err) => eprintln!("could not set up logging: {err}"),
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
