use std::error::Error;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};

/// Warnings and errors go to stderr. With a log directory the whole engine
/// conversation (targets `input` and `output`) is written to a file per run.
///
/// Returns the log file path, if any.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let config = ConfigBuilder::new().set_thread_level(LevelFilter::Off).build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = log_file_path(dir);
            loggers.push(WriteLogger::new(LevelFilter::Info, config, File::create(&path)?));
            Some(path)
        }
        None => None,
    };

    CombinedLogger::init(loggers)?;
    Ok(path)
}

fn log_file_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("{stamp}_{}_log.log", process::id()))
}

#[test]
fn log_file_names_carry_pid() {
    let path = log_file_path(Path::new("/tmp/logs"));
    let name = path.file_name().unwrap().to_string_lossy().to_string();

    assert!(path.starts_with("/tmp/logs"));
    assert!(name.ends_with(&format!("_{}_log.log", process::id())));
}
