use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use log::{error, info};
use simplelog::TermLogger;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use steamrate::{steam, Config, Monitor, Report, Status};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    /// number of sampling cycles to run
    #[arg(long)]
    cycles: Option<u32>,

    /// seconds per sampling cycle
    #[arg(long)]
    interval: Option<u64>,

    /// steam installation to use instead of searching for one
    #[arg(long)]
    steam_root: Option<PathBuf>,

    /// additional library root to watch, may be repeated
    #[arg(long = "library")]
    libraries: Vec<PathBuf>,

    /// config file to read instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::read(path).with_context(|| format!("failed to read {}", path.display()))?,
            None => Config::read_or_default().context("failed to read the default config")?,
        };

        if let Some(cycles) = self.cycles {
            anyhow::ensure!(cycles > 0, "--cycles must be at least 1");
            config.cycles = cycles;
        }

        if let Some(interval) = self.interval {
            anyhow::ensure!(interval > 0, "--interval must be at least 1");
            config.interval_secs = interval;
        }

        if let Some(root) = &self.steam_root {
            config.steam_root = Some(root.clone());
        }

        config.extra_libraries.extend(self.libraries.iter().cloned());
        Ok(config)
    }
}

fn print_report(stdout: &mut StandardStream, report: &Report) -> std::io::Result<()> {
    let color = match report {
        Report::Speed { status: Status::Downloading, .. } => Some(Color::Green),
        Report::Speed { status: Status::Paused, .. } => Some(Color::Yellow),
        Report::NotDownloading { .. } => Some(Color::Red),
        Report::Idle { .. } => None,
    };

    stdout.set_color(ColorSpec::new().set_fg(color))?;
    writeln!(stdout, "{report}")?;
    stdout.reset()
}

/// Exit status and message for the errors that leave nothing to monitor
fn fatal_status(e: &steamrate::Error) -> Option<(u8, &'static str)> {
    match e {
        steamrate::Error::SteamNotFound => Some((2, "Could not find Steam installation.")),
        steamrate::Error::LibraryFoldersNotFound(_) => Some((3, "Library folders file not found.")),
        _ => None,
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    TermLogger::init(
        if cli.verbose {
            simplelog::LevelFilter::Info
        } else {
            simplelog::LevelFilter::Warn
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let config = cli.config()?;
    let candidates = steam::steam_root_candidates(config.steam_root.as_deref());

    let libraries = match steam::discover_libraries(&candidates, &config.extra_libraries) {
        Ok(libraries) => libraries,
        Err(e) => match fatal_status(&e) {
            Some((status, message)) => {
                info!("{e}");
                println!("{message}");
                return Ok(ExitCode::from(status));
            }
            None => return Err(e).context("failed to read steam's library folders"),
        },
    };

    let mut stdout = StandardStream::stdout(termcolor::ColorChoice::Auto);
    Monitor::new(libraries, &config).run(|report| {
        if let Err(e) = print_report(&mut stdout, report) {
            error!("Failed to write report: {e}");
        }
    });

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::TempDir;
    use steamrate::steam;
    use super::fatal_status;

    #[test]
    fn no_steam_root_exits_with_2() {
        let tmp = TempDir::new().unwrap();
        let e = steam::discover_libraries(&[tmp.path().join("missing")], &[]).unwrap_err();
        assert_eq!(fatal_status(&e), Some((2, "Could not find Steam installation.")));
    }

    #[test]
    fn no_libraryfolders_exits_with_3() {
        let tmp = TempDir::new().unwrap();
        let e = steam::discover_libraries(&[tmp.path().to_owned()], &[]).unwrap_err();
        assert_eq!(fatal_status(&e), Some((3, "Library folders file not found.")));
    }

    #[test]
    fn other_errors_are_not_fatal_statuses() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("steamapps")).unwrap();
        fs::write(tmp.path().join("steamapps/libraryfolders.vdf"), "\"libraryfolders\" {").unwrap();

        let e = steam::discover_libraries(&[tmp.path().to_owned()], &[]).unwrap_err();
        assert_eq!(fatal_status(&e), None);
    }
}
