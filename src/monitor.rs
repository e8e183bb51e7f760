use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use log::info;
use crate::app::{self, AppManifest, Status};
use crate::config::Config;
use crate::size::dir_size;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Measures how much data a download directory holds
pub trait SizeProbe {
    /// `None` when there is no directory at `path`
    fn size_of(&mut self, path: &Path) -> Option<u64>;
}

/// Walks the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSize;

impl SizeProbe for DiskSize {
    fn size_of(&mut self, path: &Path) -> Option<u64> {
        path.is_dir().then(|| dir_size(path))
    }
}

/// Waits out a sampling window
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Download speed in MB/s (1 MB = 2^20 bytes) for a directory that grew from
/// `start` to `end` bytes over `window`. Shrinking or unchanged is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput(start: u64, end: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if end <= start || secs <= 0.0 {
        return 0.0;
    }

    (end - start) as f64 / BYTES_PER_MB / secs
}

/// One line of output for one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Nothing was downloading this cycle
    Idle { cycle: u32 },
    Speed {
        cycle: u32,
        name: String,
        status: Status,
        mb_per_s: f64,
    },
    /// Marked as downloading, but its download directory is gone
    NotDownloading { cycle: u32, name: String },
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Report::Idle { cycle } => write!(f, "Minute {cycle}: No games are currently downloading."),
            Report::Speed { cycle, name, status, mb_per_s } => {
                write!(f, "Minute {cycle}: Game: {name}, Status: {status}, Speed: {mb_per_s:.2} MB/s")
            }
            Report::NotDownloading { cycle, name } => {
                write!(f, "Minute {cycle}: Game: {name}, Status: Not downloading")
            }
        }
    }
}

/// Samples the download directories of every downloading title, once per
/// cycle, for a fixed number of cycles.
pub struct Monitor<P = DiskSize, S = ThreadSleeper> {
    libraries: Vec<PathBuf>,
    cycles: u32,
    interval: Duration,
    probe: P,
    sleeper: S,
}

impl Monitor {
    #[must_use]
    pub fn new(libraries: Vec<PathBuf>, config: &Config) -> Self {
        Self {
            libraries,
            cycles: config.cycles,
            interval: config.interval(),
            probe: DiskSize,
            sleeper: ThreadSleeper,
        }
    }
}

impl<P: SizeProbe, S: Sleeper> Monitor<P, S> {
    #[must_use]
    pub fn with_probe<Q: SizeProbe>(self, probe: Q) -> Monitor<Q, S> {
        Monitor {
            libraries: self.libraries,
            cycles: self.cycles,
            interval: self.interval,
            probe,
            sleeper: self.sleeper,
        }
    }

    #[must_use]
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Monitor<P, T> {
        Monitor {
            libraries: self.libraries,
            cycles: self.cycles,
            interval: self.interval,
            probe: self.probe,
            sleeper,
        }
    }

    /// Run every cycle, handing each report to `emit` as soon as it is known.
    pub fn run<F: FnMut(&Report)>(&mut self, mut emit: F) {
        for cycle in 1..=self.cycles {
            self.cycle(cycle, &mut emit);
        }
    }

    /// Run a single cycle.
    ///
    /// Titles are read again each cycle so downloads that start or finish
    /// while monitoring are picked up.
    pub fn cycle<F: FnMut(&Report)>(&mut self, cycle: u32, emit: &mut F) {
        let downloading = app::discover(&self.libraries)
            .into_iter()
            .filter(|app| app.state_flags().is_downloading())
            .collect::<Vec<_>>();

        if downloading.is_empty() {
            emit(&Report::Idle { cycle });
            // Keep later cycles on their minute, but don't hold up exiting
            if cycle < self.cycles {
                self.sleeper.sleep(self.interval);
            }
            return;
        }

        info!("Cycle {cycle}: sampling {} download(s)", downloading.len());
        let start = downloading
            .iter()
            .map(|app| self.probe.size_of(&app.download_dir()))
            .collect::<Vec<_>>();

        self.sleeper.sleep(self.interval);

        for (app, start) in downloading.iter().zip(start) {
            emit(&self.measure(cycle, app, start));
        }
    }

    fn measure(&mut self, cycle: u32, app: &AppManifest, start: Option<u64>) -> Report {
        let name = app.name().to_owned();
        match self.probe.size_of(&app.download_dir()) {
            Some(end) => Report::Speed {
                cycle,
                name,
                status: app.state_flags().status(),
                // No starting size means nothing to compare against
                mb_per_s: throughput(start.unwrap_or(end), end, self.interval),
            },
            None => Report::NotDownloading { cycle, name },
        }
    }
}
