use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty (or missing) `meridian.toml` is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub solver: SolverSettings,
    pub server: ServerSettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

/// Parameters shared by the metrics builder and the benchmark engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// The currency every amount is reported in (e.g., "SGD").
    pub base_currency: String,
    /// The book that trades and positions without an explicit book belong to.
    pub default_book: String,
    /// Extra days fetched on each side of a benchmark's price window, to absorb
    /// missing data at the edges.
    pub price_padding_days: i64,
}

/// Parameters for the XIRR solver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Converged once |NPV| drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Where the collaborator snapshot is read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub snapshot_path: PathBuf,
}

/// Console and file logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

/// How log lines are rendered on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

// --- Default Implementations ---

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_currency: "SGD".to_string(),
            default_book: "Default".to_string(),
            price_padding_days: 5,
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iterations: 100,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/snapshot.json"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
            file_prefix: "meridian.log".to_string(),
        }
    }
}

impl ServerSettings {
    /// The socket address built from `host` and `port`, if `host` is an IP address.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.host
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}
