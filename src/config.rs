//! Configuration surface: CLI flags (clap), an optional TOML overlay, and
//! the resolved `SimConfig` the simulator core actually runs on. This
//! module — along with sample-file loading and CSV output — is the "thin
//! glue" spec.md §1 calls out of scope for the core; it exists here so the
//! crate is runnable end to end.

use crate::error::ConfigError;
use crate::simulator::{AccessOrder, NicType};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Resolved configuration the simulator core runs on.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub net_delay: u64,
    pub nic_type: NicType,
    pub nic_buf_size: usize,
    pub llc_size: usize,
    pub mem_delay: u64,
    pub llc_delay: u64,
    pub reg_delay: u64,
    pub mem_access_time: u64,
    pub llc_access_time: u64,
    pub reg_access_time: u64,
    pub hosts: usize,
    pub depth: u32,
    pub runs: u32,
    pub seed: u64,
    pub sample_period: u64,
    pub access_order: AccessOrder,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            net_delay: 1000,
            nic_type: NicType::Reg,
            nic_buf_size: 0,
            llc_size: 0,
            mem_delay: 0,
            llc_delay: 0,
            reg_delay: 0,
            mem_access_time: 0,
            llc_access_time: 0,
            reg_access_time: 0,
            hosts: 10,
            depth: 3,
            runs: 1,
            seed: 1,
            sample_period: 1000,
            access_order: AccessOrder::Fifo,
        }
    }
}

/// Command-line surface. Every field is optional so a value can instead
/// come from `--config` or fall back to `SimConfig::default()`; CLI flags
/// win over the config file, which wins over built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "othello-sim", about = "Othello map/reduce discrete-event simulator")]
pub struct Cli {
    /// Optional TOML file overlaying the built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// NIC-to-NIC fabric delay (ns).
    #[arg(long)]
    pub net_delay: Option<u64>,

    /// NIC-to-CPU memory placement policy.
    #[arg(long, value_enum)]
    pub nic_type: Option<NicType>,

    /// Messages before LLC spill.
    #[arg(long)]
    pub nic_buf_size: Option<usize>,

    /// Additional messages before main-memory spill.
    #[arg(long)]
    pub llc_size: Option<usize>,

    #[arg(long)]
    pub mem_delay: Option<u64>,
    #[arg(long)]
    pub llc_delay: Option<u64>,
    #[arg(long)]
    pub reg_delay: Option<u64>,
    #[arg(long)]
    pub mem_access_time: Option<u64>,
    #[arg(long)]
    pub llc_access_time: Option<u64>,
    #[arg(long)]
    pub reg_access_time: Option<u64>,

    /// File that contains service-time samples (one float per line).
    #[arg(long)]
    pub service: Option<PathBuf>,

    /// File that contains branch-factor samples (one positive integer per line).
    #[arg(long)]
    pub branch: Option<PathBuf>,

    /// Number of hosts to use in the simulation.
    #[arg(long)]
    pub hosts: Option<usize>,

    /// How deep to search into the game tree. Must be >= 1.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Number of independent simulation runs.
    #[arg(long)]
    pub runs: Option<u32>,

    /// RNG seed driving all service/branch draws.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Queue-sampler tick period (ns).
    #[arg(long)]
    pub sample_period: Option<u64>,

    /// Access-time record ordering (fifo is the corrected default).
    #[arg(long, value_enum)]
    pub access_order: Option<AccessOrder>,

    /// Directory results are written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// The subset of `SimConfig` (plus the two sample-file paths and the output
/// directory) that can also be supplied by a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFileOverlay {
    pub net_delay: Option<u64>,
    pub nic_type: Option<NicType>,
    pub nic_buf_size: Option<usize>,
    pub llc_size: Option<usize>,
    pub mem_delay: Option<u64>,
    pub llc_delay: Option<u64>,
    pub reg_delay: Option<u64>,
    pub mem_access_time: Option<u64>,
    pub llc_access_time: Option<u64>,
    pub reg_access_time: Option<u64>,
    pub service: Option<PathBuf>,
    pub branch: Option<PathBuf>,
    pub hosts: Option<usize>,
    pub depth: Option<u32>,
    pub runs: Option<u32>,
    pub seed: Option<u64>,
    pub sample_period: Option<u64>,
    pub access_order: Option<AccessOrder>,
    pub out_dir: Option<PathBuf>,
}

/// Fully resolved run: the simulator config plus the out-of-core glue
/// (sample file paths, output directory) needed to drive it.
pub struct ResolvedRun {
    pub sim: SimConfig,
    pub service_path: PathBuf,
    pub branch_path: PathBuf,
    pub out_dir: PathBuf,
}

macro_rules! layer {
    ($cli:expr, $file:expr, $default:expr, $field:ident) => {
        $cli.$field.or($file.$field).unwrap_or($default)
    };
}

impl Cli {
    /// Resolve CLI flags, an optional config file, and built-in defaults
    /// into a runnable configuration. Fails fast on a missing/invalid
    /// config file or an out-of-range `depth` (spec.md §7).
    pub fn resolve(self) -> Result<ResolvedRun, ConfigError> {
        let file = match &self.config {
            Some(path) => load_overlay(path)?,
            None => ConfigFileOverlay::default(),
        };
        let d = SimConfig::default();

        let depth = layer!(self, file, d.depth, depth);
        if depth < 1 {
            return Err(ConfigError::InvalidDepth { depth });
        }

        let sim = SimConfig {
            net_delay: layer!(self, file, d.net_delay, net_delay),
            nic_type: layer!(self, file, d.nic_type, nic_type),
            nic_buf_size: layer!(self, file, d.nic_buf_size, nic_buf_size),
            llc_size: layer!(self, file, d.llc_size, llc_size),
            mem_delay: layer!(self, file, d.mem_delay, mem_delay),
            llc_delay: layer!(self, file, d.llc_delay, llc_delay),
            reg_delay: layer!(self, file, d.reg_delay, reg_delay),
            mem_access_time: layer!(self, file, d.mem_access_time, mem_access_time),
            llc_access_time: layer!(self, file, d.llc_access_time, llc_access_time),
            reg_access_time: layer!(self, file, d.reg_access_time, reg_access_time),
            hosts: layer!(self, file, d.hosts, hosts),
            depth,
            runs: layer!(self, file, d.runs, runs),
            seed: layer!(self, file, d.seed, seed),
            sample_period: layer!(self, file, d.sample_period, sample_period),
            access_order: layer!(self, file, d.access_order, access_order),
        };

        let service_path = self
            .service
            .or(file.service)
            .unwrap_or_else(|| PathBuf::from("dist/1-level-search.txt"));
        let branch_path = self
            .branch
            .or(file.branch)
            .unwrap_or_else(|| PathBuf::from("dist/move-count.txt"));
        let out_dir = self
            .out_dir
            .or(file.out_dir)
            .unwrap_or_else(|| PathBuf::from("out"));

        Ok(ResolvedRun {
            sim,
            service_path,
            branch_path,
            out_dir,
        })
    }
}

fn load_overlay(path: &Path) -> Result<ConfigFileOverlay, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::MissingSampleFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::InvalidConfigFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_overrides() {
        let cli = Cli {
            config: None,
            net_delay: None,
            nic_type: None,
            nic_buf_size: None,
            llc_size: None,
            mem_delay: None,
            llc_delay: None,
            reg_delay: None,
            mem_access_time: None,
            llc_access_time: None,
            reg_access_time: None,
            service: None,
            branch: None,
            hosts: None,
            depth: None,
            runs: None,
            seed: None,
            sample_period: None,
            access_order: None,
            out_dir: None,
        };
        let resolved = cli.resolve().unwrap();
        assert_eq!(resolved.sim.hosts, 10);
        assert_eq!(resolved.sim.depth, 3);
        assert_eq!(resolved.sim.nic_type, NicType::Reg);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let mut cli_defaults = |depth| Cli {
            config: None,
            net_delay: None,
            nic_type: None,
            nic_buf_size: None,
            llc_size: None,
            mem_delay: None,
            llc_delay: None,
            reg_delay: None,
            mem_access_time: None,
            llc_access_time: None,
            reg_access_time: None,
            service: None,
            branch: None,
            hosts: None,
            depth,
            runs: None,
            seed: None,
            sample_period: None,
            access_order: None,
            out_dir: None,
        };
        let err = cli_defaults(Some(0)).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDepth { depth: 0 }));
    }
}
