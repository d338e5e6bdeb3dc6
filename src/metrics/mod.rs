//! Result aggregation and CSV output (spec.md §4.6/§4.8). The original only
//! ever wrote `avg_q_samples.csv` and `all_q_samples.csv`; the per-host
//! utilization, expected-queue-size, memory-tier, and completion-time files
//! are additions grounded in the same "one writer, one `csv::Writer` per
//! file" pattern.

use crate::simulator::{RunResult, Tier};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum MetricsError {
    CreateOutDir { path: PathBuf, source: std::io::Error },
    WriteCsv { file: &'static str, source: csv::Error },
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::CreateOutDir { path, source } => {
                write!(f, "cannot create output directory {}: {}", path.display(), source)
            }
            MetricsError::WriteCsv { file, source } => {
                write!(f, "cannot write {file}: {source}")
            }
        }
    }
}

impl std::error::Error for MetricsError {}

/// Write every result CSV into `out_dir`, creating it if necessary.
pub fn write_results(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    std::fs::create_dir_all(out_dir).map_err(|source| MetricsError::CreateOutDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    write_avg_q_samples(out_dir, results)?;
    write_all_q_samples(out_dir, results)?;
    write_expected_avg_qsizes(out_dir, results)?;
    write_cpu_utilization(out_dir, results)?;
    write_mem_access_counts(out_dir, results)?;
    write_completion_times(out_dir, results)?;
    Ok(())
}

fn csv_writer(out_dir: &Path, file: &'static str) -> Result<csv::Writer<std::fs::File>, MetricsError> {
    csv::Writer::from_path(out_dir.join(file)).map_err(|source| MetricsError::WriteCsv { file, source })
}

fn write_avg_q_samples(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "avg_q_samples.csv")?;
    w.write_record(["run", "time_ns", "avg_queue_len"])
        .map_err(|source| MetricsError::WriteCsv { file: "avg_q_samples.csv", source })?;
    for r in results {
        for sample in &r.samples {
            let avg = sample.queue_lens.iter().sum::<usize>() as f64 / sample.queue_lens.len() as f64;
            w.write_record([
                r.run_index.to_string(),
                sample.time.as_nanos().to_string(),
                avg.to_string(),
            ])
            .map_err(|source| MetricsError::WriteCsv { file: "avg_q_samples.csv", source })?;
        }
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "avg_q_samples.csv",
        source: csv::Error::from(e),
    })
}

fn write_all_q_samples(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "all_q_samples.csv")?;
    w.write_record(["run", "time_ns", "host", "queue_len"])
        .map_err(|source| MetricsError::WriteCsv { file: "all_q_samples.csv", source })?;
    for r in results {
        for sample in &r.samples {
            for (host, len) in sample.queue_lens.iter().enumerate() {
                w.write_record([
                    r.run_index.to_string(),
                    sample.time.as_nanos().to_string(),
                    host.to_string(),
                    len.to_string(),
                ])
                .map_err(|source| MetricsError::WriteCsv { file: "all_q_samples.csv", source })?;
            }
        }
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "all_q_samples.csv",
        source: csv::Error::from(e),
    })
}

fn write_expected_avg_qsizes(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "expected_avg_qsizes.csv")?;
    w.write_record(["run", "host", "expected_avg_queue_size"])
        .map_err(|source| MetricsError::WriteCsv { file: "expected_avg_qsizes.csv", source })?;
    for r in results {
        for (host, counters) in r.host_counters.iter().enumerate() {
            let completion = crate::simulator::Duration::from_nanos(r.completion_time.as_nanos());
            w.write_record([
                r.run_index.to_string(),
                host.to_string(),
                counters.expected_avg_queue_size(completion).to_string(),
            ])
            .map_err(|source| MetricsError::WriteCsv { file: "expected_avg_qsizes.csv", source })?;
        }
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "expected_avg_qsizes.csv",
        source: csv::Error::from(e),
    })
}

fn write_cpu_utilization(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "cpu_utilization.csv")?;
    w.write_record(["run", "host", "utilization"])
        .map_err(|source| MetricsError::WriteCsv { file: "cpu_utilization.csv", source })?;
    for r in results {
        for (host, counters) in r.host_counters.iter().enumerate() {
            let completion = crate::simulator::Duration::from_nanos(r.completion_time.as_nanos());
            w.write_record([
                r.run_index.to_string(),
                host.to_string(),
                counters.utilization(completion).to_string(),
            ])
            .map_err(|source| MetricsError::WriteCsv { file: "cpu_utilization.csv", source })?;
        }
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "cpu_utilization.csv",
        source: csv::Error::from(e),
    })
}

fn write_mem_access_counts(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "mem_access_counts.csv")?;
    w.write_record(["run", "tier", "count"])
        .map_err(|source| MetricsError::WriteCsv { file: "mem_access_counts.csv", source })?;
    for r in results {
        let reg: u64 = r.host_counters.iter().map(|c| c.reg_count).sum();
        let llc: u64 = r.host_counters.iter().map(|c| c.llc_count).sum();
        let mem: u64 = r.host_counters.iter().map(|c| c.mem_count).sum();
        for (tier, count) in [
            (tier_label(Tier::Reg), reg),
            (tier_label(Tier::Llc), llc),
            (tier_label(Tier::Mem), mem),
        ] {
            w.write_record([r.run_index.to_string(), tier.to_string(), count.to_string()])
                .map_err(|source| MetricsError::WriteCsv { file: "mem_access_counts.csv", source })?;
        }
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "mem_access_counts.csv",
        source: csv::Error::from(e),
    })
}

fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::Reg => "register",
        Tier::Llc => "llc",
        Tier::Mem => "main_memory",
    }
}

fn write_completion_times(out_dir: &Path, results: &[RunResult]) -> Result<(), MetricsError> {
    let mut w = csv_writer(out_dir, "completion_times.csv")?;
    w.write_record(["run", "completion_time_ns"])
        .map_err(|source| MetricsError::WriteCsv { file: "completion_times.csv", source })?;
    for r in results {
        w.write_record([r.run_index.to_string(), r.completion_time.as_nanos().to_string()])
            .map_err(|source| MetricsError::WriteCsv { file: "completion_times.csv", source })?;
    }
    w.flush().map_err(|e| MetricsError::WriteCsv {
        file: "completion_times.csv",
        source: csv::Error::from(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{HostCounters, VirtualTime};

    fn sample_result() -> RunResult {
        RunResult {
            run_index: 0,
            completion_time: VirtualTime::from_nanos(700),
            samples: vec![crate::simulator::QueueSample {
                time: VirtualTime::ZERO,
                queue_lens: vec![1, 2],
            }],
            host_counters: vec![HostCounters::default(), HostCounters::default()],
        }
    }

    #[test]
    fn writes_all_six_files() {
        let dir = tempfile::tempdir().unwrap();
        write_results(dir.path(), &[sample_result()]).unwrap();
        for file in [
            "avg_q_samples.csv",
            "all_q_samples.csv",
            "expected_avg_qsizes.csv",
            "cpu_utilization.csv",
            "mem_access_counts.csv",
            "completion_times.csv",
        ] {
            assert!(dir.path().join(file).exists(), "missing {file}");
        }
    }
}
