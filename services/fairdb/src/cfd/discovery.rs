//! Invoke the external CFD discovery executable

use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{error, info};

use crate::cfd::pipeline::load_raw_cfds;
use crate::config::CfdConfig;
use crate::error::{FairDbError, Result};

/// Summary of a successful discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub elapsed_ms: u128,
}

pub struct CfdDiscovery {
    config: CfdConfig,
}

impl CfdDiscovery {
    pub fn new(config: CfdConfig) -> Self {
        Self { config }
    }

    /// Argument list passed after the executable path
    pub fn arguments(&self, input_csv: &Path) -> Vec<String> {
        vec![
            input_csv.to_string_lossy().to_string(),
            self.config.support_count.to_string(),
            self.config.confidence.to_string(),
            self.config.max_condition_size.to_string(),
        ]
    }

    /// Run the miner once and save its stdout to `output_txt`.
    ///
    /// The output file is only created when the process exits successfully.
    pub async fn run(&self, input_csv: &Path, output_txt: &Path) -> Result<DiscoveryReport> {
        let exe = self.config.executable()?;
        let args = self.arguments(input_csv);
        info!("Running CFD discovery: {} {}", exe, args.join(" "));

        let started = Instant::now();
        let output = Command::new(exe)
            .args(&args)
            .output()
            .await
            .map_err(|source| FairDbError::Spawn {
                path: PathBuf::from(exe),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("CFD discovery failed ({}): {}", output.status, stderr);
            return Err(FairDbError::ExternalProcess {
                status: output.status.to_string(),
                stderr,
            });
        }

        if let Some(parent) = output_txt.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Stage next to the target so the rename stays on one filesystem
        let staging = output_txt.with_extension("part");
        let staged = match tokio::fs::write(&staging, &output.stdout).await {
            Ok(()) => tokio::fs::rename(&staging, output_txt).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            error!("Failed to save CFD output to {:?}: {}", output_txt, e);
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        let report = DiscoveryReport {
            output_path: output_txt.to_path_buf(),
            bytes_written: output.stdout.len(),
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            "CFD discovery completed in {} ms, output saved to {:?}",
            report.elapsed_ms, report.output_path
        );
        Ok(report)
    }

    /// Run discovery and read back the mined lines
    pub async fn run_and_load(&self, input_csv: &Path, output_txt: &Path) -> Result<Vec<String>> {
        self.run(input_csv, output_txt).await?;
        load_raw_cfds(output_txt)
    }
}
