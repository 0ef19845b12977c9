//! Processing many lightcurve files.
//!
//! Every file runs through its own [`Pipeline`] pass. A failing file is
//! logged and recorded in the report, produces no output, and does not stop
//! the remaining files.

use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineSummary};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for [`run_batch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Input file extension (without the dot)
    pub extension: String,
    /// Process files concurrently
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extension: "txt".to_string(),
            parallel: false,
        }
    }
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// A file that was folded and written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSuccess {
    pub path: PathBuf,
    pub output: PathBuf,
    pub summary: PipelineSummary,
}

/// Outcome of a batch run, in input-file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Number of files attempted.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every file succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Files in `dir` with the given extension, sorted by path.
pub fn collect_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Process one file: load, run the pipeline, write the folded output.
fn process_file(
    pipeline: &Pipeline,
    path: &Path,
    output_dir: &Path,
) -> Result<BatchSuccess> {
    let result = pipeline.run_file(path)?;
    let output = Pipeline::output_path(output_dir, &result);
    result.write(&output)?;
    Ok(BatchSuccess {
        path: path.to_path_buf(),
        output,
        summary: result.summary(),
    })
}

/// Process `paths` and write the folded lightcurves into `output_dir`.
///
/// Only failure to create `output_dir` is returned as an error; per-file
/// errors end up in [`BatchReport::failed`].
pub fn process_files(
    pipeline: &Pipeline,
    paths: &[PathBuf],
    output_dir: &Path,
    config: &BatchConfig,
) -> Result<BatchReport> {
    fs::create_dir_all(output_dir)?;

    let run = |path: &PathBuf| (path.clone(), process_file(pipeline, path, output_dir));
    let outcomes: Vec<(PathBuf, Result<BatchSuccess>)> = if config.parallel {
        run_parallel(paths, run)
    } else {
        paths.iter().map(run).collect()
    };

    let mut report = BatchReport::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(success) => report.succeeded.push(success),
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                report.failed.push(BatchFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "processed {} files: {} folded, {} failed",
        report.total(),
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(feature = "parallel")]
fn run_parallel<F, T>(paths: &[PathBuf], run: F) -> Vec<T>
where
    F: Fn(&PathBuf) -> T + Sync + Send,
    T: Send,
{
    crate::slice_maybe_parallel!(paths).map(run).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<F, T>(paths: &[PathBuf], run: F) -> Vec<T>
where
    F: Fn(&PathBuf) -> T,
{
    log::debug!("built without the `parallel` feature, processing sequentially");
    paths.iter().map(run).collect()
}

/// Process every matching file in `input_dir`.
pub fn run_batch(
    pipeline: &Pipeline,
    input_dir: &Path,
    output_dir: &Path,
    config: &BatchConfig,
) -> Result<BatchReport> {
    let paths = collect_inputs(input_dir, &config.extension)?;
    log::info!(
        "found {} .{} files in {}",
        paths.len(),
        config.extension,
        input_dir.display()
    );
    process_files(pipeline, &paths, output_dir, config)
}
