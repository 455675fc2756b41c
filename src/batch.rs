//! Batch compression.
//!
//! Runs the size search over a list of inputs and reports one outcome per
//! input. A failing file never stops the batch: oversize, unreadable,
//! undecodable and unencodable inputs are recorded and the next file is
//! processed.
//!
//! ## Per-file pipeline
//!
//! ```text
//! size check → read → decode → compute dimensions → size search → output name
//! ```
//!
//! ## Parallel Processing
//!
//! Files are compressed in parallel using [rayon](https://docs.rs/rayon); the
//! search for a single file is sequential. Outcomes come back in input order.
//! Progress events carry a completion fraction that only ever grows, even
//! when files finish out of order.
//!
//! ## Abort
//!
//! An optional [`AtomicBool`] is checked before each file starts. Once set,
//! files not yet started are reported as [`FileError::Aborted`].
//!
//! ## Writing Outputs
//!
//! [`compress_batch_to_dir`] writes each output as soon as its file finishes
//! and then drops the encoded buffer, so memory does not grow with the batch.
//! A failed write is that file's [`FileError::Write`]; the batch carries on.

use crate::imaging::{
    BackendError, CompressionRequest, CompressionResult, ImageBackend, Quality, SearchParams,
    TargetNote, compress,
};
use crate::naming::OutputNames;
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a single file produced no output.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("input is {size} bytes, over the {limit} byte limit")]
    OversizeInput { size: u64, limit: u64 },
    #[error("could not read input: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("could not encode image: {0}")]
    Encode(String),
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("skipped, batch aborted")]
    Aborted,
}

impl From<BackendError> for FileError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => FileError::Decode(msg),
            BackendError::Encode(msg) => FileError::Encode(msg),
        }
    }
}

/// One input to a batch.
#[derive(Debug, Clone)]
pub enum InputFile {
    /// Bytes already in memory, with the name they were uploaded under.
    Memory { name: String, bytes: Vec<u8> },
    /// A file on disk, read when its turn comes.
    Path(PathBuf),
}

impl InputFile {
    pub fn memory(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        InputFile::Memory {
            name: name.into(),
            bytes,
        }
    }

    /// Display name: the upload name, or the path's file name.
    pub fn name(&self) -> String {
        match self {
            InputFile::Memory { name, .. } => name.clone(),
            InputFile::Path(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        }
    }

    /// Input bytes, refusing anything over `limit`.
    ///
    /// Path inputs are checked against their metadata before being read.
    fn load(&self, limit: u64) -> Result<Cow<'_, [u8]>, FileError> {
        let bytes = match self {
            InputFile::Memory { bytes, .. } => Cow::Borrowed(bytes.as_slice()),
            InputFile::Path(path) => {
                let size = fs::metadata(path)?.len();
                if size > limit {
                    return Err(FileError::OversizeInput { size, limit });
                }
                Cow::Owned(fs::read(path)?)
            }
        };
        let size = bytes.len() as u64;
        if size > limit {
            return Err(FileError::OversizeInput { size, limit });
        }
        Ok(bytes)
    }
}

/// Settings shared by every file in a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub request: CompressionRequest,
    pub params: SearchParams,
    pub max_input_bytes: u64,
}

/// A successfully compressed file.
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub output_name: String,
    pub original_size: u64,
    /// Encoded size; still valid after [`release_buffers`](Self::release_buffers).
    pub compressed_size: usize,
    pub result: CompressionResult,
}

impl CompressedFile {
    /// Percentage of the original size saved, floored at zero.
    pub fn saved_percent(&self) -> u32 {
        if self.original_size == 0 {
            return 0;
        }
        let after = self.compressed_size as f64;
        let before = self.original_size as f64;
        (((before - after) / before) * 100.0).round().max(0.0) as u32
    }

    /// Drop the encoded bytes and attempt log once they are no longer needed.
    pub fn release_buffers(&mut self) {
        self.result.encoded = Vec::new();
        self.result.attempts = Vec::new();
    }

    /// Write the encoded bytes to `dir/<output_name>`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, FileError> {
        let path = dir.join(&self.output_name);
        fs::write(&path, &self.result.encoded).map_err(|source| FileError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// What happened to one input.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub result: Result<CompressedFile, FileError>,
}

/// Serializable per-file line for progress output and the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<TargetNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn summary(&self) -> FileSummary {
        match &self.result {
            Ok(file) => FileSummary {
                name: self.name.clone(),
                output_name: Some(file.output_name.clone()),
                original_size: Some(file.original_size),
                compressed_size: Some(file.compressed_size),
                width: Some(file.result.width),
                height: Some(file.result.height),
                quality: file.result.quality,
                saved_percent: Some(file.saved_percent()),
                note: file.result.note,
                error: None,
            },
            Err(err) => FileSummary {
                name: self.name.clone(),
                output_name: None,
                original_size: None,
                compressed_size: None,
                width: None,
                height: None,
                quality: None,
                saved_percent: None,
                note: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    FileFinished { summary: FileSummary, progress: f64 },
}

/// All outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &CompressedFile> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &FileError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn summaries(&self) -> Vec<FileSummary> {
        self.outcomes.iter().map(FileOutcome::summary).collect()
    }
}

/// Completion counter and event sink, shared between workers.
struct Progress {
    done: usize,
    total: usize,
    events: Option<Sender<BatchEvent>>,
}

impl Progress {
    fn finish(&mut self, outcome: &FileOutcome) {
        self.done += 1;
        let progress = self.done as f64 / self.total as f64;
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching
            let _ = tx.send(BatchEvent::FileFinished {
                summary: outcome.summary(),
                progress,
            });
        }
    }
}

/// Compress one input: limits, decode, size search.
pub fn compress_input<B: ImageBackend>(
    backend: &B,
    input: &InputFile,
    output_name: String,
    options: &BatchOptions,
) -> Result<CompressedFile, FileError> {
    let bytes = input.load(options.max_input_bytes)?;
    let original_size = bytes.len() as u64;
    let source = backend.decode(&bytes)?;
    drop(bytes);

    let result = compress(backend, &source, &options.request, &options.params)?;
    Ok(CompressedFile {
        output_name,
        original_size,
        compressed_size: result.size(),
        result,
    })
}

/// Compress every input, never stopping on a per-file failure.
///
/// Encoded bytes stay in the report.
pub fn compress_batch<B: ImageBackend>(
    backend: &B,
    inputs: &[InputFile],
    options: &BatchOptions,
    abort: Option<&AtomicBool>,
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    run_batch(backend, inputs, options, None, abort, events)
}

/// Compress every input and write each output into `out_dir` as it finishes.
///
/// Successful outcomes in the report keep sizes and dimensions but not the
/// encoded bytes. `out_dir` must exist.
pub fn compress_batch_to_dir<B: ImageBackend>(
    backend: &B,
    inputs: &[InputFile],
    options: &BatchOptions,
    out_dir: &Path,
    abort: Option<&AtomicBool>,
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    run_batch(backend, inputs, options, Some(out_dir), abort, events)
}

fn run_batch<B: ImageBackend>(
    backend: &B,
    inputs: &[InputFile],
    options: &BatchOptions,
    out_dir: Option<&Path>,
    abort: Option<&AtomicBool>,
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let total = inputs.len();
    if let Some(tx) = &events {
        let _ = tx.send(BatchEvent::Started { total });
    }

    // Names are claimed in input order so numbering is stable
    let mut names = OutputNames::new();
    let output_names: Vec<String> = inputs
        .iter()
        .map(|input| names.claim(&input.name(), options.request.codec))
        .collect();

    let progress = Mutex::new(Progress {
        done: 0,
        total,
        events,
    });

    let outcomes = inputs
        .par_iter()
        .zip(output_names)
        .map(|(input, output_name)| {
            let name = input.name();
            let result = if abort.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                Err(FileError::Aborted)
            } else {
                compress_input(backend, input, output_name, options)
            };
            let result = match (result, out_dir) {
                (Ok(mut file), Some(dir)) => file.write_to(dir).map(|path| {
                    debug!(path = %path.display(), "wrote");
                    file.release_buffers();
                    file
                }),
                (result, _) => result,
            };

            match &result {
                Ok(file) => info!(
                    file = %name,
                    output = %file.output_name,
                    before = file.original_size,
                    after = file.compressed_size,
                    width = file.result.width,
                    "compressed"
                ),
                Err(err) => warn!(file = %name, error = %err, "failed"),
            }

            let outcome = FileOutcome { name, result };
            if let Ok(mut p) = progress.lock() {
                p.finish(&outcome);
            }
            outcome
        })
        .collect();

    BatchReport { outcomes }
}
