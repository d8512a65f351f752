//! Background analysis: text statistics and inspections off the editing thread.
//!
//! The [`AnalysisWorker`] owns one thread fed through a job channel. Every submitted request gets
//! a [`Generation`]; only the newest generation per [`AnalysisKind`] is handed back from
//! [`AnalysisWorker::poll`], superseded results are dropped on arrival. Results never touch a
//! document directly: the editing thread applies them with
//! [`crate::SceneDocument::apply_analysis`], which also rejects results computed from an older
//! document revision.

use crate::inspection::{Finding, Inspector};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use novelist_core_lang::ProjectLanguage;
use std::collections::HashMap;
use std::io;
use std::ops::Range;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use unicode_segmentation::UnicodeSegmentation;

/// Monotonic stamp of a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Independent request streams; a newer request only supersedes one of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Word/character/paragraph counts.
    Statistics,
    /// Inspection providers over a text block.
    Inspection,
}

/// Work for the analysis thread. Carries a snapshot, never a reference to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Count words, characters and paragraphs of `text`.
    Statistics {
        /// Document revision the snapshot was taken at.
        revision: u64,
        /// Flat document text.
        text: String,
    },
    /// Run every inspector over `text`, which starts at document position `range.start`.
    Inspect {
        /// Document revision the snapshot was taken at.
        revision: u64,
        /// Document range covered by `text`.
        range: Range<usize>,
        /// Text of `range`.
        text: String,
        /// Language of the document.
        language: ProjectLanguage,
    },
}

impl AnalysisRequest {
    /// Stream this request belongs to.
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::Statistics { .. } => AnalysisKind::Statistics,
            Self::Inspect { .. } => AnalysisKind::Inspection,
        }
    }

    /// Document revision of the snapshot.
    pub fn revision(&self) -> u64 {
        match self {
            Self::Statistics { revision, .. } | Self::Inspect { revision, .. } => *revision,
        }
    }
}

/// Counts over a text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStatistics {
    /// Unicode words.
    pub words: usize,
    /// Characters, paragraph separators excluded.
    pub characters: usize,
    /// Paragraphs.
    pub paragraphs: usize,
}

impl TextStatistics {
    /// Count `text` (paragraphs separated by `\n`).
    pub fn compute(text: &str) -> Self {
        Self {
            words: text.unicode_words().count(),
            characters: text.chars().filter(|&c| c != '\n').count(),
            paragraphs: text.split('\n').count(),
        }
    }
}

/// Payload of a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutput {
    /// Statistics result.
    Statistics(TextStatistics),
    /// Inspection result; finding offsets are relative to `range.start`.
    Findings {
        /// Document range that was inspected.
        range: Range<usize>,
        /// Findings of every provider, failed providers contributing none.
        findings: Vec<Finding>,
    },
}

/// A finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Stream.
    pub kind: AnalysisKind,
    /// Generation assigned at submission.
    pub generation: Generation,
    /// Document revision the snapshot was taken at.
    pub revision: u64,
    /// Payload.
    pub output: AnalysisOutput,
}

struct Job {
    generation: Generation,
    request: AnalysisRequest,
}

fn run_job(job: Job, inspectors: &[Box<dyn Inspector>]) -> AnalysisResult {
    let kind = job.request.kind();
    let revision = job.request.revision();
    let output = match job.request {
        AnalysisRequest::Statistics { text, .. } => {
            AnalysisOutput::Statistics(TextStatistics::compute(&text))
        }
        AnalysisRequest::Inspect {
            range,
            text,
            language,
            ..
        } => {
            let mut findings = Vec::new();
            for inspector in inspectors {
                match inspector.inspect(&text, &language) {
                    Ok(found) => findings.extend(found),
                    Err(err) => {
                        tracing::warn!(inspector = inspector.name(), %err, "inspection failed");
                    }
                }
            }
            findings.sort_by_key(|f| (f.start, f.end));
            AnalysisOutput::Findings { range, findings }
        }
    };

    AnalysisResult {
        kind,
        generation: job.generation,
        revision,
        output,
    }
}

/// Handle to the background analysis thread.
pub struct AnalysisWorker {
    jobs: Option<Sender<Job>>,
    results: Receiver<AnalysisResult>,
    latest: HashMap<AnalysisKind, Generation>,
    next_generation: u64,
    thread: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Start the analysis thread with the given inspection providers.
    pub fn spawn(inspectors: Vec<Box<dyn Inspector>>) -> io::Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let thread = thread::Builder::new()
            .name("novelist-analysis".to_string())
            .spawn(move || {
                for job in job_rx {
                    let result = run_job(job, &inspectors);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            latest: HashMap::new(),
            next_generation: 0,
            thread: Some(thread),
        })
    }

    /// Queue a request; it supersedes any earlier request of the same kind.
    pub fn submit(&mut self, request: AnalysisRequest) -> Generation {
        self.next_generation += 1;
        let generation = Generation(self.next_generation);
        let kind = request.kind();
        self.latest.insert(kind, generation);
        tracing::debug!(?kind, generation = generation.0, "analysis submitted");

        if let Some(jobs) = &self.jobs
            && jobs.send(Job { generation, request }).is_err()
        {
            tracing::warn!("analysis thread is gone; request dropped");
        }
        generation
    }

    /// Returns `true` if `result` is the newest submission of its kind.
    pub fn is_current(&self, result: &AnalysisResult) -> bool {
        self.latest.get(&result.kind) == Some(&result.generation)
    }

    fn keep_current(&self, result: AnalysisResult) -> Option<AnalysisResult> {
        if self.is_current(&result) {
            Some(result)
        } else {
            tracing::debug!(
                kind = ?result.kind,
                generation = result.generation.0,
                "discarding superseded analysis result"
            );
            None
        }
    }

    /// Non-blocking: every result that arrived and is still current.
    pub fn poll(&mut self) -> Vec<AnalysisResult> {
        let arrived: Vec<_> = self.results.try_iter().collect();
        arrived
            .into_iter()
            .filter_map(|result| self.keep_current(result))
            .collect()
    }

    /// Block for up to `timeout` until a current result arrives.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<AnalysisResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(result) => {
                    if let Some(result) = self.keep_current(result) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the thread's receive loop.
        self.jobs.take();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("analysis thread panicked");
        }
    }
}
