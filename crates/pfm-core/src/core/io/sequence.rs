use crate::core::models::sequence::{SequenceError, StimulusLevel, StimulusSequence};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// How samples outside the `+1`/`-1` alphabet are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplePolicy {
    /// Any other content is an error.
    #[default]
    Strict,
    /// `0` and unparseable lines become [`StimulusLevel::Low`].
    Lenient,
}

#[derive(Debug, Error)]
pub enum SequenceLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("I/O error while reading stimulus samples: {0}")]
    Read(#[from] io::Error),
    #[error("Invalid stimulus sample on line {line}: '{content}' (expected 1 or -1)")]
    InvalidSample { line: usize, content: String },
    #[error("Invalid stimulus sequence: {0}")]
    Sequence(#[from] SequenceError),
}

fn parse_sample(
    content: &str,
    line: usize,
    policy: SamplePolicy,
) -> Result<StimulusLevel, SequenceLoadError> {
    let parsed = content.parse::<i64>().ok();
    if let Some(level) = parsed.and_then(StimulusLevel::from_sample) {
        return Ok(level);
    }
    match (policy, parsed) {
        (SamplePolicy::Lenient, None | Some(0)) => {
            warn!(line, content, "Coercing malformed stimulus sample to the low level.");
            Ok(StimulusLevel::Low)
        }
        _ => Err(SequenceLoadError::InvalidSample {
            line,
            content: content.to_string(),
        }),
    }
}

/// Reads stimulus levels, one integer per line. Blank lines are skipped.
pub fn read_levels(
    reader: &mut impl BufRead,
    policy: SamplePolicy,
) -> Result<Vec<StimulusLevel>, SequenceLoadError> {
    let mut levels = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.trim();
        if content.is_empty() {
            continue;
        }
        levels.push(parse_sample(content, index + 1, policy)?);
    }
    Ok(levels)
}

/// Reads a complete stimulus sequence sampled every `period` seconds.
pub fn read_sequence(
    reader: &mut impl BufRead,
    period: f64,
    policy: SamplePolicy,
) -> Result<StimulusSequence, SequenceLoadError> {
    let levels = read_levels(reader, policy)?;
    Ok(StimulusSequence::new(levels, period)?)
}

/// Loads a stimulus sequence from the file at `path`.
pub fn load_sequence<P: AsRef<Path>>(
    path: P,
    period: f64,
    policy: SamplePolicy,
) -> Result<StimulusSequence, SequenceLoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SequenceLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let sequence = read_sequence(&mut BufReader::new(file), period, policy)?;
    debug!(
        path = %path.display(),
        samples = sequence.len(),
        period,
        "Loaded stimulus sequence."
    );
    Ok(sequence)
}
