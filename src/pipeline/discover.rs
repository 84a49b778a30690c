//! Sample discovery.
//!
//! Paired-end reads are grouped into samples by file name: a name containing
//! `_R1` is the forward read, a name containing `_R2` the reverse read, and the
//! sample key is everything before the first `_R`. Only samples that end up
//! with both reads become a `Sample`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::DiscoveryError;
use crate::storage::FileRef;

/// Marker identifying a forward read.
pub const FORWARD_MARKER: &str = "_R1";

/// Marker identifying a reverse read.
pub const REVERSE_MARKER: &str = "_R2";

/// The sample key ends at the first occurrence of this delimiter.
const KEY_DELIMITER: &str = "_R";

/// Direction of a read file within a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadType {
    Forward,
    Reverse,
}

/// Classifies a file name as part of a read pair.
///
/// Returns the sample key and read type, or `None` if the name carries
/// neither marker. A name carrying both markers is a forward read.
pub fn classify(file_name: &str) -> Option<(&str, ReadType)> {
    let read_type = if file_name.contains(FORWARD_MARKER) {
        ReadType::Forward
    } else if file_name.contains(REVERSE_MARKER) {
        ReadType::Reverse
    } else {
        return None;
    };

    let key = file_name
        .split(KEY_DELIMITER)
        .next()
        .unwrap_or(file_name);

    Some((key, read_type))
}

/// One sample ready for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample key shared by both read files.
    pub identifier: String,
    pub forward_read: FileRef,
    pub reverse_read: FileRef,
    /// Reference shared by every sample of a run.
    pub reference_file: FileRef,
    /// Destination root for this sample's outputs.
    pub outdir: String,
}

/// Result of grouping a directory listing into samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    /// Complete pairs, in the order their keys were first seen.
    pub samples: Vec<Sample>,
    /// Keys that had only one of the two reads.
    pub unmatched: Vec<String>,
    /// Files with neither marker (or no file name).
    pub ignored: usize,
    /// Files that replaced an earlier file with the same key and read type.
    pub replaced: usize,
}

impl Discovery {
    /// Number of samples dropped for lack of a partner read.
    pub fn dropped(&self) -> usize {
        self.unmatched.len()
    }

    /// Turns unmatched samples into an error.
    pub fn into_strict(self) -> Result<Self, DiscoveryError> {
        if self.unmatched.is_empty() {
            Ok(self)
        } else {
            Err(DiscoveryError::UnmatchedSamples(self.unmatched))
        }
    }
}

#[derive(Default)]
struct PartialPair {
    forward: Option<FileRef>,
    reverse: Option<FileRef>,
}

/// Groups `entries` into samples.
///
/// Every sample shares `reference` and writes its outputs under `output_root`.
/// Incomplete pairs are reported in `Discovery::unmatched`, not emitted.
pub fn discover_samples<I>(entries: I, reference: &FileRef, output_root: &str) -> Discovery
where
    I: IntoIterator<Item = FileRef>,
{
    let mut order: Vec<String> = Vec::new();
    let mut pairs: HashMap<String, PartialPair> = HashMap::new();
    let mut discovery = Discovery::default();

    for entry in entries {
        let Some((key, read_type)) = entry.file_name().and_then(classify) else {
            discovery.ignored += 1;
            continue;
        };
        let key = key.to_string();

        let pair = pairs.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            PartialPair::default()
        });

        let slot = match read_type {
            ReadType::Forward => &mut pair.forward,
            ReadType::Reverse => &mut pair.reverse,
        };
        if let Some(previous) = slot.replace(entry) {
            debug!(sample = %key, replaced = %previous, "Read file superseded by a later match");
            discovery.replaced += 1;
        }
    }

    for key in order {
        let Some(pair) = pairs.remove(&key) else {
            continue;
        };
        match (pair.forward, pair.reverse) {
            (Some(forward_read), Some(reverse_read)) => discovery.samples.push(Sample {
                identifier: key,
                forward_read,
                reverse_read,
                reference_file: reference.clone(),
                outdir: output_root.to_string(),
            }),
            _ => {
                debug!(sample = %key, "Dropping sample without a complete read pair");
                discovery.unmatched.push(key);
            }
        }
    }

    discovery
}

/// Lists the regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories and files whose names are not valid UTF-8 are skipped;
/// symlinks are followed.
pub fn scan_directory(dir: &Path) -> Result<Vec<FileRef>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| DiscoveryError::Walk {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.path().to_str() {
            Some(path) => files.push(FileRef::new(path)),
            None => warn!(path = %entry.path().display(), "Skipping file with a non-UTF-8 name"),
        }
    }

    Ok(files)
}
