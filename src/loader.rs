//! Keypoint loader for per-frame pose records.
//!
//! Each view of a clip is a directory of JSON records, one per frame. Frames
//! with no detected person are dropped rather than filled, so the loader
//! reports how many source files it saw against how many frames it kept.

use crate::constants::{KEYPOINT_RECORD_LEN, NUM_JOINTS, VALUES_PER_KEYPOINT};
use crate::keypoints::{zero_to_nan, KeypointTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct PoseRecord {
    #[serde(default)]
    people: Vec<PersonRecord>,
}

#[derive(Debug, Deserialize)]
struct PersonRecord {
    #[serde(default)]
    pose_keypoints_2d: Vec<f64>,
}

/// How frame files are put into temporal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrdering {
    /// Order by the counter embedded in `<prefix>_<counter>_<suffix>.json`
    #[default]
    Counter,
    /// Order by byte-wise file name
    Lexicographic,
}

impl FromStr for FrameOrdering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            _ => Err(Error::InvalidInput(format!("Unknown frame ordering: {s}"))),
        }
    }
}

impl fmt::Display for FrameOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

/// Source file count against retained frame count for one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Frame records found for the view
    pub source_files: usize,
    /// Frames that had a detected person
    pub retained_frames: usize,
}

impl LoadReport {
    /// Frames dropped because nobody was detected
    #[must_use]
    pub fn dropped_frames(&self) -> usize {
        self.source_files - self.retained_frames
    }

    #[must_use]
    pub fn has_discrepancy(&self) -> bool {
        self.source_files != self.retained_frames
    }
}

/// A loaded view: the keypoint table plus its discrepancy report
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub table: KeypointTable,
    pub report: LoadReport,
}

/// Parse one frame record.
///
/// Returns `Ok(None)` when the record has no detected person. Otherwise the
/// first person's keypoints are converted to 50 interleaved coordinates with
/// zeros replaced by `NaN`; confidences are dropped.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or the keypoint array is too short
pub fn parse_frame(json: &str) -> Result<Option<Vec<f64>>> {
    let record: PoseRecord = serde_json::from_str(json)?;
    let Some(person) = record.people.first() else {
        return Ok(None);
    };
    keypoints_to_row(&person.pose_keypoints_2d).map(Some)
}

fn keypoints_to_row(values: &[f64]) -> Result<Vec<f64>> {
    if values.len() < KEYPOINT_RECORD_LEN {
        return Err(Error::InvalidInput(format!(
            "pose_keypoints_2d has {} values, expected at least {KEYPOINT_RECORD_LEN}",
            values.len()
        )));
    }
    let values = zero_to_nan(values);
    Ok(values
        .chunks(VALUES_PER_KEYPOINT)
        .take(NUM_JOINTS)
        .flat_map(|triple| [triple[0], triple[1]])
        .collect())
}

/// Counter embedded in a frame file name, e.g. `clip_000000000012_keypoints.json`
#[must_use]
pub fn frame_counter(file_name: &str) -> Option<u64> {
    let mut parts = file_name.rsplitn(3, '_');
    let _suffix = parts.next()?;
    let counter = parts.next()?;
    parts.next()?;
    counter.parse().ok()
}

/// Put frame file names into temporal order
///
/// # Errors
///
/// Returns an error under [`FrameOrdering::Counter`] if a name carries no counter
pub fn order_frame_files(mut names: Vec<String>, ordering: FrameOrdering) -> Result<Vec<String>> {
    match ordering {
        FrameOrdering::Lexicographic => {
            names.sort();
            Ok(names)
        }
        FrameOrdering::Counter => {
            let mut keyed = names
                .into_iter()
                .map(|name| match frame_counter(&name) {
                    Some(counter) => Ok((counter, name)),
                    None => Err(Error::InvalidInput(format!("No frame counter in file name: {name}"))),
                })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort();

            for pair in keyed.windows(2) {
                if pair[1].0 != pair[0].0 + 1 {
                    log::warn!("Frame counter gap between {} and {}", pair[0].1, pair[1].1);
                }
            }

            Ok(keyed.into_iter().map(|(_, name)| name).collect())
        }
    }
}

/// Build a view from already ordered record contents
///
/// # Errors
///
/// Returns an error if any record fails to parse
pub fn build_view<I, S>(records: I) -> Result<LoadedView>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut frames = Vec::new();
    let mut source_files = 0;
    for record in records {
        source_files += 1;
        if let Some(row) = parse_frame(record.as_ref())? {
            frames.push(row);
        }
    }

    let table = KeypointTable::from_frames(&frames)?;
    let report = LoadReport {
        source_files,
        retained_frames: table.n_frames(),
    };
    Ok(LoadedView { table, report })
}

/// Load every `.json` frame record in `dir`
///
/// # Errors
///
/// Returns an error if the directory cannot be read, a name has no counter
/// under counter ordering, or a record fails to parse
pub fn load_view_dir<P: AsRef<Path>>(dir: P, ordering: FrameOrdering) -> Result<LoadedView> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".json") && entry.path().is_file() {
                names.push(name.to_string());
            }
        }
    }

    let names = order_frame_files(names, ordering)?;
    log::debug!("Loading {} frame records from {}", names.len(), dir.display());

    let contents = names
        .iter()
        .map(|name| {
            std::fs::read_to_string(dir.join(name))
                .map_err(|e| Error::InvalidInput(format!("Failed to read {name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let view = build_view(contents)?;
    if view.report.has_discrepancy() {
        log::warn!(
            "{} frames without a detected person in {}: total files = {}, frames processed = {}",
            view.report.dropped_frames(),
            dir.display(),
            view.report.source_files,
            view.report.retained_frames
        );
    }
    Ok(view)
}
