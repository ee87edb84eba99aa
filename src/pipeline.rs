//! Pipeline stages and the batch driver.
//!
//! Every stage is a plain function of its input: keypoints are imputed,
//! turned into angles, cut into a representative cycle, and front/side
//! cycles are fused and scored. Only [`Pipeline::run_pair`] and
//! [`Pipeline::run_batch`] touch the filesystem, and they process clips one
//! after another, each to completion.
//!
//! Two input layouts are supported under `<root>/json`:
//! - a single walk in `front/` and `side/` ([`InputLayout::Pair`])
//! - many clips named `<prefix>_<id>_<F|S>_<trial>_<rest>` ([`InputLayout::Batch`])

use crate::angles::AngleTable;
use crate::config::Config;
use crate::cycle::{CycleSelection, GaitCycleSelector};
use crate::export;
use crate::fusion::{fuse_views, FusedTable, View};
use crate::grouping::group_clips;
use crate::imputation::IterativeImputer;
use crate::keypoints::KeypointTable;
use crate::loader::{load_view_dir, FrameOrdering, LoadReport, LoadedView};
use crate::scoring::{reference_label, score_features, FeatureVector, GaitClassifier, Prediction};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sub-directory of the input root holding one frame directory per clip
pub const JSON_DIR: &str = "json";
/// Per-clip view angle tables
pub const ANGLES_DIR: &str = "Gait_parameters";
/// Per-clip selected gait cycles
pub const SELECTED_DIR: &str = "Selected_one_gait_CSV";
/// Fused front/side tables
pub const COMBINED_DIR: &str = "Combined_front_side_columns";
/// Prediction summary
pub const RESULTS_DIR: &str = "Results";
/// Prediction summary file inside [`RESULTS_DIR`]
pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// Front view directory of the pair layout, inside [`JSON_DIR`]
pub const FRONT_DIR: &str = "front";
/// Side view directory of the pair layout, inside [`JSON_DIR`]
pub const SIDE_DIR: &str = "side";
/// Pair layout artifact names
pub const FRONT_ANGLES_FILE: &str = "front_angles.csv";
pub const SIDE_ANGLES_FILE: &str = "side_angles.csv";
pub const FRONT_SELECTED_FILE: &str = "front_interpolated.csv";
pub const SIDE_SELECTED_FILE: &str = "side_interpolated.csv";
pub const COMBINED_FILE: &str = "combined_data.csv";

/// How clips are laid out under `<root>/json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// One walk: `json/front` and `json/side`
    Pair,
    /// Any number of named clip directories
    Batch,
}

impl InputLayout {
    /// Pair when either `json/front` or `json/side` exists, batch otherwise
    #[must_use]
    pub fn detect<P: AsRef<Path>>(root: P) -> Self {
        let json_root = root.as_ref().join(JSON_DIR);
        if json_root.join(FRONT_DIR).is_dir() || json_root.join(SIDE_DIR).is_dir() {
            Self::Pair
        } else {
            Self::Batch
        }
    }
}

/// Everything derived from one view of one clip
#[derive(Debug, Clone)]
pub struct ViewFeatures {
    pub view: View,
    /// Angles restricted to the view's columns, one row per retained frame
    pub angles: AngleTable,
    pub selection: CycleSelection,
    pub report: LoadReport,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Clips whose angles and cycle were produced
    pub processed: Vec<String>,
    /// Clips or groups that failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Clips whose retained frame count differs from their file count
    pub discrepancies: Vec<(String, LoadReport)>,
    /// Clips with no view marker
    pub unclassified: Vec<String>,
    /// Group keys lacking a front or side clip
    pub skipped_groups: Vec<String>,
    /// Fused artifacts written
    pub combined: Vec<PathBuf>,
    pub predictions: Vec<Prediction>,
}

/// Outcome of a single-pair run
#[derive(Debug, Clone)]
pub struct PairReport {
    pub front: LoadReport,
    pub side: LoadReport,
    /// Rows of the fused table
    pub fused_rows: usize,
    /// Fused artifact written
    pub combined: PathBuf,
    pub prediction: Option<Prediction>,
}

/// Configured pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    imputer: IterativeImputer,
    selector: GaitCycleSelector,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let imputer = IterativeImputer::from_config(&config.imputation);
        let selector = GaitCycleSelector::from_config(&config.cycle);
        Self {
            config,
            imputer,
            selector,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fill missing coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if imputation hits an unfillable column
    pub fn impute(&self, table: KeypointTable) -> Result<KeypointTable> {
        let filled = self.imputer.fill_missing_values(table.into_data())?;
        KeypointTable::new(filled)
    }

    /// Impute, compute angles, keep the view's columns and select a cycle
    ///
    /// # Errors
    ///
    /// Returns an error if imputation fails
    pub fn process_view(&self, loaded: LoadedView, view: View) -> Result<ViewFeatures> {
        let LoadedView { table, report } = loaded;
        let table = self.impute(table)?;
        let angles = AngleTable::from_keypoints(&table).select(&view.columns())?;
        let selection = self.selector.select(&angles)?;
        log::debug!(
            "{view} view: {} frames, {} cycle rows",
            angles.n_rows(),
            selection.table.n_rows()
        );
        Ok(ViewFeatures {
            view,
            angles,
            selection,
            report,
        })
    }

    /// Load a clip directory and process it as `view`
    ///
    /// # Errors
    ///
    /// Returns an error if loading or processing fails
    pub fn process_clip_dir<P: AsRef<Path>>(&self, dir: P, view: View) -> Result<ViewFeatures> {
        let loaded = load_view_dir(dir, self.config.loader.frame_ordering)?;
        self.process_view(loaded, view)
    }

    /// Fuse the selected cycles of a front and a side view
    ///
    /// # Errors
    ///
    /// Returns an error if the views are swapped or lack their columns
    pub fn fuse(&self, front: &ViewFeatures, side: &ViewFeatures) -> Result<FusedTable> {
        if front.view != View::Front || side.view != View::Side {
            return Err(Error::MissingView(format!(
                "expected front and side, got {} and {}",
                front.view, side.view
            )));
        }
        let fused = fuse_views(&front.selection.table, &side.selection.table)?;
        let expected = self.selector.cycle_rows();
        if fused.n_rows() != expected {
            log::warn!("Fused table has {} rows, a full cycle has {expected}", fused.n_rows());
        }
        Ok(fused)
    }

    /// Run the single walk in `root/json/front` and `root/json/side`.
    ///
    /// Frames are always ordered by file name in this layout. Artifacts go
    /// to fixed file names under `root`; the combined table carries no label
    /// column and the prediction summary has one `Score,Prediction` row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingView`] if either view directory is absent. Any
    /// load, processing, write or scoring failure is returned as well.
    pub fn run_pair<P: AsRef<Path>>(&self, root: P, classifier: Option<&dyn GaitClassifier>) -> Result<PairReport> {
        let root = root.as_ref();
        let json_root = root.join(JSON_DIR);
        let front_dir = json_root.join(FRONT_DIR);
        let side_dir = json_root.join(SIDE_DIR);
        for (view, dir) in [(View::Front, &front_dir), (View::Side, &side_dir)] {
            if !dir.is_dir() {
                return Err(Error::MissingView(format!(
                    "{view} JSON directory not found: {}",
                    dir.display()
                )));
            }
        }

        let angles_dir = root.join(ANGLES_DIR);
        let selected_dir = root.join(SELECTED_DIR);
        let combined_dir = root.join(COMBINED_DIR);
        for dir in [&angles_dir, &selected_dir, &combined_dir] {
            std::fs::create_dir_all(dir)?;
        }

        let front = self.process_view(load_view_dir(&front_dir, FrameOrdering::Lexicographic)?, View::Front)?;
        log::info!(
            "Front: {} files, {} frames processed",
            front.report.source_files,
            front.report.retained_frames
        );
        write_view_artifacts(
            &angles_dir.join(FRONT_ANGLES_FILE),
            &selected_dir.join(FRONT_SELECTED_FILE),
            &front,
        )?;

        let side = self.process_view(load_view_dir(&side_dir, FrameOrdering::Lexicographic)?, View::Side)?;
        log::info!(
            "Side: {} files, {} frames processed",
            side.report.source_files,
            side.report.retained_frames
        );
        write_view_artifacts(
            &angles_dir.join(SIDE_ANGLES_FILE),
            &selected_dir.join(SIDE_SELECTED_FILE),
            &side,
        )?;

        let fused = self.fuse(&front, &side)?;
        let combined = combined_dir.join(COMBINED_FILE);
        export::write_fused_table(&combined, &fused, None)?;
        log::info!("Saved combined data to {}", combined.display());

        let prediction = match classifier {
            Some(classifier) => {
                let features = FeatureVector::from_fused(&fused);
                let prediction = score_features(classifier, COMBINED_FILE, &features, self.config.scoring.threshold)?;
                let results_dir = root.join(RESULTS_DIR);
                std::fs::create_dir_all(&results_dir)?;
                let path = results_dir.join(PREDICTIONS_FILE);
                export::write_prediction_summary(&path, &prediction)?;
                log::info!("Results saved to {}", path.display());
                Some(prediction)
            }
            None => None,
        };

        Ok(PairReport {
            front: front.report,
            side: side.report,
            fused_rows: fused.n_rows(),
            combined,
            prediction,
        })
    }

    /// Run every clip under `root/json` and write all artifacts under `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the input root has no `json` directory or an
    /// output directory cannot be created. Per-clip and per-group failures,
    /// including failed artifact writes, are recorded in the report instead.
    pub fn run_batch<P: AsRef<Path>>(&self, root: P, classifier: Option<&dyn GaitClassifier>) -> Result<BatchReport> {
        let root = root.as_ref();
        let json_root = root.join(JSON_DIR);
        if !json_root.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Input directory not found: {}",
                json_root.display()
            )));
        }

        let angles_dir = root.join(ANGLES_DIR);
        let selected_dir = root.join(SELECTED_DIR);
        let combined_dir = root.join(COMBINED_DIR);
        for dir in [&angles_dir, &selected_dir, &combined_dir] {
            std::fs::create_dir_all(dir)?;
        }

        let mut report = BatchReport::default();
        let mut views: BTreeMap<String, ViewFeatures> = BTreeMap::new();

        for clip in list_clip_dirs(&json_root)? {
            let Some(view) = View::from_clip_name(&clip) else {
                log::warn!("Clip {clip} has no _F_ or _S_ marker, skipping");
                report.unclassified.push(clip);
                continue;
            };

            let features = match self.process_clip_dir(json_root.join(&clip), view) {
                Ok(features) => features,
                Err(e) => {
                    log::error!("Failed to process {clip}: {e}");
                    report.failed.push((clip, e.to_string()));
                    continue;
                }
            };

            if features.report.has_discrepancy() {
                report.discrepancies.push((clip.clone(), features.report));
            }

            let file_name = format!("{clip}.csv");
            if let Err(e) = write_view_artifacts(&angles_dir.join(&file_name), &selected_dir.join(&file_name), &features) {
                log::error!("Failed to save angles for {clip}: {e}");
                report.failed.push((clip, e.to_string()));
                continue;
            }
            log::info!(
                "Saved angles for {clip} ({view}, {} rows, {} cycle rows)",
                features.angles.n_rows(),
                features.selection.table.n_rows()
            );

            report.processed.push(clip.clone());
            views.insert(clip, features);
        }

        for (key, group) in group_clips(views.keys()) {
            let Some((front_name, side_name)) = group.pair() else {
                log::warn!("Skipping group {key}, missing front or side clip");
                report.skipped_groups.push(key);
                continue;
            };
            let (Some(front), Some(side)) = (views.get(front_name), views.get(side_name)) else {
                report.skipped_groups.push(key);
                continue;
            };

            let fused = match self.fuse(front, side) {
                Ok(fused) => fused,
                Err(e) => {
                    log::error!("Failed to fuse group {key}: {e}");
                    report.failed.push((key, e.to_string()));
                    continue;
                }
            };

            let file_name = format!("{}.csv", group.combined_name);
            let path = combined_dir.join(&file_name);
            if let Err(e) = export::write_fused_table(&path, &fused, Some(reference_label(&key))) {
                log::error!("Failed to save combined table for group {key}: {e}");
                report.failed.push((key, e.to_string()));
                continue;
            }
            log::info!("Combined {front_name} and {side_name} into {}", path.display());
            report.combined.push(path);

            if let Some(classifier) = classifier {
                let features = FeatureVector::from_fused(&fused);
                match score_features(classifier, &file_name, &features, self.config.scoring.threshold) {
                    Ok(prediction) => report.predictions.push(prediction),
                    Err(e) => {
                        log::error!("Failed to score {file_name}: {e}");
                        report.failed.push((key, e.to_string()));
                    }
                }
            }
        }

        if classifier.is_some() {
            let path = root.join(RESULTS_DIR).join(PREDICTIONS_FILE);
            match write_batch_results(&path, &report.predictions) {
                Ok(()) => log::info!("Results saved to {}", path.display()),
                Err(e) => {
                    log::error!("Failed to save results to {}: {e}", path.display());
                    report.failed.push((path.display().to_string(), e.to_string()));
                }
            }
        }

        if !report.discrepancies.is_empty() {
            let names: Vec<&str> = report.discrepancies.iter().map(|(name, _)| name.as_str()).collect();
            log::warn!("Clips with discrepancies in input and output frame count: {names:?}");
        }

        Ok(report)
    }
}

/// Write a view's full angle table and its selected cycle
fn write_view_artifacts(angles_path: &Path, selected_path: &Path, features: &ViewFeatures) -> Result<()> {
    export::write_angle_table(angles_path, &features.angles)?;
    export::write_angle_table(selected_path, &features.selection.table)
}

fn write_batch_results(path: &Path, predictions: &[Prediction]) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    export::write_predictions(path, predictions)
}

/// Clip directory names under `json_root`, sorted
fn list_clip_dirs(json_root: &Path) -> Result<Vec<String>> {
    let mut clips = Vec::new();
    for entry in std::fs::read_dir(json_root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => clips.push(name),
            Err(name) => log::warn!("Skipping non UTF-8 clip directory {name:?}"),
        }
    }
    clips.sort();
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NUM_COORDINATES;
    use crate::keypoints::Joint;

    fn standing_frames(n: usize) -> KeypointTable {
        let mut row = vec![10.0; NUM_COORDINATES];
        for (joint, x, y) in [
            (Joint::RShoulder, 90.0, 50.0),
            (Joint::LShoulder, 110.0, 50.0),
            (Joint::RHip, 90.0, 100.0),
            (Joint::LHip, 110.0, 100.0),
            (Joint::RKnee, 90.0, 150.0),
            (Joint::LKnee, 110.0, 150.0),
            (Joint::RAnkle, 90.0, 200.0),
            (Joint::LAnkle, 110.0, 200.0),
        ] {
            row[joint.x_column()] = x;
            row[joint.y_column()] = y;
        }
        KeypointTable::from_frames(&vec![row; n]).unwrap()
    }

    fn loaded(n: usize) -> LoadedView {
        LoadedView {
            table: standing_frames(n),
            report: LoadReport {
                source_files: n,
                retained_frames: n,
            },
        }
    }

    #[test]
    fn test_process_view_side() {
        let features = Pipeline::default().process_view(loaded(150), View::Side).unwrap();
        assert_eq!(features.angles.n_columns(), 4);
        assert_eq!(features.selection.table.n_rows(), 120);
        assert!(features.angles.values().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_fuse_requires_ordered_views() {
        let pipeline = Pipeline::default();
        let front = pipeline.process_view(loaded(150), View::Front).unwrap();
        let side = pipeline.process_view(loaded(150), View::Side).unwrap();
        assert_eq!(pipeline.fuse(&front, &side).unwrap().values().dim(), (120, 8));
        assert!(pipeline.fuse(&side, &front).is_err());
    }

    #[test]
    fn test_run_batch_requires_json_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Pipeline::default().run_batch(dir.path(), None).is_err());
    }
}
