//! Representative gait-cycle selection.
//!
//! No stride boundaries are detected. Fixed-length windows are cut at
//! proportional offsets through the recording (1/5, 2/5, 3/5 and 4/5 of the
//! rows by default) and stacked, which stands in for one typical cycle.

use crate::angles::AngleTable;
use crate::config::CycleConfig;
use crate::Result;

/// Row range of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 1-based window number
    pub number: usize,
    pub start: usize,
    pub end: usize,
}

/// Stacked windows plus the ones that did not fit
#[derive(Debug, Clone)]
pub struct CycleSelection {
    pub table: AngleTable,
    pub kept: Vec<Segment>,
    pub skipped: Vec<Segment>,
}

impl CycleSelection {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Proportional-offset window selector
#[derive(Debug, Clone)]
pub struct GaitCycleSelector {
    segment_length: usize,
    segment_count: usize,
    offset_divisor: usize,
}

impl Default for GaitCycleSelector {
    fn default() -> Self {
        Self::from_config(&CycleConfig::default())
    }
}

impl GaitCycleSelector {
    /// Create a selector
    ///
    /// # Panics
    ///
    /// Panics if `segment_length` or `segment_count` is zero, or if
    /// `offset_divisor` does not exceed `segment_count`
    #[must_use]
    pub fn new(segment_length: usize, segment_count: usize, offset_divisor: usize) -> Self {
        assert!(segment_length > 0, "Segment length must be greater than 0");
        assert!(segment_count > 0, "Segment count must be greater than 0");
        assert!(
            offset_divisor > segment_count,
            "Offset divisor must exceed segment count, got {} for {} segments",
            offset_divisor,
            segment_count
        );
        Self {
            segment_length,
            segment_count,
            offset_divisor,
        }
    }

    #[must_use]
    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.segment_length, config.segment_count, config.offset_divisor)
    }

    /// Rows of a selection where every window fits
    #[must_use]
    pub fn cycle_rows(&self) -> usize {
        self.segment_length * self.segment_count
    }

    /// Start rows `floor(rows * i / divisor)` for `i` in `1..=segment_count`
    #[must_use]
    pub fn offsets(&self, rows: usize) -> Vec<usize> {
        (1..=self.segment_count)
            .map(|i| rows * i / self.offset_divisor)
            .collect()
    }

    /// Cut and stack the windows that fit inside `table`.
    ///
    /// A window running past the last row is skipped, never padded.
    ///
    /// # Errors
    ///
    /// Returns an error if the kept windows cannot be stacked
    pub fn select(&self, table: &AngleTable) -> Result<CycleSelection> {
        let rows = table.n_rows();
        let mut kept = Vec::new();
        let mut skipped = Vec::new();
        let mut pieces = Vec::new();

        for (i, start) in self.offsets(rows).into_iter().enumerate() {
            let segment = Segment {
                number: i + 1,
                start,
                end: start + self.segment_length,
            };
            if segment.end > rows {
                log::warn!(
                    "Segment {} ({}..{}) exceeds row count {rows}, skipping",
                    segment.number,
                    segment.start,
                    segment.end
                );
                skipped.push(segment);
                continue;
            }
            log::debug!(
                "Segment {}: selected {} rows from index {} to {}",
                segment.number,
                self.segment_length,
                segment.start,
                segment.end - 1
            );
            pieces.push(table.rows(segment.start, segment.end));
            kept.push(segment);
        }

        let table = AngleTable::concat_rows(table.columns().to_vec(), &pieces)?;
        Ok(CycleSelection { table, kept, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::AngleColumn;
    use ndarray::Array2;

    fn ramp(rows: usize) -> AngleTable {
        let values = Array2::from_shape_fn((rows, 2), |(i, j)| (i * 2 + j) as f64);
        AngleTable::new(AngleColumn::ALL[..2].to_vec(), values).unwrap()
    }

    #[test]
    fn test_offsets_150() {
        assert_eq!(GaitCycleSelector::default().offsets(150), vec![30, 60, 90, 120]);
    }

    #[test]
    fn test_offsets_floor() {
        assert_eq!(GaitCycleSelector::default().offsets(143), vec![28, 57, 85, 114]);
    }

    #[test]
    fn test_cycle_rows() {
        assert_eq!(GaitCycleSelector::default().cycle_rows(), 120);
        assert_eq!(GaitCycleSelector::new(10, 3, 5).cycle_rows(), 30);
    }

    #[test]
    fn test_exact_fit() {
        let selection = GaitCycleSelector::default().select(&ramp(150)).unwrap();
        assert!(selection.is_complete());
        assert_eq!(selection.table.n_rows(), 120);
        assert_eq!(selection.table.n_rows(), GaitCycleSelector::default().cycle_rows());
        assert_eq!(selection.kept.last().unwrap().end, 150);
        assert_eq!(selection.table.values()[[0, 0]], 60.0);
        assert_eq!(selection.table.values()[[119, 0]], 298.0);
    }

    #[test]
    fn test_last_segment_skipped() {
        let selection = GaitCycleSelector::default().select(&ramp(140)).unwrap();
        assert_eq!(selection.table.n_rows(), 90);
        assert_eq!(selection.skipped.len(), 1);
        assert_eq!(selection.skipped[0].number, 4);
        assert_eq!(selection.skipped[0].start, 112);
    }

    #[test]
    fn test_short_table_yields_empty_selection() {
        let selection = GaitCycleSelector::default().select(&ramp(20)).unwrap();
        assert!(selection.table.is_empty());
        assert_eq!(selection.table.n_columns(), 2);
        assert_eq!(selection.skipped.len(), 4);
    }

    #[test]
    #[should_panic(expected = "Segment length must be greater than 0")]
    fn test_zero_segment_length() {
        let _ = GaitCycleSelector::new(0, 4, 5);
    }
}
