//! Clip-name parsing and front/side grouping for batch runs.
//!
//! Clip names look like `Su_123_F_2_walk`: a subject prefix and id, a view
//! marker, a trial field and a free-form remainder. Clips that share the
//! subject and remainder form one group. This is the only place that
//! inspects clip names.

use crate::fusion::View;
use std::collections::BTreeMap;

/// Structured form of a clip name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipKey {
    pub subject_prefix: String,
    pub subject_id: String,
    pub view: View,
    pub trial: String,
    pub rest: String,
}

impl ClipKey {
    /// Parse `prefix_id_view_trial_rest`; the remainder may itself contain `_`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.splitn(5, '_').collect();
        if parts.len() != 5 {
            return None;
        }
        let view = match parts[2] {
            "F" => View::Front,
            "S" => View::Side,
            _ => return None,
        };
        Some(Self {
            subject_prefix: parts[0].to_string(),
            subject_id: parts[1].to_string(),
            view,
            trial: parts[3].to_string(),
            rest: parts[4].to_string(),
        })
    }

    /// Key shared by the front and side clip of one walk
    #[must_use]
    pub fn group_key(&self) -> String {
        format!("{}_{}_{}", self.subject_prefix, self.subject_id, self.rest)
    }

    /// Name of the fused artifact, e.g. `Su_combined_123_walk`
    #[must_use]
    pub fn combined_name(&self) -> String {
        format!("{}_combined_{}_{}", self.subject_prefix, self.subject_id, self.rest)
    }
}

/// Clips found for one group key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipGroup {
    pub front: Option<String>,
    pub side: Option<String>,
    pub combined_name: String,
}

impl ClipGroup {
    /// Front and side clip names, when both are present
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        Some((self.front.as_deref()?, self.side.as_deref()?))
    }
}

/// Group clip names by [`ClipKey::group_key`].
///
/// Names that do not parse are left out and logged. If two clips claim the
/// same slot, the later one in input order wins.
pub fn group_clips<I, S>(names: I) -> BTreeMap<String, ClipGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, ClipGroup> = BTreeMap::new();
    for name in names {
        let name = name.as_ref();
        let Some(key) = ClipKey::parse(name) else {
            log::warn!("Clip name {name} does not match prefix_id_view_trial_rest, not grouped");
            continue;
        };
        let group = groups.entry(key.group_key()).or_insert_with(|| ClipGroup {
            combined_name: key.combined_name(),
            ..ClipGroup::default()
        });
        let slot = match key.view {
            View::Front => &mut group.front,
            View::Side => &mut group.side,
        };
        if let Some(previous) = slot.replace(name.to_string()) {
            log::warn!("Clip {name} replaces {previous} in group {}", key.group_key());
        }
    }
    groups
}
