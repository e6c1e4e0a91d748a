//! The learner's progress record.
//!
//! A [`ProfileRecord`] holds per-grade progress for every grade, even the ones
//! the learner has never opened. Every constructor and every decode path runs
//! [`ProfileRecord::normalize`], so code holding a record can index any grade
//! in `MIN_GRADE..=MAX_GRADE` without checking.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

/// Lowest selectable grade.
pub const MIN_GRADE: u8 = 1;

/// Highest selectable grade.
pub const MAX_GRADE: u8 = 7;

/// First level of every grade.
pub const MIN_LEVEL: u16 = 1;

/// Last level of every grade.
pub const MAX_LEVEL: u16 = 50;

/// Every valid grade, in order.
#[must_use]
pub fn grades() -> RangeInclusive<u8> {
    MIN_GRADE..=MAX_GRADE
}

/// Clamps arbitrary input into the valid grade range.
#[must_use]
pub fn clamp_grade(grade: i64) -> u8 {
    grade.clamp(i64::from(MIN_GRADE), i64::from(MAX_GRADE)) as u8
}

fn clamp_level(level: i64) -> u16 {
    level.clamp(i64::from(MIN_LEVEL), i64::from(MAX_LEVEL)) as u16
}

fn valid_level(level: i64) -> Option<u16> {
    u16::try_from(level)
        .ok()
        .filter(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l))
}

/// A learner's profile: name, selected grade, and progress for every grade.
///
/// The derived ordering is only used to break exact timestamp ties during
/// merge; it has no domain meaning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ProfileRecordWire")]
pub struct ProfileRecord {
    name: String,
    grade: u8,
    completed_levels_by_grade: BTreeMap<u8, BTreeSet<u16>>,
    current_level_by_grade: BTreeMap<u8, u16>,
}

impl ProfileRecord {
    /// Creates a fresh record. The grade is clamped into range.
    pub fn new(name: impl Into<String>, grade: i64) -> Self {
        Self::from_parts(name, grade, BTreeMap::new(), BTreeMap::new())
    }

    /// Builds a record from raw per-grade maps, normalizing the result.
    pub fn from_parts(
        name: impl Into<String>,
        grade: i64,
        completed_levels_by_grade: BTreeMap<u8, BTreeSet<u16>>,
        current_level_by_grade: BTreeMap<u8, u16>,
    ) -> Self {
        let mut record = Self {
            name: name.into(),
            grade: clamp_grade(grade),
            completed_levels_by_grade,
            current_level_by_grade,
        };
        record.normalize();
        record
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the selected grade, always within `MIN_GRADE..=MAX_GRADE`.
    #[must_use]
    pub fn grade(&self) -> u8 {
        self.grade
    }

    /// Selects a grade, clamping the input.
    pub fn set_grade(&mut self, grade: i64) {
        self.grade = clamp_grade(grade);
    }

    /// Completed levels per grade.
    #[must_use]
    pub fn completed_levels_by_grade(&self) -> &BTreeMap<u8, BTreeSet<u16>> {
        &self.completed_levels_by_grade
    }

    /// Highest unlocked level per grade.
    #[must_use]
    pub fn current_level_by_grade(&self) -> &BTreeMap<u8, u16> {
        &self.current_level_by_grade
    }

    /// Completed levels for one grade (empty for out-of-range grades).
    #[must_use]
    pub fn completed_levels(&self, grade: u8) -> BTreeSet<u16> {
        self.completed_levels_by_grade
            .get(&grade)
            .cloned()
            .unwrap_or_default()
    }

    /// Highest unlocked level for one grade.
    #[must_use]
    pub fn current_level(&self, grade: u8) -> u16 {
        self.current_level_by_grade
            .get(&grade)
            .copied()
            .unwrap_or(MIN_LEVEL)
    }

    /// Whether `level` is playable in the selected grade.
    #[must_use]
    pub fn is_level_unlocked(&self, level: u16) -> bool {
        level <= self.current_level(self.grade)
    }

    /// Whether `level` has been completed in the selected grade.
    #[must_use]
    pub fn is_level_completed(&self, level: u16) -> bool {
        self.completed_levels_by_grade
            .get(&self.grade)
            .is_some_and(|levels| levels.contains(&level))
    }

    /// Marks a level of the selected grade as completed.
    ///
    /// Completing the current level unlocks the next one. Returns `false` and
    /// leaves the record untouched if `level` is outside `MIN_LEVEL..=MAX_LEVEL`.
    pub fn complete_level(&mut self, level: u16) -> bool {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return false;
        }
        let grade = self.grade;
        self.completed_levels_by_grade
            .entry(grade)
            .or_default()
            .insert(level);
        let current = self.current_level(grade);
        if level == current && current < MAX_LEVEL {
            self.unlock_level(grade, level + 1);
        }
        true
    }

    /// Raises the unlocked pointer of a grade. Never re-locks a level.
    pub fn unlock_level(&mut self, grade: u8, level: u16) {
        if !grades().contains(&grade) {
            return;
        }
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        let entry = self
            .current_level_by_grade
            .entry(grade)
            .or_insert(MIN_LEVEL);
        if level > *entry {
            *entry = level;
        }
    }

    /// Restores the record invariants.
    ///
    /// Clamps the grade, drops grades and levels outside their ranges, clamps
    /// current-level pointers, and fills every missing grade with an empty
    /// completed set and current level 1.
    pub fn normalize(&mut self) {
        self.grade = clamp_grade(i64::from(self.grade));

        self.completed_levels_by_grade
            .retain(|grade, _| grades().contains(grade));
        for levels in self.completed_levels_by_grade.values_mut() {
            levels.retain(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l));
        }

        self.current_level_by_grade
            .retain(|grade, _| grades().contains(grade));
        for level in self.current_level_by_grade.values_mut() {
            *level = (*level).clamp(MIN_LEVEL, MAX_LEVEL);
        }

        for grade in grades() {
            self.completed_levels_by_grade.entry(grade).or_default();
            self.current_level_by_grade.entry(grade).or_insert(MIN_LEVEL);
        }
    }
}

/// Lenient wire shape: accepts out-of-range numbers and missing maps, all of
/// which are repaired by `normalize`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRecordWire {
    name: String,
    grade: i64,
    #[serde(default)]
    completed_levels_by_grade: BTreeMap<i64, BTreeSet<i64>>,
    #[serde(default)]
    current_level_by_grade: BTreeMap<i64, i64>,
}

impl From<ProfileRecordWire> for ProfileRecord {
    fn from(wire: ProfileRecordWire) -> Self {
        let completed = wire
            .completed_levels_by_grade
            .into_iter()
            .filter_map(|(grade, levels)| {
                let grade = u8::try_from(grade).ok()?;
                Some((grade, levels.into_iter().filter_map(valid_level).collect()))
            })
            .collect();
        let current = wire
            .current_level_by_grade
            .into_iter()
            .filter_map(|(grade, level)| Some((u8::try_from(grade).ok()?, clamp_level(level))))
            .collect();
        Self::from_parts(wire.name, wire.grade, completed, current)
    }
}

/// The single-grade record written before per-grade progress existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProfile {
    pub name: String,
    pub grade: i64,
    pub completed_levels: BTreeSet<i64>,
    pub current_level: i64,
}

impl LegacyProfile {
    /// Upgrades to the per-grade shape.
    ///
    /// The legacy progress lands under the (clamped) legacy grade; every other
    /// grade starts fresh.
    #[must_use]
    pub fn into_record(self) -> ProfileRecord {
        let grade = clamp_grade(self.grade);
        let mut completed = BTreeMap::new();
        completed.insert(
            grade,
            self.completed_levels
                .into_iter()
                .filter_map(valid_level)
                .collect(),
        );
        let mut current = BTreeMap::new();
        current.insert(grade, clamp_level(self.current_level));
        ProfileRecord::from_parts(self.name, i64::from(grade), completed, current)
    }
}

/// A profile found under a legacy storage key, in whichever shape the build
/// that wrote it used.
#[derive(Debug, Clone)]
pub enum StoredProfile {
    /// Single-grade record (`completedLevels` / `currentLevel`).
    SingleGrade(LegacyProfile),
    /// Per-grade record saved without replication metadata.
    PerGrade(ProfileRecord),
}

impl StoredProfile {
    /// Parses a legacy entry, trying the single-grade shape first.
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        match serde_json::from_slice::<LegacyProfile>(bytes) {
            Ok(legacy) => Ok(Self::SingleGrade(legacy)),
            Err(_) => Ok(Self::PerGrade(serde_json::from_slice(bytes)?)),
        }
    }

    /// Converts either shape into a normalized per-grade record.
    #[must_use]
    pub fn into_record(self) -> ProfileRecord {
        match self {
            Self::SingleGrade(legacy) => legacy.into_record(),
            Self::PerGrade(record) => record,
        }
    }
}
