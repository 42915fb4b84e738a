//! Core types: skill values, workers, the availability snapshot, requests and results

use crate::error::ConfigError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Qualification of a worker for one skill in one modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillValue {
    /// `-1`: never assignable for this skill
    Excluded,
    /// `0`: assignable only through fallback
    Passive,
    /// `1`: primary-eligible
    Active,
    /// `"w"`: primary-eligible, weight scaled by the personal modifier
    Weighted,
}

impl SkillValue {
    /// Eligible for the strict (level 1) pool
    pub fn is_primary(self) -> bool {
        matches!(self, SkillValue::Active | SkillValue::Weighted)
    }

    /// Eligible for the fallback (level 2) pool
    pub fn is_assignable(self) -> bool {
        !matches!(self, SkillValue::Excluded)
    }
}

impl fmt::Display for SkillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillValue::Excluded => write!(f, "-1"),
            SkillValue::Passive => write!(f, "0"),
            SkillValue::Active => write!(f, "1"),
            SkillValue::Weighted => write!(f, "w"),
        }
    }
}

impl TryFrom<&str> for SkillValue {
    type Error = String;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        match raw.trim() {
            "-1" => Ok(SkillValue::Excluded),
            "0" => Ok(SkillValue::Passive),
            "1" => Ok(SkillValue::Active),
            "w" | "W" => Ok(SkillValue::Weighted),
            other => Err(format!("invalid skill value '{other}', expected -1, 0, 1 or \"w\"")),
        }
    }
}

impl TryFrom<i64> for SkillValue {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(SkillValue::Excluded),
            0 => Ok(SkillValue::Passive),
            1 => Ok(SkillValue::Active),
            other => Err(format!("invalid skill value {other}, expected -1, 0, 1 or \"w\"")),
        }
    }
}

impl Serialize for SkillValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SkillValue::Excluded => serializer.serialize_i64(-1),
            SkillValue::Passive => serializer.serialize_i64(0),
            SkillValue::Active => serializer.serialize_i64(1),
            SkillValue::Weighted => serializer.serialize_str("w"),
        }
    }
}

impl<'de> Deserialize<'de> for SkillValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => SkillValue::try_from(v),
            Raw::Str(s) => SkillValue::try_from(s.as_str()),
        }
        .map_err(serde::de::Error::custom)
    }
}

fn default_modifier() -> f64 {
    1.0
}

/// A staffed worker and their qualifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Canonical identity
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// modality -> skill -> value
    #[serde(default)]
    pub skills: BTreeMap<String, BTreeMap<String, SkillValue>>,
    /// Effective capacity; 0.5 means half the real work per assignment
    #[serde(default = "default_modifier")]
    pub modifier: f64,
    /// Capacity used instead of `modifier` for skills marked `"w"`
    #[serde(default)]
    pub weighted_modifier: Option<f64>,
}

impl Worker {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: BTreeMap::new(),
            modifier: 1.0,
            weighted_modifier: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_skill(mut self, modality: &str, skill: &str, value: SkillValue) -> Self {
        self.skills
            .entry(modality.to_string())
            .or_default()
            .insert(skill.to_string(), value);
        self
    }

    pub fn with_modifier(mut self, modifier: f64) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_weighted_modifier(mut self, modifier: f64) -> Self {
        self.weighted_modifier = Some(modifier);
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// `None` when the worker has no entry for the skill in this modality
    pub fn skill_value(&self, modality: &str, skill: &str) -> Option<SkillValue> {
        self.skills.get(modality)?.get(skill).copied()
    }

    /// Capacity modifier that applies to an assignment with the given skill value
    pub fn effective_modifier(&self, value: Option<SkillValue>) -> f64 {
        match value {
            Some(SkillValue::Weighted) => self.weighted_modifier.unwrap_or(self.modifier),
            _ => self.modifier,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut modifiers = vec![("modifier", self.modifier)];
        if let Some(weighted) = self.weighted_modifier {
            modifiers.push(("weighted_modifier", weighted));
        }
        for (field, value) in modifiers {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidModifier {
                    worker: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// One period during which a worker staffs a modality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub worker_id: String,
    pub modality: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ShiftWindow {
    pub fn new(
        worker_id: impl Into<String>,
        modality: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            modality: modality.into(),
            start,
            end,
        }
    }

    /// Half-open: a shift ending at `now` no longer covers it
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }
}

/// Availability snapshot supplied by the scheduling side. Read-only to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub workers: Vec<Worker>,
    #[serde(default)]
    pub windows: Vec<ShiftWindow>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON roster
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let roster: Roster = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            what: "roster",
            message: e.to_string(),
        })?;
        roster.validate()?;
        Ok(roster)
    }

    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Whether any window at all exists for the modality
    pub fn covers_modality(&self, modality: &str) -> bool {
        self.windows.iter().any(|w| w.modality == modality)
    }

    pub fn is_on_shift(&self, worker_id: &str, modality: &str, now: DateTime<Utc>) -> bool {
        self.windows
            .iter()
            .any(|w| w.worker_id == worker_id && w.modality == modality && w.contains(now))
    }

    /// Hours covered by the union of the worker's windows up to `now`
    pub fn hours_worked(&self, worker_id: &str, now: DateTime<Utc>) -> f64 {
        let mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = self
            .windows
            .iter()
            .filter(|w| w.worker_id == worker_id && w.start < now)
            .map(|w| (w.start, w.end.min(now)))
            .collect();
        spans.sort();

        let mut total = Duration::zero();
        let mut current: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        for (start, end) in spans {
            current = match current {
                Some((cur_start, cur_end)) if start <= cur_end => {
                    Some((cur_start, cur_end.max(end)))
                }
                Some((cur_start, cur_end)) => {
                    total += cur_end - cur_start;
                    Some((start, end))
                }
                None => Some((start, end)),
            };
        }
        if let Some((start, end)) = current {
            total += end - start;
        }

        total.num_seconds() as f64 / 3600.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for worker in &self.workers {
            if !seen.insert(worker.id.as_str()) {
                return Err(ConfigError::DuplicateWorker(worker.id.clone()));
            }
            worker.validate()?;
        }

        for window in &self.windows {
            if !seen.contains(window.worker_id.as_str()) {
                return Err(ConfigError::UnknownWorker(window.worker_id.clone()));
            }
            if window.end <= window.start {
                return Err(ConfigError::InvalidWindow {
                    worker: window.worker_id.clone(),
                    modality: window.modality.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A work request as received from the dispatch layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub timestamp: DateTime<Utc>,
    pub skill: String,
    pub modality: String,
    /// Strict mode: no fallback beyond the exact (skill, modality) strict pool
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub special_task: Option<String>,
}

impl AssignRequest {
    pub fn new(timestamp: DateTime<Utc>, skill: impl Into<String>, modality: impl Into<String>) -> Self {
        Self {
            timestamp,
            skill: skill.into(),
            modality: modality.into(),
            strict: false,
            code: None,
            special_task: None,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.special_task = Some(task.into());
        self
    }
}

/// A committed assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker_id: String,
    pub worker_name: String,
    pub skill_used: String,
    pub modality_used: String,
    pub is_weighted: bool,
    pub weight: f64,
    /// Skill or modality differ from the request
    pub overflow: bool,
    pub timestamp: DateTime<Utc>,
}
