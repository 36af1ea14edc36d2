//! Per-user record management
//!
//! `UserRecords` owns one user's profile, cycle history and activity log and
//! is passed around explicitly; there is no process-wide store. Every
//! mutation keeps cycles ascending by start date and activities newest first,
//! and hands back predictions recomputed from the new history.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RecordError, RecordKind, Result};
use crate::models::{ActivityRecord, CycleRecord, Flow, Predictions, Statistics};
use crate::prediction::PredictionEngine;
use crate::risk;
use crate::statistics::StatisticsEngine;

/// Shortest cycle length a profile may declare
pub const MIN_PROFILE_CYCLE_LENGTH: i64 = 21;

/// Longest cycle length a profile may declare
pub const MAX_PROFILE_CYCLE_LENGTH: i64 = 35;

/// User profile settings that feed into new records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,

    /// Stamped onto every new cycle as its declared length
    pub cycle_length: i64,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            name: String::new(),
            cycle_length: 28,
        }
    }
}

impl UserProfile {
    /// Set the declared cycle length. Values outside 21..=35 are ignored.
    pub fn set_cycle_length(&mut self, days: i64) -> bool {
        if (MIN_PROFILE_CYCLE_LENGTH..=MAX_PROFILE_CYCLE_LENGTH).contains(&days) {
            self.cycle_length = days;
            true
        } else {
            debug!(days, "Ignoring out-of-range profile cycle length");
            false
        }
    }
}

/// Input for a new cycle record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCycle {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flow: Option<Flow>,
    pub symptoms: BTreeSet<String>,
}

impl NewCycle {
    pub fn starting(start_date: NaiveDate) -> Self {
        NewCycle {
            start_date: Some(start_date),
            ..NewCycle::default()
        }
    }
}

/// Partial update of an existing cycle; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleUpdate {
    pub start_date: Option<NaiveDate>,

    /// `Some(None)` clears the end date
    pub end_date: Option<Option<NaiveDate>>,

    pub flow: Option<Flow>,
    pub symptoms: Option<BTreeSet<String>>,
}

/// One user's records and the engines that project them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecords {
    #[serde(default)]
    profile: UserProfile,

    #[serde(default)]
    cycles: Vec<CycleRecord>,

    #[serde(default)]
    activities: Vec<ActivityRecord>,

    #[serde(skip)]
    prediction: PredictionEngine,

    #[serde(skip)]
    statistics: StatisticsEngine,
}

impl UserRecords {
    pub fn new(profile: UserProfile) -> Self {
        UserRecords {
            profile,
            ..UserRecords::default()
        }
    }

    /// Replace the engines used for projections
    pub fn with_engines(mut self, prediction: PredictionEngine, statistics: StatisticsEngine) -> Self {
        self.prediction = prediction;
        self.statistics = statistics;
        self
    }

    /// Load records from a JSON snapshot; a missing file is an empty record set
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No records file yet, starting empty");
            return Ok(UserRecords::default());
        }

        let content = fs::read_to_string(path)?;
        let mut records: UserRecords = serde_json::from_str(&content)?;
        records.sort_cycles();
        records.sort_activities();

        debug!(
            path = %path.display(),
            cycles = records.cycles.len(),
            activities = records.activities.len(),
            "Loaded records"
        );
        Ok(records)
    }

    /// Write records to a JSON snapshot, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), "Saved records");
        Ok(())
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut UserProfile {
        &mut self.profile
    }

    /// Cycles, ascending by start date
    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    /// Activities, most recent first
    pub fn activities(&self) -> &[ActivityRecord] {
        &self.activities
    }

    pub fn predictions(&self) -> Option<Predictions> {
        self.prediction.predict(&self.cycles)
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics.summarize(&self.cycles)
    }

    /// Record a new cycle, stamping the profile's cycle length on it
    pub fn append_cycle(&mut self, new_cycle: NewCycle) -> Result<(CycleRecord, Option<Predictions>)> {
        let start_date = new_cycle.start_date.ok_or_else(|| RecordError::InvalidField {
            field: "startDate".to_string(),
            reason: "a start date is required".to_string(),
        })?;
        validate_range(start_date, new_cycle.end_date)?;

        let cycle = CycleRecord {
            id: Uuid::new_v4().to_string(),
            start_date,
            end_date: new_cycle.end_date,
            flow: new_cycle.flow.unwrap_or_default(),
            symptoms: new_cycle.symptoms,
            custom_cycle_length: Some(self.profile.cycle_length),
            created_at: Some(Utc::now()),
        };

        info!(cycle_id = %cycle.id, start_date = %cycle.start_date, "Cycle recorded");
        self.cycles.push(cycle.clone());
        self.sort_cycles();

        Ok((cycle, self.predictions()))
    }

    /// Add already-identified cycles (for example from an import).
    /// Records without an id, or whose id is already taken, get a fresh one.
    pub fn extend_cycles(&mut self, cycles: Vec<CycleRecord>) -> Result<usize> {
        for cycle in &cycles {
            validate_range(cycle.start_date, cycle.end_date)?;
        }

        let mut taken: HashSet<String> = self.cycles.iter().map(|cycle| cycle.id.clone()).collect();
        let count = cycles.len();
        for mut cycle in cycles {
            if cycle.id.trim().is_empty() || taken.contains(&cycle.id) {
                if !cycle.id.trim().is_empty() {
                    debug!(cycle_id = %cycle.id, "Reassigning duplicate cycle id");
                }
                cycle.id = Uuid::new_v4().to_string();
            }
            taken.insert(cycle.id.clone());
            self.cycles.push(cycle);
        }
        self.sort_cycles();

        info!(count, "Cycles added");
        Ok(count)
    }

    pub fn update_cycle(&mut self, id: &str, update: CycleUpdate) -> Result<(CycleRecord, Option<Predictions>)> {
        let index = self.cycle_index(id)?;

        let current = &self.cycles[index];
        let start_date = update.start_date.unwrap_or(current.start_date);
        let end_date = update.end_date.unwrap_or(current.end_date);
        validate_range(start_date, end_date)?;

        let cycle = &mut self.cycles[index];
        cycle.start_date = start_date;
        cycle.end_date = end_date;
        if let Some(flow) = update.flow {
            cycle.flow = flow;
        }
        if let Some(symptoms) = update.symptoms {
            cycle.symptoms = symptoms;
        }
        let updated = cycle.clone();

        info!(cycle_id = %id, "Cycle updated");
        self.sort_cycles();

        Ok((updated, self.predictions()))
    }

    pub fn remove_cycle(&mut self, id: &str) -> Result<Option<Predictions>> {
        let index = self.cycle_index(id)?;
        self.cycles.remove(index);

        info!(cycle_id = %id, "Cycle removed");
        Ok(self.predictions())
    }

    /// Log an activity. Its risk is classified against the current
    /// predictions and stored as-is; later history changes don't touch it.
    pub fn append_activity(&mut self, date: NaiveDate, protection: bool) -> ActivityRecord {
        let predictions = self.predictions();

        let activity = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            date,
            protection,
            pregnancy_risk: risk::classify(date, predictions.as_ref()),
            created_at: Some(Utc::now()),
        };

        info!(
            activity_id = %activity.id,
            date = %activity.date,
            risk = %activity.pregnancy_risk,
            "Activity recorded"
        );
        self.activities.push(activity.clone());
        self.sort_activities();

        activity
    }

    pub fn remove_activity(&mut self, id: &str) -> Result<()> {
        let index = self
            .activities
            .iter()
            .position(|activity| activity.id == id)
            .ok_or_else(|| RecordError::NotFound {
                kind: RecordKind::Activity,
                id: id.to_string(),
            })?;
        self.activities.remove(index);

        info!(activity_id = %id, "Activity removed");
        Ok(())
    }

    fn cycle_index(&self, id: &str) -> Result<usize> {
        self.cycles
            .iter()
            .position(|cycle| cycle.id == id)
            .ok_or_else(|| {
                RecordError::NotFound {
                    kind: RecordKind::Cycle,
                    id: id.to_string(),
                }
                .into()
            })
    }

    fn sort_cycles(&mut self) {
        self.cycles.sort_by_key(|cycle| cycle.start_date);
    }

    fn sort_activities(&mut self) {
        self.activities.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

fn validate_range(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<()> {
    match end_date {
        Some(end) if end < start_date => Err(RecordError::InvalidRange {
            start: start_date,
            end,
        }
        .into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CycleFemError;
    use crate::models::RiskLevel;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_append_cycle_defaults() {
        let mut records = UserRecords::default();

        let (cycle, predictions) = records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();
        assert!(!cycle.id.is_empty());
        assert_eq!(cycle.flow, Flow::Medium);
        assert!(cycle.symptoms.is_empty());
        assert_eq!(cycle.custom_cycle_length, Some(28));
        assert!(cycle.created_at.is_some());

        let predictions = predictions.unwrap();
        assert_eq!(predictions.next_period, date(2024, 1, 29));
    }

    #[test]
    fn test_append_cycle_uses_profile_length() {
        let mut profile = UserProfile::default();
        assert!(profile.set_cycle_length(32));
        let mut records = UserRecords::new(profile);

        let (cycle, predictions) = records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();
        assert_eq!(cycle.custom_cycle_length, Some(32));
        assert_eq!(predictions.unwrap().avg_cycle_length, 32);
    }

    #[test]
    fn test_profile_cycle_length_bounds() {
        let mut profile = UserProfile::default();
        assert!(!profile.set_cycle_length(20));
        assert!(!profile.set_cycle_length(36));
        assert_eq!(profile.cycle_length, 28);
        assert!(profile.set_cycle_length(21));
        assert!(profile.set_cycle_length(35));
        assert_eq!(profile.cycle_length, 35);
    }

    #[test]
    fn test_append_cycle_requires_start_date() {
        let mut records = UserRecords::default();
        let err = records.append_cycle(NewCycle::default()).unwrap_err();
        assert!(matches!(
            err,
            CycleFemError::Record(RecordError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_append_cycle_rejects_inverted_range() {
        let mut records = UserRecords::default();
        let new_cycle = NewCycle {
            end_date: Some(date(2023, 12, 30)),
            ..NewCycle::starting(date(2024, 1, 1))
        };

        let err = records.append_cycle(new_cycle).unwrap_err();
        assert!(matches!(
            err,
            CycleFemError::Record(RecordError::InvalidRange { .. })
        ));
        assert!(records.cycles().is_empty());
    }

    #[test]
    fn test_cycles_stay_sorted() {
        let mut records = UserRecords::default();
        records.append_cycle(NewCycle::starting(date(2024, 2, 1))).unwrap();
        records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();
        records.append_cycle(NewCycle::starting(date(2024, 3, 1))).unwrap();

        let starts: Vec<NaiveDate> = records.cycles().iter().map(|c| c.start_date).collect();
        assert_eq!(starts, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
    }

    #[test]
    fn test_update_cycle_partial() {
        let mut records = UserRecords::default();
        let (cycle, _) = records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();

        let (updated, predictions) = records
            .update_cycle(
                &cycle.id,
                CycleUpdate {
                    end_date: Some(Some(date(2024, 1, 5))),
                    flow: Some(Flow::Heavy),
                    ..CycleUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.start_date, date(2024, 1, 1));
        assert_eq!(updated.end_date, Some(date(2024, 1, 5)));
        assert_eq!(updated.flow, Flow::Heavy);
        assert_eq!(predictions.unwrap().avg_cycle_length, 5);

        let (cleared, _) = records
            .update_cycle(
                &cycle.id,
                CycleUpdate {
                    end_date: Some(None),
                    ..CycleUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.end_date, None);
        assert_eq!(cleared.flow, Flow::Heavy);
    }

    #[test]
    fn test_update_cycle_rejects_inverted_range() {
        let mut records = UserRecords::default();
        let new_cycle = NewCycle {
            end_date: Some(date(2024, 1, 5)),
            ..NewCycle::starting(date(2024, 1, 1))
        };
        let (cycle, _) = records.append_cycle(new_cycle).unwrap();

        let update = CycleUpdate {
            start_date: Some(date(2024, 1, 10)),
            ..CycleUpdate::default()
        };
        assert!(records.update_cycle(&cycle.id, update).is_err());
        assert_eq!(records.cycles()[0].start_date, date(2024, 1, 1));
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut records = UserRecords::default();

        let err = records.update_cycle("missing", CycleUpdate::default()).unwrap_err();
        assert!(matches!(
            err,
            CycleFemError::Record(RecordError::NotFound { kind: RecordKind::Cycle, .. })
        ));
        assert!(records.remove_cycle("missing").is_err());

        let err = records.remove_activity("missing").unwrap_err();
        assert!(matches!(
            err,
            CycleFemError::Record(RecordError::NotFound { kind: RecordKind::Activity, .. })
        ));
    }

    #[test]
    fn test_remove_cycle_returns_fresh_predictions() {
        let mut records = UserRecords::default();
        let (cycle, _) = records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();

        let predictions = records.remove_cycle(&cycle.id).unwrap();
        assert!(predictions.is_none());
        assert!(records.cycles().is_empty());
    }

    #[test]
    fn test_activity_risk_is_frozen_at_write_time() {
        let mut records = UserRecords::default();

        let early = records.append_activity(date(2024, 1, 15), false);
        assert_eq!(early.pregnancy_risk, RiskLevel::Unknown);

        // history 2024-01-01, length 28 -> ovulation 2024-01-15
        records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();
        let late = records.append_activity(date(2024, 1, 15), true);
        assert_eq!(late.pregnancy_risk, RiskLevel::High);

        let stored: Vec<RiskLevel> = records
            .activities()
            .iter()
            .map(|activity| activity.pregnancy_risk)
            .collect();
        assert!(stored.contains(&RiskLevel::Unknown));
        assert!(stored.contains(&RiskLevel::High));
    }

    #[test]
    fn test_activities_newest_first() {
        let mut records = UserRecords::default();
        records.append_activity(date(2024, 1, 3), false);
        records.append_activity(date(2024, 1, 9), false);
        records.append_activity(date(2024, 1, 5), false);

        let dates: Vec<NaiveDate> = records.activities().iter().map(|a| a.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 9), date(2024, 1, 5), date(2024, 1, 3)]);

        let id = records.activities()[1].id.clone();
        records.remove_activity(&id).unwrap();
        assert_eq!(records.activities().len(), 2);
    }

    #[test]
    fn test_extend_cycles_assigns_missing_ids() {
        let mut records = UserRecords::default();
        let imported = vec![
            CycleRecord::new("", date(2024, 2, 1)),
            CycleRecord::new("keep-me", date(2024, 1, 1)),
        ];

        assert_eq!(records.extend_cycles(imported).unwrap(), 2);
        assert_eq!(records.cycles()[0].id, "keep-me");
        assert!(!records.cycles()[1].id.is_empty());
    }

    #[test]
    fn test_extend_cycles_reassigns_taken_ids() {
        let mut records = UserRecords::default();
        let (existing, _) = records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();

        let imported = vec![
            CycleRecord::new(existing.id.clone(), date(2024, 1, 1)),
            CycleRecord::new("twin", date(2024, 1, 29)),
            CycleRecord::new("twin", date(2024, 2, 26)),
        ];
        assert_eq!(records.extend_cycles(imported).unwrap(), 3);

        let ids: HashSet<&str> = records.cycles().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains("twin"));

        records.remove_cycle(&existing.id).unwrap();
        assert!(records.cycles().iter().all(|c| c.id != existing.id));
        assert_eq!(records.cycles().len(), 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("records.json");

        let mut records = UserRecords::default();
        records.profile_mut().name = "Alex".to_string();
        records.append_cycle(NewCycle::starting(date(2024, 1, 1))).unwrap();
        records.append_activity(date(2024, 1, 14), false);
        records.save(&path).unwrap();

        let loaded = UserRecords::load(&path).unwrap();
        assert_eq!(loaded.profile().name, "Alex");
        assert_eq!(loaded.cycles(), records.cycles());
        assert_eq!(loaded.activities(), records.activities());
        assert_eq!(loaded.predictions(), records.predictions());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let records = UserRecords::load(temp_dir.path().join("absent.json")).unwrap();
        assert!(records.cycles().is_empty());
        assert_eq!(records.profile().cycle_length, 28);
    }
}
