use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CycleError, Result};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FlowLevel {
    #[default]
    None,
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl FlowLevel {
    pub fn is_flow(self) -> bool {
        self != FlowLevel::None
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            FlowLevel::None => 0,
            FlowLevel::Spotting => 1,
            FlowLevel::Light => 2,
            FlowLevel::Medium => 3,
            FlowLevel::Heavy => 4,
        }
    }
}

/// A single day's log. An entry with `FlowLevel::None` records that the
/// user checked in without bleeding, which is not the same as no entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "flow_or_none")]
    pub flow: FlowLevel,
    #[serde(default)]
    pub symptoms: BTreeSet<String>,
    #[serde(default)]
    pub moods: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
}

// Stored exports write `"flow": null` for days without bleeding.
fn flow_or_none<'de, D>(deserializer: D) -> std::result::Result<FlowLevel, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlowLevel>::deserialize(deserializer)?.unwrap_or_default())
}

impl LogEntry {
    pub fn new(flow: FlowLevel) -> Self {
        Self {
            flow,
            ..Self::default()
        }
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symptoms.extend(normalize_tags(symptoms));
        self
    }

    pub fn with_moods<I, S>(mut self, moods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.moods.extend(normalize_tags(moods));
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn has_flow(&self) -> bool {
        self.flow.is_flow()
    }

    pub fn has_symptoms(&self) -> bool {
        !self.symptoms.is_empty()
    }

    fn normalized(self) -> Self {
        Self {
            flow: self.flow,
            symptoms: normalize_tags(self.symptoms).collect(),
            moods: normalize_tags(self.moods).collect(),
            notes: self.notes,
        }
    }
}

fn normalize_tags<I, S>(tags: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
}

/// Parse an ISO `yyyy-MM-dd` date key.
pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).map_err(|_| CycleError::InvalidDateKey {
        key: key.to_string(),
    })
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Immutable-by-convention snapshot of a user's logs, one entry per day,
/// iterated oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LogHistory {
    entries: BTreeMap<NaiveDate, LogEntry>,
}

impl LogHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, LogEntry)>,
    {
        let mut history = Self::new();
        for (date, entry) in entries {
            history.upsert(date, entry);
        }
        history
    }

    /// Build a history from string-keyed records, rejecting malformed keys.
    pub fn from_keyed_entries<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, LogEntry)>,
        K: AsRef<str>,
    {
        let mut history = Self::new();
        for (key, entry) in entries {
            history.upsert(parse_date_key(key.as_ref())?, entry);
        }
        Ok(history)
    }

    /// Decode a `{"yyyy-MM-dd": entry}` export.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, LogEntry> = serde_json::from_str(json)?;
        Self::from_keyed_entries(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Insert or replace the entry for `date`.
    pub fn upsert(&mut self, date: NaiveDate, entry: LogEntry) -> Option<LogEntry> {
        self.entries.insert(date, entry.normalized())
    }

    pub fn remove(&mut self, date: NaiveDate) -> Option<LogEntry> {
        self.entries.remove(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&LogEntry> {
        self.entries.get(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    pub fn has_flow_on(&self, date: NaiveDate) -> bool {
        self.get(date).is_some_and(LogEntry::has_flow)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, &LogEntry)> + '_ {
        self.entries.iter().map(|(d, e)| (*d, e))
    }

    pub fn range(
        &self,
        dates: RangeInclusive<NaiveDate>,
    ) -> impl DoubleEndedIterator<Item = (NaiveDate, &LogEntry)> + '_ {
        self.entries.range(dates).map(|(d, e)| (*d, e))
    }

    /// Dates with a logged flow, ascending.
    pub fn flow_dates(&self) -> Vec<NaiveDate> {
        self.iter()
            .filter(|(_, e)| e.has_flow())
            .map(|(d, _)| d)
            .collect()
    }
}
