//! One-hop relations that list and detail endpoints may populate.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use super::collection::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Mission → every incident whose `mission_id` is the mission, as `incidents`.
    MissionIncidents,
    /// Incident → its parent mission, as `mission`.
    IncidentMission,
    /// Report → its parent incident, as `incident`.
    ReportIncident,
}

impl Relation {
    pub fn source(&self) -> Collection {
        match self {
            Relation::MissionIncidents => Collection::Missions,
            Relation::IncidentMission => Collection::Incidents,
            Relation::ReportIncident => Collection::Reports,
        }
    }

    pub fn target(&self) -> Collection {
        match self {
            Relation::MissionIncidents => Collection::Incidents,
            Relation::IncidentMission => Collection::Missions,
            Relation::ReportIncident => Collection::Incidents,
        }
    }

    /// Field on the source records holding the join key.
    pub fn local_key(&self) -> &'static str {
        match self {
            Relation::MissionIncidents => "id",
            Relation::IncidentMission => "mission_id",
            Relation::ReportIncident => "incident_id",
        }
    }

    /// Column on the target collection matched against the join key.
    pub fn foreign_key(&self) -> &'static str {
        match self {
            Relation::MissionIncidents => "mission_id",
            Relation::IncidentMission | Relation::ReportIncident => "id",
        }
    }

    pub fn attach_as(&self) -> &'static str {
        match self {
            Relation::MissionIncidents => "incidents",
            Relation::IncidentMission => "mission",
            Relation::ReportIncident => "incident",
        }
    }

    /// Backward relations attach an array, forward ones a single record.
    pub fn is_many(&self) -> bool {
        matches!(self, Relation::MissionIncidents)
    }

    /// Distinct join keys present on the source records, in first-seen order.
    pub fn keys(&self, records: &[Value]) -> Vec<Uuid> {
        let mut keys: Vec<Uuid> = Vec::new();
        for record in records {
            if let Some(key) = key_of(record, self.local_key()) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Attach fetched target records onto the source records.
    ///
    /// Records that lack the join key (e.g. projected away) are left untouched.
    pub fn attach(&self, records: &mut [Value], related: Vec<Value>) {
        let mut by_key: HashMap<Uuid, Vec<Value>> = HashMap::new();
        for item in related {
            if let Some(key) = key_of(&item, self.foreign_key()) {
                by_key.entry(key).or_default().push(item);
            }
        }

        for record in records.iter_mut() {
            let Some(key) = key_of(record, self.local_key()) else {
                continue;
            };
            let matches = by_key.get(&key).cloned().unwrap_or_default();
            let attached = if self.is_many() {
                Value::Array(matches)
            } else {
                matches.into_iter().next().unwrap_or(Value::Null)
            };
            if let Value::Object(obj) = record {
                obj.insert(self.attach_as().to_string(), attached);
            }
        }
    }
}

fn key_of(record: &Value, field: &str) -> Option<Uuid> {
    record.get(field)?.as_str()?.parse().ok()
}
