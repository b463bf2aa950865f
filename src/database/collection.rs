//! Static schema for each collection the list endpoints can query.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub pg_type: &'static str,
    /// Never projected, filtered or sorted through the query interface.
    pub hidden: bool,
}

const fn col(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef { name, pg_type, hidden: false }
}

const fn hidden(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef { name, pg_type, hidden: true }
}

const MISSION_COLUMNS: &[ColumnDef] = &[
    col("id", "uuid"),
    col("name", "text"),
    col("description", "text"),
    col("status", "text"),
    col("commander", "text"),
    col("slug", "text"),
    col("owner_id", "uuid"),
    col("created_at", "timestamptz"),
];

const INCIDENT_COLUMNS: &[ColumnDef] = &[
    col("id", "uuid"),
    col("title", "text"),
    col("description", "text"),
    col("status", "text"),
    col("reported_at", "timestamptz"),
    col("mission_id", "uuid"),
];

const REPORT_COLUMNS: &[ColumnDef] = &[
    col("id", "uuid"),
    col("title", "text"),
    col("content", "text"),
    col("status", "text"),
    col("reported_at", "timestamptz"),
    col("incident_id", "uuid"),
    col("files", "jsonb"),
];

const USER_COLUMNS: &[ColumnDef] = &[
    col("id", "uuid"),
    col("name", "text"),
    col("email", "text"),
    col("role", "text"),
    hidden("password", "text"),
    hidden("reset_password_token", "text"),
    hidden("reset_password_expire", "timestamptz"),
    col("created_at", "timestamptz"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Missions,
    Incidents,
    Reports,
    Users,
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Missions => "missions",
            Collection::Incidents => "incidents",
            Collection::Reports => "reports",
            Collection::Users => "users",
        }
    }

    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            Collection::Missions => MISSION_COLUMNS,
            Collection::Incidents => INCIDENT_COLUMNS,
            Collection::Reports => REPORT_COLUMNS,
            Collection::Users => USER_COLUMNS,
        }
    }

    /// Column used for the default (newest first) ordering.
    pub fn created_column(&self) -> &'static str {
        match self {
            Collection::Missions | Collection::Users => "created_at",
            Collection::Incidents | Collection::Reports => "reported_at",
        }
    }

    /// Look up a column that may be used in filters, projections and sorts.
    pub fn visible_column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name && !c.hidden)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        self.columns().iter().filter(|c| !c.hidden)
    }
}

/// `json_build_object('a', "a", ...)` over the given columns.
pub fn json_object_sql<'a>(columns: impl IntoIterator<Item = &'a ColumnDef>) -> String {
    let pairs = columns
        .into_iter()
        .map(|c| format!("'{}', \"{}\"", c.name, c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("json_build_object({})", pairs)
}
