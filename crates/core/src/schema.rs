//! Static table descriptors.
//!
//! Each table is described once by a [`TableSchema`]: its columns, indexes,
//! which fields are searchable or filterable, which key addresses a row for
//! updates, and the default orderings. The generic repository, the store
//! backends and the schema bootstrapper are all driven by these descriptors,
//! so per-table behaviour lives here rather than in duplicated query code.

use core::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{CASES_TABLE, CaseRecord, MAILS_TABLE, MailEntry, TRACKING_TABLE, TrackingSession, USERS_TABLE, UserProfile};
use crate::types::EmailError;

/// Column storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    /// `NUMERIC(10, 2)`.
    Numeric,
    Integer,
    Boolean,
    Date,
    Timestamp,
    TextArray,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Uuid => "UUID",
            Self::Text => "TEXT",
            Self::Numeric => "NUMERIC(10, 2)",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP WITH TIME ZONE",
            Self::TextArray => "TEXT[]",
        }
    }

    /// Whether values of this type compare numerically.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric | Self::Integer)
    }
}

/// Column default applied by the store when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// `gen_random_uuid()`
    GeneratedUuid,
    /// `NOW()`
    Now,
    Bool(bool),
    Int(i64),
    Text(&'static str),
}

impl ColumnDefault {
    /// SQL expression used in `CREATE TABLE`.
    #[must_use]
    pub fn sql(&self) -> String {
        match self {
            Self::GeneratedUuid => "gen_random_uuid()".to_string(),
            Self::Now => "NOW()".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// A single column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl Column {
    /// A nullable column without default.
    #[must_use]
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            primary_key: false,
            not_null: false,
            unique: false,
            default: None,
        }
    }

    /// The conventional `id UUID PRIMARY KEY DEFAULT gen_random_uuid()` column.
    #[must_use]
    pub const fn id() -> Self {
        Self {
            name: "id",
            ty: ColumnType::Uuid,
            primary_key: true,
            not_null: true,
            unique: true,
            default: Some(ColumnDefault::GeneratedUuid),
        }
    }

    /// A `TIMESTAMP WITH TIME ZONE DEFAULT NOW()` column.
    #[must_use]
    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp).with_default(ColumnDefault::Now)
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether an insert must supply this column.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.not_null && self.default.is_none()
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.ty.sql());
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else {
            if self.unique {
                def.push_str(" UNIQUE");
            }
            if self.not_null {
                def.push_str(" NOT NULL");
            }
        }
        if let Some(default) = &self.default {
            let _ = write!(def, " DEFAULT {}", default.sql());
        }
        def
    }
}

/// A single-column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub column: &'static str,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// `true` for ascending order.
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        matches!(self, Self::Asc)
    }
}

/// A sort order consisting of a column name and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortField {
    /// Create an ascending sort on the given column.
    #[must_use]
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Create a descending sort on the given column.
    #[must_use]
    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Newest rows first.
    pub const NEWEST_FIRST: Self = Self::desc("created_at");
}

/// Static description of one table.
#[derive(Debug)]
pub struct TableSchema {
    /// Table name in the store.
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indexes: &'static [Index],
    /// Text columns matched by substring search (OR-combined).
    pub searchable: &'static [&'static str],
    /// Columns offered as exact-match filters on the admin screen.
    pub filterable: &'static [&'static str],
    /// Column that addresses a row for single-field updates.
    pub update_key: &'static str,
    /// Columns that may be changed after insert.
    pub updatable: &'static [&'static str],
    /// Ordering for full listings.
    pub default_order: SortField,
    /// Ordering for exact-match filter results.
    pub filter_order: SortField,
}

impl TableSchema {
    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns carrying a UNIQUE constraint (including the primary key).
    pub fn unique_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.unique || c.primary_key)
    }

    /// Whether `field` may be changed by an update.
    #[must_use]
    pub fn is_updatable(&self, field: &str) -> bool {
        self.updatable.contains(&field)
    }

    /// Whether the table has an `updated_at` column maintained by trigger.
    #[must_use]
    pub fn has_touch_trigger(&self) -> bool {
        self.column("updated_at").is_some()
    }

    /// Name of the `BEFORE UPDATE` trigger.
    #[must_use]
    pub fn trigger_name(&self) -> String {
        format!("update_{}_updated_at", self.name)
    }

    /// Name of the trigger function.
    #[must_use]
    pub fn trigger_function_name(&self) -> String {
        format!("update_{}_updated_at_column", self.name)
    }

    /// Render the idempotent schema-definition statement.
    ///
    /// Re-running the statement against a store where the table already
    /// exists is a no-op apart from replacing the trigger.
    #[must_use]
    pub fn create_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("  {}", c.definition()))
            .collect::<Vec<_>>()
            .join(",\n");

        let mut sql = format!(
            "-- Create {name} table\nCREATE TABLE IF NOT EXISTS {name} (\n{columns}\n);\n",
            name = self.name
        );

        for index in self.indexes {
            let _ = write!(
                sql,
                "\nCREATE INDEX IF NOT EXISTS {} ON {}({});\n",
                index.name, self.name, index.column
            );
        }

        if self.has_touch_trigger() {
            let function = self.trigger_function_name();
            let trigger = self.trigger_name();
            let _ = write!(
                sql,
                "\n-- Stamp updated_at on every row mutation\n\
                 CREATE OR REPLACE FUNCTION {function}()\n\
                 RETURNS TRIGGER AS $$\n\
                 BEGIN\n  NEW.updated_at = NOW();\n  RETURN NEW;\nEND;\n\
                 $$ LANGUAGE plpgsql;\n\n\
                 DROP TRIGGER IF EXISTS {trigger} ON {table};\n\
                 CREATE TRIGGER {trigger}\n  BEFORE UPDATE ON {table}\n  FOR EACH ROW\n  EXECUTE PROCEDURE {function}();\n",
                table = self.name
            );
        }

        sql
    }
}

/// Errors raised by client-side field validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A mandatory text field is empty or whitespace.
    #[error("{0} is required")]
    Blank(&'static str),
    /// A numeric field is below zero.
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    /// A numeric field is below its minimum.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: i64 },
    /// An email field does not parse.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
}

/// A partial field set accepted by `insert`.
///
/// Drafts serialize only the fields that are set, so the store applies its
/// column defaults to everything else.
pub trait Draft: Serialize + Send + Sync {
    /// Check the field invariants that must hold before the store is called.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A record type stored in one table.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Insert payload for this table.
    type Draft: Draft;

    /// The table descriptor.
    fn schema() -> &'static TableSchema;
}

/// The four tables managed by the admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Cases,
    Mails,
    Users,
    Tracking,
}

impl EntityKind {
    /// Every entity, in bootstrap order.
    pub const ALL: [Self; 4] = [Self::Cases, Self::Mails, Self::Users, Self::Tracking];

    /// The table descriptor for this entity.
    #[must_use]
    pub fn schema(&self) -> &'static TableSchema {
        match self {
            Self::Cases => CaseRecord::schema(),
            Self::Mails => MailEntry::schema(),
            Self::Users => UserProfile::schema(),
            Self::Tracking => TrackingSession::schema(),
        }
    }

    /// URL/CLI slug.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Cases => "cases",
            Self::Mails => "mails",
            Self::Users => "users",
            Self::Tracking => "tracking",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cases => "Phone cases",
            Self::Mails => "Mailing list",
            Self::Users => "Users",
            Self::Tracking => "Visitor tracking",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error parsing an [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity '{0}' (expected cases, mails, users or tracking)")]
pub struct UnknownEntity(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cases" | "fundas" => Ok(Self::Cases),
            "mails" => Ok(Self::Mails),
            "users" => Ok(Self::Users),
            "tracking" | "users_tracking" => Ok(Self::Tracking),
            other => Err(UnknownEntity(other.to_string())),
        }
    }
}

/// Every table descriptor, in bootstrap order.
#[must_use]
pub fn all_tables() -> [&'static TableSchema; 4] {
    [&CASES_TABLE, &MAILS_TABLE, &USERS_TABLE, &TRACKING_TABLE]
}
