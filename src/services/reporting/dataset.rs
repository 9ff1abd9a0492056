use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use super::store::DatasetKind;
use crate::error::ReportError;

/// Logical datasets a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    /// `db1`: per-source end-of-day job metrics (open/non-open/storage counters).
    JobMetrics,
    /// `db2`: per-table extraction outcomes and record counts.
    ExtractionInfo,
    /// `db1_db2`: both of the above.
    Combined,
}

impl RoutingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingKey::JobMetrics => "db1",
            RoutingKey::ExtractionInfo => "db2",
            RoutingKey::Combined => "db1_db2",
        }
    }
}

impl FromStr for RoutingKey {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "db1" => Ok(RoutingKey::JobMetrics),
            "db2" => Ok(RoutingKey::ExtractionInfo),
            "db1_db2" => Ok(RoutingKey::Combined),
            other => Err(ReportError::UnknownRoutingKey(other.to_string())),
        }
    }
}

/// A `database.table` pair with identifiers already checked for safe quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntitySpec {
    database: String,
    table: String,
}

impl EntitySpec {
    pub fn new(database: &str, table: &str) -> Result<Self> {
        Ok(Self {
            database: checked_identifier(database, "database")?,
            table: checked_identifier(table, "table")?,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted `db`.`table` for statement text.
    pub fn qualified(&self) -> String {
        format!("`{}`.`{}`", self.database, self.table)
    }
}

impl fmt::Display for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

fn checked_identifier(raw: &str, label: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("{label} identifier must not be empty");
    }
    if trimmed.len() > 64 {
        bail!("{label} identifier '{trimmed}' exceeds 64 characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        bail!("{label} identifier '{trimmed}' may only contain [A-Za-z0-9_$]");
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDataset {
    JobMetrics(EntitySpec),
    ExtractionInfo(EntitySpec),
    Combined {
        job_metrics: EntitySpec,
        extraction_info: EntitySpec,
    },
}

impl ResolvedDataset {
    /// Table holding `kind` rows, if this dataset covers it.
    pub fn entity(&self, kind: DatasetKind) -> Option<&EntitySpec> {
        match (self, kind) {
            (ResolvedDataset::JobMetrics(entity), DatasetKind::JobMetrics)
            | (ResolvedDataset::ExtractionInfo(entity), DatasetKind::ExtractionInfo) => Some(entity),
            (ResolvedDataset::Combined { job_metrics, .. }, DatasetKind::JobMetrics) => {
                Some(job_metrics)
            }
            (ResolvedDataset::Combined { extraction_info, .. }, DatasetKind::ExtractionInfo) => {
                Some(extraction_info)
            }
            _ => None,
        }
    }
}

/// Immutable routing-key map, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRegistry {
    job_metrics: EntitySpec,
    extraction_info: EntitySpec,
}

impl DatasetRegistry {
    pub fn new(job_metrics: EntitySpec, extraction_info: EntitySpec) -> Self {
        Self {
            job_metrics,
            extraction_info,
        }
    }

    pub fn job_metrics(&self) -> &EntitySpec {
        &self.job_metrics
    }

    pub fn extraction_info(&self) -> &EntitySpec {
        &self.extraction_info
    }

    pub fn resolve(&self, key: RoutingKey) -> ResolvedDataset {
        match key {
            RoutingKey::JobMetrics => ResolvedDataset::JobMetrics(self.job_metrics.clone()),
            RoutingKey::ExtractionInfo => {
                ResolvedDataset::ExtractionInfo(self.extraction_info.clone())
            }
            RoutingKey::Combined => ResolvedDataset::Combined {
                job_metrics: self.job_metrics.clone(),
                extraction_info: self.extraction_info.clone(),
            },
        }
    }

    pub fn resolve_str(&self, raw: &str) -> Result<ResolvedDataset, ReportError> {
        Ok(self.resolve(raw.parse()?))
    }
}
