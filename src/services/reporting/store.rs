//! The aggregate fetch boundary.
//!
//! Callers describe *what* to aggregate with closed enums and a validated
//! [`FilterSpec`]; implementations own statement text and parameter binding.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::GroupingDimension;
use super::dataset::EntitySpec;
use super::filter::FilterSpec;
use super::reconcile::EntityPair;
use crate::error::ReportResult;

/// Which table family a metric lives in. Decides the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    JobMetrics,
    ExtractionInfo,
}

impl DatasetKind {
    pub fn timestamp_column(self) -> &'static str {
        match self {
            DatasetKind::JobMetrics => "EodMarker",
            DatasetKind::ExtractionInfo => "extractedtime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    ExtractedRecords,
    InsertedRecords,
    InsertOpen,
    UpdateOpen,
    AllStorage,
    DeletesNonOpen,
    Open,
    NonOpen,
    StorageDuplicates,
    DiffenDuplicates,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::ExtractedRecords,
        Metric::InsertedRecords,
        Metric::InsertOpen,
        Metric::UpdateOpen,
        Metric::AllStorage,
        Metric::DeletesNonOpen,
        Metric::Open,
        Metric::NonOpen,
        Metric::StorageDuplicates,
        Metric::DiffenDuplicates,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::ExtractedRecords => "extractedreccount",
            Metric::InsertedRecords => "insertedreccount",
            Metric::InsertOpen => "InsertOpen",
            Metric::UpdateOpen => "UpdateOpen",
            Metric::AllStorage => "AllStorage",
            Metric::DeletesNonOpen => "DeletesNonOpen",
            Metric::Open => "Open",
            Metric::NonOpen => "NonOpen",
            Metric::StorageDuplicates => "StorageDuplicates",
            Metric::DiffenDuplicates => "DiffenDuplicates",
        }
    }

    pub fn dataset(self) -> DatasetKind {
        match self {
            Metric::ExtractedRecords | Metric::InsertedRecords => DatasetKind::ExtractionInfo,
            _ => DatasetKind::JobMetrics,
        }
    }
}

/// Grouping value exactly as the store produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    Integer(i64),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub key: RawKey,
    pub value: Option<i64>,
}

impl AggregateRow {
    pub fn new(key: RawKey, value: Option<i64>) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeCategory {
    Success,
    Failure,
}

/// One extraction outcome group: latest time of day a table reported a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct OutcomeRecord {
    pub date: NaiveDate,
    pub time: String,
    pub source: String,
    pub tablename: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl OutcomeRecord {
    pub fn pair(&self) -> EntityPair {
        EntityPair::new(&self.source, &self.tablename)
    }
}

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// `SUM(metric)` grouped by `dimension` over the filter window, ascending by key.
    async fn fetch_series(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
        dimension: GroupingDimension,
    ) -> ReportResult<Vec<AggregateRow>>;

    /// Ungrouped `SUM(metric)`; `None` when no rows matched.
    async fn fetch_total(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
    ) -> ReportResult<Option<i64>>;

    /// Distinct (source, tablename) pairs with any outcome row in the window.
    async fn fetch_entity_pairs(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
    ) -> ReportResult<Vec<EntityPair>>;

    async fn fetch_outcomes(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
        category: OutcomeCategory,
    ) -> ReportResult<Vec<OutcomeRecord>>;
}
