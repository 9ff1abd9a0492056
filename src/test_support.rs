use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};
use crate::services::reporting::calendar::GroupingDimension;
use crate::services::reporting::dataset::{DatasetRegistry, EntitySpec};
use crate::services::reporting::filter::FilterSpec;
use crate::services::reporting::reconcile::EntityPair;
use crate::services::reporting::store::{
    AggregateRow, Metric, MetricsStore, OutcomeCategory, OutcomeRecord,
};
use crate::state::AppState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn entity() -> EntitySpec {
    EntitySpec::new("test_db", "test_table").expect("entity")
}

pub fn test_config() -> ReportConfig {
    ReportConfig {
        database_url: "mysql://root@localhost:3306".to_string(),
        datasets: DatasetRegistry::new(
            EntitySpec::new("metrics_db", "diffen_job_metrics").expect("job metrics"),
            EntitySpec::new("extract_db", "extraction_info").expect("extraction info"),
        ),
        max_range_days: 366,
        cors_allow_origins: Vec::new(),
    }
}

pub fn test_state(store: Arc<InMemoryStore>) -> AppState {
    AppState {
        config: test_config(),
        store,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Series,
    Total,
    EntityPairs,
    Outcomes,
}

#[derive(Debug, Clone)]
pub struct FetchCall {
    pub kind: FetchKind,
    pub entity: EntitySpec,
    pub metric: Option<Metric>,
    pub filter: FilterSpec,
    pub dimension: Option<GroupingDimension>,
    pub category: Option<OutcomeCategory>,
}

/// Canned rows keyed by what a fetch asks for; records every call.
#[derive(Default)]
pub struct InMemoryStore {
    series: HashMap<(Metric, GroupingDimension), Vec<AggregateRow>>,
    totals: HashMap<Metric, Option<i64>>,
    pairs: Vec<EntityPair>,
    outcomes: HashMap<OutcomeCategory, Vec<OutcomeRecord>>,
    fail: bool,
    calls: Mutex<Vec<FetchCall>>,
}

impl InMemoryStore {
    pub fn with_series(
        mut self,
        metric: Metric,
        dimension: GroupingDimension,
        rows: Vec<AggregateRow>,
    ) -> Self {
        self.series.insert((metric, dimension), rows);
        self
    }

    pub fn with_total(mut self, metric: Metric, total: Option<i64>) -> Self {
        self.totals.insert(metric, total);
        self
    }

    pub fn with_pairs(mut self, pairs: Vec<EntityPair>) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn with_outcomes(mut self, category: OutcomeCategory, records: Vec<OutcomeRecord>) -> Self {
        self.outcomes.insert(category, records);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: FetchCall) -> ReportResult<()> {
        self.calls.lock().expect("calls lock").push(call);
        if self.fail {
            return Err(ReportError::UpstreamFetch("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn fetch_series(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
        dimension: GroupingDimension,
    ) -> ReportResult<Vec<AggregateRow>> {
        self.record(FetchCall {
            kind: FetchKind::Series,
            entity: entity.clone(),
            metric: Some(metric),
            filter: filter.clone(),
            dimension: Some(dimension),
            category: None,
        })?;
        Ok(self
            .series
            .get(&(metric, dimension))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_total(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
    ) -> ReportResult<Option<i64>> {
        self.record(FetchCall {
            kind: FetchKind::Total,
            entity: entity.clone(),
            metric: Some(metric),
            filter: filter.clone(),
            dimension: None,
            category: None,
        })?;
        Ok(self.totals.get(&metric).copied().flatten())
    }

    async fn fetch_entity_pairs(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
    ) -> ReportResult<Vec<EntityPair>> {
        self.record(FetchCall {
            kind: FetchKind::EntityPairs,
            entity: entity.clone(),
            metric: None,
            filter: filter.clone(),
            dimension: None,
            category: None,
        })?;
        Ok(self.pairs.clone())
    }

    async fn fetch_outcomes(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
        category: OutcomeCategory,
    ) -> ReportResult<Vec<OutcomeRecord>> {
        self.record(FetchCall {
            kind: FetchKind::Outcomes,
            entity: entity.clone(),
            metric: None,
            filter: filter.clone(),
            dimension: None,
            category: Some(category),
        })?;
        Ok(self.outcomes.get(&category).cloned().unwrap_or_default())
    }
}
