//! Report assembly: plan buckets, issue the fixed set of fetches for an
//! endpoint, then shape rows with the merger, reconciler and composer.
//!
//! Fetches run one after another; the first failure aborts the report.

use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{self, BucketKey, BucketPlan};
use super::dataset::EntitySpec;
use super::filter::{FilterSpec, Granularity};
use super::merge::{merge, Series};
use super::percentages::{percentages, OutcomeBreakdown, OutcomePercentages};
use super::reconcile::{accounted, reconcile, EntityPair, EntityPairSet};
use super::store::{DatasetKind, Metric, MetricsStore, OutcomeCategory, OutcomeRecord};
use crate::error::ReportResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct OpenNonOpenPoint {
    #[serde(flatten)]
    pub bucket: BucketKey,
    pub open_count: i64,
    pub non_open_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DailyPercentages {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub shares: OutcomePercentages,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SummaryCounts {
    pub total_extracted: i64,
    pub total_inserted: i64,
    pub total_insert_open: i64,
    pub total_updated_open: i64,
    pub total_all_storage: i64,
    pub total_delete_non_open: i64,
    pub total_open: i64,
    pub total_non_open: i64,
    pub total_storage_duplicates: i64,
    pub total_duplicates: i64,
}

impl SummaryCounts {
    fn slot(&mut self, metric: Metric) -> &mut i64 {
        match metric {
            Metric::ExtractedRecords => &mut self.total_extracted,
            Metric::InsertedRecords => &mut self.total_inserted,
            Metric::InsertOpen => &mut self.total_insert_open,
            Metric::UpdateOpen => &mut self.total_updated_open,
            Metric::AllStorage => &mut self.total_all_storage,
            Metric::DeletesNonOpen => &mut self.total_delete_non_open,
            Metric::Open => &mut self.total_open,
            Metric::NonOpen => &mut self.total_non_open,
            Metric::StorageDuplicates => &mut self.total_storage_duplicates,
            Metric::DiffenDuplicates => &mut self.total_duplicates,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct TableList {
    pub count: usize,
    pub data: Vec<EntityPair>,
}

impl From<EntityPairSet> for TableList {
    fn from(set: EntityPairSet) -> Self {
        Self {
            count: set.len(),
            data: set.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct OutcomeList {
    pub total_records: usize,
    pub data: Vec<OutcomeRecord>,
}

impl From<Vec<OutcomeRecord>> for OutcomeList {
    fn from(data: Vec<OutcomeRecord>) -> Self {
        Self {
            total_records: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct TablesSummary {
    pub total_tables: TableList,
    pub tables_not_extracted: TableList,
    pub successful_extractions: OutcomeList,
    pub failed_extractions: OutcomeList,
}

async fn series_for_plan(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    metric: Metric,
    source: Option<&str>,
    plan: &BucketPlan,
) -> ReportResult<Series> {
    let filter = FilterSpec::new(source, plan.window);
    let rows = store
        .fetch_series(entity, metric, &filter, plan.dimension)
        .await?;
    Ok(merge(plan, &rows))
}

/// One metric over the canonical buckets of `granularity` around `anchor`.
pub async fn bucketed_series(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    metric: Metric,
    source: Option<&str>,
    granularity: Granularity,
    anchor: NaiveDate,
) -> ReportResult<Series> {
    let plan = calendar::buckets(granularity, anchor);
    series_for_plan(store, entity, metric, source, &plan).await
}

/// One metric per calendar day of the filter window.
pub async fn range_series(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    metric: Metric,
    filter: &FilterSpec,
) -> ReportResult<Series> {
    let plan = calendar::range_buckets(filter.window());
    series_for_plan(store, entity, metric, filter.source(), &plan).await
}

pub async fn open_non_open_series(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    source: Option<&str>,
    plan: &BucketPlan,
) -> ReportResult<Vec<OpenNonOpenPoint>> {
    let open = series_for_plan(store, entity, Metric::Open, source, plan).await?;
    let non_open = series_for_plan(store, entity, Metric::NonOpen, source, plan).await?;
    Ok(open
        .points()
        .iter()
        .zip(non_open.points())
        .map(|(open, non_open)| OpenNonOpenPoint {
            bucket: open.bucket,
            open_count: open.value,
            non_open_count: non_open.value,
        })
        .collect())
}

pub async fn outcome_breakdown(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    filter: &FilterSpec,
) -> ReportResult<OutcomeBreakdown> {
    let open = store.fetch_total(entity, Metric::Open, filter).await?;
    let non_open = store.fetch_total(entity, Metric::NonOpen, filter).await?;
    let duplicate = store
        .fetch_total(entity, Metric::StorageDuplicates, filter)
        .await?;
    Ok(OutcomeBreakdown::from_sums(
        open.unwrap_or(0),
        non_open.unwrap_or(0),
        duplicate.unwrap_or(0),
    ))
}

/// Share breakdown for the whole window `granularity` spans around `anchor`.
pub async fn breakdown_for_period(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    source: Option<&str>,
    granularity: Granularity,
    anchor: NaiveDate,
) -> ReportResult<OutcomePercentages> {
    let filter = FilterSpec::new(source, calendar::window_for(granularity, anchor));
    let breakdown = outcome_breakdown(store, entity, &filter).await?;
    Ok(percentages(breakdown))
}

/// Share breakdown for every day of the window; days without rows are all 0.
pub async fn daily_breakdowns(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    filter: &FilterSpec,
) -> ReportResult<Vec<DailyPercentages>> {
    let open = range_series(store, entity, Metric::Open, filter).await?;
    let non_open = range_series(store, entity, Metric::NonOpen, filter).await?;
    let duplicate = range_series(store, entity, Metric::StorageDuplicates, filter).await?;

    Ok(filter
        .window()
        .days()
        .zip(open.points())
        .zip(non_open.points())
        .zip(duplicate.points())
        .map(|(((date, open), non_open), duplicate)| DailyPercentages {
            date,
            shares: percentages(OutcomeBreakdown::from_sums(
                open.value,
                non_open.value,
                duplicate.value,
            )),
        })
        .collect())
}

pub async fn summary_counts(
    store: &dyn MetricsStore,
    job_metrics: &EntitySpec,
    extraction_info: &EntitySpec,
    filter: &FilterSpec,
) -> ReportResult<SummaryCounts> {
    let mut counts = SummaryCounts::default();
    for metric in Metric::ALL {
        let entity = match metric.dataset() {
            DatasetKind::JobMetrics => job_metrics,
            DatasetKind::ExtractionInfo => extraction_info,
        };
        let total = store.fetch_total(entity, metric, filter).await?;
        *counts.slot(metric) = total.unwrap_or(0);
    }
    Ok(counts)
}

pub async fn tables_summary(
    store: &dyn MetricsStore,
    entity: &EntitySpec,
    filter: &FilterSpec,
) -> ReportResult<TablesSummary> {
    let universe: EntityPairSet = store
        .fetch_entity_pairs(entity, filter)
        .await?
        .into_iter()
        .collect();
    let success = store
        .fetch_outcomes(entity, filter, OutcomeCategory::Success)
        .await?;
    let failure = store
        .fetch_outcomes(entity, filter, OutcomeCategory::Failure)
        .await?;

    let success_pairs: EntityPairSet = success.iter().map(OutcomeRecord::pair).collect();
    let failure_pairs: EntityPairSet = failure.iter().map(OutcomeRecord::pair).collect();
    let not_extracted = reconcile(&universe, &accounted(&success_pairs, &failure_pairs));
    tracing::debug!(
        universe = universe.len(),
        success = success_pairs.len(),
        failure = failure_pairs.len(),
        not_extracted = not_extracted.len(),
        "reconciled extraction outcomes"
    );

    Ok(TablesSummary {
        total_tables: universe.into(),
        tables_not_extracted: not_extracted.into(),
        successful_extractions: success.into(),
        failed_extractions: failure.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::services::reporting::calendar::GroupingDimension;
    use crate::services::reporting::filter::DateWindow;
    use crate::services::reporting::store::{AggregateRow, RawKey};
    use crate::test_support::{entity, InMemoryStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn outcome(source: &str, table: &str, status: &str) -> OutcomeRecord {
        OutcomeRecord {
            date: date(2024, 3, 15),
            time: "10:00:00".to_string(),
            source: source.to_string(),
            tablename: table.to_string(),
            status: status.to_string(),
            status_message: None,
        }
    }

    #[tokio::test]
    async fn bucketed_series_fetches_plan_window_and_fills_gaps() {
        let store = InMemoryStore::default().with_series(
            Metric::InsertedRecords,
            GroupingDimension::HourOfDay,
            vec![AggregateRow::new(RawKey::Integer(9), Some(42))],
        );
        let series = bucketed_series(
            &store,
            &entity(),
            Metric::InsertedRecords,
            Some("src1"),
            Granularity::Daily,
            date(2024, 3, 15),
        )
        .await
        .unwrap();

        assert_eq!(series.len(), 24);
        assert_eq!(series.value_at(BucketKey::Hour(9)), Some(42));

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filter.source(), Some("src1"));
        assert_eq!(
            calls[0].filter.window(),
            DateWindow::single(date(2024, 3, 15))
        );
    }

    #[tokio::test]
    async fn open_non_open_zips_two_series() {
        let store = InMemoryStore::default()
            .with_series(
                Metric::Open,
                GroupingDimension::MonthOfYear,
                vec![AggregateRow::new(RawKey::Integer(2), Some(5))],
            )
            .with_series(
                Metric::NonOpen,
                GroupingDimension::MonthOfYear,
                vec![AggregateRow::new(RawKey::Integer(2), Some(7))],
            );
        let plan = calendar::buckets(Granularity::Yearly, date(2024, 6, 1));
        let points = open_non_open_series(&store, &entity(), None, &plan)
            .await
            .unwrap();
        assert_eq!(points.len(), 12);
        assert_eq!(
            points[1],
            OpenNonOpenPoint {
                bucket: BucketKey::MonthOfYear(2),
                open_count: 5,
                non_open_count: 7
            }
        );
        assert_eq!(points[0].open_count, 0);
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn daily_breakdowns_cover_every_day() {
        let d1 = date(2024, 3, 1);
        let d3 = date(2024, 3, 3);
        let store = InMemoryStore::default()
            .with_series(
                Metric::Open,
                GroupingDimension::CalendarDate,
                vec![AggregateRow::new(RawKey::Date(d1), Some(10))],
            )
            .with_series(
                Metric::NonOpen,
                GroupingDimension::CalendarDate,
                vec![AggregateRow::new(RawKey::Date(d1), Some(20))],
            )
            .with_series(
                Metric::StorageDuplicates,
                GroupingDimension::CalendarDate,
                vec![AggregateRow::new(RawKey::Date(d3), Some(4))],
            );
        let filter = FilterSpec::new(None, DateWindow::new(d1, d3).unwrap());
        let days = daily_breakdowns(&store, &entity(), &filter).await.unwrap();

        assert_eq!(days.len(), 3);
        assert!((days[0].shares.open_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(days[1].shares, OutcomePercentages::default());
        assert_eq!(days[2].date, d3);
        assert_eq!(days[2].shares.duplicate_pct, 100.0);
    }

    #[tokio::test]
    async fn breakdown_for_week_uses_monday_window() {
        let store = InMemoryStore::default()
            .with_total(Metric::Open, Some(1))
            .with_total(Metric::NonOpen, None)
            .with_total(Metric::StorageDuplicates, Some(3));
        let shares = breakdown_for_period(
            &store,
            &entity(),
            None,
            Granularity::Weekly,
            date(2024, 3, 15),
        )
        .await
        .unwrap();
        assert_eq!(shares.open_pct, 25.0);
        assert_eq!(shares.non_open_pct, 0.0);

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls
            .iter()
            .all(|call| call.filter.window().start() == date(2024, 3, 11)
                && call.filter.window().end() == date(2024, 3, 17)));
    }

    #[tokio::test]
    async fn summary_counts_routes_metrics_to_their_tables() {
        let store = InMemoryStore::default()
            .with_total(Metric::InsertedRecords, Some(100))
            .with_total(Metric::AllStorage, Some(9));
        let job = EntitySpec::new("metrics", "job").unwrap();
        let info = EntitySpec::new("extract", "info").unwrap();
        let filter = FilterSpec::new(None, DateWindow::single(date(2024, 3, 15)));

        let counts = summary_counts(&store, &job, &info, &filter).await.unwrap();
        assert_eq!(counts.total_inserted, 100);
        assert_eq!(counts.total_all_storage, 9);
        assert_eq!(counts.total_extracted, 0);

        let calls = store.calls();
        assert_eq!(calls.len(), Metric::ALL.len());
        for call in calls {
            let metric = call.metric.unwrap();
            match metric {
                Metric::ExtractedRecords | Metric::InsertedRecords => {
                    assert_eq!(call.entity, info)
                }
                _ => assert_eq!(call.entity, job),
            }
        }
    }

    #[tokio::test]
    async fn tables_summary_reports_unaccounted_tables() {
        let store = InMemoryStore::default()
            .with_pairs(vec![
                EntityPair::new("src1", "t1"),
                EntityPair::new("src1", "t2"),
                EntityPair::new("src1", "t3"),
            ])
            .with_outcomes(
                OutcomeCategory::Success,
                vec![outcome("src1", "t1", "success")],
            )
            .with_outcomes(
                OutcomeCategory::Failure,
                vec![outcome("src1", "t3", "failed")],
            );
        let filter = FilterSpec::new(Some("src1"), DateWindow::single(date(2024, 3, 15)));
        let summary = tables_summary(&store, &entity(), &filter).await.unwrap();

        assert_eq!(summary.total_tables.count, 3);
        assert_eq!(
            summary.tables_not_extracted.data,
            vec![EntityPair::new("src1", "t2")]
        );
        assert_eq!(summary.successful_extractions.total_records, 1);
        assert_eq!(summary.failed_extractions.total_records, 1);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_report() {
        let store = InMemoryStore::default().failing();
        let filter = FilterSpec::new(None, DateWindow::single(date(2024, 3, 15)));
        let err = tables_summary(&store, &entity(), &filter)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::UpstreamFetch(_)));
        assert_eq!(store.calls().len(), 1);
    }
}
