use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

use super::calendar::GroupingDimension;
use super::dataset::EntitySpec;
use super::filter::{DateWindow, FilterSpec};
use super::reconcile::EntityPair;
use super::store::{
    AggregateRow, DatasetKind, Metric, MetricsStore, OutcomeCategory, OutcomeRecord, RawKey,
};
use crate::error::{map_db_error, ReportResult};

const STATUS_SUCCESS: &str = "success";

/// MySQL-backed store. Statement text is assembled only from static column
/// names and validated table identifiers; every request value is bound.
#[derive(Clone)]
pub struct MySqlMetricsStore {
    pool: MySqlPool,
}

impl MySqlMetricsStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn window_bounds(window: DateWindow) -> (NaiveDateTime, NaiveDateTime) {
    let start = window.start().and_time(NaiveTime::MIN);
    let end = window
        .end()
        .succ_opt()
        .unwrap_or_else(|| window.end())
        .and_time(NaiveTime::MIN);
    (start, end)
}

fn push_filter(qb: &mut QueryBuilder<'_, MySql>, timestamp_column: &str, filter: &FilterSpec) {
    let (start, end) = window_bounds(filter.window());
    qb.push(" WHERE `")
        .push(timestamp_column)
        .push("` >= ")
        .push_bind(start)
        .push(" AND `")
        .push(timestamp_column)
        .push("` < ")
        .push_bind(end);
    if let Some(source) = filter.source() {
        qb.push(" AND `source` = ").push_bind(source.to_string());
    }
}

fn bucket_expr(dimension: GroupingDimension, timestamp_column: &str) -> String {
    match dimension {
        GroupingDimension::HourOfDay => format!("CAST(HOUR(`{timestamp_column}`) AS SIGNED)"),
        GroupingDimension::CalendarDate => format!("DATE(`{timestamp_column}`)"),
        GroupingDimension::MonthOfYear => format!("CAST(MONTH(`{timestamp_column}`) AS SIGNED)"),
    }
}

fn decode_bucket(row: &MySqlRow, dimension: GroupingDimension) -> Result<Option<RawKey>, sqlx::Error> {
    Ok(match dimension {
        GroupingDimension::CalendarDate => row
            .try_get::<Option<NaiveDate>, _>("bucket")?
            .map(RawKey::Date),
        GroupingDimension::HourOfDay | GroupingDimension::MonthOfYear => row
            .try_get::<Option<i64>, _>("bucket")?
            .map(RawKey::Integer),
    })
}

fn decode_outcome(row: &MySqlRow, category: OutcomeCategory) -> Result<OutcomeRecord, sqlx::Error> {
    let status_message = match category {
        OutcomeCategory::Success => None,
        OutcomeCategory::Failure => row.try_get::<Option<String>, _>("status_message")?,
    };
    Ok(OutcomeRecord {
        date: row.try_get("extraction_date")?,
        time: row
            .try_get::<Option<String>, _>("latest_time")?
            .unwrap_or_default(),
        source: row.try_get("source")?,
        tablename: row.try_get("tablename")?,
        status: row.try_get("status")?,
        status_message,
    })
}

fn series_statement(
    entity: &EntitySpec,
    metric: Metric,
    filter: &FilterSpec,
    dimension: GroupingDimension,
) -> QueryBuilder<'static, MySql> {
    let ts = metric.dataset().timestamp_column();
    let mut qb = QueryBuilder::<MySql>::new("SELECT ");
    qb.push(bucket_expr(dimension, ts))
        .push(" AS bucket, CAST(SUM(`")
        .push(metric.column())
        .push("`) AS SIGNED) AS total FROM ")
        .push(entity.qualified());
    push_filter(&mut qb, ts, filter);
    qb.push(" GROUP BY bucket ORDER BY bucket");
    qb
}

fn total_statement(
    entity: &EntitySpec,
    metric: Metric,
    filter: &FilterSpec,
) -> QueryBuilder<'static, MySql> {
    let ts = metric.dataset().timestamp_column();
    let mut qb = QueryBuilder::<MySql>::new("SELECT CAST(SUM(`");
    qb.push(metric.column())
        .push("`) AS SIGNED) AS total FROM ")
        .push(entity.qualified());
    push_filter(&mut qb, ts, filter);
    qb
}

fn entity_pairs_statement(
    entity: &EntitySpec,
    filter: &FilterSpec,
) -> QueryBuilder<'static, MySql> {
    let ts = DatasetKind::ExtractionInfo.timestamp_column();
    let mut qb = QueryBuilder::<MySql>::new("SELECT DISTINCT `source`, `tablename` FROM ");
    qb.push(entity.qualified());
    push_filter(&mut qb, ts, filter);
    qb.push(" ORDER BY `source`, `tablename`");
    qb
}

fn outcomes_statement(
    entity: &EntitySpec,
    filter: &FilterSpec,
    category: OutcomeCategory,
) -> QueryBuilder<'static, MySql> {
    let ts = DatasetKind::ExtractionInfo.timestamp_column();
    let mut qb = QueryBuilder::<MySql>::new("SELECT DATE(`");
    qb.push(ts)
        .push("`) AS extraction_date, `source`, `tablename`, DATE_FORMAT(MAX(`")
        .push(ts)
        .push("`), '%H:%i:%s') AS latest_time, `status`");
    if category == OutcomeCategory::Failure {
        qb.push(", `status_message`");
    }
    qb.push(" FROM ").push(entity.qualified());
    push_filter(&mut qb, ts, filter);
    match category {
        OutcomeCategory::Success => {
            qb.push(" AND `status` = ").push_bind(STATUS_SUCCESS);
            qb.push(" GROUP BY extraction_date, `source`, `tablename`, `status`");
        }
        OutcomeCategory::Failure => {
            qb.push(" AND `status` <> ").push_bind(STATUS_SUCCESS);
            qb.push(" GROUP BY extraction_date, `source`, `tablename`, `status`, `status_message`");
        }
    }
    qb.push(" ORDER BY extraction_date, `source`, `tablename`");
    qb
}

#[async_trait]
impl MetricsStore for MySqlMetricsStore {
    async fn fetch_series(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
        dimension: GroupingDimension,
    ) -> ReportResult<Vec<AggregateRow>> {
        let mut qb = series_statement(entity, metric, filter, dimension);
        tracing::debug!(sql = qb.sql(), entity = %entity, ?metric, "fetch series");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(map_db_error)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(key) = decode_bucket(row, dimension).map_err(map_db_error)? else {
                continue;
            };
            let value: Option<i64> = row.try_get("total").map_err(map_db_error)?;
            out.push(AggregateRow::new(key, value));
        }
        Ok(out)
    }

    async fn fetch_total(
        &self,
        entity: &EntitySpec,
        metric: Metric,
        filter: &FilterSpec,
    ) -> ReportResult<Option<i64>> {
        let mut qb = total_statement(entity, metric, filter);
        tracing::debug!(sql = qb.sql(), entity = %entity, ?metric, "fetch total");

        let row = qb.build().fetch_one(&self.pool).await.map_err(map_db_error)?;
        row.try_get::<Option<i64>, _>("total").map_err(map_db_error)
    }

    async fn fetch_entity_pairs(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
    ) -> ReportResult<Vec<EntityPair>> {
        let mut qb = entity_pairs_statement(entity, filter);

        let rows = qb.build().fetch_all(&self.pool).await.map_err(map_db_error)?;
        rows.iter()
            .map(|row| {
                Ok(EntityPair::new(
                    row.try_get::<String, _>("source")?,
                    row.try_get::<String, _>("tablename")?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_db_error)
    }

    async fn fetch_outcomes(
        &self,
        entity: &EntitySpec,
        filter: &FilterSpec,
        category: OutcomeCategory,
    ) -> ReportResult<Vec<OutcomeRecord>> {
        let mut qb = outcomes_statement(entity, filter, category);
        tracing::debug!(sql = qb.sql(), entity = %entity, ?category, "fetch outcomes");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(map_db_error)?;
        rows.iter()
            .map(|row| decode_outcome(row, category))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_bounds_are_half_open_days() {
        let window = DateWindow::new(date(2024, 2, 28), date(2024, 2, 29)).unwrap();
        let (start, end) = window_bounds(window);
        assert_eq!(start, date(2024, 2, 28).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(end, date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn source_is_bound_not_interpolated() {
        let filter = FilterSpec::new(
            Some("x' OR '1'='1"),
            DateWindow::single(date(2024, 3, 15)),
        );
        let mut qb = QueryBuilder::<MySql>::new("SELECT 1 FROM `db`.`t`");
        push_filter(&mut qb, "extractedtime", &filter);
        let sql = qb.sql();
        assert!(!sql.contains("OR '1'='1"));
        assert_eq!(sql.matches('?').count(), 3);
        assert!(sql.contains("`source` = ?"));
    }

    #[test]
    fn wildcard_source_adds_no_predicate() {
        let filter = FilterSpec::new(Some("all"), DateWindow::single(date(2024, 3, 15)));
        let mut qb = QueryBuilder::<MySql>::new("SELECT 1 FROM `db`.`t`");
        push_filter(&mut qb, "EodMarker", &filter);
        assert!(!qb.sql().contains("source"));
        assert!(qb.sql().contains("`EodMarker` >= ?"));
    }

    #[test]
    fn bucket_expressions_cast_integers() {
        assert_eq!(
            bucket_expr(GroupingDimension::HourOfDay, "EodMarker"),
            "CAST(HOUR(`EodMarker`) AS SIGNED)"
        );
        assert_eq!(
            bucket_expr(GroupingDimension::CalendarDate, "extractedtime"),
            "DATE(`extractedtime`)"
        );
    }

    const HOSTILE_SOURCE: &str = "x' OR '1'='1";

    fn hostile_filter() -> FilterSpec {
        FilterSpec::new(Some(HOSTILE_SOURCE), DateWindow::single(date(2024, 3, 15)))
    }

    fn entity() -> EntitySpec {
        EntitySpec::new("extract_db", "extraction_info").unwrap()
    }

    fn assert_only_bound(sql: &str, placeholders: usize) {
        assert!(!sql.contains(HOSTILE_SOURCE), "{sql}");
        assert!(!sql.contains("2024-03"), "{sql}");
        assert!(!sql.contains("'success'"), "{sql}");
        assert_eq!(sql.matches('?').count(), placeholders, "{sql}");
    }

    #[test]
    fn series_statement_groups_by_bucket() {
        let qb = series_statement(
            &entity(),
            Metric::InsertedRecords,
            &hostile_filter(),
            GroupingDimension::CalendarDate,
        );
        let sql = qb.sql();
        assert_only_bound(sql, 3);
        assert!(sql.starts_with("SELECT DATE(`extractedtime`) AS bucket"));
        assert!(sql.contains("CAST(SUM(`insertedreccount`) AS SIGNED) AS total"));
        assert!(sql.contains("FROM `extract_db`.`extraction_info`"));
        assert!(sql.ends_with(" GROUP BY bucket ORDER BY bucket"));
    }

    #[test]
    fn total_statement_uses_metric_timestamp() {
        let qb = total_statement(&entity(), Metric::StorageDuplicates, &hostile_filter());
        let sql = qb.sql();
        assert_only_bound(sql, 3);
        assert!(sql.contains("SUM(`StorageDuplicates`)"));
        assert!(sql.contains("`EodMarker` >= ?"));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn entity_pairs_statement_is_distinct_and_bound() {
        let qb = entity_pairs_statement(&entity(), &hostile_filter());
        let sql = qb.sql();
        assert_only_bound(sql, 3);
        assert!(sql.starts_with("SELECT DISTINCT `source`, `tablename` FROM"));
    }

    #[test]
    fn outcome_statements_bind_status_and_group_per_category() {
        let success = outcomes_statement(&entity(), &hostile_filter(), OutcomeCategory::Success);
        let sql = success.sql();
        assert_only_bound(sql, 4);
        assert!(sql.contains("AND `status` = ?"));
        assert!(!sql.contains("status_message"));
        assert!(sql.contains("GROUP BY extraction_date, `source`, `tablename`, `status` ORDER BY"));

        let failure = outcomes_statement(&entity(), &hostile_filter(), OutcomeCategory::Failure);
        let sql = failure.sql();
        assert_only_bound(sql, 4);
        assert!(sql.contains("AND `status` <> ?"));
        assert!(sql.contains(", `status_message` FROM"));
        assert!(sql.contains(
            "GROUP BY extraction_date, `source`, `tablename`, `status`, `status_message`"
        ));
    }

    #[test]
    fn statements_without_source_bind_only_dates() {
        let filter = FilterSpec::new(None, DateWindow::single(date(2024, 3, 15)));
        let qb = outcomes_statement(&entity(), &filter, OutcomeCategory::Failure);
        assert_eq!(qb.sql().matches('?').count(), 3);
        let qb = total_statement(&entity(), Metric::Open, &filter);
        assert_eq!(qb.sql().matches('?').count(), 2);
    }
}
