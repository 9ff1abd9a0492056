use serde::Serialize;

/// Open, non-open and duplicate totals for one period. All components are >= 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeBreakdown {
    pub open: u64,
    pub non_open: u64,
    pub duplicate: u64,
}

impl OutcomeBreakdown {
    pub fn new(open: u64, non_open: u64, duplicate: u64) -> Self {
        Self {
            open,
            non_open,
            duplicate,
        }
    }

    /// Negative sums can only come from bad source rows; they are clamped to 0.
    pub fn from_sums(open: i64, non_open: i64, duplicate: i64) -> Self {
        if open < 0 || non_open < 0 || duplicate < 0 {
            tracing::warn!(open, non_open, duplicate, "negative outcome sums clamped to 0");
        }
        Self::new(clamp(open), clamp(non_open), clamp(duplicate))
    }

    /// Widened so three `i64`-sized sums cannot overflow.
    pub fn total(&self) -> u128 {
        u128::from(self.open) + u128::from(self.non_open) + u128::from(self.duplicate)
    }
}

fn clamp(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct OutcomePercentages {
    #[serde(rename = "Open")]
    pub open_pct: f64,
    #[serde(rename = "Non Open")]
    pub non_open_pct: f64,
    #[serde(rename = "Duplicates")]
    pub duplicate_pct: f64,
}

pub fn percentages(breakdown: OutcomeBreakdown) -> OutcomePercentages {
    let total = breakdown.total();
    if total == 0 {
        return OutcomePercentages::default();
    }
    let share = |component: u64| 100.0 * component as f64 / total as f64;
    OutcomePercentages {
        open_pct: share(breakdown.open),
        non_open_pct: share(breakdown.non_open),
        duplicate_pct: share(breakdown.duplicate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(pct: OutcomePercentages) -> f64 {
        pct.open_pct + pct.non_open_pct + pct.duplicate_pct
    }

    #[test]
    fn zero_total_is_all_zero() {
        assert_eq!(
            percentages(OutcomeBreakdown::default()),
            OutcomePercentages::default()
        );
    }

    #[test]
    fn thirds_split() {
        let pct = percentages(OutcomeBreakdown::new(10, 20, 0));
        assert!((pct.open_pct - 100.0 / 3.0).abs() < 1e-9);
        assert!((pct.non_open_pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(pct.duplicate_pct, 0.0);
    }

    #[test]
    fn shares_sum_to_hundred() {
        for (a, b, c) in [(1, 1, 1), (7, 0, 0), (3, 11, 97), (u32::MAX as u64, 1, 5)] {
            let pct = percentages(OutcomeBreakdown::new(a, b, c));
            assert!((sum(pct) - 100.0).abs() < 1e-6, "{a} {b} {c}");
        }
    }

    #[test]
    fn saturated_sums_still_split_evenly() {
        let breakdown = OutcomeBreakdown::from_sums(i64::MAX, i64::MAX, i64::MAX);
        assert_eq!(breakdown.total(), 3 * i64::MAX as u128);
        let pct = percentages(breakdown);
        assert!((pct.open_pct - 100.0 / 3.0).abs() < 1e-9);
        assert!((sum(pct) - 100.0).abs() < 1e-6);

        let pct = percentages(OutcomeBreakdown::new(u64::MAX, u64::MAX, 0));
        assert_eq!(pct.open_pct, 50.0);
        assert_eq!(pct.duplicate_pct, 0.0);
    }

    #[test]
    fn negative_sums_clamp() {
        let breakdown = OutcomeBreakdown::from_sums(-5, 10, 0);
        assert_eq!(breakdown, OutcomeBreakdown::new(0, 10, 0));
        assert_eq!(percentages(breakdown).non_open_pct, 100.0);
    }

    #[test]
    fn serializes_with_display_labels() {
        let json = serde_json::to_value(percentages(OutcomeBreakdown::new(1, 1, 2))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Open": 25.0, "Non Open": 25.0, "Duplicates": 50.0})
        );
    }
}
