// Chart payload domain models
use serde::Serialize;

/// One raw temperature sample, time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// One channel's series, aligned to the payload's shared label axis.
///
/// `values` has exactly one slot per label; a `None` means the channel had no
/// sample at that timestamp (rendered as a gap, never interpolated).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub channel_id: String,
    pub name: String,
    pub unit: &'static str,
    pub values: Vec<Option<f64>>,
}

/// Chart-ready payload: a single time axis shared by every series so the
/// front end can align all channels on one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub title: String,
    /// Sorted union of all distinct sample timestamps, epoch milliseconds.
    pub labels: Vec<i64>,
    pub series: Vec<ChartSeries>,
}

impl ChartPayload {
    pub fn new(title: String, labels: Vec<i64>, series: Vec<ChartSeries>) -> Self {
        Self {
            title,
            labels,
            series,
        }
    }

    /// Align per-channel samples onto the sorted union of their timestamps.
    pub fn align(title: String, channels: Vec<(ChartSeriesMeta, Vec<TimeSeriesPoint>)>) -> Self {
        let mut labels: Vec<i64> = channels
            .iter()
            .flat_map(|(_, points)| points.iter().map(|p| p.time_ms))
            .collect();
        labels.sort_unstable();
        labels.dedup();

        let series = channels
            .into_iter()
            .map(|(meta, points)| {
                let by_time: std::collections::HashMap<i64, f64> =
                    points.into_iter().map(|p| (p.time_ms, p.value)).collect();
                ChartSeries {
                    channel_id: meta.channel_id,
                    name: meta.name,
                    unit: meta.unit,
                    values: labels.iter().map(|t| by_time.get(t).copied()).collect(),
                }
            })
            .collect();

        Self::new(title, labels, series)
    }
}

/// Identity of a series before its points are aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeriesMeta {
    pub channel_id: String,
    pub name: String,
    pub unit: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> ChartSeriesMeta {
        ChartSeriesMeta {
            channel_id: id.to_string(),
            name: id.to_uppercase(),
            unit: "°F",
        }
    }

    #[test]
    fn test_align_unions_timestamps() {
        let payload = ChartPayload::align(
            "t".to_string(),
            vec![
                (
                    meta("a"),
                    vec![TimeSeriesPoint::new(10, 1.0), TimeSeriesPoint::new(30, 3.0)],
                ),
                (meta("b"), vec![TimeSeriesPoint::new(20, 2.0)]),
            ],
        );

        assert_eq!(payload.labels, vec![10, 20, 30]);
        assert_eq!(payload.series[0].values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(payload.series[1].values, vec![None, Some(2.0), None]);
    }

    #[test]
    fn test_align_keeps_empty_channels() {
        let payload = ChartPayload::align(
            "t".to_string(),
            vec![
                (meta("a"), vec![TimeSeriesPoint::new(10, 1.0)]),
                (meta("b"), Vec::new()),
            ],
        );

        assert_eq!(payload.series.len(), 2);
        assert_eq!(payload.series[1].values, vec![None]);
    }

    #[test]
    fn test_align_with_no_samples_at_all() {
        let payload = ChartPayload::align("t".to_string(), vec![(meta("a"), Vec::new())]);
        assert!(payload.labels.is_empty());
        assert_eq!(payload.series[0].values.len(), 0);
    }
}
