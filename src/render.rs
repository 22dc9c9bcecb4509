use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::models::{DataRecord, DateRange, FetchParam};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const X_KEY: &str = "date";
pub const X_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TIME_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"T(\d{2}:\d{2}:\d{2})(?:\.\d+)?(?:[+-]\d{2}:\d{2}|Z)$").expect("valid timestamp regex")
});

/// `2024-01-02T03:04:05+09:00` becomes `2024-01-02 03:04:05`; the offset is dropped.
pub fn display_date(updated_at: &str) -> String {
    TIME_SUFFIX.replace(updated_at, " $1").into_owned()
}

pub type ChartRow = Map<String, Value>;

pub fn chart_row(record: &DataRecord) -> Result<ChartRow, ApiError> {
    let mut row = match serde_json::from_str::<Value>(&record.payload)? {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    row.insert(X_KEY.to_string(), Value::String(display_date(&record.updated_at)));
    Ok(row)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointDetail {
    pub raw: DataRecord,
    pub parsed: ChartRow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chart {
    pub x: &'static str,
    pub x_format: &'static str,
    pub series: Vec<String>,
    pub rows: Vec<ChartRow>,
    #[serde(skip)]
    records: Vec<DataRecord>,
}

impl Chart {
    pub fn from_records(records: Vec<DataRecord>) -> Result<Self, ApiError> {
        let rows = records.iter().map(chart_row).collect::<Result<Vec<_>, _>>()?;
        let series = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|key| key.as_str() != X_KEY)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            x: X_KEY,
            x_format: X_FORMAT,
            series,
            rows,
            records,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn point(&self, index: usize) -> Option<PointDetail> {
        Some(PointDetail {
            raw: self.records.get(index)?.clone(),
            parsed: self.rows.get(index)?.clone(),
        })
    }

    pub fn date_range(&self) -> Option<DateRange> {
        let mut days = self
            .rows
            .iter()
            .filter_map(|row| row.get(X_KEY)?.as_str())
            .filter_map(|date| NaiveDateTime::parse_from_str(date, X_FORMAT).ok())
            .map(|dt| dt.date());
        let first = days.next()?;
        let (start, end) = days.fold((first, first), |(lo, hi), day| (lo.min(day), hi.max(day)));

        Some(DateRange {
            start_at: start.to_string(),
            end_at: end.to_string(),
        })
    }
}

pub async fn fetch_chart(api: &ApiClient, params: &FetchParam) -> Result<Chart, ApiError> {
    let records = api.fetch_data(params).await?;
    Chart::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(updated_at: &str, payload: &str) -> DataRecord {
        DataRecord {
            updated_at: updated_at.to_string(),
            remote_addr: "10.0.0.1".to_string(),
            hostname: "sensor-1".to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn timestamp_offset_is_stripped() {
        assert_eq!(display_date("2024-01-02T03:04:05+09:00"), "2024-01-02 03:04:05");
        assert_eq!(display_date("2024-01-02T03:04:05-05:00"), "2024-01-02 03:04:05");
        assert_eq!(display_date("2024-01-02T03:04:05.123456Z"), "2024-01-02 03:04:05");
    }

    #[test]
    fn malformed_timestamp_passes_through() {
        for raw in ["yesterday", "2024-01-02 03:04:05", "2024-01-02T03:04+09:00", ""] {
            assert_eq!(display_date(raw), raw);
        }
    }

    #[test]
    fn row_merges_payload_and_date() {
        let row = chart_row(&record("2024-01-02T03:04:05+09:00", r#"{"temp": 21.5, "hum": 40}"#)).unwrap();
        assert_eq!(row["date"], "2024-01-02 03:04:05");
        assert_eq!(row["temp"], 21.5);
        assert_eq!(row["hum"], 40);
    }

    #[test]
    fn scalar_payload_becomes_value_series() {
        let row = chart_row(&record("2024-01-02T03:04:05+09:00", "12")).unwrap();
        assert_eq!(row["value"], 12);
    }

    #[test]
    fn broken_payload_is_a_decode_error() {
        let err = chart_row(&record("2024-01-02T03:04:05+09:00", "{not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn chart_collects_series_and_points() {
        let chart = Chart::from_records(vec![
            record("2024-01-03T00:00:00+09:00", r#"{"b": 1}"#),
            record("2024-01-01T12:00:00+09:00", r#"{"a": 2, "b": 3}"#),
        ])
        .unwrap();

        assert_eq!(chart.series, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(chart.len(), 2);

        let detail = chart.point(1).unwrap();
        assert_eq!(detail.raw.payload, r#"{"a": 2, "b": 3}"#);
        assert_eq!(detail.parsed["a"], 2);
        assert!(chart.point(2).is_none());

        let range = chart.date_range().unwrap();
        assert_eq!(range.start_at, "2024-01-01");
        assert_eq!(range.end_at, "2024-01-03");
    }

    #[test]
    fn empty_chart_has_no_range() {
        let chart = Chart::from_records(Vec::new()).unwrap();
        assert!(chart.is_empty());
        assert!(chart.date_range().is_none());
    }
}
