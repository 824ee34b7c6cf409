//! Types for the product catalog.

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A half-open `[start, end)` interval of UTC instants.
///
/// Only `DateTime<Utc>` values can be stored, so a window handed to a
/// catalog is always timezone-aware. `start < end` is enforced on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Errors raised while building a time window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window start {start} is not before end {end}")]
    Empty {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("window length must be at least one hour")]
    ZeroLength,

    #[error("cannot compute day boundary for {0}")]
    OutOfRange(DateTime<Utc>),
}

impl TimeWindow {
    /// Creates a window, rejecting empty or inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// The nominal window for a run started at `now`.
    ///
    /// Starts at UTC midnight `offset_days` days before `now` and lasts
    /// `length_hours`. With the defaults (1 day, 24 hours) this is the whole
    /// of yesterday.
    pub fn for_day(
        now: DateTime<Utc>,
        offset_days: u32,
        length_hours: u32,
    ) -> Result<Self, WindowError> {
        if length_hours == 0 {
            return Err(WindowError::ZeroLength);
        }
        let midnight = now
            .duration_trunc(TimeDelta::days(1))
            .map_err(|_| WindowError::OutOfRange(now))?;
        let start = midnight
            .checked_sub_signed(TimeDelta::days(i64::from(offset_days)))
            .ok_or(WindowError::OutOfRange(now))?;
        let end = start
            .checked_add_signed(TimeDelta::hours(i64::from(length_hours)))
            .ok_or(WindowError::OutOfRange(now))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Returns the same window moved `hours` earlier.
    pub fn shifted_back(&self, hours: u32) -> Self {
        let shift = TimeDelta::hours(i64::from(hours));
        Self {
            start: self.start - shift,
            end: self.end - shift,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Checks ordering and coordinate ranges.
    pub fn validate(&self) -> Result<(), String> {
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        if !lon_ok(self.min_lon) || !lon_ok(self.max_lon) {
            return Err("longitude must be within [-180, 180]".to_string());
        }
        if !lat_ok(self.min_lat) || !lat_ok(self.max_lat) {
            return Err("latitude must be within [-90, 90]".to_string());
        }
        if self.min_lon >= self.max_lon {
            return Err("min_lon must be less than max_lon".to_string());
        }
        if self.min_lat >= self.max_lat {
            return Err("min_lat must be less than max_lat".to_string());
        }
        Ok(())
    }

    /// `min_lon,min_lat,max_lon,max_lat`, the OpenSearch `bbox` format.
    pub fn to_query_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// A product listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Catalog identifier, opaque to the pipeline.
    pub id: String,
    /// Acquisition (sensing start) time. Frames are ordered by this.
    pub sensing_start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensing_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<BoundingBox>,
    /// Archive size as advertised by the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl ProductRef {
    pub fn new(id: impl Into<String>, sensing_start: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            sensing_start,
            sensing_end: None,
            footprint: None,
            size_bytes: None,
        }
    }
}

/// Sorts products by acquisition time, keeping catalog order for ties.
pub fn sort_by_acquisition(products: &mut [ProductRef]) {
    products.sort_by_key(|p| p.sensing_start);
}

/// One catalog query issued by the fallback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchAttempt {
    pub window: TimeWindow,
    /// 0 for the nominal window, `k` for a window shifted `k` hours back.
    pub attempt_index: u32,
}

/// Result of a fallback search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Products sorted by acquisition time; empty when every attempt missed.
    pub products: Vec<ProductRef>,
    /// Number of catalog calls made.
    pub attempts_used: u32,
    /// Window of the attempt that produced results.
    pub matched_window: Option<TimeWindow>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog rejected credentials: {0}")]
    Auth(String),

    #[error("Catalog connection failed: {0}")]
    Transport(String),

    #[error("Catalog request timeout")]
    Timeout,

    #[error("Catalog API error: {0}")]
    Api(String),
}

impl CatalogError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// A remote catalog of satellite products.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Lists products sensed inside `window` and intersecting `region`.
    ///
    /// An empty list is a valid answer, not an error.
    async fn search(
        &self,
        window: &TimeWindow,
        region: &BoundingBox,
    ) -> Result<Vec<ProductRef>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_window_rejects_inverted_interval() {
        let start = utc(2024, 3, 1, 0, 0);
        assert!(TimeWindow::new(start, start).is_err());
        assert!(TimeWindow::new(start, start - TimeDelta::hours(1)).is_err());
    }

    #[test]
    fn test_window_for_day_is_yesterday_by_default() {
        let now = utc(2024, 3, 2, 7, 45);
        let window = TimeWindow::for_day(now, 1, 24).unwrap();
        assert_eq!(window.start(), utc(2024, 3, 1, 0, 0));
        assert_eq!(window.end(), utc(2024, 3, 2, 0, 0));
        assert_eq!(window.duration(), TimeDelta::hours(24));
    }

    #[test]
    fn test_window_for_day_crosses_month_boundary() {
        let now = utc(2024, 3, 1, 0, 30);
        let window = TimeWindow::for_day(now, 1, 24).unwrap();
        assert_eq!(window.start(), utc(2024, 2, 29, 0, 0));
    }

    #[test]
    fn test_window_for_day_zero_length_fails() {
        let now = utc(2024, 3, 2, 7, 45);
        assert_eq!(
            TimeWindow::for_day(now, 1, 0),
            Err(WindowError::ZeroLength)
        );
    }

    #[test]
    fn test_shifted_back_moves_both_ends() {
        let window = TimeWindow::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 2, 0, 0)).unwrap();
        let shifted = window.shifted_back(2);
        assert_eq!(shifted.start(), utc(2024, 2, 29, 22, 0));
        assert_eq!(shifted.end(), utc(2024, 3, 1, 22, 0));
        assert_eq!(shifted.duration(), window.duration());
    }

    #[test]
    fn test_window_display() {
        let window = TimeWindow::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 2, 0, 0)).unwrap();
        assert_eq!(
            window.to_string(),
            "[2024-03-01T00:00:00Z, 2024-03-02T00:00:00Z)"
        );
    }

    #[test]
    fn test_bbox_query_param() {
        let bbox = BoundingBox::new(-25.0, 33.0, 45.0, 72.0);
        assert_eq!(bbox.to_query_param(), "-25,33,45,72");
        assert!(bbox.validate().is_ok());
    }

    #[test]
    fn test_bbox_validation() {
        assert!(BoundingBox::new(10.0, 33.0, -10.0, 72.0).validate().is_err());
        assert!(BoundingBox::new(-25.0, 50.0, 45.0, 40.0).validate().is_err());
        assert!(BoundingBox::new(-200.0, 33.0, 45.0, 72.0).validate().is_err());
        assert!(BoundingBox::new(-25.0, 33.0, 45.0, 95.0).validate().is_err());
    }

    #[test]
    fn test_sort_by_acquisition_is_stable() {
        let t1 = utc(2024, 3, 1, 0, 0);
        let t2 = utc(2024, 3, 1, 0, 15);
        let mut products = vec![
            ProductRef::new("late", t2),
            ProductRef::new("early-a", t1),
            ProductRef::new("early-b", t1),
        ];
        sort_by_acquisition(&mut products);
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["early-a", "early-b", "late"]);
    }

    #[test]
    fn test_product_ref_serialization_skips_empty_fields() {
        let product = ProductRef::new("MSG4-SEVI", utc(2024, 3, 1, 0, 12));
        let json = serde_json::to_string(&product).unwrap();
        assert!(!json.contains("footprint"));
        let parsed: ProductRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, product);
    }
}
