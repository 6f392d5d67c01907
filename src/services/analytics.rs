//! Analytics summary for the admin dashboard
//!
//! Five GA4 Data API reports are requested concurrently for the configured
//! window and reshaped into one JSON document. Any failing report fails the
//! whole summary.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::services::google_auth::{ServiceAccountKey, TokenProvider};

/// Rows returned by the top pages report
pub const TOP_PAGES_LIMIT: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Analytics configuration not available")]
    NotConfigured,

    #[error("Failed to fetch analytics data")]
    Upstream(#[source] anyhow::Error),
}

// ============================================================================
// Report API types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Named {
    pub name: String,
}

impl Named {
    fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionOrder {
    pub dimension_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOrder {
    pub metric_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricOrder>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub desc: bool,
}

impl OrderBy {
    fn dimension(name: &str) -> Self {
        Self {
            dimension: Some(DimensionOrder {
                dimension_name: name.to_string(),
            }),
            metric: None,
            desc: false,
        }
    }

    fn metric_desc(name: &str) -> Self {
        Self {
            dimension: None,
            metric: Some(MetricOrder {
                metric_name: name.to_string(),
            }),
            desc: true,
        }
    }
}

/// Body of a `runReport` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub date_ranges: Vec<DateRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Named>,
    pub metrics: Vec<Named>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_bys: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl ReportRequest {
    fn new(range: &DateRange, dimension: Option<&str>, metrics: &[&str]) -> Self {
        Self {
            date_ranges: vec![range.clone()],
            dimensions: dimension.map(Named::new).into_iter().collect(),
            metrics: metrics.iter().map(|m| Named::new(m)).collect(),
            order_bys: Vec::new(),
            limit: None,
        }
    }

    fn order_by(mut self, order: OrderBy) -> Self {
        self.order_bys.push(order);
        self
    }

    fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

impl ReportRow {
    fn dimension(&self, index: usize) -> &str {
        self.dimension_values.get(index).map(|v| v.value.as_str()).unwrap_or("")
    }

    fn metric(&self, index: usize) -> &str {
        self.metric_values.get(index).map(|v| v.value.as_str()).unwrap_or("0")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

/// Runs reports against one analytics property
#[async_trait]
pub trait ReportClient: Send + Sync {
    async fn run_report(&self, request: &ReportRequest) -> Result<ReportResponse>;
}

/// GA4 Data API client authenticated with a service account
pub struct Ga4Client {
    http: reqwest::Client,
    report_url: String,
    tokens: TokenProvider,
}

impl Ga4Client {
    pub fn new(config: &AnalyticsConfig, http: reqwest::Client) -> Result<Self> {
        let property_id = config
            .property_id
            .as_deref()
            .context("analytics.property_id is not set")?;
        let key = ServiceAccountKey::from_config(config)?;
        let tokens = TokenProvider::new(key, http.clone())?;

        Ok(Self {
            http,
            report_url: format!(
                "{}/v1beta/properties/{}:runReport",
                config.api_base.trim_end_matches('/'),
                property_id
            ),
            tokens,
        })
    }
}

#[async_trait]
impl ReportClient for Ga4Client {
    async fn run_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(&self.report_url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .context("runReport request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("runReport returned {}: {}", status, body);
        }
        response.json().await.context("Invalid runReport response")
    }
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyViews {
    pub date: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyUsers {
    pub date: String,
    pub users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageViews {
    pub page: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceShare {
    pub device: String,
    pub users: i64,
    pub percentage: i64,
}

/// Shape returned by `GET /api/analytics`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub page_views: Vec<DailyViews>,
    pub users: Vec<DailyUsers>,
    pub top_pages: Vec<PageViews>,
    pub device_types: Vec<DeviceShare>,
    pub total_users: i64,
    pub total_sessions: i64,
    pub total_page_views: i64,
    pub avg_session_duration: String,
    pub bounce_rate: i64,
    pub new_users: i64,
}

pub struct AnalyticsService {
    client: Option<Arc<dyn ReportClient>>,
    lookback_days: i64,
}

impl AnalyticsService {
    pub fn new(client: Option<Arc<dyn ReportClient>>, lookback_days: i64) -> Self {
        Self { client, lookback_days }
    }

    /// Build from configuration; unusable credentials leave analytics disabled
    pub fn from_config(config: &AnalyticsConfig, http: reqwest::Client) -> Self {
        if !config.is_configured() {
            tracing::info!("analytics not configured");
            return Self::new(None, config.lookback_days);
        }
        match Ga4Client::new(config, http) {
            Ok(client) => Self::new(Some(Arc::new(client)), config.lookback_days),
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "analytics disabled");
                Self::new(None, config.lookback_days)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Run all reports for the window ending on `today`
    pub async fn summary(&self, today: NaiveDate) -> Result<AnalyticsSummary, AnalyticsError> {
        let client = self.client.as_ref().ok_or(AnalyticsError::NotConfigured)?;
        let [views, users, pages, devices, totals] = build_reports(today, self.lookback_days);

        let (views, users, pages, devices, totals) = tokio::try_join!(
            client.run_report(&views),
            client.run_report(&users),
            client.run_report(&pages),
            client.run_report(&devices),
            client.run_report(&totals),
        )
        .map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "analytics report failed");
            AnalyticsError::Upstream(e)
        })?;

        Ok(shape_summary(views, users, pages, devices, totals))
    }
}

/// The five report requests, in summary order
pub fn build_reports(today: NaiveDate, lookback_days: i64) -> [ReportRequest; 5] {
    let range = DateRange {
        start_date: (today - Duration::days(lookback_days)).format("%Y-%m-%d").to_string(),
        end_date: today.format("%Y-%m-%d").to_string(),
    };

    [
        ReportRequest::new(&range, Some("date"), &["screenPageViews"]).order_by(OrderBy::dimension("date")),
        ReportRequest::new(&range, Some("date"), &["activeUsers"]).order_by(OrderBy::dimension("date")),
        ReportRequest::new(&range, Some("pagePath"), &["screenPageViews"])
            .order_by(OrderBy::metric_desc("screenPageViews"))
            .limit(TOP_PAGES_LIMIT),
        ReportRequest::new(&range, Some("deviceCategory"), &["activeUsers"])
            .order_by(OrderBy::metric_desc("activeUsers")),
        ReportRequest::new(
            &range,
            None,
            &[
                "activeUsers",
                "newUsers",
                "sessions",
                "screenPageViews",
                "averageSessionDuration",
                "bounceRate",
            ],
        ),
    ]
}

fn shape_summary(
    views: ReportResponse,
    users: ReportResponse,
    pages: ReportResponse,
    devices: ReportResponse,
    totals: ReportResponse,
) -> AnalyticsSummary {
    let totals = totals.rows.into_iter().next().unwrap_or_default();

    AnalyticsSummary {
        page_views: views
            .rows
            .iter()
            .map(|r| DailyViews {
                date: r.dimension(0).to_string(),
                views: parse_int(r.metric(0)),
            })
            .collect(),
        users: users
            .rows
            .iter()
            .map(|r| DailyUsers {
                date: r.dimension(0).to_string(),
                users: parse_int(r.metric(0)),
            })
            .collect(),
        top_pages: pages
            .rows
            .iter()
            .map(|r| PageViews {
                page: r.dimension(0).to_string(),
                views: parse_int(r.metric(0)),
            })
            .collect(),
        device_types: device_shares(
            devices
                .rows
                .iter()
                .map(|r| (r.dimension(0).to_string(), parse_int(r.metric(0))))
                .collect(),
        ),
        total_users: parse_int(totals.metric(0)),
        new_users: parse_int(totals.metric(1)),
        total_sessions: parse_int(totals.metric(2)),
        total_page_views: parse_int(totals.metric(3)),
        avg_session_duration: format_duration(parse_int(totals.metric(4))),
        bounce_rate: percent(totals.metric(5)),
    }
}

/// Leading integer of a metric value ("12.7" → 12); unparsable values are 0
pub fn parse_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// A 0..1 rate as a rounded percentage
pub fn percent(value: &str) -> i64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v * 100.0).round() as i64)
        .unwrap_or(0)
}

/// Whole seconds as `"{m}m {s}s"`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Each device's share of all device users as whole percentages summing to 100
///
/// Floors every share, then hands the leftover points to the largest
/// remainders (earlier rows win ties). All zero when nobody was counted.
pub fn device_shares(devices: Vec<(String, i64)>) -> Vec<DeviceShare> {
    let total: i64 = devices.iter().map(|(_, users)| (*users).max(0)).sum();
    let mut shares: Vec<DeviceShare> = devices
        .into_iter()
        .map(|(device, users)| DeviceShare {
            percentage: if total > 0 { users.max(0) * 100 / total } else { 0 },
            device,
            users,
        })
        .collect();
    if total == 0 {
        return shares;
    }

    let mut by_remainder: Vec<(usize, i64)> = shares
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.users.max(0) * 100 % total))
        .collect();
    by_remainder.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let leftover = 100 - shares.iter().map(|s| s.percentage).sum::<i64>();
    for (index, _) in by_remainder.into_iter().take(leftover.max(0) as usize) {
        shares[index].percentage += 1;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(dimension: Option<&str>, metrics: &[&str]) -> ReportRow {
        ReportRow {
            dimension_values: dimension
                .map(|d| ReportValue { value: d.to_string() })
                .into_iter()
                .collect(),
            metric_values: metrics
                .iter()
                .map(|m| ReportValue { value: m.to_string() })
                .collect(),
        }
    }

    /// Answers each report based on its first dimension
    struct CannedReports {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ReportClient for CannedReports {
        async fn run_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let dimension = request.dimensions.first().map(|d| d.name.as_str()).unwrap_or("");
            let metric = request.metrics[0].name.as_str();
            if self.fail_on == Some(dimension) {
                anyhow::bail!("quota exceeded");
            }
            let rows = match (dimension, metric) {
                ("date", "screenPageViews") => vec![row(Some("20240301"), &["12"]), row(Some("20240302"), &["7"])],
                ("date", _) => vec![row(Some("20240301"), &["5"])],
                ("pagePath", _) => vec![row(Some("/"), &["40"]), row(Some("/community"), &["9"])],
                ("deviceCategory", _) => vec![
                    row(Some("desktop"), &["2"]),
                    row(Some("mobile"), &["1"]),
                ],
                _ => vec![row(None, &["30", "21", "44", "120", "125.6", "0.4567"])],
            };
            Ok(ReportResponse { rows })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[tokio::test]
    async fn test_summary_shapes_reports() {
        let client = Arc::new(CannedReports {
            calls: AtomicUsize::new(0),
            fail_on: None,
        });
        let service = AnalyticsService::new(Some(client.clone()), 30);

        let summary = service.summary(today()).await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
        assert_eq!(summary.page_views[0], DailyViews { date: "20240301".to_string(), views: 12 });
        assert_eq!(summary.users.len(), 1);
        assert_eq!(summary.top_pages[1].page, "/community");
        assert_eq!(
            summary.device_types,
            vec![
                DeviceShare { device: "desktop".to_string(), users: 2, percentage: 67 },
                DeviceShare { device: "mobile".to_string(), users: 1, percentage: 33 },
            ]
        );
        assert_eq!(summary.total_users, 30);
        assert_eq!(summary.new_users, 21);
        assert_eq!(summary.total_sessions, 44);
        assert_eq!(summary.total_page_views, 120);
        assert_eq!(summary.avg_session_duration, "2m 5s");
        assert_eq!(summary.bounce_rate, 46);

        let json = serde_json::to_value(&summary).unwrap();
        for key in [
            "pageViews",
            "users",
            "topPages",
            "deviceTypes",
            "totalUsers",
            "totalSessions",
            "totalPageViews",
            "avgSessionDuration",
            "bounceRate",
            "newUsers",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_one_failing_report_fails_summary() {
        let service = AnalyticsService::new(
            Some(Arc::new(CannedReports {
                calls: AtomicUsize::new(0),
                fail_on: Some("deviceCategory"),
            })),
            30,
        );
        let err = service.summary(today()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch analytics data");
    }

    #[tokio::test]
    async fn test_not_configured() {
        let service = AnalyticsService::new(None, 30);
        assert!(!service.is_enabled());
        let err = service.summary(today()).await.unwrap_err();
        assert_eq!(err.to_string(), "Analytics configuration not available");
    }

    #[test]
    fn test_build_reports() {
        let reports = build_reports(today(), 30);
        assert_eq!(reports[0].date_ranges[0].start_date, "2024-03-01");
        assert_eq!(reports[0].date_ranges[0].end_date, "2024-03-31");
        assert_eq!(reports[2].limit, Some(10));
        assert!(reports[4].dimensions.is_empty());
        assert_eq!(reports[4].metrics.len(), 6);

        let json = serde_json::to_value(&reports[2]).unwrap();
        assert_eq!(
            json["orderBys"][0],
            serde_json::json!({"metric": {"metricName": "screenPageViews"}, "desc": true})
        );
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["orderBys"][0], serde_json::json!({"dimension": {"dimensionName": "date"}}));
        assert!(json.get("limit").is_none());
    }

    #[test]
    fn test_parse_int_like_javascript() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("125.9"), 125);
        assert_eq!(parse_int("  7abc"), 7);
        assert_eq!(parse_int("-3"), -3);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn test_format_duration_and_percent() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3725), "62m 5s");
        assert_eq!(percent("0.5234"), 52);
        assert_eq!(percent("not a number"), 0);
    }

    #[test]
    fn test_device_shares_zero_total() {
        let shares = device_shares(vec![("desktop".to_string(), 0), ("mobile".to_string(), 0)]);
        assert!(shares.iter().all(|s| s.percentage == 0));
        assert!(device_shares(vec![]).is_empty());
    }

    #[test]
    fn test_device_shares_four_categories_sum_to_hundred() {
        let shares = device_shares(vec![
            ("desktop".to_string(), 5),
            ("mobile".to_string(), 1),
            ("tablet".to_string(), 1),
            ("smart tv".to_string(), 1),
        ]);
        let percentages: Vec<i64> = shares.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![63, 13, 12, 12]);
        assert_eq!(percentages.iter().sum::<i64>(), 100);
    }

    proptest! {
        /// Device shares always sum to exactly 100 when anyone was counted
        #[test]
        fn property_device_shares_sum_to_hundred(users in proptest::collection::vec(0i64..100_000, 1..=6)) {
            let devices: Vec<(String, i64)> = users
                .iter()
                .enumerate()
                .map(|(i, u)| (format!("device{}", i), *u))
                .collect();
            let total: i64 = users.iter().sum();
            let shares = device_shares(devices);
            let sum: i64 = shares.iter().map(|s| s.percentage).sum();

            if total > 0 {
                prop_assert_eq!(sum, 100);
            } else {
                prop_assert!(shares.iter().all(|s| s.percentage == 0));
            }
        }
    }
}
