use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone};
use chrono_tz::{America::New_York, UTC};
use horizon::generator::value;
use horizon::query::{bucket_label, AggregationEngine, AggregationRequest, QueryWindow};
use horizon::range::{compute_range_from_custom, compute_range_from_preset, NavigationState, PresetKey};
use horizon::server::{router, ServerState};
use horizon::{HorizonConfig, Resolution, Timestamp};
use serde_json::Value;
use std::collections::BTreeSet;
use tower::ServiceExt;

fn utc(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
    UTC.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[test]
fn test_every_hour_lands_in_exactly_one_bucket() {
    let engine = AggregationEngine::default();
    let start = UTC.with_ymd_and_hms(2024, 2, 27, 7, 45, 0).unwrap();
    let end = utc(2024, 4, 2, 3);

    for resolution in Resolution::ALL {
        let window = QueryWindow::new(start, end, resolution).unwrap();
        let result = engine.execute(&window).unwrap();

        let mut hour = utc(2024, 2, 27, 7);
        let mut labels = BTreeSet::new();
        let mut hours = 0;
        while hour <= end {
            labels.insert(bucket_label(&hour, resolution));
            hours += 1;
            hour = hour + Duration::hours(1);
        }

        assert_eq!(result.metadata.total_hourly_points, hours);
        assert_eq!(result.metadata.total_buckets, labels.len());
        assert_eq!(result.buckets.iter().map(|b| b.samples).sum::<usize>(), hours);
        assert!(result.buckets.iter().all(|b| b.samples > 0));
    }
}

#[test]
fn test_single_day_hourly_scenario() {
    let window = AggregationRequest::new("2024-01-01T00:00:00Z", "2024-01-01T23:00:00Z", "hour")
        .validate(UTC)
        .unwrap();
    let result = AggregationEngine::default().execute(&window).unwrap();

    assert_eq!(result.buckets.len(), 24);
    for (i, bucket) in result.buckets.iter().enumerate() {
        assert_eq!(bucket.value, value(&utc(2024, 1, 1, i as u32)));
        assert_eq!(bucket.label, format!("2024-01-01 {:02}:00", i));
    }
}

#[test]
fn test_one_week_boundary() {
    let range = compute_range_from_preset("1w", "2024-06-15T00:00:00", Resolution::Day, UTC).unwrap();
    assert_eq!(range.start_date, utc(2024, 6, 9, 0));
    assert_eq!(range.end_date, utc(2024, 6, 16, 0) - Duration::milliseconds(1));

    let result = AggregationEngine::default()
        .execute(&range.to_query_window(Resolution::Day).unwrap())
        .unwrap();
    let labels: Vec<&str> = result.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["2024-06-09", "2024-06-10", "2024-06-11", "2024-06-12", "2024-06-13", "2024-06-14", "2024-06-15"]
    );
}

#[test]
fn test_one_week_in_new_york_across_dst() {
    // The week ending 2024-03-14 contains the spring-forward day.
    let range = compute_range_from_preset("1w", "2024-03-14T12:00:00", Resolution::Day, New_York).unwrap();
    let result = AggregationEngine::default()
        .execute(&range.to_query_window(Resolution::Day).unwrap())
        .unwrap();
    assert_eq!(result.buckets.len(), 7);
    assert_eq!(result.metadata.total_hourly_points, 7 * 24 - 1);
    let short_day = result.buckets.iter().find(|b| b.label == "2024-03-10").unwrap();
    assert_eq!(short_day.samples, 23);
}

#[test]
fn test_custom_snapping_round_trip() {
    let range = compute_range_from_custom("2024-05-03T10:00:00Z", "2024-05-29T10:00:00Z", Resolution::Week, UTC)
        .unwrap();
    let window = QueryWindow::new(range.start_date, range.end_date, Resolution::Week).unwrap();
    assert!(window.is_aligned());
    let again = compute_range_from_custom(
        &horizon::time::format_iso(&range.start_date),
        &horizon::time::format_iso(&range.end_date),
        Resolution::Week,
        UTC,
    )
    .unwrap();
    assert_eq!(again, range);
}

#[test]
fn test_year_preset_steps_track_calendar() {
    let now = utc(2023, 4, 1, 0);
    let mut state = NavigationState::new(&now, UTC);
    state.select_preset(PresetKey::OneYear, &now).unwrap();
    let anchor = *state.anchor();
    assert_eq!(anchor, utc(2024, 2, 1, 0));
    state.next().unwrap();
    state.next().unwrap();
    state.next().unwrap();
    assert_eq!(*state.anchor(), utc(2027, 2, 1, 0));
    assert_eq!(*state.anchor() - anchor, Duration::days(3 * 365 + 1));
}

#[test]
fn test_navigation_replay_is_deterministic() {
    let now = utc(2024, 6, 15, 12);
    let mut first = NavigationState::new(&now, UTC);
    let mut second = NavigationState::new(&now, UTC);
    for state in [&mut first, &mut second] {
        state.ensure_default(&now).unwrap();
        state.select_preset(PresetKey::ThreeMonths, &now).unwrap();
        state.set_resolution(Resolution::Month).unwrap();
        state.prev().unwrap();
    }
    assert_eq!(first, second);

    let restored = NavigationState::restore(&first.to_params(), &utc(2031, 1, 1, 0), UTC).unwrap();
    assert_eq!(restored.window(), first.window());
}

fn app() -> axum::Router {
    router(ServerState::from_config(&HorizonConfig::default()).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_time_series() {
    let (status, body) = get_json(
        "/api/time-series?startDate=2024-01-01T00:00:00Z&endDate=2024-01-07T23:59:59.999Z&resolution=day",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["metadata"]["totalBuckets"], 7);
    assert_eq!(body["data"]["metadata"]["totalHourlyPoints"], 168);
    assert_eq!(body["data"]["buckets"][0]["timestamp"], "2024-01-01T00:00:00.000Z");
    assert_eq!(body["data"]["buckets"][6]["label"], "2024-01-07");
}

#[tokio::test]
async fn test_http_time_series_rejects_bad_input() {
    let (status, body) = get_json("/api/time-series?startDate=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required parameters: endDate, resolution");

    let (status, body) =
        get_json("/api/time-series?startDate=2024-01-02&endDate=2024-01-01&resolution=day").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "startDate must be before endDate");

    let (status, _) =
        get_json("/api/time-series?startDate=2024-01-01&endDate=2024-01-02&resolution=minute").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_http_presets_and_range() {
    let (status, body) = get_json("/api/presets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"][0]["key"], "1w");

    let (status, body) = get_json("/api/range?preset=1w&endAnchor=2024-06-15T00:00:00&resolution=day").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["startDate"], "2024-06-09T00:00:00.000Z");
    assert_eq!(body["data"]["endDate"], "2024-06-15T23:59:59.999Z");

    let (status, body) = get_json("/api/range?preset=9y&endAnchor=2024-06-15").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown preset: 9y");
}

#[tokio::test]
async fn test_http_navigate_prev() {
    let params = serde_json::json!({
        "preset": "1m",
        "resolution": "day",
        "endAnchor": "2024-06-15T12:00:00.000Z",
        "startDate": "2024-05-15T00:00:00.000Z",
        "endDate": "2024-06-15T23:59:59.999Z"
    });
    let (status, body) = post_json("/api/navigate", serde_json::json!({ "params": params, "action": { "type": "prev" } })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["params"]["endAnchor"], "2024-05-15T12:00:00.000Z");
    assert_eq!(body["data"]["params"]["startDate"], "2024-04-15T00:00:00.000Z");
    assert_eq!(body["data"]["availableResolutions"], serde_json::json!(["day", "week", "hour"]));

    let (status, body) = post_json("/api/navigate", serde_json::json!({ "action": { "type": "warp" } })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
