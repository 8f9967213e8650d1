//! Integration tests for the library view, stats and settings endpoints.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, get, send_multipart, MultipartForm};
use sqlx::PgPool;
use tempfile::TempDir;

/// `(name, date, category, description)` of a program to create.
type Seed<'a> = (&'a str, &'a str, &'a str, &'a str);

async fn seed(pool: &PgPool, dir: &TempDir, programs: &[Seed<'_>]) {
    for (name, date, category, description) in programs {
        let form = MultipartForm::program(name, date, category, description);
        let response = send_multipart(
            common::build_test_app(pool.clone(), dir),
            Method::POST,
            "/api/audio",
            &form,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

async fn library(pool: &PgPool, dir: &TempDir, query: &str) -> serde_json::Value {
    let uri = format!("/api/library{query}");
    let response = get(common::build_test_app(pool.clone(), dir), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn library_filters_and_lists_categories(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    seed(
        &pool,
        &dir,
        &[
            ("Paddy Basics", "2024-01-10", "Paddy", "Nursery beds"),
            ("Milk Yield", "2024-02-10", "Dairy", "Feeding cows for paddy season"),
            ("Rain Report", "2024-03-10", "Weather", "Showers expected"),
        ],
    )
    .await;

    let data = library(&pool, &dir, "?search=PADDY").await;
    assert_eq!(data["total"], 2);
    assert_eq!(data["page"], 1);
    assert_eq!(data["page_count"], 1);
    assert_eq!(data["items"][0]["program_name"], "Milk Yield");
    assert_eq!(data["items"][1]["program_name"], "Paddy Basics");
    assert_eq!(data["categories"].as_array().unwrap().len(), 3);

    let data = library(
        &pool,
        &dir,
        "?start_date=2024-02-01&end_date=2024-03-10&category=Weather",
    )
    .await;
    assert_eq!(data["total"], 1);
    assert_eq!(data["items"][0]["program_name"], "Rain Report");

    let response = get(
        common::build_test_app(pool, &dir),
        "/api/library?start_date=soon",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn library_paginates_nine_per_page(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let programs: Vec<(String, String)> = (1..=11)
        .map(|day| (format!("Ep {day}"), format!("2024-04-{day:02}")))
        .collect();
    let seeds: Vec<Seed<'_>> = programs
        .iter()
        .map(|(name, date)| (name.as_str(), date.as_str(), "News", "d"))
        .collect();
    seed(&pool, &dir, &seeds).await;

    let data = library(&pool, &dir, "?page=2").await;
    assert_eq!(data["page"], 2);
    assert_eq!(data["page_count"], 2);
    assert_eq!(data["total"], 11);
    assert_eq!(data["items"].as_array().unwrap().len(), 2);

    let data = library(&pool, &dir, "?page=40").await;
    assert_eq!(data["page"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stats_summarise_catalog(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let today = Utc::now().date_naive();
    let yesterday = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
    let recent = yesterday.as_str();
    seed(
        &pool,
        &dir,
        &[
            ("A", recent, "Paddy", "d"),
            ("B", recent, "Paddy", "d"),
            ("C", "2020-01-01", "Dairy", "d"),
        ],
    )
    .await;

    let response = get(common::build_test_app(pool, &dir), "/api/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_programs"], 3);
    assert_eq!(data["category_distribution"][0]["category"], "Paddy");
    assert_eq!(data["category_distribution"][0]["count"], 2);
    assert_eq!(data["recent_uploads"][0]["date"], recent);
    assert_eq!(data["recent_uploads"][0]["count"], 2);
    assert_eq!(data["recent_uploads"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn settings_come_from_config(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let json = body_json(get(common::build_test_app(pool, &dir), "/api/settings").await).await;
    assert_eq!(json["siteTitle"], "Krushi Radio");
    assert_eq!(json["maxFileSize"], 5);
}
