mod common;

use anyhow::Result;
use common::TestServer;
use epidata_api_rust::testing::{row, MemoryExecutor};
use reqwest::StatusCode;
use serde_json::json;

fn fluview_rows() -> MemoryExecutor {
    MemoryExecutor::new().with_rows(
        "fluview",
        vec![
            row([("epiweek", json!(201501)), ("region", json!("nat")), ("issue", json!(201505)), ("wili", json!(3.2))]),
            row([("epiweek", json!(201502)), ("region", json!("nat")), ("issue", json!(201505)), ("wili", json!(3.5))]),
        ],
    )
}

#[tokio::test]
async fn fluview_returns_success_envelope() -> Result<()> {
    let server = TestServer::start(fluview_rows()).await?;

    let (status, body) = server.epidata(&[("source", "fluview"), ("epiweeks", "201501-201502"), ("regions", "nat")]).await?;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["result"], 1);
    assert_eq!(body["message"], "success");
    let rows = body["epidata"].as_array().expect("epidata should be an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["wili"], 3.2);

    // Latest issue plan: one join against the max-issue subquery
    let statements = server.executor.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].query.contains("max(fv.\"issue\")"));
    Ok(())
}

#[tokio::test]
async fn empty_result_is_no_results() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::new()).await?;

    let (status, body) = server.epidata(&[("source", "flusurv"), ("epiweeks", "201501"), ("locations", "CA"), ("lag", "3")]).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": -2, "message": "no results"}));
    Ok(())
}

#[tokio::test]
async fn truncated_results_report_code_two() -> Result<()> {
    let server = TestServer::start_with_limit(fluview_rows(), 2).await?;

    let (_, body) = server.epidata(&[("source", "fluview"), ("epiweeks", "201501-201502"), ("regions", "nat")]).await?;

    assert_eq!(body["result"], 2);
    assert_eq!(body["message"], "too many results, data truncated");
    assert_eq!(body["epidata"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn missing_parameters_are_named() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::new()).await?;

    let (status, body) = server.epidata(&[("source", "fluview"), ("epiweeks", "201501")]).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], -1);
    assert_eq!(body["message"], "missing parameter(s): regions");
    assert!(server.executor.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_and_retired_sources() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::new()).await?;

    let (status, body) = server.epidata(&[("epiweeks", "201501")]).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "no data source specified");

    let (status, body) = server.epidata(&[("source", "ilinet")]).await?;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["message"], "use fluview instead");

    let (_, body) = server.epidata(&[("source", "signals")]).await?;
    assert_eq!(body["message"], "use sensors instead");
    Ok(())
}

#[tokio::test]
async fn malformed_epiweeks_are_rejected() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::new()).await?;

    let (status, body) = server.epidata(&[("source", "gft"), ("epiweeks", "2015w1"), ("locations", "nat")]).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FILTER");
    Ok(())
}

#[tokio::test]
async fn cdc_requires_its_credential() -> Result<()> {
    let rows = vec![row([("location", json!("nat")), ("epiweek", json!(201501)), ("total", json!(42))])];
    let server = TestServer::start(MemoryExecutor::new().with_rows("cdc_extract", rows)).await?;

    let (status, body) = server.epidata(&[("source", "cdc"), ("epiweeks", "201501"), ("locations", "nat"), ("auth", "guess")]).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthenticated");

    let (status, body) = server
        .epidata(&[("source", "cdc"), ("epiweeks", "201501"), ("locations", "nat,hhs2,pa"), ("auth", "cdc-secret")])
        .await?;
    assert_eq!(status, StatusCode::OK);
    // One statement per region plus one for the raw states, concatenated
    assert_eq!(body["epidata"].as_array().map(Vec::len), Some(3));
    assert_eq!(server.executor.statements().len(), 3);
    Ok(())
}

#[tokio::test]
async fn post_form_is_accepted() -> Result<()> {
    let server = TestServer::start(fluview_rows()).await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/epidata", server.base_url))
        .form(&[("source", "fluview"), ("epiweeks", "201501"), ("regions", "nat")])
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["result"], 1);
    Ok(())
}

#[tokio::test]
async fn storage_errors_stay_generic() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::failing()).await?;

    let (status, body) = server.epidata(&[("source", "nowcast"), ("epiweeks", "201501"), ("locations", "nat")]).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "database error");

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn root_lists_sources() -> Result<()> {
    let server = TestServer::start(MemoryExecutor::new()).await?;

    let body = reqwest::get(format!("{}/", server.base_url)).await?.json::<serde_json::Value>().await?;
    let sources = body["sources"].as_array().expect("sources should be an array");
    assert!(sources.contains(&json!("fluview")));
    assert!(sources.contains(&json!("sensors")));

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wiki_returns_counts_per_hour() -> Result<()> {
    let rows = vec![
        row([("epiweek", json!(201501)), ("article", json!("influenza")), ("count", json!(40)), ("total", json!(8_000_000)), ("value", json!(5.0)), ("hour", json!(4))]),
        row([("epiweek", json!(201501)), ("article", json!("influenza")), ("count", json!(20)), ("total", json!(4_000_000)), ("value", json!(5.0)), ("hour", json!(5))]),
    ];
    let server = TestServer::start(MemoryExecutor::new().with_rows("wiki", rows)).await?;

    let (status, body) = server
        .epidata(&[("source", "wiki"), ("articles", "influenza"), ("language", "en"), ("epiweeks", "201501"), ("hours", "4-5")])
        .await?;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["result"], 1);
    let rows = body["epidata"].as_array().expect("epidata should be an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["hour"], 5);

    let statements = server.executor.statements();
    assert!(statements[0].query.contains("GROUP BY m.\"epiweek\", w.\"article\", m.\"hour\""));

    let (status, body) = server.epidata(&[("source", "wiki"), ("articles", "influenza"), ("epiweeks", "201501")]).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "missing parameter(s): language");
    Ok(())
}

#[tokio::test]
async fn norostat_sources_share_one_credential() -> Result<()> {
    let executor = MemoryExecutor::new()
        .with_rows(
            "norostat_point_diffs",
            vec![row([("release_date", json!("2015-01-09")), ("epiweek", json!(201501)), ("value", json!(12))])],
        )
        .with_rows("norostat_raw_datatable_version_list", vec![row([("release_date", json!("2015-01-09"))])])
        .with_rows("norostat_raw_datatable_location_pool", vec![row([("location", json!("Minnesota, Ohio"))])]);
    let server = TestServer::start(executor).await?;

    let (status, body) = server
        .epidata(&[("source", "norostat"), ("location", "Minnesota, Ohio"), ("epiweeks", "201501"), ("auth", "cdc-secret")])
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "unauthenticated");

    let (status, body) = server
        .epidata(&[("source", "norostat"), ("location", "Minnesota, Ohio"), ("epiweeks", "201501"), ("auth", "norostat-secret")])
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["epidata"], json!([{"release_date": "2015-01-09", "epiweek": 201501, "value": 12}]));

    let (status, body) = server.epidata(&[("source", "meta_norostat"), ("auth", "norostat-secret")]).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 1);
    assert_eq!(
        body["epidata"],
        json!([{"releases": [{"release_date": "2015-01-09"}], "locations": [{"location": "Minnesota, Ohio"}]}])
    );
    Ok(())
}

#[tokio::test]
async fn nidss_dengue_labels_rows_with_the_requested_name() -> Result<()> {
    let rows = vec![row([("epiweek", json!(201501)), ("location", json!("nationwide")), ("count", json!(3))])];
    let server = TestServer::start(MemoryExecutor::new().with_rows("nidss_dengue", rows)).await?;

    let (status, body) = server.epidata(&[("source", "nidss_dengue"), ("epiweeks", "201501"), ("locations", "nationwide,Taipei")]).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["epidata"].as_array().map(Vec::len), Some(2));
    let statements = server.executor.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[1].params.contains(&epidata_api_rust::filter::FilterValue::text("Taipei")));
    Ok(())
}
