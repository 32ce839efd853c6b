//! Integration tests for the Compute client and pagers using wiremock
//!
//! These tests verify request shape, error decoding, and pagination against
//! mocked Compute API endpoints.

use futures::TryStreamExt;
use gce_instances::compute::{Instances, ListInstancesRequest};
use gce_instances::{AggregatedListInstancesRequest, ClientConfig, ComputeClient, ComputeError};
use serde_json::{json, Value};
use wiremock::matchers::{bearer_token, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "test-project";
const ZONE: &str = "us-central1-a";

async fn open(server: &MockServer) -> ComputeClient {
    let config = ClientConfig::with_static_token(&server.uri(), "test-token").unwrap();
    ComputeClient::open(&config).await.unwrap()
}

fn render(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

/// Test module for HTTP client integration tests
mod http_client_tests {
    use super::*;

    /// Successful GET sends the bearer token and parses JSON
    #[tokio::test]
    async fn test_get_success_returns_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"name": "instance-1", "status": "RUNNING"},
                    {"name": "instance-2", "status": "TERMINATED"}
                ]
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let url = client.compute_zonal_url(PROJECT, ZONE, "instances");
        let response: Value = client.get(&url, &[]).await.expect("Request should succeed");

        assert_eq!(response["items"].as_array().unwrap().len(), 2);
        assert_eq!(response["items"][0]["name"], "instance-1");
    }

    /// 401 becomes an unauthorized request error
    #[tokio::test]
    async fn test_401_returns_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "message": "Invalid credentials", "status": "UNAUTHENTICATED"}
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let url = client.compute_aggregated_url(PROJECT, "instances");
        let err = client.get::<Value>(&url, &[]).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    /// 404 for an unknown zone is a not-found request error
    #[tokio::test]
    async fn test_404_returns_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/invalid-zone/instances"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "The resource 'projects/test-project/zones/invalid-zone' was not found",
                    "errors": [{"reason": "notFound", "domain": "global"}]
                }
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let instances = Instances::new(&client);
        let mut out = Vec::new();
        let err = instances
            .list(&mut out, &ListInstancesRequest::new(PROJECT, "invalid-zone"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(err, ComputeError::Request { .. }));
    }

    /// Rate limiting surfaces as a request error without retry
    #[tokio::test]
    async fn test_rate_limit_429_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Rate limit exceeded"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = open(&server).await;
        let url = client.compute_zonal_url(PROJECT, ZONE, "instances");
        let err = client.get::<Value>(&url, &[]).await.unwrap_err();

        assert_eq!(err.status(), Some(429));
    }

    /// Malformed JSON is a decode error
    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let url = client.compute_zonal_url(PROJECT, ZONE, "instances");
        let err = client.get::<Value>(&url, &[]).await.unwrap_err();

        assert!(matches!(err, ComputeError::Decode(_)));
    }
}

/// Pagination over single-zone and aggregated listings
mod pagination_tests {
    use super::*;

    /// Single-zone pager follows nextPageToken until it is absent
    #[tokio::test]
    async fn test_zone_pager_follows_next_page_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .and(query_param("pageToken", "token-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "instance-3"}, {"name": "instance-4"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "instance-1"}, {"name": "instance-2"}],
                "nextPageToken": "token-page-2"
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let instances = Instances::new(&client);
        let mut out = Vec::new();
        let found = instances
            .list(&mut out, &ListInstancesRequest::new(PROJECT, ZONE))
            .await
            .unwrap();

        let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["instance-1", "instance-2", "instance-3", "instance-4"]);

        let output = render(out);
        assert!(output.starts_with("Instances found in zone us-central1-a:\n"));
        assert!(output.contains("- instance-4"));
    }

    /// Empty zone prints the header and nothing else
    #[tokio::test]
    async fn test_empty_zone_prints_header_only() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "compute#instanceList"
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let mut out = Vec::new();
        Instances::new(&client)
            .list(&mut out, &ListInstancesRequest::new(PROJECT, ZONE))
            .await
            .unwrap();

        let output = render(out);
        assert!(output.contains("Instances found in zone"));
        assert_eq!(output.lines().filter(|l| l.starts_with("- ")).count(), 0);
    }

    /// Duplicate zone keys across pages are emitted in order; empty zones are skipped
    #[tokio::test]
    async fn test_aggregated_streams_groups_in_encounter_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "items": {
                        "zones/us-central1-a": {"instances": [
                            {"name": "vm-a1", "machineType": "zones/us-central1-a/machineTypes/e2-small"}
                        ]},
                        "zones/asia-east1-b": {"instances": [
                            {"name": "vm-s1", "machineType": "zones/asia-east1-b/machineTypes/e2-micro"}
                        ]},
                        "zones/africa-south1-a": {"warning": {"code": "NO_RESULTS_ON_PAGE", "message": "empty"}}
                    },
                    "nextPageToken": "p2"
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "items": {
                        "zones/europe-central2-b": {"instances": [
                            {"name": "vm-e1", "machineType": "zones/europe-central2-b/machineTypes/n1-standard-1"}
                        ]},
                        "zones/us-central1-a": {"instances": [
                            {"name": "vm-a2", "machineType": "zones/us-central1-a/machineTypes/e2-small"}
                        ]}
                    }
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let mut out = Vec::new();
        let count = Instances::new(&client)
            .list_all(&mut out, &AggregatedListInstancesRequest::new(PROJECT))
            .await
            .unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            render(out),
            "Instances found:\n\
             zones/us-central1-a\n\
             - vm-a1 zones/us-central1-a/machineTypes/e2-small\n\
             zones/asia-east1-b\n\
             - vm-s1 zones/asia-east1-b/machineTypes/e2-micro\n\
             zones/europe-central2-b\n\
             - vm-e1 zones/europe-central2-b/machineTypes/n1-standard-1\n\
             zones/us-central1-a\n\
             - vm-a2 zones/us-central1-a/machineTypes/e2-small\n"
        );
    }

    /// A failing later page aborts the listing with an iteration error
    #[tokio::test]
    async fn test_aggregated_mid_stream_failure_is_iteration_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": {"zones/us-central1-a": {"instances": [{"name": "vm-a1"}]}},
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"code": 503, "message": "Backend unavailable"}
            })))
            .mount(&server)
            .await;

        let client = open(&server).await;
        let mut out = Vec::new();
        let err = Instances::new(&client)
            .list_all(&mut out, &AggregatedListInstancesRequest::new(PROJECT))
            .await
            .unwrap_err();

        assert!(matches!(err, ComputeError::Iteration(_)));
        assert_eq!(err.status(), Some(503));
    }

    /// A server that hands back the token it was given ends the listing
    #[tokio::test]
    async fn test_repeated_page_token_is_iteration_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "vm-1"}],
                "nextPageToken": "stuck"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = open(&server).await;
        let mut pager = Instances::new(&client).pager(&ListInstancesRequest::new(PROJECT, ZONE));

        let first = pager.next().await.unwrap().unwrap();
        assert_eq!(first.name, "vm-1");

        let err = pager.next().await.unwrap_err();
        match &err {
            ComputeError::Iteration(inner) => {
                assert!(matches!(**inner, ComputeError::Protocol(_)))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(pager.next().await.unwrap().is_none());
    }

    /// The pager's stream view yields the same items and forwards query options
    #[tokio::test]
    async fn test_aggregated_stream_view_and_query_options() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/aggregated/instances"))
            .and(query_param("filter", "status = RUNNING"))
            .and(query_param("returnPartialSuccess", "true"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": {
                    "zones/us-central1-a": {"instances": [{"name": "vm-a1"}]},
                    "zones/us-east1-b": {"instances": [{"name": "vm-b1"}, {"name": "vm-b2"}]}
                },
                "unreachables": ["zones/me-west1-a"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ClientConfig::with_static_token(&server.uri(), "test-token").unwrap();
        config.page_size = Some(2);
        let client = ComputeClient::open(&config).await.unwrap();

        let request = AggregatedListInstancesRequest::new(PROJECT)
            .with_filter("status = RUNNING")
            .with_partial_success(true);
        let groups: Vec<_> = Instances::new(&client)
            .aggregated_pager(&request)
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        let sizes: Vec<(&str, usize)> = groups
            .iter()
            .map(|(zone, scoped)| (zone.as_str(), scoped.instances.len()))
            .collect();
        assert_eq!(sizes, vec![("zones/us-central1-a", 1), ("zones/us-east1-b", 2)]);
    }

    /// Listing again re-issues the first request instead of resuming
    #[tokio::test]
    async fn test_listing_twice_is_identical() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/compute/v1/projects/test-project/zones/us-central1-a/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "vm-1", "machineType": "zones/us-central1-a/machineTypes/e2-small"}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = open(&server).await;
        let instances = Instances::new(&client);
        let request = ListInstancesRequest::new(PROJECT, ZONE);

        let mut first = Vec::new();
        instances.list(&mut first, &request).await.unwrap();
        let mut second = Vec::new();
        instances.list(&mut second, &request).await.unwrap();

        assert_eq!(render(first), render(second));
    }
}
