use std::sync::Arc;
use std::time::Duration;

use btcpulse_core::adapters::{adapter_for, ProviderTransport};
use btcpulse_core::fixtures::canned_http_client;
use btcpulse_core::validation::validate;
use btcpulse_core::{
    HistoryRequest, HttpError, HttpResponse, MetricKind, MetricProvider, MockBehavior,
    MockHttpClient, ProviderId, SourceErrorKind,
};

struct ProviderCase {
    id: ProviderId,
    metrics: &'static [MetricKind],
    history: bool,
    data_route: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Coingecko,
            metrics: &[MetricKind::Price, MetricKind::Dominance],
            history: true,
            data_route: "/api/v3/",
        },
        ProviderCase {
            id: ProviderId::Coincap,
            metrics: &[MetricKind::Price],
            history: true,
            data_route: "/v2/assets",
        },
        ProviderCase {
            id: ProviderId::Coinpaprika,
            metrics: &[MetricKind::Price, MetricKind::Dominance],
            history: false,
            data_route: "/v1/",
        },
        ProviderCase {
            id: ProviderId::AlternativeMe,
            metrics: &[MetricKind::FearGreed],
            history: false,
            data_route: "/fng/",
        },
        ProviderCase {
            id: ProviderId::BitcoinData,
            metrics: &[MetricKind::Nupl, MetricKind::Sopr, MetricKind::Mvrv],
            history: false,
            data_route: "/v1/",
        },
    ]
}

fn adapter(id: ProviderId, client: Arc<MockHttpClient>) -> Arc<dyn MetricProvider> {
    adapter_for(
        ProviderTransport::for_provider(id)
            .with_http_client(client)
            .with_timeout(Duration::from_millis(250)),
    )
}

#[tokio::test]
async fn every_declared_metric_parses_into_a_plausible_value() {
    for case in provider_cases() {
        let source = adapter(case.id, Arc::new(canned_http_client()));
        assert_eq!(source.id(), case.id);

        for metric in case.metrics {
            assert!(
                source.capabilities().supports(*metric),
                "provider '{}' should declare {metric}",
                case.id
            );
            let value = source
                .fetch(*metric)
                .await
                .unwrap_or_else(|error| panic!("provider '{}' {metric} failed: {error}", case.id));
            assert_eq!(value.kind(), *metric, "provider '{}': variant", case.id);
            validate(&value).unwrap_or_else(|error| {
                panic!("provider '{}' {metric} implausible: {error}", case.id)
            });
        }
    }
}

#[tokio::test]
async fn undeclared_metrics_fail_as_unsupported_without_network() {
    for case in provider_cases() {
        let client = Arc::new(canned_http_client());
        let source = adapter(case.id, client.clone());

        for metric in MetricKind::ALL {
            if case.metrics.contains(&metric) {
                continue;
            }
            assert!(!source.capabilities().supports(metric));
            let error = source.fetch(metric).await.expect_err("unsupported metric");
            assert_eq!(
                error.kind(),
                SourceErrorKind::UnsupportedMetric,
                "provider '{}' {metric}",
                case.id
            );
        }
        assert_eq!(client.total_calls(), 0, "provider '{}' issued requests", case.id);
    }
}

#[tokio::test]
async fn history_is_served_only_by_declaring_providers() {
    let request = HistoryRequest::new(7).expect("valid days");

    for case in provider_cases() {
        let source = adapter(case.id, Arc::new(canned_http_client()));
        assert_eq!(source.capabilities().history, case.history);

        let result = source.history(request).await;
        if case.history {
            let points = result.unwrap_or_else(|error| {
                panic!("provider '{}' history failed: {error}", case.id)
            });
            assert!(!points.is_empty());
            assert!(
                points.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp),
                "provider '{}': history must be oldest first",
                case.id
            );
        } else {
            let error = result.expect_err("history unsupported");
            assert_eq!(error.kind(), SourceErrorKind::UnsupportedMetric);
        }
    }
}

#[tokio::test]
async fn every_request_asks_for_json_with_the_configured_timeout() {
    for case in provider_cases() {
        let client = Arc::new(canned_http_client());
        let source = adapter(case.id, client.clone());
        source.fetch(case.metrics[0]).await.expect("canned response");

        for request in client.requests() {
            assert_eq!(
                request.headers.get("accept").map(String::as_str),
                Some("application/json"),
                "provider '{}'",
                case.id
            );
            assert_eq!(request.timeout_ms, 250, "provider '{}'", case.id);
        }
    }
}

#[tokio::test]
async fn non_success_status_maps_to_http_status() {
    for case in provider_cases() {
        let client = Arc::new(MockHttpClient::new().route(
            case.data_route,
            MockBehavior::Respond(HttpResponse::with_status(503, "unavailable")),
        ));
        let error = adapter(case.id, client)
            .fetch(case.metrics[0])
            .await
            .expect_err("503 must fail");

        assert_eq!(error.kind(), SourceErrorKind::HttpStatus, "provider '{}'", case.id);
        assert_eq!(error.status(), Some(503));
    }
}

#[tokio::test]
async fn unparsable_or_incomplete_bodies_are_malformed() {
    for body in ["not json", "{}", r#"{"data":null}"#] {
        for case in provider_cases() {
            let client = Arc::new(MockHttpClient::new().respond_json(case.data_route, body));
            let error = adapter(case.id, client)
                .fetch(case.metrics[0])
                .await
                .expect_err("malformed body must fail");

            assert_eq!(
                error.kind(),
                SourceErrorKind::Malformed,
                "provider '{}' body {body}",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn transport_failures_keep_their_kind() {
    for case in provider_cases() {
        let timeout = Arc::new(MockHttpClient::new().route(
            case.data_route,
            MockBehavior::Fail(HttpError::timeout("deadline elapsed")),
        ));
        let error = adapter(case.id, timeout)
            .fetch(case.metrics[0])
            .await
            .expect_err("timeout");
        assert_eq!(error.kind(), SourceErrorKind::Timeout, "provider '{}'", case.id);

        let refused = Arc::new(MockHttpClient::new().route(
            case.data_route,
            MockBehavior::Fail(HttpError::new("connection refused")),
        ));
        let error = adapter(case.id, refused)
            .fetch(case.metrics[0])
            .await
            .expect_err("transport");
        assert_eq!(error.kind(), SourceErrorKind::Transport, "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn probes_succeed_against_canned_endpoints() {
    for case in provider_cases() {
        adapter(case.id, Arc::new(canned_http_client()))
            .probe(Duration::from_secs(3))
            .await
            .unwrap_or_else(|error| panic!("provider '{}' probe failed: {error}", case.id));
    }
}

#[tokio::test]
async fn adapters_normalize_but_do_not_bound_check() {
    let client = Arc::new(MockHttpClient::new().respond_json(
        "/api/v3/global",
        r#"{"data":{"market_cap_percentage":{"btc":150.0}}}"#,
    ));
    let value = adapter(ProviderId::Coingecko, client)
        .fetch(MetricKind::Dominance)
        .await
        .expect("adapters pass implausible values through");

    assert_eq!(value.primary(), 150.0);
    assert!(validate(&value).is_err());
}
