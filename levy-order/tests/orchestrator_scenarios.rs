mod common;

use common::*;
use levy_core::{Currency, EngineError, Environment, FailureKind, GatewayError, Severity};
use levy_order::TaxOutcome;
use rust_decimal::Decimal;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_georgia_order_is_taxed_per_line() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1787", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway.clone(), engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("1787", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::Computed);
    assert_eq!(computation.tax.amount(), dec("2.25"));
    assert_eq!(computation.order_id, "1787");
    assert_eq!(engine.call_count(), 1);
    assert!(notifier.events().is_empty());

    let requests = engine.requests.lock().unwrap();
    let amounts: Vec<Decimal> = requests[0].lines().iter().map(|l| l.amount.amount()).collect();
    assert_eq!(amounts, vec![dec("10.00"), dec("25.50"), dec("7.00")]);
    assert_eq!(requests[0].transaction_date(), transaction_date());
    assert_eq!(requests[0].company_code(), "PRINTCO");

    let endpoints = engine.endpoints.lock().unwrap();
    assert_eq!(endpoints[0].environment, Environment::Sandbox);
    assert_eq!(endpoints[0].url, "http://sandbox.invalid/transactions/create");
}

#[tokio::test]
async fn test_new_york_order_skips_engine() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1788", "NY")));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("1788", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::Skipped);
    assert!(computation.tax.is_zero());
    assert_eq!(engine.call_count(), 0);
    assert!(notifier.events().is_empty(), "skipping is not a failure");
}

#[tokio::test]
async fn test_region_casing_and_alias_are_taxed() {
    for region in ["ga", "Ga", "Georgia", "GEORGIA"] {
        let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", region)));
        let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("1.00"))));
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = orchestrator(gateway, engine.clone(), notifier, settings());

        let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

        assert_eq!(computation.outcome, TaxOutcome::Computed, "{region}");
        assert_eq!(engine.call_count(), 1, "{region}");
    }
}

#[tokio::test]
async fn test_gateway_transient_error_fails_open() {
    let gateway = Arc::new(FailingGateway(GatewayError::Transient("connection reset".into())));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("1789", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::DataUnavailable));
    assert!(computation.tax.is_zero());
    assert_eq!(computation.tax.currency(), &Currency::usd());
    assert_eq!(engine.call_count(), 0);

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].failure_kind, FailureKind::DataUnavailable);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].order_id, "1789");
    assert_eq!(events[0].site_name.as_deref(), Some("Acme Print"));
    assert!(events[0].detail.contains("connection reset"));
}

#[tokio::test]
async fn test_unknown_order_fails_open_without_retry() {
    let gateway = Arc::new(InMemoryGateway::default());
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway.clone(), engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("missing", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::DataUnavailable));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.call_count(), 0);
    assert_eq!(notifier.events().len(), 1);
}

#[tokio::test]
async fn test_http_500_fails_open_after_one_request() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1790", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Fail(EngineError::Http {
        status: 500,
        body: r#"{"error":{"message":"Internal error"}}"#.to_string(),
    })));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("1790", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::HttpError));
    assert!(computation.tax.is_zero());
    assert_eq!(engine.call_count(), 1);

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].failure_kind, FailureKind::HttpError);
}

#[tokio::test]
async fn test_every_engine_error_fails_open_with_one_notification() {
    let cases = [
        (EngineError::Network("connection refused".into()), FailureKind::NetworkError),
        (EngineError::Http { status: 401, body: "unauthorized".into() }, FailureKind::HttpError),
        (EngineError::Parse("response has no totalTax".into()), FailureKind::ParseError),
        (EngineError::Configuration("missing credentials".into()), FailureKind::ConfigurationError),
    ];

    for (error, kind) in cases {
        let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", "GA")));
        let engine = Arc::new(ScriptedEngine::new(Script::Fail(error)));
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

        let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

        assert_eq!(computation.outcome, TaxOutcome::FailedOpen(kind));
        assert!(computation.tax.is_zero());
        assert_eq!(engine.call_count(), 1);
        let events = notifier.events();
        assert_eq!(events.len(), 1, "{kind}");
        assert_eq!(events[0].failure_kind, kind);
    }
}

#[tokio::test]
async fn test_unrecognized_environment_is_an_alert_before_any_call() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut settings = settings();
    settings.environment = "staging".to_string();
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings);

    let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::ConfigurationError));
    assert_eq!(engine.call_count(), 0);
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Alert);
}

#[tokio::test]
async fn test_incomplete_address_is_a_configuration_error() {
    let mut address = address_in("GA");
    address.line1.clear();
    let charges = levy_core::ChargeSet::new("1", Currency::usd(), vec![usd("1.00")], usd("0"), usd("0"), address).unwrap();

    let gateway = Arc::new(InMemoryGateway::default().with(charges));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

    let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::ConfigurationError));
    assert_eq!(engine.call_count(), 0);
    assert!(notifier.events()[0].detail.contains("line1"));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_gateway_times_out() {
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut settings = settings();
    settings.gateway_timeout = Duration::from_millis(250);
    let orchestrator = orchestrator(Arc::new(StalledGateway), engine.clone(), notifier.clone(), settings);

    let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::DataUnavailable));
    assert!(notifier.events()[0].detail.contains("250ms"));
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_engine_times_out_as_network_error() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Stall));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut settings = settings();
    settings.engine_timeout = Duration::from_secs(3);
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings);

    let computation = orchestrator.compute_tax("1", Decimal::ZERO).await;

    assert_eq!(computation.outcome, TaxOutcome::FailedOpen(FailureKind::NetworkError));
    assert_eq!(engine.call_count(), 1);
    assert_eq!(notifier.events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_call_returns_nothing_and_reports_nothing() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Stall));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine.clone(), notifier.clone(), settings());

    let cancelled = tokio::time::sleep(Duration::from_secs(1));
    let result = orchestrator.compute_tax_until("1", Decimal::ZERO, cancelled).await;

    assert!(result.is_none());
    assert_eq!(engine.call_count(), 1);
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn test_uncancelled_call_completes() {
    let gateway = Arc::new(InMemoryGateway::default().with(sample_order("1", "GA")));
    let engine = Arc::new(ScriptedEngine::new(Script::Fixed(dec("2.25"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(gateway, engine, notifier, settings());

    let result = orchestrator
        .compute_tax_until("1", Decimal::ZERO, std::future::pending())
        .await
        .unwrap();

    assert_eq!(result.tax.amount(), dec("2.25"));
}

#[tokio::test]
async fn test_concurrent_orders_do_not_share_state() {
    let big = levy_core::ChargeSet::new(
        "big",
        Currency::usd(),
        vec![usd("1000.00")],
        usd("0"),
        usd("0"),
        address_in("GA"),
    )
    .unwrap();
    let gateway = Arc::new(
        InMemoryGateway::default()
            .with(sample_order("small", "GA"))
            .with(big)
            .with(sample_order("elsewhere", "NY")),
    );
    let engine = Arc::new(ScriptedEngine::new(Script::Rate(dec("0.04"))));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = Arc::new(orchestrator(gateway, engine.clone(), notifier, settings()));

    let handles: Vec<_> = ["small", "big", "elsewhere", "small", "big"]
        .into_iter()
        .map(|id| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.compute_tax(id, Decimal::ZERO).await })
        })
        .collect();

    for handle in handles {
        let computation = handle.await.unwrap();
        let expected = match computation.order_id.as_str() {
            "small" => dec("1.70"),
            "big" => dec("40.00"),
            _ => Decimal::ZERO,
        };
        assert_eq!(computation.tax.amount(), expected, "{}", computation.order_id);
    }
    assert_eq!(engine.call_count(), 4);
}
