//! Architectural Contract Test: Failure Containment
//!
//! Constraints verified:
//! - A provider that cannot produce corrections abandons only its domain:
//!   later providers and the registrar of that domain are not consulted,
//!   other domains run normally
//! - A binding to a provider that was never initialized is an error of
//!   that domain only
//! - A correction that fails to apply does not stop the next one
//! - An integrity violation ends the whole run
//! - Every adapter receives its own copy of the domain
//!
//! If this test fails, one bad provider can take down unrelated domains.

mod common;

use std::sync::Arc;

use common::*;
use zonectl_core::engine::{CorrectionStatus, Orchestrator, RunMode};
use zonectl_core::registry::Providers;

fn providers(
    list: &[(&str, &CountingProvider)],
    registrar: &CountingRegistrar,
) -> Providers {
    let mut out = Providers::new();
    for (name, p) in list {
        out.add_dns_provider(*name, Arc::new((*p).clone()), false);
    }
    out.add_registrar("reg", Arc::new(registrar.clone()));
    out
}

#[tokio::test]
async fn provider_failure_abandons_only_its_domain() {
    let broken = CountingProvider::new("broken", Behavior::Fail);
    let healthy = CountingProvider::corrections("healthy", 2);
    let registrar = CountingRegistrar::new();
    let providers = providers(&[("broken", &broken), ("healthy", &healthy)], &registrar);

    let cfg = config(vec![
        domain("a.example", "reg", &["broken", "healthy"]),
        domain("b.example", "reg", &["healthy"]),
    ]);

    let out = SharedBuffer::new();
    let summary = Orchestrator::new(RunMode::Push)
        .with_output(out.clone())
        .run(&cfg, &providers)
        .await
        .expect("provider failures are not fatal");

    assert!(summary.any_errors);
    assert_eq!(broken.get_calls(), 1);
    // healthy only ran for b.example; a.example was abandoned after broken
    assert_eq!(healthy.get_calls(), 1);
    assert_eq!(healthy.seen()[0].name, "b.example");
    assert_eq!(healthy.run_calls(), 2);
    assert_eq!(registrar.get_calls(), 1);

    assert_eq!(summary.for_domain("a.example").count(), 0);
    assert_eq!(summary.for_domain("b.example").count(), 3);
    assert_eq!(summary.total_corrections, 3);

    let text = out.contents();
    assert!(text.contains("----- DNS Provider: broken... ERROR"));
    assert!(text.contains("Error getting corrections: provider error (broken): zone unavailable"));
    assert!(text.contains("******************** Domain: b.example"));
}

#[tokio::test]
async fn uninitialized_provider_is_contained_to_its_domain() {
    let healthy = CountingProvider::corrections("healthy", 1);
    let registrar = CountingRegistrar::new();
    let providers = providers(&[("healthy", &healthy)], &registrar);

    // "ghost" is asked for nameservers but has no instance
    let cfg = config(vec![
        domain("a.example", "reg", &[]).with_provider("ghost", 1),
        domain("b.example", "reg", &["healthy"]),
    ]);

    let out = SharedBuffer::new();
    let summary = Orchestrator::new(RunMode::Push)
        .with_output(out.clone())
        .run(&cfg, &providers)
        .await
        .expect("a missing provider is not fatal");

    assert!(summary.any_errors);
    assert_eq!(healthy.get_calls(), 1);
    assert_eq!(healthy.seen()[0].name, "b.example");
    assert_eq!(registrar.get_calls(), 1);
    assert_eq!(summary.for_domain("a.example").count(), 0);

    let text = out.contents();
    assert!(text.contains("----- DNS Provider: ghost... ERROR"), "{}", text);
    assert!(text.contains("DNS provider ghost is not initialized"), "{}", text);
    assert!(text.contains("******************** Domain: b.example"));
}

#[tokio::test]
async fn failed_correction_does_not_stop_the_next() {
    let flaky = CountingProvider::new(
        "flaky",
        Behavior::Corrections {
            count: 3,
            failing: vec![1],
        },
    );
    let registrar = CountingRegistrar::new();
    let providers = providers(&[("flaky", &flaky)], &registrar);
    let cfg = config(vec![domain("a.example", "reg", &["flaky"])]);

    let out = SharedBuffer::new();
    let summary = Orchestrator::new(RunMode::Push)
        .with_output(out.clone())
        .run(&cfg, &providers)
        .await
        .unwrap();

    assert!(summary.any_errors);
    assert_eq!(flaky.run_calls(), 3);
    let statuses: Vec<_> = summary.outcomes.iter().map(|o| o.status.clone()).collect();
    assert_eq!(statuses[0], CorrectionStatus::Applied);
    assert!(matches!(statuses[1], CorrectionStatus::Failed(_)));
    assert_eq!(statuses[2], CorrectionStatus::Applied);
    // registrar still runs after a failed correction
    assert_eq!(registrar.run_calls(), 1);

    let text = out.contents();
    assert!(text.contains("#2: flaky change 2"));
    assert!(text.contains("FAILURE! provider error (flaky): write rejected"));
    assert_eq!(text.matches("SUCCESS!").count(), 3);
}

#[tokio::test]
async fn integrity_violation_ends_the_run() {
    let defective = CountingProvider::new("defective", Behavior::Integrity);
    let healthy = CountingProvider::corrections("healthy", 1);
    let registrar = CountingRegistrar::new();
    let providers = providers(&[("defective", &defective), ("healthy", &healthy)], &registrar);

    let cfg = config(vec![
        domain("a.example", "reg", &["defective"]),
        domain("b.example", "reg", &["healthy"]),
    ]);

    let err = Orchestrator::new(RunMode::Preview)
        .with_output(SharedBuffer::new())
        .run(&cfg, &providers)
        .await
        .unwrap_err();

    assert!(err.is_integrity());
    assert_eq!(healthy.get_calls(), 0, "no domain may run after an integrity violation");
    assert_eq!(registrar.get_calls(), 0);
}

#[tokio::test]
async fn adapters_receive_isolated_copies() {
    let first = CountingProvider::corrections("first", 0);
    let second = CountingProvider::corrections("second", 0);
    let registrar = CountingRegistrar::new();
    let providers = providers(&[("first", &first), ("second", &second)], &registrar);

    let cfg = config(vec![domain("a.example", "reg", &["first", "second"])]);
    Orchestrator::new(RunMode::Preview)
        .with_output(SharedBuffer::new())
        .run(&cfg, &providers)
        .await
        .unwrap();

    // first cleared its copy; second still sees the full domain
    let seen = second.seen();
    assert_eq!(seen[0].name, "a.example");
    assert_eq!(seen[0].records.len(), 1);
    assert_eq!(cfg.domains[0].records.len(), 1);
}
