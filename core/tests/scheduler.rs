mod common;

use std::sync::Arc;

use monobuild_core::api::{
    execute_requested, execute_targets, ArtifactCollector, BuildFacts, BuildResult,
    CollectedOutput, CollectingOutputFactory, ExecutionContext, ExecutionObserver, ExecutionOpts,
    ExecutorError, TargetExecutor, TargetGraph,
};
use pretty_assertions::assert_eq;

use common::{
    id, init_tracing, source, target, ConcurrencyGauge, EventLog, Gauged, ReadArtifact, Scripted,
    REPO,
};

fn context(artifacts: &ArtifactCollector) -> ExecutionContext {
    ExecutionContext::new(artifacts.clone(), BuildFacts::default())
}

fn opts(max_parallelism: usize) -> ExecutionOpts {
    ExecutionOpts {
        max_parallelism,
        build_id: Some("test-build".to_string()),
        ..ExecutionOpts::default()
    }
}

#[tokio::test]
async fn artifact_flows_to_dependent_after_completion() {
    init_tracing();
    let producer = Scripted::ok(&["building"], &[("img", "x")]);
    let reader = ReadArtifact::new(REPO, "img");
    let (a_id, a) = target("a", producer.clone(), &[]);
    let (b_id, b) = target("b", reader.clone(), &["a"]);

    let artifacts = ArtifactCollector::new();
    let mut executor = TargetExecutor::new(1, artifacts.clone());
    executor
        .add_target(a_id.clone(), &a, CollectedOutput::shared(), context(&artifacts))
        .await
        .unwrap();
    executor
        .add_target(b_id.clone(), &b, CollectedOutput::shared(), context(&artifacts))
        .await
        .unwrap();
    let results = executor.wait_for_all().await;

    assert_eq!(results.len(), 2);
    assert_eq!(
        results["/repo:a"].result,
        BuildResult::ok(vec![monobuild_core::api::Artifact::new("img", "x")])
    );
    assert_eq!(results["/repo:b"].result, BuildResult::ok(vec![]));
    assert_eq!(reader.seen().as_deref(), Some("x"));
    assert_eq!(producer.calls(), 1);
}

#[tokio::test]
async fn failed_dependency_skips_dependent_without_output() {
    let failing = Scripted::failing(&["boom"], "exit 2");
    let dependent = Scripted::ok(&["never"], &[]);
    let (a_id, a) = target("a", failing, &[]);
    let (b_id, b) = target("b", dependent.clone(), &["a"]);

    let artifacts = ArtifactCollector::new();
    let log = Arc::new(EventLog::default());
    let mut executor = TargetExecutor::new(1, artifacts.clone())
        .with_observer(log.clone() as Arc<dyn ExecutionObserver>);
    let b_output = CollectedOutput::shared();

    executor
        .add_target(a_id.clone(), &a, CollectedOutput::shared(), context(&artifacts))
        .await
        .unwrap();
    executor
        .add_target(b_id.clone(), &b, b_output.clone(), context(&artifacts))
        .await
        .unwrap();
    executor.wait_for_all().await;

    assert_eq!(executor.result(&a_id), Some(&BuildResult::failed("exit 2")));
    assert_eq!(
        executor.result(&b_id),
        Some(&BuildResult::dependency_failed(a_id.clone()))
    );
    assert_eq!(dependent.calls(), 0);
    assert!(b_output.chunks().is_empty());
    assert_eq!(b_output.final_result(), Some(BuildResult::dependency_failed(a_id)));
    assert_eq!(
        log.lines(),
        vec![
            "started /repo:a".to_string(),
            "finished /repo:a failed: exit 2".to_string(),
            "skipped /repo:b".to_string(),
        ]
    );
}

#[tokio::test]
async fn first_failed_dependency_in_declared_order_is_reported() {
    let (a_id, a) = target("a", Scripted::ok(&[], &[]), &[]);
    let (b_id, b) = target("b", Scripted::failing(&[], "b broke"), &[]);
    let (c_id, c) = target("c", Scripted::failing(&[], "c broke"), &[]);
    let (d_id, d) = target("d", Scripted::ok(&[], &[]), &["a", "c", "b"]);

    let artifacts = ArtifactCollector::new();
    let mut executor = TargetExecutor::new(4, artifacts.clone());
    for (tid, t) in [(&a_id, &a), (&b_id, &b), (&c_id, &c), (&d_id, &d)] {
        executor
            .add_target(tid.clone(), t, CollectedOutput::shared(), context(&artifacts))
            .await
            .unwrap();
    }
    executor.wait_for_all().await;

    assert_eq!(executor.result(&d_id), Some(&BuildResult::dependency_failed(c_id)));
}

#[tokio::test]
async fn parallelism_bounds_running_units() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let artifacts = ArtifactCollector::new();
    let mut executor = TargetExecutor::new(2, artifacts.clone());

    for name in ["one", "two", "three"] {
        let (tid, t) = target(name, Gauged::new(&gauge, 3), &[]);
        executor
            .add_target(tid, &t, CollectedOutput::shared(), context(&artifacts))
            .await
            .unwrap();
        assert!(executor.running_count() <= 2);
    }
    let results = executor.wait_for_all().await;

    assert_eq!(results.len(), 3);
    assert!(results.values().all(|r| r.result.has_succeeded()));
    assert_eq!(gauge.finished(), 3);
    assert_eq!(gauge.peak(), 2);
    assert_eq!(executor.peak_running(), 2);
}

#[tokio::test]
async fn parallelism_of_one_runs_targets_one_at_a_time() {
    let gauge = Arc::new(ConcurrencyGauge::default());
    let mut graph_targets = Vec::new();
    for name in ["one", "two", "three", "four"] {
        graph_targets.push(target(name, Gauged::new(&gauge, 2), &[]));
    }
    let graph = TargetGraph::from_targets(graph_targets).unwrap();

    let summary = execute_targets(&graph, &opts(1), &CollectingOutputFactory, &[])
        .await
        .unwrap();

    assert!(summary.succeeded());
    assert_eq!(gauge.peak(), 1);
}

#[tokio::test]
async fn unknown_dependency_is_an_error_not_a_hang() {
    let (b_id, b) = target("b", Scripted::ok(&[], &[]), &["missing"]);
    let artifacts = ArtifactCollector::new();
    let mut executor = TargetExecutor::new(1, artifacts.clone());

    let err = executor
        .add_target(b_id, &b, CollectedOutput::shared(), context(&artifacts))
        .await
        .unwrap_err();

    match err {
        ExecutorError::UnknownDependency { target, dependency } => {
            assert_eq!(target, "/repo:b");
            assert_eq!(dependency, "/repo:missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn execute_requested_runs_the_closure_and_summarises() {
    init_tracing();
    let mut targets = source(vec![
        target("lib", Scripted::ok(&["compiled"], &[("version", "1.2.3")]), &[]),
        target("app", ReadArtifact::new(REPO, "version"), &["lib"]),
        target("broken", Scripted::failing(&[], "nope"), &[]),
        target("deploy", Scripted::ok(&[], &[]), &["app", "broken"]),
        target("unrelated", Scripted::ok(&[], &[]), &[]),
    ]);

    let summary = execute_requested(
        &mut targets,
        &[id("deploy")],
        &opts(2),
        &CollectingOutputFactory,
        &[],
    )
    .await
    .unwrap();

    assert_eq!(summary.build_id, "test-build");
    assert_eq!(
        summary.results.keys().cloned().collect::<Vec<_>>(),
        vec!["/repo:app", "/repo:broken", "/repo:deploy", "/repo:lib"]
    );
    assert!(!summary.succeeded());
    assert_eq!(summary.failed(), vec!["/repo:broken"]);
    assert_eq!(summary.skipped(), vec!["/repo:deploy"]);
}

#[tokio::test]
async fn execute_requested_rejects_cycles_before_running_anything() {
    let action = Scripted::ok(&[], &[]);
    let mut targets = source(vec![
        target("a", action.clone(), &["b"]),
        target("b", action.clone(), &["a"]),
    ]);

    let err = execute_requested(&mut targets, &[id("a")], &opts(1), &CollectingOutputFactory, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::CircularDependency(_)));
    assert_eq!(action.calls(), 0);
}

#[tokio::test]
async fn summary_serialises_for_reports() {
    let graph =
        TargetGraph::from_targets(vec![target("a", Scripted::failing(&[], "bad"), &[])]).unwrap();
    let summary = execute_targets(&graph, &opts(1), &CollectingOutputFactory, &[])
        .await
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["build_id"], "test-build");
    assert_eq!(json["results"]["/repo:a"]["status"], "failed");
    assert_eq!(json["results"]["/repo:a"]["message"], "bad");
}
