mod common;

use common::{fast_config, workspace, FakePlatform};
use pretty_assertions::assert_eq;
use reckon_client::client::{SubmissionFilter, WAITING_STATE};
use reckon_client::error::ClientError;
use reckon_client::{Client, ClientEvent};
use reckon_core::errors::DomainError;
use reckon_core::model::{EntityKind, WorkflowStatus};
use reckon_core::patch::RepairSource;
use reckon_test_utils::fixtures::{
    attempt, entity, method_config, submission, submission_detail, workflow, workflow_ref,
};
use serde_json::json;
use std::sync::mpsc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn client(platform: FakePlatform) -> Client {
    Client::new(Arc::new(platform), &fast_config()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn single(id: &str, sample: &str, at: i64, wf: &str, status: &str) -> (serde_json::Value, serde_json::Value) {
    (
        submission(id, "rnaseq")
            .entity("sample", sample)
            .at(at)
            .count(status, 1)
            .build(),
        submission_detail(vec![workflow_ref(Some(wf), status, None)]),
    )
}

fn failed_run() -> serde_json::Value {
    workflow("wf-2", "rnaseq", "Failed")
        .span(0, 100)
        .call(
            "rnaseq.align",
            vec![attempt()
                .span(0, 40)
                .machine("n1-standard-4")
                .status("Done")
                .output("bam", json!("gs://b/S2.bam"))
                .build()],
        )
        .call(
            "rnaseq.quant",
            vec![attempt()
                .span(40, 90)
                .machine("n1-standard-4")
                .status("Failed")
                .stderr("gs://logs/wf-2/quant/stderr")
                .build()],
        )
        .build()
}

fn lab() -> FakePlatform {
    let (s1, d1) = single("sub-1", "S1", 0, "wf-1", "Succeeded");
    let (s0, d0) = single("sub-0", "S2", 10, "wf-0", "Succeeded");
    let (s2, d2) = single("sub-2", "S2", 60, "wf-2", "Failed");
    let (other, other_detail) = (
        submission("sub-9", "variant_calling")
            .entity("sample", "S1")
            .at(500)
            .count("Failed", 1)
            .build(),
        submission_detail(vec![workflow_ref(Some("wf-9"), "Failed", None)]),
    );
    FakePlatform::new()
        .submission(s1, d1)
        .submission(s0, d0)
        .submission(s2, d2)
        .submission(other, other_detail)
        .submission(
            submission("sub-empty", "rnaseq").entity("sample", "S3").at(30).build(),
            submission_detail(vec![]),
        )
        .metadata(
            workflow("wf-1", "rnaseq", "Succeeded")
                .span(0, 120)
                .call(
                    "rnaseq.align",
                    vec![attempt()
                        .span(0, 60)
                        .machine("n1-standard-4")
                        .status("Done")
                        .job("j-1")
                        .build()],
                )
                .build(),
        )
        .metadata(failed_run())
}

#[tokio::test]
async fn test_latest_submission_decides_status() {
    let report = client(lab())
        .entity_statuses(&workspace(), Some("rnaseq"), None)
        .await
        .unwrap();

    let s1 = report.resolution.get("S1").unwrap();
    assert_eq!(s1.status, WorkflowStatus::Succeeded);
    assert_eq!(s1.submission_id, "sub-1");

    let s2 = report.resolution.get("S2").unwrap();
    assert_eq!(s2.status, WorkflowStatus::Failed);
    assert_eq!(s2.workflow_id.as_deref(), Some("wf-2"));

    assert!(report.resolution.get("S3").is_none());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "sub-empty");

    let counts = report.counts();
    assert_eq!(counts.get(&WorkflowStatus::Succeeded), Some(&1));
    assert_eq!(counts.get(&WorkflowStatus::Failed), Some(&1));
}

#[tokio::test]
async fn test_unreachable_submission_is_skipped() {
    let (s1, d1) = single("sub-1", "S1", 0, "wf-1", "Succeeded");
    let platform = FakePlatform::new()
        .submission(s1, d1)
        .broken_submission(submission("sub-gone", "rnaseq").entity("sample", "S7").build());
    let report = client(platform)
        .entity_statuses(&workspace(), None, None)
        .await
        .unwrap();
    assert_eq!(report.resolution.len(), 1);
    assert_eq!(report.skipped[0].id, "sub-gone");
    assert!(report.skipped[0].reason.contains("404"));
}

#[tokio::test]
async fn test_set_submission_resolves_members() {
    let platform = FakePlatform::new().submission(
        submission("sub-set", "rnaseq")
            .entity("sample_set", "SS1")
            .count("Succeeded", 2)
            .build(),
        submission_detail(vec![
            workflow_ref(Some("wf-a"), "Succeeded", Some(("sample", "S4"))),
            workflow_ref(Some("wf-b"), "Failed", Some(("sample", "S5"))),
        ]),
    );
    let client = client(platform);

    let report = client
        .entity_statuses(&workspace(), None, Some(EntityKind::Sample))
        .await
        .unwrap();
    assert_eq!(report.resolution.len(), 2);
    assert_eq!(report.resolution.get("S5").unwrap().status, WorkflowStatus::Failed);
    assert_eq!(report.resolution.get("S4").unwrap().entity_kind, EntityKind::Sample);

    let err = client
        .entity_statuses(&workspace(), None, Some(EntityKind::SampleSet))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Domain(DomainError::UnsupportedSubmissionShape { .. })
    ));
}

#[tokio::test]
async fn test_stats_cover_succeeded_executions_only() {
    let report = client(lab()).stats(&workspace(), "rnaseq").await.unwrap();

    let group = report.workflows.get("rnaseq").unwrap();
    assert_eq!(group.executions.len(), 1);
    let s1 = group.executions.get("S1").unwrap();
    assert!(close(s1.total_runtime_h, 2.0));
    assert!(close(s1.total_cost, 0.19));
    assert!(close(s1.total_cpu_h, 4.0));
    assert_eq!(s1.per_task.get("align").unwrap().job_ids, vec!["j-1".to_string()]);

    assert_eq!(report.not_succeeded.len(), 1);
    assert_eq!(report.not_succeeded[0].entity_id, "S2");
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_stats_record_missing_metadata_as_failure() {
    let (s1, d1) = single("sub-1", "S1", 0, "wf-missing", "Succeeded");
    let report = client(FakePlatform::new().submission(s1, d1))
        .stats(&workspace(), "rnaseq")
        .await
        .unwrap();
    assert!(report.workflows.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "S1");
}

#[tokio::test]
async fn test_stats_keep_entity_types_apart() {
    let run = |id: &str| {
        workflow(id, "rnaseq", "Succeeded")
            .span(0, 60)
            .call(
                "rnaseq.align",
                vec![attempt()
                    .span(0, 60)
                    .machine("n1-standard-4")
                    .status("Done")
                    .build()],
            )
            .build()
    };
    let (sample, sample_detail) = single("sub-sample", "X", 0, "wf-sample", "Succeeded");
    let platform = FakePlatform::new()
        .submission(sample, sample_detail)
        .submission(
            submission("sub-set", "rnaseq")
                .entity("sample_set", "X")
                .at(10)
                .count("Succeeded", 1)
                .build(),
            submission_detail(vec![workflow_ref(Some("wf-set"), "Succeeded", None)]),
        )
        .metadata(run("wf-sample"))
        .metadata(run("wf-set"));

    let report = client(platform).stats(&workspace(), "rnaseq").await.unwrap();
    let group = report.workflows.get("rnaseq").unwrap();
    let labels: Vec<&str> = group.executions.keys().map(String::as_str).collect();
    assert_eq!(labels, vec!["sample:X", "sample_set:X"]);
}

#[tokio::test]
async fn test_task_states_of_unfinished_entities() {
    let report = client(lab())
        .task_states(&workspace(), "rnaseq", None, false)
        .await
        .unwrap();

    assert_eq!(report.tasks, vec!["align".to_string(), "quant".to_string()]);
    assert_eq!(report.states.len(), 1);
    let s2 = report.states.get("S2").unwrap();
    assert_eq!(s2.get("align").map(String::as_str), Some("Done"));
    assert_eq!(s2.get("quant").map(String::as_str), Some("Failed"));
    assert_eq!(report.summary["quant"]["Failed"], 1);
    assert_eq!(
        report.stderr["S2"].get("quant").map(String::as_str),
        Some("gs://logs/wf-2/quant/stderr")
    );
    assert!(!report.stderr["S2"].contains_key("align"));
}

#[tokio::test]
async fn test_task_states_fill_unstarted_tasks() {
    let report = client(lab())
        .task_states(&workspace(), "rnaseq", None, true)
        .await
        .unwrap();
    let s1 = report.states.get("S1").unwrap();
    assert_eq!(s1.get("quant").map(String::as_str), Some(WAITING_STATE));
    assert_eq!(report.summary["align"]["Done"], 2);
}

fn patch_lab() -> FakePlatform {
    let (s2, d2) = single("sub-2", "S2", 60, "wf-2", "Failed");
    FakePlatform::new()
        .submission(s2, d2)
        .metadata(failed_run())
        .method_config(method_config(
            "broad",
            "rnaseq",
            &[("rnaseq.bam", "this.bam"), ("rnaseq.counts", "this.counts")],
        ))
        .entity(entity(
            "sample",
            "S1",
            json!({"bam": "gs://b/S1.bam", "counts": "gs://b/S1.tsv"}),
        ))
        .entity(entity("sample", "S2", json!({})))
        .entity(entity("sample", "S3", json!({})))
}

#[tokio::test]
async fn test_patch_writes_finished_task_outputs() {
    let platform = Arc::new(patch_lab());
    let client = Client::new(platform.clone(), &fast_config()).unwrap();

    let report = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();

    assert_eq!(report.incomplete, 2);
    assert_eq!(report.repairs.len(), 1);
    assert_eq!(report.repairs[0].entity_id, "S2");
    assert_eq!(report.repairs[0].source, RepairSource::Task("align".to_string()));
    assert_eq!(report.per_task.get("align"), Some(&1));
    assert_eq!(report.written, 1);
    assert!(report.failed_writes.is_empty());
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].id, "S3");

    let writes = platform.written();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "S2");
    assert_eq!(writes[0].1.get("bam"), Some(&json!("gs://b/S2.bam")));
}

#[tokio::test]
async fn test_patch_dry_run_writes_nothing() {
    let platform = Arc::new(patch_lab());
    let client = Client::new(platform.clone(), &fast_config()).unwrap();

    let report = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, true)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.repairs.len(), 1);
    assert_eq!(report.written, 0);
    assert!(platform.written().is_empty());
}

#[tokio::test]
async fn test_patch_reports_rejected_writes() {
    let platform = Arc::new(patch_lab().reject_attribute("bam"));
    let client = Client::new(platform.clone(), &fast_config()).unwrap();

    let report = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(report.failed_writes.len(), 1);
    assert_eq!(report.failed_writes[0].attribute, "bam");
    assert!(report.failed_writes[0].reason.contains("400"));
}

#[tokio::test]
async fn test_patch_requires_entity_outputs() {
    let platform = FakePlatform::new().method_config(method_config(
        "broad",
        "rnaseq",
        &[("rnaseq.report", "workspace.report")],
    ));
    let err = client(platform)
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[tokio::test]
async fn test_patch_with_complete_entities_does_no_lookups() {
    let platform = Arc::new(
        FakePlatform::new()
            .method_config(method_config("broad", "rnaseq", &[("rnaseq.bam", "this.bam")]))
            .entity(entity("sample", "S1", json!({"bam": "gs://b/S1.bam"}))),
    );
    let client = Client::new(platform.clone(), &fast_config()).unwrap();
    let report = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();
    assert_eq!(report.incomplete, 0);
    assert!(report.repairs.is_empty());
    assert_eq!(platform.detail_requests.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_patch_second_run_writes_nothing() {
    let platform = Arc::new(patch_lab());
    let client = Client::new(platform.clone(), &fast_config()).unwrap();

    let first = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();
    assert_eq!(first.written, 1);
    assert_eq!(
        platform.attributes_of(EntityKind::Sample, "S2")["bam"],
        json!("gs://b/S2.bam")
    );

    let second = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();
    assert!(second.repairs.is_empty());
    assert_eq!(second.written, 0);
    assert_eq!(platform.written().len(), 1);
}

#[tokio::test]
async fn test_patch_uses_latest_execution_outputs() {
    let (old, old_detail) = single("sub-100", "S1", 100, "wf-100", "Failed");
    let (new, new_detail) = single("sub-200", "S1", 200, "wf-200", "Succeeded");
    let platform = Arc::new(
        FakePlatform::new()
            .submission(new, new_detail)
            .submission(old, old_detail)
            .metadata(
                workflow("wf-100", "rnaseq", "Failed")
                    .span(100, 160)
                    .call(
                        "rnaseq.align",
                        vec![attempt()
                            .span(100, 140)
                            .status("Done")
                            .output("bam", json!("gs://t100/S1.bam"))
                            .build()],
                    )
                    .build(),
            )
            .metadata(
                workflow("wf-200", "rnaseq", "Succeeded")
                    .span(200, 300)
                    .output("rnaseq.bam", json!("gs://t200/S1.bam"))
                    .output("rnaseq.counts", json!("gs://t200/S1.tsv"))
                    .build(),
            )
            .method_config(method_config(
                "broad",
                "rnaseq",
                &[("rnaseq.bam", "this.bam"), ("rnaseq.counts", "this.counts")],
            ))
            .entity(entity("sample", "S1", json!({"bam": "gs://t200/S1.bam"}))),
    );
    let client = Client::new(platform.clone(), &fast_config()).unwrap();

    let status = client
        .entity_statuses(&workspace(), Some("rnaseq"), Some(EntityKind::Sample))
        .await
        .unwrap();
    assert_eq!(status.resolution.get("S1").unwrap().submission_id, "sub-200");

    let report = client
        .patch(&workspace(), "broad", "rnaseq", EntityKind::Sample, false)
        .await
        .unwrap();
    assert_eq!(report.succeeded_unwritten, 1);
    assert_eq!(report.repairs.len(), 1);
    assert_eq!(report.repairs[0].source, RepairSource::WorkflowOutputs);

    let writes = platform.written();
    assert_eq!(writes.len(), 1);
    assert!(writes.iter().all(|(_, attrs)| !attrs.contains_key("bam")));
    assert_eq!(writes[0].1.get("counts"), Some(&json!("gs://t200/S1.tsv")));
    assert_eq!(
        platform.attributes_of(EntityKind::Sample, "S1"),
        json!({"bam": "gs://t200/S1.bam", "counts": "gs://t200/S1.tsv"})
    );
}

fn polled(status: &str) -> serde_json::Value {
    submission_detail(vec![
        workflow_ref(Some("wf-1"), "Succeeded", None),
        workflow_ref(Some("wf-2"), status, None),
    ])
}

#[tokio::test]
async fn test_wait_until_workflows_finish() {
    let platform = FakePlatform::new().poll_sequence(vec![
        polled("Queued"),
        polled("Running"),
        polled("Failed"),
    ]);
    let outcome = client(platform)
        .wait_for_submission(&workspace(), "sub-1", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.statuses.get(&WorkflowStatus::Failed), Some(&1));
    assert_eq!(outcome.statuses.get(&WorkflowStatus::Succeeded), Some(&1));
}

#[tokio::test]
async fn test_wait_gives_up_after_max_polls() {
    let platform = Arc::new(FakePlatform::new().poll_sequence(vec![polled("Running")]));
    let client = Client::new(platform.clone(), &fast_config()).unwrap();
    let err = client
        .wait_for_submission(&workspace(), "sub-1", Some(3), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::WaitExhausted { polls: 3, .. }));
    assert_eq!(platform.detail_requests.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_stops_when_cancelled() {
    let platform = FakePlatform::new().poll_sequence(vec![polled("Running")]);
    let token = CancellationToken::new();
    token.cancel();
    let err = client(platform)
        .wait_for_submission(&workspace(), "sub-1", None, &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

#[tokio::test]
async fn test_output_history_newest_first() {
    let run = |id: &str, bam: &str| {
        workflow(id, "rnaseq", "Succeeded")
            .output("rnaseq.align.bam", json!(bam))
            .build()
    };
    let (a, da) = single("sub-a", "S1", 0, "wf-a", "Succeeded");
    let (b, db) = single("sub-b", "S1", 60, "wf-b", "Succeeded");
    let (c, dc) = single("sub-c", "S1", 90, "wf-c", "Failed");
    let (d, dd) = single("sub-d", "S2", 120, "wf-d", "Succeeded");
    let platform = FakePlatform::new()
        .submission(a, da)
        .submission(b, db)
        .submission(c, dc)
        .submission(d, dd)
        .metadata(run("wf-a", "gs://a/S1.bam"))
        .metadata(run("wf-b", "gs://b/S1.bam"));

    let history = client(platform)
        .output_history(&workspace(), "rnaseq", "S1")
        .await
        .unwrap();

    let ids: Vec<&str> = history.runs.iter().map(|r| r.submission_id.as_str()).collect();
    assert_eq!(ids, vec!["sub-b", "sub-a"]);
    assert_eq!(history.runs[0].outputs.get("align_bam"), Some(&json!("gs://b/S1.bam")));
    assert!(history.skipped.is_empty());
}

#[tokio::test]
async fn test_submissions_filter_and_order() {
    let client = client(lab());
    let all = client
        .submissions(&workspace(), &SubmissionFilter::default())
        .await
        .unwrap();
    assert_eq!(all[0].submission_id, "sub-9");

    let filter = SubmissionFilter {
        configuration: Some("rnaseq".to_string()),
        entity: Some("S2".to_string()),
        ..Default::default()
    };
    let ids: Vec<String> = client
        .submissions(&workspace(), &filter)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.submission_id)
        .collect();
    assert_eq!(ids, vec!["sub-2".to_string(), "sub-0".to_string()]);
}

#[tokio::test]
async fn test_progress_events() {
    let (tx, rx) = mpsc::channel();
    let client = client(lab()).with_events(tx);
    client.stats(&workspace(), "rnaseq").await.unwrap();
    drop(client);

    let events: Vec<ClientEvent> = rx.iter().collect();
    assert_eq!(events[0], ClientEvent::FetchingSubmissions { total: 4 });
    let fetched = events
        .iter()
        .filter(|e| matches!(e, ClientEvent::SubmissionFetched))
        .count();
    assert_eq!(fetched, 4);
    assert!(events.contains(&ClientEvent::FetchingMetadata { total: 1 }));
    assert!(events.contains(&ClientEvent::MetadataFetched {
        entity_id: "S1".to_string()
    }));
}
