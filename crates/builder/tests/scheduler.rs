//! Scheduler behavior against a scripted in-memory runtime.

use async_trait::async_trait;
use kiln_builder::BuildScheduler;
use kiln_core::{BuildConfig, ImageRef, RegistryConfig};
use kiln_graph::{ImageGraph, ImageNode, select_matches};
use kiln_runtime::{BuildOutput, BuildRequest, ContainerRuntime, PushOutput, PushStatus};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runtime fake that records every call and fails or delays on request.
#[derive(Default)]
struct FakeRuntime {
    events: Mutex<Vec<String>>,
    fail_builds: HashSet<String>,
    fail_pushes: HashSet<String>,
    existing_pushes: HashSet<String>,
    build_delay: Duration,
}

impl FakeRuntime {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn short_name(tag: &str) -> String {
        tag.parse::<ImageRef>().unwrap().name
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn build(
        &self,
        request: &BuildRequest,
        _cancel: &CancellationToken,
    ) -> kiln_runtime::Result<BuildOutput> {
        let name = Self::short_name(&request.tag);
        self.record(format!("build-start:{name}"));
        if !self.build_delay.is_zero() {
            tokio::time::sleep(self.build_delay).await;
        }
        let success = !self.fail_builds.contains(&name);
        self.record(format!("build-end:{name}"));
        Ok(BuildOutput {
            success,
            exit_code: i32::from(!success),
        })
    }

    async fn push(
        &self,
        tag: &str,
        _cancel: &CancellationToken,
    ) -> kiln_runtime::Result<PushOutput> {
        let name = Self::short_name(tag);
        self.record(format!("push:{name}"));
        let status = if self.fail_pushes.contains(&name) {
            PushStatus::Failed
        } else if self.existing_pushes.contains(&name) {
            PushStatus::AlreadyExists
        } else {
            PushStatus::Pushed
        };
        Ok(PushOutput {
            status,
            exit_code: i32::from(status == PushStatus::Failed),
        })
    }

    async fn login(&self, registry: &RegistryConfig) -> kiln_runtime::Result<()> {
        self.record(format!("login:{}", registry.address));
        Ok(())
    }

    async fn list_local_images(&self) -> kiln_runtime::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// base <- mid <- leaf
fn chain() -> ImageGraph {
    let mut graph = ImageGraph::new();
    for (name, base) in [
        ("base", None),
        ("mid", Some("acme/base")),
        ("leaf", Some("acme/mid")),
    ] {
        graph
            .insert(ImageNode::new(
                name,
                format!("acme/{name}:dev"),
                format!("/tmp/{name}/Dockerfile"),
                format!("/tmp/{name}"),
                base.map(|b| b.parse().unwrap()),
            ))
            .unwrap();
    }
    graph.link_parents("acme").unwrap();
    graph
}

fn config() -> BuildConfig {
    BuildConfig {
        namespace: "acme".to_string(),
        tag: "dev".to_string(),
        workers: 2,
        ..Default::default()
    }
}

fn position(events: &[String], needle: &str) -> usize {
    events
        .iter()
        .position(|event| event == needle)
        .unwrap_or_else(|| panic!("event '{needle}' missing from {events:?}"))
}

#[tokio::test]
async fn backfilled_ancestors_build_in_dependency_order() {
    let mut graph = chain();
    select_matches(&mut graph, &["leaf".to_string()], &HashSet::new(), true).unwrap();
    assert_eq!(graph.matched_names(), vec!["base", "mid", "leaf"]);

    let runtime = Arc::new(FakeRuntime::default());
    let scheduler = BuildScheduler::new(config(), runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.success());
    assert_eq!(summary.build_succeeded, vec!["base", "mid", "leaf"]);

    // A node starts only after its parent reached a terminal state.
    let events = runtime.events();
    assert!(position(&events, "build-end:base") < position(&events, "build-start:mid"));
    assert!(position(&events, "build-end:mid") < position(&events, "build-start:leaf"));
}

#[tokio::test]
async fn failed_build_blocks_its_subtree() {
    let mut graph = chain();
    select_matches(&mut graph, &[], &HashSet::new(), true).unwrap();

    let runtime = Arc::new(FakeRuntime {
        fail_builds: ["base".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config(), runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!summary.success());
    assert_eq!(summary.build_failed, vec!["base"]);
    assert!(summary.build_succeeded.is_empty());

    let events = runtime.events();
    assert!(!events.iter().any(|e| e.contains("mid")));
    assert!(!events.iter().any(|e| e.contains("leaf")));
}

#[tokio::test]
async fn failure_does_not_cascade_to_siblings() {
    // base <- good, base <- bad; bad's failure must not block good.
    let mut graph = ImageGraph::new();
    for (name, base) in [
        ("base", None),
        ("bad", Some("acme/base")),
        ("good", Some("acme/base")),
    ] {
        graph
            .insert(ImageNode::new(
                name,
                format!("acme/{name}:dev"),
                format!("/tmp/{name}/Dockerfile"),
                format!("/tmp/{name}"),
                base.map(|b| b.parse().unwrap()),
            ))
            .unwrap();
    }
    graph.link_parents("acme").unwrap();
    select_matches(&mut graph, &[], &HashSet::new(), true).unwrap();

    let runtime = Arc::new(FakeRuntime {
        fail_builds: ["bad".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config(), runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.build_failed, vec!["bad"]);
    assert_eq!(summary.build_succeeded, vec!["base", "good"]);
}

#[tokio::test]
async fn ready_descendants_are_rebuilt_when_cascade_is_on() {
    let mut graph = chain();
    let ready: HashSet<String> = ["mid".to_string()].into_iter().collect();
    select_matches(&mut graph, &["base".to_string()], &ready, true).unwrap();
    assert_eq!(graph.matched_names(), vec!["base"]);

    let runtime = Arc::new(FakeRuntime::default());
    let scheduler = BuildScheduler::new(config(), runtime.clone());
    let summary = scheduler
        .run(&graph, &ready, &CancellationToken::new())
        .await
        .unwrap();

    // mid was never requested but is ready and its parent was rebuilt.
    assert_eq!(summary.build_succeeded, vec!["base", "mid"]);

    let events = runtime.events();
    assert!(position(&events, "build-end:base") < position(&events, "build-start:mid"));
    // leaf is neither matched nor ready.
    assert!(!events.iter().any(|e| e.contains("leaf")));
    // mid was submitted exactly once.
    assert_eq!(
        events.iter().filter(|e| *e == "build-start:mid").count(),
        1
    );
}

#[tokio::test]
async fn ready_descendants_stay_untouched_when_cascade_is_off() {
    let mut graph = chain();
    let ready: HashSet<String> = ["mid".to_string()].into_iter().collect();
    select_matches(&mut graph, &["base".to_string()], &ready, true).unwrap();

    let mut config = config();
    config.cascade_descendants = false;
    let runtime = Arc::new(FakeRuntime::default());
    let scheduler = BuildScheduler::new(config, runtime.clone());
    let summary = scheduler
        .run(&graph, &ready, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.build_succeeded, vec!["base"]);
    assert!(!runtime.events().iter().any(|e| e.contains("mid")));
}

#[tokio::test]
async fn existing_layers_are_a_non_failing_push_outcome() {
    let mut graph = chain();
    select_matches(&mut graph, &[], &HashSet::new(), true).unwrap();

    let mut config = config();
    config.push = true;
    config.registry = Some(RegistryConfig {
        address: "registry.example.com:5000".to_string(),
        username: None,
        password: None,
        insecure: false,
    });

    let runtime = Arc::new(FakeRuntime {
        existing_pushes: ["base".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config, runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.success());
    assert_eq!(summary.push_exists, vec!["base"]);
    assert_eq!(summary.push_succeeded, vec!["leaf", "mid"]);

    // Login happens once, before any push.
    let events = runtime.events();
    assert_eq!(events[0], "login:registry.example.com:5000");
}

#[tokio::test]
async fn push_failure_does_not_block_children() {
    let mut graph = chain();
    select_matches(&mut graph, &[], &HashSet::new(), true).unwrap();

    let mut config = config();
    config.push = true;
    let runtime = Arc::new(FakeRuntime {
        fail_pushes: ["mid".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config, runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    // mid's push failed but its build succeeded; leaf still builds.
    assert!(!summary.success());
    assert_eq!(summary.push_failed, vec!["mid"]);
    assert_eq!(summary.build_succeeded, vec!["base", "leaf", "mid"]);
}

#[tokio::test]
async fn failed_build_records_an_automatic_push_failure() {
    let mut graph = chain();
    select_matches(&mut graph, &["base".to_string()], &HashSet::new(), true).unwrap();

    let mut config = config();
    config.push = true;
    let runtime = Arc::new(FakeRuntime {
        fail_builds: ["base".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config, runtime.clone());
    let summary = scheduler
        .run(&graph, &HashSet::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.build_failed, vec!["base"]);
    assert_eq!(summary.push_failed, vec!["base"]);
    // No push call reached the runtime.
    assert!(!runtime.events().iter().any(|e| e.starts_with("push:")));
}

#[tokio::test]
async fn interruption_stops_new_submissions_but_reports_finished_work() {
    let mut graph = chain();
    select_matches(&mut graph, &[], &HashSet::new(), true).unwrap();

    let mut config = config();
    config.workers = 1;
    let runtime = Arc::new(FakeRuntime {
        build_delay: Duration::from_millis(150),
        ..Default::default()
    });
    let scheduler = BuildScheduler::new(config, runtime.clone());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let summary = scheduler.run(&graph, &HashSet::new(), &cancel).await.unwrap();

    // base was in flight when the flag fired and was allowed to finish;
    // mid and leaf were never submitted.
    assert!(summary.interrupted);
    assert!(!summary.success());
    assert_eq!(summary.build_succeeded, vec!["base"]);
    assert!(summary.build_failed.is_empty());

    let events = runtime.events();
    assert!(events.contains(&"build-end:base".to_string()));
    assert!(!events.iter().any(|e| e.contains("mid")));
}
