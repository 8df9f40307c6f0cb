// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use devenv_core::application::{
    LifecycleError, LifecycleOrchestrator, PollObserver, PollOutcome, PollSample, PollerSettings,
};
use devenv_core::domain::config::{DevEnvConfigManifest, StackConfig};
use devenv_core::domain::stack::{StackName, StackOutputs};
use devenv_core::infrastructure::provisioning::{self, InMemoryProvisioningClient};
use devenv_core::domain::provisioning::ProvisioningClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct RecordingObserver {
    progress: Mutex<Vec<(u64, String)>>,
    deleted: Mutex<Option<PollOutcome>>,
}

#[async_trait]
impl PollObserver for RecordingObserver {
    async fn on_progress(&self, sample: &PollSample) {
        self.progress
            .lock()
            .await
            .push((sample.elapsed.as_secs(), sample.status.clone()));
    }

    async fn on_deleted(&self, outcome: &PollOutcome) {
        *self.deleted.lock().await = Some(outcome.clone());
    }
}

fn stack_config() -> StackConfig {
    StackConfig {
        template: Some("s3://devenv-templates/devenv.yaml".to_string()),
        key_name: Some("ops-key".to_string()),
        ..StackConfig::default()
    }
}

fn seeded_outputs() -> StackOutputs {
    [("Address", "10.1.2.3")].into_iter().collect()
}

#[tokio::test(start_paused = true)]
async fn test_destroy_completes_at_third_poll_after_thirty_seconds() {
    let client = Arc::new(
        InMemoryProvisioningClient::new()
            .with_deletion_polls(3)
            .with_stack("dev1", seeded_outputs()),
    );
    let orchestrator = LifecycleOrchestrator::new(client.clone(), stack_config(), PollerSettings::default());
    let observer = RecordingObserver::default();
    let name = StackName::new("dev1").unwrap();

    let report = orchestrator.destroy(&name, &observer).await.unwrap();

    let progress = observer.progress.lock().await.clone();
    assert_eq!(
        progress,
        vec![
            (10, "DELETE_IN_PROGRESS".to_string()),
            (20, "DELETE_IN_PROGRESS".to_string()),
        ]
    );
    assert_eq!(report.polls, 3);
    assert_eq!(report.elapsed.as_secs(), 30);
    assert!(observer.deleted.lock().await.is_some());
    assert!(!client.contains("dev1").await);
}

#[tokio::test(start_paused = true)]
async fn test_glass_recreates_stack_with_fresh_outputs() {
    let client = Arc::new(InMemoryProvisioningClient::new().with_stack("dev1", seeded_outputs()));
    let orchestrator = LifecycleOrchestrator::new(client.clone(), stack_config(), PollerSettings::default());
    let name = StackName::new("dev1").unwrap();

    let report = orchestrator.glass(&name, &RecordingObserver::default()).await.unwrap();

    assert_eq!(report.destroy.polls, 3);
    let stacks = client.list_stacks().await.unwrap();
    assert_eq!(stacks.len(), 1);
    assert_eq!(stacks[0].status, "CREATE_COMPLETE");

    let outputs = client.stack_outputs(&name).await.unwrap();
    assert_eq!(outputs.get("Address"), Some("dev1.devenv.internal"));
}

#[tokio::test(start_paused = true)]
async fn test_destroy_times_out_when_stack_never_disappears() {
    let client = Arc::new(
        InMemoryProvisioningClient::new()
            .with_deletion_polls(u32::MAX)
            .with_stack("dev1", seeded_outputs()),
    );
    let settings = PollerSettings {
        interval: Duration::from_secs(10),
        timeout: Duration::from_secs(60),
        max_consecutive_unknown: 3,
    };
    let orchestrator = LifecycleOrchestrator::new(client, stack_config(), settings);
    let name = StackName::new("dev1").unwrap();

    let err = orchestrator
        .glass(&name, &RecordingObserver::default())
        .await
        .unwrap_err();

    match err {
        LifecycleError::DestroyTimedOut { attempts, last_status, .. } => {
            assert_eq!(attempts, 5);
            assert_eq!(last_status.as_deref(), Some("DELETE_IN_PROGRESS"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_config_file_drives_in_memory_provider() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devenv-config.yaml");
    std::fs::write(
        &path,
        r#"
apiVersion: devenv/v1
kind: DevEnvConfig
metadata:
  name: ci
spec:
  provider:
    type: in-memory
  stack:
    name: review-app
    template: file://devenv.yaml
  lifecycle:
    poll_interval: 5s
    destroy_timeout: 1m
"#,
    )
    .unwrap();

    let config = DevEnvConfigManifest::from_yaml_file(&path).unwrap();
    config.validate().unwrap();

    let client = provisioning::from_config(&config.spec.provider).unwrap();
    let orchestrator = LifecycleOrchestrator::new(
        client.clone(),
        config.spec.stack.clone(),
        PollerSettings::from(&config.spec.lifecycle),
    );
    let name = config.default_stack_name().unwrap();

    // Glass on a stack that does not exist yet: deletion is a no-op, then create.
    let report = orchestrator.glass(&name, &RecordingObserver::default()).await.unwrap();

    assert_eq!(report.destroy.polls, 1);
    assert_eq!(client.describe_stack(&name).await.unwrap().status, "CREATE_COMPLETE");
}
