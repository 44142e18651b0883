//! Integration tests for the topic router

use procmon::prelude::*;
use procmon::StoreCounts;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_procmon(router: RouterConfig) -> (Procmon, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = ProcmonConfig {
        store: StoreConfig::new(temp_dir.path().join("state.db")),
        router,
    };
    let procmon = Procmon::open(config).unwrap();
    (procmon, temp_dir)
}

fn envelope(value_type: &str, intent: &str, key: i64, position: i64, value: &str) -> Vec<u8> {
    format!(
        r#"{{"valueType":"{value_type}","intent":"{intent}","recordType":"EVENT","partitionId":1,"key":{key},"position":{position},"timestamp":1700000000000,"value":{value}}}"#
    )
    .into_bytes()
}

fn job(intent: &str, key: i64, position: i64) -> Vec<u8> {
    envelope(
        "JOB",
        intent,
        key,
        position,
        r#"{"type":"payment","elementId":"charge","processInstanceKey":100,"retries":3,"worker":"w1"}"#,
    )
}

fn variable(name: &str, position: i64) -> Vec<u8> {
    envelope(
        "VARIABLE",
        "CREATED",
        position,
        position,
        &format!(r#"{{"name":"{name}","value":"1","processInstanceKey":100}}"#),
    )
}

/// Poll the store until `check` holds, failing after five seconds.
async fn wait_for(procmon: &Procmon, check: impl Fn(&StoreCounts) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let counts = procmon.store().counts().unwrap();
        if check(&counts) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out, last counts: {counts:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn append_line(path: &Path, line: &[u8]) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(line).unwrap();
    file.write_all(b"\n").unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_all_workers() {
    let (procmon, _temp) = create_test_procmon(RouterConfig::default());
    let source = Arc::new(ChannelSource::new());
    let senders: Vec<_> = Topic::ALL
        .iter()
        .map(|t| source.sender(*t).unwrap())
        .collect();

    let router = procmon.start(source.clone()).await.unwrap();
    assert_eq!(router.topics().len(), 6);

    let handle = router.shutdown_handle();
    assert!(!handle.is_shutdown());
    handle.shutdown();

    let stats = tokio::time::timeout(Duration::from_secs(5), router.join())
        .await
        .expect("workers did not exit after shutdown")
        .unwrap();

    assert_eq!(stats.topics.len(), 6);
    assert_eq!(stats.total(), WorkerStats::default());
    // Workers closed their receivers on exit
    assert!(senders.iter().all(|tx| tx.is_closed()));
}

#[tokio::test]
async fn test_shutdown_does_not_drain_buffered_messages() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Job]));
    let source = Arc::new(ChannelSource::new());
    let tx = source.sender(Topic::Job).unwrap();

    let router = procmon.start(source).await.unwrap();
    router.shutdown();
    // Either buffered or refused once the worker has closed its receiver
    let _ = tx.try_send(job("CREATED", 5, 1));

    let stats = tokio::time::timeout(Duration::from_secs(5), router.join())
        .await
        .expect("worker did not exit after shutdown")
        .unwrap();

    assert_eq!(stats.get(Topic::Job).received, 0);
    assert!(procmon.store().job(5).unwrap().is_none());
}

#[tokio::test]
async fn test_end_of_stream_ends_worker() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Job]));
    let source = Arc::new(ChannelSource::new());
    let tx = source.sender(Topic::Job).unwrap();

    let router = procmon.start(source).await.unwrap();
    tx.send(job("CREATED", 1, 1)).await.unwrap();
    drop(tx);

    let stats = tokio::time::timeout(Duration::from_secs(5), router.join())
        .await
        .expect("worker did not exit at end of stream")
        .unwrap();

    assert_eq!(stats.get(Topic::Job).applied, 1);
    assert!(procmon.store().job(1).unwrap().is_some());
}

#[tokio::test]
async fn test_store_failure_does_not_stop_worker() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Job]));
    let source = Arc::new(ChannelSource::new());
    let tx = source.sender(Topic::Job).unwrap();

    let router = procmon.start(source).await.unwrap();
    // Update of a job that was never created fails with NotFound
    tx.send(job("COMPLETED", 7, 1)).await.unwrap();
    tx.send(job("CREATED", 8, 2)).await.unwrap();
    tx.send(job("COMPLETED", 8, 3)).await.unwrap();
    drop(tx);

    let stats = router.join().await.unwrap().get(Topic::Job);

    assert_eq!(stats.received, 3);
    assert_eq!(stats.dispatch_failures, 1);
    assert_eq!(stats.applied, 2);
    assert!(procmon.store().job(7).unwrap().is_none());
    assert_eq!(procmon.store().job(8).unwrap().unwrap().state, "COMPLETED");
}

#[tokio::test]
async fn test_undecodable_messages_are_counted_and_skipped() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Variable]));
    let source = Arc::new(ChannelSource::new());
    let tx = source.sender(Topic::Variable).unwrap();

    let router = procmon.start(source).await.unwrap();
    tx.send(b"{not json".to_vec()).await.unwrap();
    tx.send(
        br#"{"intent":"CREATED","recordType":"EVENT","partitionId":1,"key":1,"position":1,"timestamp":1,"value":{}}"#
            .to_vec(),
    )
    .await
    .unwrap();
    tx.send(variable("amount", 3)).await.unwrap();
    drop(tx);

    let stats = router.join().await.unwrap().get(Topic::Variable);

    assert_eq!(stats.received, 3);
    assert_eq!(stats.decode_failures, 2);
    assert_eq!(stats.applied, 1);
    assert!(procmon.store().variable(100, "amount").unwrap().is_some());
}

#[tokio::test]
async fn test_topics_progress_independently() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Job, Topic::Variable]));
    let source = Arc::new(ChannelSource::new());
    let jobs = source.sender(Topic::Job).unwrap();
    let variables = source.sender(Topic::Variable).unwrap();

    let router = procmon.start(source).await.unwrap();

    // The job topic stays idle while the variable topic makes progress
    for i in 0..5 {
        variables.send(variable(&format!("v{i}"), i)).await.unwrap();
    }
    wait_for(&procmon, |c| c.variables == 5).await;
    assert_eq!(procmon.store().counts().unwrap().jobs, 0);

    jobs.send(job("CREATED", 1, 1)).await.unwrap();
    wait_for(&procmon, |c| c.jobs == 1).await;

    let stats = router.shutdown_and_join().await.unwrap();
    assert_eq!(stats.get(Topic::Variable).applied, 5);
    assert_eq!(stats.get(Topic::Job).applied, 1);
}

#[tokio::test]
async fn test_start_fails_for_unopenable_topic() {
    let (procmon, _temp) =
        create_test_procmon(RouterConfig::default().with_topics([Topic::Job, Topic::Incident]));
    let source = Arc::new(ChannelSource::new());
    let jobs = source.sender(Topic::Job).unwrap();

    // No sender was created for the incident topic
    let result = procmon.start(source).await;
    assert!(matches!(result, Err(ProcmonError::Stream(_))));

    // The job worker that was already spawned has been stopped
    tokio::time::timeout(Duration::from_secs(5), async {
        while !jobs.is_closed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job worker kept running");
}

#[tokio::test]
async fn test_latest_skips_existing_file_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("topics");
    std::fs::create_dir_all(&input).unwrap();
    let path = input.join("variable.ndjson");
    append_line(&path, &variable("before", 1));

    let (procmon, _db) = create_test_procmon(
        RouterConfig::default()
            .with_topics([Topic::Variable])
            .with_start_position(StartPosition::Latest)
            .with_poll_interval_ms(5),
    );
    let router = procmon
        .start(Arc::new(FileSource::new(&input)))
        .await
        .unwrap();

    append_line(&path, &variable("after", 2));
    wait_for(&procmon, |c| c.variables == 1).await;

    let stats = router.shutdown_and_join().await.unwrap();
    assert_eq!(stats.get(Topic::Variable).received, 1);
    assert!(procmon.store().variable(100, "before").unwrap().is_none());
    assert!(procmon.store().variable(100, "after").unwrap().is_some());
}

#[tokio::test]
async fn test_earliest_reads_existing_file_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("zeebe-variable.ndjson");
    append_line(&path, &variable("before", 1));

    let (procmon, _db) = create_test_procmon(
        RouterConfig::default()
            .with_topics([Topic::Variable])
            .with_topic_prefix("zeebe-")
            .with_start_position(StartPosition::Earliest)
            .with_poll_interval_ms(5),
    );
    let router = procmon
        .start(Arc::new(FileSource::new(temp_dir.path())))
        .await
        .unwrap();

    append_line(&path, &variable("after", 2));
    wait_for(&procmon, |c| c.variables == 2).await;

    let stats = router.shutdown_and_join().await.unwrap();
    assert_eq!(stats.get(Topic::Variable).received, 2);
}

#[tokio::test]
async fn test_instance_lifecycle_end_to_end() {
    let (procmon, _temp) = create_test_procmon(
        RouterConfig::default().with_topics([Topic::Deployment, Topic::ProcessInstance]),
    );
    let source = Arc::new(ChannelSource::new());
    let deployments = source.sender(Topic::Deployment).unwrap();
    let instances = source.sender(Topic::ProcessInstance).unwrap();
    let router = procmon.start(source).await.unwrap();

    deployments
        .send(envelope(
            "DEPLOYMENT",
            "CREATED",
            1,
            1,
            r#"{"resources":[{"resourceName":"order.bpmn","resource":"PGJwbW4vPg=="}],
                "processesMetadata":[{"bpmnProcessId":"order","version":1,
                "processDefinitionKey":7,"resourceName":"order.bpmn"}]}"#,
        ))
        .await
        .unwrap();

    let element = |intent: &str, element_type: &str, position: i64| {
        envelope(
            "PROCESS_INSTANCE",
            intent,
            100,
            position,
            &format!(
                r#"{{"bpmnProcessId":"order","version":1,"processDefinitionKey":7,
                    "processInstanceKey":100,"elementId":"order","bpmnElementType":"{element_type}"}}"#
            ),
        )
    };
    instances.send(element("ELEMENT_ACTIVATING", "PROCESS", 10)).await.unwrap();
    instances.send(element("ELEMENT_ACTIVATED", "PROCESS", 11)).await.unwrap();
    instances.send(element("ELEMENT_ACTIVATED", "START_EVENT", 12)).await.unwrap();
    instances.send(element("ELEMENT_COMPLETED", "PROCESS", 13)).await.unwrap();
    drop(deployments);
    drop(instances);

    let stats = router.join().await.unwrap();
    assert_eq!(stats.total().dispatch_failures, 0);

    let store = procmon.store();
    assert!(store.process(7).unwrap().is_some());
    let instance = store.instance(100).unwrap().unwrap();
    assert_eq!(instance.status, procmon::InstanceStatus::Completed);
    assert_eq!(store.audit_log(100).unwrap().len(), 4);

    let counts = store.counts().unwrap();
    assert_eq!(counts.active_instances, 0);
    assert_eq!(counts.audit_log, 4);
}
