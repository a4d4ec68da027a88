//! Collector loop behavior against a scripted listing source

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use connwatch_core::config::{ExporterConfig, OutputTarget};
use connwatch_core::monitoring::{
    CollectorEvent, CommandVariant, MetricStyle, SampleError, Tally, start_collector,
};
use tokio::sync::mpsc;

const TICK: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

fn netstat_line(remote_port: u16, state: &str) -> String {
    format!("tcp        0      0 127.0.0.1:40000    127.0.0.1:{remote_port}    {state}\n")
}

fn listing_failure() -> SampleError {
    SampleError::CommandFailed {
        program: "netstat".to_string(),
        reason: "exited with exit status: 1".to_string(),
    }
}

fn file_config(path: &Path) -> ExporterConfig {
    ExporterConfig::default()
        .with_poll_interval(TICK)
        .with_output(OutputTarget::File(path.to_path_buf()))
}

async fn next_tick(events: &mut mpsc::Receiver<CollectorEvent>) -> (Tally, bool) {
    match tokio::time::timeout(WAIT, events.recv()).await {
        Ok(Some(CollectorEvent::Tick { tally, emitted })) => (tally, emitted),
        other => panic!("expected a tick event, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_listing_publishes_minus_one_and_keeps_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tcp_connections.prom");

    let (handle, mut events) = start_collector(file_config(&path), || async {
        Err::<String, _>(listing_failure())
    });

    for _ in 0..3 {
        let (tally, emitted) = next_tick(&mut events).await;
        assert_eq!(tally, Tally::Unavailable);
        assert!(emitted);
    }
    assert!(!handle.is_finished());
    handle.stop().await;

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("# TYPE tcp_connections gauge"));
    assert!(text.ends_with("tcp_connections{port=\"8500\"} -1\n"));
}

#[tokio::test]
async fn unwritable_target_is_retried_on_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("tcp_connections.prom");
    let line = netstat_line(8500, "ESTABLISHED");

    let (handle, mut events) = start_collector(file_config(&path), move || {
        let output = line.clone();
        async move { Ok(output) }
    });

    for _ in 0..2 {
        let (tally, emitted) = next_tick(&mut events).await;
        assert_eq!(tally, Tally::Count(1));
        assert!(!emitted);
    }

    // Creating the directory lets a later tick succeed
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut recovered = false;
    for _ in 0..50 {
        let (_, emitted) = next_tick(&mut events).await;
        if emitted {
            recovered = true;
            break;
        }
    }
    handle.stop().await;

    assert!(recovered);
    assert!(fs::read_to_string(&path).unwrap().contains("} 1\n"));
}

#[tokio::test]
async fn each_tick_counts_its_own_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tcp_connections.prom");
    let calls = Arc::new(AtomicUsize::new(0));

    let exec_calls = Arc::clone(&calls);
    let (handle, mut events) = start_collector(file_config(&path), move || {
        let n = exec_calls.fetch_add(1, Ordering::SeqCst);
        let output = match n {
            0 => netstat_line(8500, "ESTABLISHED").repeat(3),
            1 => netstat_line(8500, "TIME_WAIT").repeat(3),
            _ => netstat_line(8500, "CLOSE_WAIT"),
        };
        async move { Ok(output) }
    });

    assert_eq!(next_tick(&mut events).await.0, Tally::Count(3));
    assert_eq!(next_tick(&mut events).await.0, Tally::Count(0));
    assert_eq!(next_tick(&mut events).await.0, Tally::Count(1));
    handle.stop().await;

    assert!(calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn ss_layout_and_name_suffix_style() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consul.prom");
    let config = file_config(&path)
        .with_target_port(9000)
        .with_command(CommandVariant::Ss)
        .with_metric_name("consul_connections")
        .with_metric_style(MetricStyle::PortInName);

    let (handle, mut events) = start_collector(config, || async {
        Ok("State Recv-Q Send-Q Local Peer\n\
            ESTAB 0 0 10.0.0.1:443 10.0.0.2:9000\n\
            SYN-SENT 0 1 10.0.0.1:444 10.0.0.2:9000\n"
            .to_string())
    });

    let (tally, emitted) = next_tick(&mut events).await;
    handle.stop().await;

    assert_eq!(tally, Tally::Count(1));
    assert!(emitted);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "# HELP consul_connections_9000 Number of open TCP connections on port 9000\n\
         # TYPE consul_connections_9000 gauge\n\
         consul_connections_9000 1\n"
    );
}

#[tokio::test]
async fn dropping_receiver_does_not_stop_collector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tcp_connections.prom");
    let calls = Arc::new(AtomicUsize::new(0));

    let exec_calls = Arc::clone(&calls);
    let (handle, events) = start_collector(file_config(&path), move || {
        exec_calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(String::new()) }
    });
    drop(events);

    let deadline = tokio::time::Instant::now() + WAIT;
    while calls.load(Ordering::SeqCst) < 3 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(TICK).await;
    }
    assert!(!handle.is_finished());
    handle.stop().await;

    assert!(calls.load(Ordering::SeqCst) >= 3);
    assert!(fs::read_to_string(&path).unwrap().ends_with(" 0\n"));
}
