use std::time::Duration;

use bytesize::ByteSize;
use diskstress::config::WorkerCounts;
use diskstress::{Config, StopReason, StopSignal};
use diskstress_test::workspace::TestDir;

fn small_config(dir: &TestDir, duration: Duration) -> Config {
    let mut config = Config {
        work_dir: dir.work_dir(),
        duration,
        grace_period: Duration::from_secs(2),
        workers: WorkerCounts {
            writers: 2,
            readers: 1,
            random_io: 1,
        },
        ..Default::default()
    };
    config.writer.file_size = ByteSize::mib(1);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_basic() {
    diskstress_test::tracing::init();
    let dir = TestDir::new();
    let config = small_config(&dir, Duration::from_secs(5));

    let report = diskstress::run_until_stopped(config, StopSignal::new())
        .await
        .expect("Failed to run stress test");

    let counters = report.counters;
    assert_eq!(report.stop_reason, StopReason::Deadline);
    assert!(counters.bytes_written > 0);
    assert!(counters.files_created > 0);
    assert!(counters.files_created >= counters.files_deleted);
    assert!(report.run_time >= Duration::from_secs(5));
    assert!(report.total_time >= report.run_time);

    // Every worker has been reaped and the workspace is gone.
    assert_eq!(report.shutdown.voluntary.len() + report.shutdown.forced.len(), 4);
    assert!(!dir.work_dir().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_external_stop_ends_run_early() {
    diskstress_test::tracing::init();
    let dir = TestDir::new();
    let config = small_config(&dir, Duration::from_secs(600));
    let stop = StopSignal::new();

    let trigger = {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            stop.trigger(StopReason::Interrupt)
        })
    };

    let report = diskstress::run_until_stopped(config, stop).await.unwrap();

    assert!(trigger.await.unwrap());
    assert_eq!(report.stop_reason, StopReason::Interrupt);
    assert!(report.run_time < Duration::from_secs(60));
    assert!(!dir.work_dir().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interrupt_racing_deadline_stops_once() {
    diskstress_test::tracing::init();
    let dir = TestDir::new();
    let config = small_config(&dir, Duration::from_secs(1));
    let stop = StopSignal::new();

    let trigger = {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stop.trigger(StopReason::Interrupt)
        })
    };

    let report = diskstress::run_until_stopped(config, stop.clone())
        .await
        .unwrap();
    let interrupt_won = trigger.await.unwrap();

    // Exactly one of the two triggers set the signal, and the report names the winner.
    let expected = if interrupt_won {
        StopReason::Interrupt
    } else {
        StopReason::Deadline
    };
    assert_eq!(report.stop_reason, expected);
    assert_eq!(stop.reason(), Some(expected));
    assert!(!stop.trigger(StopReason::Terminate));
    assert!(!dir.work_dir().exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stale_files_are_purged() {
    let dir = TestDir::new();
    std::fs::create_dir(dir.work_dir()).unwrap();
    std::fs::write(dir.work_dir().join("writer_9_1_0.dat"), vec![0; 1 << 20]).unwrap();

    let mut config = small_config(&dir, Duration::from_secs(1));
    config.workers = WorkerCounts {
        writers: 0,
        readers: 1,
        random_io: 0,
    };

    let report = diskstress::run_until_stopped(config, StopSignal::new())
        .await
        .unwrap();

    // The only reader had nothing to read, since the stale writer file was purged first.
    assert_eq!(report.counters.bytes_read, 0);
    assert!(!dir.work_dir().exists());
}
