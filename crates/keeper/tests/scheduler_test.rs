use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use keeper::{Scheduler, stop_after};
use keeper::cloud::{ComputeApi, ComputeError};
use keeper::{InstancePage, Operation};
use mockall::mock;

mock! {
    Compute {}

    #[async_trait]
    impl ComputeApi for Compute {
        async fn list_instances(
            &self,
            page_size: u32,
            page_token: Option<String>,
        ) -> Result<InstancePage, ComputeError>;
        async fn start_instance(&self, instance_id: &str) -> Result<Operation, ComputeError>;
        async fn stop_instance(&self, instance_id: &str) -> Result<Operation, ComputeError>;
    }
}

fn counting(result: fn() -> Result<InstancePage, ComputeError>) -> (MockCompute, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut compute = MockCompute::new();
    compute
        .expect_list_instances()
        .withf(|size, _| *size == 25)
        .returning(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            result()
        });
    (compute, calls)
}

#[tokio::test(start_paused = true)]
async fn runs_once_per_interval() {
    let (compute, calls) = counting(|| Ok(InstancePage::default()));
    let scheduler = Scheduler::spawn(Arc::new(compute), Duration::from_secs(60), 25);

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn keeps_running_after_failures() {
    let (compute, calls) = counting(|| {
        Err(ComputeError::Status {
            status: 503,
            body: "unavailable".to_owned(),
        })
    });
    let scheduler = Scheduler::spawn(Arc::new(compute), Duration::from_secs(10), 25);

    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    let (compute, calls) = counting(|| Ok(InstancePage::default()));
    let scheduler = Scheduler::spawn(Arc::new(compute), Duration::from_secs(60), 25);

    scheduler.shutdown().await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_work_still_stops_the_loop() {
    let (compute, calls) = counting(|| Ok(InstancePage::default()));
    let scheduler = Scheduler::spawn(Arc::new(compute), Duration::from_secs(60), 25);

    let result = stop_after(Some(scheduler), async { Err::<(), _>("listener closed") }).await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(result, Err("listener closed"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stop_after_without_scheduler_returns_output() {
    assert_eq!(stop_after(None, async { 7 }).await, 7);
}
