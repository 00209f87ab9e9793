#![allow(non_snake_case)]

use super::*;

#[test]
fn Teardown___new___not_begun_and_idle() {
    let teardown = Teardown::new();

    assert!(!teardown.has_begun());
    assert_eq!(teardown.in_flight(), 0);
}

#[test]
fn Teardown___begin___only_first_call_reports_true() {
    let teardown = Teardown::new();

    assert!(teardown.begin());
    assert!(!teardown.begin());
    assert!(teardown.has_begun());
}

#[test]
fn Teardown___enter___counts_until_guard_dropped() {
    let teardown = Teardown::new();

    let first = teardown.enter();
    let second = teardown.clone().enter();
    assert_eq!(teardown.in_flight(), 2);

    drop(first);
    assert_eq!(teardown.in_flight(), 1);

    drop(second);
    assert_eq!(teardown.in_flight(), 0);
}

#[test]
fn Teardown___drain___idle_returns_true_at_once() {
    let teardown = Teardown::new();

    assert!(teardown.drain(Duration::ZERO));
}

#[test]
fn Teardown___drain___times_out_with_task_in_flight() {
    let teardown = Teardown::new();
    let _guard = teardown.enter();

    assert!(!teardown.drain(Duration::from_millis(20)));
}

#[test]
fn Teardown___drain___wakes_when_guard_dropped_on_other_thread() {
    let teardown = Teardown::new();
    let guard = teardown.enter();

    let worker = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        drop(guard);
    });

    assert!(teardown.drain(Duration::from_secs(5)));
    worker.join().unwrap();
}

#[test]
fn TeardownSignal___clone___observes_same_teardown() {
    let teardown = Teardown::new();
    let signal = teardown.signal();
    let cloned = signal.clone();

    teardown.begin();

    assert!(signal.has_begun());
    assert!(cloned.has_begun());
}

#[tokio::test]
async fn TeardownSignal___begun___waits_for_begin() {
    let teardown = Teardown::new();
    let mut signal = teardown.signal();

    let trigger = teardown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.begin();
    });

    tokio::time::timeout(Duration::from_secs(5), signal.begun())
        .await
        .unwrap();
    assert!(signal.has_begun());
}

#[tokio::test]
async fn TeardownSignal___begun___already_begun_resolves_immediately() {
    let teardown = Teardown::new();
    teardown.begin();
    let mut signal = teardown.signal();

    tokio::time::timeout(Duration::from_millis(10), signal.begun())
        .await
        .unwrap();
}

#[tokio::test]
async fn TeardownSignal___begun___owner_dropped_counts_as_teardown() {
    let teardown = Teardown::new();
    let mut signal = teardown.signal();

    drop(teardown);

    tokio::time::timeout(Duration::from_millis(100), signal.begun())
        .await
        .unwrap();
}
