mod common;

use common::Probe;
use futures_fanin::prelude::*;
use futures_fanin::source::Settlement;
use futures_fanin::{merge, MergeOptions, Mode};
use futures_lite::StreamExt;
use tokio::time::{Duration, Instant};

fn five_tickers(probe: &Probe) -> Vec<common::Ticker> {
    vec![
        probe.ticker("A", 22),
        probe.ticker("B", 55),
        probe.ticker("C", 33),
        probe.ticker("D", 44),
        probe.ticker("E", 11),
    ]
}

#[tokio::test(start_paused = true)]
async fn initial_window_is_read_in_input_order() {
    let probe = Probe::new();
    let mut s = five_tickers(&probe).merge_with(MergeOptions::new().concurrency(2));

    assert_eq!(s.advance().await, Settlement::Value("A: 0".to_owned()));
    assert_eq!(s.advance().await, Settlement::Value("B: 0".to_owned()));
    assert_eq!(s.active_len(), 2);
    assert_eq!(s.queued_len(), 3);

    // `E` ticks fastest, but waits for a free slot
    for _ in 0..10 {
        let value = s.next().await.unwrap().unwrap();
        assert!(value.starts_with('A') || value.starts_with('B'), "{value}");
    }
    assert!(!probe.stats().advances.contains(&"E"));
}

#[tokio::test(start_paused = true)]
async fn window_bound_and_per_source_order() {
    for limit in [0, 1, 2, 3, 5, 8] {
        let probe = Probe::new();
        let sources = five_tickers(&probe)
            .into_iter()
            .map(|ticker| ticker.limit(3))
            .collect::<Vec<_>>();
        let s = merge(sources, MergeOptions::new().concurrency(limit));

        let out: Vec<String> = s.map(Result::unwrap).collect().await;
        assert_eq!(out.len(), 15);
        for name in ["A", "B", "C", "D", "E"] {
            let seen: Vec<&str> = out
                .iter()
                .filter(|value| value.starts_with(name))
                .map(String::as_str)
                .collect();
            let expected: Vec<String> = (0..3).map(|n| format!("{name}: {n}")).collect();
            assert_eq!(seen, expected);
        }

        let bound = if limit == 0 { 5 } else { limit.min(5) };
        let stats = probe.stats();
        assert!(stats.max_outstanding <= bound, "limit {limit}");
        assert!(stats.close_started.is_empty());
    }
}

/// Stop reading once a value from `D` shows up, and close the merge.
async fn stop_at_d(mode: Mode) -> (Probe, Vec<&'static str>, Duration) {
    let probe = Probe::new();
    let sources = five_tickers(&probe)
        .into_iter()
        .map(|ticker| ticker.limit(3))
        .collect::<Vec<_>>();
    let mut s = sources.merge_with(MergeOptions::new().mode(mode).concurrency(2));

    while let Some(value) = s.next().await {
        if value.unwrap().contains('D') {
            break;
        }
    }
    assert_eq!(s.active_len(), 2);
    let before = probe.stats().close_started.clone();
    assert!(before.is_empty());

    let start = Instant::now();
    s.close().await.unwrap();
    let elapsed = start.elapsed();
    assert!(s.is_terminated());
    assert_eq!(s.next().await, None);

    let closed = probe.stats().close_started.clone();
    (probe, closed, elapsed)
}

#[tokio::test(start_paused = true)]
async fn early_stop_without_closing() {
    let (probe, closed, elapsed) = stop_at_d(Mode::NoClose).await;
    assert!(closed.is_empty());
    assert!(probe.stats().close_finished.is_empty());
    assert_eq!(elapsed, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn early_stop_closes_without_waiting() {
    let (probe, closed, elapsed) = stop_at_d(Mode::CloseNoWait).await;
    assert_eq!(closed.len(), 2);
    assert!(closed.contains(&"D"));
    assert!(probe.stats().close_finished.is_empty());
    assert_eq!(elapsed, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn early_stop_waits_for_closing() {
    let (probe, closed, elapsed) = stop_at_d(Mode::CloseAndWait).await;
    assert_eq!(closed.len(), 2);
    assert!(closed.contains(&"D"));
    let mut finished = probe.stats().close_finished.clone();
    finished.sort_unstable();
    let mut started = closed;
    started.sort_unstable();
    assert_eq!(finished, started);
    assert!(elapsed >= Duration::from_millis(100));
    assert_eq!(probe.stats().outstanding, 0);
}

#[tokio::test(start_paused = true)]
async fn failure_on_third_read_is_raised_once() {
    for mode in [Mode::NoClose, Mode::CloseNoWait, Mode::CloseAndWait] {
        let probe = Probe::new();
        let sources = vec![probe.ticker("A", 10).fail_at(3), probe.ticker("B", 15)];
        let out: Vec<_> = merge(sources, mode).collect().await;

        let expected = vec![
            Ok("A: 0".to_owned()),
            Ok("B: 0".to_owned()),
            Ok("A: 1".to_owned()),
            Ok("B: 1".to_owned()),
            Err("A failed".to_owned()),
        ];
        assert_eq!(out, expected, "{mode}");

        let stats = probe.stats();
        match mode {
            Mode::NoClose => assert!(stats.close_started.is_empty()),
            Mode::CloseNoWait => {
                assert_eq!(stats.close_started, vec!["B"]);
                assert!(stats.close_finished.is_empty());
            }
            Mode::CloseAndWait => assert_eq!(stats.close_finished, vec!["B"]),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn no_sources() {
    let probe = Probe::new();
    let mut s = Vec::<common::Ticker>::new().merge_with(Mode::CloseAndWait);
    assert_eq!(s.next().await, None);
    assert!(s.is_terminated());
    s.close().await.unwrap();
    assert!(probe.stats().close_started.is_empty());
}

#[tokio::test(start_paused = true)]
async fn retired_sources_are_never_closed() {
    let probe = Probe::new();
    let sources = vec![probe.ticker("A", 5).limit(1), probe.ticker("B", 50)];
    let mut s = sources.merge_with(Mode::CloseAndWait);

    assert_eq!(s.advance().await, Settlement::Value("A: 0".to_owned()));
    assert_eq!(s.advance().await, Settlement::Value("B: 0".to_owned()));
    // `A` completes at 5ms, long before `B` ticks again
    assert_eq!(s.advance().await, Settlement::Value("B: 1".to_owned()));
    assert_eq!(s.active_len(), 1);

    s.close().await.unwrap();
    assert_eq!(probe.stats().close_started, vec!["B"]);
}

#[tokio::test(start_paused = true)]
async fn dropping_closes_without_waiting() {
    let probe = Probe::new();
    let mut s = five_tickers(&probe).merge_with(Mode::CloseAndWait);
    assert!(s.next().await.is_some());
    drop(s);

    let stats = probe.stats();
    assert_eq!(stats.close_started.len(), 5);
    assert!(stats.close_finished.is_empty());
    assert_eq!(stats.outstanding, 0);
}
