use std::sync::Arc;
use std::time::Duration;

use kafscope::config::MonitorConfig;
use kafscope::models::TopicHealth;
use kafscope::monitor::{TopicMonitor, Viewport};
use kafscope::provider::SimCluster;

mod helpers;
use helpers::{monitor_config, recv_snapshot};

const TICK_MS: u64 = 250;

mod features {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_is_sorted_with_derived_fields() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("zeta", 1, 1);
        sim.add_topic("alpha", 3, 3);
        sim.add_topic("midway", 2, 2);
        sim.advance("alpha", 0, 40);
        sim.advance("alpha", 1, 2);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        let snapshot = recv_snapshot(&mut snapshots).await;
        let names: Vec<&str> = snapshot.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "midway", "zeta"]);

        let alpha = &snapshot[0];
        assert_eq!(alpha.partitions, 3);
        assert_eq!(alpha.replicas, 3);
        assert_eq!(alpha.total_messages, 42);
        assert_eq!(alpha.health, TopicHealth::Ready);
        // First fetch has no baseline to difference against.
        assert_eq!(alpha.throughput, None);
        assert!(alpha.last_refresh.is_some());

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_throughput_across_cycles_with_regression_reset() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("flow", 1, 1);
        sim.advance("flow", 0, 100);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        // 1. First cycle: counter 100, no baseline yet
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].total_messages, 100);
        assert_eq!(snapshot[0].throughput, None);

        // 2. +30 messages over one 250ms tick = 120.0/s
        sim.advance("flow", 0, 30);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].total_messages, 130);
        assert_eq!(snapshot[0].throughput, Some(120.0));

        // 3. Counter regression (topic recreated): unknown, not negative
        sim.set_offsets("flow", 0, 0, 50);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].total_messages, 50);
        assert_eq!(snapshot[0].throughput, None);

        // 4. Baseline restarts from the regressed counter
        sim.advance("flow", 0, 25);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].total_messages, 75);
        assert_eq!(snapshot[0].throughput, Some(100.0));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_health_degrades_and_recovers() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("shaky", 3, 2);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].health, TopicHealth::Ready);

        // 1. Empty in-sync set on one partition -> Warning
        sim.set_in_sync("shaky", 1, vec![]);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].health, TopicHealth::Warning);

        // 2. A leaderless partition dominates -> Error
        sim.set_leaderless("shaky", 2);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].health, TopicHealth::Error);

        // 3. Leader back and replicas in sync -> Ready again
        sim.set_leader("shaky", 2, 0);
        sim.set_in_sync("shaky", 1, vec![0, 1]);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].health, TopicHealth::Ready);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_offscreen_topics_are_carried_forward() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("aaa", 1, 1);
        sim.add_topic("bbb", 1, 1);
        sim.add_topic("ccc", 1, 1);
        sim.advance("aaa", 0, 10);
        sim.advance("bbb", 0, 20);
        sim.advance("ccc", 0, 30);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        // Only row 0 ("aaa") is on screen.
        handle.set_viewport(Some(Viewport::new(0, 0)));

        // 1. Never-fetched topics are fetched regardless of visibility
        let first = recv_snapshot(&mut snapshots).await;
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|t| t.last_refresh.is_some()));

        // 2. From now on only the visible row refreshes
        sim.advance("aaa", 0, 100);
        sim.advance("bbb", 0, 100);
        sim.advance("ccc", 0, 100);
        let second = recv_snapshot(&mut snapshots).await;
        assert_eq!(second[0].total_messages, 110);
        assert_eq!(second[1].total_messages, 20, "off-screen row must not refresh");
        assert_eq!(second[2].total_messages, 30, "off-screen row must not refresh");
        assert_eq!(second[1].last_refresh, first[1].last_refresh);
        assert_eq!(second[2].last_refresh, first[2].last_refresh);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_readtime_view() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("abc1", 1, 1);
        sim.add_topic("xyz", 1, 1);
        sim.add_topic("ABCtest", 1, 1);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));
        handle.set_filter("abc");

        let snapshot = recv_snapshot(&mut snapshots).await;
        let names: Vec<&str> = snapshot.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ABCtest", "abc1"]);

        // Clearing the filter restores everything; nothing was lost.
        handle.set_filter("");
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot.len(), 3);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_listing_failure_skips_cycle_and_keeps_snapshot() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("solid", 2, 2);
        sim.advance("solid", 0, 10);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        let before = recv_snapshot(&mut snapshots).await;
        assert_eq!(before[0].total_messages, 10);

        // 1. While offline, cycles are skipped: nothing is published
        sim.set_offline(true);
        let waited = tokio::time::timeout(Duration::from_millis(700), snapshots.recv()).await;
        assert!(waited.is_err(), "no snapshot may be published while listing fails");

        // 2. Cached state is untouched during the outage
        let cached = handle.filtered_snapshot();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].total_messages, 10);
        assert_eq!(cached[0].last_refresh, before[0].last_refresh);

        // 3. Recovery resumes publishing
        sim.set_offline(false);
        let after = recv_snapshot(&mut snapshots).await;
        assert_eq!(after[0].name, "solid");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_deleted_topic_stops_being_surfaced() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("keep", 1, 1);
        sim.add_topic("gone", 1, 1);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        let first = recv_snapshot(&mut snapshots).await;
        assert_eq!(first.len(), 2);

        sim.remove_topic("gone");
        let second = recv_snapshot(&mut snapshots).await;
        let names: Vec<&str> = second.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["keep"]);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_slow_calls_time_out_and_cycle_recovers() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("lagged", 1, 1);
        sim.set_latency(Duration::from_millis(150));

        let config = MonitorConfig {
            topic_tick_ms: TICK_MS,
            group_tick_ms: TICK_MS,
            fetch_timeout_ms: 50,
            lag_alert_threshold: 1000,
        };
        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), config);
        handle.set_viewport(Some(Viewport::new(0, 9)));

        // Every listing call exceeds its deadline, so cycles keep skipping.
        let waited = tokio::time::timeout(Duration::from_millis(900), snapshots.recv()).await;
        assert!(waited.is_err());

        sim.set_latency(Duration::ZERO);
        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot[0].name, "lagged");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_stop_returns_even_when_publish_is_blocked() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("busy", 1, 1);

        let (handle, snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        // Never consume: the loop fills the slot, then blocks on publish.
        tokio::time::sleep(Duration::from_millis(650)).await;
        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .expect("stop must not hang on a blocked publish");
        drop(snapshots);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_cadence_survives_a_stalled_consumer() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("steady", 1, 1);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));
        let start = tokio::time::Instant::now();

        // 1. First cycle lands exactly one tick in
        recv_snapshot(&mut snapshots).await;
        assert_eq!(start.elapsed(), Duration::from_millis(250));

        // 2. Stall past a tick deadline: the 500ms cycle fills the slot,
        //    the 750ms cycle blocks on publish, the 1000ms tick goes
        //    unserved; waking at 1125ms drains all of it at once
        tokio::time::sleep(Duration::from_millis(875)).await;
        recv_snapshot(&mut snapshots).await;
        recv_snapshot(&mut snapshots).await;
        recv_snapshot(&mut snapshots).await;
        assert_eq!(start.elapsed(), Duration::from_millis(1125));

        // 3. The following cycle fires on the original 250ms grid, not
        //    250ms after the stall cleared
        recv_snapshot(&mut snapshots).await;
        assert_eq!(start.elapsed(), Duration::from_millis(1250));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_on_demand_snapshot_applies_current_filter() {
        let sim = Arc::new(SimCluster::new());
        sim.add_topic("alpha", 1, 1);
        sim.add_topic("beta", 1, 1);
        sim.add_topic("gamma", 1, 1);

        let (handle, mut snapshots) = TopicMonitor::spawn(sim.clone(), monitor_config(TICK_MS));
        handle.set_viewport(Some(Viewport::new(0, 9)));

        let snapshot = recv_snapshot(&mut snapshots).await;
        assert_eq!(snapshot.len(), 3);

        // No new cycle needed: the handle recomputes from the cache.
        handle.set_filter("ga");
        let filtered = handle.filtered_snapshot();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "gamma");

        handle.stop().await;
    }
}
