use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kafscope::config::Config;
use kafscope::models::{ConsumerGroupState, TopicState};
use kafscope::monitor::{GroupMonitor, TopicMonitor, Viewport};
use kafscope::provider::{GroupState, MetadataProvider, SimCluster};
use kafscope::tail::{MessageTail, TailEvent};

// ========================================
// MAIN ENTRY POINT
// ========================================

/// Console demo: a simulated cluster with background churn, one topics
/// view, one consumer-group view on "orders" and a live tail, all rendered
/// by a single consumer task.
#[tokio::main]
async fn main() {
    let config = Config::global();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.cluster.log_level))
        .init();

    println!("🔭 Kafscope demo starting (simulated cluster, brokers setting '{}' unused)", config.cluster.brokers);

    let sim = Arc::new(SimCluster::new());
    seed(&sim);
    let churn = tokio::spawn(churn(Arc::clone(&sim)));

    let provider: Arc<dyn MetadataProvider> = sim;
    let (topics, mut topic_snapshots) =
        TopicMonitor::spawn(Arc::clone(&provider), config.monitor.clone());
    topics.set_viewport(Some(Viewport::new(0, 9)));

    let (groups, mut group_snapshots) =
        GroupMonitor::spawn(Arc::clone(&provider), "orders", config.monitor.clone());
    groups.set_viewport(Some(Viewport::new(0, 9)));

    let (tail, mut tail_events) = MessageTail::open(Arc::clone(&provider), "orders", &config.tail)
        .await
        .expect("cannot open tail on seeded topic");
    let tail_topic = tail.topic().to_string();

    // The single writer of the terminal. Monitors block on their slot
    // until this task drains it.
    let render = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(snapshot) = topic_snapshots.recv() => render_topics(&snapshot),
                Some(snapshot) = group_snapshots.recv() => render_groups(&snapshot),
                Some(event) = tail_events.recv() => render_tail(&tail_topic, &event),
                else => break,
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl-c");
    info!("[Main] shutting down");

    churn.abort();
    tail.stop().await;
    groups.stop().await;
    topics.stop().await;
    let _ = render.await;
    println!("👋 Kafscope demo stopped");
}

// ========================================
// SIMULATED CLUSTER SCENARIO
// ========================================

fn seed(sim: &SimCluster) {
    sim.add_topic("orders", 6, 3);
    sim.add_topic("payments", 3, 3);
    sim.add_topic("inventory", 4, 2);
    for i in 0..12 {
        sim.add_topic(&format!("metrics-{i:02}"), 1, 1);
    }

    sim.add_group("billing", GroupState::Stable);
    sim.add_member("billing", "billing-1", &["orders"]);
    sim.add_member("billing", "billing-2", &["orders", "payments"]);
    sim.set_committed("billing", "orders", 0, 0);

    sim.add_group("analytics", GroupState::Stable);
    sim.add_member("analytics", "analytics-1", &["orders"]);
    sim.set_committed("analytics", "orders", 0, 0);
    // Far behind from the start.
    sim.advance("orders", 0, 5_000);

    sim.add_group("legacy-etl", GroupState::Dead);
    sim.add_member("legacy-etl", "etl-1", &["orders"]);

    // Subscribes elsewhere, so the orders view never shows it.
    sim.add_group("payments-audit", GroupState::Stable);
    sim.add_member("payments-audit", "audit-1", &["payments"]);
}

/// Publishes a trickle of traffic and flips cluster conditions so every
/// health state and status shows up within a minute of watching.
async fn churn(sim: Arc<SimCluster>) {
    let mut round: u64 = 0;
    let mut interval = tokio::time::interval(Duration::from_millis(500));
    loop {
        interval.tick().await;
        round += 1;

        let order = json!({"order": round, "amount": (round % 97) * 3});
        sim.publish(
            "orders",
            (round % 6) as u32,
            Bytes::from(order.to_string().into_bytes()),
        );
        sim.advance("payments", (round % 3) as u32, 7);

        // billing keeps up, analytics stays behind
        sim.set_committed("billing", "orders", (round % 6) as u32, (round / 6) as i64);

        match round % 60 {
            10 => sim.set_replicas("inventory", 0, vec![0]),
            15 => sim.set_group_state("analytics", GroupState::Stable),
            20 => sim.set_leaderless("inventory", 2),
            30 => sim.set_leader("inventory", 2, 1),
            40 => sim.set_in_sync("inventory", 0, vec![]),
            45 => sim.set_group_state("analytics", GroupState::Dead),
            50 => sim.set_in_sync("inventory", 0, vec![0, 1]),
            55 => sim.set_replicas("inventory", 0, vec![0, 1]),
            _ => {}
        }
    }
}

// ========================================
// RENDERING (presentation stand-in)
// ========================================

fn render_topics(snapshot: &[TopicState]) {
    println!("── topics ──────────────────────────────────────────────────");
    for topic in snapshot.iter().take(10) {
        let throughput = topic
            .throughput
            .map(|rate| format!("{rate:.1}/s"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} parts {:>2}  repl {:>2}  msgs {:>8}  {:<8} {:>9}",
            topic.name,
            topic.partitions,
            topic.replicas,
            topic.total_messages,
            format!("{:?}", topic.health),
            throughput,
        );
    }
}

fn render_groups(snapshot: &[ConsumerGroupState]) {
    println!("── consumer groups of 'orders' ─────────────────────────────");
    for group in snapshot {
        println!(
            "{:<14} members {:>2}  lag {:>7}  {:?}",
            group.id, group.members, group.lag, group.status
        );
    }
}

fn render_tail(topic: &str, event: &TailEvent) {
    match event {
        TailEvent::Record(record) => {
            let preview = match std::str::from_utf8(&record.payload) {
                Ok(text) => text.to_string(),
                Err(_) => format!("[Binary {} bytes]", record.payload.len()),
            };
            println!("[tail] {topic}/{}@{}: {preview}", record.partition, record.offset);
        }
        TailEvent::PartitionError { partition, error } => {
            println!("[tail] {topic}/{partition}: unavailable ({error})");
        }
    }
}
