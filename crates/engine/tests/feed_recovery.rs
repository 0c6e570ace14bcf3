//! Feed Recovery Integration Test
//!
//! Subscriptions break in three ways: a fault, a natural close, or no
//! quotes for longer than the idle timeout. Each is followed by
//! resubscription with backoff until the attempt budget runs out.

use chrono::Duration as ChronoDuration;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use talos_clock::ManualClock;
use talos_core::{NewRobot, Quote, Robot};
use talos_engine::{
    ChangeBroadcaster, EngineConfig, ExecutionTask, FeedPolicy, RobotEngine, RobotObserver,
    RunRegistry, ShutdownMode, TaskContext, TaskExit,
};
use talos_feed::ChannelPriceFeed;
use talos_ports::{Clock, FeedError, RobotStore};
use talos_store::InMemoryRobotStore;

fn fast_policy(max_reconnect_attempts: u32) -> FeedPolicy {
    FeedPolicy {
        idle_timeout_ms: 30_000,
        max_reconnect_attempts,
        backoff_base_ms: 5,
        backoff_max_ms: 20,
        backoff_jitter: 0.0,
    }
}

struct Harness {
    engine: RobotEngine,
    feed: Arc<ChannelPriceFeed>,
    clock: Arc<ManualClock>,
}

fn harness(policy: FeedPolicy) -> Harness {
    let _ = env_logger::try_init();
    let feed = Arc::new(ChannelPriceFeed::new());
    let clock = ManualClock::starting_now();
    let config = EngineConfig {
        feed: policy,
        ..EngineConfig::default()
    };
    let engine = RobotEngine::new(
        config,
        Arc::new(InMemoryRobotStore::new()),
        feed.clone(),
        clock.clone(),
    );
    Harness {
        engine,
        feed,
        clock,
    }
}

async fn running_robot(h: &Harness) -> Robot {
    let now = h.clock.now();
    let draft = NewRobot::new(
        1,
        "SBER",
        dec!(100),
        dec!(110),
        now + ChronoDuration::seconds(1),
        now + ChronoDuration::hours(1),
    );
    let robot = h.engine.commands().create_robot(1, draft).await.unwrap();
    h.engine.commands().activate(robot.robot_id, 1).await.unwrap();
    h.clock.advance(ChronoDuration::seconds(2));
    robot
}

async fn wait_for_subscribers(feed: &ChannelPriceFeed, ticker: &str, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while feed.subscriber_count(ticker) < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("execution task never subscribed");
}

/// Keep publishing `quote` until the robot trades on it
async fn publish_until_traded(
    feed: &ChannelPriceFeed,
    observer: &mut RobotObserver,
    quote: Quote,
) -> Robot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            feed.publish(quote.clone());
            if let Some(robot) = observer.try_next() {
                return robot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("robot never traded")
}

#[tokio::test]
async fn test_resubscribes_after_disconnect() {
    let h = harness(fast_policy(3));
    let robot = running_robot(&h).await;
    let mut observer = h.engine.subscribe();

    h.engine.poll_once().await;
    wait_for_subscribers(&h.feed, "SBER", 1).await;

    let buy = Quote::new("SBER", dec!(100), dec!(99));
    let bought = publish_until_traded(&h.feed, &mut observer, buy).await;
    assert_eq!(bought.deals_count, 1);

    h.feed.disconnect("SBER", "socket reset");

    // Phase survives the reconnect: the next trade is the sell
    let sell = Quote::new("SBER", dec!(115), dec!(112));
    let sold = publish_until_traded(&h.feed, &mut observer, sell).await;
    assert_eq!(sold.fact_yield, dec!(12));
    assert!(h.engine.is_running(robot.robot_id));

    h.engine
        .shutdown(ShutdownMode::Cancel, Duration::from_secs(5))
        .await;
}

#[tokio::test]
async fn test_resubscribes_after_natural_close() {
    let h = harness(fast_policy(3));
    let robot = running_robot(&h).await;
    let mut observer = h.engine.subscribe();

    h.engine.poll_once().await;
    wait_for_subscribers(&h.feed, "SBER", 1).await;

    h.feed.close("SBER");

    let buy = Quote::new("SBER", dec!(90), dec!(89));
    let bought = publish_until_traded(&h.feed, &mut observer, buy).await;
    assert_eq!(bought.fact_yield, dec!(-90));
    assert!(h.engine.is_running(robot.robot_id));

    h.engine
        .shutdown(ShutdownMode::Cancel, Duration::from_secs(5))
        .await;
}

#[tokio::test]
async fn test_exhausted_reconnects_release_robot_for_rediscovery() {
    let h = harness(fast_policy(2));
    let robot = running_robot(&h).await;
    h.feed.set_unavailable("SBER", "maintenance");

    assert_eq!(h.engine.poll_once().await, 1);

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.engine.is_running(robot.robot_id) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("task should give up");

    // The record is still active and in its window, so the next poll retries it
    h.feed.set_available("SBER");
    assert_eq!(h.engine.poll_once().await, 1);
    wait_for_subscribers(&h.feed, "SBER", 1).await;

    h.engine
        .shutdown(ShutdownMode::Cancel, Duration::from_secs(5))
        .await;
}

#[tokio::test]
async fn test_zero_attempts_makes_feed_errors_terminal() {
    let _ = env_logger::try_init();
    let clock = ManualClock::starting_now();
    let now = clock.now();
    let store = Arc::new(InMemoryRobotStore::new());
    let feed = Arc::new(ChannelPriceFeed::new());
    let registry = Arc::new(RunRegistry::new());

    let draft = NewRobot::new(
        1,
        "SBER",
        dec!(100),
        dec!(110),
        now - ChronoDuration::seconds(1),
        now + ChronoDuration::hours(1),
    );
    let robot = store.create(draft, now).await.unwrap();

    let ctx = TaskContext {
        store,
        feed: feed.clone(),
        clock,
        registry: registry.clone(),
        broadcaster: ChangeBroadcaster::new(8),
        policy: fast_policy(0),
    };
    let token = registry.acquire(robot.robot_id).unwrap();
    let handle = tokio::spawn(ExecutionTask::new(robot, token, ctx).run());

    wait_for_subscribers(&feed, "SBER", 1).await;
    feed.disconnect("SBER", "upstream gone");

    assert_eq!(
        handle.await.unwrap(),
        TaskExit::FeedFailed(FeedError::Disconnected("upstream gone".into()))
    );
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_idle_subscription_times_out() {
    let clock = ManualClock::starting_now();
    let now = clock.now();
    let store = Arc::new(InMemoryRobotStore::new());
    let registry = Arc::new(RunRegistry::new());

    let draft = NewRobot::new(
        1,
        "SBER",
        dec!(100),
        dec!(110),
        now - ChronoDuration::seconds(1),
        now + ChronoDuration::hours(1),
    );
    let robot = store.create(draft, now).await.unwrap();

    let policy = FeedPolicy {
        idle_timeout_ms: 1_000,
        ..fast_policy(1)
    };
    let ctx = TaskContext {
        store,
        feed: Arc::new(ChannelPriceFeed::new()),
        clock,
        registry: registry.clone(),
        broadcaster: ChangeBroadcaster::new(8),
        policy,
    };
    let token = registry.acquire(robot.robot_id).unwrap();

    // One idle timeout, one resubscribe, a second idle timeout, give up
    let exit = ExecutionTask::new(robot, token, ctx).run().await;

    assert_eq!(
        exit,
        TaskExit::FeedFailed(FeedError::IdleTimeout(Duration::from_secs(1)))
    );
    assert!(registry.is_empty());
}
