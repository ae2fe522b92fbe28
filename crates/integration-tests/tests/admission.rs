//! Admission limits stored in SQLite

mod common;

use common::{submit, TestEnv, QUEUE};
use fairqueue_core::domain::{Decision, Playtime, QueueConfigPatch, RejectionReason};
use fairqueue_core::port::{ConfigStore, EntryRepository};

fn rejection(decision: &Decision) -> Option<RejectionReason> {
    match decision {
        Decision::Rejected(reason) => Some(*reason),
        Decision::Accepted { .. } => None,
    }
}

#[tokio::test]
async fn test_duration_limits_and_rejections_leave_no_rows() {
    let env = TestEnv::new().await;
    let service = env.service();
    env.resolver.insert("https://m.test/short", Playtime::seconds(20));
    env.resolver.insert("https://m.test/long", Playtime::seconds(900));
    env.resolver.insert("https://m.test/live", Playtime::Unbounded);

    service
        .update_config(QueueConfigPatch {
            entry_duration_max_seconds: Some(Some(600)),
            entry_duration_min_seconds: Some(Some(30)),
            ..Default::default()
        })
        .await
        .unwrap();

    let cases = [
        ("https://m.test/short", Some(RejectionReason::TooShort)),
        ("https://m.test/long", Some(RejectionReason::TooLong)),
        ("https://m.test/live", Some(RejectionReason::TooLong)),
        ("https://m.test/ok", None),
    ];
    for (link, expected) in cases {
        let decision = submit(&env, &service, "alice", link).await;
        assert_eq!(rejection(&decision), expected, "{}", link);
    }

    assert_eq!(env.entries.count_pending(QUEUE).await.unwrap(), 1);
    assert_eq!(env.notifier.rejections().len(), 3);
}

#[tokio::test]
async fn test_cooldown_and_quota() {
    let env = TestEnv::new().await;
    let service = env.service();
    service
        .update_config(QueueConfigPatch {
            cooldown_seconds: Some(Some(60)),
            submission_max_quantity: Some(Some(2)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(submit(&env, &service, "alice", "https://m.test/1").await.is_accepted());
    assert_eq!(
        rejection(&submit(&env, &service, "alice", "https://m.test/2").await),
        Some(RejectionReason::CooldownActive)
    );

    env.clock.advance_secs(60);
    assert!(submit(&env, &service, "alice", "https://m.test/3").await.is_accepted());

    env.clock.advance_secs(60);
    assert_eq!(
        rejection(&submit(&env, &service, "alice", "https://m.test/4").await),
        Some(RejectionReason::QuotaExceeded)
    );

    // Other participants are unaffected
    assert!(submit(&env, &service, "bob", "https://m.test/5").await.is_accepted());
}

#[tokio::test]
async fn test_playtime_cap_closes_and_persists_gate() {
    let env = TestEnv::new().await;
    let service = env.service();
    service
        .update_config(QueueConfigPatch {
            queue_duration_seconds: Some(Some(250)),
            ..Default::default()
        })
        .await
        .unwrap();

    let decisions = [
        submit(&env, &service, "alice", "https://m.test/1").await,
        submit(&env, &service, "bob", "https://m.test/2").await,
        submit(&env, &service, "carol", "https://m.test/3").await,
        submit(&env, &service, "dave", "https://m.test/4").await,
    ];
    assert!(decisions[..3].iter().all(Decision::is_accepted));
    assert_eq!(rejection(&decisions[3]), Some(RejectionReason::QueueClosed));

    assert!(!service.is_open());
    assert!(!env.config.load(QUEUE).await.unwrap().is_open);
    assert_eq!(env.notifier.count_closed(), 1);

    // Draining does not reopen on its own
    service.poll_next().await.unwrap();
    assert_eq!(
        rejection(&submit(&env, &service, "erin", "https://m.test/5").await),
        Some(RejectionReason::QueueClosed)
    );

    assert!(service.open().await.unwrap());
    assert!(env.config.load(QUEUE).await.unwrap().is_open);
    assert!(submit(&env, &service, "erin", "https://m.test/6").await.is_accepted());
}

#[tokio::test]
async fn test_blacklist_is_checked_before_limits() {
    let env = TestEnv::new().await;
    let service = env.service();
    env.resolver.insert("https://m.test/long", Playtime::seconds(900));
    service
        .update_config(QueueConfigPatch {
            entry_duration_max_seconds: Some(Some(600)),
            ..Default::default()
        })
        .await
        .unwrap();
    service.blacklist("mallory").await.unwrap();

    assert_eq!(
        rejection(&submit(&env, &service, "mallory", "https://m.test/long").await),
        Some(RejectionReason::Blacklisted)
    );

    service.whitelist("mallory").await.unwrap();
    assert_eq!(
        rejection(&submit(&env, &service, "mallory", "https://m.test/long").await),
        Some(RejectionReason::TooLong)
    );
    assert!(submit(&env, &service, "mallory", "https://m.test/ok").await.is_accepted());
}
