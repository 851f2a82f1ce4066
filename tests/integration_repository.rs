//! Integration tests for the PostgreSQL repository and the member service.
//!
//! These require a database; they skip themselves when DATABASE_URL is not
//! set.

use chrono::NaiveDate;
use member_core::domain::{ActivateMember, Gender, RegisterMember, UpdateProfile};
use member_core::{
    Aggregate, EventStore, EventStoreError, Member, MemberProjection, MemberService, MemberStatus,
    PostgresEventStore, PostgresMemberRepository,
};
use member_core::repository::MemberRepository;

mod common;

#[tokio::test]
async fn test_save_and_rehydrate() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool);
    let id = common::unique_member_id("repo");

    let mut member = Member::register(&id, &format!("{id}@example.com")).unwrap();
    repo.save(&mut member).await.unwrap();
    assert!(!member.has_changes());

    let loaded = repo.get_by_id(&id).await.unwrap();
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.status(), MemberStatus::Pending);
    assert_eq!(loaded.version(), 1);
    assert!(loaded.changes().is_empty());
}

#[tokio::test]
async fn test_save_is_idempotent_without_changes() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool.clone());
    let store = PostgresEventStore::new(pool);
    let id = common::unique_member_id("repo");

    let mut member = Member::register(&id, &format!("{id}@example.com")).unwrap();
    repo.save(&mut member).await.unwrap();
    repo.save(&mut member).await.unwrap();

    assert_eq!(store.load(&id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_aggregate_save_conflicts() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool.clone());
    let store = PostgresEventStore::new(pool);
    let id = common::unique_member_id("repo");

    let mut member = Member::register(&id, &format!("{id}@example.com")).unwrap();
    repo.save(&mut member).await.unwrap();

    let mut winner = repo.get_by_id(&id).await.unwrap();
    let mut loser = repo.get_by_id(&id).await.unwrap();

    winner.activate();
    repo.save(&mut winner).await.unwrap();

    loser.activate();
    let err = repo.save(&mut loser).await.unwrap_err();
    assert!(err.is_conflict());

    // No partial write: the stream holds exactly versions 1 and 2, and the
    // read model matches the winner.
    let events = store.load(&id).await.unwrap();
    let versions: Vec<i64> = events.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2]);

    let loaded = repo.get_by_id(&id).await.unwrap();
    assert_eq!(loaded.version(), 2);
    assert_eq!(loaded.status(), MemberStatus::Active);
}

fn sample_profile(name: &str) -> member_core::Profile {
    member_core::Profile::new(
        name,
        "Hi there",
        NaiveDate::from_ymd_opt(1990, 1, 20).unwrap(),
        Gender::Female,
    )
    .unwrap()
}

#[tokio::test]
async fn test_concurrent_saves_report_stream_head() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool);
    let id = common::unique_member_id("repo");

    let mut member = Member::register(&id, &format!("{id}@example.com")).unwrap();
    repo.save(&mut member).await.unwrap();

    // Two stale copies each stage two changes; the winner moves the head to
    // 3 and the loser's conflict must report that head, not the version its
    // own insert attempted.
    let mut first = repo.get_by_id(&id).await.unwrap();
    let mut second = repo.get_by_id(&id).await.unwrap();
    first.update_profile(sample_profile("Alice"));
    first.activate();
    second.update_profile(sample_profile("Bob"));
    second.activate();

    let mut handles = Vec::new();
    for mut copy in [first, second] {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.save(&mut copy).await }));
    }

    let mut ok = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(member_core::AppError::EventStore(EventStoreError::ConcurrencyConflict {
                expected,
                actual,
                ..
            })) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 3);
                conflicts += 1;
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);

    let loaded = repo.get_by_id(&id).await.unwrap();
    assert_eq!(loaded.version(), 3);
    assert_eq!(loaded.status(), MemberStatus::Active);
}

#[tokio::test]
async fn test_read_model_stays_in_sync() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool.clone());
    let projection = MemberProjection::new(pool);
    let id = common::unique_member_id("repo");
    let email = format!("{id}@example.com");

    let mut member = Member::register(&id, &email).unwrap();
    member.update_profile(sample_profile("Alice"));
    repo.save(&mut member).await.unwrap();

    let view = projection.get(&id).await.unwrap().unwrap();
    assert_eq!(view.email, email);
    assert_eq!(view.display_name.as_deref(), Some("Alice"));
    assert_eq!(view.status, "pending");
    // After a successful commit the row version equals the stream length.
    assert_eq!(view.version, 2);
}

#[tokio::test]
async fn test_duplicate_email_rejected_by_unique_index() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool);
    let first_id = common::unique_member_id("repo");
    let email = format!("{first_id}@example.com");

    let mut first = Member::register(&first_id, &email).unwrap();
    repo.save(&mut first).await.unwrap();

    // Bypass the service pre-check entirely: the storage-level constraint
    // still rejects the duplicate and nothing lands for the loser.
    let second_id = common::unique_member_id("repo");
    let mut second = Member::register(&second_id, &email).unwrap();
    let err = repo.save(&mut second).await.unwrap_err();
    assert!(matches!(err, member_core::AppError::AlreadyExists(_)));

    assert!(repo.get_by_id(&second_id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_password_hash_round_trip() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool);
    let id = common::unique_member_id("repo");

    let mut member = Member::register(&id, &format!("{id}@example.com")).unwrap();
    repo.save_with_password(&mut member, "$argon2id$hash")
        .await
        .unwrap();

    assert_eq!(
        repo.get_password_hash(&id).await.unwrap(),
        "$argon2id$hash"
    );

    let missing = common::unique_member_id("repo");
    assert!(repo
        .get_password_hash(&missing)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let store = PostgresEventStore::new(pool.clone());
    let service = MemberService::new(PostgresMemberRepository::new(pool));
    let id = common::unique_member_id("repo");
    let email = format!("{}@Example.COM", id.to_uppercase());

    // Register + save: email comes back normalized, version 1, Pending.
    service
        .register_member(RegisterMember::new(&id, &email))
        .await
        .unwrap();

    let member = service.get_member(&id).await.unwrap();
    assert_eq!(member.status(), MemberStatus::Pending);
    assert_eq!(member.email().as_str(), email.to_lowercase());
    assert_eq!(member.version(), 1);

    // Profile + activate.
    service
        .update_profile(UpdateProfile {
            member_id: id.clone(),
            display_name: "Alice".to_string(),
            bio: "Hi".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 20).unwrap(),
            gender: Gender::Female,
        })
        .await
        .unwrap();
    service
        .activate_member(ActivateMember::new(&id))
        .await
        .unwrap();

    let member = service.get_member(&id).await.unwrap();
    assert_eq!(member.status(), MemberStatus::Active);
    assert_eq!(member.version(), 3);
    assert_eq!(member.profile().unwrap().display_name, "Alice");

    // Incremental replay after the profile update sees only the activation.
    let suffix = store.load_from(&id, 2).await.unwrap();
    assert_eq!(suffix.len(), 1);
    assert_eq!(suffix[0].event_type, "member.activated");

    // Email lookup normalizes the probe, so the original casing resolves to
    // the same aggregate.
    let by_email = service.get_member_by_email(&email).await.unwrap();
    assert_eq!(by_email.id(), member.id());
    assert_eq!(by_email.version(), member.version());
}

#[tokio::test]
async fn test_projection_rebuild() {
    let Some(pool) = common::try_setup_test_db().await else {
        return;
    };
    let repo = PostgresMemberRepository::new(pool.clone());
    let projection = MemberProjection::new(pool.clone());
    let id = common::unique_member_id("repo");
    let email = format!("{id}@example.com");

    let mut member = Member::register(&id, &email).unwrap();
    member.activate();
    repo.save(&mut member).await.unwrap();

    // Corrupt the row, then rebuild from the streams.
    sqlx::query("UPDATE members SET status = 'pending', version = 0 WHERE id = $1")
        .bind(&id)
        .execute(&pool)
        .await
        .unwrap();

    projection.rebuild().await.unwrap();

    let view = projection.get(&id).await.unwrap().unwrap();
    assert_eq!(view.status, "active");
    assert_eq!(view.version, 2);
}
