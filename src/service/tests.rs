//! Service-level tests against the in-memory repository.

use chrono::NaiveDate;

use crate::aggregate::{Aggregate, MemberStatus};
use crate::domain::{ActivateMember, DomainError, Gender, RegisterMember, UpdateProfile};
use crate::error::AppError;
use crate::event_store::EventStore;
use crate::repository::InMemoryMemberRepository;
use crate::service::MemberService;

fn service() -> MemberService<InMemoryMemberRepository> {
    MemberService::new(InMemoryMemberRepository::new())
}

#[tokio::test]
async fn test_register_normalizes_email() {
    let service = service();

    let member = service
        .register_member(RegisterMember::new("m1", "A@B.com"))
        .await
        .unwrap();

    assert_eq!(member.email().as_str(), "a@b.com");
    assert_eq!(member.status(), MemberStatus::Pending);
    assert_eq!(member.version(), 1);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let service = service();

    let err = service
        .register_member(RegisterMember::new("m1", "nope"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Domain(DomainError::InvalidEmail(_))));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let service = service();

    service
        .register_member(RegisterMember::new("m1", "alice@example.com"))
        .await
        .unwrap();

    // Same address, different casing: the normalized pre-check catches it.
    let err = service
        .register_member(RegisterMember::new("m2", "Alice@Example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_register_with_password_hash() {
    let repo = InMemoryMemberRepository::new();
    let service = MemberService::new(repo);

    service
        .register_member(RegisterMember::new("m1", "alice@example.com").with_password_hash("$h"))
        .await
        .unwrap();

    // Credential lands with the registration; hashing happened upstream.
    use crate::repository::MemberRepository;
    let hash = service.repo().get_password_hash("m1").await.unwrap();
    assert_eq!(hash, "$h");
}

#[tokio::test]
async fn test_update_profile_validation() {
    let service = service();
    service
        .register_member(RegisterMember::new("m1", "alice@example.com"))
        .await
        .unwrap();

    let err = service
        .update_profile(UpdateProfile {
            member_id: "m1".to_string(),
            display_name: "A".to_string(),
            bio: String::new(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 20).unwrap(),
            gender: Gender::Female,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Domain(DomainError::DisplayNameTooShort)
    ));

    // Validation failed before staging: the stream is untouched.
    let member = service.get_member("m1").await.unwrap();
    assert_eq!(member.version(), 1);
}

#[tokio::test]
async fn test_activate_unknown_member() {
    let service = service();

    let err = service
        .activate_member(ActivateMember::new("ghost"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let repo = InMemoryMemberRepository::new();
    let service = MemberService::new(repo);

    // Register + save.
    service
        .register_member(RegisterMember::new("m1", "A@B.com"))
        .await
        .unwrap();

    let member = service.get_member("m1").await.unwrap();
    assert_eq!(member.status(), MemberStatus::Pending);
    assert_eq!(member.email().as_str(), "a@b.com");
    assert_eq!(member.version(), 1);

    // Activate + save.
    service
        .activate_member(ActivateMember::new("m1"))
        .await
        .unwrap();

    let member = service.get_member("m1").await.unwrap();
    assert_eq!(member.status(), MemberStatus::Active);
    assert_eq!(member.version(), 2);

    // Email lookup normalizes the probe and resolves to the same aggregate.
    let by_email = service.get_member_by_email("A@B.com").await.unwrap();
    assert_eq!(by_email.id(), member.id());
    assert_eq!(by_email.version(), member.version());
}

#[tokio::test]
async fn test_load_from_returns_activation_suffix() {
    let repo = InMemoryMemberRepository::new();

    let service = MemberService::new(repo);
    service
        .register_member(RegisterMember::new("m1", "a@b.com"))
        .await
        .unwrap();
    service
        .activate_member(ActivateMember::new("m1"))
        .await
        .unwrap();

    // Incremental replay from version 1 sees only the activation.
    let suffix = service
        .repo()
        .event_store()
        .load_from("m1", 1)
        .await
        .unwrap();

    assert_eq!(suffix.len(), 1);
    assert_eq!(suffix[0].event_type, "member.activated");
    assert_eq!(suffix[0].version, 2);
}
