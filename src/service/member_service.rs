//! Member Service
//!
//! Command-side entry points. Each handler loads (or constructs) the
//! aggregate, lets it validate and stage events, then hands it to the
//! repository for an atomic commit.

use crate::aggregate::{Aggregate, Member};
use crate::domain::{ActivateMember, Profile, RegisterMember, UpdateProfile};
use crate::error::{AppError, AppResult};
use crate::repository::MemberRepository;

/// Command handlers for the member aggregate.
#[derive(Debug, Clone)]
pub struct MemberService<R> {
    repo: R,
}

impl<R: MemberRepository> MemberService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Register a new member.
    ///
    /// The duplicate-email pre-check here is not atomic with the insert;
    /// the read model's unique email index catches the race and the loser
    /// gets `AlreadyExists` either way.
    pub async fn register_member(&self, cmd: RegisterMember) -> AppResult<Member> {
        let mut member = Member::register(&cmd.member_id, &cmd.email)?;

        match self.repo.get_by_email(member.email().as_str()).await {
            Ok(_) => return Err(AppError::AlreadyExists(member.email().to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match cmd.password_hash.as_deref() {
            Some(hash) => self.repo.save_with_password(&mut member, hash).await?,
            None => self.repo.save(&mut member).await?,
        }

        tracing::info!(member_id = member.id(), "member registered");
        Ok(member)
    }

    /// Replace a member's profile.
    pub async fn update_profile(&self, cmd: UpdateProfile) -> AppResult<Member> {
        let mut member = self.repo.get_by_id(&cmd.member_id).await?;

        let profile = Profile::new(cmd.display_name, cmd.bio, cmd.birth_date, cmd.gender)?;
        member.update_profile(profile);

        self.repo.save(&mut member).await?;

        tracing::debug!(member_id = member.id(), version = member.version(), "profile updated");
        Ok(member)
    }

    /// Activate a member. Saving an already-active member is a no-op.
    pub async fn activate_member(&self, cmd: ActivateMember) -> AppResult<Member> {
        let mut member = self.repo.get_by_id(&cmd.member_id).await?;

        member.activate();
        self.repo.save(&mut member).await?;

        tracing::info!(member_id = member.id(), "member activated");
        Ok(member)
    }

    /// Rehydrate a member by id.
    pub async fn get_member(&self, member_id: &str) -> AppResult<Member> {
        self.repo.get_by_id(member_id).await
    }

    /// Resolve a member by email via the read model, then rehydrate.
    pub async fn get_member_by_email(&self, email: &str) -> AppResult<Member> {
        self.repo.get_by_email(email).await
    }
}
