//! Repository module
//!
//! Unit-of-work orchestration: persisting an aggregate's pending events plus
//! its read-model row atomically, and rehydrating aggregates from the event
//! stream. The read model is never trusted as the source of returned state;
//! it only resolves id-less lookups.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::aggregate::Member;
use crate::error::AppResult;

pub use memory::InMemoryMemberRepository;
pub use postgres::PostgresMemberRepository;

/// Repository contract consumed by command/query handlers.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Persist the member's pending events and update its read-model row as
    /// one atomic unit. A member without pending changes is a no-op. Clears
    /// the pending-changes buffer only after a successful commit.
    async fn save(&self, member: &mut Member) -> AppResult<()>;

    /// Rehydrate a member by replaying its full event stream.
    async fn get_by_id(&self, id: &str) -> AppResult<Member>;

    /// Resolve the id via the read model, then rehydrate from the stream.
    async fn get_by_email(&self, email: &str) -> AppResult<Member>;

    /// Like [`save`](Self::save), additionally storing the credential hash
    /// in the same transaction. Hashing itself is the caller's concern.
    async fn save_with_password(&self, member: &mut Member, password_hash: &str) -> AppResult<()>;

    /// Fetch the stored credential hash for a member.
    async fn get_password_hash(&self, id: &str) -> AppResult<String>;
}
