//! Service module
//!
//! Command handlers that orchestrate aggregates and the repository.

mod member_service;

#[cfg(test)]
mod tests;

pub use member_service::MemberService;
