pub mod clarity;
pub mod handlers;
