//! Database access for MedGate
//!
//! All persistence goes through the [`ContentStore`] trait. Production uses
//! [`SupabaseStore`] (PostgREST over HTTP); dev mode and tests use
//! [`MemoryStore`].

pub mod memory;
pub mod schemas;
pub mod store;
pub mod supabase;

pub use memory::MemoryStore;
pub use store::ContentStore;
pub use supabase::{KeyTier, SupabaseClient, SupabaseStore};
