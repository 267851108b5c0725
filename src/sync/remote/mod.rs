pub mod api;
pub mod supabase;

#[cfg(test)]
pub mod mock;

pub use api::RemoteStore;
pub use supabase::{SupabaseConfig, SupabaseRemote};
