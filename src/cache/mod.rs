//! In-process caches

pub mod navigation;

pub use navigation::{NavLink, NavigationCache, NavigationCacheStats};
