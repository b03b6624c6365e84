pub mod cfg;
pub mod config;
pub mod error;
pub mod ids;
pub mod pattern;
pub mod progress;
pub mod project;
pub mod relationship;
pub mod store;
pub mod symbol;
pub mod traits;
pub mod types;

pub use cfg::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use pattern::*;
pub use progress::*;
pub use project::*;
pub use relationship::*;
pub use store::*;
pub use symbol::*;
pub use traits::*;
pub use types::*;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;
