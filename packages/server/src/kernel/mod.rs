//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod background;
pub mod content_source;
pub mod deps;
pub mod error;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAiJudge;
pub use background::catch_panic;
pub use content_source::HttpContentSource;
pub use deps::ServerDeps;
pub use error::{FetchError, JudgeError};
pub use store::{MemoryStore, PostgresStore, RecordStore, StoreError};
pub use test_dependencies::{FailingStore, MockContentSource, MockJudge, TestDependencies};
pub use traits::*;
