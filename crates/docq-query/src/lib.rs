//! Documentation queries over on-demand package registries.
//!
//! [`DocService`] ties the object index, the registry loader and the active
//! registry together so that each query (resolve owner, activate, read) runs
//! atomically.

mod report;
mod service;
mod stream;

pub use report::{Ancestor, CacheReport, Hierarchy, ObjectDoc, PackageSummary, SearchHit};
pub use service::DocService;
pub use stream::chunk_text;
