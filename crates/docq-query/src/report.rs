use docq_memory::MemoryPressure;
use docq_registry::{CacheStats, DocObject, ObjectKind, SourceLocation};
use serde::Serialize;

/// Documentation for one object, as returned by [`crate::DocService::lookup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDoc {
    pub path: String,
    pub package: String,
    pub kind: ObjectKind,
    pub docstring: String,
    pub signature: Option<String>,
    pub parent: Option<String>,
    pub source: Option<SourceLocation>,
}

impl ObjectDoc {
    pub(crate) fn new(package: &str, object: &DocObject) -> Self {
        Self {
            path: object.path.clone(),
            package: package.to_owned(),
            kind: object.kind,
            docstring: object.docstring.clone(),
            signature: object.signature.clone(),
            parent: object.parent.clone(),
            source: object.source.clone(),
        }
    }
}

/// One step of a superclass chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ancestor {
    pub path: String,
    /// Owning package; `None` when no installed package defines the class.
    pub package: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    pub path: String,
    pub package: String,
    pub kind: ObjectKind,
    /// Nearest superclass first.
    pub ancestors: Vec<Ancestor>,
    pub mixins: Vec<String>,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub package: String,
    pub kind: ObjectKind,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
    /// Currently held by the registry cache.
    pub resident: bool,
    pub indexed: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub usage_ratio: f64,
    pub pressure: MemoryPressure,
    pub indexed_packages: usize,
    pub indexed_paths: usize,
    pub active_package: Option<String>,
}
