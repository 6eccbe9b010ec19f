use std::collections::{BTreeMap, HashMap};
use std::mem::size_of;

use docq_memory::MemoryFootprint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Module,
    Class,
    Method,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// One documented object, addressed by its fully qualified path (`Net::HTTP#get`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocObject {
    pub path: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub docstring: String,
    #[serde(default)]
    pub signature: Option<String>,
    /// Enclosing namespace path, `None` for top-level objects.
    #[serde(default)]
    pub parent: Option<String>,
    /// Superclass path (classes only). May live in another package.
    #[serde(default)]
    pub superclass: Option<String>,
    /// Included/extended module paths, in declaration order.
    #[serde(default)]
    pub mixins: Vec<String>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
}

impl DocObject {
    pub fn new(path: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            path: path.into(),
            kind,
            docstring: String::new(),
            signature: None,
            parent: None,
            superclass: None,
            mixins: Vec::new(),
            source: None,
        }
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = docstring.into();
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source = Some(SourceLocation {
            file: file.into(),
            line,
        });
        self
    }

    fn heap_bytes(&self) -> Option<u64> {
        let strings = [
            Some(&self.path),
            Some(&self.docstring),
            self.signature.as_ref(),
            self.parent.as_ref(),
            self.superclass.as_ref(),
            self.source.as_ref().map(|source| &source.file),
        ];
        let mut bytes = size_of::<Self>() as u64;
        for s in strings.into_iter().flatten() {
            bytes = bytes.checked_add(s.capacity() as u64)?;
        }
        for mixin in &self.mixins {
            bytes = bytes.checked_add((size_of::<String>() + mixin.capacity()) as u64)?;
        }
        Some(bytes)
    }
}

/// Immutable documentation index for one package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    package: String,
    version: String,
    objects: BTreeMap<String, DocObject>,
    children: HashMap<String, Vec<String>>,
}

impl Registry {
    /// Build a registry. Later objects with a duplicate path replace earlier ones.
    pub fn new(
        package: impl Into<String>,
        version: impl Into<String>,
        objects: impl IntoIterator<Item = DocObject>,
    ) -> Self {
        let objects: BTreeMap<String, DocObject> = objects
            .into_iter()
            .map(|object| (object.path.clone(), object))
            .collect();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for object in objects.values() {
            if let Some(parent) = &object.parent {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(object.path.clone());
            }
        }

        Self {
            package: package.into(),
            version: version.into(),
            objects,
            children,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&DocObject> {
        self.objects.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// All objects, ordered by path.
    pub fn objects(&self) -> impl Iterator<Item = &DocObject> + '_ {
        self.objects.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.objects.keys().map(String::as_str)
    }

    /// Direct children of `path`, ordered by path.
    pub fn children(&self, path: &str) -> &[String] {
        self.children.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl MemoryFootprint for Registry {
    fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Strings owned by each object plus struct sizes, keys and child lists.
    ///
    /// Returns `None` only if the sum overflows, which sends the estimator to its
    /// per-object fallback.
    fn heap_bytes(&self) -> Option<u64> {
        let mut bytes = (size_of::<Self>() + self.package.capacity() + self.version.capacity()) as u64;
        for (key, object) in &self.objects {
            bytes = bytes.checked_add(key.capacity() as u64)?;
            bytes = bytes.checked_add(object.heap_bytes()?)?;
        }
        for (parent, children) in &self.children {
            bytes = bytes.checked_add(parent.capacity() as u64)?;
            for child in children {
                bytes = bytes.checked_add((size_of::<String>() + child.capacity()) as u64)?;
            }
        }
        Some(bytes)
    }
}
