// Classifier registry
//
// Indexes the classifiers of every document taking part in a conversion by
// identity and by structural position, and keeps the one-to-one mapping
// between classifiers and graph nodes.

use super::cache::DocumentId;
use crate::graph::NodeId;
use crate::parser::{Classifier, Document, Package, PackageItem};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Index;
use tracing::{debug, warn};

/// Arena index of a registered classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassifierId(pub usize);

/// A classifier together with where it was found
#[derive(Debug, Clone)]
pub struct ClassifierEntry {
    pub classifier: Classifier,
    pub document: DocumentId,
    /// Name of the package that directly contains the classifier
    pub package: String,
    /// Dotted package path plus classifier name (`library.media.Book`)
    pub qualified_name: String,
    /// Registered from a foreign document
    pub external: bool,
}

/// One positional item of a containment level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Package { name: String, position: Vec<usize> },
    Classifier(ClassifierId),
}

/// Why a registry lookup failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
    Ambiguous(usize),
    InvalidStep(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::NotFound => write!(f, "no classifier matches"),
            LookupError::Ambiguous(n) => write!(f, "{} classifiers match", n),
            LookupError::InvalidStep(step) => {
                write!(f, "path step '{}' does not name a package", step)
            }
        }
    }
}

/// Classifier registry for one conversion
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<ClassifierEntry>,
    documents: HashSet<DocumentId>,
    /// Positional items per (document, package position); the empty
    /// position is the document's top level
    levels: HashMap<(DocumentId, Vec<usize>), Vec<Slot>>,
    by_id: HashMap<(DocumentId, String), ClassifierId>,
    nodes: HashMap<ClassifierId, NodeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the classifiers of a document's first package.
    ///
    /// Returns the newly registered ids in document order; registering the
    /// same document twice returns nothing.
    pub fn register_document(
        &mut self,
        id: DocumentId,
        document: &Document,
        external: bool,
    ) -> Vec<ClassifierId> {
        if !self.documents.insert(id) {
            return Vec::new();
        }

        let Some(package) = document.primary_package() else {
            warn!(path = %document.path.display(), "Document has no package");
            self.levels.insert((id, Vec::new()), Vec::new());
            return Vec::new();
        };

        let root_position = vec![0];
        self.levels.insert(
            (id, Vec::new()),
            vec![Slot::Package {
                name: package.name.clone(),
                position: root_position.clone(),
            }],
        );

        let mut added = Vec::new();
        self.register_package(id, package, root_position, &package.name, external, &mut added);

        debug!(
            path = %document.path.display(),
            classifiers = added.len(),
            external,
            "Registered document"
        );
        added
    }

    fn register_package(
        &mut self,
        document: DocumentId,
        package: &Package,
        position: Vec<usize>,
        qualifier: &str,
        external: bool,
        added: &mut Vec<ClassifierId>,
    ) {
        let mut slots = Vec::with_capacity(package.contents.len());

        for (index, item) in package.contents.iter().enumerate() {
            match item {
                PackageItem::Classifier(classifier) => {
                    let id = ClassifierId(self.entries.len());
                    if let Some(xmi_id) = &classifier.id {
                        self.by_id.entry((document, xmi_id.clone())).or_insert(id);
                    }
                    self.entries.push(ClassifierEntry {
                        classifier: classifier.clone(),
                        document,
                        package: package.name.clone(),
                        qualified_name: format!("{}.{}", qualifier, classifier.name),
                        external,
                    });
                    slots.push(Slot::Classifier(id));
                    added.push(id);
                }
                PackageItem::Package(sub) => {
                    let mut sub_position = position.clone();
                    sub_position.push(index);
                    slots.push(Slot::Package {
                        name: sub.name.clone(),
                        position: sub_position.clone(),
                    });
                    let sub_qualifier = format!("{}.{}", qualifier, sub.name);
                    self.register_package(document, sub, sub_position, &sub_qualifier, external, added);
                }
            }
        }

        self.levels.insert((document, position), slots);
    }

    pub fn get(&self, id: ClassifierId) -> Option<&ClassifierEntry> {
        self.entries.get(id.0)
    }

    /// Look up a classifier by xmi:id
    pub fn by_id(&self, document: DocumentId, id: &str) -> Result<ClassifierId, LookupError> {
        self.by_id
            .get(&(document, id.to_string()))
            .copied()
            .ok_or(LookupError::NotFound)
    }

    /// Look up a classifier by position steps and final name.
    ///
    /// Numeric steps select the n-th item of the current level; named steps
    /// select a subpackage by name.
    pub fn by_path(
        &self,
        document: DocumentId,
        steps: &[String],
        name: &str,
    ) -> Result<ClassifierId, LookupError> {
        let mut current: Option<Vec<usize>> = None;

        for step in steps {
            let base = current.clone().unwrap_or_default();
            let next = match step.parse::<usize>() {
                Ok(index) => match self.level(document, &base).get(index) {
                    Some(Slot::Package { position, .. }) => position.clone(),
                    _ => return Err(LookupError::InvalidStep(step.clone())),
                },
                Err(_) => {
                    // Named steps always start inside the top-level package
                    let base = current.clone().unwrap_or_else(|| vec![0]);
                    self.level(document, &base)
                        .iter()
                        .find_map(|slot| match slot {
                            Slot::Package { name, position } if name == step => {
                                Some(position.clone())
                            }
                            _ => None,
                        })
                        .ok_or_else(|| LookupError::InvalidStep(step.clone()))?
                }
            };
            current = Some(next);
        }

        let position = current.unwrap_or_else(|| vec![0]);
        let matches: Vec<ClassifierId> = self
            .level(document, &position)
            .iter()
            .filter_map(|slot| match slot {
                Slot::Classifier(id) if self.entries[id.0].classifier.name == name => Some(*id),
                _ => None,
            })
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(LookupError::NotFound),
            many => Err(LookupError::Ambiguous(many.len())),
        }
    }

    /// First classifier of a document with the given name, at any depth
    pub fn by_name(&self, document: DocumentId, name: &str) -> Option<ClassifierId> {
        self.entries
            .iter()
            .position(|e| e.document == document && e.classifier.name == name)
            .map(ClassifierId)
    }

    /// Items of one containment level
    pub fn level(&self, document: DocumentId, position: &[usize]) -> &[Slot] {
        self.levels
            .get(&(document, position.to_vec()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Graph node of a classifier, if one was created
    pub fn node_for(&self, id: ClassifierId) -> Option<NodeId> {
        self.nodes.get(&id).copied()
    }

    /// Record the node created for a classifier.
    ///
    /// The mapping is one-to-one; a classifier that already has a node keeps it.
    pub fn set_node_for(&mut self, id: ClassifierId, node: NodeId) -> NodeId {
        if let Some(existing) = self.nodes.get(&id) {
            return *existing;
        }
        self.nodes.insert(id, node);
        node
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Index<ClassifierId> for Registry {
    type Output = ClassifierEntry;

    fn index(&self, id: ClassifierId) -> &ClassifierEntry {
        &self.entries[id.0]
    }
}
