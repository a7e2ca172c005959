// Metamodel document types
//
// These types represent the parts of an Ecore document that matter for
// diagramming: packages, classifiers and their structural features.
// Everything is created once by the parser and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed metamodel document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// File the document was read from
    pub path: PathBuf,
    /// Top-level packages in document order
    pub packages: Vec<Package>,
}

impl Document {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            packages: Vec::new(),
        }
    }

    /// The package that gets converted; later top-level packages are ignored
    pub fn primary_package(&self) -> Option<&Package> {
        self.packages.first()
    }
}

/// An EPackage (top-level or nested)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Package {
    pub id: Option<String>,
    pub name: String,
    pub ns_uri: Option<String>,
    pub ns_prefix: Option<String>,
    /// Classifiers and subpackages in document order
    pub contents: Vec<PackageItem>,
}

impl Package {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Classifiers declared directly in this package
    pub fn classifiers(&self) -> impl Iterator<Item = &Classifier> {
        self.contents.iter().filter_map(|item| match item {
            PackageItem::Classifier(c) => Some(c),
            PackageItem::Package(_) => None,
        })
    }

    /// Direct subpackages
    pub fn subpackages(&self) -> impl Iterator<Item = &Package> {
        self.contents.iter().filter_map(|item| match item {
            PackageItem::Package(p) => Some(p),
            PackageItem::Classifier(_) => None,
        })
    }
}

/// One positional item of a package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PackageItem {
    Classifier(Classifier),
    Package(Package),
}

/// Kind of classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// EClass, rendered as a node
    Class,
    /// EDataType, only ever used as a type label
    DataType,
    /// EEnum, only ever used as a type label
    Enum,
}

/// A classifier declared in a package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classifier {
    /// Document-local identity (xmi:id), if any
    pub id: Option<String>,
    pub name: String,
    pub kind: ClassifierKind,
    pub is_abstract: bool,
    pub is_interface: bool,
    /// Structural features in declaration order
    pub features: Vec<StructuralFeature>,
    /// Raw supertype references
    pub super_types: Vec<String>,
}

impl Classifier {
    pub fn new(name: &str, kind: ClassifierKind) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            kind,
            is_abstract: false,
            is_interface: false,
            features: Vec::new(),
            super_types: Vec::new(),
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind == ClassifierKind::Class
    }

    /// Find a feature by name
    pub fn feature(&self, name: &str) -> Option<(usize, &StructuralFeature)> {
        self.features.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// Attribute or reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Attribute,
    Reference,
}

/// A structural feature of a classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuralFeature {
    pub name: String,
    pub kind: FeatureKind,
    /// Raw type reference, type hint already removed
    pub type_ref: String,
    pub lower: i64,
    /// -1 means unbounded
    pub upper: i64,
    /// Only meaningful for references
    pub containment: bool,
    /// Raw opposite reference (references only)
    pub opposite: Option<String>,
}

impl StructuralFeature {
    /// An attribute with Ecore's default bounds (0..1)
    pub fn attribute(name: &str, type_ref: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Attribute,
            type_ref: type_ref.to_string(),
            lower: 0,
            upper: 1,
            containment: false,
            opposite: None,
        }
    }

    /// A non-containment reference with Ecore's default bounds (0..1)
    pub fn reference(name: &str, type_ref: &str) -> Self {
        Self {
            kind: FeatureKind::Reference,
            ..Self::attribute(name, type_ref)
        }
    }

    pub fn with_bounds(mut self, lower: i64, upper: i64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_containment(mut self) -> Self {
        self.containment = true;
        self
    }

    pub fn with_opposite(mut self, opposite: &str) -> Self {
        self.opposite = Some(opposite.to_string());
        self
    }

    pub fn is_reference(&self) -> bool {
        self.kind == FeatureKind::Reference
    }
}
