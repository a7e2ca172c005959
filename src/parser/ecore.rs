// Ecore document parser
//
// Turns the generic XML tree into the typed document model. Each element is
// tagged once with its ElementKind; nothing downstream looks at raw tags.

use super::ast::{
    Classifier, ClassifierKind, Document, FeatureKind, Package, PackageItem, StructuralFeature,
};
use super::xml::{local_name, parse_xml, XmlElement};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, trace};

/// The closed set of element kinds the converter cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Package,
    Classifier(ClassifierKind),
    Attribute,
    Reference,
}

impl ElementKind {
    /// Map an `xsi:type` value (`ecore:EClass`) to an element kind
    pub fn from_xsi_type(value: &str) -> Option<Self> {
        match local_name(value.trim()) {
            "EPackage" => Some(ElementKind::Package),
            "EClass" => Some(ElementKind::Classifier(ClassifierKind::Class)),
            "EDataType" => Some(ElementKind::Classifier(ClassifierKind::DataType)),
            "EEnum" => Some(ElementKind::Classifier(ClassifierKind::Enum)),
            "EAttribute" => Some(ElementKind::Attribute),
            "EReference" => Some(ElementKind::Reference),
            _ => None,
        }
    }

    /// Classify an element by `xsi:type`, falling back to its tag
    pub fn classify(element: &XmlElement) -> Option<Self> {
        if let Some(kind) = element.attr("xsi:type").and_then(Self::from_xsi_type) {
            return Some(kind);
        }
        match element.local_name() {
            "EPackage" | "eSubpackages" => Some(ElementKind::Package),
            "EClass" => Some(ElementKind::Classifier(ClassifierKind::Class)),
            "EDataType" => Some(ElementKind::Classifier(ClassifierKind::DataType)),
            "EEnum" => Some(ElementKind::Classifier(ClassifierKind::Enum)),
            "EAttribute" => Some(ElementKind::Attribute),
            "EReference" => Some(ElementKind::Reference),
            _ => None,
        }
    }
}

/// Parser for `.ecore` metamodel files
#[derive(Debug, Default, Clone)]
pub struct EcoreParser;

impl EcoreParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a metamodel file
    pub fn parse_file(&self, path: &Path) -> Result<Document> {
        let contents = std::fs::read_to_string(path)?;
        self.parse_str(&contents, path)
    }

    /// Parse metamodel text; `path` is recorded on the document and in errors
    pub fn parse_str(&self, input: &str, path: &Path) -> Result<Document> {
        let root = parse_xml(input, path)?;
        let mut document = Document::new(path.to_path_buf());

        let package_elements: Vec<&XmlElement> = match ElementKind::classify(&root) {
            Some(ElementKind::Package) => vec![&root],
            _ if root.local_name() == "XMI" => root
                .children
                .iter()
                .filter(|c| ElementKind::classify(c) == Some(ElementKind::Package))
                .collect(),
            _ => {
                return Err(Error::parse(
                    path,
                    format!("root element '{}' is not an EPackage", root.name),
                ))
            }
        };

        if package_elements.is_empty() {
            return Err(Error::parse(path, "document contains no EPackage"));
        }

        for element in package_elements {
            document.packages.push(parse_package(element, path)?);
        }

        debug!(
            path = %path.display(),
            packages = document.packages.len(),
            "Parsed metamodel"
        );
        Ok(document)
    }
}

fn parse_package(element: &XmlElement, path: &Path) -> Result<Package> {
    let name = required_name(element, "EPackage", path)?;
    let mut package = Package {
        id: identity(element),
        name,
        ns_uri: element.attr("nsURI").map(str::to_string),
        ns_prefix: element.attr("nsPrefix").map(str::to_string),
        contents: Vec::new(),
    };

    for child in &element.children {
        match ElementKind::classify(child) {
            Some(ElementKind::Package) => {
                package
                    .contents
                    .push(PackageItem::Package(parse_package(child, path)?));
            }
            Some(ElementKind::Classifier(kind)) => {
                package
                    .contents
                    .push(PackageItem::Classifier(parse_classifier(child, kind, path)?));
            }
            _ => trace!(tag = %child.name, "Skipping package child"),
        }
    }

    Ok(package)
}

fn parse_classifier(element: &XmlElement, kind: ClassifierKind, path: &Path) -> Result<Classifier> {
    let name = required_name(element, "classifier", path)?;
    let mut classifier = Classifier::new(&name, kind);
    classifier.id = identity(element);
    classifier.is_abstract = flag(element, "abstract");
    classifier.is_interface = flag(element, "interface");

    classifier.super_types = match element.attr("eSuperTypes") {
        Some(list) => split_type_list(list),
        None => element
            .children_named("eGenericSuperTypes")
            .filter_map(|g| g.attr("eClassifier"))
            .map(str::to_string)
            .collect(),
    };

    if kind == ClassifierKind::Class {
        for child in &element.children {
            let feature_kind = match ElementKind::classify(child) {
                Some(ElementKind::Attribute) => FeatureKind::Attribute,
                Some(ElementKind::Reference) => FeatureKind::Reference,
                _ => continue,
            };
            classifier
                .features
                .push(parse_feature(child, feature_kind, &name, path)?);
        }
    }

    Ok(classifier)
}

fn parse_feature(
    element: &XmlElement,
    kind: FeatureKind,
    owner: &str,
    path: &Path,
) -> Result<StructuralFeature> {
    let name = element
        .attr("name")
        .map(str::to_string)
        .ok_or_else(|| Error::parse(path, format!("feature of '{}' has no name", owner)))?;

    let raw_type = element
        .attr("eType")
        .or_else(|| {
            element
                .children_named("eGenericType")
                .next()
                .and_then(|g| g.attr("eClassifier"))
        })
        .ok_or_else(|| Error::parse(path, format!("feature '{}.{}' has no type", owner, name)))?;

    let lower = bound(element, "lowerBound", 0, owner, &name, path)?;
    let upper = bound(element, "upperBound", 1, owner, &name, path)?;
    if lower < 0 || (upper != -1 && upper < lower) {
        return Err(Error::parse(
            path,
            format!("feature '{}.{}' has invalid bounds {}..{}", owner, name, lower, upper),
        ));
    }

    let is_reference = kind == FeatureKind::Reference;
    Ok(StructuralFeature {
        name,
        kind,
        type_ref: strip_type_hint(raw_type).to_string(),
        lower,
        upper,
        containment: is_reference && flag(element, "containment"),
        opposite: if is_reference {
            element.attr("eOpposite").map(str::to_string)
        } else {
            None
        },
    })
}

fn required_name(element: &XmlElement, what: &str, path: &Path) -> Result<String> {
    element
        .attr("name")
        .map(str::to_string)
        .ok_or_else(|| Error::parse(path, format!("{} without a name attribute", what)))
}

fn identity(element: &XmlElement) -> Option<String> {
    element.attr("xmi:id").map(str::to_string)
}

fn flag(element: &XmlElement, key: &str) -> bool {
    element.attr(key) == Some("true")
}

fn bound(
    element: &XmlElement,
    key: &str,
    default: i64,
    owner: &str,
    feature: &str,
    path: &Path,
) -> Result<i64> {
    match element.attr(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            Error::parse(
                path,
                format!("feature '{}.{}' has non-numeric {} '{}'", owner, feature, key, value),
            )
        }),
    }
}

/// Drop a leading type hint (`ecore:EDataType http://...#//EString`)
pub fn strip_type_hint(raw: &str) -> &str {
    raw.split_whitespace().last().unwrap_or("")
}

/// Split a whitespace-separated reference list, skipping type hints
pub fn split_type_list(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .filter(|token| !is_type_hint(token))
        .map(str::to_string)
        .collect()
}

fn is_type_hint(token: &str) -> bool {
    token.contains(':') && !token.contains('#') && !token.contains('/')
}
