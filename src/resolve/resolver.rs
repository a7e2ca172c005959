// Reference resolver
//
// Interprets parsed type references against the registry, loading foreign
// metamodels through the document cache when a reference leaves the input
// document.

use super::cache::{DocumentCache, DocumentId};
use super::reference::{last_segment, TypeReference};
use super::registry::{ClassifierId, LookupError, Registry};
use crate::config::{Catalog, ConversionConfig};
use crate::error::{Error, Result};
use crate::parser::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Prefix used for types whose metamodel could not be loaded
pub const UNKNOWN_PACKAGE: &str = "Unknown";

/// What a reference denotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    /// A classifier that is (or becomes) a graph node
    Node(ClassifierId),
    /// Display text only, never an edge endpoint
    PrimitiveLabel(String),
}

/// Outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ty: ResolvedType,
    /// The type lives outside the diagram (built-in or foreign label)
    pub external: bool,
}

impl Resolution {
    fn node(id: ClassifierId) -> Self {
        Self {
            ty: ResolvedType::Node(id),
            external: false,
        }
    }

    fn label(text: impl Into<String>, external: bool) -> Self {
        Self {
            ty: ResolvedType::PrimitiveLabel(text.into()),
            external,
        }
    }

    pub fn as_node(&self) -> Option<ClassifierId> {
        match self.ty {
            ResolvedType::Node(id) => Some(id),
            ResolvedType::PrimitiveLabel(_) => None,
        }
    }
}

/// Resolves raw references for one conversion
pub struct Resolver<'a> {
    options: &'a ConversionConfig,
    catalog: &'a Catalog,
    /// Directory of the input document; relative locators start here
    base_dir: PathBuf,
    document: DocumentId,
    cache: DocumentCache,
    warnings: Vec<String>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for `input`, which becomes the first cached document
    pub fn new(options: &'a ConversionConfig, catalog: &'a Catalog, input: Document) -> Self {
        let base_dir = input
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut cache = DocumentCache::new();
        let document = cache.insert(input);

        Self {
            options,
            catalog,
            base_dir,
            document,
            cache,
            warnings: Vec::new(),
        }
    }

    /// Id of the input document
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// The input document
    pub fn input(&self) -> Option<&Document> {
        self.cache.get(self.document)
    }

    pub fn options(&self) -> &ConversionConfig {
        self.options
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Drain the warnings collected so far
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Resolve a raw reference found on `owner` (`Class.feature` or `Class`)
    pub fn resolve(&mut self, registry: &mut Registry, raw: &str, owner: &str) -> Result<Resolution> {
        let reference = TypeReference::parse(raw);
        trace!(reference = %raw, owner, "Resolving");

        match reference {
            TypeReference::LocalById(id) => {
                let found = registry.by_id(self.document, &id);
                self.local(registry, found, raw, owner)
            }
            TypeReference::LocalByPath { steps, name } => {
                let found = registry.by_path(self.document, &steps, &name);
                self.local(registry, found, raw, owner)
            }
            TypeReference::BuiltinPrimitive(name) => Ok(Resolution::label(name, true)),
            TypeReference::Foreign { locator, path } => {
                self.foreign(registry, raw, &locator, &path, owner)
            }
        }
    }

    fn local(
        &self,
        registry: &Registry,
        found: std::result::Result<ClassifierId, LookupError>,
        raw: &str,
        owner: &str,
    ) -> Result<Resolution> {
        let id = found.map_err(|e| Error::resolution(raw, owner, e.to_string()))?;
        let classifier = &registry[id].classifier;
        if classifier.is_class() {
            Ok(Resolution::node(id))
        } else {
            Ok(Resolution::label(classifier.name.clone(), false))
        }
    }

    fn foreign(
        &mut self,
        registry: &mut Registry,
        raw: &str,
        locator: &str,
        path: &str,
        owner: &str,
    ) -> Result<Resolution> {
        let name = last_segment(path);
        let location = self.locate(locator);

        let document = match self.cache.load(&location) {
            Ok(id) => id,
            Err(message) => {
                if self.options.strict_foreign_load || self.options.materialize_external {
                    return Err(Error::ExternalLoad {
                        locator: locator.to_string(),
                        path: location,
                        reference: raw.to_string(),
                        owner: owner.to_string(),
                        message,
                    });
                }
                let warning = format!(
                    "Cannot load metamodel '{}' for {} ({}); using placeholder type",
                    locator, owner, message
                );
                warn!(locator, owner, path = %location.display(), "Foreign metamodel unavailable, using placeholder type");
                self.warnings.push(warning);
                return Ok(Resolution::label(format!("{}::{}", UNKNOWN_PACKAGE, name), true));
            }
        };

        // A locator pointing back at the input is an ordinary local reference
        if document == self.document {
            return self.resolve(registry, &format!("#{}", path), owner);
        }

        let Some(foreign) = self.cache.get(document) else {
            return Err(Error::resolution(raw, owner, "foreign document vanished from cache"));
        };
        let package = foreign
            .primary_package()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_PACKAGE.to_string());

        if !self.options.materialize_external {
            return Ok(Resolution::label(format!("{}::{}", package, name), true));
        }

        let added = registry.register_document(document, foreign, true);
        if !added.is_empty() {
            debug!(path = %location.display(), classifiers = added.len(), "Registered foreign metamodel");
        }

        let id = registry.by_name(document, name).ok_or_else(|| {
            Error::resolution(
                raw,
                owner,
                format!("no classifier named '{}' in {}", name, location.display()),
            )
        })?;

        if registry[id].classifier.is_class() {
            Ok(Resolution::node(id))
        } else {
            Ok(Resolution::label(format!("{}::{}", package, name), true))
        }
    }

    /// Whether a foreign locator names the input document itself
    pub fn refers_to_input(&self, locator: &str) -> bool {
        self.cache.lookup(&self.locate(locator)) == Some(self.document)
    }

    /// File location for a foreign locator: catalog entry first, then the
    /// locator itself, both relative to the input document's directory
    pub fn locate(&self, locator: &str) -> PathBuf {
        match self.catalog.lookup(locator) {
            Some(path) => self.base_dir.join(path),
            None => self.base_dir.join(locator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::EcoreParser;
    use std::fs;
    use tempfile::TempDir;

    const INPUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ecore:EPackage xmlns:xmi="http://www.omg.org/XMI" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore" name="library">
  <eClassifiers xsi:type="ecore:EClass" xmi:id="_book" name="Book"/>
  <eClassifiers xsi:type="ecore:EEnum" name="Genre"/>
  <eSubpackages name="staff">
    <eClassifiers xsi:type="ecore:EClass" name="Clerk"/>
  </eSubpackages>
</ecore:EPackage>"#;

    const CONTACTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ecore:EPackage xmlns:xmi="http://www.omg.org/XMI" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore" name="contacts">
  <eClassifiers xsi:type="ecore:EClass" name="Address"/>
  <eClassifiers xsi:type="ecore:EDataType" name="Zip"/>
</ecore:EPackage>"#;

    struct Fixture {
        dir: TempDir,
        input: Document,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let input_path = dir.path().join("library.ecore");
        fs::write(&input_path, INPUT).unwrap();
        fs::write(dir.path().join("contacts.ecore"), CONTACTS).unwrap();
        let input = EcoreParser::new().parse_file(&input_path).unwrap();
        Fixture { dir, input }
    }

    fn setup<'a>(
        options: &'a ConversionConfig,
        catalog: &'a Catalog,
        input: Document,
    ) -> (Resolver<'a>, Registry) {
        let resolver = Resolver::new(options, catalog, input.clone());
        let mut registry = Registry::new();
        registry.register_document(resolver.document(), &input, false);
        (resolver, registry)
    }

    #[test]
    fn test_resolve_local_class_by_path_and_id() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let by_path = resolver.resolve(&mut registry, "#//Book", "A.b").unwrap();
        let by_id = resolver.resolve(&mut registry, "_book", "A.b").unwrap();
        assert_eq!(by_path, by_id);
        assert!(!by_path.external);
        assert_eq!(registry[by_path.as_node().unwrap()].classifier.name, "Book");

        let nested = resolver.resolve(&mut registry, "#//staff/Clerk", "A.c").unwrap();
        assert!(nested.as_node().is_some());
    }

    #[test]
    fn test_resolve_local_enum_is_label() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver.resolve(&mut registry, "#//Genre", "Book.genre").unwrap();
        assert_eq!(resolution.ty, ResolvedType::PrimitiveLabel("Genre".to_string()));
        assert!(!resolution.external);
    }

    #[test]
    fn test_resolve_local_failure_is_fatal() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let err = resolver
            .resolve(&mut registry, "#//Missing", "Book.other")
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { ref reference, ref owner, .. }
            if reference == "#//Missing" && owner == "Book.other"));
    }

    #[test]
    fn test_resolve_builtin() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver
            .resolve(&mut registry, "http://www.eclipse.org/emf/2002/Ecore#//EString", "Book.title")
            .unwrap();
        assert_eq!(resolution.ty, ResolvedType::PrimitiveLabel("EString".to_string()));
        assert!(resolution.external);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn test_resolve_foreign_without_materialization() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver
            .resolve(&mut registry, "contacts.ecore#//Address", "Book.address")
            .unwrap();
        assert_eq!(
            resolution.ty,
            ResolvedType::PrimitiveLabel("contacts::Address".to_string())
        );
        assert!(resolution.external);
        // Nothing foreign gets registered
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_resolve_foreign_materialized_is_idempotent() {
        let f = fixture();
        let options = ConversionConfig {
            materialize_external: true,
            ..Default::default()
        };
        let catalog = Catalog::new();
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let first = resolver
            .resolve(&mut registry, "contacts.ecore#//Address", "Book.home")
            .unwrap();
        let second = resolver
            .resolve(&mut registry, "contacts.ecore#//Address", "Book.work")
            .unwrap();
        assert_eq!(first, second);
        assert!(!first.external);

        let id = first.as_node().unwrap();
        assert!(registry[id].external);
        assert_eq!(registry[id].qualified_name, "contacts.Address");
        assert_eq!(resolver.cache().len(), 2);
    }

    #[test]
    fn test_resolve_foreign_materialized_data_type_is_label() {
        let f = fixture();
        let options = ConversionConfig {
            materialize_external: true,
            ..Default::default()
        };
        let catalog = Catalog::new();
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver
            .resolve(&mut registry, "contacts.ecore#//Zip", "Book.zip")
            .unwrap();
        assert_eq!(resolution.ty, ResolvedType::PrimitiveLabel("contacts::Zip".to_string()));
    }

    #[test]
    fn test_resolve_foreign_materialized_miss_is_fatal() {
        let f = fixture();
        let options = ConversionConfig {
            materialize_external: true,
            ..Default::default()
        };
        let catalog = Catalog::new();
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let err = resolver
            .resolve(&mut registry, "contacts.ecore#//Phone", "Book.phone")
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_resolve_missing_foreign_degrades() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver
            .resolve(&mut registry, "nowhere.ecore#//Foo", "Book.field")
            .unwrap();
        assert_eq!(resolution.ty, ResolvedType::PrimitiveLabel("Unknown::Foo".to_string()));
        assert!(resolution.external);

        let warnings = resolver.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("nowhere.ecore"));
        assert!(resolver.take_warnings().is_empty());
    }

    #[test]
    fn test_resolve_missing_foreign_strict_is_fatal() {
        let f = fixture();
        let options = ConversionConfig {
            strict_foreign_load: true,
            ..Default::default()
        };
        let catalog = Catalog::new();
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let err = resolver
            .resolve(&mut registry, "nowhere.ecore#//Foo", "Book.field")
            .unwrap_err();
        assert!(matches!(err, Error::ExternalLoad { ref locator, .. } if locator == "nowhere.ecore"));
    }

    #[test]
    fn test_resolve_missing_foreign_with_materialization_is_fatal() {
        let f = fixture();
        let options = ConversionConfig {
            materialize_external: true,
            ..Default::default()
        };
        let catalog = Catalog::new();
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let err = resolver
            .resolve(&mut registry, "nowhere.ecore#//Foo", "Book.field")
            .unwrap_err();
        assert!(matches!(err, Error::ExternalLoad { .. }));
    }

    #[test]
    fn test_catalog_maps_locator() {
        let f = fixture();
        let options = ConversionConfig::default();
        let mut catalog = Catalog::new();
        catalog.insert("http://example.org/contacts", "contacts.ecore");
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        assert_eq!(
            resolver.locate("http://example.org/contacts"),
            f.dir.path().join("contacts.ecore")
        );
        let resolution = resolver
            .resolve(&mut registry, "http://example.org/contacts#//Address", "Book.address")
            .unwrap();
        assert_eq!(
            resolution.ty,
            ResolvedType::PrimitiveLabel("contacts::Address".to_string())
        );
    }

    #[test]
    fn test_self_locator_resolves_locally() {
        let f = fixture();
        let (options, catalog) = (ConversionConfig::default(), Catalog::new());
        let (mut resolver, mut registry) = setup(&options, &catalog, f.input);

        let resolution = resolver
            .resolve(&mut registry, "library.ecore#//Book", "Book.next")
            .unwrap();
        assert!(resolution.as_node().is_some());
        assert_eq!(resolver.cache().len(), 1);
    }
}
