// Type reference syntax
//
// Pure parsing of raw reference strings into tagged variants. Nothing here
// touches documents; interpretation happens in the resolver.

use std::fmt;

/// Namespace of the built-in Ecore metamodel
pub const ECORE_NS_URI: &str = "http://www.eclipse.org/emf/2002/Ecore";

const ECORE_MODEL_FILE: &str = "Ecore.ecore";

/// Parsed form of a raw type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeReference {
    /// Same document, resolved by xmi:id
    LocalById(String),
    /// Same document, resolved by position; `steps` are the segments
    /// before the final classifier name
    LocalByPath { steps: Vec<String>, name: String },
    /// A type from the built-in Ecore metamodel
    BuiltinPrimitive(String),
    /// A type in another document
    Foreign { locator: String, path: String },
}

impl TypeReference {
    /// Parse a raw reference (type hints must already be stripped)
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('#') {
            None => TypeReference::LocalById(raw.to_string()),
            Some(("", path)) => Self::local_path(path),
            Some((locator, path)) if is_builtin(locator) => {
                TypeReference::BuiltinPrimitive(last_segment(path).to_string())
            }
            Some((locator, path)) => TypeReference::Foreign {
                locator: locator.to_string(),
                path: path.to_string(),
            },
        }
    }

    /// Build a `LocalByPath` from the part after `#`
    pub fn local_path(path: &str) -> Self {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let name = segments.pop().unwrap_or("").to_string();
        TypeReference::LocalByPath {
            steps: segments.into_iter().map(str::to_string).collect(),
            name,
        }
    }

    /// The name a reader would use for the referenced type
    pub fn trailing_name(&self) -> &str {
        match self {
            TypeReference::LocalById(id) => id,
            TypeReference::LocalByPath { name, .. } => name,
            TypeReference::BuiltinPrimitive(name) => name,
            TypeReference::Foreign { path, .. } => last_segment(path),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TypeReference::LocalById(_) | TypeReference::LocalByPath { .. }
        )
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::LocalById(id) => write!(f, "{}", id),
            TypeReference::LocalByPath { steps, name } => {
                write!(f, "#/")?;
                for step in steps {
                    write!(f, "/{}", step)?;
                }
                write!(f, "/{}", name)
            }
            TypeReference::BuiltinPrimitive(name) => write!(f, "{}#//{}", ECORE_NS_URI, name),
            TypeReference::Foreign { locator, path } => write!(f, "{}#{}", locator, path),
        }
    }
}

/// Whether a locator names the built-in Ecore metamodel
pub fn is_builtin(locator: &str) -> bool {
    let locator = locator.trim();
    locator == ECORE_NS_URI
        || locator.trim_end_matches('/') == ECORE_NS_URI
        || locator == ECORE_MODEL_FILE
        || locator.ends_with(&format!("/{}", ECORE_MODEL_FILE))
}

/// Last non-empty `/`-separated segment
pub fn last_segment(path: &str) -> &str {
    path.split('/').filter(|s| !s.is_empty()).last().unwrap_or("")
}

/// Split an opposite reference (`#//Book/library`) into the reference of the
/// containing classifier and the feature name.
pub fn split_opposite(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim();
    let (container, feature) = raw.rsplit_once('/')?;
    if container.is_empty() || feature.is_empty() || container.ends_with('#') {
        return None;
    }
    Some((container, feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_by_id() {
        assert_eq!(
            TypeReference::parse("_x7Gh2"),
            TypeReference::LocalById("_x7Gh2".to_string())
        );
    }

    #[test]
    fn test_parse_local_by_path() {
        assert_eq!(
            TypeReference::parse("#//Book"),
            TypeReference::LocalByPath {
                steps: vec![],
                name: "Book".to_string()
            }
        );
        assert_eq!(
            TypeReference::parse("#//0/2//Address"),
            TypeReference::LocalByPath {
                steps: vec!["0".to_string(), "2".to_string()],
                name: "Address".to_string()
            }
        );
        assert_eq!(
            TypeReference::parse("#//billing/Invoice"),
            TypeReference::LocalByPath {
                steps: vec!["billing".to_string()],
                name: "Invoice".to_string()
            }
        );
    }

    #[test]
    fn test_parse_builtin() {
        assert_eq!(
            TypeReference::parse("http://www.eclipse.org/emf/2002/Ecore#//EString"),
            TypeReference::BuiltinPrimitive("EString".to_string())
        );
        assert_eq!(
            TypeReference::parse("platform:/plugin/org.eclipse.emf.ecore/model/Ecore.ecore#//EInt"),
            TypeReference::BuiltinPrimitive("EInt".to_string())
        );
        assert_eq!(
            TypeReference::parse("Ecore.ecore#//EBoolean"),
            TypeReference::BuiltinPrimitive("EBoolean".to_string())
        );
    }

    #[test]
    fn test_parse_foreign() {
        let reference = TypeReference::parse("contacts.ecore#//Address");
        assert_eq!(
            reference,
            TypeReference::Foreign {
                locator: "contacts.ecore".to_string(),
                path: "//Address".to_string()
            }
        );
        assert_eq!(reference.trailing_name(), "Address");
        assert!(!reference.is_local());
    }

    #[test]
    fn test_parse_splits_on_first_marker() {
        let reference = TypeReference::parse("a.ecore#//B#C");
        assert!(matches!(reference, TypeReference::Foreign { ref path, .. } if path == "//B#C"));
    }

    #[test]
    fn test_display_round_trips_text() {
        assert_eq!(TypeReference::parse("#//0/Book").to_string(), "#//0/Book");
        assert_eq!(
            TypeReference::parse("contacts.ecore#//Address").to_string(),
            "contacts.ecore#//Address"
        );
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin(ECORE_NS_URI));
        assert!(is_builtin("http://www.eclipse.org/emf/2002/Ecore/"));
        assert!(!is_builtin("http://www.eclipse.org/emf/2002/GenModel"));
        assert!(!is_builtin("MyEcore.ecore"));
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("//a/b/C"), "C");
        assert_eq!(last_segment("//C/"), "C");
        assert_eq!(last_segment(""), "");
    }

    #[test]
    fn test_split_opposite() {
        assert_eq!(split_opposite("#//Book/library"), Some(("#//Book", "library")));
        assert_eq!(
            split_opposite("other.ecore#//0/Person/books"),
            Some(("other.ecore#//0/Person", "books"))
        );
        assert_eq!(split_opposite("#//Book/"), None);
        assert_eq!(split_opposite("#/library"), None);
        assert_eq!(split_opposite("library"), None);
    }
}
