// Reference resolution: reference syntax, document cache, classifier
// registry and the resolver that ties them together

pub mod cache;
pub mod reference;
pub mod registry;
pub mod resolver;

pub use cache::{DocumentCache, DocumentId};
pub use reference::{is_builtin, last_segment, split_opposite, TypeReference, ECORE_NS_URI};
pub use registry::{ClassifierEntry, ClassifierId, LookupError, Registry, Slot};
pub use resolver::{Resolution, ResolvedType, Resolver, UNKNOWN_PACKAGE};
