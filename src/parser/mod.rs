// Parser module for reading Ecore metamodels into the document model

pub mod ast;
mod ecore;
pub mod xml;

pub use ast::*;
pub use ecore::{split_type_list, strip_type_hint, EcoreParser, ElementKind};
