// Graph builder
//
// Turns the classes of the input document into diagram nodes and edges.
// Works in two phases: the first resolves every feature and collects
// pending reference edges together with their opposite keys, the second
// pairs opposite ends and emits exactly one edge per pair.

use super::model::{DiagramGraph, EndLabel, GraphEdge, GraphNode, NodeId};
use super::multiplicity::Multiplicity;
use crate::error::{Error, Result};
use crate::parser::Classifier;
use crate::resolve::{
    split_opposite, ClassifierId, Registry, ResolvedType, Resolver, TypeReference,
};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// A feature is identified by its owning classifier and position
type FeatureKey = (ClassifierId, usize);

/// Reference edge waiting for opposite pairing
#[derive(Debug, Clone)]
struct PendingEdge {
    key: FeatureKey,
    source: NodeId,
    target: NodeId,
    name: String,
    multiplicity: Multiplicity,
    containment: bool,
    opposite: Option<FeatureKey>,
}

impl PendingEdge {
    fn label(&self) -> EndLabel {
        EndLabel::new(&self.name, &self.multiplicity.range())
    }
}

/// Everything produced by one build
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: DiagramGraph,
    pub registry: Registry,
    /// Non-fatal problems, in the order they were met
    pub warnings: Vec<String>,
    /// Documents taking part in the conversion, input included
    pub documents: usize,
}

/// Format one attribute line: `name : type [bounds]`
pub fn attribute_line(
    name: &str,
    type_text: &str,
    multiplicity: Multiplicity,
    hide_multiplicity: bool,
) -> String {
    let bounds = if hide_multiplicity {
        String::new()
    } else {
        multiplicity.bounds()
    };
    if bounds.is_empty() {
        format!("{} : {}", name, type_text)
    } else {
        format!("{} : {} [{}]", name, type_text, bounds)
    }
}

/// Builds the diagram graph of one input document
pub struct GraphBuilder<'a> {
    resolver: Resolver<'a>,
    registry: Registry,
    graph: DiagramGraph,
    hide_multiplicity: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        let hide_multiplicity = resolver.options().hide_multiplicity;
        Self {
            resolver,
            registry: Registry::new(),
            graph: DiagramGraph::new(),
            hide_multiplicity,
        }
    }

    /// Run both phases and hand out the finished graph
    pub fn build(mut self) -> Result<BuildOutput> {
        let document = self.resolver.document();
        let input = self
            .resolver
            .input()
            .ok_or_else(|| Error::other("input document missing from cache"))?;
        let registered = self.registry.register_document(document, input, false);

        let classes: Vec<ClassifierId> = registered
            .into_iter()
            .filter(|id| self.registry[*id].classifier.is_class())
            .collect();

        for &id in &classes {
            self.ensure_node(id);
        }

        let mut pending = Vec::new();
        let mut inheritance = Vec::new();
        for &id in &classes {
            self.collect_class(id, &mut pending, &mut inheritance)?;
        }

        self.emit_references(&pending);
        for (sub, sup) in inheritance {
            self.graph.add_edge(sub, sup, GraphEdge::inheritance());
        }

        let stats = self.graph.stats();
        info!(
            nodes = stats.nodes,
            external = stats.external_nodes,
            edges = stats.edges(),
            unavailable = self.resolver.cache().failure_count(),
            "Built diagram graph"
        );

        Ok(BuildOutput {
            documents: self.resolver.cache().len(),
            warnings: self.resolver.take_warnings(),
            graph: self.graph,
            registry: self.registry,
        })
    }

    /// Node of a classifier, created on first request
    fn ensure_node(&mut self, id: ClassifierId) -> NodeId {
        if let Some(node) = self.registry.node_for(id) {
            return node;
        }
        let entry = &self.registry[id];
        let mut node = GraphNode::new(&entry.classifier.name);
        node.is_abstract = entry.classifier.is_abstract;
        node.external = entry.external;
        node.description = Some(entry.qualified_name.clone());
        debug!(class = %entry.qualified_name, external = entry.external, "Creating node");

        let node_id = self.graph.add_node(node);
        self.registry.set_node_for(id, node_id)
    }

    fn push_line(&mut self, node: NodeId, line: String) {
        trace!(line = %line, "Attribute line");
        if let Some(node) = self.graph.node_mut(node) {
            node.attributes.push(line);
        }
    }

    /// Phase one for a single class
    fn collect_class(
        &mut self,
        id: ClassifierId,
        pending: &mut Vec<PendingEdge>,
        inheritance: &mut Vec<(NodeId, NodeId)>,
    ) -> Result<()> {
        let classifier: Classifier = self.registry[id].classifier.clone();
        let source = self.ensure_node(id);

        for (index, feature) in classifier.features.iter().enumerate() {
            let owner = format!("{}.{}", classifier.name, feature.name);
            let resolution = self
                .resolver
                .resolve(&mut self.registry, &feature.type_ref, &owner)?;
            let multiplicity = Multiplicity::new(feature.lower, feature.upper);

            match resolution.ty {
                ResolvedType::Node(target) if feature.is_reference() => {
                    let target = self.ensure_node(target);
                    let opposite = match &feature.opposite {
                        Some(raw) => self.opposite_key(raw, &owner)?,
                        None => None,
                    };
                    pending.push(PendingEdge {
                        key: (id, index),
                        source,
                        target,
                        name: feature.name.clone(),
                        multiplicity,
                        containment: feature.containment,
                        opposite,
                    });
                }
                ResolvedType::Node(target) => {
                    // Attribute typed by a class: show the class name only
                    let text = self.registry[target].classifier.name.clone();
                    let line =
                        attribute_line(&feature.name, &text, multiplicity, self.hide_multiplicity);
                    self.push_line(source, line);
                }
                ResolvedType::PrimitiveLabel(text) => {
                    let line =
                        attribute_line(&feature.name, &text, multiplicity, self.hide_multiplicity);
                    self.push_line(source, line);
                }
            }
        }

        for raw in &classifier.super_types {
            let resolution = self.resolver.resolve(&mut self.registry, raw, &classifier.name)?;
            match resolution.ty {
                ResolvedType::Node(target) => {
                    let target = self.ensure_node(target);
                    inheritance.push((source, target));
                }
                ResolvedType::PrimitiveLabel(text) => {
                    self.push_line(source, format!("extends {}", text));
                }
            }
        }

        Ok(())
    }

    /// Key of the feature an opposite reference points at.
    ///
    /// Opposites living in foreign documents are never processed, so they
    /// yield no key. A locator naming the input document counts as local.
    fn opposite_key(&mut self, raw: &str, owner: &str) -> Result<Option<FeatureKey>> {
        let (container, feature_name) = split_opposite(raw)
            .ok_or_else(|| Error::resolution(raw, owner, "malformed opposite reference"))?;

        let container = match TypeReference::parse(container) {
            TypeReference::Foreign { locator, path } if self.resolver.refers_to_input(&locator) => {
                format!("#{}", path)
            }
            reference if reference.is_local() => container.to_string(),
            _ => return Ok(None),
        };

        let resolution = self.resolver.resolve(&mut self.registry, &container, owner)?;
        let class = resolution
            .as_node()
            .ok_or_else(|| Error::resolution(raw, owner, "opposite container is not a class"))?;

        let classifier = &self.registry[class].classifier;
        let (index, _) = classifier.feature(feature_name).ok_or_else(|| {
            Error::resolution(
                raw,
                owner,
                format!("class '{}' has no feature '{}'", classifier.name, feature_name),
            )
        })?;
        Ok(Some((class, index)))
    }

    /// Phase two: pair opposite ends and emit the surviving edges
    fn emit_references(&mut self, pending: &[PendingEdge]) {
        let positions: HashMap<FeatureKey, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key, i))
            .collect();

        let target_of = |i: usize| -> Option<usize> {
            let j = pending[i].opposite.and_then(|key| positions.get(&key).copied())?;
            (j != i).then_some(j)
        };

        // Ends naming each other pair first, so a third feature declaring
        // the same opposite cannot take a partner away from them
        let mut partner: Vec<Option<usize>> = vec![None; pending.len()];
        for i in 0..pending.len() {
            if let Some(j) = target_of(i) {
                if partner[i].is_none() && target_of(j) == Some(i) {
                    partner[i] = Some(j);
                    partner[j] = Some(i);
                }
            }
        }
        // One-sided opposites may still join an end left unpaired
        for i in 0..pending.len() {
            if let Some(j) = target_of(i) {
                if partner[i].is_none() && partner[j].is_none() {
                    partner[i] = Some(j);
                    partner[j] = Some(i);
                }
            }
        }

        for (i, end) in pending.iter().enumerate() {
            match partner[i] {
                None => {
                    let edge = GraphEdge::reference(end.containment, end.label());
                    self.graph.add_edge(end.source, end.target, edge);
                }
                Some(j) if j < i => {}
                Some(j) => {
                    let other = &pending[j];
                    // The containing end leads; otherwise the first-seen end
                    let (primary, secondary) = if other.containment && !end.containment {
                        (other, end)
                    } else {
                        (end, other)
                    };
                    trace!(
                        primary = %primary.name,
                        secondary = %secondary.name,
                        "Merging opposite references"
                    );
                    let edge = GraphEdge::reference(primary.containment, primary.label())
                        .with_source_label(secondary.label());
                    self.graph.add_edge(primary.source, primary.target, edge);
                }
            }
        }
    }
}
