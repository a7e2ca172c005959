// yEd GraphML output
//
// Writes the diagram graph as GraphML with yWorks extensions: entity
// relationship boxes for classes and poly-line edges with six-position
// end labels. Layout is left to yEd.

use crate::error::{Error, Result};
use crate::graph::{edge_key, node_key, DiagramGraph, EndLabel, GraphEdge, GraphNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

pub const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const YWORKS_NS: &str = "http://www.yworks.com/xml/graphml";
const SCHEMA_LOCATION: &str =
    "http://graphml.graphdrawing.org/xmlns http://www.yworks.com/xml/schema/graphml/1.0/ygraphml.xsd";

const NODE_GRAPHICS_KEY: &str = "d0";
const EDGE_GRAPHICS_KEY: &str = "d1";
const NODE_DESCRIPTION_KEY: &str = "d2";
const EDGE_DESCRIPTION_KEY: &str = "d3";

const NODE_WIDTH: f64 = 160.0;
const NODE_BASE_HEIGHT: f64 = 30.0;
const LINE_HEIGHT: f64 = 18.0;

/// Placement of one edge end label
struct LabelSlot {
    position: &'static str,
    preferred: &'static str,
    placement: &'static str,
    side: &'static str,
}

const TARGET_NAME: LabelSlot = LabelSlot {
    position: "ttail",
    preferred: "target_right",
    placement: "target",
    side: "right",
};
const TARGET_MULTIPLICITY: LabelSlot = LabelSlot {
    position: "thead",
    preferred: "target_left",
    placement: "target",
    side: "left",
};
const SOURCE_NAME: LabelSlot = LabelSlot {
    position: "shead",
    preferred: "source_left",
    placement: "source",
    side: "left",
};
const SOURCE_MULTIPLICITY: LabelSlot = LabelSlot {
    position: "stail",
    preferred: "source_right",
    placement: "source",
    side: "right",
};

/// Renders a diagram graph as yEd GraphML
#[derive(Debug, Default, Clone)]
pub struct GraphmlWriter;

impl GraphmlWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole document
    pub fn write(&self, graph: &DiagramGraph) -> Result<String> {
        let mut out = Emitter::new();

        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;
        out.start(
            "graphml",
            &[
                ("xmlns", GRAPHML_NS),
                ("xmlns:xsi", XSI_NS),
                ("xmlns:y", YWORKS_NS),
                ("xsi:schemaLocation", SCHEMA_LOCATION),
            ],
        )?;

        out.empty(
            "key",
            &[("id", NODE_GRAPHICS_KEY), ("for", "node"), ("yfiles.type", "nodegraphics")],
        )?;
        out.empty(
            "key",
            &[("id", EDGE_GRAPHICS_KEY), ("for", "edge"), ("yfiles.type", "edgegraphics")],
        )?;
        out.empty(
            "key",
            &[
                ("id", NODE_DESCRIPTION_KEY),
                ("for", "node"),
                ("attr.name", "description"),
                ("attr.type", "string"),
            ],
        )?;
        out.empty(
            "key",
            &[
                ("id", EDGE_DESCRIPTION_KEY),
                ("for", "edge"),
                ("attr.name", "description"),
                ("attr.type", "string"),
            ],
        )?;

        out.start("graph", &[("id", "G"), ("edgedefault", "directed")])?;
        for (id, node) in graph.nodes() {
            write_node(&mut out, &node_key(id), node)?;
        }
        for (id, source, target, edge) in graph.edges() {
            write_edge(&mut out, &edge_key(id), &node_key(source), &node_key(target), edge)?;
        }
        out.end("graph")?;
        out.end("graphml")?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Rendered GraphML"
        );
        out.finish()
    }

    /// Render and write to `path`
    pub fn write_to_file(&self, graph: &DiagramGraph, path: &Path) -> Result<()> {
        let content = self.write(graph)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn write_node(out: &mut Emitter, id: &str, node: &GraphNode) -> Result<()> {
    out.start("node", &[("id", id)])?;
    out.start("data", &[("key", NODE_GRAPHICS_KEY)])?;
    out.start(
        "y:GenericNode",
        &[("configuration", "com.yworks.entityRelationship.big_entity")],
    )?;

    let height = format!(
        "{:.1}",
        NODE_BASE_HEIGHT + LINE_HEIGHT * node.attributes.len() as f64
    );
    let width = format!("{:.1}", NODE_WIDTH);
    out.empty(
        "y:Geometry",
        &[
            ("height", height.as_str()),
            ("width", width.as_str()),
            ("x", "0.0"),
            ("y", "0.0"),
        ],
    )?;
    out.empty("y:Fill", &[("hasColor", "false"), ("transparent", "false")])?;
    if node.external {
        out.empty(
            "y:BorderStyle",
            &[("color", "#000000"), ("type", "dashed"), ("width", "1.0")],
        )?;
    }

    let font_style = if node.is_abstract { "italic" } else { "plain" };
    out.text_element(
        "y:NodeLabel",
        &[
            ("alignment", "center"),
            ("autoSizePolicy", "content"),
            ("backgroundColor", "#FFFFFF"),
            ("configuration", "com.yworks.entityRelationship.label.name"),
            ("fontStyle", font_style),
            ("modelName", "internal"),
            ("modelPosition", "t"),
        ],
        &node.label,
    )?;

    out.start(
        "y:NodeLabel",
        &[
            ("alignment", "left"),
            ("autoSizePolicy", "content"),
            ("configuration", "com.yworks.entityRelationship.label.attributes"),
            ("modelName", "custom"),
        ],
    )?;
    out.text(&node.attributes.join("\n"))?;
    out.start("y:LabelModel", &[])?;
    out.empty("y:ErdAttributesNodeLabelModel", &[])?;
    out.end("y:LabelModel")?;
    out.start("y:ModelParameter", &[])?;
    out.empty("y:ErdAttributesNodeLabelModelParameter", &[])?;
    out.end("y:ModelParameter")?;
    out.end("y:NodeLabel")?;

    out.start("y:StyleProperties", &[])?;
    out.empty(
        "y:Property",
        &[
            ("class", "java.lang.Boolean"),
            ("name", "y.view.ShadowNodePainter.SHADOW_PAINTING"),
            ("value", "true"),
        ],
    )?;
    out.end("y:StyleProperties")?;

    out.end("y:GenericNode")?;
    out.end("data")?;
    match &node.description {
        Some(text) => out.text_element("data", &[("key", NODE_DESCRIPTION_KEY)], text)?,
        None => out.empty("data", &[("key", NODE_DESCRIPTION_KEY)])?,
    }
    out.end("node")
}

fn write_edge(
    out: &mut Emitter,
    id: &str,
    source: &str,
    target: &str,
    edge: &GraphEdge,
) -> Result<()> {
    out.start("edge", &[("id", id), ("source", source), ("target", target)])?;
    out.start("data", &[("key", EDGE_GRAPHICS_KEY)])?;
    out.start("y:PolyLineEdge", &[])?;
    out.empty("y:LineStyle", &[("color", "#000000"), ("type", "line"), ("width", "1.0")])?;
    out.empty(
        "y:Arrows",
        &[
            ("source", edge.source_arrow.as_str()),
            ("target", edge.target_arrow.as_str()),
        ],
    )?;

    if let Some(label) = &edge.target_label {
        write_end_labels(out, label, &TARGET_NAME, &TARGET_MULTIPLICITY)?;
    }
    if let Some(label) = &edge.source_label {
        write_end_labels(out, label, &SOURCE_NAME, &SOURCE_MULTIPLICITY)?;
    }

    out.end("y:PolyLineEdge")?;
    out.end("data")?;
    out.empty("data", &[("key", EDGE_DESCRIPTION_KEY)])?;
    out.end("edge")
}

fn write_end_labels(
    out: &mut Emitter,
    label: &EndLabel,
    name_slot: &LabelSlot,
    multiplicity_slot: &LabelSlot,
) -> Result<()> {
    write_edge_label(out, &label.name, name_slot)?;
    write_edge_label(out, &label.multiplicity, multiplicity_slot)
}

fn write_edge_label(out: &mut Emitter, text: &str, slot: &LabelSlot) -> Result<()> {
    out.start(
        "y:EdgeLabel",
        &[
            ("modelName", "six_pos"),
            ("modelPosition", slot.position),
            ("preferredPlacement", slot.preferred),
        ],
    )?;
    out.text(text)?;
    out.empty(
        "y:PreferredPlacementDescriptor",
        &[
            ("placement", slot.placement),
            ("side", slot.side),
            ("sideReference", "relative_to_edge_flow"),
        ],
    )?;
    out.end("y:EdgeLabel")
}

/// Thin wrapper over the quick-xml writer mapping errors into ours
struct Emitter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::output(format!("Write error: {}", e)))
    }

    fn element<'b>(name: &'b str, attrs: &[(&str, &str)]) -> BytesStart<'b> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        start
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Start(Self::element(name, attrs)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Empty(Self::element(name, attrs)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.event(Event::Text(BytesText::new(text)))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| Error::output(format!("Invalid UTF-8: {}", e)))
    }
}
