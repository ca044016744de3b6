//! Renderers for the abstract graph
//!
//! Three diagram grammars are supported: Graphviz DOT, Mermaid flowchart
//! and PlantUML. All renderers share one styling table and one identifier
//! sanitization scheme so the same graph keeps identical semantics in
//! every format.

mod graphviz;
mod mermaid;
mod plantuml;
mod style;

pub use graphviz::GraphvizRenderer;
pub use mermaid::MermaidRenderer;
pub use plantuml::PlantumlRenderer;
pub use style::{
    GroupNode, StyleClass, all_style_classes, group_label, group_tree, label_lines, sanitize_id,
    style_class,
};

use crate::error::GraphError;
use crate::graph::{Graph, GraphFormat, GraphOptions};

/// A diagram renderer for one target grammar
pub trait Renderer {
    /// Serialize the graph into the target grammar
    fn generate(&self, graph: &Graph, options: &GraphOptions) -> Result<String, GraphError>;
}

/// Select the renderer for a format
pub fn renderer_for(format: GraphFormat) -> Box<dyn Renderer> {
    match format {
        GraphFormat::Graphviz => Box::new(GraphvizRenderer),
        GraphFormat::Mermaid => Box::new(MermaidRenderer),
        GraphFormat::Plantuml => Box::new(PlantumlRenderer),
    }
}
