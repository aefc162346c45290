//! Schema diagram rendering (Graphviz DOT).
//!
//! Works from a [`GraphSchema`] only: entity types become nodes, relation
//! triples become labelled edges. The centre type is pinned at the origin
//! and the rest are spread on a circle, for `neato -n` or plain `neato`.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::graph::{EntityType, GraphSchema};

const CENTER_COLOR: &str = "#ffcc66";
const NODE_COLOR: &str = "#aec6cf";
const RADIUS: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Highlighted type; falls back to the first type when absent from the schema.
    pub center: EntityType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Lung-CABO / LUCIA Knowledge Graph Schema".to_string(),
            center: EntityType::Disease,
        }
    }
}

/// Every type the diagram shows: node types first, then relation endpoints
/// that have no node set of their own.
fn diagram_types(schema: &GraphSchema) -> Vec<EntityType> {
    let mut types = schema.node_types.clone();
    for et in &schema.edge_types {
        for t in [et.src, et.dst] {
            if !types.contains(&t) {
                types.push(t);
            }
        }
    }
    types
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render `schema` as a DOT digraph.
pub fn render_dot(schema: &GraphSchema, options: &RenderOptions) -> String {
    let types = diagram_types(schema);
    let center = if types.contains(&options.center) {
        Some(options.center)
    } else {
        types.first().copied()
    };
    let others: Vec<EntityType> = types.iter().copied().filter(|t| Some(*t) != center).collect();

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "digraph schema {{");
    let _ = writeln!(
        out,
        "    graph [label={}, labelloc=t, fontsize=14, layout=neato];",
        quote(&options.title)
    );
    let _ = writeln!(out, "    node [shape=circle, style=filled, fontsize=12];");
    let _ = writeln!(out, "    edge [arrowhead=normal, fontsize=10];");

    if let Some(c) = center {
        let _ = writeln!(
            out,
            "    {} [pos=\"0,0!\", fillcolor={}, width=1.4];",
            quote(c.as_str()),
            quote(CENTER_COLOR)
        );
    }
    let n = others.len();
    for (i, t) in others.iter().enumerate() {
        let angle = 2.0 * PI * i as f64 / n as f64;
        let _ = writeln!(
            out,
            "    {} [pos=\"{:.3},{:.3}!\", fillcolor={}, width=1.2];",
            quote(t.as_str()),
            RADIUS * angle.cos(),
            RADIUS * angle.sin(),
            quote(NODE_COLOR)
        );
    }

    for et in &schema.edge_types {
        let _ = writeln!(
            out,
            "    {} -> {} [label={}];",
            quote(et.src.as_str()),
            quote(et.dst.as_str()),
            quote(&et.relation)
        );
    }
    out.push_str("}\n");
    out
}
