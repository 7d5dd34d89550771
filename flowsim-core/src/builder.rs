//! Parses an mxGraph-flavored diagram interchange XML document into a
//! [`Network`].
//!
//! The format (`SPEC_FULL.md` §6 / `spec.md` §6): a single `<mxGraphModel>`
//! with a `<root>` child holding a flat list of `<mxCell>` elements, some bare
//! and some wrapped in `<object>` carrying extra metadata attributes. A cell
//! is a vertex if its `style` attribute matches `shape=(\w+);`; otherwise, if
//! it carries `source`/`target`, it's an edge.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::delay::DelaySpec;
use crate::entity::{NodeId, ResourceId};
use crate::error::BuildError;
use crate::graph::{Edge, Network, ResourceDef, Vertex, VertexKind};

struct RawVertex {
    id: NodeId,
    outbound_edges: Vec<String>,
    kind: VertexKind,
}

pub fn build_network(xml: &str) -> Result<Network, BuildError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut root_checked = false;
    let mut current_object: Option<HashMap<String, String>> = None;

    let mut vertices: Vec<RawVertex> = Vec::new();
    let mut raw_edges: Vec<Edge> = Vec::new();
    let mut resources: HashMap<ResourceId, ResourceDef> = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = tag_name(&e);
                check_root(&name, &mut root_checked)?;
                if name == "object" {
                    current_object = Some(collect_attrs(&e)?);
                } else if name == "mxCell" {
                    let attrs = collect_attrs(&e)?;
                    handle_cell(&attrs, &current_object, &mut vertices, &mut raw_edges, &mut resources)?;
                }
            }
            Event::Empty(e) => {
                let name = tag_name(&e);
                check_root(&name, &mut root_checked)?;
                if name == "mxCell" {
                    let attrs = collect_attrs(&e)?;
                    handle_cell(&attrs, &current_object, &mut vertices, &mut raw_edges, &mut resources)?;
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "object" {
                    current_object = None;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if !root_checked {
        return Err(BuildError::WrongRoot(String::new()));
    }

    // Wire each edge onto its source vertex's outbound_edges, in encounter order.
    let mut index_by_id: HashMap<NodeId, usize> = HashMap::new();
    for (i, v) in vertices.iter().enumerate() {
        index_by_id.insert(v.id.clone(), i);
    }
    for edge in &raw_edges {
        if let Some(&idx) = index_by_id.get(&edge.from) {
            vertices[idx].outbound_edges.push(edge.id.clone());
        }
    }

    if vertices.is_empty() {
        return Err(BuildError::EmptyNetwork);
    }

    let built_vertices = vertices
        .into_iter()
        .map(|v| Vertex {
            id: v.id,
            outbound_edges: v.outbound_edges,
            kind: v.kind,
        })
        .collect();

    Ok(Network::new(built_vertices, raw_edges, resources))
}

fn check_root(name: &str, root_checked: &mut bool) -> Result<(), BuildError> {
    if !*root_checked {
        *root_checked = true;
        if name != "mxGraphModel" {
            return Err(BuildError::WrongRoot(name.to_string()));
        }
    }
    Ok(())
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn collect_attrs(e: &BytesStart) -> Result<HashMap<String, String>, BuildError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn handle_cell(
    attrs: &HashMap<String, String>,
    current_object: &Option<HashMap<String, String>>,
    vertices: &mut Vec<RawVertex>,
    edges: &mut Vec<Edge>,
    resources: &mut HashMap<ResourceId, ResourceDef>,
) -> Result<(), BuildError> {
    let wrapper_id = current_object.as_ref().and_then(|o| o.get("id").cloned());
    let id = wrapper_id.unwrap_or_else(|| attrs.get("id").cloned().unwrap_or_default());

    let has_source = attrs.get("source").map(|s| !s.is_empty()).unwrap_or(false);
    let has_target = attrs.get("target").map(|s| !s.is_empty()).unwrap_or(false);
    let style = attrs.get("style").cloned().unwrap_or_default();
    let shape = extract_shape(&style);

    // Wrapped cells are never edges (§4.8): only bare mxCell can be an edge.
    if current_object.is_none() && shape.is_none() && (attrs.contains_key("source") || attrs.contains_key("target")) {
        if !has_source {
            return Err(BuildError::EdgeMissingSource { id });
        }
        if !has_target {
            return Err(BuildError::EdgeMissingTarget { id });
        }
        edges.push(Edge {
            id: id.clone(),
            from: attrs.get("source").unwrap().clone(),
            to: attrs.get("target").unwrap().clone(),
        });
        return Ok(());
    }

    let shape = match shape {
        Some(s) => s,
        None => return Ok(()), // mxGraph boilerplate cell (id="0", id="1", ...)
    };

    let meta = current_object.clone().unwrap_or_default();

    if meta.get("nodeType").map(|s| s.as_str()) == Some("resource") {
        let name = meta
            .get("Name")
            .cloned()
            .ok_or_else(|| BuildError::ResourceMissingName { id: id.clone() })?;
        let capacity = meta
            .get("Count")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&c| c > 0)
            .unwrap_or(1);
        resources.insert(name.clone(), ResourceDef { name, capacity });
        return Ok(());
    }

    let kind = match shape.as_str() {
        "source" => VertexKind::Source {
            label_prefix: meta.get("Name").cloned().unwrap_or_else(|| "Entity".to_string()),
            delay: parse_delay_spec(&meta),
        },
        "process" => {
            let (will_seize, will_delay, will_release) =
                process_type_flags(meta.get("type").map(|s| s.as_str()).unwrap_or(""));
            VertexKind::Process {
                will_seize,
                will_delay,
                will_release,
                resource: meta.get("resource").cloned(),
                delay: parse_delay_spec(&meta),
            }
        }
        "decision" => VertexKind::Decision {
            probability: meta.get("val").and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.5),
        },
        "exit" => VertexKind::Exit,
        other => return Err(BuildError::UnknownShape { id, shape: other.to_string() }),
    };

    vertices.push(RawVertex {
        id,
        outbound_edges: Vec::new(),
        kind,
    });
    Ok(())
}

fn extract_shape(style: &str) -> Option<String> {
    let idx = style.find("shape=")?;
    let rest = &style[idx + "shape=".len()..];
    let end = rest.find(';').unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// Normalizes the historical `sieze` misspelling to `seize` and maps the
/// resulting token to `(will_seize, will_delay, will_release)`. An
/// unrecognized token is pass-through (all false), logged by the caller.
fn process_type_flags(token: &str) -> (bool, bool, bool) {
    let normalized = token.replace("sieze", "seize");
    match normalized.as_str() {
        "delay" => (false, true, false),
        "seize" => (true, false, false),
        "seizeDelay" => (true, true, false),
        "seizeDelayRelease" => (true, true, true),
        _ => (false, false, false),
    }
}

fn parse_delay_spec(meta: &HashMap<String, String>) -> DelaySpec {
    let as_i64 = |key: &str| meta.get(key).and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
    match meta.get("delayType").map(|s| s.as_str()) {
        Some("constant") => DelaySpec::Constant { val: as_i64("val") },
        Some("uniform") => DelaySpec::Uniform { min: as_i64("min"), max: as_i64("max") },
        Some("triangular") => DelaySpec::Triangular {
            min: as_i64("min"),
            max: as_i64("max"),
            mid: as_i64("mid"),
        },
        Some("exponential") => DelaySpec::Exponential { rate: as_i64("val") },
        _ => DelaySpec::Unknown,
    }
}
