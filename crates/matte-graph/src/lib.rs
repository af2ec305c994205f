#![forbid(unsafe_code)]

//! Shader-graph vocabulary and patching model for matte layers.
//!
//! This crate is **contract-only**: it constructs and rewires node graphs but
//! never evaluates them — rendering is the host renderer's concern.
//!
//! Two rules keep the builder and the mutators honest:
//! - nodes that mutation code depends on are addressed by [`StableName`],
//!   a closed enum, never by insertion order or node id;
//! - every input has at most one driver, and rewiring is disconnect-then-
//!   connect, so no partially-wired state is observable between operations.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use std::collections::HashMap;

use matte_core::CoreError;
use matte_image::ImageHandle;

pub mod builder;
pub mod mutate;

pub use builder::{build_material, Material};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDir {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: PortId,
    pub dir: PortDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: Endpoint, // Out
    pub to: Endpoint,   // In
}

/// High-level class of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Source,
    Color,
    Shader,
    Output,
}

/// Color blend mode for [`NodeKind::MixColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Mix,
    Overlay,
}

/// Scalar operation for [`NodeKind::Math`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Multiply,
}

/// The node vocabulary the builder draws from.
///
/// Keep this enum small: it mirrors the host's shading nodes one-to-one, and
/// every variant here must be constructible through the host material API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Sources
    TexCoord,
    NoiseTex,
    TexImage,

    // Color processors
    MixColor(BlendMode),
    Invert,
    RgbCurves,
    HueSat,
    Math(MathOp),

    // Shaders
    Emission,
    TransparentBsdf,
    Principled,
    Bump,
    MixShader,

    // Output
    MaterialOutput,
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        use NodeKind::*;
        match self {
            TexCoord | NoiseTex | TexImage => NodeClass::Source,
            MixColor(_) | Invert | RgbCurves | HueSat | Math(_) => NodeClass::Color,
            Emission | TransparentBsdf | Principled | Bump | MixShader => NodeClass::Shader,
            MaterialOutput => NodeClass::Output,
        }
    }
}

/// The closed set of stable node names shared by the builder and the
/// mutators. String forms match the host-visible node names, so a user
/// inspecting the material sees the same identifiers the code uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StableName {
    Albedo,
    Curves,
    Hsv,
    Opacity,
    Mix,
    Invert,
    TransparencyMask,
    CombineOriginalAlpha,
    MaterialOutput,
}

impl StableName {
    pub const ALL: [StableName; 9] = [
        StableName::Albedo,
        StableName::Curves,
        StableName::Hsv,
        StableName::Opacity,
        StableName::Mix,
        StableName::Invert,
        StableName::TransparencyMask,
        StableName::CombineOriginalAlpha,
        StableName::MaterialOutput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StableName::Albedo => "albedo",
            StableName::Curves => "curves",
            StableName::Hsv => "HSV",
            StableName::Opacity => "opacity",
            StableName::Mix => "mix",
            StableName::Invert => "invert",
            StableName::TransparencyMask => "transparency_mask",
            StableName::CombineOriginalAlpha => "combineoriginalalpha",
            StableName::MaterialOutput => "material_output",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub name: &'static str,
    pub dir: PortDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub ports: Vec<Port>,
    /// Muted nodes pass their primary input through unchanged in the host.
    pub mute: bool,
    /// Image bound to a texture node; `None` for every other kind.
    pub image: Option<ImageHandle>,
    /// Scalar input defaults, used when the input has no driving edge.
    defaults: HashMap<PortId, f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    next_node: u32,
    next_port: u32,
    nodes: HashMap<NodeId, Node>,
    names: HashMap<StableName, NodeId>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;

        // Port layouts mirror the host's node sockets; only the sockets this
        // system actually wires are modeled.
        let ports = match kind {
            NodeKind::TexCoord => vec![self.new_port("uv", PortDir::Out)],
            NodeKind::NoiseTex => vec![
                self.new_port("vector", PortDir::In),
                self.new_port("scale", PortDir::In),
                self.new_port("fac", PortDir::Out),
            ],
            NodeKind::TexImage => vec![
                self.new_port("uv", PortDir::In),
                self.new_port("color", PortDir::Out),
                self.new_port("alpha", PortDir::Out),
            ],
            NodeKind::MixColor(_) | NodeKind::MixShader => vec![
                self.new_port("fac", PortDir::In),
                self.new_port("a", PortDir::In),
                self.new_port("b", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::Invert => vec![
                self.new_port("fac", PortDir::In),
                self.new_port("color", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::RgbCurves => vec![
                self.new_port("fac", PortDir::In),
                self.new_port("color", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::HueSat => vec![
                self.new_port("hue", PortDir::In),
                self.new_port("saturation", PortDir::In),
                self.new_port("value", PortDir::In),
                self.new_port("fac", PortDir::In),
                self.new_port("color", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::Math(_) => vec![
                self.new_port("a", PortDir::In),
                self.new_port("b", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::Emission => vec![
                self.new_port("color", PortDir::In),
                self.new_port("strength", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::TransparentBsdf => vec![
                self.new_port("color", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::Principled => vec![
                self.new_port("base_color", PortDir::In),
                self.new_port("roughness", PortDir::In),
                self.new_port("specular", PortDir::In),
                self.new_port("normal", PortDir::In),
                self.new_port("out", PortDir::Out),
            ],
            NodeKind::Bump => vec![
                self.new_port("height", PortDir::In),
                self.new_port("normal", PortDir::Out),
            ],
            NodeKind::MaterialOutput => vec![self.new_port("surface", PortDir::In)],
        };

        let node = Node {
            id,
            kind,
            ports,
            mute: false,
            image: None,
            defaults: HashMap::new(),
        };
        self.nodes.insert(id, node);
        id
    }

    fn new_port(&mut self, name: &'static str, dir: PortDir) -> Port {
        let id = PortId(self.next_port);
        self.next_port += 1;
        Port { id, name, dir }
    }

    // ---- Stable names ----

    /// Give a node a stable name. Builder-only; one node per name.
    pub fn label(&mut self, id: NodeId, name: StableName) -> Result<(), CoreError> {
        if !self.nodes.contains_key(&id) {
            return Err(CoreError::other("label: node not found"));
        }
        if self.names.contains_key(&name) {
            return Err(CoreError::other(format!(
                "label: stable name '{}' already assigned",
                name.as_str()
            )));
        }
        self.names.insert(name, id);
        Ok(())
    }

    pub fn find_named(&self, name: StableName) -> Option<NodeId> {
        self.names.get(&name).copied()
    }

    /// Stable-name lookup that treats absence as a contract violation.
    pub fn named(&self, name: StableName) -> Result<NodeId, CoreError> {
        self.find_named(name).ok_or(CoreError::NodeNotFound {
            name: name.as_str(),
        })
    }

    // ---- Mute ----

    pub fn set_mute(&mut self, id: NodeId, mute: bool) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| CoreError::other("set_mute: node not found"))?;
        node.mute = mute;
        Ok(())
    }

    pub fn is_muted(&self, id: NodeId) -> Result<bool, CoreError> {
        self.nodes
            .get(&id)
            .map(|n| n.mute)
            .ok_or_else(|| CoreError::other("is_muted: node not found"))
    }

    // ---- Images ----

    pub fn bind_image(&mut self, id: NodeId, image: ImageHandle) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| CoreError::other("bind_image: node not found"))?;
        if node.kind != NodeKind::TexImage {
            return Err(CoreError::other("bind_image: not a texture node"));
        }
        node.image = Some(image);
        Ok(())
    }

    pub fn image_of(&self, id: NodeId) -> Option<ImageHandle> {
        self.nodes.get(&id).and_then(|n| n.image)
    }

    // ---- Scalar defaults ----

    pub fn set_default(&mut self, id: NodeId, port: &str, value: f32) -> Result<(), CoreError> {
        let pid = self
            .find_port(id, port, PortDir::In)
            .ok_or_else(|| CoreError::other(format!("set_default: input '{port}' not found")))?;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| CoreError::other("set_default: node not found"))?;
        node.defaults.insert(pid, value);
        Ok(())
    }

    pub fn default_of(&self, id: NodeId, port: &str) -> Option<f32> {
        let pid = self.find_port(id, port, PortDir::In)?;
        self.nodes.get(&id)?.defaults.get(&pid).copied()
    }

    // ---- Wiring ----

    pub fn find_port(&self, node: NodeId, name: &str, dir: PortDir) -> Option<PortId> {
        self.nodes.get(&node).and_then(|n| {
            n.ports
                .iter()
                .find(|p| p.dir == dir && p.name == name)
                .map(|p| p.id)
        })
    }

    /// Connect `from` (Out) → `to` (In).
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<(), CoreError> {
        if from.dir != PortDir::Out {
            return Err(CoreError::other("connect: from endpoint must be Out"));
        }
        if to.dir != PortDir::In {
            return Err(CoreError::other("connect: to endpoint must be In"));
        }
        if !self.nodes.contains_key(&from.node) || !self.nodes.contains_key(&to.node) {
            return Err(CoreError::other("connect: node not found"));
        }

        // Ensure the referenced ports actually belong to the specified nodes
        // and match the declared direction.
        let from_ok = self
            .nodes
            .get(&from.node)
            .and_then(|n| n.ports.iter().find(|p| p.id == from.port))
            .is_some();
        if !from_ok {
            return Err(CoreError::other("connect: from port not found on node"));
        }
        let to_ok = self
            .nodes
            .get(&to.node)
            .and_then(|n| n.ports.iter().find(|p| p.id == to.port))
            .is_some();
        if !to_ok {
            return Err(CoreError::other("connect: to port not found on node"));
        }

        // Single-driver invariant: rewiring is disconnect-then-connect.
        if self.edges.iter().any(|e| e.to == to) {
            return Err(CoreError::other("connect: input already connected"));
        }
        self.edges.push(Edge { from, to });
        Ok(())
    }

    /// Convenience: connect by port names.
    pub fn connect_named(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<(), CoreError> {
        let from_pid = self
            .find_port(from_node, from_port, PortDir::Out)
            .ok_or_else(|| CoreError::other("connect_named: from port not found"))?;
        let to_pid = self
            .find_port(to_node, to_port, PortDir::In)
            .ok_or_else(|| CoreError::other("connect_named: to port not found"))?;

        self.connect(
            Endpoint {
                node: from_node,
                port: from_pid,
                dir: PortDir::Out,
            },
            Endpoint {
                node: to_node,
                port: to_pid,
                dir: PortDir::In,
            },
        )
    }

    /// Remove the edge driving `(node, port)`, if any. Returns whether an
    /// edge was removed.
    pub fn disconnect_input(&mut self, node: NodeId, port: &str) -> Result<bool, CoreError> {
        let pid = self
            .find_port(node, port, PortDir::In)
            .ok_or_else(|| CoreError::other("disconnect_input: input port not found"))?;
        let to = Endpoint {
            node,
            port: pid,
            dir: PortDir::In,
        };
        let before = self.edges.len();
        self.edges.retain(|e| e.to != to);
        Ok(self.edges.len() != before)
    }

    /// The Out endpoint currently driving `(node, port)`, if any.
    pub fn input_source(&self, node: NodeId, port: &str) -> Option<Endpoint> {
        let pid = self.find_port(node, port, PortDir::In)?;
        let to = Endpoint {
            node,
            port: pid,
            dir: PortDir::In,
        };
        self.edges.iter().find(|e| e.to == to).map(|e| e.from)
    }

    /// Validate structural invariants: every Output-class node must have its
    /// input driven. The builder calls this before handing a graph out.
    pub fn validate(&self) -> Result<(), CoreError> {
        for n in self.nodes.values() {
            if n.kind.class() == NodeClass::Output {
                for p in n.ports.iter().filter(|p| p.dir == PortDir::In) {
                    let to = Endpoint {
                        node: n.id,
                        port: p.id,
                        dir: PortDir::In,
                    };
                    if !self.edges.iter().any(|e| e.to == to) {
                        return Err(CoreError::other("validate: material output not connected"));
                    }
                }
            }
        }
        Ok(())
    }
}
