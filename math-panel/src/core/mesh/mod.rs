//! Mesh structures and panel topology
//!
//! A [`PanelMesh`] is built once from node positions, panel connectivity and
//! wake panels supplied by a geometry provider. All cross indices are checked
//! at construction so the assembly loops can index without further checks.

pub mod generators;
pub mod panel;

pub use generators::*;
pub use panel::*;

use crate::core::types::{SurfacePosition, Vector3, WakeSide};
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mesh node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Position
    pub position: Vector3,
    /// Normalised average of the incident panel normals
    pub normal: Vector3,
    /// Nodes sharing an edge with this node
    pub neighbours: Vec<usize>,
    /// Panels using this node
    pub panels: Vec<usize>,
}

/// Panel connectivity as supplied by the geometry provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Node indices S0, S1, S2
    pub nodes: [usize; 3],
    /// Surface classification
    pub position: SurfacePosition,
    /// Sheds a wake column from the edge S1-S2
    ///
    /// The edge runs S1 -> S2 from left to right on top and mid panels and
    /// S2 -> S1 on bottom panels, whose outward normals reverse the winding.
    pub trailing: bool,
    /// First wake panel of the shed column
    pub wake: Option<usize>,
    /// Paired top trailing panel, for bottom trailing panels
    pub opposite: Option<usize>,
}

impl PanelSpec {
    /// Non-trailing panel
    pub fn new(nodes: [usize; 3], position: SurfacePosition) -> Self {
        Self {
            nodes,
            position,
            trailing: false,
            wake: None,
            opposite: None,
        }
    }

    /// Mark the panel as shedding the wake column starting at `wake`
    pub fn with_wake(mut self, wake: usize) -> Self {
        self.trailing = true;
        self.wake = Some(wake);
        self
    }

    /// Pair a bottom trailing panel with its top trailing panel
    pub fn with_opposite(mut self, opposite: usize) -> Self {
        self.opposite = Some(opposite);
        self
    }
}

/// Wake panel as supplied by the geometry provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakePanelSpec {
    /// Vertices
    pub vertices: [Vector3; 3],
    /// Column side
    pub side: WakeSide,
    /// Next panel downstream
    pub next: Option<usize>,
}

/// Triangulated body surface with its wake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelMesh {
    /// Nodes
    pub nodes: Vec<Node>,
    /// Body panels
    pub panels: Vec<Panel>,
    /// Wake panels
    pub wake_panels: Vec<WakePanel>,
}

impl PanelMesh {
    /// Build and validate a mesh
    pub fn new(
        positions: Vec<Vector3>,
        panel_specs: Vec<PanelSpec>,
        wake_specs: Vec<WakePanelSpec>,
    ) -> Result<Self> {
        let n_nodes = positions.len();
        let n_panels = panel_specs.len();
        let n_wake = wake_specs.len();

        if n_panels == 0 {
            return Err(PanelError::InvalidMesh("mesh has no panels".to_string()));
        }

        let mut panels = Vec::with_capacity(n_panels);
        for (index, spec) in panel_specs.iter().enumerate() {
            let [a, b, c] = spec.nodes;
            if a >= n_nodes || b >= n_nodes || c >= n_nodes {
                return Err(PanelError::InvalidMesh(format!(
                    "panel {} references a node outside 0..{}",
                    index, n_nodes
                )));
            }
            if a == b || b == c || a == c {
                return Err(PanelError::InvalidMesh(format!(
                    "panel {} repeats a node",
                    index
                )));
            }
            let geom = Triangle::new(positions[a], positions[b], positions[c]);
            if geom.is_degenerate() {
                return Err(PanelError::InvalidMesh(format!(
                    "panel {} is degenerate",
                    index
                )));
            }
            if spec.trailing {
                match spec.wake {
                    Some(w) if w < n_wake => {}
                    _ => {
                        return Err(PanelError::InvalidMesh(format!(
                            "trailing panel {} has no valid wake column",
                            index
                        )));
                    }
                }
                if spec.position == SurfacePosition::Bottom {
                    match spec.opposite {
                        Some(k) if k < n_panels && k != index => {}
                        _ => {
                            return Err(PanelError::InvalidMesh(format!(
                                "bottom trailing panel {} has no paired top panel",
                                index
                            )));
                        }
                    }
                }
            }

            panels.push(Panel {
                index,
                geom,
                nodes: spec.nodes,
                position: spec.position,
                trailing: spec.trailing,
                wake: spec.wake,
                opposite: spec.opposite,
                neighbours: Vec::new(),
            });
        }

        let mut wake_panels = Vec::with_capacity(n_wake);
        for (index, spec) in wake_specs.into_iter().enumerate() {
            if let Some(next) = spec.next {
                if next >= n_wake {
                    return Err(PanelError::InvalidMesh(format!(
                        "wake panel {} links to missing wake panel {}",
                        index, next
                    )));
                }
            }
            let [s0, s1, s2] = spec.vertices;
            let geom = Triangle::new(s0, s1, s2);
            if geom.is_degenerate() {
                return Err(PanelError::InvalidMesh(format!(
                    "wake panel {} is degenerate",
                    index
                )));
            }
            wake_panels.push(WakePanel {
                index,
                geom,
                side: spec.side,
                next: spec.next,
            });
        }

        // Edge adjacency
        let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for panel in &panels {
            for i in 0..3 {
                let a = panel.nodes[i];
                let b = panel.nodes[(i + 1) % 3];
                edges.entry((a.min(b), a.max(b))).or_default().push(panel.index);
            }
        }
        for sharing in edges.values() {
            for &p in sharing {
                for &q in sharing {
                    if p != q && !panels[p].neighbours.contains(&q) {
                        panels[p].neighbours.push(q);
                    }
                }
            }
        }

        let mut nodes: Vec<Node> = positions
            .into_iter()
            .map(|position| Node {
                position,
                normal: Vector3::zero(),
                neighbours: Vec::new(),
                panels: Vec::new(),
            })
            .collect();

        for panel in &panels {
            for i in 0..3 {
                let node = &mut nodes[panel.nodes[i]];
                node.panels.push(panel.index);
                node.normal += panel.geom.normal;
                for j in 1..3 {
                    let other = panel.nodes[(i + j) % 3];
                    if !node.neighbours.contains(&other) {
                        node.neighbours.push(other);
                    }
                }
            }
        }
        for node in &mut nodes {
            node.normal = node.normal.normalized().unwrap_or_default();
        }

        log::debug!(
            "Mesh built: {} nodes, {} panels, {} wake panels",
            nodes.len(),
            panels.len(),
            wake_panels.len()
        );

        Ok(Self {
            nodes,
            panels,
            wake_panels,
        })
    }

    /// Number of body panels
    pub fn n_panels(&self) -> usize {
        self.panels.len()
    }

    /// Number of wake panels
    pub fn n_wake_panels(&self) -> usize {
        self.wake_panels.len()
    }

    /// Number of nodes
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Panels shedding a wake whose strength enters the system
    ///
    /// Mid-surface and bottom trailing panels; top trailing panels are reached
    /// through the `opposite` link of their bottom partner.
    pub fn wake_shedding_panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter().filter(|p| {
            p.trailing && matches!(p.position, SurfacePosition::Mid | SurfacePosition::Bottom)
        })
    }

    /// Total wetted area
    pub fn total_area(&self) -> f64 {
        self.panels.iter().map(|p| p.geom.area).sum()
    }
}
