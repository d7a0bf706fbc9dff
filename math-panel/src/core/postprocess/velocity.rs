//! Surface velocity reconstruction
//!
//! The tangential velocity at a node is recovered from the doublet
//! distribution around it: a plane `µ = a0 + a1·x + a2·y` is fitted by least
//! squares over the node and its neighbour ring, in a local frame whose third
//! axis is the node normal, and the velocity is `-4π (a1·I + a2·J)`.
//!
//! Nodes whose frame or fit cannot be built get a zero velocity and a warning;
//! the rest of the pass is unaffected.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solvers::{LstsqError, least_squares};
use thiserror::Error;

use crate::core::assembly::AssemblyContext;
use crate::core::config::{AxisStrategy, Formulation};
use crate::core::integration::FOUR_PI;
use crate::core::mesh::PanelMesh;
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::Vector3;

/// Trials of the randomized axis search
const MAX_AXIS_TRIALS: usize = 50;

/// Largest |cos| between a candidate axis and the normal
const AXIS_ALIGNMENT_LIMIT: f64 = 0.75;

/// Per-node reconstruction failure, recovered locally
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeFailure {
    /// Zero normal or no usable in-plane axis
    #[error("no local frame for node {0}")]
    NoFrame(usize),
    /// Degenerate neighbour geometry
    #[error("least-squares fit failed at node {node}: {source}")]
    Fit {
        /// Node index
        node: usize,
        /// Solver error
        source: LstsqError,
    },
}

/// Local orthonormal frame `(I, J, normal)` at a node
pub fn node_frame(
    normal: Vector3,
    strategy: AxisStrategy,
    node: usize,
) -> Result<(Vector3, Vector3), NodeFailure> {
    let normal = normal.normalized().ok_or(NodeFailure::NoFrame(node))?;
    let candidate = match strategy {
        AxisStrategy::Deterministic => {
            let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
            if ax <= ay && ax <= az {
                Vector3::unit_x()
            } else if ay <= az {
                Vector3::unit_y()
            } else {
                Vector3::unit_z()
            }
        }
        AxisStrategy::Randomized { seed } => {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(node as u64));
            let mut found = None;
            for _ in 0..MAX_AXIS_TRIALS {
                let trial = Vector3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                );
                if let Some(axis) = trial.normalized() {
                    if axis.dot(&normal).abs() < AXIS_ALIGNMENT_LIMIT {
                        found = Some(axis);
                        break;
                    }
                }
            }
            found.ok_or(NodeFailure::NoFrame(node))?
        }
    };

    let i = (candidate - normal * candidate.dot(&normal))
        .normalized()
        .ok_or(NodeFailure::NoFrame(node))?;
    let j = normal.cross(&i);
    Ok((i, j))
}

/// Doublet density at the three vertices of each panel
///
/// Linear strengths are used as they are; uniform panel values are averaged
/// at the nodes first.
pub fn vertex_densities(ctx: &AssemblyContext<'_>, mu: ArrayView1<'_, f64>) -> Vec<[f64; 3]> {
    match ctx.formulation {
        Formulation::Linear => (0..ctx.mesh.n_panels())
            .map(|k| [mu[3 * k], mu[3 * k + 1], mu[3 * k + 2]])
            .collect(),
        Formulation::Uniform => {
            let per_panel: Vec<[f64; 3]> = mu.iter().map(|&m| [m; 3]).collect();
            let nodes = node_values(ctx.mesh, &per_panel);
            ctx.mesh
                .panels
                .iter()
                .map(|p| p.nodes.map(|n| nodes[n]))
                .collect()
        }
    }
}

/// Average of the vertex densities meeting at each node
pub fn node_values(mesh: &PanelMesh, densities: &[[f64; 3]]) -> Vec<f64> {
    let mut sums = vec![0.0; mesh.n_nodes()];
    let mut counts = vec![0usize; mesh.n_nodes()];
    for (panel, values) in mesh.panels.iter().zip(densities) {
        for (&node, &value) in panel.nodes.iter().zip(values) {
            sums[node] += value;
            counts[node] += 1;
        }
    }
    sums.iter()
        .zip(&counts)
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect()
}

/// Velocity of one node from the fitted doublet gradient
pub fn fit_node_velocity(
    mesh: &PanelMesh,
    node: usize,
    values: &[f64],
    strategy: AxisStrategy,
) -> Result<Vector3, NodeFailure> {
    let n = &mesh.nodes[node];
    let (axis_i, axis_j) = node_frame(n.normal, strategy, node)?;

    let ring = std::iter::once(node).chain(n.neighbours.iter().copied());
    let count = 1 + n.neighbours.len();
    let mut a = Array2::<f64>::zeros((count, 3));
    let mut b = Array2::<f64>::zeros((count, 1));
    for (row, other) in ring.enumerate() {
        let d = mesh.nodes[other].position - n.position;
        a[[row, 0]] = 1.0;
        a[[row, 1]] = d.dot(&axis_i);
        a[[row, 2]] = d.dot(&axis_j);
        b[[row, 0]] = values[other];
    }

    let coefficients = least_squares(a.view(), b.view())
        .map_err(|source| NodeFailure::Fit { node, source })?;
    Ok((axis_i * coefficients[[1, 0]] + axis_j * coefficients[[2, 0]]) * -FOUR_PI)
}

/// Doublet-induced velocity at every node
pub fn node_velocities(mesh: &PanelMesh, values: &[f64], strategy: AxisStrategy) -> Vec<Vector3> {
    let velocities = parallel_map_indexed(mesh.n_nodes(), |node| {
        fit_node_velocity(mesh, node, values, strategy)
    });
    velocities
        .into_iter()
        .map(|result| match result {
            Ok(v) => v,
            Err(failure) => {
                log::warn!("{}, velocity set to zero", failure);
                Vector3::zero()
            }
        })
        .collect()
}
