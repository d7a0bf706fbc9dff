//! Staged panel analysis
//!
//! A [`PanelAnalysis`] owns the mesh, the configuration, the worker pool and
//! every buffer of one solve. The stages run in order:
//!
//! 1. [`assemble`](PanelAnalysis::assemble) fills the doublet and source
//!    influence matrices
//! 2. [`factorize`](PanelAnalysis::factorize) replaces the matrix by its LU
//!    factors, after which the precision is locked
//! 3. [`solve_unit_flows`](PanelAnalysis::solve_unit_flows) solves the six
//!    unit right-hand sides
//!
//! Every flow condition is then a linear combination of the unit solutions:
//! operating points, stability derivatives, trim and the vorton wake never
//! touch the matrix again. [`run`](PanelAnalysis::run) chains the three stages.
//!
//! A cancelled or failed stage discards the buffers it was writing.

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use solvers::{DenseLu, DenseMatrix, Precision};
use std::time::Instant;

use crate::core::assembly::{
    AssemblyContext, FlowField, assemble_matrix, assemble_source_matrix, build_rhs, combine_unit,
    source_strengths, unit_rhs, wind_direction,
};
use crate::core::config::AnalysisConfig;
use crate::core::mesh::PanelMesh;
use crate::core::parallel::{CancelToken, StageFlags, WorkerPool};
use crate::core::postprocess::{
    AeroCoefficients, StabDerivatives, VortonDrag, VortonWake, far_wake_velocities,
    forces::pitching_moment_coefficient, node_values, node_velocities, pressure_force,
    pressure_moment, stability, trailing_force, trim, velocity_at, vertex_cp, vertex_densities,
};
use crate::core::types::Vector3;
use crate::error::{PanelError, Result};

/// Solution of one flow condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Angle of attack (radians)
    pub alpha: f64,
    /// Sideslip (radians)
    pub beta: f64,
    /// Freestream speed (m/s)
    pub q_inf: f64,
    /// Doublet strengths
    pub mu: Array1<f64>,
    /// Source strengths
    pub sigma: Array1<f64>,
    /// Doublet-induced velocity at each node
    pub node_velocities: Vec<Vector3>,
    /// Cp at the vertices of each panel
    pub cp: Vec<[f64; 3]>,
    /// Kutta-Joukowski force (N)
    pub force: Vector3,
    /// Integrated surface pressure force (N)
    pub pressure_force: Vector3,
    /// Pressure moment about the CoG (N·m)
    pub moment: Vector3,
    /// Wind-axis coefficients
    pub coefficients: AeroCoefficients,
}

/// Unit right-hand sides, their solutions and the linear quantities derived from them
#[derive(Debug, Clone)]
struct UnitFlows {
    rhs: Array2<f64>,
    mu: Array2<f64>,
    node_velocities: Vec<Vec<Vector3>>,
    far_velocities: Vec<Vec<Vector3>>,
}

impl UnitFlows {
    fn coefficients(field: &FlowField) -> [f64; 6] {
        [
            field.v_inf.x,
            field.v_inf.y,
            field.v_inf.z,
            field.omega.x,
            field.omega.y,
            field.omega.z,
        ]
    }

    fn combine_vectors(unit: &[Vec<Vector3>], field: &FlowField) -> Vec<Vector3> {
        let len = unit.first().map_or(0, Vec::len);
        let mut combined = vec![Vector3::zero(); len];
        for (values, c) in unit.iter().zip(Self::coefficients(field)) {
            if c == 0.0 {
                continue;
            }
            for (out, &v) in combined.iter_mut().zip(values) {
                *out += v * c;
            }
        }
        combined
    }

    fn mu(&self, field: &FlowField) -> Array1<f64> {
        combine_unit(self.mu.view(), field.v_inf, field.omega)
    }

    fn node_velocities(&self, field: &FlowField) -> Vec<Vector3> {
        Self::combine_vectors(&self.node_velocities, field)
    }

    fn far_velocities(&self, field: &FlowField) -> Vec<Vector3> {
        Self::combine_vectors(&self.far_velocities, field)
    }
}

/// Panel-method analysis of one mesh
#[derive(Debug)]
pub struct PanelAnalysis {
    mesh: PanelMesh,
    config: AnalysisConfig,
    pool: WorkerPool,
    cancel: CancelToken,
    matrix: Option<DenseMatrix>,
    source_matrix: Option<Array2<f64>>,
    lu: Option<DenseLu>,
    unit: Option<UnitFlows>,
}

impl PanelAnalysis {
    /// Create an analysis, validating the configuration and the wake topology
    pub fn new(mesh: PanelMesh, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        if mesh.n_panels() == 0 {
            return Err(PanelError::InvalidMesh("mesh has no panels".to_string()));
        }
        AssemblyContext::new(&mesh, &config)?;
        let pool = WorkerPool::new(config.worker_count())?;
        log::info!(
            "Panel analysis: {} panels, {} wake panels, {} nodes, {:?} formulation, {} workers",
            mesh.n_panels(),
            mesh.n_wake_panels(),
            mesh.n_nodes(),
            config.formulation,
            pool.threads()
        );
        Ok(Self {
            mesh,
            config,
            pool,
            cancel: CancelToken::new(),
            matrix: None,
            source_matrix: None,
            lu: None,
            unit: None,
        })
    }

    /// Mesh under analysis
    pub fn mesh(&self) -> &PanelMesh {
        &self.mesh
    }

    /// Configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Token another thread can use to cancel the running stage
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Assembly context borrowing the mesh
    pub fn context(&self) -> Result<AssemblyContext<'_>> {
        AssemblyContext::new(&self.mesh, &self.config)
    }

    /// System dimension
    pub fn n_unknowns(&self) -> usize {
        self.mesh.n_panels() * self.config.formulation.unknowns_per_panel()
    }

    /// Change the matrix precision
    ///
    /// Discards any assembled matrix; fails once factorization has run.
    pub fn set_precision(&mut self, precision: Precision) -> Result<()> {
        if self.lu.is_some() {
            return Err(PanelError::PrecisionLocked);
        }
        if precision != self.config.precision {
            log::debug!(
                "Precision {:?} -> {:?}, assembled matrix discarded",
                self.config.precision,
                precision
            );
            self.config.precision = precision;
            self.matrix = None;
        }
        Ok(())
    }

    /// Assembled matrix, available between assembly and factorization
    pub fn matrix(&self) -> Option<&DenseMatrix> {
        self.matrix.as_ref()
    }

    /// Source influence matrix (`n_unknowns x n_panels`)
    pub fn source_matrix(&self) -> Option<ArrayView2<'_, f64>> {
        self.source_matrix.as_ref().map(|m| m.view())
    }

    /// True once the LU factors are available
    pub fn is_factorized(&self) -> bool {
        self.lu.is_some()
    }

    /// Unit right-hand sides, one column per [`FlowField::unit`]
    pub fn unit_rhs(&self) -> Option<ArrayView2<'_, f64>> {
        self.unit.as_ref().map(|u| u.rhs.view())
    }

    /// Unit doublet solutions, one column per [`FlowField::unit`]
    pub fn unit_solutions(&self) -> Option<ArrayView2<'_, f64>> {
        self.unit.as_ref().map(|u| u.mu.view())
    }

    /// Assemble the doublet and source influence matrices
    pub fn assemble(&mut self) -> Result<()> {
        self.matrix = None;
        self.source_matrix = None;
        self.lu = None;
        self.unit = None;

        let start = Instant::now();
        let ctx = AssemblyContext::new(&self.mesh, &self.config)?;
        let n = ctx.n_unknowns();
        let n_blocks = self.pool.threads();
        log::info!(
            "Assembling {}x{} {:?} matrix in {} blocks ({:.1} MB)",
            n,
            n,
            self.config.precision,
            n_blocks,
            (n * n * self.config.precision.bytes_per_entry()) as f64 / 1.0e6
        );

        let flags = StageFlags::new(&self.cancel);
        let mut matrix = DenseMatrix::zeros(n, self.config.precision);
        let sources = self.pool.install(|| -> Result<Array2<f64>> {
            assemble_matrix(&ctx, &mut matrix, &flags, n_blocks)?;
            assemble_source_matrix(&ctx, &flags, n_blocks)
        })?;

        self.matrix = Some(matrix);
        self.source_matrix = Some(sources);
        log::info!("Assembly completed in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Factorize the assembled matrix in place
    pub fn factorize(&mut self) -> Result<()> {
        let matrix = self
            .matrix
            .take()
            .ok_or(PanelError::StageOrder("factorize requires an assembled matrix"))?;
        if self.cancel.is_cancelled() {
            return Err(PanelError::Cancelled);
        }

        let start = Instant::now();
        let lu = self.pool.install(move || matrix.factorize());
        match lu {
            Ok(lu) => {
                log::info!(
                    "LU factorization of {}x{} {:?} matrix in {:.2?}",
                    lu.dim(),
                    lu.dim(),
                    lu.precision(),
                    start.elapsed()
                );
                self.lu = Some(lu);
                Ok(())
            }
            Err(e) => {
                log::error!("Factorization failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Solve for every column of `rhs` with the stored factors
    pub fn solve(&self, rhs: &Array2<f64>) -> Result<Array2<f64>> {
        let lu = self
            .lu
            .as_ref()
            .ok_or(PanelError::StageOrder("solve requires a factorized matrix"))?;
        let solution = self.pool.install(|| lu.solve_many(rhs))?;
        Ok(solution)
    }

    /// Right-hand sides of arbitrary flow fields, built directly
    pub fn build_rhs(&self, fields: &[FlowField]) -> Result<Array2<f64>> {
        let sources = self
            .source_matrix
            .as_ref()
            .ok_or(PanelError::StageOrder("right-hand sides require an assembled source matrix"))?;
        let ctx = self.context()?;
        let flags = StageFlags::new(&self.cancel);
        let n_blocks = self.pool.threads();
        self.pool
            .install(|| build_rhs(&ctx, sources.view(), fields, &flags, n_blocks))
    }

    /// Solve the six unit flows and cache the quantities linear in them
    pub fn solve_unit_flows(&mut self) -> Result<()> {
        let start = Instant::now();
        let sources = self
            .source_matrix
            .as_ref()
            .ok_or(PanelError::StageOrder("unit flows require an assembled source matrix"))?;
        let ctx = AssemblyContext::new(&self.mesh, &self.config)?;
        let flags = StageFlags::new(&self.cancel);
        let n_blocks = self.pool.threads();

        let rhs = self
            .pool
            .install(|| unit_rhs(&ctx, sources.view(), &flags, n_blocks))?;
        let mu = self.solve(&rhs)?;

        let strategy = self.config.axis_strategy;
        let (node_velocities, far_velocities) = self.pool.install(|| {
            let mut nodes = Vec::with_capacity(6);
            let mut far = Vec::with_capacity(6);
            for column in mu.columns() {
                let densities = vertex_densities(&ctx, column);
                let values = node_values(ctx.mesh, &densities);
                nodes.push(node_velocities(ctx.mesh, &values, strategy));
                far.push(far_wake_velocities(&ctx, column));
            }
            (nodes, far)
        });
        flags.poll()?;

        self.unit = Some(UnitFlows {
            rhs,
            mu,
            node_velocities,
            far_velocities,
        });
        log::info!("Unit flows solved in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Assemble, factorize and solve the unit flows
    pub fn run(&mut self) -> Result<()> {
        self.assemble()?;
        self.factorize()?;
        self.solve_unit_flows()
    }

    fn unit(&self) -> Result<&UnitFlows> {
        self.unit
            .as_ref()
            .ok_or(PanelError::StageOrder("unit flows have not been solved"))
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(PanelError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Right-hand side of `v_inf` and `omega` from the unit set
    pub fn combine_unit_rhs(&self, v_inf: Vector3, omega: Vector3) -> Result<Array1<f64>> {
        Ok(combine_unit(self.unit()?.rhs.view(), v_inf, omega))
    }

    /// Doublet strengths of the unit-speed wind at `alpha`, `beta`
    pub fn doublet_strengths(&self, alpha: f64, beta: f64) -> Result<Array1<f64>> {
        let field = FlowField::translation(wind_direction(alpha, beta));
        Ok(self.unit()?.mu(&field))
    }

    /// Velocities, Cp and loads at one flow condition
    pub fn solve_operating_point(
        &self,
        alpha: f64,
        beta: f64,
        q_inf: f64,
    ) -> Result<OperatingPoint> {
        if !(q_inf.is_finite() && q_inf > 0.0) {
            return Err(PanelError::InvalidConfig(format!(
                "freestream speed must be positive, got {}",
                q_inf
            )));
        }
        let unit = self.unit()?;
        let ctx = self.context()?;
        let field = FlowField::translation(wind_direction(alpha, beta) * q_inf);
        let cog = self.config.reference.cog;
        let density = self.config.density;
        let strategy = self.config.axis_strategy;

        let mu = unit.mu(&field);
        let sigma = source_strengths(&self.mesh, &field, cog);
        let (node_velocity, far_velocity) = self.pool.install(|| {
            let densities = vertex_densities(&ctx, mu.view());
            let values = node_values(ctx.mesh, &densities);
            (
                node_velocities(ctx.mesh, &values, strategy),
                far_wake_velocities(&ctx, mu.view()),
            )
        });
        self.check_cancel()?;

        let cp = vertex_cp(&ctx, &field, &node_velocity, q_inf);
        let force = trailing_force(&ctx, mu.view(), &far_velocity, &field, density);
        let moment = pressure_moment(&ctx, &cp, q_inf, density);
        let surface_force = pressure_force(&ctx, &cp, q_inf, density);
        let coefficients = AeroCoefficients::from_loads(
            force,
            moment,
            alpha,
            beta,
            q_inf,
            density,
            &self.config.reference,
        );
        log::info!(
            "alpha = {:.3}°, beta = {:.3}°: CL = {:.5}, CDi = {:.6}, Cm = {:.5}",
            alpha.to_degrees(),
            beta.to_degrees(),
            coefficients.cl,
            coefficients.cd,
            coefficients.cm
        );

        Ok(OperatingPoint {
            alpha,
            beta,
            q_inf,
            mu,
            sigma,
            node_velocities: node_velocity,
            cp,
            force,
            pressure_force: surface_force,
            moment,
            coefficients,
        })
    }

    /// Force and moment about the CoG for an arbitrary flow field
    ///
    /// `q_ref` normalises the pressure coefficients; it cancels out of the
    /// loads but must be positive.
    pub fn loads(&self, field: &FlowField, q_ref: f64) -> Result<(Vector3, Vector3)> {
        self.check_cancel()?;
        let unit = self.unit()?;
        let ctx = self.context()?;
        let density = self.config.density;
        let mu = unit.mu(field);
        let nodes = unit.node_velocities(field);
        let far = unit.far_velocities(field);
        let cp = vertex_cp(&ctx, field, &nodes, q_ref);
        let force = trailing_force(&ctx, mu.view(), &far, field, density);
        let moment = pressure_moment(&ctx, &cp, q_ref, density);
        Ok((force, moment))
    }

    /// Stability derivatives at angle of attack `alpha` and speed `u0`
    pub fn stability_derivatives(&self, alpha: f64, u0: f64) -> Result<StabDerivatives> {
        if !(u0.is_finite() && u0 > 0.0) {
            return Err(PanelError::InvalidConfig(format!(
                "reference speed must be positive, got {}",
                u0
            )));
        }
        self.unit()?;
        let start = Instant::now();
        let derivatives =
            stability::stability_derivatives(alpha, u0, |field| self.loads(field, u0))?;
        log::info!(
            "Stability derivatives at alpha = {:.3}°, u0 = {:.2} m/s in {:.2?}",
            alpha.to_degrees(),
            u0,
            start.elapsed()
        );
        log::debug!(
            "Xu = {:.4} Zw = {:.4} Mq = {:.4} Lp = {:.4} Nr = {:.4}",
            derivatives.Xu,
            derivatives.Zw,
            derivatives.Mq,
            derivatives.Lp,
            derivatives.Nr
        );
        Ok(derivatives)
    }

    /// Angle of attack at which the pitching moment about the CoG vanishes
    pub fn zero_moment_angle(&self) -> Result<f64> {
        let unit = self.unit()?;
        let ctx = self.context()?;
        let alpha = trim::zero_moment_angle(|alpha| {
            self.check_cancel()?;
            let field = FlowField::translation(wind_direction(alpha, 0.0));
            let nodes = unit.node_velocities(&field);
            let cp = vertex_cp(&ctx, &field, &nodes, 1.0);
            Ok(pitching_moment_coefficient(&ctx, &cp))
        })?;
        log::info!("Zero-moment angle: {:.4}°", alpha.to_degrees());
        Ok(alpha)
    }

    /// Perturbation velocity at `point` for the flow condition `alpha`, `beta`, `q_inf`
    ///
    /// With `wake_only` only the wake contributes.
    pub fn induced_velocity_at(
        &self,
        alpha: f64,
        beta: f64,
        q_inf: f64,
        point: Vector3,
        wake_only: bool,
    ) -> Result<Vector3> {
        let unit = self.unit()?;
        let ctx = self.context()?;
        let field = FlowField::translation(wind_direction(alpha, beta) * q_inf);
        let mu = unit.mu(&field);
        let sigma = source_strengths(&self.mesh, &field, self.config.reference.cog);
        Ok(velocity_at(&ctx, mu.view(), sigma.view(), point, wake_only))
    }

    /// Vorton wake of the flow condition `alpha`, `beta`, `q_inf`
    pub fn vorton_wake(&self, alpha: f64, beta: f64, q_inf: f64) -> Result<VortonWake> {
        let unit = self.unit()?;
        let ctx = self.context()?;
        let wind = wind_direction(alpha, beta);
        let mu = unit.mu(&FlowField::translation(wind * q_inf));
        VortonWake::build(&ctx, mu.view(), wind, &self.config.vorton)
    }

    /// Induced drag of the vorton wake, forces divided by the dynamic pressure
    pub fn vorton_drag(&self, alpha: f64, beta: f64, q_inf: f64) -> Result<VortonDrag> {
        let wake = self.vorton_wake(alpha, beta, q_inf)?;
        self.check_cancel()?;
        let drag = self.pool.install(|| wake.induced_drag(q_inf));
        log::info!(
            "Vorton induced drag area: {:.6} m² over {} strips",
            drag.drag_area,
            drag.strip_forces.len()
        );
        Ok(drag)
    }
}
