use super::{numerical_jacobian, Elasticity, ExplicitSchedule, FlowDirection, InternalVariableSet, YieldFunction};
use crate::base::{Settings, TangentType};
use crate::tensor::{t2_ddot_t4_ddot_t2, t4_ddot_t2, t4_ddot_t2_dyad_t2_ddot_t4, t4_ddot_t2_update};
use crate::tensor::{Tensor2, Tensor4, MANDEL_DIM};
use crate::StrError;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

/// Holds the results of a stress update
#[derive(Clone, Debug)]
pub struct IntegrationOutput {
    /// Updated stress σ
    pub stress: Tensor2,

    /// Updated (flattened) internal values z
    pub internal_values: Vec<f64>,

    /// Stiffness tensor according to the selected tangent type
    pub tangent: Tensor4,

    /// Cumulative plastic multiplier Δλ
    pub lambda: f64,

    /// Indicates that the whole increment is elastic
    pub elastic: bool,

    /// Number of sub-increments used to integrate the strain increment
    pub n_substeps: usize,

    /// Yield function at the updated state
    pub yield_value: f64,
}

/// Classifies the update of one sub-increment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StepKind {
    Elastic,

    /// Return to a regular point of the yield surface
    Plastic,

    /// Return to the apex of the yield surface
    Apex,
}

/// Holds the results of one implicit sub-increment
struct ImplicitStep {
    sigma: Tensor2,
    z: Vec<f64>,
    lambda: f64,

    /// Flow direction at the converged state (zero if elastic)
    m: Tensor2,

    /// Elastic modulus at the beginning of the sub-increment
    dde: Tensor4,

    kind: StepKind,

    /// Jacobian of the residual at the converged state (Plastic only)
    jacobian: Option<DMatrix<f64>>,
}

/// Holds the state after a return to the apex of the yield surface
pub(super) struct ApexState {
    pub sigma: Tensor2,
    pub z: Vec<f64>,
    pub lambda: f64,
    pub m: Tensor2,
}

/// Holds the derivatives of the state w.r.t the total strain increment (chain across sub-increments)
struct Sensitivity {
    /// dσ/dΔε (6 × 6)
    s_sigma: DMatrix<f64>,

    /// dz/dΔε (n_values × 6)
    s_z: DMatrix<f64>,

    /// ∂(Dₑ(σ) : v)/∂σ (6 × 6)
    gg: DMatrix<f64>,
}

/// Holds the quantities defining the continuum elastoplastic response at a state (σ, z)
pub(super) struct PlasticData {
    /// Elastic modulus Dₑ
    pub dde: Tensor4,

    /// Gradient of the yield function df/dσ
    pub df_dsigma: Tensor2,

    /// Flow direction m
    pub m: Tensor2,

    /// Hardening rates h (dz = Λ h)
    pub h: Vec<f64>,

    /// Plastic modulus Nₚ = (df/dσ) : Dₑ : m - (df/dz) · h
    pub nnp: f64,
}

/// Integrates the elastoplastic rate equations over a strain increment
///
/// The integrator borrows the capabilities and the internal variables of a material point; the
/// internal variables are only used to evaluate the hardening rates (their values are given in
/// flattened form and are never modified here).
pub struct ReturnMapping<'a, E, Y, F, S> {
    pub(super) elasticity: &'a E,
    pub(super) yield_function: &'a Y,
    pub(super) flow: &'a F,
    pub(super) variables: &'a S,
    pub(super) settings: &'a Settings,
    pub(super) n_values: usize,
}

impl<'a, E, Y, F, S> ReturnMapping<'a, E, Y, F, S>
where
    E: Elasticity,
    Y: YieldFunction,
    F: FlowDirection,
    S: InternalVariableSet,
{
    /// Allocates a new instance
    ///
    /// The yield function and the flow direction must have been bound to the layout of `variables`.
    pub fn new(elasticity: &'a E, yield_function: &'a Y, flow: &'a F, variables: &'a S, settings: &'a Settings) -> Self {
        ReturnMapping {
            elasticity,
            yield_function,
            flow,
            variables,
            settings,
            n_values: variables.n_values(),
        }
    }

    /// Updates the stress and internal values given the strain increment
    ///
    /// # Input
    ///
    /// * `sigma0` -- stress at the beginning of the increment
    /// * `z0` -- internal values at the beginning of the increment
    /// * `delta_strain` -- total strain increment Δε
    ///
    /// The increment is subdivided (doubling the number of sub-increments) if the integration fails;
    /// an error is returned if the integration fails with `max_substeps` sub-increments.
    pub fn integrate(&self, sigma0: &Tensor2, z0: &[f64], delta_strain: &Tensor2) -> Result<IntegrationOutput, StrError> {
        if z0.len() != self.n_values {
            return Err("number of internal values is incorrect");
        }
        if !delta_strain.is_finite() {
            return Err("strain increment is not finite");
        }

        // elastic predictor over the whole increment
        let mut dde = Tensor4::new();
        self.elasticity.modulus(&mut dde, sigma0)?;
        let mut sigma_trial = Tensor2::new();
        self.elasticity.trial_stress(&mut sigma_trial, delta_strain, sigma0)?;
        let f_trial = self.yield_function.value(&sigma_trial, z0)?;
        if f_trial <= self.settings.yf_tol {
            let tangent = match self.settings.tangent {
                TangentType::Algorithmic => dde,
                _ => {
                    let mut dde_trial = Tensor4::new();
                    self.elasticity.modulus(&mut dde_trial, &sigma_trial)?;
                    dde_trial
                }
            };
            return Ok(IntegrationOutput {
                stress: sigma_trial,
                internal_values: z0.to_vec(),
                tangent,
                lambda: 0.0,
                elastic: true,
                n_substeps: 1,
                yield_value: f_trial,
            });
        }

        // plastic increment
        let mut n_substeps = self.initial_substeps(delta_strain);
        loop {
            match self.integrate_substeps(n_substeps, sigma0, z0, delta_strain) {
                Ok(output) => return Ok(output),
                Err(err) => {
                    if n_substeps >= self.settings.max_substeps {
                        warn!("stress update failed with {} sub-increments: {}", n_substeps, err);
                        return Err(err);
                    }
                    let next = usize::min(2 * n_substeps, self.settings.max_substeps);
                    debug!("{} with {} sub-increments; trying {}", err, n_substeps, next);
                    n_substeps = next;
                }
            }
        }
    }

    /// Calculates the continuum elastoplastic modulus
    ///
    /// ```text
    /// Dₑₚ = Dₑ - (Dₑ : m) ⊗ ((df/dσ) : Dₑ) / Nₚ
    /// ```
    pub fn continuum_modulus(&self, ddep: &mut Tensor4, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let data = self.plastic_data(sigma, z)?;
        ddep.set_tensor(1.0, &data.dde);
        t4_ddot_t2_dyad_t2_ddot_t4(ddep, 1.0, &data.dde, -1.0 / data.nnp, &data.m, &data.df_dsigma);
        Ok(())
    }

    /// Evaluates the hardening rates h(σ, z) including the dependence of m on (σ, z)
    pub(super) fn hardening_rates(&self, rates: &mut [f64], sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let mut m = Tensor2::new();
        self.flow.direction(&mut m, sigma, z)?;
        self.variables.hardening_rates(rates, z, &m, sigma);
        Ok(())
    }

    /// Calculates the quantities defining the continuum elastoplastic response
    pub(super) fn plastic_data(&self, sigma: &Tensor2, z: &[f64]) -> Result<PlasticData, StrError> {
        let mut dde = Tensor4::new();
        self.elasticity.modulus(&mut dde, sigma)?;
        let mut df_dsigma = Tensor2::new();
        self.yield_function.df_dsigma(&mut df_dsigma, sigma, z)?;
        let mut m = Tensor2::new();
        self.flow.direction(&mut m, sigma, z)?;
        let mut df_dz = vec![0.0; self.n_values];
        self.yield_function.df_dz(&mut df_dz, sigma, z)?;
        let mut h = vec![0.0; self.n_values];
        self.variables.hardening_rates(&mut h, z, &m, sigma);
        let mmp: f64 = df_dz.iter().zip(h.iter()).map(|(a, b)| a * b).sum();
        let nnp = t2_ddot_t4_ddot_t2(&df_dsigma, &dde, &m) - mmp;
        if !(nnp > 0.0) {
            return Err("plastic modulus Nₚ must be positive");
        }
        Ok(PlasticData {
            dde,
            df_dsigma,
            m,
            h,
            nnp,
        })
    }

    /// Returns the initial number of sub-increments
    fn initial_substeps(&self, delta_strain: &Tensor2) -> usize {
        let n = match self.settings.max_strain_increment {
            Some(max) => usize::max(1, f64::ceil(delta_strain.norm() / max) as usize),
            None => 1,
        };
        usize::min(n, self.settings.max_substeps)
    }

    /// Integrates the increment split into n equal sub-increments
    fn integrate_substeps(
        &self,
        n_substeps: usize,
        sigma0: &Tensor2,
        z0: &[f64],
        delta_strain: &Tensor2,
    ) -> Result<IntegrationOutput, StrError> {
        let nz = self.n_values;
        let fraction = 1.0 / (n_substeps as f64);
        let deps = *delta_strain * fraction;
        let explicit = self.settings.method.explicit();
        let chain = self.settings.tangent == TangentType::Algorithmic && !explicit;

        let mut sigma = *sigma0;
        let mut z = z0.to_vec();
        let mut lambda = 0.0;
        let mut last = StepKind::Elastic;
        let mut apex_start = None;
        let mut schedule = ExplicitSchedule::new();
        let mut sens = Sensitivity {
            s_sigma: DMatrix::zeros(MANDEL_DIM, MANDEL_DIM),
            s_z: DMatrix::zeros(nz, MANDEL_DIM),
            gg: DMatrix::zeros(MANDEL_DIM, MANDEL_DIM),
        };

        for _ in 0..n_substeps {
            let start = (sigma, z.clone());
            if explicit {
                let (dlambda, kind) = self.explicit_substep(&mut sigma, &mut z, &deps, &mut schedule)?;
                lambda += dlambda;
                last = kind;
            } else {
                let step = self.implicit_step(&sigma, &z, &deps)?;
                if chain {
                    self.update_sensitivity(&mut sens, &sigma, &z, &deps, &step, fraction)?;
                }
                lambda += step.lambda;
                last = step.kind;
                sigma = step.sigma;
                z = step.z;
            }
            apex_start = if last == StepKind::Apex { Some(start) } else { None };
        }
        if !sigma.is_finite() || z.iter().any(|v| !v.is_finite()) {
            return Err("stress update produced non-finite values");
        }

        let mut tangent = Tensor4::new();
        match self.settings.tangent {
            TangentType::Elastic => self.elasticity.modulus(&mut tangent, &sigma)?,
            TangentType::Continuum => match (last, &apex_start) {
                (StepKind::Elastic, _) => self.elasticity.modulus(&mut tangent, &sigma)?,
                (StepKind::Apex, Some((sigma_n, z_n))) => self.apex_modulus(&mut tangent, sigma_n, z_n, &deps)?,
                _ => self.continuum_modulus(&mut tangent, &sigma, &z)?,
            },
            TangentType::Algorithmic => {
                if explicit {
                    self.explicit_tangent(&mut tangent, n_substeps, sigma0, z0, delta_strain, &sigma, &schedule)?;
                } else {
                    let mat = tangent.matrix_mut();
                    for i in 0..MANDEL_DIM {
                        for j in 0..MANDEL_DIM {
                            mat[(i, j)] = sens.s_sigma[(i, j)];
                        }
                    }
                }
            }
        }
        if !tangent.is_finite() {
            return Err("tangent modulus is not finite");
        }

        let yield_value = self.yield_function.value(&sigma, &z)?;
        Ok(IntegrationOutput {
            stress: sigma,
            internal_values: z,
            tangent,
            lambda,
            elastic: false,
            n_substeps,
            yield_value,
        })
    }

    /// Performs the implicit return mapping over one sub-increment
    ///
    /// Solves for x = [σ, z, Δλ]:
    ///
    /// ```text
    /// R_σ = σ - σ_trial + Δλ Dₑ : m = 0
    /// R_z = z - zₙ - Δλ h = 0
    /// R_f = f(σ, z) = 0
    /// ```
    ///
    /// with Dₑ evaluated at the stress σₙ of the beginning of the sub-increment. Trial stresses
    /// beyond the apex of the yield surface are mapped by `apex_return` instead.
    fn implicit_step(&self, sigma_n: &Tensor2, z_n: &[f64], deps: &Tensor2) -> Result<ImplicitStep, StrError> {
        let nz = self.n_values;
        let mut dde = Tensor4::new();
        self.elasticity.modulus(&mut dde, sigma_n)?;
        let mut sigma_trial = *sigma_n;
        t4_ddot_t2_update(&mut sigma_trial, 1.0, &dde, deps, 1.0);
        let f_trial = self.yield_function.value(&sigma_trial, z_n)?;
        if f_trial <= self.settings.yf_tol {
            return Ok(ImplicitStep {
                sigma: sigma_trial,
                z: z_n.to_vec(),
                lambda: 0.0,
                m: Tensor2::new(),
                dde,
                kind: StepKind::Elastic,
                jacobian: None,
            });
        }
        if let Some(apex) = self.apex_return(&sigma_trial, z_n, &dde)? {
            return Ok(ImplicitStep {
                sigma: apex.sigma,
                z: apex.z,
                lambda: apex.lambda,
                m: apex.m,
                dde,
                kind: StepKind::Apex,
                jacobian: None,
            });
        }

        // initial guess: elastic trial with Δλ = 0
        let neq = MANDEL_DIM + nz + 1;
        let mut x = DVector::zeros(neq);
        x.rows_mut(0, MANDEL_DIM).copy_from_slice(sigma_trial.as_slice());
        x.rows_mut(MANDEL_DIM, nz).copy_from_slice(z_n);
        let mut r = DVector::zeros(neq);
        let mut jac = DMatrix::zeros(neq, neq);
        let scale = f64::max(sigma_trial.norm(), 1.0);

        for iteration in 0..self.settings.newton_max_iterations {
            self.residual_and_jacobian(&mut r, &mut jac, &x, &sigma_trial, z_n, &dde)?;
            let error = r.norm() / scale;
            if error <= self.settings.newton_tol {
                let lambda = x[neq - 1];
                if lambda < 0.0 {
                    return Err("plastic multiplier is negative");
                }
                let sigma = Tensor2::from_slice(&x.as_slice()[..MANDEL_DIM]);
                let z = x.as_slice()[MANDEL_DIM..(MANDEL_DIM + nz)].to_vec();
                let mut m = Tensor2::new();
                self.flow.direction(&mut m, &sigma, &z)?;
                debug!("return mapping converged after {} iterations (Δλ = {:e})", iteration, lambda);
                return Ok(ImplicitStep {
                    sigma,
                    z,
                    lambda,
                    m,
                    dde,
                    kind: StepKind::Plastic,
                    jacobian: Some(jac),
                });
            }
            let dx = jac.clone().lu().solve(&(-&r)).ok_or("Jacobian matrix is singular")?;
            x += dx;
            if x.iter().any(|v| !v.is_finite()) {
                return Err("Newton iterations produced non-finite values");
            }
        }
        Err("Newton iterations did not converge")
    }

    /// Calculates the residual and the Jacobian of the implicit return mapping
    fn residual_and_jacobian(
        &self,
        r: &mut DVector<f64>,
        jac: &mut DMatrix<f64>,
        x: &DVector<f64>,
        sigma_trial: &Tensor2,
        z_n: &[f64],
        dde: &Tensor4,
    ) -> Result<(), StrError> {
        let nz = self.n_values;
        let il = MANDEL_DIM + nz;
        let sigma = Tensor2::from_slice(&x.as_slice()[..MANDEL_DIM]);
        let z = &x.as_slice()[MANDEL_DIM..il];
        let lambda = x[il];

        // flow direction, hardening rates, and Dₑ : m
        let mut m = Tensor2::new();
        self.flow.direction(&mut m, &sigma, z)?;
        let mut h = vec![0.0; nz];
        self.variables.hardening_rates(&mut h, z, &m, &sigma);
        let mut dde_m = Tensor2::new();
        t4_ddot_t2(&mut dde_m, 1.0, dde, &m);

        // residual
        for i in 0..MANDEL_DIM {
            r[i] = sigma.vector()[i] - sigma_trial.vector()[i] + lambda * dde_m.vector()[i];
        }
        for i in 0..nz {
            r[MANDEL_DIM + i] = z[i] - z_n[i] - lambda * h[i];
        }
        r[il] = self.yield_function.value(&sigma, z)?;

        // derivatives
        let mut dm_dsigma = Tensor4::new();
        self.flow.dm_dsigma(&mut dm_dsigma, &sigma, z)?;
        let mut dm_dz = DMatrix::zeros(MANDEL_DIM, nz);
        self.flow.dm_dz(&mut dm_dz, &sigma, z)?;
        let mut dh_dsigma = DMatrix::zeros(nz, MANDEL_DIM);
        let mut dh_dz = DMatrix::zeros(nz, nz);
        if nz > 0 {
            numerical_jacobian(&mut dh_dsigma, sigma.as_slice(), |out, xx| {
                self.hardening_rates(out, &Tensor2::from_slice(xx), z)
            })?;
            numerical_jacobian(&mut dh_dz, z, |out, xx| self.hardening_rates(out, &sigma, xx))?;
        }
        let mut df_dsigma = Tensor2::new();
        self.yield_function.df_dsigma(&mut df_dsigma, &sigma, z)?;
        let mut df_dz = vec![0.0; nz];
        self.yield_function.df_dz(&mut df_dz, &sigma, z)?;

        // Jacobian
        jac.fill(0.0);
        let d = dde.matrix();
        let d_dm_dsigma = d * dm_dsigma.matrix();
        for i in 0..MANDEL_DIM {
            for j in 0..MANDEL_DIM {
                jac[(i, j)] = lambda * d_dm_dsigma[(i, j)];
            }
            jac[(i, i)] += 1.0;
            for j in 0..nz {
                let mut sum = 0.0;
                for k in 0..MANDEL_DIM {
                    sum += d[(i, k)] * dm_dz[(k, j)];
                }
                jac[(i, MANDEL_DIM + j)] = lambda * sum;
            }
            jac[(i, il)] = dde_m.vector()[i];
        }
        for i in 0..nz {
            for j in 0..MANDEL_DIM {
                jac[(MANDEL_DIM + i, j)] = -lambda * dh_dsigma[(i, j)];
            }
            for j in 0..nz {
                jac[(MANDEL_DIM + i, MANDEL_DIM + j)] = -lambda * dh_dz[(i, j)];
            }
            jac[(MANDEL_DIM + i, MANDEL_DIM + i)] += 1.0;
            jac[(MANDEL_DIM + i, il)] = -h[i];
        }
        for j in 0..MANDEL_DIM {
            jac[(il, j)] = df_dsigma.vector()[j];
        }
        for j in 0..nz {
            jac[(il, MANDEL_DIM + j)] = df_dz[j];
        }
        Ok(())
    }

    /// Calculates ∂(Dₑ(σ) : v)/∂σ (zero if the elastic modulus is constant)
    fn modulus_sensitivity(&self, gg: &mut DMatrix<f64>, sigma: &Tensor2, v: &Tensor2) -> Result<(), StrError> {
        if self.elasticity.constant_modulus() {
            gg.fill(0.0);
            return Ok(());
        }
        let mut dde = Tensor4::new();
        let mut dde_v = Tensor2::new();
        numerical_jacobian(gg, sigma.as_slice(), |out, xx| {
            self.elasticity.modulus(&mut dde, &Tensor2::from_slice(xx))?;
            t4_ddot_t2(&mut dde_v, 1.0, &dde, v);
            out.copy_from_slice(dde_v.as_slice());
            Ok(())
        })
    }

    /// Propagates dσ/dΔε and dz/dΔε over one implicit sub-increment
    ///
    /// With σ_trial = σₙ + Dₑ(σₙ) : (Δε/n), the linearization of the converged residual gives:
    ///
    /// ```text
    /// J · [Sσ, Sz, Sλ]ᵀ = [(I + G) · Sσₙ + Dₑ/n, Szₙ, 0]ᵀ
    /// ```
    ///
    /// where G = ∂(Dₑ(σₙ) : (Δε/n - Δλ m))/∂σₙ. The elastic case reduces to the first row with J = I.
    /// Returns to the apex are linearized numerically (see `apex_step_jacobian`).
    fn update_sensitivity(
        &self,
        sens: &mut Sensitivity,
        sigma_n: &Tensor2,
        z_n: &[f64],
        deps: &Tensor2,
        step: &ImplicitStep,
        fraction: f64,
    ) -> Result<(), StrError> {
        let nz = self.n_values;
        if step.kind == StepKind::Apex {
            let mut jac = DMatrix::zeros(MANDEL_DIM + nz, 2 * MANDEL_DIM + nz);
            self.apex_step_jacobian(&mut jac, sigma_n, z_n, deps)?;
            let s = jac.columns(0, MANDEL_DIM) * &sens.s_sigma
                + jac.columns(MANDEL_DIM, nz) * &sens.s_z
                + jac.columns(MANDEL_DIM + nz, MANDEL_DIM) * fraction;
            sens.s_sigma.copy_from(&s.rows(0, MANDEL_DIM));
            sens.s_z.copy_from(&s.rows(MANDEL_DIM, nz));
            return Ok(());
        }
        let mut v = *deps;
        v.add_tensor(-step.lambda, &step.m);
        self.modulus_sensitivity(&mut sens.gg, sigma_n, &v)?;
        let mut top = &sens.s_sigma + &sens.gg * &sens.s_sigma;
        for i in 0..MANDEL_DIM {
            for j in 0..MANDEL_DIM {
                top[(i, j)] += step.dde.get(i, j) * fraction;
            }
        }
        match &step.jacobian {
            None => sens.s_sigma = top,
            Some(jac) => {
                let neq = jac.nrows();
                let mut rhs = DMatrix::zeros(neq, MANDEL_DIM);
                rhs.view_mut((0, 0), (MANDEL_DIM, MANDEL_DIM)).copy_from(&top);
                rhs.view_mut((MANDEL_DIM, 0), (nz, MANDEL_DIM)).copy_from(&sens.s_z);
                let sol = jac.clone().lu().solve(&rhs).ok_or("Jacobian matrix is singular")?;
                sens.s_sigma.copy_from(&sol.view((0, 0), (MANDEL_DIM, MANDEL_DIM)));
                sens.s_z.copy_from(&sol.view((MANDEL_DIM, 0), (nz, MANDEL_DIM)));
            }
        }
        Ok(())
    }

    /// Maps a trial stress beyond the apex of the yield surface to the apex
    ///
    /// The stress is the apex stress σₐ(z) and the plastic strain increment follows from the elastic law:
    ///
    /// ```text
    /// Δεₚ = Dₑ⁻¹ : (σ_trial - σₐ(z)) = Δλ m
    /// R_z = z - zₙ - Δλ h(σₐ, z, m) = 0
    /// ```
    ///
    /// Returns None if the yield surface has no apex or if the flow rule cannot reproduce Δεₚ at the
    /// apex (the trial stress maps to a regular point of the yield surface).
    pub(super) fn apex_return(&self, sigma_trial: &Tensor2, z_n: &[f64], dde: &Tensor4) -> Result<Option<ApexState>, StrError> {
        if self.yield_function.apex_stress(z_n)?.is_none() {
            return Ok(None);
        }
        let lu = dde.matrix().lu();
        let evaluate = |z: &[f64]| -> Result<Option<(Tensor2, f64, Tensor2)>, StrError> {
            let sigma = match self.yield_function.apex_stress(z)? {
                Some(apex) => apex,
                None => return Ok(None),
            };
            let deps_p = lu
                .solve(&(sigma_trial.vector() - sigma.vector()))
                .ok_or("elastic modulus is singular")?;
            let mut m = Tensor2::new();
            Ok(self
                .flow
                .apex_direction(&mut m, &Tensor2::from_vector(deps_p))?
                .map(|lambda| (sigma, lambda, m)))
        };

        // Newton iterations on the internal values
        let nz = self.n_values;
        let mut z = z_n.to_vec();
        let mut r: DVector<f64> = DVector::zeros(nz);
        let mut rates = vec![0.0; nz];
        let mut jac = DMatrix::zeros(nz, nz);
        let scale = f64::max(DVector::from_row_slice(z_n).norm(), 1.0);
        for iteration in 0..self.settings.newton_max_iterations {
            let (sigma, lambda, m) = match evaluate(&z)? {
                Some(state) => state,
                None => return Ok(None),
            };
            self.variables.hardening_rates(&mut rates, &z, &m, &sigma);
            for i in 0..nz {
                r[i] = z[i] - z_n[i] - lambda * rates[i];
            }
            if r.norm() / scale <= self.settings.newton_tol {
                debug!("apex return converged after {} iterations (Δλ = {:e})", iteration, lambda);
                return Ok(Some(ApexState { sigma, z, lambda, m }));
            }
            numerical_jacobian(&mut jac, &z, |out, zz| {
                let (s, l, mm) = evaluate(zz)?.ok_or("apex return left the apex region")?;
                self.variables.hardening_rates(out, zz, &mm, &s);
                for i in 0..nz {
                    out[i] = zz[i] - z_n[i] - l * out[i];
                }
                Ok(())
            })?;
            let dz = jac.clone().lu().solve(&(-&r)).ok_or("Jacobian matrix is singular")?;
            for i in 0..nz {
                z[i] += dz[i];
            }
        }
        Err("apex return did not converge")
    }

    /// Calculates the derivatives of an apex return [σ, z] w.r.t [σₙ, zₙ, Δε] using central differences
    ///
    /// The output matrix is (6 + n_values) × (12 + n_values).
    fn apex_step_jacobian(&self, jac: &mut DMatrix<f64>, sigma_n: &Tensor2, z_n: &[f64], deps: &Tensor2) -> Result<(), StrError> {
        let nz = self.n_values;
        let mut x = Vec::with_capacity(2 * MANDEL_DIM + nz);
        x.extend_from_slice(sigma_n.as_slice());
        x.extend_from_slice(z_n);
        x.extend_from_slice(deps.as_slice());
        let mut dde = Tensor4::new();
        numerical_jacobian(jac, &x, |out, xx| {
            let sigma = Tensor2::from_slice(&xx[..MANDEL_DIM]);
            self.elasticity.modulus(&mut dde, &sigma)?;
            let mut sigma_trial = sigma;
            t4_ddot_t2_update(&mut sigma_trial, 1.0, &dde, &Tensor2::from_slice(&xx[(MANDEL_DIM + nz)..]), 1.0);
            let apex = self
                .apex_return(&sigma_trial, &xx[MANDEL_DIM..(MANDEL_DIM + nz)], &dde)?
                .ok_or("apex return left the apex region")?;
            out[..MANDEL_DIM].copy_from_slice(apex.sigma.as_slice());
            out[MANDEL_DIM..].copy_from_slice(&apex.z);
            Ok(())
        })
    }

    /// Calculates dσ/dΔε of an apex return over one sub-increment starting at (σₙ, zₙ)
    ///
    /// This replaces the continuum modulus, which is undefined at the apex.
    fn apex_modulus(&self, ddep: &mut Tensor4, sigma_n: &Tensor2, z_n: &[f64], deps: &Tensor2) -> Result<(), StrError> {
        let nz = self.n_values;
        let mut jac = DMatrix::zeros(MANDEL_DIM + nz, 2 * MANDEL_DIM + nz);
        self.apex_step_jacobian(&mut jac, sigma_n, z_n, deps)?;
        let mat = ddep.matrix_mut();
        for i in 0..MANDEL_DIM {
            for j in 0..MANDEL_DIM {
                mat[(i, j)] = jac[(i, MANDEL_DIM + nz + j)];
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
