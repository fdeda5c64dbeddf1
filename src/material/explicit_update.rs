use super::{Elasticity, FlowDirection, InternalVariableSet, ReturnMapping, StepKind, YieldFunction};
use crate::base::{IntegrationMethod, DRIFT_MAX_ITERATIONS, FD_TANGENT_STEP, PEGASUS_MAX_ITERATIONS};
use crate::base::UNLOADING_STATIONS;
use crate::tensor::{t2_ddot_t2, t2_ddot_t4_ddot_t2, t4_ddot_t2, Tensor2, Tensor4, MANDEL_DIM};
use crate::StrError;
use log::debug;

/// Holds the relative tolerance of the Pegasus root finder
const PEGASUS_TOL: f64 = 1e-14;

/// Holds the tolerance to accept the end of the pseudo-time interval
const PSEUDO_TIME_TOL: f64 = 1e-14;

/// Records the accepted pseudo-time steps of the explicit methods (or replays them)
///
/// Replaying the steps makes the re-integrations of the numerical tangent follow the same
/// discretization as the original update.
#[derive(Clone, Debug)]
pub(super) struct ExplicitSchedule {
    steps: Vec<f64>,
    cursor: usize,
    replay: bool,
}

impl ExplicitSchedule {
    /// Allocates a new (recording) schedule
    pub(super) fn new() -> Self {
        ExplicitSchedule {
            steps: Vec::new(),
            cursor: 0,
            replay: false,
        }
    }

    /// Returns a schedule replaying the recorded steps
    fn replaying(&self) -> Self {
        ExplicitSchedule {
            steps: self.steps.clone(),
            cursor: 0,
            replay: true,
        }
    }

    /// Returns the next step to be replayed, if any
    fn next(&mut self) -> Option<f64> {
        if self.replay && self.cursor < self.steps.len() {
            self.cursor += 1;
            Some(self.steps[self.cursor - 1])
        } else {
            None
        }
    }

    /// Records an accepted step
    fn record(&mut self, dt: f64) {
        if !self.replay {
            self.steps.push(dt);
        }
    }
}

/// Finds a root of g(t) in [a, b] using the Pegasus method
///
/// The function values at a and b must have opposite signs.
///
/// ```text
/// t = b - g(b) (b - a) / (g(b) - g(a))
/// ```
///
/// If g(t) and g(b) have opposite signs, a ← b; otherwise g(a) ← g(a) g(b) / (g(b) + g(t)). Then b ← t.
pub fn pegasus_root<G>(a: f64, b: f64, mut g: G) -> Result<f64, StrError>
where
    G: FnMut(f64) -> Result<f64, StrError>,
{
    let (mut a, mut b) = (a, b);
    let mut fa = g(a)?;
    let mut fb = g(b)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa * fb > 0.0 {
        return Err("Pegasus method requires g(a) and g(b) with opposite signs");
    }
    let ftol = PEGASUS_TOL * f64::max(1.0, f64::max(f64::abs(fa), f64::abs(fb)));
    for _ in 0..PEGASUS_MAX_ITERATIONS {
        let t = b - fb * (b - a) / (fb - fa);
        let ft = g(t)?;
        if f64::abs(ft) <= ftol {
            return Ok(t);
        }
        if ft * fb < 0.0 {
            a = b;
            fa = fb;
        } else {
            fa = fa * fb / (fb + ft);
        }
        b = t;
        fb = ft;
        if f64::abs(b - a) <= PEGASUS_TOL {
            return Ok(b);
        }
    }
    Err("Pegasus method did not converge")
}

impl<'a, E, Y, F, S> ReturnMapping<'a, E, Y, F, S>
where
    E: Elasticity,
    Y: YieldFunction,
    F: FlowDirection,
    S: InternalVariableSet,
{
    /// Integrates one sub-increment with an explicit method
    ///
    /// Returns the plastic multiplier and the kind of update. A trial stress beyond the apex of
    /// the yield surface is mapped to the apex directly.
    pub(super) fn explicit_substep(
        &self,
        sigma: &mut Tensor2,
        z: &mut [f64],
        deps: &Tensor2,
        schedule: &mut ExplicitSchedule,
    ) -> Result<(f64, StepKind), StrError> {
        let mut dde = Tensor4::new();
        self.elasticity.modulus(&mut dde, sigma)?;
        let mut dsigma_e = Tensor2::new();
        t4_ddot_t2(&mut dsigma_e, 1.0, &dde, deps);
        let sigma_trial = *sigma + dsigma_e;
        if self.yield_function.value(&sigma_trial, z)? > self.settings.yf_tol {
            if let Some(apex) = self.apex_return(&sigma_trial, z, &dde)? {
                *sigma = apex.sigma;
                z.copy_from_slice(&apex.z);
                return Ok((apex.lambda, StepKind::Apex));
            }
        }
        let alpha = match self.elastic_fraction(sigma, &dsigma_e, z)? {
            Some(alpha) => alpha,
            None => {
                sigma.add_tensor(1.0, &dsigma_e);
                return Ok((0.0, StepKind::Elastic));
            }
        };
        sigma.add_tensor(alpha, &dsigma_e);
        let deps_p = *deps * (1.0 - alpha);
        let lambda = match self.settings.method {
            IntegrationMethod::ModifiedEuler => self.modified_euler(sigma, z, &deps_p, schedule)?,
            _ => self.forward_euler(sigma, z, &deps_p)?,
        };
        Ok((lambda, StepKind::Plastic))
    }

    /// Finds the fraction of the sub-increment that is elastic
    ///
    /// Returns None if the whole sub-increment is elastic. Dₑ is frozen at the initial stress,
    /// thus σ(t) = σ + t Δσₑ.
    pub(super) fn elastic_fraction(&self, sigma: &Tensor2, dsigma_e: &Tensor2, z: &[f64]) -> Result<Option<f64>, StrError> {
        let yf = |t: f64| {
            let mut s = *sigma;
            s.add_tensor(t, dsigma_e);
            self.yield_function.value(&s, z)
        };
        if yf(1.0)? <= self.settings.yf_tol {
            return Ok(None);
        }

        // inside the yield surface
        if yf(0.0)? < -self.settings.yf_tol {
            return Ok(Some(pegasus_root(0.0, 1.0, yf)?));
        }

        // on the yield surface and loading
        let mut df_dsigma = Tensor2::new();
        self.yield_function.df_dsigma(&mut df_dsigma, sigma, z)?;
        if t2_ddot_t2(&df_dsigma, dsigma_e) >= 0.0 {
            return Ok(Some(0.0));
        }

        // elastic unloading followed by reloading
        let mut t_neg = None;
        for i in 1..=UNLOADING_STATIONS {
            let t = (i as f64) / (UNLOADING_STATIONS as f64);
            let f = yf(t)?;
            if f < 0.0 {
                t_neg = Some(t);
            } else if let Some(a) = t_neg {
                if f > 0.0 {
                    debug!("elastic unloading followed by reloading in [{}, {}]", a, t);
                    return Ok(Some(pegasus_root(a, t, yf)?));
                }
            }
        }
        Ok(Some(0.0))
    }

    /// Calculates the continuum rates and returns the plastic multiplier Λ
    ///
    /// ```text
    /// Λ = max((df/dσ) : Dₑ : Δε / Nₚ, 0)
    /// Δσ = Dₑ : (Δε - Λ m)
    /// Δz = Λ h
    /// ```
    fn continuum_rates(
        &self,
        dsigma: &mut Tensor2,
        dz: &mut [f64],
        sigma: &Tensor2,
        z: &[f64],
        deps: &Tensor2,
    ) -> Result<f64, StrError> {
        let data = self.plastic_data(sigma, z)?;
        let lambda = f64::max(t2_ddot_t4_ddot_t2(&data.df_dsigma, &data.dde, deps) / data.nnp, 0.0);
        let mut v = *deps;
        v.add_tensor(-lambda, &data.m);
        t4_ddot_t2(dsigma, 1.0, &data.dde, &v);
        for i in 0..dz.len() {
            dz[i] = lambda * data.h[i];
        }
        Ok(lambda)
    }

    /// Performs one forward Euler step followed by the drift correction
    fn forward_euler(&self, sigma: &mut Tensor2, z: &mut [f64], deps: &Tensor2) -> Result<f64, StrError> {
        let mut dsigma = Tensor2::new();
        let mut dz = vec![0.0; self.n_values];
        let mut lambda = self.continuum_rates(&mut dsigma, &mut dz, sigma, z, deps)?;
        sigma.add_tensor(1.0, &dsigma);
        for i in 0..z.len() {
            z[i] += dz[i];
        }
        lambda += self.correct_drift(sigma, z)?;
        Ok(lambda)
    }

    /// Integrates with the modified Euler method with local error control
    fn modified_euler(
        &self,
        sigma: &mut Tensor2,
        z: &mut [f64],
        deps: &Tensor2,
        schedule: &mut ExplicitSchedule,
    ) -> Result<f64, StrError> {
        let nz = self.n_values;
        let stol = self.settings.stol;
        let mut dsigma1 = Tensor2::new();
        let mut dsigma2 = Tensor2::new();
        let mut dz1 = vec![0.0; nz];
        let mut dz2 = vec![0.0; nz];
        let mut z_mid = vec![0.0; nz];
        let mut z_new = vec![0.0; nz];
        let mut t = 0.0;
        let mut dt = 1.0;
        let mut lambda = 0.0;
        while 1.0 - t > PSEUDO_TIME_TOL {
            let replayed = schedule.next();
            let h = f64::min(replayed.unwrap_or(dt), 1.0 - t);
            let deps_h = *deps * h;

            // first and second stages
            let lambda1 = self.continuum_rates(&mut dsigma1, &mut dz1, sigma, z, &deps_h)?;
            let sigma_mid = *sigma + dsigma1;
            for i in 0..nz {
                z_mid[i] = z[i] + dz1[i];
            }
            let lambda2 = self.continuum_rates(&mut dsigma2, &mut dz2, &sigma_mid, &z_mid, &deps_h)?;

            // second-order update and relative error estimate
            let sigma_new = *sigma + (dsigma1 + dsigma2) * 0.5;
            let mut num = (dsigma2 - dsigma1).norm().powi(2);
            let mut den = sigma_new.norm().powi(2);
            for i in 0..nz {
                z_new[i] = z[i] + 0.5 * (dz1[i] + dz2[i]);
                num += (dz2[i] - dz1[i]).powi(2);
                den += z_new[i] * z_new[i];
            }
            let error = f64::sqrt(num) / (2.0 * f64::max(f64::sqrt(den), 1.0));

            // accept or reject
            if replayed.is_some() || error <= stol {
                *sigma = sigma_new;
                z.copy_from_slice(&z_new);
                lambda += 0.5 * (lambda1 + lambda2) + self.correct_drift(sigma, z)?;
                t += h;
                schedule.record(h);
            }
            if replayed.is_none() {
                let ratio = if error > 0.0 {
                    f64::min(f64::max(0.9 * f64::sqrt(stol / error), 0.1), 1.1)
                } else {
                    1.1
                };
                dt = h * ratio;
                if dt < self.settings.dt_min {
                    return Err("ModifiedEuler step size became smaller than dt_min");
                }
            }
        }
        Ok(lambda)
    }

    /// Brings the state back to the yield surface
    ///
    /// ```text
    /// δλ = f / Nₚ
    /// σ ← σ - δλ Dₑ : m
    /// z ← z + δλ h
    /// ```
    ///
    /// Returns the sum of the corrections δλ.
    pub(super) fn correct_drift(&self, sigma: &mut Tensor2, z: &mut [f64]) -> Result<f64, StrError> {
        let mut lambda = 0.0;
        let mut dde_m = Tensor2::new();
        for _ in 0..DRIFT_MAX_ITERATIONS {
            let f = self.yield_function.value(sigma, z)?;
            if f64::abs(f) <= self.settings.yf_tol {
                return Ok(lambda);
            }
            let data = self.plastic_data(sigma, z)?;
            let dl = f / data.nnp;
            t4_ddot_t2(&mut dde_m, 1.0, &data.dde, &data.m);
            sigma.add_tensor(-dl, &dde_m);
            for i in 0..z.len() {
                z[i] += dl * data.h[i];
            }
            lambda += dl;
        }
        Err("drift correction did not converge")
    }

    /// Calculates the algorithmic tangent of the explicit methods by forward differences
    ///
    /// Each column j re-integrates the increment Δε + h eⱼ with the same sub-increments and the
    /// same pseudo-time steps.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn explicit_tangent(
        &self,
        tangent: &mut Tensor4,
        n_substeps: usize,
        sigma0: &Tensor2,
        z0: &[f64],
        delta_strain: &Tensor2,
        sigma: &Tensor2,
        schedule: &ExplicitSchedule,
    ) -> Result<(), StrError> {
        let h = FD_TANGENT_STEP;
        let fraction = 1.0 / (n_substeps as f64);
        let mut z = vec![0.0; z0.len()];
        for j in 0..MANDEL_DIM {
            let mut perturbed = *delta_strain;
            perturbed.vector_mut()[j] += h;
            let deps = perturbed * fraction;
            let mut s = *sigma0;
            z.copy_from_slice(z0);
            let mut replay = schedule.replaying();
            for _ in 0..n_substeps {
                self.explicit_substep(&mut s, &mut z, &deps, &mut replay)?;
            }
            let mat = tangent.matrix_mut();
            for i in 0..MANDEL_DIM {
                mat[(i, j)] = (s.vector()[i] - sigma.vector()[i]) / h;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
