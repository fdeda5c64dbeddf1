use super::{IntegrationMethod, TangentType, DEFAULT_NEWTON_TOL, DEFAULT_YF_TOL};
use super::{SETTINGS_MIN_DT_MIN, SETTINGS_MIN_TOL};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the options controlling the stress update of a material point
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Method to integrate the elastoplastic rate equations
    pub method: IntegrationMethod,

    /// Stiffness tensor returned after a stress update
    pub tangent: TangentType,

    /// Tolerance allowing small positive values of the yield function to be regarded as zero
    pub yf_tol: f64,

    /// Tolerance on the scaled residual of the implicit return mapping
    pub newton_tol: f64,

    /// Maximum number of Newton iterations per sub-increment
    pub newton_max_iterations: usize,

    /// Norm of the largest strain sub-increment (None means that the increment is not split a priori)
    pub max_strain_increment: Option<f64>,

    /// Maximum number of sub-increments; the stress update fails beyond this value
    pub max_substeps: usize,

    /// Relative tolerance of the local error control (ModifiedEuler)
    pub stol: f64,

    /// Minimum pseudo-time step of the local error control (ModifiedEuler)
    pub dt_min: f64,

    /// Allows an initial stress outside the yield surface (e.g., for debugging)
    pub allow_initial_drift: bool,
}

impl Settings {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Settings {
            method: IntegrationMethod::BackwardEuler,
            tangent: TangentType::Algorithmic,
            yf_tol: DEFAULT_YF_TOL,
            newton_tol: DEFAULT_NEWTON_TOL,
            newton_max_iterations: 25,
            max_strain_increment: None,
            max_substeps: 64,
            stol: 1e-6,
            dt_min: 1e-6,
            allow_initial_drift: false,
        }
    }

    /// Sets the integration method
    pub fn set_method(&mut self, method: IntegrationMethod) -> Result<&mut Self, StrError> {
        self.method = method;
        Ok(self)
    }

    /// Sets the type of tangent modulus
    pub fn set_tangent(&mut self, tangent: TangentType) -> Result<&mut Self, StrError> {
        self.tangent = tangent;
        Ok(self)
    }

    /// Sets the yield function tolerance
    pub fn set_yf_tol(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < SETTINGS_MIN_TOL {
            return Err("yf_tol must be ≥ 1e-15");
        }
        self.yf_tol = value;
        Ok(self)
    }

    /// Sets the tolerance and the maximum number of iterations of Newton's method
    pub fn set_newton(&mut self, tol: f64, max_iterations: usize) -> Result<&mut Self, StrError> {
        if tol < SETTINGS_MIN_TOL {
            return Err("newton_tol must be ≥ 1e-15");
        }
        if max_iterations < 1 {
            return Err("newton_max_iterations must be ≥ 1");
        }
        self.newton_tol = tol;
        self.newton_max_iterations = max_iterations;
        Ok(self)
    }

    /// Sets the norm of the largest strain sub-increment
    pub fn set_max_strain_increment(&mut self, value: Option<f64>) -> Result<&mut Self, StrError> {
        if let Some(v) = value {
            if v <= 0.0 {
                return Err("max_strain_increment must be > 0.0");
            }
        }
        self.max_strain_increment = value;
        Ok(self)
    }

    /// Sets the maximum number of sub-increments
    pub fn set_max_substeps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("max_substeps must be ≥ 1");
        }
        self.max_substeps = value;
        Ok(self)
    }

    /// Sets the parameters of the local error control
    pub fn set_error_control(&mut self, stol: f64, dt_min: f64) -> Result<&mut Self, StrError> {
        if stol < SETTINGS_MIN_TOL {
            return Err("stol must be ≥ 1e-15");
        }
        if dt_min < SETTINGS_MIN_DT_MIN || dt_min > 1.0 {
            return Err("dt_min must be in [1e-12, 1.0]");
        }
        self.stol = stol;
        self.dt_min = dt_min;
        Ok(self)
    }

    /// Allows (or not) an initial stress outside the yield surface
    pub fn set_allow_initial_drift(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.allow_initial_drift = flag;
        Ok(self)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.yf_tol < SETTINGS_MIN_TOL {
            return Some(format!("yf_tol = {:?} is incorrect; it must be ≥ {:e}", self.yf_tol, SETTINGS_MIN_TOL));
        }
        if self.newton_tol < SETTINGS_MIN_TOL {
            return Some(format!(
                "newton_tol = {:?} is incorrect; it must be ≥ {:e}",
                self.newton_tol, SETTINGS_MIN_TOL
            ));
        }
        if self.newton_max_iterations < 1 {
            return Some(format!(
                "newton_max_iterations = {} is incorrect; it must be ≥ 1",
                self.newton_max_iterations
            ));
        }
        if let Some(v) = self.max_strain_increment {
            if v <= 0.0 {
                return Some(format!("max_strain_increment = {:?} is incorrect; it must be > 0.0", v));
            }
        }
        if self.max_substeps < 1 {
            return Some(format!("max_substeps = {} is incorrect; it must be ≥ 1", self.max_substeps));
        }
        if self.stol < SETTINGS_MIN_TOL {
            return Some(format!("stol = {:?} is incorrect; it must be ≥ {:e}", self.stol, SETTINGS_MIN_TOL));
        }
        if self.dt_min < SETTINGS_MIN_DT_MIN || self.dt_min > 1.0 {
            return Some(format!(
                "dt_min = {:?} is incorrect; it must be {:e} ≤ dt_min ≤ 1.0",
                self.dt_min, SETTINGS_MIN_DT_MIN
            ));
        }
        None
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
