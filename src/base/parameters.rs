use serde::{Deserialize, Serialize};

/// Holds parameters for the elasticity law
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum ParamElasticity {
    /// Linear isotropic elasticity
    LinearIsotropic {
        /// Young's modulus
        young: f64,

        /// Poisson's coefficient
        poisson: f64,
    },

    /// Isotropic elasticity with a Young's modulus depending on the mean pressure
    ///
    /// ```text
    /// E = e_ref · (max(p, p_min) / p_ref)ⁿ   with   p = -σm
    /// ```
    PressureDependent {
        /// Young's modulus at the reference pressure
        e_ref: f64,

        /// Reference pressure
        p_ref: f64,

        /// Exponent
        n: f64,

        /// Poisson's coefficient
        poisson: f64,

        /// Cut-off pressure
        p_min: f64,
    },
}

/// Holds parameters for the plasticity model (yield function, flow rule, and hardening)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum ParamPlasticity {
    /// von Mises with linear isotropic and linear kinematic (Prager) hardening
    VonMises {
        /// Initial size of the yield surface (von Mises stress)
        ///
        /// ```text
        /// f = ‖s - α‖ - √(2/3) R   with   R(0) = z0
        /// ```
        z0: f64,

        /// Isotropic hardening modulus
        hh: f64,

        /// Kinematic hardening modulus
        hk: f64,
    },

    /// von Mises with linear isotropic and saturating (Voce) isotropic hardening
    VonMisesVoce {
        /// Initial size of the yield surface (von Mises stress)
        z0: f64,

        /// Initial hardening modulus
        hh: f64,

        /// Saturation size of the yield surface
        r_inf: f64,
    },

    /// von Mises with linear isotropic and Armstrong-Frederick kinematic hardening
    VonMisesArmstrongFrederick {
        /// Initial size of the yield surface (von Mises stress)
        z0: f64,

        /// Isotropic hardening modulus
        hh: f64,

        /// Kinematic hardening modulus
        ha: f64,

        /// Dynamic recovery coefficient
        cr: f64,
    },

    /// Drucker-Prager with linear isotropic hardening
    ///
    /// ```text
    /// f = ‖s - α‖ - √(2/3) (R + η p)   with   p = -σm
    /// ```
    DruckerPrager {
        /// Initial size of the yield surface at zero pressure
        z0: f64,

        /// Pressure sensitivity of the yield surface
        eta: f64,

        /// Pressure sensitivity of the plastic potential (eta_g = eta renders associated flow)
        eta_g: f64,

        /// Isotropic hardening modulus
        hh: f64,
    },
}

/// Holds parameters for a solid material point
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParamSolid {
    /// Elasticity law
    pub elasticity: ParamElasticity,

    /// Plasticity model
    pub plasticity: ParamPlasticity,
}

impl ParamSolid {
    /// Returns a sample von Mises model with isotropic hardening only
    pub fn sample_von_mises() -> Self {
        ParamSolid {
            elasticity: ParamElasticity::LinearIsotropic {
                young: 1500.0,
                poisson: 0.25,
            },
            plasticity: ParamPlasticity::VonMises {
                z0: 9.0,
                hh: 800.0,
                hk: 0.0,
            },
        }
    }

    /// Returns a sample Drucker-Prager model with non-associated flow
    pub fn sample_drucker_prager() -> Self {
        ParamSolid {
            elasticity: ParamElasticity::LinearIsotropic {
                young: 1500.0,
                poisson: 0.25,
            },
            plasticity: ParamPlasticity::DruckerPrager {
                z0: 9.0,
                eta: 0.6,
                eta_g: 0.3,
                hh: 800.0,
            },
        }
    }

    /// Returns the Young's modulus at zero stress and the Poisson's coefficient
    pub fn initial_young_poisson(&self) -> (f64, f64) {
        match self.elasticity {
            ParamElasticity::LinearIsotropic { young, poisson } => (young, poisson),
            ParamElasticity::PressureDependent {
                e_ref,
                p_ref,
                n,
                poisson,
                p_min,
            } => (e_ref * f64::powf(p_min / p_ref, n), poisson),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
