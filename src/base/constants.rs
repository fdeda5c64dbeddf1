/// Defines the smallest allowed tolerance (Settings)
pub const SETTINGS_MIN_TOL: f64 = 1e-15;

/// Defines the smallest allowed pseudo-time step dt_min (Settings)
pub const SETTINGS_MIN_DT_MIN: f64 = 1e-12;

/// Holds the default tolerance allowing small positive yield function values to be regarded as zero
pub const DEFAULT_YF_TOL: f64 = 1e-8;

/// Holds the default tolerance on the scaled residual of the implicit return mapping
pub const DEFAULT_NEWTON_TOL: f64 = 1e-10;

/// Holds the relative step used by the central-difference derivatives
pub const FD_STEP: f64 = 1e-6;

/// Holds the strain perturbation used by the forward-difference algorithmic tangent
pub const FD_TANGENT_STEP: f64 = 1e-8;

/// Holds the maximum number of iterations of the Pegasus root finder
pub const PEGASUS_MAX_ITERATIONS: usize = 60;

/// Holds the maximum number of iterations of the yield surface drift correction
pub const DRIFT_MAX_ITERATIONS: usize = 20;

/// Holds the number of stations used to detect elastic unloading followed by reloading
pub const UNLOADING_STATIONS: usize = 10;
