/// Number of components of a symmetric second-order tensor in Mandel representation
pub const MANDEL_DIM: usize = 6;

/// √2
pub const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// √3
pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// √(2/3)
pub const SQRT_2_BY_3: f64 = 0.816_496_580_927_726;

/// √(3/2)
pub const SQRT_3_BY_2: f64 = 1.224_744_871_391_589;

/// 1/3
pub const ONE_BY_3: f64 = 1.0 / 3.0;

/// 2/3
pub const TWO_BY_3: f64 = 2.0 / 3.0;

/// Second-order identity tensor in Mandel representation
pub const IDENTITY2: [f64; 6] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

/// Symmetric-deviatoric projector in Mandel representation
///
/// ```text
/// Psymdev = Isym - (I ⊗ I) / 3
/// ```
#[rustfmt::skip]
pub const P_SYMDEV: [[f64; 6]; 6] = [
    [ TWO_BY_3, -ONE_BY_3, -ONE_BY_3, 0.0, 0.0, 0.0],
    [-ONE_BY_3,  TWO_BY_3, -ONE_BY_3, 0.0, 0.0, 0.0],
    [-ONE_BY_3, -ONE_BY_3,  TWO_BY_3, 0.0, 0.0, 0.0],
    [      0.0,       0.0,       0.0, 1.0, 0.0, 0.0],
    [      0.0,       0.0,       0.0, 0.0, 1.0, 0.0],
    [      0.0,       0.0,       0.0, 0.0, 0.0, 1.0],
];

/// Maps the Mandel index to the (i, j) indices of the 3×3 matrix
pub(crate) const MANDEL_TO_IJ: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (0, 2)];

/// Holds the Mandel scaling factor of each component (1 on the diagonal, √2 off the diagonal)
pub(crate) const MANDEL_FACTOR: [f64; 6] = [1.0, 1.0, 1.0, SQRT_2, SQRT_2, SQRT_2];

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
