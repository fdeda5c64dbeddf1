use crate::base::FD_STEP;
use crate::StrError;
use nalgebra::DMatrix;

/// Computes the Jacobian matrix of a vector function using central differences
///
/// ```text
/// J[i][j] = (g_i(x + h e_j) - g_i(x - h e_j)) / (2 h)   with   h = FD_STEP · max(1, |x_j|)
/// ```
///
/// # Input
///
/// * `jac` -- (m × n) matrix; m is the dimension of g and n is the dimension of x
/// * `x` -- point of evaluation
/// * `g` -- function `g(out, x)` writing m values into `out`
pub fn numerical_jacobian<G>(jac: &mut DMatrix<f64>, x: &[f64], mut g: G) -> Result<(), StrError>
where
    G: FnMut(&mut [f64], &[f64]) -> Result<(), StrError>,
{
    let (m, n) = jac.shape();
    if x.len() != n {
        return Err("Jacobian matrix and x have incompatible dimensions");
    }
    let mut xx = x.to_vec();
    let mut g_plus = vec![0.0; m];
    let mut g_minus = vec![0.0; m];
    for j in 0..n {
        let h = FD_STEP * f64::max(1.0, f64::abs(x[j]));
        xx[j] = x[j] + h;
        g(&mut g_plus, &xx)?;
        xx[j] = x[j] - h;
        g(&mut g_minus, &xx)?;
        xx[j] = x[j];
        for i in 0..m {
            jac[(i, j)] = (g_plus[i] - g_minus[i]) / (2.0 * h);
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
