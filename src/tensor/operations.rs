use super::{Tensor2, Tensor4};

/// Performs the double-dot (ddot) operation between two second-order tensors
///
/// ```text
/// s = a : b
/// ```
pub fn t2_ddot_t2(a: &Tensor2, b: &Tensor2) -> f64 {
    a.vector().dot(b.vector())
}

/// Performs the dyadic product between two second-order tensors
///
/// ```text
/// D = α a ⊗ b
/// ```
pub fn t2_dyad_t2(dd: &mut Tensor4, alpha: f64, a: &Tensor2, b: &Tensor2) {
    let mat = dd.matrix_mut();
    let (u, v) = (a.vector(), b.vector());
    for i in 0..6 {
        for j in 0..6 {
            mat[(i, j)] = alpha * u[i] * v[j];
        }
    }
}

/// Updates a fourth-order tensor with the dyadic product between two second-order tensors
///
/// ```text
/// D += α a ⊗ b
/// ```
pub fn t2_dyad_t2_update(dd: &mut Tensor4, alpha: f64, a: &Tensor2, b: &Tensor2) {
    let mat = dd.matrix_mut();
    let (u, v) = (a.vector(), b.vector());
    for i in 0..6 {
        for j in 0..6 {
            mat[(i, j)] += alpha * u[i] * v[j];
        }
    }
}

/// Performs the double-dot (ddot) operation between a fourth-order and a second-order tensor
///
/// ```text
/// b = α D : a
/// ```
pub fn t4_ddot_t2(b: &mut Tensor2, alpha: f64, dd: &Tensor4, a: &Tensor2) {
    *b.vector_mut() = (dd.matrix() * a.vector()) * alpha;
}

/// Updates a second-order tensor with the double-dot operation between a fourth-order and a second-order tensor
///
/// ```text
/// b = α D : a + β b
/// ```
pub fn t4_ddot_t2_update(b: &mut Tensor2, alpha: f64, dd: &Tensor4, a: &Tensor2, beta: f64) {
    let da = dd.matrix() * a.vector();
    let vec = b.vector_mut();
    *vec *= beta;
    *vec += da * alpha;
}

/// Performs the double-dot (ddot) operation between a second-order and a fourth-order tensor
///
/// ```text
/// b = α a : D
/// ```
pub fn t2_ddot_t4(b: &mut Tensor2, alpha: f64, a: &Tensor2, dd: &Tensor4) {
    *b.vector_mut() = (dd.matrix().transpose() * a.vector()) * alpha;
}

/// Performs the double-dot operations a : D : b
///
/// ```text
/// s = a : D : b
/// ```
pub fn t2_ddot_t4_ddot_t2(a: &Tensor2, dd: &Tensor4, b: &Tensor2) -> f64 {
    a.vector().dot(&(dd.matrix() * b.vector()))
}

/// Performs the operation (D : a) ⊗ (b : D) and adds it to E
///
/// ```text
/// E = α E + β (D : a) ⊗ (b : D)
/// ```
pub fn t4_ddot_t2_dyad_t2_ddot_t4(ee: &mut Tensor4, alpha: f64, dd: &Tensor4, beta: f64, a: &Tensor2, b: &Tensor2) {
    let da = dd.matrix() * a.vector();
    let bd = dd.matrix().transpose() * b.vector();
    let mat = ee.matrix_mut();
    for i in 0..6 {
        for j in 0..6 {
            mat[(i, j)] = alpha * mat[(i, j)] + beta * da[i] * bd[j];
        }
    }
}

/// Performs the double-dot (ddot) operation between two fourth-order tensors
///
/// ```text
/// E = α C : D
/// ```
pub fn t4_ddot_t4(ee: &mut Tensor4, alpha: f64, cc: &Tensor4, dd: &Tensor4) {
    *ee.matrix_mut() = (cc.matrix() * dd.matrix()) * alpha;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
