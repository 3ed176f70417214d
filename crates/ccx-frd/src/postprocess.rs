//! Derived quantities for tensor result fields
//!
//! Six-component tensor fields (stresses, strains) are extended with:
//! - von Mises equivalent stress or strain (`<NAME>_MISES`)
//! - Principal values sorted max, mid, min (`<NAME>_PRINCIPAL`)
//!
//! ## Usage
//!
//! ```rust
//! use ccx_frd::postprocess::{compute_mises_stress, TensorComponents};
//!
//! let stress = TensorComponents {
//!     xx: 100.0,
//!     yy: 50.0,
//!     zz: 25.0,
//!     xy: 10.0,
//!     yz: 5.0,
//!     xz: 2.0,
//! };
//!
//! let mises = compute_mises_stress(&stress);
//! println!("von Mises stress: {}", mises);
//! ```

use std::collections::BTreeMap;

use crate::model::ResultBlock;

/// Stress or strain tensor components (Voigt order as written by CalculiX:
/// XX, YY, ZZ, XY, YZ, ZX)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TensorComponents {
    /// Normal component XX
    pub xx: f64,
    /// Normal component YY
    pub yy: f64,
    /// Normal component ZZ
    pub zz: f64,
    /// Shear component XY
    pub xy: f64,
    /// Shear component YZ
    pub yz: f64,
    /// Shear component XZ
    pub xz: f64,
}

impl TensorComponents {
    /// Build from a CalculiX six-value tuple; `None` for any other length
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            &[xx, yy, zz, xy, yz, xz] => Some(Self {
                xx,
                yy,
                zz,
                xy,
                yz,
                xz,
            }),
            _ => None,
        }
    }
}

/// Principal values (eigenvalues of tensor)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalValues {
    /// Maximum principal value
    pub max: f64,
    /// Middle principal value
    pub mid: f64,
    /// Minimum principal value
    pub min: f64,
}

/// Compute von Mises stress from stress tensor components
///
/// Formula: σ_v = sqrt(0.5 * [(σ_xx - σ_yy)² + (σ_yy - σ_zz)² + (σ_zz - σ_xx)²] + 3 * [τ_xy² + τ_yz² + τ_xz²])
///
/// # Example
///
/// ```
/// use ccx_frd::postprocess::{compute_mises_stress, TensorComponents};
///
/// let stress = TensorComponents {
///     xx: 100.0, yy: 50.0, zz: 25.0,
///     xy: 10.0, yz: 5.0, xz: 2.0,
/// };
///
/// let mises = compute_mises_stress(&stress);
/// assert!(mises > 0.0);
/// ```
pub fn compute_mises_stress(stress: &TensorComponents) -> f64 {
    let term1 = 0.5
        * ((stress.xx - stress.yy).powi(2)
            + (stress.yy - stress.zz).powi(2)
            + (stress.zz - stress.xx).powi(2));

    let term2 = 3.0 * (stress.xy.powi(2) + stress.yz.powi(2) + stress.xz.powi(2));

    (term1 + term2).sqrt()
}

/// Compute von Mises equivalent strain, sqrt(2/3 ε':ε')
///
/// Shear components are tensor shears, as CalculiX writes them.
pub fn compute_mises_strain(strain: &TensorComponents) -> f64 {
    (2.0 / 3.0) * compute_mises_stress(strain)
}

/// Compute principal values of a symmetric 3×3 tensor, sorted (max, mid, min).
///
/// Solves the characteristic equation det(T - λI) = 0 with the
/// trigonometric method for three real roots.
pub fn compute_principal_values(tensor: &TensorComponents) -> PrincipalValues {
    let shear_norm = tensor.xy.abs() + tensor.yz.abs() + tensor.xz.abs();
    if shear_norm < 1e-10 {
        return sorted([tensor.xx, tensor.yy, tensor.zz]);
    }

    let i1 = tensor.xx + tensor.yy + tensor.zz;

    let i2 = tensor.xx * tensor.yy + tensor.yy * tensor.zz + tensor.zz * tensor.xx
        - tensor.xy.powi(2)
        - tensor.yz.powi(2)
        - tensor.xz.powi(2);

    let i3 = tensor.xx * tensor.yy * tensor.zz
        + 2.0 * tensor.xy * tensor.yz * tensor.xz
        - tensor.xx * tensor.yz.powi(2)
        - tensor.yy * tensor.xz.powi(2)
        - tensor.zz * tensor.xy.powi(2);

    // λ³ - I₁λ² + I₂λ - I₃ = 0, shifted to the depressed cubic t³ + pt + q = 0
    let p = i2 - i1.powi(2) / 3.0;
    let q = -2.0 * i1.powi(3) / 27.0 + i1 * i2 / 3.0 - i3;

    if p.abs() < 1e-14 {
        let lambda = i1 / 3.0;
        return PrincipalValues {
            max: lambda,
            mid: lambda,
            min: lambda,
        };
    }

    let ratio = ((-q / 2.0) / (-p / 3.0).powf(1.5)).clamp(-1.0, 1.0);
    let theta = ratio.acos();
    let k = 2.0 * (-p / 3.0).sqrt();

    let lambda1 = k * (theta / 3.0).cos() + i1 / 3.0;
    let lambda2 = k * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() + i1 / 3.0;
    let lambda3 = k * ((theta + 4.0 * std::f64::consts::PI) / 3.0).cos() + i1 / 3.0;

    sorted([lambda1, lambda2, lambda3])
}

fn sorted(mut values: [f64; 3]) -> PrincipalValues {
    values.sort_by(|a, b| b.total_cmp(a));
    PrincipalValues {
        max: values[0],
        mid: values[1],
        min: values[2],
    }
}

/// Derived blocks for every six-component tensor block in `blocks`.
///
/// Each tensor block yields `<NAME>_MISES` (scalar) and `<NAME>_PRINCIPAL`
/// (MAX, MID, MIN) at the same time value and on the same entities. Fields
/// whose name contains `STRAIN` use the equivalent strain formula.
pub fn derive_tensor_fields(blocks: &[ResultBlock]) -> Vec<ResultBlock> {
    let mut derived = Vec::new();
    for block in blocks.iter().filter(|b| b.ncomps() == 6) {
        let is_strain = block.name.to_ascii_uppercase().contains("STRAIN");
        let mut mises = BTreeMap::new();
        let mut principal = BTreeMap::new();

        for (&id, values) in &block.values {
            let Some(tensor) = TensorComponents::from_slice(values) else {
                continue;
            };
            let equivalent = if is_strain {
                compute_mises_strain(&tensor)
            } else {
                compute_mises_stress(&tensor)
            };
            let p = compute_principal_values(&tensor);
            mises.insert(id, vec![equivalent]);
            principal.insert(id, vec![p.max, p.mid, p.min]);
        }

        derived.push(ResultBlock {
            name: format!("{}_MISES", block.name),
            components: vec!["MISES".to_string()],
            values: mises,
            ..block.clone_header()
        });
        derived.push(ResultBlock {
            name: format!("{}_PRINCIPAL", block.name),
            components: vec!["MAX".to_string(), "MID".to_string(), "MIN".to_string()],
            values: principal,
            ..block.clone_header()
        });
    }
    derived
}

impl ResultBlock {
    /// Copy of this block's metadata with no values
    fn clone_header(&self) -> ResultBlock {
        ResultBlock {
            step: self.step,
            increment: self.increment,
            time: self.time,
            name: self.name.clone(),
            components: Vec::new(),
            location: self.location,
            values: BTreeMap::new(),
        }
    }
}
