//! CalculiX FRD result file support.
//!
//! This crate provides:
//! - **Element topology table** mapping FRD element types to VTK cells
//! - **FRD (result file)** reader for ASCII (short/long) and binary blocks
//! - **Mesh and result model** shared by the VTK writers
//! - **Postprocessing utilities** (von Mises, principal values of tensor fields)

pub mod error;
pub mod frd_reader;
pub mod model;
pub mod postprocess;
pub mod topology;

pub use error::{FrdError, Result};
pub use frd_reader::parse_fortran_float;
pub use model::{FrdElement, FrdFile, FrdHeader, Mesh, ResultBlock, ResultLocation, time_series};
pub use postprocess::{
    PrincipalValues, TensorComponents, compute_mises_strain, compute_mises_stress,
    compute_principal_values, derive_tensor_fields,
};
pub use topology::{Topology, VtkCellType};
