//! ParaView export of CalculiX FRD results.
//!
//! This crate provides:
//! - **Snapshots** selecting the result blocks of one time increment
//! - **Legacy VTK** (`.vtk`) and **XML VTU** (`.vtu`) writers
//! - **PVD** collection index for `.vtu` time series
//! - **Converter** driving a complete `.frd` conversion

pub mod converter;
pub mod error;
mod formatting;
pub mod output;
pub mod pvd_writer;
pub mod snapshot;
pub mod vtk_writer;
pub mod vtu_writer;

pub use converter::{
    ConversionReport, ConversionStatus, ConvertOptions, Converter, OutputFormat, WrittenFile,
};
pub use error::{ConvertError, Result};
pub use pvd_writer::{SeriesEntry, write_pvd};
pub use snapshot::{Field, Snapshot};
pub use vtk_writer::VtkWriter;
pub use vtu_writer::VtuWriter;
