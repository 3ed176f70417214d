//! Legacy VTK writer for ParaView visualization
//!
//! Writes one [`Snapshot`] as an ASCII legacy `.vtk` unstructured grid.
//! Result fields go into `POINT_DATA`/`CELL_DATA` sections as `FIELD`
//! arrays, which accept any component count (scalars, vectors, 6- and
//! 9-component tensors alike).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ccx_frd::FrdFile;
//! use ccx_vtk::{Snapshot, VtkWriter};
//!
//! let frd = FrdFile::from_file("job.frd")?;
//! let snapshot = Snapshot::new(&frd.mesh, &frd.result_blocks, Some(1.0));
//! VtkWriter::new(&snapshot).write("job.vtk")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;

use ccx_frd::ResultLocation;

use crate::formatting::{fmt_float, fmt_tuple, legacy_name};
use crate::output::write_atomic;
use crate::snapshot::{Field, Snapshot, unique_name};

/// Legacy VTK writer for one snapshot
pub struct VtkWriter<'a> {
    snapshot: &'a Snapshot<'a>,
}

impl<'a> VtkWriter<'a> {
    /// Create a new writer for the given snapshot
    pub fn new(snapshot: &'a Snapshot<'a>) -> Self {
        Self { snapshot }
    }

    /// Write the `.vtk` file at `path`
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        write_atomic(path, |out| self.write_to(out))
    }

    /// Render the file into any writer
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_header(out)?;
        self.write_points(out)?;
        self.write_cells(out)?;
        let arrays = self.legacy_arrays();
        self.write_data(out, "POINT_DATA", &arrays, ResultLocation::Nodal)?;
        self.write_data(out, "CELL_DATA", &arrays, ResultLocation::Element)?;
        Ok(())
    }

    /// Fields paired with single-token names, unique after whitespace
    /// replacement
    fn legacy_arrays(&self) -> Vec<(&'a Field<'a>, String)> {
        let mut used = HashSet::new();
        self.snapshot
            .fields()
            .iter()
            .map(|field| (field, unique_name(&legacy_name(&field.name), &mut used)))
            .collect()
    }

    fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# vtk DataFile Version 3.0")?;
        match self.snapshot.time() {
            Some(t) => writeln!(out, "CalculiX results, time {}", fmt_float(t))?,
            None => writeln!(out, "CalculiX results")?,
        }
        writeln!(out, "ASCII")?;
        writeln!(out, "DATASET UNSTRUCTURED_GRID")?;
        Ok(())
    }

    /// Node coordinates (POINTS), ascending node id
    fn write_points<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let nodes = &self.snapshot.mesh().nodes;
        writeln!(out, "POINTS {} double", nodes.len())?;
        for coords in nodes.values() {
            writeln!(out, "{}", fmt_tuple(coords))?;
        }
        Ok(())
    }

    /// Element connectivity (CELLS) and cell types (CELL_TYPES)
    fn write_cells<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let elements = &self.snapshot.mesh().elements;
        let total_size: usize = elements.values().map(|e| 1 + e.nodes.len()).sum();

        writeln!(out, "CELLS {} {}", elements.len(), total_size)?;
        for element in elements.values() {
            let indices = self.snapshot.connectivity(element)?;
            write!(out, "{}", indices.len())?;
            for index in indices {
                write!(out, " {index}")?;
            }
            writeln!(out)?;
        }

        writeln!(out, "CELL_TYPES {}", elements.len())?;
        for element in elements.values() {
            writeln!(out, "{}", element.cell_type.id())?;
        }
        Ok(())
    }

    /// One data section; omitted entirely when there are no fields
    fn write_data<W: Write>(
        &self,
        out: &mut W,
        section: &str,
        arrays: &[(&Field<'_>, String)],
        location: ResultLocation,
    ) -> io::Result<()> {
        let arrays: Vec<_> = arrays
            .iter()
            .filter(|(field, _)| field.block.location == location)
            .collect();
        if arrays.is_empty() {
            return Ok(());
        }
        let mesh = self.snapshot.mesh();
        let count = mesh.entity_count(location);

        writeln!(out, "{section} {count}")?;
        writeln!(out, "FIELD FieldData {}", arrays.len())?;
        for (field, name) in arrays {
            writeln!(out, "{} {} {} double", name, field.ncomps(), count)?;
            for tuple in field.tuples(mesh) {
                writeln!(out, "{}", fmt_tuple(tuple))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::{block, tet4};

    fn render(snapshot: &Snapshot) -> String {
        let mut out = Vec::new();
        VtkWriter::new(snapshot)
            .write_to(&mut out)
            .expect("rendering into memory should succeed");
        String::from_utf8(out).expect("legacy output is ASCII")
    }

    #[test]
    fn writes_geometry_only_file() {
        let mesh = tet4();
        let text = render(&Snapshot::new(&mesh, &[], None));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# vtk DataFile Version 3.0");
        assert_eq!(lines[1], "CalculiX results");
        assert_eq!(lines[4], "POINTS 4 double");
        assert_eq!(lines[6], "1.0000000000000000e+00 0.0000000000000000e+00 0.0000000000000000e+00");
        assert_eq!(lines[9], "CELLS 1 5");
        assert_eq!(lines[10], "4 0 1 2 3");
        assert_eq!(lines[11], "CELL_TYPES 1");
        assert_eq!(lines[12], "10");
        assert_eq!(lines.len(), 13);
        assert!(!text.contains("POINT_DATA"));
    }

    #[test]
    fn writes_point_and_cell_fields() {
        let mesh = tet4();
        let blocks = vec![
            block(
                "HEAT FLUX",
                2.0,
                ResultLocation::Nodal,
                &["T"],
                &[(1, vec![1.0]), (2, vec![2.0]), (3, vec![3.0]), (4, vec![-0.0])],
            ),
            block("ENER", 2.0, ResultLocation::Element, &["E"], &[(1, vec![0.5])]),
        ];
        let text = render(&Snapshot::new(&mesh, &blocks, Some(2.0)));

        assert!(text.contains("CalculiX results, time 2.0000000000000000e+00\n"));
        assert!(text.contains(
            "POINT_DATA 4\nFIELD FieldData 1\nHEAT_FLUX 1 4 double\n\
             1.0000000000000000e+00\n2.0000000000000000e+00\n3.0000000000000000e+00\n0.0000000000000000e+00\n"
        ));
        assert!(text.contains("CELL_DATA 1\nFIELD FieldData 1\nENER 1 1 double\n5.0000000000000000e-01\n"));
    }

    #[test]
    fn writes_zeros_for_uncovered_nodes() {
        let mesh = tet4();
        let blocks = vec![block(
            "DISP",
            1.0,
            ResultLocation::Nodal,
            &["D1", "D2", "D3"],
            &[(2, vec![1.0, 2.0, 3.0])],
        )];
        let text = render(&Snapshot::new(&mesh, &blocks, Some(1.0)));
        let zeros = "0.0000000000000000e+00 0.0000000000000000e+00 0.0000000000000000e+00";
        let expected = format!(
            "DISP 3 4 double\n{zeros}\n1.0000000000000000e+00 2.0000000000000000e+00 3.0000000000000000e+00\n{zeros}\n{zeros}\n"
        );
        assert!(text.ends_with(&expected));
    }

    #[test]
    fn names_stay_unique_after_whitespace_replacement() {
        let mesh = tet4();
        let blocks = vec![
            block("HEAT FLUX", 1.0, ResultLocation::Nodal, &["T"], &[]),
            block("HEAT_FLUX", 1.0, ResultLocation::Nodal, &["T"], &[]),
            block("HEAT FLUX", 1.0, ResultLocation::Element, &["T"], &[]),
        ];
        let text = render(&Snapshot::new(&mesh, &blocks, Some(1.0)));
        let arrays: Vec<&str> = text
            .lines()
            .filter(|l| l.ends_with(" double") && !l.starts_with("POINTS"))
            .collect();
        assert_eq!(
            arrays,
            vec!["HEAT_FLUX 1 4 double", "HEAT_FLUX_2 1 4 double", "HEAT_FLUX_3 1 1 double"]
        );
    }
}
