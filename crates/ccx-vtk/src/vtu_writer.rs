//! XML VTU writer for ParaView visualization
//!
//! Writes one [`Snapshot`] as an ASCII `UnstructuredGrid` `.vtu` file.
//! Timed snapshots carry their time in a `TimeValue` field data array.

use std::io::{self, Write};
use std::path::Path;

use crate::formatting::{escape_xml, fmt_float, fmt_tuple};
use crate::output::write_atomic;
use crate::snapshot::{Field, Snapshot};

/// XML VTU writer for one snapshot
pub struct VtuWriter<'a> {
    snapshot: &'a Snapshot<'a>,
}

impl<'a> VtuWriter<'a> {
    /// Create a new writer for the given snapshot
    pub fn new(snapshot: &'a Snapshot<'a>) -> Self {
        Self { snapshot }
    }

    /// Write the `.vtu` file at `path`
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        write_atomic(path, |out| self.write_to(out))
    }

    /// Render the file into any writer
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mesh = self.snapshot.mesh();
        writeln!(out, "<?xml version=\"1.0\"?>")?;
        writeln!(
            out,
            "<VTKFile type=\"UnstructuredGrid\" version=\"1.0\" byte_order=\"LittleEndian\">"
        )?;
        writeln!(out, "  <UnstructuredGrid>")?;
        self.write_time(out)?;
        writeln!(
            out,
            "    <Piece NumberOfPoints=\"{}\" NumberOfCells=\"{}\">",
            mesh.nodes.len(),
            mesh.elements.len()
        )?;
        self.write_data(out, "PointData", self.snapshot.point_fields().collect())?;
        self.write_data(out, "CellData", self.snapshot.cell_fields().collect())?;
        self.write_points(out)?;
        self.write_cells(out)?;
        writeln!(out, "    </Piece>")?;
        writeln!(out, "  </UnstructuredGrid>")?;
        writeln!(out, "</VTKFile>")?;
        Ok(())
    }

    fn write_time<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(time) = self.snapshot.time() else {
            return Ok(());
        };
        writeln!(out, "    <FieldData>")?;
        writeln!(
            out,
            "      <DataArray type=\"Float64\" Name=\"TimeValue\" NumberOfTuples=\"1\" format=\"ascii\">"
        )?;
        writeln!(out, "        {}", fmt_float(time))?;
        writeln!(out, "      </DataArray>")?;
        writeln!(out, "    </FieldData>")?;
        Ok(())
    }

    fn write_data<W: Write>(
        &self,
        out: &mut W,
        section: &str,
        fields: Vec<&Field<'_>>,
    ) -> io::Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mesh = self.snapshot.mesh();
        writeln!(out, "      <{section}>")?;
        for field in fields {
            write!(
                out,
                "        <DataArray type=\"Float64\" Name=\"{}\" NumberOfComponents=\"{}\"",
                escape_xml(&field.name),
                field.ncomps()
            )?;
            for (i, component) in field.components().iter().enumerate() {
                write!(out, " ComponentName{i}=\"{}\"", escape_xml(component))?;
            }
            writeln!(out, " format=\"ascii\">")?;
            for tuple in field.tuples(mesh) {
                writeln!(out, "          {}", fmt_tuple(tuple))?;
            }
            writeln!(out, "        </DataArray>")?;
        }
        writeln!(out, "      </{section}>")?;
        Ok(())
    }

    fn write_points<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "      <Points>")?;
        writeln!(
            out,
            "        <DataArray type=\"Float64\" NumberOfComponents=\"3\" format=\"ascii\">"
        )?;
        for coords in self.snapshot.mesh().nodes.values() {
            writeln!(out, "          {}", fmt_tuple(coords))?;
        }
        writeln!(out, "        </DataArray>")?;
        writeln!(out, "      </Points>")?;
        Ok(())
    }

    fn write_cells<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let elements = &self.snapshot.mesh().elements;
        writeln!(out, "      <Cells>")?;

        writeln!(
            out,
            "        <DataArray type=\"Int32\" Name=\"connectivity\" format=\"ascii\">"
        )?;
        for element in elements.values() {
            let indices = self.snapshot.connectivity(element)?;
            let line: Vec<String> = indices.iter().map(usize::to_string).collect();
            writeln!(out, "          {}", line.join(" "))?;
        }
        writeln!(out, "        </DataArray>")?;

        writeln!(
            out,
            "        <DataArray type=\"Int32\" Name=\"offsets\" format=\"ascii\">"
        )?;
        let mut offset = 0;
        for element in elements.values() {
            offset += element.nodes.len();
            writeln!(out, "          {offset}")?;
        }
        writeln!(out, "        </DataArray>")?;

        writeln!(
            out,
            "        <DataArray type=\"UInt8\" Name=\"types\" format=\"ascii\">"
        )?;
        for element in elements.values() {
            writeln!(out, "          {}", element.cell_type.id())?;
        }
        writeln!(out, "        </DataArray>")?;

        writeln!(out, "      </Cells>")?;
        Ok(())
    }
}
