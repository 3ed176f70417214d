//! ParaView Data (PVD) collection index for a series of `.vtu` files

use std::io::{self, Write};
use std::path::Path;

use crate::formatting::{escape_xml, fmt_float};
use crate::output::write_atomic;

/// One time step of a series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    /// Time value of the step
    pub time: f64,
    /// Output file, relative to the index
    pub file: String,
}

/// Write the collection index at `path`
pub fn write_pvd<P: AsRef<Path>>(path: P, entries: &[SeriesEntry]) -> io::Result<()> {
    write_atomic(path, |out| render_pvd(out, entries))
}

/// Render the index with entries in ascending time order
pub fn render_pvd<W: Write>(out: &mut W, entries: &[SeriesEntry]) -> io::Result<()> {
    let mut sorted: Vec<&SeriesEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    writeln!(out, "<?xml version=\"1.0\"?>")?;
    writeln!(
        out,
        "<VTKFile type=\"Collection\" version=\"0.1\" byte_order=\"LittleEndian\">"
    )?;
    writeln!(out, "  <Collection>")?;
    for entry in sorted {
        writeln!(
            out,
            "    <DataSet timestep=\"{}\" group=\"\" part=\"0\" file=\"{}\"/>",
            fmt_float(entry.time),
            escape_xml(&entry.file)
        )?;
    }
    writeln!(out, "  </Collection>")?;
    writeln!(out, "</VTKFile>")?;
    Ok(())
}
