//! Conversion driver: stage, parse, write one file per time increment.
//!
//! ```rust,no_run
//! use ccx_vtk::{ConvertOptions, Converter, OutputFormat};
//!
//! let options = ConvertOptions::new(OutputFormat::Vtu);
//! let report = Converter::new("job.frd", options).run()?;
//! println!("{} files written", report.files.len());
//! # Ok::<(), ccx_vtk::ConvertError>(())
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ccx_frd::{FrdFile, derive_tensor_fields, time_series};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};
use crate::pvd_writer::{SeriesEntry, write_pvd};
use crate::snapshot::Snapshot;
use crate::vtk_writer::VtkWriter;
use crate::vtu_writer::VtuWriter;

/// Target file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII legacy `.vtk`
    Vtk,
    /// XML `.vtu`
    Vtu,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Vtk => "vtk",
            OutputFormat::Vtu => "vtu",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vtk" => Ok(OutputFormat::Vtk),
            "vtu" => Ok(OutputFormat::Vtu),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Settings of one conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    /// Defaults to `results/` next to the input file
    pub output_dir: Option<PathBuf>,
    /// Append von Mises and principal values of tensor fields
    pub derived_fields: bool,
}

impl ConvertOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            output_dir: None,
            derived_fields: true,
        }
    }
}

/// Outcome of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// One file per time increment
    Converted,
    /// Mesh without result blocks: one untimed file
    GeometryOnly,
    /// No node or element data: nothing written
    EmptyMesh,
}

/// A written output file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    /// `None` for untimed output
    pub time: Option<f64>,
    pub path: PathBuf,
}

/// Summary of a conversion run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    /// Copy of the input inside the output directory
    pub staged: PathBuf,
    pub format: OutputFormat,
    pub status: ConversionStatus,
    pub nodes: usize,
    pub elements: usize,
    pub result_blocks: usize,
    pub derived_blocks: usize,
    pub files: Vec<WrittenFile>,
    /// `.pvd` index, written for multi-increment `.vtu` series
    pub series_index: Option<PathBuf>,
}

impl ConversionReport {
    /// Pretty-printed JSON rendering of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Converts one `.frd` file
#[derive(Debug, Clone)]
pub struct Converter {
    input: PathBuf,
    options: ConvertOptions,
}

impl Converter {
    pub fn new(input: impl Into<PathBuf>, options: ConvertOptions) -> Self {
        Self {
            input: input.into(),
            options,
        }
    }

    /// Directory receiving the staged input and all outputs
    pub fn output_dir(&self) -> PathBuf {
        match &self.options.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .input
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("results"),
        }
    }

    pub fn run(&self) -> Result<ConversionReport> {
        let out_dir = self.output_dir();
        let staged = self.stage(&out_dir)?;

        let frd = FrdFile::from_file(&staged)?;
        let FrdFile {
            mesh,
            result_blocks: mut blocks,
            ..
        } = frd;

        let mut report = ConversionReport {
            input: self.input.clone(),
            staged: staged.clone(),
            format: self.options.format,
            status: ConversionStatus::EmptyMesh,
            nodes: mesh.nodes.len(),
            elements: mesh.elements.len(),
            result_blocks: blocks.len(),
            derived_blocks: 0,
            files: Vec::new(),
            series_index: None,
        };

        if mesh.is_empty() {
            warn!(path = %staged.display(), "file is empty, no mesh data");
            return Ok(report);
        }

        if self.options.derived_fields {
            let derived = derive_tensor_fields(&blocks);
            debug!(count = derived.len(), "derived tensor fields");
            report.derived_blocks = derived.len();
            blocks.extend(derived);
        }

        let stem = staged
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self.options.format.extension();
        let times = time_series(&blocks);

        if times.is_empty() {
            warn!("no time increments, writing geometry only");
            let path = out_dir.join(format!("{stem}.{ext}"));
            self.write_snapshot(&Snapshot::new(&mesh, &blocks, None), &path)?;
            report.status = ConversionStatus::GeometryOnly;
            report.files.push(WrittenFile { time: None, path });
            return Ok(report);
        }

        info!(count = times.len(), "time increments");
        let mut series = Vec::with_capacity(times.len());
        for (index, &time) in times.iter().enumerate() {
            let name = output_name(&stem, ext, index + 1, times.len());
            let path = out_dir.join(&name);
            self.write_snapshot(&Snapshot::new(&mesh, &blocks, Some(time)), &path)?;
            series.push(SeriesEntry { time, file: name });
            report.files.push(WrittenFile {
                time: Some(time),
                path,
            });
        }

        if times.len() > 1 && self.options.format == OutputFormat::Vtu {
            let path = out_dir.join(format!("{stem}.pvd"));
            write_pvd(&path, &series)?;
            report.series_index = Some(path);
        }

        report.status = ConversionStatus::Converted;
        Ok(report)
    }

    /// Copy the input into `out_dir` unless it already lives there
    fn stage(&self, out_dir: &Path) -> Result<PathBuf> {
        let source = fs::canonicalize(&self.input)?;
        fs::create_dir_all(out_dir)?;
        let file_name = source.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", self.input.display()),
            )
        })?;
        let staged = out_dir.join(file_name);

        let already_staged = fs::canonicalize(&staged).is_ok_and(|target| target == source);
        if !already_staged {
            fs::copy(&source, &staged)?;
            debug!(from = %source.display(), to = %staged.display(), "staged input");
        }
        Ok(staged)
    }

    fn write_snapshot(&self, snapshot: &Snapshot<'_>, path: &Path) -> Result<()> {
        debug!(path = %path.display(), fields = snapshot.fields().len(), "writing");
        match self.options.format {
            OutputFormat::Vtk => VtkWriter::new(snapshot).write(path)?,
            OutputFormat::Vtu => VtuWriter::new(snapshot).write(path)?,
        }
        Ok(())
    }
}

/// `<stem>.<NN>.<ext>` with the counter padded to the digits of `total`,
/// or `<stem>.<ext>` for a single increment
fn output_name(stem: &str, ext: &str, counter: usize, total: usize) -> String {
    if total > 1 {
        let width = total.to_string().len();
        format!("{stem}.{counter:0width$}.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}
