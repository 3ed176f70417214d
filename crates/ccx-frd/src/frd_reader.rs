//! CalculiX FRD (result) file reader
//!
//! Reads CalculiX .frd result files for postprocessing and visualization.
//! Based on the FRD format description in the cgx manual, § 11.
//!
//! ## Format Overview
//!
//! An FRD file is a sequence of blocks, each opened by a header record and
//! closed by a ` -3` record:
//! - Node block: `    2C` header, ` -1` records with id and 3 coordinates
//! - Element block: `    3C` header, ` -1` records with id and type followed
//!   by ` -2` records listing the element's nodes
//! - Result blocks: `  100C` header with the time value, a ` -4` record with
//!   the field name, ` -5` records per component, then ` -1`/` -2` value records
//!
//! Fields are fixed-width. Numbers are read by column, never by splitting on
//! whitespace, since adjacent values such as `-1.00000E+00-2.00000E+00` carry
//! no separator. The header's format flag selects short ids (`I5`), long ids
//! (`I10`) or a binary payload.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ccx_frd::FrdFile;
//!
//! let frd = FrdFile::from_file("job.frd")?;
//! println!("Nodes: {}, Elements: {}", frd.mesh.nodes.len(), frd.mesh.elements.len());
//! println!("Time steps: {}", frd.time_series().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{FrdError, Result};
use crate::model::{FrdElement, FrdFile, ResultBlock, ResultLocation};
use crate::topology::{self, Topology};

/// Columns taken by the record key (` -1`, ` -2`, ...)
const KEY_WIDTH: usize = 3;
/// Columns of one floating-point field (`E12.5`)
const VALUE_WIDTH: usize = 12;
/// Columns of the element type field
const TYPE_WIDTH: usize = 5;

/// Record layout announced by a block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFormat {
    /// ASCII with 5-column ids
    Short,
    /// ASCII with 10-column ids
    Long,
    /// Little-endian binary payload
    Binary,
}

impl RecordFormat {
    fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            0 => Some(RecordFormat::Short),
            1 => Some(RecordFormat::Long),
            2 => Some(RecordFormat::Binary),
            _ => None,
        }
    }

    fn id_width(self) -> usize {
        match self {
            RecordFormat::Short => 5,
            RecordFormat::Long | RecordFormat::Binary => 10,
        }
    }
}

impl FrdFile {
    /// Read FRD file from path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "parsing FRD file");
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse FRD content already held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        FrdParser::new(data).parse()
    }

    /// Parse ASCII FRD content
    pub fn parse_str(raw: &str) -> Result<Self> {
        Self::from_bytes(raw.as_bytes())
    }
}

/// Parse a Fortran-style floating-point field.
///
/// Accepts plain Rust float syntax, `D` exponents and the exponent form
/// without `E` that Fortran emits for three-digit exponents (`1.23456-100`).
pub fn parse_fortran_float(field: &str) -> Option<f64> {
    let s = field.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    let s = s.replace(['D', 'd'], "E");
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    let split = s.rfind(['+', '-']).filter(|&i| i > 0)?;
    let (mantissa, exponent) = s.split_at(split);
    if mantissa.ends_with(['E', 'e']) {
        return None;
    }
    format!("{mantissa}E{exponent}").parse().ok()
}

/// Byte cursor over the raw file; text records are read line by line,
/// binary payloads by length.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn next_line(&mut self) -> Option<Cow<'a, str>> {
        let rest = self.data.get(self.pos..).filter(|r| !r.is_empty())?;
        let end = rest.iter().position(|&b| b == b'\n');
        let mut raw = &rest[..end.unwrap_or(rest.len())];
        self.pos += end.map_or(rest.len(), |e| e + 1);
        self.line += 1;
        if let [head @ .., b'\r'] = raw {
            raw = head;
        }
        Some(String::from_utf8_lossy(raw))
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .and_then(|b| <[u8; N]>::try_from(b).ok())
            .ok_or_else(|| FrdError::malformed(self.line, "binary block is truncated"))?;
        self.pos += N;
        Ok(bytes)
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.take::<8>().map(f64::from_le_bytes)
    }
}

/// Parser state between two records
enum State {
    ScanningForTag,
    InNodeBlock {
        format: RecordFormat,
    },
    InElementBlock {
        format: RecordFormat,
        pending: Option<PendingElement>,
    },
    InResultBlock(PendingResult),
}

/// Element whose node list is still being read
struct PendingElement {
    id: i32,
    element_type: i32,
    /// `None` for types missing from the topology table
    topology: Option<&'static Topology>,
    nodes: Vec<i32>,
}

/// Result block whose records are still being read
struct PendingResult {
    format: RecordFormat,
    /// Entity count announced by the `100C` header
    count: usize,
    /// Component records announced by the ` -4` record
    declared: Option<usize>,
    /// Component records read so far
    seen: usize,
    block: ResultBlock,
    entity: Option<(i32, Vec<f64>)>,
}

struct FrdParser<'a> {
    cursor: Cursor<'a>,
    frd: FrdFile,
    step: i32,
    increment: i32,
    skipped_elements: usize,
}

impl<'a> FrdParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor {
                data,
                pos: 0,
                line: 0,
            },
            frd: FrdFile::default(),
            step: 1,
            increment: 0,
            skipped_elements: 0,
        }
    }

    fn parse(mut self) -> Result<FrdFile> {
        let mut state = State::ScanningForTag;
        while let Some(line) = self.cursor.next_line() {
            state = self.transition(state, &line)?;
        }

        match state {
            State::ScanningForTag => {}
            State::InNodeBlock { .. } => return Err(self.malformed("node block is not terminated")),
            State::InElementBlock { .. } => {
                return Err(self.malformed("element block is not terminated"));
            }
            State::InResultBlock(pending) => {
                return Err(self.malformed(format!(
                    "result block {} is not terminated",
                    pending.block.name
                )));
            }
        }

        self.drop_dangling_references();
        let frd = self.frd;
        info!(
            nodes = frd.mesh.nodes.len(),
            elements = frd.mesh.elements.len(),
            result_blocks = frd.result_blocks.len(),
            skipped_elements = self.skipped_elements,
            "parsed FRD file"
        );
        Ok(frd)
    }

    fn transition(&mut self, state: State, line: &str) -> Result<State> {
        match state {
            State::ScanningForTag => self.scan(line),
            State::InNodeBlock { format } => self.node_record(format, line),
            State::InElementBlock { format, pending } => self.element_record(format, pending, line),
            State::InResultBlock(pending) => self.result_record(pending, line),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> FrdError {
        FrdError::malformed(self.cursor.line, message)
    }

    fn scan(&mut self, line: &str) -> Result<State> {
        let key = line.get(..5).unwrap_or(line).trim();
        let code = line.get(5..6).unwrap_or("");
        let rest = line.get(6..).unwrap_or("");

        match (key, code) {
            ("1", "C") => {
                self.frd.header.model_name = rest.trim().to_string();
            }
            ("1", "U") => {
                self.frd.header.info.push(rest.trim().to_string());
            }
            ("1", "P") => {
                if let Some(params) = rest.strip_prefix("STEP") {
                    self.step_parameters(params);
                }
            }
            ("2", "C") => {
                let (count, format) = self.block_header(rest)?;
                debug!(count, ?format, "node block");
                if format == RecordFormat::Binary {
                    self.read_binary_nodes(count)?;
                }
                return Ok(State::InNodeBlock { format });
            }
            ("3", "C") => {
                let (count, format) = self.block_header(rest)?;
                debug!(count, ?format, "element block");
                if format == RecordFormat::Binary {
                    self.read_binary_elements(count)?;
                }
                return Ok(State::InElementBlock {
                    format,
                    pending: None,
                });
            }
            ("100", "C") => return self.result_header(line).map(State::InResultBlock),
            _ => {}
        }
        Ok(State::ScanningForTag)
    }

    /// `1PSTEP` parameters: result counter, increment, step
    fn step_parameters(&mut self, params: &str) {
        let values: Vec<i32> = params
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        if let [_, increment, step, ..] = values.as_slice() {
            self.increment = *increment;
            self.step = *step;
        }
    }

    /// Entity count and record format of a node or element block header
    fn block_header(&self, rest: &str) -> Result<(usize, RecordFormat)> {
        let mut tokens = rest.split_whitespace();
        let count = tokens
            .next()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| self.malformed("block header lacks an entity count"))?;
        let format = match tokens.next_back() {
            None => RecordFormat::Long,
            Some(flag) => flag
                .parse()
                .ok()
                .and_then(RecordFormat::from_flag)
                .ok_or_else(|| self.malformed(format!("unknown record format flag {flag}")))?,
        };
        Ok((count, format))
    }

    fn node_record(&mut self, format: RecordFormat, line: &str) -> Result<State> {
        if is_terminator(line) {
            return Ok(State::ScanningForTag);
        }
        if line.trim().is_empty() {
            return Ok(State::InNodeBlock { format });
        }
        if format == RecordFormat::Binary || data_key(line) != Some(-1) {
            return Err(self.malformed("unexpected record in node block"));
        }

        let width = format.id_width();
        let id = int_field(line, KEY_WIDTH, width)
            .ok_or_else(|| self.malformed("node record lacks a node id"))?;
        let mut coords = [0.0; 3];
        for (k, coord) in coords.iter_mut().enumerate() {
            let start = KEY_WIDTH + width + k * VALUE_WIDTH;
            *coord = float_field(line, start, VALUE_WIDTH).ok_or_else(|| {
                self.malformed(format!("cannot read coordinate {} of node {id}", k + 1))
            })?;
        }
        self.frd.mesh.nodes.insert(id, coords);
        Ok(State::InNodeBlock { format })
    }

    fn read_binary_nodes(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let id = self.cursor.read_i32()?;
            let coords = [
                self.cursor.read_f64()?,
                self.cursor.read_f64()?,
                self.cursor.read_f64()?,
            ];
            self.frd.mesh.nodes.insert(id, coords);
        }
        Ok(())
    }

    fn element_record(
        &mut self,
        format: RecordFormat,
        pending: Option<PendingElement>,
        line: &str,
    ) -> Result<State> {
        if is_terminator(line) {
            self.finish_element(pending);
            return Ok(State::ScanningForTag);
        }
        if line.trim().is_empty() {
            return Ok(State::InElementBlock { format, pending });
        }
        if format == RecordFormat::Binary {
            return Err(self.malformed("unexpected record in binary element block"));
        }

        let width = format.id_width();
        match data_key(line) {
            Some(-1) => {
                self.finish_element(pending);
                let id = int_field(line, KEY_WIDTH, width)
                    .ok_or_else(|| self.malformed("element record lacks an element id"))?;
                let element_type = int_field(line, KEY_WIDTH + width, TYPE_WIDTH)
                    .ok_or_else(|| self.malformed(format!("element {id} lacks a type")))?;
                let topology = match topology::lookup(element_type) {
                    Ok(topology) => Some(topology),
                    Err(err) => {
                        warn!(element = id, "{err}, element skipped");
                        self.skipped_elements += 1;
                        None
                    }
                };
                Ok(State::InElementBlock {
                    format,
                    pending: Some(PendingElement {
                        id,
                        element_type,
                        topology,
                        nodes: Vec::new(),
                    }),
                })
            }
            Some(-2) => {
                let Some(mut element) = pending else {
                    return Err(self.malformed("node list without element record"));
                };
                for field in fields(line, KEY_WIDTH, width) {
                    if field.trim().is_empty() {
                        continue;
                    }
                    let node = field.trim().parse::<i32>().map_err(|_| {
                        self.malformed(format!("bad node id '{}' in element {}", field.trim(), element.id))
                    })?;
                    element.nodes.push(node);
                }
                Ok(State::InElementBlock {
                    format,
                    pending: Some(element),
                })
            }
            _ => Err(self.malformed("unexpected record in element block")),
        }
    }

    fn finish_element(&mut self, pending: Option<PendingElement>) {
        let Some(element) = pending else {
            return;
        };
        let Some(topology) = element.topology else {
            return;
        };
        self.insert_element(element.id, element.element_type, topology, &element.nodes);
    }

    fn insert_element(&mut self, id: i32, element_type: i32, topology: &Topology, frd_nodes: &[i32]) {
        match topology.reorder(frd_nodes) {
            Some(nodes) => {
                self.frd.mesh.elements.insert(
                    id,
                    FrdElement {
                        id,
                        element_type,
                        cell_type: topology.cell_type,
                        nodes,
                    },
                );
            }
            None => {
                warn!(
                    element = id,
                    expected = topology.num_nodes,
                    found = frd_nodes.len(),
                    "{} element has the wrong node count, element skipped",
                    topology.name
                );
                self.skipped_elements += 1;
            }
        }
    }

    fn read_binary_elements(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let id = self.cursor.read_i32()?;
            let element_type = self.cursor.read_i32()?;
            let _group = self.cursor.read_i32()?;
            let _material = self.cursor.read_i32()?;
            let topology = topology::lookup(element_type).map_err(|err| {
                self.malformed(format!("{err} in binary element block"))
            })?;
            let nodes = (0..topology.num_nodes)
                .map(|_| self.cursor.read_i32())
                .collect::<Result<Vec<_>>>()?;
            self.insert_element(id, element_type, topology, &nodes);
        }
        Ok(())
    }

    /// `  100C` header: time value, entity count, step and format flag
    fn result_header(&self, line: &str) -> Result<PendingResult> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let time = float_field(line, 12, VALUE_WIDTH)
            .or_else(|| tokens.get(2).and_then(|t| parse_fortran_float(t)))
            .ok_or_else(|| self.malformed("result header lacks a time value"))?;
        let count = int_field(line, 24, 12)
            .or_else(|| tokens.get(3).and_then(|t| t.parse().ok()))
            .and_then(|c| usize::try_from(c).ok())
            .ok_or_else(|| self.malformed("result header lacks an entity count"))?;
        let step = int_field(line, 58, 5).unwrap_or(self.step);
        let format = match int_field(line, 73, 2) {
            None => RecordFormat::Long,
            Some(flag) => RecordFormat::from_flag(flag)
                .ok_or_else(|| self.malformed(format!("unknown record format flag {flag}")))?,
        };

        Ok(PendingResult {
            format,
            count,
            declared: None,
            seen: 0,
            block: ResultBlock {
                step,
                increment: self.increment,
                time,
                name: String::new(),
                components: Vec::new(),
                location: ResultLocation::Nodal,
                values: Default::default(),
            },
            entity: None,
        })
    }

    fn result_record(&mut self, mut pending: PendingResult, line: &str) -> Result<State> {
        if is_terminator(line) {
            self.finish_result(pending)?;
            return Ok(State::ScanningForTag);
        }
        if line.trim().is_empty() {
            return Ok(State::InResultBlock(pending));
        }

        let width = pending.format.id_width();
        match data_key(line) {
            Some(-4) => {
                let name = text_field(line, 5, 8);
                if name.is_empty() {
                    return Err(self.malformed("result block lacks a field name"));
                }
                let declared = int_field(line, 13, 5)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| self.malformed(format!("field {name} lacks a component count")))?;
                pending.block.location = match int_field(line, 18, 5) {
                    Some(3) => ResultLocation::Element,
                    _ => ResultLocation::Nodal,
                };
                pending.block.name = name.to_string();
                pending.declared = Some(declared);
            }
            Some(-5) => {
                let Some(declared) = pending.declared else {
                    return Err(self.malformed("component record before field record"));
                };
                // Components flagged as computed (e.g. ALL) carry no values.
                if int_field(line, 33, 5) != Some(1) {
                    pending.block.components.push(text_field(line, 5, 8).to_string());
                }
                pending.seen += 1;
                if pending.seen == declared && pending.format == RecordFormat::Binary {
                    self.read_binary_results(&mut pending)?;
                }
            }
            Some(-1) if pending.format != RecordFormat::Binary => {
                self.finish_entity(&mut pending)?;
                if pending.block.components.is_empty() {
                    return Err(self.malformed("values before any component record"));
                }
                let id = int_field(line, KEY_WIDTH, width)
                    .ok_or_else(|| self.malformed("value record lacks an entity id"))?;
                let values = self.values(line, KEY_WIDTH + width)?;
                pending.entity = Some((id, values));
            }
            Some(-2) if pending.format != RecordFormat::Binary => {
                let values = self.values(line, KEY_WIDTH + width)?;
                let Some((_, current)) = pending.entity.as_mut() else {
                    return Err(self.malformed("continuation record without value record"));
                };
                current.extend(values);
            }
            _ => return Err(self.malformed("unexpected record in result block")),
        }
        Ok(State::InResultBlock(pending))
    }

    /// All 12-column values of a value record, starting at column `start`
    fn values(&self, line: &str, start: usize) -> Result<Vec<f64>> {
        fields(line, start, VALUE_WIDTH)
            .filter(|field| !field.trim().is_empty())
            .map(|field| {
                parse_fortran_float(field)
                    .ok_or_else(|| self.malformed(format!("cannot read value '{}'", field.trim())))
            })
            .collect()
    }

    fn finish_entity(&self, pending: &mut PendingResult) -> Result<()> {
        let Some((id, values)) = pending.entity.take() else {
            return Ok(());
        };
        let ncomps = pending.block.ncomps();
        if values.len() != ncomps {
            return Err(self.malformed(format!(
                "entity {id} of field {} has {} values, expected {ncomps}",
                pending.block.name,
                values.len()
            )));
        }
        pending.block.values.insert(id, values);
        Ok(())
    }

    fn read_binary_results(&mut self, pending: &mut PendingResult) -> Result<()> {
        let ncomps = pending.block.ncomps();
        for _ in 0..pending.count {
            let id = self.cursor.read_i32()?;
            let values = (0..ncomps)
                .map(|_| self.cursor.read_f32().map(f64::from))
                .collect::<Result<Vec<_>>>()?;
            pending.block.values.insert(id, values);
        }
        Ok(())
    }

    fn finish_result(&mut self, mut pending: PendingResult) -> Result<()> {
        self.finish_entity(&mut pending)?;
        if pending.declared.is_none() {
            return Err(self.malformed("result block lacks a field record"));
        }
        let block = pending.block;
        if block.values.len() != pending.count {
            debug!(
                field = %block.name,
                announced = pending.count,
                read = block.values.len(),
                "result block entity count differs from header"
            );
        }
        debug!(field = %block.name, time = block.time, ncomps = block.ncomps(), "result block");
        self.frd.result_blocks.push(block);
        Ok(())
    }

    /// Drop elements and result values that point at undeclared entities
    fn drop_dangling_references(&mut self) {
        let mesh = &mut self.frd.mesh;
        let nodes = &mesh.nodes;
        mesh.elements.retain(|&id, element| {
            let complete = element.nodes.iter().all(|n| nodes.contains_key(n));
            if !complete {
                warn!(element = id, "element references an undeclared node, element skipped");
            }
            complete
        });

        let mesh = &self.frd.mesh;
        for block in &mut self.frd.result_blocks {
            let before = block.values.len();
            let location = block.location;
            block.values.retain(|&id, _| mesh.contains(location, id));
            let dropped = before - block.values.len();
            if dropped > 0 {
                warn!(
                    field = %block.name,
                    time = block.time,
                    dropped,
                    "values for undeclared entities dropped"
                );
            }
        }
    }
}

/// Block terminator (` -3`)
fn is_terminator(line: &str) -> bool {
    line.trim() == "-3"
}

/// Key of a ` -n` data record
fn data_key(line: &str) -> Option<i32> {
    let key = line.get(..KEY_WIDTH)?.trim();
    if !key.starts_with('-') {
        return None;
    }
    key.parse().ok()
}

/// Columns `start..start + width`, clipped to the line end
fn field(line: &str, start: usize, width: usize) -> Option<&str> {
    if start >= line.len() {
        return None;
    }
    line.get(start..(start + width).min(line.len()))
}

/// Consecutive `width`-column fields from `start` to the end of the line
fn fields(line: &str, start: usize, width: usize) -> impl Iterator<Item = &str> {
    (0..)
        .map(move |k| field(line, start + k * width, width))
        .take_while(Option::is_some)
        .flatten()
}

fn text_field(line: &str, start: usize, width: usize) -> &str {
    field(line, start, width).map_or("", str::trim)
}

fn int_field(line: &str, start: usize, width: usize) -> Option<i32> {
    field(line, start, width)?.trim().parse().ok()
}

fn float_field(line: &str, start: usize, width: usize) -> Option<f64> {
    parse_fortran_float(field(line, start, width)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::VtkCellType;

    fn node(id: i32, c: [f64; 3]) -> String {
        format!(" -1{:>10}{:12.5E}{:12.5E}{:12.5E}\n", id, c[0], c[1], c[2])
    }

    fn value(id: i32, values: &[f64]) -> String {
        let mut line = format!(" -1{:>10}", id);
        for v in values {
            line.push_str(&format!("{:12.5E}", v));
        }
        line.push('\n');
        line
    }

    fn result_header(time: f64, count: usize) -> String {
        format!(
            "  100CL  101{:12.5E}{:>12}{:20}{:>2}{:>5}{:10}{:>2}\n",
            time, count, "", 0, 1, "", 1
        )
    }

    fn block_header(key: u32, count: usize, flag: u8) -> String {
        format!("{:>5}C{:18}{:>12}{:37}{}\n", key, "", count, "", flag)
    }

    fn element(id: i32, element_type: i32, nodes: &[i32]) -> String {
        let mut s = format!(" -1{:>10}{:>5}{:>5}{:>5}\n", id, element_type, 0, 1);
        for chunk in nodes.chunks(10) {
            s.push_str(" -2");
            for n in chunk {
                s.push_str(&format!("{:>10}", n));
            }
            s.push('\n');
        }
        s
    }

    fn tet4_nodes() -> String {
        let mut s = block_header(2, 4, 1);
        s.push_str(&node(1, [0.0, 0.0, 0.0]));
        s.push_str(&node(2, [1.0, 0.0, 0.0]));
        s.push_str(&node(3, [0.0, 1.0, 0.0]));
        s.push_str(&node(4, [0.0, 0.0, 1.0]));
        s.push_str(" -3\n");
        s
    }

    fn tet4_mesh_with(elements: &[(i32, i32, Vec<i32>)]) -> String {
        let mut s = String::from("    1Cbeam\n    1UUSER        calculix\n");
        s.push_str(&tet4_nodes());
        s.push_str(&block_header(3, elements.len(), 1));
        for (id, element_type, nodes) in elements {
            s.push_str(&element(*id, *element_type, nodes));
        }
        s.push_str(" -3\n");
        s
    }

    fn tet4_mesh() -> String {
        tet4_mesh_with(&[(1, 3, vec![1, 2, 3, 4])])
    }

    fn tet4_with_results() -> String {
        let mut s = tet4_mesh();
        s.push_str("    1PSTEP                         1           1           1\n");
        s.push_str(&result_header(0.0, 4));
        s.push_str(" -4  TEMP        1    1\n");
        s.push_str(" -5  T           1    1    0    0\n");
        for id in 1..=4 {
            s.push_str(&value(id, &[10.0 * id as f64]));
        }
        s.push_str(" -3\n");
        s.push_str(&result_header(0.0, 4));
        s.push_str(" -4  DISP        4    1\n");
        s.push_str(" -5  D1          1    2    1    0\n");
        s.push_str(" -5  D2          1    2    2    0\n");
        s.push_str(" -5  D3          1    2    3    0\n");
        s.push_str(" -5  ALL         1    2    0    0    1ALL\n");
        for id in 1..=4 {
            s.push_str(&value(id, &[id as f64, 0.5, -0.25]));
        }
        s.push_str(" -3\n 9999\n");
        s
    }

    #[test]
    fn parses_fortran_floats() {
        assert_eq!(parse_fortran_float(" 1.00000E+01"), Some(10.0));
        assert_eq!(parse_fortran_float("-2.50000E-01"), Some(-0.25));
        assert_eq!(parse_fortran_float("1.5D+02"), Some(150.0));
        assert_eq!(parse_fortran_float("1.23456-100"), Some(1.23456e-100));
        assert_eq!(parse_fortran_float("-1.23456+100"), Some(-1.23456e100));
        assert_eq!(parse_fortran_float("   "), None);
        assert_eq!(parse_fortran_float("abc"), None);
    }

    #[test]
    fn parses_tet4_mesh_and_fields() {
        let frd = FrdFile::parse_str(&tet4_with_results()).expect("parse should succeed");

        assert_eq!(frd.header.model_name, "beam");
        assert_eq!(frd.header.info.len(), 1);
        assert_eq!(frd.mesh.nodes.len(), 4);
        assert_eq!(frd.mesh.nodes[&2], [1.0, 0.0, 0.0]);

        let element = &frd.mesh.elements[&1];
        assert_eq!(element.cell_type, VtkCellType::Tetra);
        assert_eq!(element.nodes, vec![1, 2, 3, 4]);

        assert_eq!(frd.result_blocks.len(), 2);
        let temp = &frd.result_blocks[0];
        assert_eq!(temp.name, "TEMP");
        assert_eq!(temp.ncomps(), 1);
        assert_eq!(temp.values[&3], vec![30.0]);

        let disp = &frd.result_blocks[1];
        assert_eq!(disp.name, "DISP");
        assert_eq!(disp.components, vec!["D1", "D2", "D3"]);
        assert_eq!(disp.values.len(), 4);
        assert_eq!(disp.values[&2], vec![2.0, 0.5, -0.25]);
        assert_eq!(disp.location, ResultLocation::Nodal);
        assert_eq!(disp.step, 1);

        assert_eq!(frd.time_series(), vec![0.0]);
    }

    #[test]
    fn reads_coordinates_without_separators() {
        let mut s = block_header(2, 1, 1);
        s.push_str(&format!(" -1{:>10}-1.00000E+00-2.00000E+00-3.00000E+00\n", 7));
        s.push_str(" -3\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.nodes[&7], [-1.0, -2.0, -3.0]);
    }

    #[test]
    fn reads_short_format_records() {
        let mut s = block_header(2, 2, 0);
        s.push_str(&format!(" -1{:>5}{:12.5E}{:12.5E}{:12.5E}\n", 1, 0.0, 0.0, 0.0));
        s.push_str(&format!(" -1{:>5}{:12.5E}{:12.5E}{:12.5E}\n", 2, 1.0, 0.0, 0.0));
        s.push_str(" -3\n");
        s.push_str(&block_header(3, 1, 0));
        s.push_str(&format!(" -1{:>5}{:>5}{:>5}{:>5}\n", 1, 11, 0, 1));
        s.push_str(&format!(" -2{:>5}{:>5}\n", 1, 2));
        s.push_str(" -3\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.nodes.len(), 2);
        assert_eq!(frd.mesh.nodes[&2], [1.0, 0.0, 0.0]);
        assert_eq!(frd.mesh.elements[&1].cell_type, VtkCellType::Line);
        assert_eq!(frd.mesh.elements[&1].nodes, vec![1, 2]);
    }

    #[test]
    fn reorders_quadratic_hexahedron_on_read() {
        let mut s = block_header(2, 20, 1);
        for id in 1..=20 {
            s.push_str(&node(id, [id as f64, 0.0, 0.0]));
        }
        s.push_str(" -3\n");
        s.push_str(&block_header(3, 1, 1));
        s.push_str(&element(1, 4, &(1..=20).collect::<Vec<_>>()));
        s.push_str(" -3\n");

        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        let element = &frd.mesh.elements[&1];
        assert_eq!(element.cell_type, VtkCellType::QuadraticHexahedron);
        assert_eq!(&element.nodes[12..16], &[17, 18, 19, 20]);
        assert_eq!(&element.nodes[16..], &[13, 14, 15, 16]);
    }

    #[test]
    fn skips_unknown_element_types() {
        let s = tet4_mesh_with(&[(1, 3, vec![1, 2, 3, 4]), (2, 42, vec![1, 2])]);
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.elements.len(), 1);
        assert!(frd.mesh.elements.contains_key(&1));
    }

    #[test]
    fn skips_elements_with_wrong_node_count() {
        let s = tet4_mesh_with(&[(1, 3, vec![1, 2, 3, 4]), (2, 3, vec![1, 2, 3])]);
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.elements.len(), 1);
    }

    #[test]
    fn drops_elements_with_undeclared_nodes() {
        let s = tet4_mesh_with(&[(1, 3, vec![1, 2, 3, 99])]);
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.nodes.len(), 4);
        assert!(frd.mesh.elements.is_empty());
        assert!(frd.mesh.is_empty());
    }

    #[test]
    fn drops_values_for_undeclared_nodes() {
        let mut s = tet4_mesh();
        s.push_str(&result_header(1.0, 2));
        s.push_str(" -4  NDTEMP      1    1\n");
        s.push_str(" -5  T           1    1    0    0\n");
        s.push_str(&value(1, &[5.0]));
        s.push_str(&value(50, &[6.0]));
        s.push_str(" -3\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        let block = &frd.result_blocks[0];
        assert_eq!(block.values.len(), 1);
        assert!(block.values.contains_key(&1));
    }

    #[test]
    fn reads_tensor_values_over_continuation_records() {
        let mut s = tet4_mesh();
        s.push_str(&result_header(1.0, 1));
        s.push_str(" -4  STRESS      7    1\n");
        for (i, name) in ["SXX", "SYY", "SZZ", "SXY", "SYZ", "SZX"].iter().enumerate() {
            s.push_str(&format!(" -5  {:<8}    1    4{:>5}{:>5}    0\n", name, i + 1, i + 1));
        }
        s.push_str(" -5  ALL         1    4    0    0    1ALL\n");
        s.push_str(&value(1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        s.push_str(" -3\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        let block = &frd.result_blocks[0];
        assert_eq!(block.ncomps(), 6);
        assert_eq!(block.values[&1], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn nine_values_span_two_records() {
        let mut s = tet4_mesh();
        s.push_str(&result_header(1.0, 1));
        s.push_str(" -4  FULL        9    1\n");
        for i in 1..=9 {
            s.push_str(&format!(" -5  C{:<7}    1    4{:>5}    0    0\n", i, i));
        }
        s.push_str(&value(2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        s.push_str(&format!(" -2{:10}{:12.5E}{:12.5E}{:12.5E}\n", "", 7.0, 8.0, 9.0));
        s.push_str(" -3\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.result_blocks[0].values[&2].len(), 9);
        assert_eq!(frd.result_blocks[0].values[&2][8], 9.0);
    }

    #[test]
    fn missing_values_are_malformed() {
        let mut s = tet4_mesh();
        s.push_str(&result_header(1.0, 1));
        s.push_str(" -4  DISP        3    1\n");
        s.push_str(" -5  D1          1    2    1    0\n");
        s.push_str(" -5  D2          1    2    2    0\n");
        s.push_str(" -5  D3          1    2    3    0\n");
        s.push_str(&value(1, &[1.0, 2.0]));
        s.push_str(" -3\n");
        let err = FrdFile::parse_str(&s).expect_err("short value record should fail");
        assert!(matches!(err, FrdError::Malformed { .. }));
    }

    #[test]
    fn bad_coordinate_is_malformed() {
        let mut s = block_header(2, 1, 1);
        s.push_str(&format!(" -1{:>10}{:12.5E}{:>12}{:12.5E}\n -3\n", 1, 0.0, "not-a-num", 0.0));
        let err = FrdFile::parse_str(&s).expect_err("bad coordinate should fail");
        match err {
            FrdError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_block_is_malformed() {
        let mut s = block_header(2, 1, 1);
        s.push_str(&node(1, [0.0, 0.0, 0.0]));
        assert!(FrdFile::parse_str(&s).is_err());
    }

    #[test]
    fn text_without_blocks_yields_empty_mesh() {
        let frd = FrdFile::parse_str("hello\nworld\n").expect("parse should succeed");
        assert!(frd.mesh.is_empty());
        assert!(frd.result_blocks.is_empty());

        let frd = FrdFile::parse_str("").expect("empty input should parse");
        assert!(frd.mesh.is_empty());
    }

    #[test]
    fn mesh_without_results_has_no_time_series() {
        let frd = FrdFile::parse_str(&tet4_mesh()).expect("parse should succeed");
        assert!(!frd.mesh.is_empty());
        assert!(frd.time_series().is_empty());
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let s = tet4_with_results().replace('\n', "\r\n");
        let frd = FrdFile::parse_str(&s).expect("parse should succeed");
        assert_eq!(frd.mesh.elements.len(), 1);
        assert_eq!(frd.result_blocks.len(), 2);
    }

    #[test]
    fn reads_binary_blocks() {
        let mut data: Vec<u8> = Vec::new();
        data.extend_from_slice(block_header(2, 4, 2).as_bytes());
        let coords = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        for (i, c) in coords.iter().enumerate() {
            data.extend_from_slice(&(i as i32 + 1).to_le_bytes());
            for v in c {
                data.extend_from_slice(&f64::to_le_bytes(*v));
            }
        }
        data.extend_from_slice(b" -3\n");
        data.extend_from_slice(block_header(3, 1, 2).as_bytes());
        for v in [1i32, 3, 0, 1, 1, 2, 3, 4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b" -3\n");
        data.extend_from_slice(
            format!(
                "  100CL  101{:12.5E}{:>12}{:20}{:>2}{:>5}{:10}{:>2}\n",
                2.0, 4, "", 0, 1, "", 2
            )
            .as_bytes(),
        );
        data.extend_from_slice(b" -4  NDTEMP      1    1\n");
        data.extend_from_slice(b" -5  T           1    1    0    0\n");
        for id in 1..=4i32 {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&(id as f32 * 1.5).to_le_bytes());
        }
        data.extend_from_slice(b" -3\n 9999\n");

        let frd = FrdFile::from_bytes(&data).expect("binary parse should succeed");
        assert_eq!(frd.mesh.nodes[&4], [0.0, 0.0, 1.0]);
        assert_eq!(frd.mesh.elements[&1].nodes, vec![1, 2, 3, 4]);
        assert_eq!(frd.result_blocks[0].time, 2.0);
        assert_eq!(frd.result_blocks[0].values[&2], vec![3.0]);
    }

    #[test]
    fn truncated_binary_block_is_malformed() {
        let mut data: Vec<u8> = Vec::new();
        data.extend_from_slice(block_header(2, 2, 2).as_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&0.0f64.to_le_bytes());
        let err = FrdFile::from_bytes(&data).expect_err("truncated payload should fail");
        assert!(matches!(err, FrdError::Malformed { .. }));
    }

    #[test]
    fn binary_unknown_element_type_is_malformed() {
        let mut data: Vec<u8> = tet4_nodes().into_bytes();
        data.extend_from_slice(block_header(3, 1, 2).as_bytes());
        for v in [1i32, 42, 0, 1, 1, 2, 3, 4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b" -3\n 9999\n");

        let err = FrdFile::from_bytes(&data).expect_err("unknown binary type should fail");
        match err {
            FrdError::Malformed { line, message } => {
                assert_eq!(line, 7);
                assert!(message.contains("42"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
