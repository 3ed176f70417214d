//! In-memory mesh and result model shared by every writer.
//!
//! Nodes and elements are kept in `BTreeMap`s so that every consumer sees
//! them in ascending id order, which keeps exported files reproducible.

use std::collections::BTreeMap;

use crate::topology::VtkCellType;

/// FRD file representation
#[derive(Debug, Clone, Default)]
pub struct FrdFile {
    /// Header information
    pub header: FrdHeader,
    /// Nodes and elements
    pub mesh: Mesh,
    /// Result blocks in file order, one per field and increment
    pub result_blocks: Vec<ResultBlock>,
}

/// FRD file header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrdHeader {
    /// Model name from the `1C` record
    pub model_name: String,
    /// User header lines (`1U` records)
    pub info: Vec<String>,
}

/// Node set plus element set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Node coordinates (node_id → coordinates)
    pub nodes: BTreeMap<i32, [f64; 3]>,
    /// Element connectivity (element_id → Element)
    pub elements: BTreeMap<i32, FrdElement>,
}

/// Element in FRD file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrdElement {
    /// Element ID
    pub id: i32,
    /// Element type code (FRD format)
    pub element_type: i32,
    /// VTK cell type for this element
    pub cell_type: VtkCellType,
    /// Node connectivity, already in VTK order
    pub nodes: Vec<i32>,
}

/// One field at one time value
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBlock {
    /// Analysis step number
    pub step: i32,
    /// Increment within the step, from the preceding `1PSTEP` record
    pub increment: i32,
    /// Time (or frequency, for modal steps) of the increment
    pub time: f64,
    /// Field name (e.g., "DISP", "STRESS", "NDTEMP")
    pub name: String,
    /// Component names, one per stored value
    pub components: Vec<String>,
    /// Nodal or element result
    pub location: ResultLocation,
    /// Result values (entity_id → component values)
    pub values: BTreeMap<i32, Vec<f64>>,
}

/// Location of result data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLocation {
    /// Nodal results
    Nodal,
    /// Element results
    Element,
}

impl Mesh {
    /// True when either the node or the element set is missing
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.elements.is_empty()
    }

    /// Number of entities of the given domain
    pub fn entity_count(&self, location: ResultLocation) -> usize {
        match location {
            ResultLocation::Nodal => self.nodes.len(),
            ResultLocation::Element => self.elements.len(),
        }
    }

    /// Whether an entity with this id exists in the given domain
    pub fn contains(&self, location: ResultLocation, id: i32) -> bool {
        match location {
            ResultLocation::Nodal => self.nodes.contains_key(&id),
            ResultLocation::Element => self.elements.contains_key(&id),
        }
    }
}

impl ResultBlock {
    /// Number of components per entity (1 scalar, 3 vector, 6 or 9 tensor)
    pub fn ncomps(&self) -> usize {
        self.components.len()
    }

    /// Whether this block belongs to the snapshot selected by `time`.
    ///
    /// `None` selects every block.
    pub fn matches_time(&self, time: Option<f64>) -> bool {
        time.is_none_or(|t| self.time == t)
    }
}

impl FrdFile {
    /// Distinct time values across all result blocks, ascending
    pub fn time_series(&self) -> Vec<f64> {
        time_series(&self.result_blocks)
    }
}

/// Distinct time values of `blocks`, sorted ascending
pub fn time_series(blocks: &[ResultBlock]) -> Vec<f64> {
    let mut times: Vec<f64> = blocks.iter().map(|b| b.time).collect();
    times.sort_by(f64::total_cmp);
    times.dedup();
    times
}
