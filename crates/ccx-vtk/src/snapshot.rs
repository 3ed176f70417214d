//! One time snapshot: the mesh plus the result blocks written with it.
//!
//! Both writers consume a [`Snapshot`]. Field tuples are zero-filled: every
//! entity of the field's domain gets a tuple in ascending id order, and
//! entities the block does not cover are written as zeros.

use std::collections::{HashMap, HashSet};
use std::io;

use ccx_frd::{FrdElement, Mesh, ResultBlock, ResultLocation};
use tracing::debug;

/// A result block as written into one output file
#[derive(Debug)]
pub struct Field<'a> {
    /// Array name, unique within the snapshot
    pub name: String,
    /// Source block
    pub block: &'a ResultBlock,
    zeros: Vec<f64>,
}

impl<'a> Field<'a> {
    fn new(name: String, block: &'a ResultBlock) -> Self {
        Self {
            name,
            block,
            zeros: vec![0.0; block.ncomps()],
        }
    }

    /// Number of components per tuple
    pub fn ncomps(&self) -> usize {
        self.block.ncomps()
    }

    /// Component names of the source block
    pub fn components(&self) -> &[String] {
        &self.block.components
    }

    /// One tuple per entity of the field's domain, in ascending id order
    pub fn tuples<'s>(&'s self, mesh: &'s Mesh) -> impl Iterator<Item = &'s [f64]> + 's {
        let ids: Box<dyn Iterator<Item = &'s i32> + 's> = match self.block.location {
            ResultLocation::Nodal => Box::new(mesh.nodes.keys()),
            ResultLocation::Element => Box::new(mesh.elements.keys()),
        };
        ids.map(move |id| {
            self.block
                .values
                .get(id)
                .map_or(self.zeros.as_slice(), Vec::as_slice)
        })
    }
}

/// Mesh plus the fields selected for one output file
#[derive(Debug)]
pub struct Snapshot<'a> {
    mesh: &'a Mesh,
    time: Option<f64>,
    fields: Vec<Field<'a>>,
    point_index: HashMap<i32, usize>,
}

impl<'a> Snapshot<'a> {
    /// Select the blocks of `blocks` at `time`; `None` keeps every block
    pub fn new(mesh: &'a Mesh, blocks: &'a [ResultBlock], time: Option<f64>) -> Self {
        let mut used = HashSet::new();
        let mut fields = Vec::new();
        for block in blocks.iter().filter(|b| b.matches_time(time)) {
            let name = unique_name(&block.name, &mut used);
            let missing = mesh
                .entity_count(block.location)
                .saturating_sub(block.values.len());
            if missing > 0 {
                debug!(field = %name, missing, "zero-filling entities without values");
            }
            fields.push(Field::new(name, block));
        }

        let point_index = mesh
            .nodes
            .keys()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();

        Self {
            mesh,
            time,
            fields,
            point_index,
        }
    }

    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    /// Time value of the snapshot, `None` for untimed output
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn fields(&self) -> &[Field<'a>] {
        &self.fields
    }

    /// Fields attached to nodes
    pub fn point_fields(&self) -> impl Iterator<Item = &Field<'a>> {
        self.fields_at(ResultLocation::Nodal)
    }

    /// Fields attached to elements
    pub fn cell_fields(&self) -> impl Iterator<Item = &Field<'a>> {
        self.fields_at(ResultLocation::Element)
    }

    fn fields_at(&self, location: ResultLocation) -> impl Iterator<Item = &Field<'a>> {
        self.fields
            .iter()
            .filter(move |f| f.block.location == location)
    }

    /// Zero-based point indices of an element's nodes
    pub fn connectivity(&self, element: &FrdElement) -> io::Result<Vec<usize>> {
        element
            .nodes
            .iter()
            .map(|id| {
                self.point_index.get(id).copied().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("element {} references unknown node {}", element.id, id),
                    )
                })
            })
            .collect()
    }
}

/// `name`, or `name_2`, `name_3`, ... when already taken
pub(crate) fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{name}_{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
