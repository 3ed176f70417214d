//! FRD element types and their VTK counterparts.
//!
//! Each FRD element type code maps to a fixed node count, the VTK cell type
//! used to display it, and the permutation that turns FRD node order into
//! VTK node order. Linear elements and most quadratic ones share the same
//! order; the 20-node brick, 15-node wedge and 3-node beam do not.

use crate::error::{FrdError, Result};

/// VTK cell type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VtkCellType {
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    QuadraticEdge = 21,
    QuadraticTriangle = 22,
    QuadraticQuad = 23,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
    QuadraticWedge = 26,
}

impl VtkCellType {
    /// Numeric identifier written to `CELL_TYPES` / `types` arrays
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// One row of the element topology table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// FRD element type code
    pub frd_type: i32,
    /// CalculiX element family written with this code
    pub name: &'static str,
    /// Number of nodes per element
    pub num_nodes: usize,
    /// `permutation[i]` is the FRD position of the node at VTK position `i`
    pub permutation: &'static [usize],
    /// Target VTK cell type
    pub cell_type: VtkCellType,
}

const LINEAR_2: [usize; 2] = [0, 1];
const LINEAR_3: [usize; 3] = [0, 1, 2];
const LINEAR_4: [usize; 4] = [0, 1, 2, 3];
const LINEAR_6: [usize; 6] = [0, 1, 2, 3, 4, 5];
const LINEAR_8: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const LINEAR_10: [usize; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

// FRD: corners, bottom edges, vertical edges, top edges.
// VTK: corners, bottom edges, top edges, vertical edges.
const HE20_ORDER: [usize; 20] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15,
];
const PE15_ORDER: [usize; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 14, 9, 10, 11];

// FRD lists the mid node second, VTK last.
const BE3_ORDER: [usize; 3] = [0, 2, 1];

static TOPOLOGY_TABLE: [Topology; 12] = [
    Topology {
        frd_type: 1,
        name: "C3D8",
        num_nodes: 8,
        permutation: &LINEAR_8,
        cell_type: VtkCellType::Hexahedron,
    },
    Topology {
        frd_type: 2,
        name: "C3D6",
        num_nodes: 6,
        permutation: &LINEAR_6,
        cell_type: VtkCellType::Wedge,
    },
    Topology {
        frd_type: 3,
        name: "C3D4",
        num_nodes: 4,
        permutation: &LINEAR_4,
        cell_type: VtkCellType::Tetra,
    },
    Topology {
        frd_type: 4,
        name: "C3D20",
        num_nodes: 20,
        permutation: &HE20_ORDER,
        cell_type: VtkCellType::QuadraticHexahedron,
    },
    Topology {
        frd_type: 5,
        name: "C3D15",
        num_nodes: 15,
        permutation: &PE15_ORDER,
        cell_type: VtkCellType::QuadraticWedge,
    },
    Topology {
        frd_type: 6,
        name: "C3D10",
        num_nodes: 10,
        permutation: &LINEAR_10,
        cell_type: VtkCellType::QuadraticTetra,
    },
    Topology {
        frd_type: 7,
        name: "S3",
        num_nodes: 3,
        permutation: &LINEAR_3,
        cell_type: VtkCellType::Triangle,
    },
    Topology {
        frd_type: 8,
        name: "S6",
        num_nodes: 6,
        permutation: &LINEAR_6,
        cell_type: VtkCellType::QuadraticTriangle,
    },
    Topology {
        frd_type: 9,
        name: "S4",
        num_nodes: 4,
        permutation: &LINEAR_4,
        cell_type: VtkCellType::Quad,
    },
    Topology {
        frd_type: 10,
        name: "S8",
        num_nodes: 8,
        permutation: &LINEAR_8,
        cell_type: VtkCellType::QuadraticQuad,
    },
    Topology {
        frd_type: 11,
        name: "B31",
        num_nodes: 2,
        permutation: &LINEAR_2,
        cell_type: VtkCellType::Line,
    },
    Topology {
        frd_type: 12,
        name: "B32",
        num_nodes: 3,
        permutation: &BE3_ORDER,
        cell_type: VtkCellType::QuadraticEdge,
    },
];

/// Look up the topology of an FRD element type code
pub fn lookup(frd_type: i32) -> Result<&'static Topology> {
    TOPOLOGY_TABLE
        .iter()
        .find(|t| t.frd_type == frd_type)
        .ok_or(FrdError::UnknownElementType(frd_type))
}

impl Topology {
    /// Reorder FRD-ordered node ids into VTK order.
    ///
    /// Returns `None` when the node count does not match the element type.
    pub fn reorder(&self, frd_nodes: &[i32]) -> Option<Vec<i32>> {
        if frd_nodes.len() != self.num_nodes {
            return None;
        }
        Some(self.permutation.iter().map(|&i| frd_nodes[i]).collect())
    }
}
