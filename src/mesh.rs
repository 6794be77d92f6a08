//! Structured hexahedral meshes of prismatic or stepped bars.

use nalgebra::Vector3;

use crate::error::{EigenError, Result};
use crate::types::{NodeCoords, DOF_PER_NODE};

/// Mesh of a bar along x, divided into axial slices.
#[derive(Debug, Clone)]
pub struct Mesh3d {
    pub nodes: Vec<Vector3<f64>>,
    pub elements: Vec<[usize; 8]>,
    /// Axial slice index of every element.
    pub slice_of_element: Vec<usize>,
    pub num_slices: usize,
}

impl Mesh3d {
    pub fn num_dofs(&self) -> usize {
        self.nodes.len() * DOF_PER_NODE
    }

    /// Corner coordinates of element `e`, one row per node.
    pub fn element_coords(&self, e: usize) -> NodeCoords {
        let mut coords = NodeCoords::zeros();
        for (i, &node_idx) in self.elements[e].iter().enumerate() {
            let node = self.nodes[node_idx];
            coords[(i, 0)] = node.x;
            coords[(i, 1)] = node.y;
            coords[(i, 2)] = node.z;
        }
        coords
    }

    /// Global DOF indices of element `e` in element-matrix order.
    pub fn element_dofs(&self, e: usize) -> [usize; 24] {
        let mut dofs = [0; 24];
        for (i, &n) in self.elements[e].iter().enumerate() {
            for d in 0..DOF_PER_NODE {
                dofs[DOF_PER_NODE * i + d] = DOF_PER_NODE * n + d;
            }
        }
        dofs
    }
}

/// Uniform mesh of a bar of the given length and width. `slice_heights`
/// holds the height of each axial slice; nodes between two slices sit at the
/// mean height, so a stepped profile becomes a gentle taper.
pub fn generate_bar_mesh_3d(
    length: f64,
    width: f64,
    slice_heights: &[f64],
    ny: usize,
    nz: usize,
) -> Result<Mesh3d> {
    let nx = slice_heights.len();
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(EigenError::Model(format!(
            "bar mesh needs at least one element per direction (nx = {nx}, ny = {ny}, nz = {nz})"
        )));
    }
    if !(length > 0.0 && width > 0.0) || slice_heights.iter().any(|h| !(*h > 0.0)) {
        return Err(EigenError::Model("bar dimensions must be positive".into()));
    }

    let dx = length / nx as f64;
    let dy = width / ny as f64;
    let nny = ny + 1;
    let nnz = nz + 1;

    // Node index = ix * (nny * nnz) + iy * nnz + iz
    let node_idx = |ix: usize, iy: usize, iz: usize| -> usize { ix * (nny * nnz) + iy * nnz + iz };

    let mut nodes = Vec::with_capacity((nx + 1) * nny * nnz);
    for ix in 0..=nx {
        let x = ix as f64 * dx;
        let h = if ix == 0 {
            slice_heights[0]
        } else if ix == nx {
            slice_heights[nx - 1]
        } else {
            (slice_heights[ix - 1] + slice_heights[ix]) / 2.0
        };
        let dz = h / nz as f64;

        for iy in 0..nny {
            let y = iy as f64 * dy;
            for iz in 0..nnz {
                nodes.push(Vector3::new(x, y, iz as f64 * dz));
            }
        }
    }

    let mut elements = Vec::with_capacity(nx * ny * nz);
    let mut slice_of_element = Vec::with_capacity(nx * ny * nz);
    for ix in 0..nx {
        for iy in 0..ny {
            for iz in 0..nz {
                elements.push([
                    node_idx(ix, iy, iz),
                    node_idx(ix + 1, iy, iz),
                    node_idx(ix + 1, iy + 1, iz),
                    node_idx(ix, iy + 1, iz),
                    node_idx(ix, iy, iz + 1),
                    node_idx(ix + 1, iy, iz + 1),
                    node_idx(ix + 1, iy + 1, iz + 1),
                    node_idx(ix, iy + 1, iz + 1),
                ]);
                slice_of_element.push(ix);
            }
        }
    }

    Ok(Mesh3d {
        nodes,
        elements,
        slice_of_element,
        num_slices: nx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_generation_matches_expected_counts() {
        let mesh = generate_bar_mesh_3d(2.0, 1.0, &[1.0, 1.0], 2, 2).unwrap();
        assert_eq!(mesh.nodes.len(), 27);
        assert_eq!(mesh.elements.len(), 8);
        assert_eq!(mesh.slice_of_element.len(), 8);
        assert_eq!(mesh.elements[0], [0, 9, 12, 3, 1, 10, 13, 4]);
        assert_eq!(mesh.num_dofs(), 81);
    }

    #[test]
    fn slices_follow_axial_position() {
        let mesh = generate_bar_mesh_3d(0.5, 0.03, &[0.024, 0.02, 0.024], 2, 1).unwrap();
        assert_eq!(mesh.num_slices, 3);
        for (e, &slice) in mesh.slice_of_element.iter().enumerate() {
            let coords = mesh.element_coords(e);
            let x_mid = (coords[(0, 0)] + coords[(1, 0)]) / 2.0;
            assert_eq!((x_mid / (0.5 / 3.0)) as usize, slice);
        }
    }

    #[test]
    fn element_dofs_follow_node_order() {
        let mesh = generate_bar_mesh_3d(1.0, 1.0, &[1.0], 1, 1).unwrap();
        let dofs = mesh.element_dofs(0);
        let first = mesh.elements[0][1];
        assert_eq!(&dofs[3..6], &[3 * first, 3 * first + 1, 3 * first + 2]);
    }

    #[test]
    fn degenerate_input_is_rejected() {
        assert!(generate_bar_mesh_3d(1.0, 1.0, &[], 1, 1).is_err());
        assert!(generate_bar_mesh_3d(1.0, 1.0, &[1.0], 0, 1).is_err());
        assert!(generate_bar_mesh_3d(1.0, 1.0, &[-1.0], 1, 1).is_err());
    }
}
