//! The hex grid oracle.
//!
//! Spatial correctness of the hex grid library is treated as a trusted,
//! out-of-scope oracle: a pure, total function. This crate defines that
//! oracle as a trait, plus a deterministic reference
//! implementation good enough to exercise the rest of the pipeline and its
//! tests. A production deployment would swap in a real H3-style grid
//! library behind the same trait; the compressor never looks past it.

use geobatch_error::GeoBatchError;
use geobatch_types::{CellId, Point, MAX_RES};

/// Upper bound on base cells in the reference grid, loosely modeled on H3's
/// 122 base cells. Not a real geodesic subdivision — see module docs.
pub const NUM_BASE_CELLS: u8 = 122;

/// cell→resolution, cell→parent(res), cell→center, cell→boundary, cell
/// validity.
pub trait HexGridOracle {
    fn is_valid(&self, cell: CellId) -> bool;
    fn resolution(&self, cell: CellId) -> u8;
    /// `resolution(cell_to_parent(c, r)) = r` for `r <= resolution(c)`
    ///.
    fn cell_to_parent(&self, cell: CellId, resolution: u8) -> Result<CellId, GeoBatchError>;
    fn cell_to_center(&self, cell: CellId) -> Point;
    fn cell_to_boundary(&self, cell: CellId) -> Vec<Point>;
}

/// A deterministic, pure, total reference oracle. Cell geometry is
/// synthetic (derived from a non-cryptographic hash of the cell's
/// canonical string) since real grid geometry is out of scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceOracle;

impl HexGridOracle for ReferenceOracle {
    fn is_valid(&self, cell: CellId) -> bool {
        let res = cell.resolution();
        if res > MAX_RES || cell.base_cell() >= NUM_BASE_CELLS {
            return false;
        }
        for i in 0..MAX_RES {
            let d = cell.digit(i);
            if i < res {
                if d > 6 {
                    return false;
                }
            } else if d != 7 {
                return false;
            }
        }
        true
    }

    fn resolution(&self, cell: CellId) -> u8 {
        cell.resolution()
    }

    fn cell_to_parent(&self, cell: CellId, resolution: u8) -> Result<CellId, GeoBatchError> {
        if !self.is_valid(cell) {
            return Err(GeoBatchError::hierarchy(format!(
                "invalid cell: {cell}"
            )));
        }
        if resolution > cell.resolution() {
            return Err(GeoBatchError::hierarchy(format!(
                "cannot take parent of {cell} at finer resolution {resolution}"
            )));
        }
        let digits = cell.digits();
        Ok(CellId::from_parts(
            resolution,
            cell.base_cell(),
            &digits[..resolution as usize],
        ))
    }

    fn cell_to_center(&self, cell: CellId) -> Point {
        let h = fnv1a(cell.canonical_string().as_bytes());
        let lat = ((h & 0xFFFF_FFFF) as f64 / u32::MAX as f64) * 180.0 - 90.0;
        let lng = (((h >> 32) & 0xFFFF_FFFF) as f64 / u32::MAX as f64) * 360.0 - 180.0;
        [lat, lng]
    }

    fn cell_to_boundary(&self, cell: CellId) -> Vec<Point> {
        let [lat, lng] = self.cell_to_center(cell);
        // Cell footprint shrinks geometrically with resolution, matching
        // the real grid's nesting property without modeling true geodesics.
        let radius = 10.0 / 2f64.powi(cell.resolution() as i32);
        (0..6)
            .map(|k| {
                let theta = std::f64::consts::FRAC_PI_3 * k as f64;
                [
                    (lat + radius * theta.sin()).clamp(-90.0, 90.0),
                    (lng + radius * theta.cos()).clamp(-180.0, 180.0),
                ]
            })
            .collect()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
