//! Structured 2-D grid.
//!
//! Cells are stored row-major: linear index = i + j·ni. Each cell owns two
//! adjacent unknowns in the global vector, pressure at 2·index and water
//! saturation at 2·index + 1.

use crate::error::{ReservoirError, ReservoirResult, check_fraction, check_positive};

/// Static rock properties of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub porosity: f64,
    /// Absolute permeability [mD]
    pub permeability: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReservoirGrid {
    ni: usize,
    nj: usize,
    dx: f64,
    dy: f64,
    thickness: f64,
    cells: Vec<Cell>,
}

impl ReservoirGrid {
    /// Uniform grid of `ni × nj` cells spanning `length_i × length_j` [m] with
    /// layer `thickness` [m].
    pub fn uniform(
        ni: usize,
        nj: usize,
        length_i: f64,
        length_j: f64,
        thickness: f64,
        porosity: f64,
        permeability: f64,
    ) -> ReservoirResult<Self> {
        if ni == 0 || nj == 0 {
            return Err(ReservoirError::InvalidParameter {
                what: "grid dimension",
                value: 0.0,
            });
        }
        check_positive(length_i, "grid length in i")?;
        check_positive(length_j, "grid length in j")?;
        check_positive(thickness, "layer thickness")?;
        check_positive(porosity, "porosity")?;
        check_fraction(porosity, "porosity")?;
        check_positive(permeability, "permeability")?;
        Ok(Self {
            ni,
            nj,
            dx: length_i / ni as f64,
            dy: length_j / nj as f64,
            thickness,
            cells: vec![
                Cell {
                    porosity,
                    permeability,
                };
                ni * nj
            ],
        })
    }

    pub fn ni(&self) -> usize {
        self.ni
    }

    pub fn nj(&self) -> usize {
        self.nj
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell size in i [m].
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Cell size in j [m].
    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn index(&self, i: usize, j: usize) -> ReservoirResult<usize> {
        if i >= self.ni {
            return Err(ReservoirError::IndexOob {
                what: "cell i",
                index: i,
                len: self.ni,
            });
        }
        if j >= self.nj {
            return Err(ReservoirError::IndexOob {
                what: "cell j",
                index: j,
                len: self.nj,
            });
        }
        Ok(i + j * self.ni)
    }

    /// (i, j) of a linear index.
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.ni, index / self.ni)
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Override one cell's rock properties.
    pub fn set_cell(&mut self, i: usize, j: usize, cell: Cell) -> ReservoirResult<()> {
        let idx = self.index(i, j)?;
        check_positive(cell.porosity, "porosity")?;
        check_fraction(cell.porosity, "porosity")?;
        check_positive(cell.permeability, "permeability")?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Face neighbors of a cell (at most four).
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> {
        let (i, j) = self.coords(index);
        let ni = self.ni;
        let nj = self.nj;
        let west = (i > 0).then(|| index - 1);
        let east = (i + 1 < ni).then(|| index + 1);
        let south = (j > 0).then(|| index - ni);
        let north = (j + 1 < nj).then(|| index + ni);
        [west, east, south, north].into_iter().flatten()
    }

    pub fn pore_volume(&self, index: usize) -> f64 {
        self.dx * self.dy * self.thickness * self.cells[index].porosity
    }

    /// Geometric transmissibility between two face neighbors [mD·m], using the
    /// harmonic mean of the two permeabilities.
    pub fn transmissibility(&self, a: usize, b: usize) -> f64 {
        let k1 = self.cells[a].permeability;
        let k2 = self.cells[b].permeability;
        let kh = 2.0 * k1 * k2 / (k1 + k2);
        let (ia, _) = self.coords(a);
        let (ib, _) = self.coords(b);
        if ia == ib {
            kh * self.dx * self.thickness / self.dy
        } else {
            kh * self.dy * self.thickness / self.dx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ReservoirGrid {
        ReservoirGrid::uniform(3, 2, 300.0, 100.0, 20.0, 0.2, 100.0).unwrap()
    }

    #[test]
    fn row_major_indexing() {
        let g = grid();
        assert_eq!(g.len(), 6);
        assert_eq!(g.index(0, 0).unwrap(), 0);
        assert_eq!(g.index(2, 0).unwrap(), 2);
        assert_eq!(g.index(0, 1).unwrap(), 3);
        assert_eq!(g.index(2, 1).unwrap(), 5);
        assert_eq!(g.coords(4), (1, 1));
        assert!(g.index(3, 0).is_err());
        assert!(g.index(0, 2).is_err());
    }

    #[test]
    fn neighbors_respect_edges() {
        let g = grid();
        let mut corner: Vec<_> = g.neighbors(0).collect();
        corner.sort();
        assert_eq!(corner, vec![1, 3]);
        let mut middle: Vec<_> = g.neighbors(4).collect();
        middle.sort();
        assert_eq!(middle, vec![1, 3, 5]);
        let single = ReservoirGrid::uniform(1, 1, 10.0, 10.0, 1.0, 0.1, 1.0).unwrap();
        assert_eq!(single.neighbors(0).count(), 0);
    }

    #[test]
    fn transmissibility_uses_direction_and_harmonic_mean() {
        let mut g = grid();
        // dx = 100, dy = 50, h = 20
        assert!((g.transmissibility(0, 1) - 100.0 * 50.0 * 20.0 / 100.0).abs() < 1e-9);
        assert!((g.transmissibility(0, 3) - 100.0 * 100.0 * 20.0 / 50.0).abs() < 1e-9);
        g.set_cell(
            1,
            0,
            Cell {
                porosity: 0.2,
                permeability: 300.0,
            },
        )
        .unwrap();
        let kh = 2.0 * 100.0 * 300.0 / 400.0;
        assert!((g.transmissibility(0, 1) - kh * 50.0 * 20.0 / 100.0).abs() < 1e-9);
        assert_eq!(g.transmissibility(0, 1), g.transmissibility(1, 0));
    }

    #[test]
    fn rejects_bad_rock() {
        assert!(ReservoirGrid::uniform(0, 2, 1.0, 1.0, 1.0, 0.2, 1.0).is_err());
        assert!(ReservoirGrid::uniform(2, 2, 1.0, 1.0, 1.0, 1.2, 1.0).is_err());
        assert!(ReservoirGrid::uniform(2, 2, 1.0, 1.0, 1.0, 0.2, -1.0).is_err());
        let mut g = grid();
        assert!(
            g.set_cell(
                0,
                0,
                Cell {
                    porosity: 0.0,
                    permeability: 1.0
                }
            )
            .is_err()
        );
    }
}
