use failure::{format_err, Error};
use serde::Serialize;

/// Owning two dimensional array with row-major storage.
///
/// Room maps, scroll grids and rasterized tiles are all rectangular, so they
/// share this one container.
#[derive(Clone, Debug, Serialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Grid<T> {
        Grid {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Panics when (x, y) is outside the grid.  Use `get` for untrusted
    /// coordinates.
    pub fn at(&self, x: usize, y: usize) -> &T {
        assert!(x < self.width && y < self.height);
        &self.cells[x + y * self.width]
    }

    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut T {
        assert!(x < self.width && y < self.height);
        &mut self.cells[x + y * self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(x + y * self.width)
    }
}

pub fn u16_at(buffer: &[u8], offset: usize) -> Result<u16, Error> {
    let bytes = buffer
        .get(offset..offset + 2)
        .ok_or_else(|| format_err!("u16 read past end of buffer at {:#x}", offset))?;
    Ok(u16::from(bytes[0]) | u16::from(bytes[1]) << 8)
}

pub fn u24_at(buffer: &[u8], offset: usize) -> Result<u32, Error> {
    let bytes = buffer
        .get(offset..offset + 3)
        .ok_or_else(|| format_err!("u24 read past end of buffer at {:#x}", offset))?;
    Ok(u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_shape_and_indexing() {
        let mut grid: Grid<u8> = Grid::new(3, 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(*grid.at(2, 1), 0);

        *grid.at_mut(2, 1) = 0xab;
        assert_eq!(*grid.at(2, 1), 0xab);
        assert_eq!(*grid.at(2, 0), 0);

        assert_eq!(grid.get(2, 1), Some(&0xab));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn little_endian_helpers() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(u16_at(&data, 0).unwrap(), 0x3412);
        assert_eq!(u16_at(&data, 2).unwrap(), 0x7856);
        assert_eq!(u24_at(&data, 1).unwrap(), 0x785634);

        assert!(u16_at(&data, 3).is_err());
        assert!(u24_at(&data, 2).is_err());
    }
}
