//! Row-major 2D grid storage shared by masks, metric rasters, and distance fields.
use crate::error::{Error, Result};

/// A 2D grid of `height` rows by `width` columns stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap row-major `data`, checking that it holds exactly `width * height` cells.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidConfig(format!(
                "grid data has {} cells, expected {}x{} = {}",
                data.len(),
                width,
                height,
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid size as `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear index of `(row, col)`. Callers must stay in bounds.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.height && col < self.width);
        row * self.width + col
    }

    /// Inverse of [`Grid::index`].
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if self.contains(row, col) {
            Some(&self.data[row * self.width + col])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if self.contains(row, col) {
            Some(&mut self.data[row * self.width + col])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate over `(row, col, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let w = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (i / w, i % w, v))
    }

    /// Apply `f` to every cell, producing a grid of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fail with [`Error::InvalidConfig`] unless `other` has this grid's shape.
    pub fn ensure_same_shape<U>(&self, other: &Grid<U>, what: &str) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!(
                "{what} is {}x{}, expected {}x{}",
                other.width, other.height, self.width, self.height
            )))
        }
    }
}

impl Grid<bool> {
    /// Number of `true` cells.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// Cell-wise logical AND with a grid of the same shape.
    pub fn and(&self, other: &Grid<bool>) -> Result<Grid<bool>> {
        self.ensure_same_shape(other, "mask")?;
        Ok(Grid {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| *a && *b)
                .collect(),
        })
    }
}
