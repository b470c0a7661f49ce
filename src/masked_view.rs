//! Strided, bit-masked views over raw lidar packet buffers.

use crate::base::{ensure_len, Result};
use crate::format::{read_word, write_word, FieldDescr, PacketFormat};
use crate::types::{ChanField, ColHeader};
use log::trace;
use ndarray::{Array2, ArrayView2, ErrorKind, ShapeError};

/// Selects what a [`MaskedView`] projects: a channel field or a column header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewKey {
    Field(ChanField),
    Header(ColHeader),
}

impl From<ChanField> for ViewKey {
    fn from(field: ChanField) -> Self {
        ViewKey::Field(field)
    }
}

impl From<ColHeader> for ViewKey {
    fn from(header: ColHeader) -> Self {
        ViewKey::Header(header)
    }
}

/// A non-owning window onto one field of a packet buffer.
///
/// Channel field views have shape `(pixels_per_column, columns_per_packet)`,
/// column header views have shape `(1, columns_per_packet)`. Values are
/// decoded to `u64` on read (mask, then shift) and encoded on write, leaving
/// the bits outside the field mask untouched.
#[derive(Debug)]
pub struct MaskedView<B> {
    data: B,
    descr: FieldDescr,
    start: usize,
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<B: AsRef<[u8]>> MaskedView<B> {
    /// Creates a view of `key` over a packet buffer of format `pf`.
    ///
    /// # Arguments
    ///
    /// * `data` - The packet buffer, at least `pf.lidar_packet_size()` bytes long.
    /// * `pf` - The packet format describing the buffer layout.
    /// * `key` - A [`ChanField`] or a [`ColHeader`].
    pub fn new(data: B, pf: &PacketFormat, key: impl Into<ViewKey>) -> Result<MaskedView<B>> {
        ensure_len(pf.lidar_packet_size(), data.as_ref().len())?;
        let key = key.into();
        let view = match key {
            ViewKey::Field(field) => {
                let descr = pf.field_descr(field)?;
                MaskedView {
                    data,
                    descr,
                    start: pf.packet_header_size() + pf.col_header_size() + descr.offset as usize,
                    rows: pf.pixels_per_column(),
                    cols: pf.columns_per_packet(),
                    row_stride: pf.channel_data_size(),
                    col_stride: pf.column_size(),
                }
            }
            ViewKey::Header(header) => {
                let descr = pf.header_descr(header)?;
                let column_start = if descr.offset < 0 {
                    pf.column_size() as isize
                } else {
                    0
                };
                MaskedView {
                    data,
                    descr,
                    start: (pf.packet_header_size() as isize + column_start + descr.offset)
                        as usize,
                    rows: 1,
                    cols: pf.columns_per_packet(),
                    row_stride: 0,
                    col_stride: pf.column_size(),
                }
            }
        };
        trace!(
            "MaskedView {:?}: start {}, shape {}x{}, strides ({}, {})",
            key,
            view.start,
            view.rows,
            view.cols,
            view.row_stride,
            view.col_stride
        );
        Ok(view)
    }

    #[inline]
    fn position(&self, row: usize, col: usize) -> usize {
        self.start + row * self.row_stride + col * self.col_stride
    }

    #[inline]
    fn value_at(&self, row: usize, col: usize) -> u64 {
        let pos = self.position(row, col);
        self.descr.decode(read_word(self.descr.ty, &self.data.as_ref()[pos..]))
    }

    /// `(rows, columns)` of the view.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The descriptor the view decodes with.
    pub fn descr(&self) -> FieldDescr {
        self.descr
    }

    /// Stored word at `(row, col)` without mask or shift.
    pub fn raw(&self, row: usize, col: usize) -> Option<u64> {
        if row < self.rows && col < self.cols {
            let pos = self.position(row, col);
            Some(read_word(self.descr.ty, &self.data.as_ref()[pos..]))
        } else {
            None
        }
    }

    /// Decoded value at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        if row < self.rows && col < self.cols {
            Some(self.value_at(row, col))
        } else {
            None
        }
    }

    /// Decoded values of one column, top to bottom.
    pub fn column(&self, col: usize) -> Option<Vec<u64>> {
        if col < self.cols {
            Some((0..self.rows).map(|row| self.value_at(row, col)).collect())
        } else {
            None
        }
    }

    /// Iterates decoded values in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| self.value_at(row, col)))
    }

    /// Copies the decoded values into a vector, row-major.
    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// Copies the decoded values into a contiguous array.
    pub fn to_array(&self) -> Array2<u64> {
        Array2::from_shape_fn((self.rows, self.cols), |(row, col)| self.value_at(row, col))
    }

    /// Releases the underlying buffer.
    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> MaskedView<B> {
    #[inline]
    fn store(&mut self, row: usize, col: usize, value: u64) {
        let pos = self.position(row, col);
        let ty = self.descr.ty;
        let old = read_word(ty, &self.data.as_ref()[pos..]);
        let word = self.descr.encode(value, old);
        write_word(ty, &mut self.data.as_mut()[pos..], word);
    }

    /// Encodes `value` into `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics when `(row, col)` is outside of [`MaskedView::dim`].
    pub fn set(&mut self, row: usize, col: usize, value: u64) {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for view of shape ({}, {})",
            row,
            col,
            self.rows,
            self.cols
        );
        self.store(row, col, value);
    }

    /// Encodes `values` into column `col`, starting at `start_row` and going down.
    ///
    /// Column slices are the finest slice writes a view offers. Returns
    /// `false` and writes nothing when the slice does not fit in the view.
    pub fn set_slice(&mut self, col: usize, start_row: usize, values: &[u64]) -> bool {
        let fits = col < self.cols
            && start_row
                .checked_add(values.len())
                .map_or(false, |end| end <= self.rows);
        if !fits {
            trace!(
                "Slice of {} values at ({}, {}) does not fit a {}x{} view",
                values.len(),
                start_row,
                col,
                self.rows,
                self.cols
            );
            return false;
        }
        for (i, value) in values.iter().enumerate() {
            self.store(start_row + i, col, *value);
        }
        true
    }

    /// Encodes `values` into column `col` from the top, see [`MaskedView::set_slice`].
    pub fn set_column(&mut self, col: usize, values: &[u64]) -> bool {
        self.set_slice(col, 0, values)
    }

    /// Encodes the same value into every element.
    pub fn fill(&mut self, value: u64) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.store(row, col, value);
            }
        }
    }

    /// Encodes every element from an array of the same shape.
    pub fn assign(&mut self, values: ArrayView2<'_, u64>) -> Result<()> {
        if values.dim() != (self.rows, self.cols) {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        for ((row, col), value) in values.indexed_iter() {
            self.store(row, col, *value);
        }
        Ok(())
    }
}
