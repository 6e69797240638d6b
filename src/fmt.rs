//! Human-readable rendering.
//!
//! `Display` prints the element values: a bare number for rank 0, a
//! bracketed row for rank 1, one row per line for rank 2 and nested
//! bracketed blocks for higher ranks. Columns are right-aligned per array
//! for ranks 1 and 2. Arrays above a size threshold render as a shape
//! summary instead of their elements; the representation never leaks into
//! the output, so a sparse, broadcast or joined array prints exactly like
//! its dense equivalent.

use std::fmt;

use crate::array::Array;
use crate::matrix::Matrix;
use crate::vector::Vector;

/// Largest element count rendered in full.
const DISPLAY_LIMIT: usize = 1024;

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank() == 0 {
            return write!(f, "{}", self.get_element(&[]));
        }
        if self.element_count() > DISPLAY_LIMIT {
            return write!(
                f,
                "array(shape={:?}, {} elements)",
                self.shape(),
                self.element_count()
            );
        }
        match self.rank() {
            1 => {
                let cells = format_cells(&self.to_vec());
                write!(f, "[{}]", cells.join(" "))
            }
            2 => {
                let cells = format_cells(&self.to_vec());
                let cols = self.shape()[1];
                write!(f, "[")?;
                for (i, row) in cells.chunks(cols.max(1)).enumerate() {
                    if i > 0 {
                        write!(f, "\n ")?;
                    }
                    write!(f, "[{}]", row.join(" "))?;
                }
                write!(f, "]")
            }
            _ => {
                write!(f, "[")?;
                for i in 0..self.shape()[0] {
                    if i > 0 {
                        write!(f, "\n ")?;
                    }
                    let block = format!("{}", self.slice_unchecked(0, i));
                    // Indent continuation lines of the nested block.
                    write!(f, "{}", block.replace('\n', "\n "))?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Render values right-aligned to one shared width.
fn format_cells(values: &[f64]) -> Vec<String> {
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    let width = rendered.iter().map(String::len).max().unwrap_or(0);
    rendered
        .into_iter()
        .map(|s| format!("{s:>width$}"))
        .collect()
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_array().fmt(f)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_array().fmt(f)
    }
}
