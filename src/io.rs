//! Persisted forms: a binary shape-plus-buffer encoding and a
//! whitespace-delimited text form for matrices.
//!
//! Both forms are exact round-trips over dense values: writing an array and
//! reading it back reproduces every element bit-for-bit (f64 payloads are
//! written raw, little-endian). Reading always produces packed dense
//! storage; writing accepts any representation and serializes its row-major
//! element sequence.

use std::io::{BufRead, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Array, ArrayError, Result};

// ============================================================================
// Binary form
// ============================================================================

/// Write `array` as: rank (u64), dimension sizes (u64 each), then the
/// row-major element buffer (f64 each), all little-endian.
pub fn write_binary<W: Write>(array: &Array, w: &mut W) -> Result<()> {
    w.write_u64::<LittleEndian>(array.rank() as u64)?;
    for &d in array.shape() {
        w.write_u64::<LittleEndian>(d as u64)?;
    }
    for v in array.to_vec() {
        w.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Read the binary form back as a packed dense array.
pub fn read_binary<R: Read>(r: &mut R) -> Result<Array> {
    let rank = r.read_u64::<LittleEndian>()? as usize;
    let mut shape = Vec::with_capacity(rank);
    for _ in 0..rank {
        shape.push(r.read_u64::<LittleEndian>()? as usize);
    }
    let count = shape.iter().product();
    let mut data = Vec::with_capacity(count);
    for _ in 0..count {
        data.push(r.read_f64::<LittleEndian>()?);
    }
    Array::from_vec(&shape, data)
}

// ============================================================================
// Text form (rank 2)
// ============================================================================

/// Write a rank-2 array as text: `rows cols` on the first line, then one
/// whitespace-delimited row per line.
pub fn write_text<W: Write>(array: &Array, w: &mut W) -> Result<()> {
    if array.rank() != 2 {
        return Err(ArrayError::UnsupportedRank {
            expected: 2,
            actual: array.rank(),
        });
    }
    let (rows, cols) = (array.shape()[0], array.shape()[1]);
    writeln!(w, "{rows} {cols}")?;
    for i in 0..rows {
        let row = array.slice_unchecked(0, i);
        let line: Vec<String> = row.to_vec().iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Read the text form back as a packed dense rank-2 array.
pub fn read_text<R: BufRead>(r: &mut R) -> Result<Array> {
    let mut header = String::new();
    r.read_line(&mut header)?;
    let mut parts = header.split_whitespace();
    let rows: usize = parse_field(parts.next(), "row count")?;
    let cols: usize = parse_field(parts.next(), "column count")?;
    if parts.next().is_some() {
        return Err(ArrayError::Parse("trailing tokens after header".into()));
    }

    let mut data = Vec::with_capacity(rows * cols);
    let mut line = String::new();
    for i in 0..rows {
        line.clear();
        if r.read_line(&mut line)? == 0 {
            return Err(ArrayError::Parse(format!("missing row {i} of {rows}")));
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != cols {
            return Err(ArrayError::Parse(format!(
                "row {i} holds {} values, expected {cols}",
                fields.len()
            )));
        }
        for field in fields {
            data.push(
                field
                    .parse::<f64>()
                    .map_err(|e| ArrayError::Parse(format!("bad value {field:?}: {e}")))?,
            );
        }
    }
    Array::from_vec(&[rows, cols], data)
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, what: &str) -> Result<T> {
    field
        .ok_or_else(|| ArrayError::Parse(format!("missing {what}")))?
        .parse()
        .map_err(|_| ArrayError::Parse(format!("unreadable {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_binary_roundtrip_dense() {
        let a = Array::from_fn(&[2, 3, 4], |idx| (idx[0] * 12 + idx[1] * 4 + idx[2]) as f64);
        let mut buf = Vec::new();
        write_binary(&a, &mut buf).unwrap();
        let back = read_binary(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.shape(), a.shape());
        assert!(back.eq_elements(&a));
    }

    #[test]
    fn test_binary_roundtrip_scalar_and_views() {
        for a in [
            Array::scalar(2.5),
            Array::zero(&[3, 3]),
            Array::from_vec(&[4], vec![0.0, 1.5, 0.0, -2.0])
                .unwrap()
                .to_sparse(),
            Array::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])
                .unwrap()
                .transpose()
                .unwrap(),
        ] {
            let mut buf = Vec::new();
            write_binary(&a, &mut buf).unwrap();
            let back = read_binary(&mut Cursor::new(buf)).unwrap();
            assert!(back.eq_elements(&a));
        }
    }

    #[test]
    fn test_binary_exact_bits() {
        let a = Array::from_vec(&[2], vec![0.1 + 0.2, f64::MIN_POSITIVE]).unwrap();
        let mut buf = Vec::new();
        write_binary(&a, &mut buf).unwrap();
        let back = read_binary(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back.to_vec(), a.to_vec());
    }

    #[test]
    fn test_text_roundtrip() {
        let m = Array::from_vec(&[2, 3], vec![1.0, 2.5, -3.0, 4.0, 0.0, 6.25]).unwrap();
        let mut buf = Vec::new();
        write_text(&m, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("2 3\n"));
        let back = read_text(&mut Cursor::new(buf)).unwrap();
        assert!(back.eq_elements(&m));
    }

    #[test]
    fn test_text_rejects_non_matrix() {
        let v = Array::zeros(&[3]);
        assert!(matches!(
            write_text(&v, &mut Vec::new()),
            Err(ArrayError::UnsupportedRank { expected: 2, .. })
        ));
    }

    #[test]
    fn test_text_malformed() {
        assert!(read_text(&mut Cursor::new(b"2\n".to_vec())).is_err());
        assert!(read_text(&mut Cursor::new(b"2 2\n1 2\n".to_vec())).is_err());
        assert!(read_text(&mut Cursor::new(b"1 2\n1 x\n".to_vec())).is_err());
        assert!(read_text(&mut Cursor::new(b"1 2\n1 2 3\n".to_vec())).is_err());
    }
}
