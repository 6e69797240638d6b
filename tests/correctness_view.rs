//! View composition correctness: aliasing in both directions, slice
//! routing through virtual storage, the broadcast law and the join laws.

use approx::assert_relative_eq;
use polyarray::Array;

fn m2x3() -> Array {
    Array::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
}

#[test]
fn test_slice_aliases_both_directions() {
    let m = m2x3();
    let mut row = m.slice(0).unwrap();

    // Write through the view, read through the root.
    row.set(&[1], 20.0).unwrap();
    assert_eq!(m.get(&[0, 1]).unwrap(), 20.0);

    // Write through the root, read through the view.
    let mut m2 = m.clone();
    m2.set(&[0, 2], 30.0).unwrap();
    assert_eq!(row.get(&[2]).unwrap(), 30.0);
}

#[test]
fn test_sub_array_window() {
    let a = Array::from_fn(&[4, 4], |idx| (idx[0] * 4 + idx[1]) as f64);
    let mut w = a.sub_array(&[1, 1], &[2, 2]).unwrap();
    assert_eq!(w.to_vec(), vec![5.0, 6.0, 9.0, 10.0]);

    w.set(&[0, 0], 50.0).unwrap();
    assert_eq!(a.get(&[1, 1]).unwrap(), 50.0);

    // Out-of-bounds windows are rejected up front.
    assert!(a.sub_array(&[3, 0], &[2, 4]).is_err());
    assert!(a.sub_array(&[0], &[2, 2]).is_err());
}

#[test]
fn test_broadcast_law() {
    // Every leading-index slice of a broadcast view is elementwise equal to
    // the original array.
    let base = m2x3();
    let b = base.broadcast(&[4, 2, 3]).unwrap();
    assert_eq!(b.shape(), &[4, 2, 3]);
    for i in 0..4 {
        assert!(b.slice(i).unwrap().eq_elements(&base));
    }

    // Broadcast views are immutable but still alias the base.
    let mut handle = b.clone();
    assert!(handle.set(&[0, 0, 0], 9.0).is_err());
    let mut base2 = base.clone();
    base2.set(&[0, 0], 9.0).unwrap();
    assert_eq!(b.get(&[3, 0, 0]).unwrap(), 9.0);

    // Trailing dimensions must match exactly.
    assert!(base.broadcast(&[4, 3, 2]).is_err());
    assert!(base.broadcast(&[3]).is_err());
    // The degenerate broadcast is the array itself.
    assert!(base.broadcast(&[2, 3]).unwrap().eq_elements(&base));
}

#[test]
fn test_join_slice_routing() {
    let a = m2x3();
    let b = Array::constant(&[1, 3], 9.0);
    let j = a.join(&b, 0).unwrap();
    assert_eq!(j.shape(), &[3, 3]);

    // Slices route to whichever operand owns the index.
    assert_eq!(j.slice(1).unwrap().to_vec(), vec![4.0, 5.0, 6.0]);
    assert_eq!(j.slice(2).unwrap().to_vec(), vec![9.0, 9.0, 9.0]);

    // Writes route too, and land in the owning operand.
    let mut j2 = j.clone();
    j2.set(&[0, 0], 100.0).unwrap();
    assert_eq!(a.get(&[0, 0]).unwrap(), 100.0);
    // The constant half stays frozen.
    assert!(j2.set(&[2, 0], 1.0).is_err());
}

#[test]
fn test_join_off_dimension() {
    let a = m2x3();
    let j = a.join(&a, 1).unwrap();
    assert_eq!(j.shape(), &[2, 6]);
    assert_eq!(
        j.slice(0).unwrap().to_vec(),
        vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
    );

    // Shapes must agree on every other dimension.
    assert!(a.join(&Array::zeros(&[2, 2, 2]), 0).is_err());
    assert!(a.join(&Array::zeros(&[3, 3]), 1).is_err());
}

#[test]
fn test_join_window_restriction_law() {
    // Windowing a join back to one operand's index range recovers that
    // operand's elements.
    let a = m2x3();
    let b = Array::from_fn(&[4, 3], |idx| -((idx[0] * 3 + idx[1]) as f64));
    let j = a.join(&b, 0).unwrap();

    let front = j.sub_array(&[0, 0], &[2, 3]).unwrap();
    assert!(front.eq_elements(&a));
    let back = j.sub_array(&[2, 0], &[4, 3]).unwrap();
    assert!(back.eq_elements(&b));
}

#[test]
fn test_join_associativity() {
    let a = Array::from_vec(&[1], vec![1.0]).unwrap();
    let b = Array::from_vec(&[2], vec![2.0, 3.0]).unwrap();
    let c = Array::from_vec(&[1], vec![4.0]).unwrap();

    let left = a.join(&b, 0).unwrap().join(&c, 0).unwrap();
    let right = a.join(&b.join(&c, 0).unwrap(), 0).unwrap();
    assert_eq!(left.to_vec(), right.to_vec());
    assert_eq!(left.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_transpose_and_permute() {
    let a = Array::from_fn(&[2, 3, 4], |idx| (idx[0] * 12 + idx[1] * 4 + idx[2]) as f64);
    let p = a.permute_dims(&[2, 0, 1]).unwrap();
    assert_eq!(p.shape(), &[4, 2, 3]);
    assert_eq!(p.get(&[3, 1, 2]).unwrap(), a.get(&[1, 2, 3]).unwrap());

    let t = a.transpose().unwrap();
    assert_eq!(t.shape(), &[4, 3, 2]);
    assert_eq!(t.get(&[3, 2, 1]).unwrap(), a.get(&[1, 2, 3]).unwrap());

    // Rank <= 1 transposes to itself.
    let v = Array::from_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
    assert!(v.transpose().unwrap().eq_elements(&v));

    // Bad permutations are rejected.
    assert!(a.permute_dims(&[0, 0, 1]).is_err());
    assert!(a.permute_dims(&[0, 1]).is_err());

    // transpose_copy detaches from the source.
    let m = m2x3();
    let mut tc = m.transpose_copy().unwrap();
    assert!(!tc.is_view());
    tc.set(&[0, 0], 99.0).unwrap();
    assert_eq!(m.get(&[0, 0]).unwrap(), 1.0);
}

#[test]
fn test_transpose_aliases() {
    let m = m2x3();
    let mut t = m.transpose().unwrap();
    t.set(&[2, 1], 60.0).unwrap();
    assert_eq!(m.get(&[1, 2]).unwrap(), 60.0);
}

#[test]
fn test_reverse_view() {
    let v = Array::from_vec(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut r = v.reverse_view(0).unwrap();
    assert_eq!(r.to_vec(), vec![4.0, 3.0, 2.0, 1.0]);
    r.set(&[0], 40.0).unwrap();
    assert_eq!(v.get(&[3]).unwrap(), 40.0);

    // Reversing twice restores the original order.
    assert!(r.reverse_view(0).unwrap().eq_elements(&v));
}

#[test]
fn test_rotate_view() {
    let v = Array::from_vec(&[5], vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
    let r = v.rotate_view(0, 2).unwrap();
    assert_eq!(r.to_vec(), vec![2.0, 3.0, 4.0, 0.0, 1.0]);

    // Negative shifts rotate the other way, and full turns are identity.
    let l = v.rotate_view(0, -1).unwrap();
    assert_eq!(l.to_vec(), vec![4.0, 0.0, 1.0, 2.0, 3.0]);
    assert!(v.rotate_view(0, 5).unwrap().eq_elements(&v));
    assert!(v.rotate_view(0, -10).unwrap().eq_elements(&v));

    // Rotation is a join of two windows, so it still aliases the source.
    let mut r2 = v.rotate_view(0, 2).unwrap();
    r2.set(&[0], 20.0).unwrap();
    assert_eq!(v.get(&[2]).unwrap(), 20.0);
}

#[test]
fn test_composition_chain() {
    // Stack view kinds and check the result against an index-by-index model.
    let base = Array::from_fn(&[3, 4], |idx| (idx[0] * 4 + idx[1]) as f64);
    let chained = base
        .broadcast(&[2, 3, 4])
        .unwrap()
        .slice(1)
        .unwrap()
        .sub_array(&[1, 0], &[2, 4])
        .unwrap()
        .transpose()
        .unwrap();
    assert_eq!(chained.shape(), &[4, 2]);
    for i in 0..4 {
        for j in 0..2 {
            assert_relative_eq!(
                chained.get(&[i, j]).unwrap(),
                base.get(&[j + 1, i]).unwrap()
            );
        }
    }
}

#[test]
fn test_slice_through_virtual_storage() {
    // Constant slices reduce to smaller constants.
    let c = Array::constant(&[2, 3], 5.0);
    let cs = c.slice(1).unwrap();
    assert_eq!(cs.shape(), &[3]);
    assert_eq!(cs.to_vec(), vec![5.0; 3]);

    // Sparse matrix rows come back as the stored sparse vectors.
    let s = Array::from_vec(&[2, 3], vec![0.0, 2.0, 0.0, 0.0, 0.0, 3.0])
        .unwrap()
        .to_sparse();
    let row = s.slice(1).unwrap();
    assert!(row.is_sparse());
    assert_eq!(row.non_zero_count(), 1);

    // Immutable wrappers slice to immutable slices.
    let f = m2x3().immutable();
    let mut fs = f.slice(0).unwrap();
    assert!(!fs.is_mutable());
    assert!(fs.set(&[0], 1.0).is_err());
}

#[test]
fn test_slice_errors() {
    let m = m2x3();
    assert!(m.slice(2).is_err());
    assert!(m.slice_dim(2, 0).is_err());
    assert!(Array::scalar(1.0).slice(0).is_err());
    assert_eq!(m.slice_count().unwrap(), 2);
    assert!(Array::scalar(1.0).slice_count().is_err());
}

#[test]
fn test_view_writes_reach_sparse_storage() {
    // A rank-0 slice of a mutable sparse vector writes back into the cells.
    let s = Array::from_vec(&[4], vec![0.0, 2.0, 0.0, 3.0])
        .unwrap()
        .to_sparse();
    let mut cell = s.slice(1).unwrap();
    cell.set(&[], 7.0).unwrap();
    assert_eq!(s.get(&[1]).unwrap(), 7.0);
    assert_eq!(s.non_zero_count(), 2);
}

#[test]
fn test_duplicate_detaches_views() {
    let m = m2x3();
    let row = m.slice(0).unwrap();
    let mut dup = row.duplicate();
    dup.set(&[0], 99.0).unwrap();
    assert_eq!(m.get(&[0, 0]).unwrap(), 1.0);
    assert!(!dup.is_view());
}
