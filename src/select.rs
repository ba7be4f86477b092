/// Pick which associations get a subplot.
///
/// Three or fewer: all of them.  More than three: the first, the middle
/// (`round(n / 2)`, halves rounded away from zero) and the last.
pub fn association_indices(n_associations: usize) -> Vec<usize> {
    if n_associations <= 3 {
        return (0..n_associations).collect();
    }
    let mid = (n_associations as f64 / 2.0).round() as usize;
    vec![0, mid, n_associations - 1]
}
