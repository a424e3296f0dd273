//! Majority-overlap matching of ground-truth labels to result labels.

use nalgebra::DMatrix;
use crate::{Error, Result};

/// Validate an overlap table against the GT label sizes.
///
/// Every row must belong to one GT label, and no overlap may exceed the
/// size of its GT label.
pub fn validate_overlaps(overlaps: &DMatrix<u64>, gt_sizes: &[u64]) -> Result<()> {
    if overlaps.nrows() != gt_sizes.len() {
        return Err(Error::InvalidConfig(format!(
            "overlap table has {} rows but {} GT sizes were given",
            overlaps.nrows(),
            gt_sizes.len()
        )));
    }
    for (i, &size) in gt_sizes.iter().enumerate() {
        if overlaps.row(i).iter().any(|&v| v > size) {
            return Err(Error::InvalidConfig(format!(
                "overlap of GT row {} exceeds its size {}",
                i, size
            )));
        }
    }
    Ok(())
}

/// Match every GT label (row) to at most one RES label (column).
///
/// A row matches the column with the largest overlap if that overlap covers
/// more than half of the GT label's voxels. Ties go to the lower column
/// index; columns are expected in ascending label order, so the smaller RES
/// label wins.
///
/// # Arguments
/// * `overlaps` - Shared voxel counts (n_gt x n_res)
/// * `gt_sizes` - Voxel count of every GT label
///
/// # Returns
/// For every row, the matched column or None.
pub fn majority_overlap_matches(overlaps: &DMatrix<u64>, gt_sizes: &[u64]) -> Vec<Option<usize>> {
    let n_res = overlaps.ncols();

    (0..overlaps.nrows())
        .map(|i| {
            if n_res == 0 {
                return None;
            }

            let mut best = 0;
            for j in 1..n_res {
                if overlaps[(i, j)] > overlaps[(i, best)] {
                    best = j;
                }
            }

            // strictly more than half, kept in integers
            let shared = overlaps[(i, best)];
            if shared > 0 && 2 * shared > gt_sizes[i] {
                Some(best)
            } else {
                None
            }
        })
        .collect()
}

/// Invert a row-to-column matching: for every column, the rows matched to it.
pub fn matches_per_column(matches: &[Option<usize>], n_cols: usize) -> Vec<Vec<usize>> {
    let mut per_col = vec![Vec::new(); n_cols];
    for (row, m) in matches.iter().enumerate() {
        if let Some(col) = m {
            per_col[*col].push(row);
        }
    }
    per_col
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Test Majority Rule =====

    #[test]
    fn test_clear_majority() {
        let overlaps = DMatrix::from_row_slice(2, 2, &[
            90, 5,
            0, 40,
        ]);
        let matches = majority_overlap_matches(&overlaps, &[100, 50]);
        assert_eq!(matches, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_exactly_half_is_not_a_match() {
        let overlaps = DMatrix::from_row_slice(1, 2, &[50, 50]);
        let matches = majority_overlap_matches(&overlaps, &[100]);
        assert_eq!(matches, vec![None]);

        let overlaps = DMatrix::from_row_slice(1, 1, &[51]);
        assert_eq!(majority_overlap_matches(&overlaps, &[100]), vec![Some(0)]);
    }

    #[test]
    fn test_largest_overlap_wins() {
        // Both columns are examined, the larger one decides
        let overlaps = DMatrix::from_row_slice(1, 3, &[10, 70, 20]);
        assert_eq!(majority_overlap_matches(&overlaps, &[100]), vec![Some(1)]);
    }

    #[test]
    fn test_tie_goes_to_lower_column() {
        // Sizes of 3 with overlap 2 and 2 cannot happen in real data, but the
        // tie-break must still be deterministic.
        let overlaps = DMatrix::from_row_slice(1, 2, &[2, 2]);
        assert_eq!(majority_overlap_matches(&overlaps, &[3]), vec![Some(0)]);
    }

    // ===== Test Many-to-One =====

    #[test]
    fn test_two_rows_share_a_column() {
        // GT 1 (100 voxels) and GT 2 (50 voxels) both lie mostly in RES 1
        let overlaps = DMatrix::from_row_slice(2, 1, &[100, 40]);
        let matches = majority_overlap_matches(&overlaps, &[100, 50]);
        assert_eq!(matches, vec![Some(0), Some(0)]);

        let per_col = matches_per_column(&matches, 1);
        assert_eq!(per_col, vec![vec![0, 1]]);
    }

    // ===== Test Empty Inputs =====

    #[test]
    fn test_no_result_labels() {
        let overlaps: DMatrix<u64> = DMatrix::zeros(2, 0);
        let matches = majority_overlap_matches(&overlaps, &[10, 20]);
        assert_eq!(matches, vec![None, None]);
    }

    #[test]
    fn test_no_gt_labels() {
        let overlaps: DMatrix<u64> = DMatrix::zeros(0, 3);
        assert!(majority_overlap_matches(&overlaps, &[]).is_empty());
        assert_eq!(matches_per_column(&[], 3), vec![Vec::<usize>::new(); 3]);
    }

    // ===== Test Validation =====

    #[test]
    fn test_validate_overlaps() {
        let overlaps = DMatrix::from_row_slice(1, 1, &[5]);
        assert!(validate_overlaps(&overlaps, &[5]).is_ok());
        assert!(validate_overlaps(&overlaps, &[4]).is_err());
        assert!(validate_overlaps(&overlaps, &[5, 6]).is_err());
    }
}
