//! Dense per-profile travel matrices.

/// A dense `n x n` matrix stored in row-major order, indexed by location.
///
/// Generalizes the teacher's `DistanceMatrix` (`f64`, single matrix) to the
/// fixed-precision integer durations/distances/costs spec.md §3 requires,
/// one matrix per field.
///
/// # Examples
///
/// ```
/// use vrp_core::models::Matrix;
///
/// let mut m = Matrix::new(2);
/// m.set(0, 1, 100);
/// assert_eq!(m.get(0, 1), 100);
/// assert_eq!(m.get(1, 0), 0);
/// assert_eq!(m.size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    data: Vec<i64>,
    size: usize,
}

impl Matrix {
    /// Creates a matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size * size],
            size,
        }
    }

    /// Builds a matrix from an explicit row-major grid.
    ///
    /// Returns `None` if `data.len() != size * size`.
    pub fn from_data(size: usize, data: Vec<i64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Value at `(from, to)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.data[from * self.size + to]
    }

    /// Sets the value at `(from, to)`.
    pub fn set(&mut self, from: usize, to: usize, value: i64) {
        self.data[from * self.size + to] = value;
    }

    /// Number of locations this matrix covers.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Durations, distances, and an optional explicit cost matrix for one
/// vehicle profile (spec.md §3).
///
/// When `costs` is absent, cost is derived per-vehicle from `durations`,
/// `distances`, and that vehicle's cost parameters (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct ProfileMatrices {
    durations: Matrix,
    distances: Matrix,
    costs: Option<Matrix>,
}

impl ProfileMatrices {
    /// Creates a new per-profile matrix set. Panics if `durations` and
    /// `distances` (and `costs`, if present) don't share the same size.
    pub fn new(durations: Matrix, distances: Matrix, costs: Option<Matrix>) -> Self {
        assert_eq!(durations.size(), distances.size(), "matrix size mismatch");
        if let Some(c) = &costs {
            assert_eq!(durations.size(), c.size(), "matrix size mismatch");
        }
        Self {
            durations,
            distances,
            costs,
        }
    }

    pub fn durations(&self) -> &Matrix {
        &self.durations
    }

    pub fn distances(&self) -> &Matrix {
        &self.distances
    }

    pub fn costs(&self) -> Option<&Matrix> {
        self.costs.as_ref()
    }

    pub fn size(&self) -> usize {
        self.durations.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_get_set() {
        let mut m = Matrix::new(3);
        m.set(0, 2, 42);
        assert_eq!(m.get(0, 2), 42);
        assert_eq!(m.get(2, 0), 0);
    }

    #[test]
    fn test_from_data() {
        let m = Matrix::from_data(2, vec![0, 1, 2, 0]).expect("valid");
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.get(1, 0), 2);
    }

    #[test]
    fn test_from_data_wrong_size() {
        assert!(Matrix::from_data(2, vec![0, 1, 2]).is_none());
    }

    #[test]
    fn test_profile_matrices_no_costs() {
        let durations = Matrix::from_data(2, vec![0, 10, 10, 0]).unwrap();
        let distances = Matrix::from_data(2, vec![0, 100, 100, 0]).unwrap();
        let pm = ProfileMatrices::new(durations, distances, None);
        assert!(pm.costs().is_none());
        assert_eq!(pm.size(), 2);
    }

    #[test]
    #[should_panic(expected = "matrix size mismatch")]
    fn test_profile_matrices_mismatched_sizes_panics() {
        let durations = Matrix::new(2);
        let distances = Matrix::new(3);
        ProfileMatrices::new(durations, distances, None);
    }
}
