use std::fmt::Display;

use crate::errors::Result;
use crate::scan::ScanRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TakenState {
    Untaken,
    Suppressed,
    Kept,
}

/// Summary of the centroiding of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CentroidSummary {
    pub initial_points: usize,
    pub final_points: usize,
}

impl Display for CentroidSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Centroided {} -> {} points",
            self.initial_points, self.final_points
        )
    }
}

/// Returns true if any two adjacent m/z values are closer than `tolerance`.
///
/// `mz` must be sorted ascending.
pub fn needs_centroiding(mz: &[f64], tolerance: f64) -> bool {
    if tolerance <= 0.0 {
        return false;
    }
    mz.windows(2).any(|w| w[1] - w[0] < tolerance)
}

/// Buffer that gets re-used between scans to store the intermediates
/// of the centroiding.
///
/// Centroiding here is a greedy highest-intensity-wins sweep: points are
/// visited in decreasing intensity and every not-yet-visited neighbor closer
/// than the tolerance (in m/z) is suppressed. The result never contains two
/// points closer than the tolerance, and applying it twice is the same as
/// applying it once.
///
/// Ties in intensity are resolved by a stable ascending sort processed from
/// the end, so the point with the higher m/z is visited first.
#[derive(Debug, Clone)]
pub struct Centroider {
    tolerance: f64,
    order: Vec<usize>,
    state: Vec<TakenState>,
    keep: Vec<bool>,
}

impl Centroider {
    pub fn new(tolerance: f64) -> Self {
        Self::with_capacity(0, tolerance)
    }

    pub fn with_capacity(capacity: usize, tolerance: f64) -> Self {
        Self {
            tolerance,
            order: Vec::with_capacity(capacity),
            state: Vec::with_capacity(capacity),
            keep: Vec::with_capacity(capacity),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn clear(&mut self) {
        self.order.clear();
        self.state.clear();
        self.keep.clear();
    }

    fn set_order(&mut self, intensity: &[f64]) {
        self.order.extend(0..intensity.len());
        // Stable, so equal intensities keep their m/z order
        self.order
            .sort_by(|&a, &b| intensity[a].total_cmp(&intensity[b]));
    }

    fn sweep(&mut self, mz: &[f64]) {
        let n = mz.len();
        let tol = self.tolerance;
        self.state.resize(n, TakenState::Untaken);

        for &idx in self.order.iter().rev() {
            if self.state[idx] != TakenState::Untaken {
                continue;
            }
            self.state[idx] = TakenState::Kept;
            let center = mz[idx];

            for j in (0..idx).rev() {
                if center - mz[j] >= tol {
                    break;
                }
                if self.state[j] == TakenState::Untaken {
                    self.state[j] = TakenState::Suppressed;
                }
            }

            for j in (idx + 1)..n {
                if mz[j] - center >= tol {
                    break;
                }
                if self.state[j] == TakenState::Untaken {
                    self.state[j] = TakenState::Suppressed;
                }
            }
        }
    }

    /// Centroids the scan in place. A no-op when the tolerance is <= 0.
    ///
    /// The scan must be sorted by m/z, surviving points keep their order.
    pub fn centroid_scan(&mut self, scan: &mut ScanRecord) -> Result<CentroidSummary> {
        let initial_points = scan.ion_count();
        if self.tolerance <= 0.0 || initial_points < 2 {
            return Ok(CentroidSummary {
                initial_points,
                final_points: initial_points,
            });
        }

        debug_assert!(scan.is_mz_sorted(), "mz array is not sorted");

        self.clear();
        self.set_order(scan.intensity());
        self.sweep(scan.mz());

        self.keep
            .extend(self.state.iter().map(|s| *s == TakenState::Kept));
        let final_points = scan.retain_marked(&self.keep)?;

        Ok(CentroidSummary {
            initial_points,
            final_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Ion;

    fn scan_of(ions: &[(f64, f64)]) -> ScanRecord {
        let ions: Vec<Ion> = ions.iter().map(|(mz, i)| Ion::new(*mz, *i, 0)).collect();
        ScanRecord::from_ions(1, 1, 0.0, &ions)
    }

    #[test]
    fn test_suppresses_lower_neighbor() {
        let mut scan = scan_of(&[(100.0, 50.0), (100.0005, 80.0), (105.0, 10.0)]);
        let mut centroider = Centroider::new(0.01);
        let summary = centroider.centroid_scan(&mut scan).unwrap();
        assert_eq!(summary.final_points, 2);
        assert_eq!(scan.mz(), &[100.0005, 105.0]);
        assert_eq!(scan.intensity(), &[80.0, 10.0]);
    }

    #[test]
    fn test_zero_tolerance_is_noop() {
        let mut scan = scan_of(&[(100.0, 50.0), (100.0005, 80.0)]);
        let mut centroider = Centroider::new(0.0);
        let summary = centroider.centroid_scan(&mut scan).unwrap();
        assert_eq!(summary.initial_points, summary.final_points);
        assert_eq!(scan.ion_count(), 2);
    }

    #[test]
    fn test_chain_is_not_transitive() {
        // 100.0 wins, suppresses 100.3 but 100.6 is out of its reach
        let mut scan = scan_of(&[(100.0, 90.0), (100.3, 50.0), (100.6, 40.0)]);
        let mut centroider = Centroider::new(0.4);
        centroider.centroid_scan(&mut scan).unwrap();
        assert_eq!(scan.mz(), &[100.0, 100.6]);
    }

    #[test]
    fn test_equal_intensity_prefers_higher_mz() {
        let mut scan = scan_of(&[(200.0, 10.0), (200.1, 10.0)]);
        let mut centroider = Centroider::new(0.5);
        centroider.centroid_scan(&mut scan).unwrap();
        assert_eq!(scan.mz(), &[200.1]);
    }

    #[test]
    fn test_buffers_are_reused() {
        let mut centroider = Centroider::with_capacity(8, 1.0);
        let mut first = scan_of(&[(1.0, 1.0), (1.5, 2.0), (5.0, 1.0)]);
        let mut second = scan_of(&[(10.0, 3.0), (10.2, 1.0)]);
        centroider.centroid_scan(&mut first).unwrap();
        centroider.centroid_scan(&mut second).unwrap();
        assert_eq!(first.mz(), &[1.5, 5.0]);
        assert_eq!(second.mz(), &[10.0]);
    }

    #[test]
    fn test_needs_centroiding() {
        assert!(needs_centroiding(&[1.0, 1.05, 3.0], 0.1));
        assert!(!needs_centroiding(&[1.0, 1.5, 3.0], 0.1));
        assert!(!needs_centroiding(&[1.0, 1.0], 0.0));
    }
}
