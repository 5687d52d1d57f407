use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    LcmsPlotError,
    Result,
};

/// Configuration for a single accumulation session.
///
/// Immutable once handed to a [crate::ScanAccumulator]. Any field missing
/// from a serialized config falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Target number of points kept in the cache (and thus plotted).
    /// The cache is allowed to grow to 5x this value before a trim pass.
    pub max_points_to_plot: usize,
    /// Scans with this many ions or fewer are never trimmed, and trimmed
    /// scans never go below this many ions.
    pub min_points_per_spectrum: usize,
    /// Centroiding tolerance in m/z units, 0 disables centroiding.
    pub mz_resolution: f64,
    /// Ions below this intensity are dropped when a scan is added.
    pub min_intensity: f64,
    /// When set the m/z slot holds monoisotopic masses and plots are
    /// partitioned by charge state.
    pub plotting_deisotoped_data: bool,
    /// Upper bound of the mass axis in deisotoped plots.
    pub max_mono_mass_for_deisotoped_plot: f64,
    /// Start the scan axis at the lowest observed scan instead of 0.
    pub use_observed_min_scan: bool,
    pub ms1_plot_title: String,
    pub ms2_plot_title: String,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_points_to_plot: 200_000,
            min_points_per_spectrum: 2,
            mz_resolution: 0.4,
            min_intensity: 0.0,
            plotting_deisotoped_data: false,
            max_mono_mass_for_deisotoped_plot: 12_000.0,
            use_observed_min_scan: false,
            ms1_plot_title: "MS Spectra".to_string(),
            ms2_plot_title: "MS2 Spectra".to_string(),
        }
    }
}

impl FilterOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_points_to_plot == 0 {
            return Err(LcmsPlotError::InvalidOptions(
                "max_points_to_plot must be > 0".to_string(),
            ));
        }
        if !(self.mz_resolution >= 0.0) || !self.mz_resolution.is_finite() {
            return Err(LcmsPlotError::InvalidOptions(format!(
                "mz_resolution must be finite and >= 0, got {}",
                self.mz_resolution
            )));
        }
        if !(self.min_intensity >= 0.0) || !self.min_intensity.is_finite() {
            return Err(LcmsPlotError::InvalidOptions(format!(
                "min_intensity must be finite and >= 0, got {}",
                self.min_intensity
            )));
        }
        if !(self.max_mono_mass_for_deisotoped_plot > 0.0) {
            return Err(LcmsPlotError::InvalidOptions(format!(
                "max_mono_mass_for_deisotoped_plot must be > 0, got {}",
                self.max_mono_mass_for_deisotoped_plot
            )));
        }
        Ok(())
    }

    pub fn with_max_points_to_plot(mut self, max_points_to_plot: usize) -> Self {
        self.max_points_to_plot = max_points_to_plot;
        self
    }

    pub fn with_min_points_per_spectrum(mut self, min_points_per_spectrum: usize) -> Self {
        self.min_points_per_spectrum = min_points_per_spectrum;
        self
    }

    pub fn with_mz_resolution(mut self, mz_resolution: f64) -> Self {
        self.mz_resolution = mz_resolution;
        self
    }

    pub fn with_min_intensity(mut self, min_intensity: f64) -> Self {
        self.min_intensity = min_intensity;
        self
    }

    pub fn with_deisotoped_data(mut self, plotting_deisotoped_data: bool) -> Self {
        self.plotting_deisotoped_data = plotting_deisotoped_data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        FilterOptions::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: FilterOptions =
            serde_json::from_str(r#"{"max_points_to_plot": 1000, "mz_resolution": 0.0}"#).unwrap();
        assert_eq!(opts.max_points_to_plot, 1000);
        assert_eq!(opts.mz_resolution, 0.0);
        assert_eq!(opts.min_points_per_spectrum, 2);
        assert_eq!(opts.ms2_plot_title, "MS2 Spectra");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(
            FilterOptions::default()
                .with_max_points_to_plot(0)
                .validate()
                .is_err()
        );
        assert!(
            FilterOptions::default()
                .with_mz_resolution(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            FilterOptions::default()
                .with_min_intensity(-1.0)
                .validate()
                .is_err()
        );
    }
}
