use lcmsplot::{
    AddScanOutcome,
    FilterOptions,
    Ion,
    MsLevelFilter,
    ScanAccumulator,
    SeriesBuilder,
    charge_color,
};
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;

fn synthetic_scan(rng: &mut ChaCha8Rng, num_ions: usize) -> Vec<Ion> {
    (0..num_ions)
        .map(|j| Ion::new(100.0 + j as f64, rng.gen_range(1.0..1000.0), 0))
        .collect()
}

#[test]
fn test_near_duplicate_is_centroided_away() {
    let options = FilterOptions::default().with_mz_resolution(0.01);
    let mut acc = ScanAccumulator::new(options).unwrap();
    let outcome = acc
        .add_scan(
            1,
            1,
            0.5,
            &[
                Ion::new(100.0, 50.0, 0),
                Ion::new(100.0005, 80.0, 0),
                Ion::new(105.0, 10.0, 0),
            ],
        )
        .unwrap();

    assert_eq!(
        outcome,
        AddScanOutcome::Added {
            ions_stored: 2,
            trimmed: false
        }
    );
    let scan = acc.get_scan_by_scan_number(1).unwrap();
    let ions: Vec<Ion> = scan.iter_ions().collect();
    assert_eq!(
        ions,
        vec![Ion::new(100.0005, 80.0, 0), Ion::new(105.0, 10.0, 0)]
    );
    assert_eq!(acc.total_cached_points(), 2);
}

#[test]
fn test_streaming_trim_keeps_cache_bounded() {
    let options = FilterOptions::default()
        .with_max_points_to_plot(2000)
        .with_min_points_per_spectrum(10);
    let mut acc = ScanAccumulator::new(options).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for scan_number in 1..=5 {
        let ions = synthetic_scan(&mut rng, 1000);
        acc.add_scan(scan_number, 1, scan_number as f64 * 0.1, &ions)
            .unwrap();
    }
    // 5000 points is below the 5x trigger
    assert_eq!(acc.trim_count(), 0);
    assert_eq!(acc.total_cached_points(), 5000);

    let mut saw_trim = false;
    for scan_number in 6..=50 {
        let ions = synthetic_scan(&mut rng, 1000);
        let outcome = acc
            .add_scan(scan_number, 1, scan_number as f64 * 0.1, &ions)
            .unwrap();
        if let AddScanOutcome::Added { trimmed: true, .. } = outcome {
            saw_trim = true;
        }
        assert!(acc.total_cached_points() <= 10_000);
    }
    assert!(saw_trim);
    assert!(acc.trim_count() >= 1);

    acc.trim_to_target().unwrap();
    assert_eq!(acc.scan_count(), 50);
    assert!(acc.total_cached_points() <= 2000 + 50 * 10);
    for scan in acc.scans() {
        assert!(scan.ion_count() >= 10, "scan {} lost too many ions", scan.scan_number);
        assert!(scan.is_mz_sorted());
    }
    let recount: usize = acc.scans().iter().map(|s| s.ion_count()).sum();
    assert_eq!(recount, acc.total_cached_points());
    assert_eq!(acc.points_cached_after_last_trim(), acc.total_cached_points());
}

#[test]
fn test_empty_scan_is_a_noop() {
    let mut acc = ScanAccumulator::new(FilterOptions::default()).unwrap();
    acc.add_scan(1, 1, 0.1, &[Ion::new(500.0, 10.0, 0)]).unwrap();

    let outcome = acc.add_scan(2, 1, 0.2, &[]).unwrap();
    assert_eq!(outcome, AddScanOutcome::NothingToAdd);
    assert!(!outcome.was_added());
    assert_eq!(acc.scan_count(), 1);
    assert_eq!(acc.total_cached_points(), 1);
}

#[test]
fn test_deisotoped_series_by_charge() {
    let options = FilterOptions::default().with_deisotoped_data(true);
    let mut acc = ScanAccumulator::new(options).unwrap();
    acc.add_scan(
        1,
        1,
        0.1,
        &[
            Ion::new(1000.0, 10.0, 0),
            Ion::new(2000.0, 20.0, 1),
            Ion::new(3000.0, 30.0, 2),
        ],
    )
    .unwrap();
    acc.add_scan(2, 1, 0.2, &[Ion::new(1500.0, 15.0, 1)]).unwrap();

    let plot = SeriesBuilder::new(&acc).build(MsLevelFilter::Exactly(1));
    assert_eq!(plot.series.len(), 3);
    for (charge, series) in plot.series.iter().enumerate() {
        assert_eq!(series.color, Some(charge_color(charge as u8)));
    }
    assert_eq!(plot.series[0].points.len(), 1);
    assert_eq!(plot.series[1].points.len(), 2);
    assert_eq!(plot.series[2].points.len(), 1);
    assert_eq!(plot.points_plotted, 4);
}

#[test]
fn test_low_density_scans_survive_global_trim() {
    let options = FilterOptions::default()
        .with_max_points_to_plot(1_000_000)
        .with_mz_resolution(0.0);
    let mut acc = ScanAccumulator::new(options).unwrap();

    // One dense and bright scan, a few sparse and dim ones
    let dense: Vec<Ion> = (0..5000)
        .map(|i| Ion::new(100.0 + i as f64 * 0.5, 1e6 + i as f64, 0))
        .collect();
    acc.add_scan(1, 1, 0.1, &dense).unwrap();
    for scan_number in 2..=4 {
        let sparse: Vec<Ion> = (0..20)
            .map(|i| Ion::new(200.0 + i as f64, 1.0 + i as f64, 0))
            .collect();
        acc.add_scan(scan_number, 1, 0.1 * scan_number as f64, &sparse)
            .unwrap();
    }

    let summary = acc.trim_cached_data(100, 5).unwrap();
    assert_eq!(summary.scans_floored, 3);
    assert_eq!(acc.get_scan_by_scan_number(1).unwrap().ion_count(), 100);
    for scan_number in 2..=4 {
        let scan = acc.get_scan_by_scan_number(scan_number).unwrap();
        assert_eq!(scan.ion_count(), 5);
        // The most intense ions of the scan are the ones kept
        assert_eq!(scan.intensity(), &[16.0, 17.0, 18.0, 19.0, 20.0]);
    }
    assert_eq!(acc.total_cached_points(), 115);
}

#[test]
fn test_ms2_scans_are_plotted_separately() {
    let mut acc = ScanAccumulator::new(FilterOptions::default()).unwrap();
    acc.add_scan(1, 1, 0.1, &[Ion::new(500.0, 10.0, 0)]).unwrap();
    acc.add_scan(2, 2, 0.2, &[Ion::new(250.0, 5.0, 0), Ion::new(300.0, 6.0, 0)])
        .unwrap();
    acc.add_scan(3, 3, 0.3, &[Ion::new(150.0, 5.0, 0)]).unwrap();

    assert_eq!(acc.ms_levels(), vec![1, 2, 3]);
    assert_eq!(acc.scan_number_range(MsLevelFilter::AtLeast(2)), Some((2, 3)));

    let builder = SeriesBuilder::new(&acc);
    let ms1 = builder.build(MsLevelFilter::Exactly(1));
    let msn = builder.build(MsLevelFilter::AtLeast(2));
    assert_eq!(ms1.points_plotted, 1);
    assert_eq!(msn.points_plotted, 3);
    assert_eq!(msn.title, "MS2 Spectra");
}
