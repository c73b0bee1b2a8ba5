#![allow(clippy::unwrap_used)]

use assert_approx_eq::assert_approx_eq;
use trend_segments::{
    Category, ClassificationConfig, Direction, Observation, RegressionResult, Segment, analyze,
    compute_masks, regress_segment, regress_segments, segment, select_trends,
};

fn series(points: &[(i32, f64)]) -> Vec<Observation<i32>> {
    points.iter().copied().map(Observation::from).collect()
}

#[test]
fn rising_then_flat_series_breaks_after_the_rise() {
    let s = series(&[
        (1, 1.0),
        (2, 2.0),
        (3, 3.0),
        (4, 4.0),
        (5, 1.0),
        (6, 1.0),
        (7, 1.0),
        (8, 1.0),
        (9, 1.0),
    ]);
    let boundaries = segment(&s, 2);

    assert_eq!(boundaries.first(), Some(&0));
    assert_eq!(boundaries.last(), Some(&8));
    assert!(boundaries.contains(&4));
    assert_eq!(boundaries, vec![0, 4, 6, 8]);
}

#[test]
fn constant_series_flags_every_point_above() {
    let s: Vec<Observation<i32>> = (0..10).map(|i| Observation::new(2000 + i, 5.0)).collect();
    let config = ClassificationConfig::default().with_deviation_coefficient(1.0);
    let masks = compute_masks(&s, &config);

    assert!(masks.get(Category::AboveAverage).unwrap().iter().all(|m| *m));
    assert!(masks.get(Category::DeviationAbove).unwrap().iter().all(|m| *m));
    assert!(!masks.get(Category::BelowAverage).unwrap().iter().any(|m| *m));
    assert!(!masks.get(Category::DeviationBelow).unwrap().iter().any(|m| *m));
}

#[test]
fn two_point_segment_is_exact_and_significant() {
    let s = series(&[(2020, 10.0), (2021, 12.0)]);
    let fit = regress_segment(&s, Segment::new(0, 1)).unwrap();

    assert_eq!(fit.slope, 2.0);
    assert_eq!(fit.p_value, 0.0);
    assert!(fit.is_significant(0.05));

    let trends = select_trends(&[fit], &ClassificationConfig::default());
    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].direction, Direction::Up);
    assert_eq!(trends[0].legend_label.as_deref(), Some("trending up"));
}

#[test]
fn insignificant_segments_are_hidden() {
    let fits: Vec<RegressionResult<f64>> = (0..4)
        .map(|i| RegressionResult {
            segment: Segment::new(i * 3, i * 3 + 3),
            slope: if i % 2 == 0 { 0.4 } else { -0.4 },
            intercept: 0.0,
            std_error: 0.3,
            p_value: 0.2,
            n: 4,
        })
        .collect();
    let config = ClassificationConfig::default().with_show_insignificant(false);

    assert!(select_trends(&fits, &config).is_empty());
}

#[test]
fn warming_then_cooling_series_end_to_end() {
    // 15 years of steady warming followed by 15 years of cooling
    let values: Vec<f64> = (0..30)
        .map(|i| {
            let base = if i < 15 {
                10.0 + 0.5 * i as f64
            } else {
                17.0 - 0.5 * (i - 15) as f64
            };
            base + if i % 2 == 0 { 0.1 } else { -0.1 }
        })
        .collect();
    let s: Vec<Observation<i32>> = values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(1990 + i as i32, *v))
        .collect();
    let config = ClassificationConfig::default().with_min_run_length(3);
    let analysis = analyze(&s, &config).unwrap();

    assert_eq!(analysis.boundaries.first(), Some(&0));
    assert_eq!(analysis.boundaries.last(), Some(&29));
    assert!(analysis.boundaries.len() >= 3);

    let report = regress_segments(&s, &analysis.boundaries);
    assert_eq!(report.results, analysis.regressions);

    let average = analysis.average().unwrap();
    assert_approx_eq!(average, values.iter().sum::<f64>() / 30.0, 1e-9);

    let labelled = analysis
        .trends
        .iter()
        .filter(|t| t.legend_label.is_some())
        .count();
    assert!(labelled <= 3);
    assert!(
        analysis
            .trends
            .iter()
            .any(|t| t.direction == Direction::Down && t.significant)
    );
}
