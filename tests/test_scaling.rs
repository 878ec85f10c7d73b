use assert_approx_eq::assert_approx_eq;
use traffic_forecast::scaling::MinMaxScaler;
use traffic_forecast::TrafficError;

#[test]
fn test_endpoints_map_exactly() {
    let values = vec![40.0, 10.0, 25.0, 90.0, 60.0];
    let scaler = MinMaxScaler::fit(&values, (0.0, 1.0)).unwrap();

    let scaled = scaler.transform(&values);
    assert_eq!(scaled[1], 0.0); // series minimum
    assert_eq!(scaled[3], 1.0); // series maximum
    assert!(scaled.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_round_trip() {
    let values = vec![12.0, 48.0, 7.5, 101.25, 63.0, 7.5];
    let scaler = MinMaxScaler::fit(&values, (0.0, 1.0)).unwrap();

    let scaled = scaler.transform(&values);
    let recovered = scaler.inverse_transform(&scaled);

    for (original, recovered) in values.iter().zip(recovered.iter()) {
        assert_approx_eq!(original, recovered, 1e-9);
    }
}

#[test]
fn test_custom_feature_range() {
    let values = vec![0.0, 50.0, 100.0];
    let scaler = MinMaxScaler::fit(&values, (-1.0, 1.0)).unwrap();

    let scaled = scaler.transform(&values);
    assert_approx_eq!(scaled[0], -1.0);
    assert_approx_eq!(scaled[1], 0.0);
    assert_approx_eq!(scaled[2], 1.0);

    assert_approx_eq!(scaler.inverse_value(0.0), 50.0);
}

#[test]
fn test_fit_parameters_observed() {
    let values = vec![3.0, 9.0, 6.0];
    let scaler = MinMaxScaler::fit(&values, (0.0, 1.0)).unwrap();
    assert_eq!(scaler.data_min(), 3.0);
    assert_eq!(scaler.data_max(), 9.0);
}

#[test]
fn test_degenerate_series_rejected() {
    let values = vec![42.0; 10];
    let result = MinMaxScaler::fit(&values, (0.0, 1.0));
    assert!(matches!(result, Err(TrafficError::DegenerateSeries(_))));
}

#[test]
fn test_empty_series_rejected() {
    let result = MinMaxScaler::fit(&[], (0.0, 1.0));
    assert!(matches!(result, Err(TrafficError::DataError(_))));
}

#[test]
fn test_invalid_range_rejected() {
    let values = vec![1.0, 2.0];
    let result = MinMaxScaler::fit(&values, (1.0, 0.0));
    assert!(matches!(result, Err(TrafficError::InvalidParameter(_))));
}

#[test]
fn test_non_finite_values_rejected() {
    let values = vec![1.0, f64::NAN, 2.0];
    let result = MinMaxScaler::fit(&values, (0.0, 1.0));
    assert!(result.is_err());
}
