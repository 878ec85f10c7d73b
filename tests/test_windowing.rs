use pretty_assertions::assert_eq;
use traffic_forecast::windowing::WindowSet;
use traffic_forecast::TrafficError;

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

#[test]
fn test_window_count_and_targets() {
    let series = ramp(10);
    let windows = WindowSet::build(&series, 3).unwrap();

    assert_eq!(windows.len(), 7);
    assert_eq!(windows.window_len(), 3);

    for i in 0..windows.len() {
        assert_eq!(windows.histories()[i], series[i..i + 3].to_vec());
        assert_eq!(windows.targets()[i], series[i + 3]);
    }
}

#[test]
fn test_single_window() {
    let series = ramp(4);
    let windows = WindowSet::build(&series, 3).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows.histories()[0], vec![0.0, 1.0, 2.0]);
    assert_eq!(windows.targets()[0], 3.0);
}

#[test]
fn test_series_too_short() {
    // n == L cannot produce a window either: there is no target left
    let series = ramp(3);
    let result = WindowSet::build(&series, 3);
    assert!(matches!(
        result,
        Err(TrafficError::InsufficientSeriesLength(_))
    ));

    let result = WindowSet::build(&[], 3);
    assert!(matches!(
        result,
        Err(TrafficError::InsufficientSeriesLength(_))
    ));
}

#[test]
fn test_zero_window_length_rejected() {
    let series = ramp(5);
    let result = WindowSet::build(&series, 0);
    assert!(matches!(result, Err(TrafficError::InvalidParameter(_))));
}

#[test]
fn test_split_boundary_and_order() {
    let series = ramp(13);
    let windows = WindowSet::build(&series, 3).unwrap(); // 10 windows

    let (train, test, boundary) = windows.split(0.8).unwrap();
    assert_eq!(boundary, 8);
    assert_eq!(train.len(), 8);
    assert_eq!(test.len(), 2);

    // Every test window index is >= every training window index: the train
    // targets are exactly the first `boundary` targets, in order
    assert_eq!(train.targets(), &windows.targets()[..boundary]);
    assert_eq!(test.targets(), &windows.targets()[boundary..]);
    assert_eq!(train.histories(), &windows.histories()[..boundary]);
    assert_eq!(test.histories(), &windows.histories()[boundary..]);
}

#[test]
fn test_split_boundary_floors() {
    let series = ramp(8);
    let windows = WindowSet::build(&series, 3).unwrap(); // 5 windows

    // floor(0.8 * 5) = 4
    let (train, test, boundary) = windows.split(0.8).unwrap();
    assert_eq!(boundary, 4);
    assert_eq!(train.len(), 4);
    assert_eq!(test.len(), 1);
}

#[test]
fn test_split_fraction_validation() {
    let series = ramp(10);
    let windows = WindowSet::build(&series, 3).unwrap();

    assert!(matches!(
        windows.split(0.0),
        Err(TrafficError::InvalidParameter(_))
    ));
    assert!(matches!(
        windows.split(1.0),
        Err(TrafficError::InvalidParameter(_))
    ));
    assert!(matches!(
        windows.split(-0.2),
        Err(TrafficError::InvalidParameter(_))
    ));
}
