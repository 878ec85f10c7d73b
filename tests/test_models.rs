use traffic_forecast::models::{
    LstmConfig, LstmModel, PersistenceModel, SequenceModel, TrainedSequenceModel,
};
use traffic_forecast::windowing::WindowSet;
use traffic_forecast::TrafficError;

fn sine_series(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
        .collect()
}

fn small_lstm_config() -> LstmConfig {
    LstmConfig {
        hidden_size: 8,
        dense_size: 4,
        epochs: 2,
        batch_size: 8,
        learning_rate: 0.01,
        dropout: 0.2,
        seed: 7,
    }
}

#[test]
fn test_persistence_predicts_last_value() {
    let series = sine_series(20);
    let windows = WindowSet::build(&series, 5).unwrap();

    let model = PersistenceModel::new();
    let trained = model.fit(windows.histories(), windows.targets()).unwrap();

    let predictions = trained.predict(windows.histories()).unwrap();
    assert_eq!(predictions.len(), windows.len());
    for (history, prediction) in windows.histories().iter().zip(predictions.iter()) {
        assert_eq!(*prediction, *history.last().unwrap());
    }
}

#[test]
fn test_persistence_rejects_mismatched_training_data() {
    let model = PersistenceModel::new();
    let result = model.fit(&[vec![0.1, 0.2]], &[0.3, 0.4]);
    assert!(matches!(result, Err(TrafficError::ModelFitFailure(_))));

    let result = model.fit(&[], &[]);
    assert!(matches!(result, Err(TrafficError::ModelFitFailure(_))));
}

#[test]
fn test_persistence_rejects_empty_history() {
    let model = PersistenceModel::new();
    let trained = model.fit(&[vec![0.1]], &[0.2]).unwrap();
    let result = trained.predict(&[Vec::new()]);
    assert!(matches!(result, Err(TrafficError::ModelPredictFailure(_))));
}

#[test]
fn test_lstm_fit_and_predict() {
    let series = sine_series(40);
    let windows = WindowSet::build(&series, 6).unwrap();
    let (train, test, _boundary) = windows.split(0.8).unwrap();

    let model = LstmModel::new(small_lstm_config()).unwrap();
    let trained = model.fit(train.histories(), train.targets()).unwrap();

    let predictions = trained.predict(test.histories()).unwrap();
    assert_eq!(predictions.len(), test.len());
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn test_lstm_loss_history_length() {
    let series = sine_series(30);
    let windows = WindowSet::build(&series, 5).unwrap();

    let config = small_lstm_config();
    let model = LstmModel::new(config.clone()).unwrap();
    let trained = model.fit(windows.histories(), windows.targets()).unwrap();

    let losses = trained.loss_history();
    assert_eq!(losses.len(), config.epochs);
    assert!(losses.iter().all(|l| l.is_finite() && *l >= 0.0));
}

#[test]
fn test_lstm_deterministic_under_fixed_seed() {
    let series = sine_series(30);
    let windows = WindowSet::build(&series, 5).unwrap();
    let (train, test, _) = windows.split(0.8).unwrap();

    let model = LstmModel::new(small_lstm_config()).unwrap();

    let first = model.fit(train.histories(), train.targets()).unwrap();
    let second = model.fit(train.histories(), train.targets()).unwrap();

    let predictions_first = first.predict(test.histories()).unwrap();
    let predictions_second = second.predict(test.histories()).unwrap();
    assert_eq!(predictions_first, predictions_second);
}

#[test]
fn test_lstm_config_validation() {
    let mut config = small_lstm_config();
    config.dropout = 1.0;
    assert!(matches!(
        LstmModel::new(config),
        Err(TrafficError::InvalidParameter(_))
    ));

    let mut config = small_lstm_config();
    config.hidden_size = 0;
    assert!(LstmModel::new(config).is_err());

    let mut config = small_lstm_config();
    config.learning_rate = 0.0;
    assert!(LstmModel::new(config).is_err());

    let mut config = small_lstm_config();
    config.epochs = 0;
    assert!(LstmModel::new(config).is_err());
}

#[test]
fn test_lstm_rejects_bad_training_data() {
    let model = LstmModel::new(small_lstm_config()).unwrap();

    let result = model.fit(&[], &[]);
    assert!(matches!(result, Err(TrafficError::ModelFitFailure(_))));

    let result = model.fit(&[vec![0.1, 0.2]], &[0.3, 0.4]);
    assert!(matches!(result, Err(TrafficError::ModelFitFailure(_))));

    let result = model.fit(&[Vec::new()], &[0.3]);
    assert!(matches!(result, Err(TrafficError::ModelFitFailure(_))));
}

#[test]
fn test_model_names() {
    let lstm = LstmModel::with_defaults().unwrap();
    assert!(lstm.name().starts_with("LSTM"));

    let baseline = PersistenceModel::new();
    assert_eq!(baseline.name(), "Persistence");
}
