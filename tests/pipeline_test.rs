//! Library-level flow: load, train, persist, serve

mod common;

use bookcast::artifact::ModelArtifact;
use bookcast::data::schema::{AVERAGE_RATING, GENRE, GROSS_SALES, LABEL, RATING_COUNT};
use bookcast::data::{read_table, LoadOptions};
use bookcast::decision::Threshold;
use bookcast::service::ScoringService;
use bookcast::training::{train, TrainConfig};
use bookcast::Error;
use std::sync::Arc;

fn books(n: usize) -> bookcast::data::Table {
    read_table(common::books_csv(n).as_bytes(), &LoadOptions::default()).unwrap()
}

#[test]
fn test_train_save_load_serve() {
    let table = books(40);
    let config = TrainConfig::default();
    let result = train(&table, &config).unwrap();
    assert_eq!(result.n_train + result.n_test, 40);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.bin");
    ModelArtifact::from_training(&result, &config)
        .save(&path)
        .unwrap();

    let service = ScoringService::load(&path).unwrap();
    let expected = result.pipeline.predict_proba(&table).unwrap();
    let batch = service.score_batch(&table, Threshold::DEFAULT).unwrap();
    assert_eq!(batch.probabilities, expected);

    // Single-record scoring agrees with the batch path
    let record = table.row(3);
    let single = service.score_one(&record).unwrap();
    assert!((single - expected[3]).abs() < 1e-12);
}

#[test]
fn test_threshold_only_changes_decisions() {
    let table = books(30);
    let result = train(&table, &TrainConfig::default()).unwrap();
    let service = ScoringService::from_pipeline(result.pipeline).unwrap();

    let low = service.score_batch(&table, Threshold::new(0.1).unwrap()).unwrap();
    let high = service.score_batch(&table, Threshold::new(0.9).unwrap()).unwrap();
    assert_eq!(low.probabilities, high.probabilities);

    let positives = |labels: &[u8]| labels.iter().filter(|&&l| l == 1).count();
    assert!(positives(&low.predictions) >= positives(&high.predictions));

    let low_eval = low.evaluation.unwrap();
    let high_eval = high.evaluation.unwrap();
    assert!(low_eval.recall >= high_eval.recall);
    assert_eq!(low_eval.roc_auc, high_eval.roc_auc);
}

#[test]
fn test_unseen_categories_score_without_error() {
    let table = books(30);
    let result = train(&table, &TrainConfig::default()).unwrap();
    let service = ScoringService::from_pipeline(result.pipeline).unwrap();

    let mut record = table.row(0);
    record.set(GENRE, "Space Western");
    let p = service.score_one(&record).unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[test]
fn test_non_finite_inputs_score_like_missing_values() {
    let table = books(40);
    let result = train(&table, &TrainConfig::default()).unwrap();
    let service = ScoringService::from_pipeline(result.pipeline).unwrap();

    let mut missing = table.row(5);
    missing.set(AVERAGE_RATING, bookcast::data::Value::Null);
    let expected = service.score_one(&missing).unwrap();

    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut record = table.row(5);
        record.set(AVERAGE_RATING, bad);
        let p = service.score_one(&record).unwrap();
        assert!(p > 0.0 && p < 1.0, "{bad} scored {p}");
        assert_eq!(p, expected, "{bad} should impute like a missing value");

        let prediction = service
            .predict(&record, Threshold::new(0.0).unwrap())
            .unwrap();
        assert!(prediction.adapted, "threshold 0 accepts every book");
    }

    let mut record = table.row(6);
    record.set(RATING_COUNT, f64::NAN);
    record.set(GROSS_SALES, f64::INFINITY);
    assert!(service.score_one(&record).unwrap().is_finite());
}

#[test]
fn test_empty_service_reports_missing_model() {
    let service = ScoringService::new();
    let table = books(4);
    let err = service.score_one(&table.row(0)).unwrap_err();
    assert!(matches!(err, Error::MissingModel(_)));
    assert!(matches!(
        service.score_batch(&table, Threshold::DEFAULT),
        Err(Error::MissingModel(_))
    ));
}

#[test]
fn test_service_shared_across_threads() {
    let table = Arc::new(books(30));
    let result = train(&table, &TrainConfig::default()).unwrap();
    let service = ScoringService::from_pipeline(result.pipeline).unwrap();
    let expected = service.score_batch(&table, Threshold::DEFAULT).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            let table = Arc::clone(&table);
            std::thread::spawn(move || service.score_batch(&table, Threshold::DEFAULT).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().probabilities, expected.probabilities);
    }
}

#[test]
fn test_training_requires_label() {
    let table = read_table(
        common::unlabeled_csv(10).as_bytes(),
        &LoadOptions::default(),
    )
    .unwrap();
    assert!(!table.has_column(LABEL));
    assert!(matches!(
        train(&table, &TrainConfig::default()),
        Err(Error::Schema(_))
    ));
}
