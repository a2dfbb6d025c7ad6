//! Integration tests for segeval-rs.
//!
//! These tests run complete evaluations across the collection, method,
//! results and run registry modules.

use approx::assert_relative_eq;
use serde_json::{Map, Value};

use segeval_rs::collection::{LabelType, MediaType, Video};
use segeval_rs::{
    cleanup, delete_evaluation, evaluate_temporal_detections, evaluation_fields,
    load_evaluation_results, Error, EvaluationOptions, InMemoryDataset, InMemoryRunRegistry,
    ResultsDict, RunRegistry, SampleCollection, Segment, TemporalDetectionResults,
};

fn gt(id: &str, label: &str, start: f64, end: f64) -> Segment {
    Segment::new(id, Some(label), start, end).unwrap()
}

fn pred(id: &str, label: &str, start: f64, end: f64, conf: f64) -> Segment {
    gt(id, label, start, end).with_confidence(conf).unwrap()
}

fn add_video(dataset: &mut InMemoryDataset, id: &str, gts: Vec<Segment>, preds: Vec<Segment>) {
    let mut video = Video::new(id);
    video.set_segments("ground_truth", gts);
    video.set_segments("predictions", preds);
    dataset.add_video(video).unwrap();
}

fn single_pair_dataset() -> InMemoryDataset {
    let mut dataset = InMemoryDataset::with_label_fields("ground_truth", "predictions");
    add_video(
        &mut dataset,
        "v0",
        vec![gt("g0", "run", 0.0, 10.0)],
        vec![pred("p0", "run", 1.0, 11.0, 0.9)],
    );
    dataset
}

fn evaluate(
    dataset: &mut InMemoryDataset,
    runs: &mut InMemoryRunRegistry,
    options: &EvaluationOptions,
) -> segeval_rs::Result<TemporalDetectionResults> {
    evaluate_temporal_detections(dataset, runs, "predictions", options)
}

fn keyed(key: &str) -> EvaluationOptions {
    EvaluationOptions {
        eval_key: Some(key.to_string()),
        ..Default::default()
    }
}

// =============================================================================
// Test 1: Complete Evaluation Pipeline
// =============================================================================

#[test]
fn test_integration_pipeline_default_threshold() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();

    let results = evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();

    assert_eq!(results.counts(), (1, 0, 0));
    assert_eq!(results.len(), 1);
    assert_relative_eq!(results.ious()[0].unwrap(), 9.0 / 11.0, epsilon = 1e-10);
    assert_eq!(results.eval_key(), Some("eval"));
    assert_eq!(results.gt_field(), Some("ground_truth"));
    assert_eq!(results.pred_field(), Some("predictions"));

    let video = dataset.video("v0").unwrap();
    assert_eq!(video.int("eval_tp"), Some(1));
    assert_eq!(video.int("eval_fp"), Some(0));
    assert_eq!(video.int("eval_fn"), Some(0));

    let cm = results.confusion_matrix(None, false);
    assert_eq!(cm.get("run", "run"), 1);
    assert_eq!(cm.total(), 1);
}

#[test]
fn test_integration_pipeline_high_threshold() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();
    let options = EvaluationOptions {
        iou: 0.9,
        ..keyed("eval")
    };

    let results = evaluate(&mut dataset, &mut runs, &options).unwrap();

    assert_eq!(results.counts(), (0, 1, 1));
    assert_eq!(results.ytrue_labels(), vec!["(none)", "run"]);
    assert_eq!(results.ypred_labels(), vec!["run", "(none)"]);

    let video = dataset.video("v0").unwrap();
    assert_eq!(video.int("eval_tp"), Some(0));
    assert_eq!(video.int("eval_fp"), Some(1));
    assert_eq!(video.int("eval_fn"), Some(1));
}

// =============================================================================
// Test 2: Empty Collection
// =============================================================================

#[test]
fn test_integration_empty_collection() {
    let mut dataset = InMemoryDataset::with_label_fields("ground_truth", "predictions");
    let mut runs = InMemoryRunRegistry::new();

    let results = evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();

    assert!(results.is_empty());
    assert_eq!(results.counts(), (0, 0, 0));
    for field in ["eval_tp", "eval_fp", "eval_fn"] {
        assert!(dataset.has_field(field), "expected field '{}' to be declared", field);
    }
    assert!(load_evaluation_results(&runs, "eval").unwrap().is_empty());
}

// =============================================================================
// Test 3: Classwise Toggle
// =============================================================================

#[test]
fn test_integration_classwise_toggle() {
    let build = || {
        let mut dataset = InMemoryDataset::with_label_fields("ground_truth", "predictions");
        add_video(
            &mut dataset,
            "v0",
            vec![gt("g0", "run", 0.0, 10.0)],
            vec![pred("p0", "walk", 0.0, 10.0, 0.9)],
        );
        dataset
    };

    let mut dataset = build();
    let mut runs = InMemoryRunRegistry::new();
    let results = evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.counts(), (0, 1, 1));
    assert!(results.ious().iter().all(|iou| iou.is_none()));

    let mut dataset = build();
    let options = EvaluationOptions {
        classwise: false,
        ..keyed("eval")
    };
    let results = evaluate(&mut dataset, &mut runs, &options).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.counts(), (0, 1, 1));
    assert_eq!(results.ious()[0], Some(1.0));

    let (gt_ids, pred_ids) = results.cell_ids("run", "walk");
    assert_eq!(gt_ids, vec!["g0"]);
    assert_eq!(pred_ids, vec!["p0"]);
}

// =============================================================================
// Test 4: Re-run Validation
// =============================================================================

#[test]
fn test_integration_rerun_field_mismatch() {
    let mut dataset = single_pair_dataset();
    dataset.add_label_field("other_predictions", LabelType::TemporalDetections);
    let mut runs = InMemoryRunRegistry::new();

    evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();
    let before = dataset.video("v0").unwrap().clone();

    let result =
        evaluate_temporal_detections(&mut dataset, &mut runs, "other_predictions", &keyed("eval"));

    match result {
        Err(Error::FieldMismatch {
            key,
            field,
            existing,
            requested,
        }) => {
            assert_eq!(key, "eval");
            assert_eq!(field, "pred_field");
            assert_eq!(existing, "predictions");
            assert_eq!(requested, "other_predictions");
        }
        other => panic!("expected FieldMismatch, got {:?}", other),
    }

    assert_eq!(dataset.video("v0").unwrap(), &before);
    assert_eq!(
        runs.get_run_info("eval").unwrap().config.pred_field(),
        "predictions"
    );
}

#[test]
fn test_integration_rerun_same_fields_overwrites() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();

    evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();
    let options = EvaluationOptions {
        iou: 0.9,
        ..keyed("eval")
    };
    evaluate(&mut dataset, &mut runs, &options).unwrap();

    assert_relative_eq!(runs.get_run_info("eval").unwrap().config.iou(), 0.9, epsilon = 1e-10);
    assert_eq!(load_evaluation_results(&runs, "eval").unwrap().counts(), (0, 1, 1));
    assert_eq!(dataset.video("v0").unwrap().int("eval_tp"), Some(0));
}

// =============================================================================
// Test 5: Cleanup
// =============================================================================

#[test]
fn test_integration_cleanup_removes_fields() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();

    evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();

    let config = runs.get_run_info("eval").unwrap().config;
    let fields = evaluation_fields(&dataset, "eval", &config).unwrap();
    assert_eq!(fields.len(), 9);

    cleanup(&mut dataset, "eval", &config).unwrap();

    for field in ["eval_tp", "eval_fp", "eval_fn"] {
        assert!(!dataset.has_field(field));
    }
    let video = dataset.video("v0").unwrap();
    for field in ["ground_truth", "predictions"] {
        let segment = &video.segments(field).unwrap()[0];
        assert!(segment.attribute("eval").is_none());
        assert!(segment.attribute("eval_id").is_none());
        assert!(segment.attribute("eval_iou").is_none());
    }

    // Running again on a cleaned collection only warns
    cleanup(&mut dataset, "eval", &config).unwrap();
}

#[test]
fn test_integration_cleanup_skips_deleted_label_field() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();

    evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();
    dataset
        .delete_fields(&["predictions".to_string()], Default::default())
        .unwrap();

    delete_evaluation(&mut dataset, &mut runs, "eval").unwrap();

    assert!(!dataset.has_field("eval_tp"));
    assert!(dataset.segment_attribute_names("ground_truth").is_empty());
    assert!(runs.keys().is_empty());
}

// =============================================================================
// Test 6: Validation Errors
// =============================================================================

#[test]
fn test_integration_unsupported_method() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();
    let options = EvaluationOptions {
        method: Some("coco".to_string()),
        ..keyed("eval")
    };

    let result = evaluate(&mut dataset, &mut runs, &options);

    assert!(matches!(result, Err(Error::UnsupportedMethod(name)) if name == "coco"));
    assert!(!dataset.has_field("eval_tp"));
    assert!(runs.get_run_info("eval").is_none());
}

#[test]
fn test_integration_unknown_option() {
    let mut dataset = single_pair_dataset();
    let mut runs = InMemoryRunRegistry::new();
    let mut extra = Map::new();
    extra.insert("compute_map".to_string(), Value::from(true));
    let options = EvaluationOptions {
        options: extra,
        ..keyed("eval")
    };

    let result = evaluate(&mut dataset, &mut runs, &options);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_integration_non_video_collection() {
    let mut dataset = InMemoryDataset::new(MediaType::Image);
    dataset.add_label_field("ground_truth", LabelType::TemporalDetections);
    dataset.add_label_field("predictions", LabelType::TemporalDetections);
    let mut runs = InMemoryRunRegistry::new();

    let result = evaluate(&mut dataset, &mut runs, &keyed("eval"));

    assert!(matches!(result, Err(Error::NotVideoCollection(media)) if media == "image"));
    assert!(runs.is_empty());
}

// =============================================================================
// Test 7: Results Persistence
// =============================================================================

#[test]
fn test_integration_results_round_trip() {
    let mut dataset = InMemoryDataset::with_label_fields("ground_truth", "predictions");
    add_video(
        &mut dataset,
        "v0",
        vec![gt("g0", "run", 0.0, 10.0), gt("g1", "walk", 20.0, 30.0)],
        vec![
            pred("p0", "run", 0.5, 10.0, 0.8),
            pred("p1", "jump", 40.0, 45.0, 0.2),
        ],
    );
    add_video(&mut dataset, "v1", vec![gt("g2", "run", 0.0, 5.0)], vec![]);
    let mut runs = InMemoryRunRegistry::new();

    let results = evaluate(&mut dataset, &mut runs, &keyed("eval")).unwrap();
    assert_eq!(results.counts(), (1, 1, 2));

    let loaded = load_evaluation_results(&runs, "eval").unwrap();
    assert_eq!(loaded, results);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eval.json");
    results.to_dict().write_json(&path).unwrap();
    let from_file =
        TemporalDetectionResults::from_dict(ResultsDict::read_json(&path).unwrap()).unwrap();

    assert_eq!(from_file.ytrue(), results.ytrue());
    assert_eq!(from_file.ypred(), results.ypred());
    assert_eq!(from_file.ytrue_ids(), results.ytrue_ids());
    assert_eq!(from_file.ypred_ids(), results.ypred_ids());
    for (a, b) in from_file.ious().iter().zip(results.ious()) {
        match (a, b) {
            (Some(a), Some(b)) => assert_relative_eq!(*a, *b, epsilon = 1e-12),
            _ => assert_eq!(a, b),
        }
    }
    assert_eq!(from_file.classes(), results.classes());
    assert_eq!(from_file.counts(), results.counts());
    assert_eq!(from_file.report(None).to_string(), results.report(None).to_string());
}
