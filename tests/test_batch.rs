mod common;
use common::*;

use image::RgbaImage;
use markscan::{BatchExecutor, Frame};
use std::sync::Arc;

fn frames() -> Vec<Frame> {
    let (row, _) = answer_row(4, 30, 20);
    vec![
        Frame::new("filled", sheet_with_filled_square()),
        Frame::new("outline", sheet_with_outline_square()),
        Frame::new("blank", blank_sheet(64, 64)),
        Frame::new("row", row),
    ]
}

#[test]
fn outcomes_keep_input_order() -> anyhow::Result<()> {
    let detector = Arc::new(SquareDetector::with_default_engine(DetectionConfig::threshold_preset())?);
    let outcomes = BatchExecutor::new(detector, 3).execute(frames());

    let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["filled", "outline", "blank", "row"]);

    let totals: Vec<usize> = outcomes
        .iter()
        .map(|o| o.output.as_ref().map(|out| out.result.total).unwrap_or(usize::MAX))
        .collect();
    assert_eq!(totals, vec![1, 1, 0, 4]);
    Ok(())
}

#[test]
fn worker_count_does_not_change_results() -> anyhow::Result<()> {
    let detector = Arc::new(SquareDetector::with_default_engine(DetectionConfig::default())?);

    let single = BatchExecutor::new(Arc::clone(&detector), 1).execute(frames());
    let parallel = BatchExecutor::new(detector, 4).execute(frames());

    assert_eq!(single.len(), parallel.len());
    for (a, b) in single.iter().zip(&parallel) {
        let a = a.output.as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
        let b = b.output.as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(a.result, b.result);
        assert_eq!(a.annotated, b.annotated);
    }
    Ok(())
}

#[test]
fn failed_frame_does_not_stop_the_batch() -> anyhow::Result<()> {
    let detector = Arc::new(SquareDetector::with_default_engine(DetectionConfig::threshold_preset())?);
    let batch = vec![
        Frame::new("ok-1", sheet_with_filled_square()),
        Frame::new("empty", RgbaImage::new(0, 0)),
        Frame::new("ok-2", sheet_with_outline_square()),
    ];

    let outcomes = BatchExecutor::new(detector, 2).execute(batch);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].output.is_ok());
    assert!(matches!(outcomes[1].output, Err(DetectionError::InvalidInput(_))));
    assert!(outcomes[2].output.is_ok());
    Ok(())
}

#[test]
fn empty_batch() -> anyhow::Result<()> {
    let detector = Arc::new(SquareDetector::with_default_engine(DetectionConfig::default())?);
    assert!(BatchExecutor::new(detector, 0).execute(Vec::new()).is_empty());
    Ok(())
}
