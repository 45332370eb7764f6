// ============================================================
// Layer 6 — Training Curve
// ============================================================
// Renders the training history as a two-panel chart:
//
//   ┌──────────────────────┬──────────────────────┐
//   │ train / eval loss    │ eval accuracy        │
//   │ per epoch            │ per epoch            │
//   └──────────────────────┴──────────────────────┘
//
// The output format follows the file extension: `.png` is
// rasterised, anything else is written as SVG.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{PipelineError, Result};
use crate::infra::metrics::{EpochMetrics, TrainingHistory};

const SIZE: (u32, u32) = (1200, 500);

pub fn render_training_curve(history: &TrainingHistory, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    let drawn = if is_png {
        draw(BitMapBackend::new(path, SIZE).into_drawing_area(), history)
    } else {
        draw(SVGBackend::new(path, SIZE).into_drawing_area(), history)
    };
    drawn.map_err(|e| {
        PipelineError::Io(std::io::Error::other(format!(
            "cannot render training curve '{}': {e}",
            path.display()
        )))
    })?;

    tracing::info!(path = %path.display(), "Saved training curve");
    Ok(())
}

fn draw<DB>(root: DrawingArea<DB, plotters::coord::Shift>, history: &TrainingHistory) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (left, right) = root.split_horizontally((SIZE.0 / 2) as i32);

    let n = history.len().max(1) as f64;
    let points = |f: fn(&EpochMetrics) -> f64| -> Vec<(f64, f64)> {
        history.log_history.iter().map(|m| (m.epoch as f64, f(m))).collect()
    };

    // Losses
    {
        let train = points(|m| m.train_loss);
        let eval  = points(|m| m.eval_loss);
        let max_loss = train
            .iter()
            .chain(eval.iter())
            .map(|(_, l)| *l)
            .filter(|l| l.is_finite())
            .fold(0.0_f64, f64::max);

        let mut chart = ChartBuilder::on(&left)
            .caption("Loss", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0.0..n + 1.0, 0.0..max_loss.max(1.0) * 1.1)?;

        chart.configure_mesh().x_desc("epoch").draw()?;

        chart.draw_series(LineSeries::new(train, &BLUE))?
            .label("train")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart.draw_series(LineSeries::new(eval, &RED))?
            .label("validation")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    // Accuracy
    {
        let accuracy = points(|m| m.eval_accuracy);

        let mut chart = ChartBuilder::on(&right)
            .caption("Validation accuracy", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0.0..n + 1.0, 0.0..1.0)?;

        chart.configure_mesh().x_desc("epoch").draw()?;

        chart.draw_series(LineSeries::new(accuracy.clone(), &GREEN))?;
        chart.draw_series(accuracy.iter().map(|(x, y)| Circle::new((*x, *y), 4, GREEN.filled())))?;
    }

    root.present()?;
    Ok(())
}
