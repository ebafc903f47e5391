//! Metric extraction from Parquet output files.

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use rt_types::{ArtifactError, TuneResult};

/// Metric-name column in a component's output rows.
pub const METRIC_COLUMN: &str = "metric";
/// Score column in a component's output rows.
pub const SCORE_COLUMN: &str = "score";

/// Read `(metric, score)` rows from every file, in file order, into a
/// metric mapping. Scores are rounded to 2 decimal places; a metric name
/// appearing more than once resolves last-write-wins.
pub fn read_metric_rows(files: &[PathBuf]) -> TuneResult<HashMap<String, f64>> {
    let mut metrics = HashMap::new();
    for path in files {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| ArtifactError::Parquet(e.to_string()))?;
        let reader = builder
            .build()
            .map_err(|e| ArtifactError::Parquet(e.to_string()))?;
        for batch in reader {
            let batch = batch.map_err(|e| ArtifactError::Parquet(e.to_string()))?;
            append_batch(&batch, &mut metrics)?;
        }
    }
    Ok(metrics)
}

fn append_batch(batch: &RecordBatch, metrics: &mut HashMap<String, f64>) -> TuneResult<()> {
    let names = column(batch, METRIC_COLUMN)?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ArtifactError::ColumnType {
            column: METRIC_COLUMN.to_string(),
            expected: "utf8".to_string(),
        })?;
    let scores = column(batch, SCORE_COLUMN)?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ArtifactError::ColumnType {
            column: SCORE_COLUMN.to_string(),
            expected: "float64".to_string(),
        })?;

    for row in 0..batch.num_rows() {
        if names.is_null(row) || scores.is_null(row) {
            continue;
        }
        metrics.insert(names.value(row).to_string(), round_score(scores.value(row)));
    }
    Ok(())
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> TuneResult<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        ArtifactError::MissingColumn {
            column: name.to_string(),
        }
        .into()
    })
}

fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Test fixture: write a `(metric, score)` parquet file.
#[cfg(test)]
pub(crate) fn write_metrics_file(path: &std::path::Path, rows: &[(&str, f64)]) {
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![
        Field::new(METRIC_COLUMN, DataType::Utf8, false),
        Field::new(SCORE_COLUMN, DataType::Float64, false),
    ]));
    let names: Vec<&str> = rows.iter().map(|(name, _)| *name).collect();
    let scores: Vec<f64> = rows.iter().map(|(_, score)| *score).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(scores)),
        ],
    )
    .unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}
