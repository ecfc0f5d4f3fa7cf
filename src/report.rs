use std::io::{self, Write};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::FeatureTable;

/// Rows shown in table previews and prediction samples.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Writes the human-readable run report. Write failures are returned to the
/// caller untouched.
pub struct Reporter<W: Write> {
    out: W,
    sample_size: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, sample_size: usize) -> Self {
        Self { out, sample_size }
    }

    pub fn dataset_shape(&mut self, shape: (usize, usize)) -> io::Result<()> {
        writeln!(self.out, "main data shape:: {shape:?}")
    }

    /// First rows of the training features plus both partition shapes.
    pub fn partitions(&mut self, x_train: &FeatureTable, x_test: &FeatureTable) -> io::Result<()> {
        writeln!(self.out, "\nX_train:")?;
        self.table(&x_train.head(self.sample_size))?;
        writeln!(self.out, "X_train shape: {:?}", x_train.shape())?;
        writeln!(self.out, "X_test shape: {:?}", x_test.shape())
    }

    pub fn scaled(&mut self, scaled: &FeatureTable) -> io::Result<()> {
        writeln!(self.out, "\nAfter preprocessing:")?;
        self.table(&scaled.head(self.sample_size))?;
        writeln!(self.out, "X_train_scaled.shape:: {:?}", scaled.shape())
    }

    pub fn confidence(&mut self, score: f64) -> io::Result<()> {
        writeln!(self.out, "\nThe confidence score:: {score}")
    }

    /// Every prediction and every true label (keyed by original row id),
    /// then the first `sample_size` of each.
    pub fn predictions(
        &mut self,
        predicted: &[i64],
        expected: &[i64],
        row_ids: &[usize],
        label: &str,
    ) -> io::Result<()> {
        writeln!(self.out, "Predicted y_pred shape== ({},)", predicted.len())?;

        let all: Vec<String> = predicted.iter().map(i64::to_string).collect();
        writeln!(self.out, "\nThe prediction::  [{}]", all.join(" "))?;

        writeln!(self.out, "\nThe expectation:")?;
        for (row, value) in row_ids.iter().zip(expected) {
            writeln!(self.out, "{row:<6}{value}")?;
        }
        writeln!(self.out, "Name: {label}, Length: {}", expected.len())?;

        writeln!(self.out, "\nThe prediction:\n")?;
        for value in predicted.iter().take(self.sample_size) {
            writeln!(self.out, "{value}")?;
        }

        writeln!(self.out, "\nThe expectation:\n")?;
        for (row, value) in row_ids.iter().zip(expected).take(self.sample_size) {
            writeln!(self.out, "{row:<6}{value}")?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn table(&mut self, table: &FeatureTable) -> io::Result<()> {
        let batch = to_record_batch(table).map_err(io::Error::other)?;
        let rendered = pretty_format_batches(&[batch]).map_err(io::Error::other)?;
        writeln!(self.out, "{rendered}")
    }
}

/// Arrow view of a feature table with a leading `index` column of row ids.
fn to_record_batch(table: &FeatureTable) -> Result<RecordBatch, arrow::error::ArrowError> {
    let mut fields = vec![Field::new("index", DataType::UInt64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(UInt64Array::from_iter_values(
        table.row_ids().iter().map(|&id| id as u64),
    ))];
    for (col, name) in table.columns().iter().enumerate() {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values(table.column(col))));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureTable {
        FeatureTable::from_rows(
            vec!["alcohol".into(), "pH".into()],
            (0..8).map(|i| vec![9.0 + i as f64, 3.0]).collect(),
        )
        .unwrap()
        .select(&[7, 3, 1, 0, 2, 4, 6, 5])
    }

    fn render(f: impl FnOnce(&mut Reporter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut reporter = Reporter::new(Vec::new(), DEFAULT_SAMPLE_SIZE);
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn preview_shows_head_with_row_ids() {
        let table = sample();
        let text = render(|r| r.partitions(&table, &table.head(2)));
        assert!(text.contains("index") && text.contains("alcohol"), "{text}");
        assert!(
            text.lines().any(|l| l.starts_with("| 7 ") && l.contains("16")),
            "{text}"
        );
        assert!(!text.lines().any(|l| l.starts_with("| 6 ")), "{text}");
        assert!(text.contains("X_train shape: (8, 2)"));
        assert!(text.contains("X_test shape: (2, 2)"));
    }

    /// Text after the last occurrence of `marker`.
    fn after_last<'a>(text: &'a str, marker: &str) -> &'a str {
        &text[text.rfind(marker).unwrap() + marker.len()..]
    }

    #[test]
    fn full_predictions_precede_the_sample() {
        let predicted = [5, 6, 5, 7, 6, 5, 8];
        let expected = [5, 5, 5, 7, 6, 6, 8];
        let rows = [10, 11, 12, 13, 14, 15, 16];
        let text = render(|r| r.predictions(&predicted, &expected, &rows, "quality"));

        assert!(text.contains("Predicted y_pred shape== (7,)"));
        assert!(text.contains("The prediction::  [5 6 5 7 6 5 8]"), "{text}");
        assert!(text.contains("16    8\nName: quality, Length: 7"), "{text}");
        assert!(
            text.find("The prediction::").unwrap() < text.find("The prediction:\n").unwrap()
        );
    }

    #[test]
    fn prediction_sample_is_capped() {
        let predicted = [5, 6, 5, 7, 6, 5, 8];
        let expected = [5, 5, 5, 7, 6, 6, 8];
        let rows = [10, 11, 12, 13, 14, 15, 16];
        let text = render(|r| r.predictions(&predicted, &expected, &rows, "quality"));

        let tail = after_last(&text, "The prediction:\n");
        let (sampled, expectations) = tail.split_once("The expectation:").unwrap();
        assert_eq!(sampled.split_whitespace().count(), 5);
        assert!(expectations.contains("14    6"));
        assert!(!expectations.contains("15    6"));
    }

    #[test]
    fn short_prediction_lists_print_everything() {
        let text = render(|r| r.predictions(&[4, 6], &[4, 5], &[3, 9], "quality"));
        let sample = after_last(&text, "The expectation:\n");
        assert!(sample.contains("3     4"));
        assert!(sample.contains("9     5"));
    }

    #[test]
    fn confidence_line() {
        let text = render(|r| r.confidence(0.5));
        assert_eq!(text, "\nThe confidence score:: 0.5\n");
    }

    #[test]
    fn write_errors_propagate() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut reporter = Reporter::new(Broken, DEFAULT_SAMPLE_SIZE);
        let err = reporter.dataset_shape((10, 12)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
