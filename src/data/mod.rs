/// Data layer: core types, loading, and the train/test split.
///
/// Architecture:
/// ```text
///  URL / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  fetch + parse → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset    │  named columns, numeric rows
///   └──────────────┘
///        │  into_features_and_labels("quality")
///        ▼
///   ┌──────────┐
///   │  split   │  shuffle → X_train / X_test / y_train / y_test
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod split;
