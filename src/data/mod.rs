/// Data layer: table model, file I/O, role resolution and splitting.
///
/// Architecture:
/// ```text
///  train.parquet        train_labels.csv (optional)
///        │                     │
///        ▼                     ▼
///   ┌──────────┐         ┌──────────┐
///   │  loader   │         │  labels   │  locate label / id columns
///   └──────────┘         └──────────┘
///        │                     │
///        ▼                     │
///   ┌──────────┐               │
///   │  roles    │ ◄────────────┘  identifier + target source
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  features / target / identifier, row-aligned
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  one parquet file per present output
///   └──────────┘
/// ```

pub mod labels;
pub mod loader;
pub mod model;
pub mod roles;
pub mod split;
pub mod writer;
