//! Pure logic with no I/O: typed records, tool-call JSON normalization,
//! heuristic estimation tables, stats aggregation, and report rendering.

pub mod error;
pub mod estimate;
pub mod intent;
pub mod normalize;
pub mod record;
pub mod repair;
pub mod report;
pub mod stats;

pub use error::{Error, Result};
pub use intent::{Intent, IntentClassification, UnknownIntent};
pub use record::{ExerciseRecord, ExpenseRecord, FoodRecord, Intensity, RecordKind, TimeRecord};
