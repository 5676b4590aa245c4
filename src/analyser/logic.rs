pub mod analysis;
pub mod io;
pub mod naming;
pub mod profiling;
pub mod types;

pub use analysis::{correlation_matrix, profile};
pub use io::{load, range_to_frame, write_csv_head};
pub use types::{
    CategoricalStats, ColumnKind, ColumnProfile, ColumnRole, CorrelationMatrix, DataFormat,
    Dataset, Narrative, NumericStats, Profile, TOP_K, ValueCount,
};

#[cfg(test)]
mod tests;
