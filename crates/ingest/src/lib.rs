mod clean;
mod frame_io;
mod paths;
mod pipeline;
mod profile;
mod report;
mod types;
mod validation;

pub use clean::{
    PROMOTION_COLUMN, clean_table, coerce_promotion_flag, drop_all_null_rows, drop_duplicate_rows,
};
pub use frame_io::{load_table, read_csv_table, save_table};
pub use paths::{REQUIRED_RAW_FILES, create_directories, default_raw_file_path, file_size_label};
pub use pipeline::{DataIngestion, ingest, profile_csv};
pub use profile::generate_data_profile;
pub use report::{IngestionReport, TIMESTAMP_FORMAT, timestamp_now};
pub use types::{IngestError, LocatedError, Result, ResultExt};
pub use validation::{
    calculate_missing_percentage, check_duplicates, check_minimum_rows, check_missing_values,
    file_exists, validate_columns, validate_required_files,
};
