use std::fs::{self, File};
use std::num::NonZeroUsize;
use std::path::Path;

use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;
use supply_chain_core::SaveFormat;
use tracing::{debug, info, warn};

use crate::paths::file_size_label;
use crate::types::{IngestError, LocatedError, Result, ResultExt};

const INFER_SCHEMA_ROWS: usize = 10_000;

/// Reads a CSV file with a header row, parsing `date_columns` into dates.
///
/// With a `chunk_size` the file is streamed once in batches of about that
/// many rows, parsed against one inferred schema and stacked in order.
/// Values a declared date column cannot parse become null.
pub fn read_csv_table(
    path: &Path,
    date_columns: &[String],
    chunk_size: Option<NonZeroUsize>,
) -> Result<DataFrame> {
    info!("reading {}", path.display());
    let df = match chunk_size {
        None => scan_csv(path)
            .at("read_csv_file")?
            .collect()
            .at("read_csv_file")?,
        Some(chunk) => read_chunked(path, chunk)?,
    };
    let df = parse_date_columns(df, path, date_columns)?;
    info!(
        "loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

fn scan_csv(path: &Path) -> PolarsResult<LazyFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .finish()
}

fn read_chunked(path: &Path, chunk: NonZeroUsize) -> Result<DataFrame> {
    let scan = scan_csv(path).at("read_csv_file")?;
    let schema = scan.schema().at("read_csv_file")?;
    let mut df = DataFrame::from(schema.as_ref());
    if scan.limit(1).collect().at("read_csv_file")?.height() == 0 {
        debug!("{}: no data rows", path.display());
        return Ok(df);
    }

    let file: Box<dyn MmapBytesReader> = Box::new(File::open(path).at("read_csv_file")?);
    let mut batches = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema(Some(schema.clone()))
        .with_chunk_size(chunk.get())
        .into_reader_with_file_handle(file)
        .batched(Some(schema))
        .at("read_csv_file")?;
    let mut count = 0;
    while let Some(parts) = batches.next_batches(1).at("read_csv_file")? {
        for part in parts {
            df.vstack_mut(&part).at("read_csv_file")?;
            count += 1;
        }
    }
    debug!(
        "{}: {} rows read in {} batches of up to {}",
        path.display(),
        df.height(),
        count,
        chunk
    );
    df.align_chunks();
    Ok(df)
}

fn parse_date_columns(df: DataFrame, path: &Path, date_columns: &[String]) -> Result<DataFrame> {
    if date_columns.is_empty() {
        return Ok(df);
    }
    let present = df.get_column_names();
    if let Some(missing) = date_columns
        .iter()
        .find(|column| !present.contains(&column.as_str()))
    {
        return Err(LocatedError::new(
            "read_csv_file",
            IngestError::MissingDateColumn {
                file: path.display().to_string(),
                column: missing.clone(),
            },
        ));
    }
    let options = StrptimeOptions {
        strict: false,
        ..Default::default()
    };
    let mut df = df;
    for column in date_columns {
        let parsed = df
            .clone()
            .lazy()
            .with_column(
                col(column)
                    .cast(DataType::String)
                    .str()
                    .to_date(options.clone())
                    .alias(column),
            )
            .collect();
        match parsed {
            Ok(parsed) => df = parsed,
            Err(err) => warn!(
                "{}: leaving `{}` unparsed, no date format fits: {}",
                path.display(),
                column,
                err
            ),
        }
    }
    Ok(df)
}

/// Writes `df` to `path` in the requested format, creating parent directories.
pub fn save_table(df: &DataFrame, path: &Path, format: SaveFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at("save_dataframe")?;
    }
    let mut file = File::create(path).at("save_dataframe")?;
    let mut out = df.clone();
    match format {
        SaveFormat::Parquet => ParquetWriter::new(&mut file)
            .finish(&mut out)
            .map(|_| ())
            .at("save_dataframe")?,
        SaveFormat::Csv => CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut out)
            .at("save_dataframe")?,
        SaveFormat::Ipc => IpcWriter::new(&mut file)
            .finish(&mut out)
            .at("save_dataframe")?,
    }
    info!(
        "saved {} ({}, {})",
        path.display(),
        format,
        file_size_label(path)
    );
    Ok(())
}

/// Reads a table previously written by [`save_table`].
pub fn load_table(path: &Path, format: SaveFormat) -> Result<DataFrame> {
    match format {
        SaveFormat::Parquet => {
            let file = File::open(path).at("load_dataframe")?;
            ParquetReader::new(file).finish().at("load_dataframe")
        }
        SaveFormat::Ipc => {
            let file = File::open(path).at("load_dataframe")?;
            IpcReader::new(file).finish().at("load_dataframe")
        }
        SaveFormat::Csv => scan_csv(path)
            .at("load_dataframe")?
            .collect()
            .at("load_dataframe"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write csv");
        path
    }

    #[test]
    fn parses_declared_date_columns() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(
            dir.path(),
            "oil.csv",
            "date,dcoilwtico\n2013-01-01,\n2013-01-02,93.14\n",
        );
        let df = read_csv_table(&path, &["date".to_string()], None).expect("read");
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("date").expect("date").dtype(), &DataType::Date);
        assert_eq!(df.column("dcoilwtico").expect("oil").null_count(), 1);
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "items.csv", "item_nbr,family\n1,GROCERY\n");
        let err = read_csv_table(&path, &["date".to_string()], None).expect_err("missing");
        assert!(matches!(
            err.source,
            IngestError::MissingDateColumn { ref column, .. } if column == "date"
        ));
    }

    #[test]
    fn chunked_read_matches_single_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut body = String::from("id,store_nbr,sales\n");
        for idx in 0..23 {
            body.push_str(&format!("{},{},{}.5\n", idx, idx % 4, idx));
        }
        let path = write_csv(dir.path(), "train.csv", &body);
        let whole = read_csv_table(&path, &[], None).expect("whole");
        let chunked =
            read_csv_table(&path, &[], NonZeroUsize::new(5)).expect("chunked");
        assert_eq!(chunked.shape(), (23, 3));
        assert!(whole.equals_missing(&chunked));
    }

    #[test]
    fn chunked_read_of_header_only_file_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "stores.csv", "store_nbr,city,state\n");
        let df = read_csv_table(&path, &[], NonZeroUsize::new(2)).expect("chunked");
        assert_eq!(df.shape(), (0, 3));
        assert_eq!(df.get_column_names(), vec!["store_nbr", "city", "state"]);
    }

    #[test]
    fn chunked_read_keeps_quoted_newlines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut body = String::from("date,type,description\n");
        for idx in 0..9 {
            body.push_str(&format!(
                "2012-03-{:02},Holiday,\"Fundacion\nde Manta {}\"\n",
                idx + 1,
                idx
            ));
        }
        let path = write_csv(dir.path(), "holidays_events.csv", &body);
        let dates = ["date".to_string()];
        let whole = read_csv_table(&path, &dates, None).expect("whole");
        let chunked = read_csv_table(&path, &dates, NonZeroUsize::new(2)).expect("chunked");
        assert_eq!(whole.shape(), (9, 3));
        assert!(whole.equals_missing(&chunked));
    }

    #[test]
    fn unparseable_dates_become_null() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(
            dir.path(),
            "oil.csv",
            "date,dcoilwtico\n2013-01-01,93.1\nn/a,93.14\n2013-01-03,92.97\n",
        );
        let df = read_csv_table(&path, &["date".to_string()], None).expect("read");
        let dates = df.column("date").expect("date");
        assert_eq!(dates.dtype(), &DataType::Date);
        assert_eq!(dates.null_count(), 1);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn empty_file_fails_to_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "stores.csv", "");
        assert!(read_csv_table(&path, &[], None).is_err());
    }

    #[test]
    fn saved_tables_load_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let df = df!(
            "store_nbr" => &[1i64, 2, 3],
            "city" => &["Quito", "Cuenca", "Ambato"]
        )
        .expect("frame");
        for format in [SaveFormat::Parquet, SaveFormat::Ipc, SaveFormat::Csv] {
            let path = dir
                .path()
                .join(format!("stores_ingested.{}", format.extension()));
            save_table(&df, &path, format).expect("save");
            let loaded = load_table(&path, format).expect("load");
            assert_eq!(loaded.shape(), df.shape(), "{}", format);
            assert_eq!(loaded.get_column_names(), df.get_column_names());
        }
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let df = df!("a" => &[1i64]).expect("frame");
        let path = dir.path().join("nested/out/a_ingested.parquet");
        save_table(&df, &path, SaveFormat::Parquet).expect("save");
        assert!(path.is_file());
    }
}
