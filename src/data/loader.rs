use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AuthorBibref, VelocityModel1D, VelocityModel3D, WaveType, DEFAULT_R};

pub const COLUMNS_1D: [&str; 5] = ["Depth (km)", "Velocity (km/s)", "Type", "NFO", "Author"];
pub const COLUMNS_BIBREF: [&str; 2] = ["Author", "Bibref"];
pub const COLUMN_R: &str = "R";

/// Required 3D columns; the velocity column is named after the wave type.
pub fn columns_3d(wave_type: WaveType) -> [&'static str; 6] {
    [
        "Longitude",
        "Latitude",
        "Depth",
        wave_type.column_label(),
        "NFO",
        "Author",
    ]
}

// ---------------------------------------------------------------------------
// Cell / RawTable – untyped rows as read from a file
// ---------------------------------------------------------------------------

/// A single cell before it is interpreted against a column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Null => None,
        }
    }

    /// Trimmed text; numbers are printed back (`1234.0` → `"1234"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(v) => Some(format!("{v}")),
            Cell::Null => None,
        }
    }
}

/// Header plus rows, shared by every file format.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Indices of `required`, or an error naming every missing column.
    fn require(&self, required: &[&str]) -> Result<Vec<usize>> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| self.position(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required columns: {missing:?}. Available columns: {:?}",
                self.columns
            );
        }
        Ok(required.iter().filter_map(|name| self.position(name)).collect())
    }

    fn number(&self, row: usize, col: usize) -> Result<f64> {
        let cell = self.rows[row].get(col).unwrap_or(&Cell::Null);
        cell.as_f64()
            .filter(|v| v.is_finite())
            .with_context(|| format!("Row {row}, '{}': {cell:?} is not a number", self.columns[col]))
    }

    fn text(&self, row: usize, col: usize) -> Result<String> {
        self.rows[row]
            .get(col)
            .and_then(Cell::as_text)
            .with_context(|| format!("Row {row}, '{}': missing value", self.columns[col]))
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read any supported file into a [`RawTable`]. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "Author": "...", "Depth (km)": 1.0, ... }, ...]`
/// * `.parquet` – flat columns of strings and numbers
pub fn read_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn positive_velocity(v: f64, row: usize) -> Result<f64> {
    if v <= 0.0 {
        bail!("Row {row}: velocity must be positive, got {v}");
    }
    Ok(v)
}

/// Load 1D rows. `Type` is upper-cased before parsing.
pub fn load_1d(path: &Path) -> Result<Vec<VelocityModel1D>> {
    let table = read_table(path)?;
    let cols = table.require(&COLUMNS_1D)?;

    (0..table.rows.len())
        .map(|row| -> Result<VelocityModel1D> {
            let wave_type = table
                .text(row, cols[2])?
                .to_ascii_uppercase()
                .parse::<WaveType>()
                .with_context(|| format!("Row {row}"))?;
            Ok(VelocityModel1D {
                depth: table.number(row, cols[0])?,
                velocity: positive_velocity(table.number(row, cols[1])?, row)?,
                wave_type,
                nfo: table.text(row, cols[3])?,
                author: table.text(row, cols[4])?,
            })
        })
        .collect()
}

/// Load 3D rows for one wave type. A missing `R` column or empty `R` cell
/// defaults to 1.0.
pub fn load_3d(path: &Path, wave_type: WaveType) -> Result<Vec<VelocityModel3D>> {
    let table = read_table(path)?;
    let cols = table.require(&columns_3d(wave_type))?;
    let r_col = table.position(COLUMN_R);

    (0..table.rows.len())
        .map(|row| -> Result<VelocityModel3D> {
            let r = match r_col {
                Some(col) if table.rows[row].get(col).is_some_and(|c| *c != Cell::Null) => {
                    table.number(row, col)?
                }
                _ => DEFAULT_R,
            };
            Ok(VelocityModel3D {
                longitude: table.number(row, cols[0])?,
                latitude: table.number(row, cols[1])?,
                depth: table.number(row, cols[2])?,
                velocity: positive_velocity(table.number(row, cols[3])?, row)?,
                r,
                nfo: table.text(row, cols[4])?,
                author: table.text(row, cols[5])?,
            })
        })
        .collect()
}

pub fn load_bibrefs(path: &Path) -> Result<Vec<AuthorBibref>> {
    let table = read_table(path)?;
    let cols = table.require(&COLUMNS_BIBREF)?;

    (0..table.rows.len())
        .map(|row| -> Result<AuthorBibref> {
            Ok(AuthorBibref {
                author: table.text(row, cols[0])?,
                bibref: table.text(row, cols[1])?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Every cell is kept as text; empty cells become [`Cell::Null`].
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
/// Columns are the union of keys, in first-seen order.
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => Cell::Null,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Flat Parquet file; string columns become text, integer and float
/// columns become numbers.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { columns, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        other => Cell::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_1d_normalises_type_and_trims_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "1d.csv",
            "Depth (km),Velocity (km/s),Type,NFO,Author\n\
             -3,4.80, vp ,TEST_NFO , test_1d\n\
             0,4.80,VS,TEST_NFO,test_1d\n",
        );
        let rows = load_1d(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].wave_type, WaveType::Vp);
        assert_eq!(rows[0].depth, -3.0);
        assert_eq!(rows[0].nfo, "TEST_NFO");
        assert_eq!(rows[0].author, "test_1d");
        assert_eq!(rows[1].wave_type, WaveType::Vs);
    }

    #[test]
    fn missing_columns_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "Depth (km),Type\n1,VP\n");
        let err = load_1d(&path).unwrap_err().to_string();
        assert!(err.contains("Velocity (km/s)"), "{err}");
        assert!(err.contains("Author"), "{err}");
    }

    #[test]
    fn bad_wave_type_fails_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "1d.csv",
            "Depth (km),Velocity (km/s),Type,NFO,Author\n0,4.8,XP,N,A\n",
        );
        let err = load_1d(&path).unwrap_err();
        assert!(format!("{err:#}").contains("wave_type must be VP or VS, got XP"));
    }

    #[test]
    fn non_positive_velocity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "1d.csv",
            "Depth (km),Velocity (km/s),Type,NFO,Author\n0,0,VP,N,A\n",
        );
        assert!(load_1d(&path).is_err());
    }

    #[test]
    fn csv_3d_defaults_r() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "vs.csv",
            "Longitude,Latitude,Depth,Vs,R,NFO,Author\n\
             7.5,46.0,5,3.4,,CH,diehl\n\
             7.5,46.0,10,3.6,0.5,CH,diehl\n",
        );
        let rows = load_3d(&path, WaveType::Vs).unwrap();
        assert_eq!(rows[0].r, 1.0);
        assert_eq!(rows[1].r, 0.5);

        // Wrong velocity column for the requested wave type.
        assert!(load_3d(&path, WaveType::Vp).is_err());
    }

    #[test]
    fn json_records_with_numeric_nfo() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "vp.json",
            r#"[{"Longitude": 7.5, "Latitude": 46, "Depth": 5, "Vp": 6.1, "NFO": 1234, "Author": "diehl"}]"#,
        );
        let rows = load_3d(&path, WaveType::Vp).unwrap();
        assert_eq!(rows[0].nfo, "1234");
        assert_eq!(rows[0].latitude, 46.0);
        assert_eq!(rows[0].r, DEFAULT_R);
    }

    #[test]
    fn parquet_3d_with_r_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vp.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Longitude", DataType::Float64, false),
            Field::new("Latitude", DataType::Float64, false),
            Field::new("Depth", DataType::Float64, false),
            Field::new("Vp", DataType::Float64, false),
            Field::new("R", DataType::Float64, true),
            Field::new("NFO", DataType::Utf8, false),
            Field::new("Author", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![7.0, 8.0])),
                Arc::new(Float64Array::from(vec![46.0, 46.5])),
                Arc::new(Float64Array::from(vec![1.0, 2.0])),
                Arc::new(Float64Array::from(vec![5.5, 5.9])),
                Arc::new(Float64Array::from(vec![Some(0.8), None])),
                Arc::new(StringArray::from(vec!["CH", "CH"])),
                Arc::new(StringArray::from(vec!["diehl", "diehl"])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let rows = load_3d(&path, WaveType::Vp).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].r, 0.8);
        assert_eq!(rows[1].r, 1.0);
        assert_eq!(rows[1].velocity, 5.9);
    }

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("model.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file extension: .xlsx");
    }
}
