use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const NFO: &str = "TEST_NFO";
const AUTHOR_1D: &str = "test_1d";
const AUTHOR_3D: &str = "test_3d";
const VP_VS_RATIO: f64 = 1.73;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Round to `digits` decimals so exports stay readable.
fn round(v: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (v * scale).round() / scale
}

fn write_1d(dir: &Path) -> Result<PathBuf> {
    let depths = [-3.0, 0.0, 4.0, 7.2, 8.2, 10.4, 15.0, 30.0];
    let velocities = [4.80, 4.80, 5.20, 5.80, 6.10, 6.30, 6.50, 7.00];

    let path = dir.join("sample_1d.csv");
    let mut writer = csv::Writer::from_path(&path).context("creating 1D CSV")?;
    writer.write_record(["Depth (km)", "Velocity (km/s)", "Type", "NFO", "Author"])?;
    for (wave_type, scale) in [("VP", 1.0), ("VS", 1.0 / VP_VS_RATIO)] {
        for (depth, vp) in depths.iter().zip(velocities) {
            writer.write_record([
                depth.to_string(),
                format!("{:.2}", vp * scale),
                wave_type.to_string(),
                NFO.to_string(),
                AUTHOR_1D.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(path)
}

struct Grid {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    depth: Vec<f64>,
    vp: Vec<f64>,
    r: Vec<f64>,
}

fn build_grid(rng: &mut SimpleRng) -> Grid {
    let mut grid = Grid {
        longitude: Vec::new(),
        latitude: Vec::new(),
        depth: Vec::new(),
        vp: Vec::new(),
        r: Vec::new(),
    };
    for i in 0..9 {
        for j in 0..5 {
            for depth in [0.0, 5.0, 10.0, 20.0, 30.0] {
                let noise = (rng.next_f64() - 0.5) * 0.2;
                // Roughly one node in ten carries a reduced resolution value.
                let r = if rng.next_f64() < 0.1 {
                    round(0.3 + 0.6 * rng.next_f64(), 2)
                } else {
                    1.0
                };
                grid.longitude.push(6.0 + i as f64 * 0.5);
                grid.latitude.push(45.5 + j as f64 * 0.5);
                grid.depth.push(depth);
                grid.vp.push(round(5.0 + 0.05 * depth + noise, 3));
                grid.r.push(r);
            }
        }
    }
    grid
}

fn write_3d(dir: &Path, grid: &Grid, label: &str, velocity: Vec<f64>) -> Result<PathBuf> {
    let n = velocity.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("Longitude", DataType::Float64, false),
        Field::new("Latitude", DataType::Float64, false),
        Field::new("Depth", DataType::Float64, false),
        Field::new(label, DataType::Float64, false),
        Field::new("R", DataType::Float64, true),
        Field::new("NFO", DataType::Utf8, false),
        Field::new("Author", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(grid.longitude.clone())),
            Arc::new(Float64Array::from(grid.latitude.clone())),
            Arc::new(Float64Array::from(grid.depth.clone())),
            Arc::new(Float64Array::from(velocity)),
            Arc::new(Float64Array::from(grid.r.clone())),
            Arc::new(StringArray::from(vec![NFO; n])),
            Arc::new(StringArray::from(vec![AUTHOR_3D; n])),
        ],
    )
    .context("building record batch")?;

    let path = dir.join(format!("sample_3d_{}.parquet", label.to_ascii_lowercase()));
    let file = std::fs::File::create(&path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(path)
}

fn write_bibrefs(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("sample_bibrefs.csv");
    let mut writer = csv::Writer::from_path(&path).context("creating bibref CSV")?;
    writer.write_record(["Author", "Bibref"])?;
    writer.write_record([AUTHOR_1D, "Test_1D_Reference"])?;
    writer.write_record([AUTHOR_3D, "Test_3D_Reference"])?;
    writer.flush()?;
    Ok(path)
}

fn main() -> Result<()> {
    let dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".into()));
    std::fs::create_dir_all(&dir).context("creating output directory")?;

    let mut rng = SimpleRng::new(42);
    let grid = build_grid(&mut rng);
    let vs: Vec<f64> = grid.vp.iter().map(|vp| round(vp / VP_VS_RATIO, 3)).collect();

    let written = [
        write_1d(&dir)?,
        write_3d(&dir, &grid, "Vp", grid.vp.clone())?,
        write_3d(&dir, &grid, "Vs", vs)?,
        write_bibrefs(&dir)?,
    ];
    for path in &written {
        println!("Wrote {}", path.display());
    }
    println!("Import with e.g. `velocitrack import 3d {} vp`", written[1].display());
    Ok(())
}
