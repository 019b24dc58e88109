use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use map_compare::config::{ConfigEntry, DEFAULT_CONFIG_FILE};
use map_compare::data::model::{EPOCH_COLUMN, MAP50_95_COLUMN, MAP50_COLUMN};

/// Write synthetic training runs and a config file that compares them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory to write the runs and the config into.
    #[arg(default_value = "sample_runs")]
    out_dir: PathBuf,

    /// Seed for the metric noise.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Columns written per epoch, in training-log order.
const COLUMNS: [&str; 7] = [
    EPOCH_COLUMN,
    "train/box_loss",
    "metrics/precision(B)",
    "metrics/recall(B)",
    MAP50_COLUMN,
    MAP50_95_COLUMN,
    "val/box_loss",
];

/// Header cells are right-aligned to this width, like the training logger does.
const PAD: usize = 22;

enum Format {
    Csv,
    Parquet,
}

struct RunSpec {
    model_name: &'static str,
    epochs: i64,
    /// mAP50 the run converges to.
    plateau: f64,
    /// Epochs per e-fold of the learning curve.
    rate: f64,
    format: Format,
}

const RUNS: [RunSpec; 3] = [
    RunSpec {
        model_name: "yolov8n",
        epochs: 20,
        plateau: 0.72,
        rate: 6.0,
        format: Format::Csv,
    },
    RunSpec {
        model_name: "yolov8s",
        epochs: 50,
        plateau: 0.81,
        rate: 10.0,
        format: Format::Csv,
    },
    RunSpec {
        model_name: "yolov8m",
        epochs: 35,
        plateau: 0.85,
        rate: 9.0,
        format: Format::Parquet,
    },
];

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One row per epoch, values in `COLUMNS` order after the epoch.
struct EpochRow {
    epoch: i64,
    values: [f64; 6],
}

fn simulate(spec: &RunSpec, rng: &mut SimpleRng) -> Vec<EpochRow> {
    (1..=spec.epochs)
        .map(|epoch| {
            let progress = 1.0 - (-(epoch as f64) / spec.rate).exp();
            let map50 = (spec.plateau * progress + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0);
            let map50_95 = (map50 * 0.62 + rng.gauss(0.0, 0.005)).clamp(0.0, 1.0);
            let precision = (map50 + 0.05 + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0);
            let recall = (map50 - 0.03 + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0);
            let box_loss = 1.6 - 0.7 * progress + rng.gauss(0.0, 0.02);
            let val_box_loss = box_loss + 0.08 + rng.gauss(0.0, 0.02);
            EpochRow {
                epoch,
                values: [box_loss, precision, recall, map50, map50_95, val_box_loss],
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[EpochRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(COLUMNS.iter().map(|c| format!("{c:>PAD$}")))?;
    for row in rows {
        let mut record = vec![format!("{:>PAD$}", row.epoch)];
        record.extend(row.values.iter().map(|v| format!("{v:>PAD$.5}")));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[EpochRow]) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(EPOCH_COLUMN, DataType::Int64, false)];
    fields.extend(
        COLUMNS[1..]
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Int64Array::from(
        rows.iter().map(|r| r.epoch).collect::<Vec<_>>(),
    ))];
    for i in 0..COLUMNS.len() - 1 {
        arrays.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.values[i]).collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(batch)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    let mut entries = Vec::with_capacity(RUNS.len());

    for spec in &RUNS {
        let rows = simulate(spec, &mut rng);
        let path = match spec.format {
            Format::Csv => {
                let path = args.out_dir.join(format!("{}.csv", spec.model_name));
                write_csv(&path, &rows)?;
                path
            }
            Format::Parquet => {
                let path = args.out_dir.join(format!("{}.parquet", spec.model_name));
                let batch = write_parquet(&path, &rows)?;
                println!("{}", pretty_format_batches(&[batch.slice(0, 3)])?);
                path
            }
        };
        println!("Wrote {} epochs of {} to {}", rows.len(), spec.model_name, path.display());
        entries.push(ConfigEntry {
            file_path: path.display().to_string(),
            model_name: spec.model_name.to_string(),
        });
    }

    let config_path = args.out_dir.join(DEFAULT_CONFIG_FILE);
    fs::write(&config_path, serde_yaml::to_string(&entries)?)
        .with_context(|| format!("writing {}", config_path.display()))?;
    println!(
        "Wrote {config}; compare with `map-compare --config {config}`",
        config = config_path.display()
    );
    Ok(())
}
