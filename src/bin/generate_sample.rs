//! Write a small synthetic credit-default dataset for trying the splitter:
//! `data/external/train.parquet` plus `data/external/train_labels.csv`.
//! Pass `--inline` to put the `target` column in the table instead.

use std::path::Path;

use anyhow::{Context, Result};
use label_splitter::data::model::{Table, Value};
use label_splitter::data::writer::write_table;

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
}

const CUSTOMERS: usize = 500;
const DEFAULT_RATE: f64 = 0.26;
const MISSING_RATE: f64 = 0.05;

/// One feature per group: delinquency, spend, payment, balance, risk.
const FEATURES: &[&str] = &["D_39", "S_3", "P_2", "B_1", "R_1"];

fn main() -> Result<()> {
    env_logger::init();
    let inline = std::env::args().any(|a| a == "--inline");

    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new("data/external");
    std::fs::create_dir_all(out_dir).context("creating data/external")?;

    let mut columns = vec!["customer_ID".to_string()];
    columns.extend(FEATURES.iter().map(|f| f.to_string()));
    if inline {
        columns.push("target".to_string());
    }

    let mut rows = Vec::with_capacity(CUSTOMERS);
    let mut labels = Vec::with_capacity(CUSTOMERS);
    for i in 0..CUSTOMERS {
        let defaulted = rng.next_f64() < DEFAULT_RATE;
        let mut row = vec![Value::String(format!("c{:015x}", (rng.next_u64() ^ i as u64) >> 4))];
        for _ in FEATURES {
            // Defaulters drift upward so the features carry some signal.
            let v = rng.next_f64() + if defaulted { 0.3 } else { 0.0 };
            row.push(if rng.next_f64() < MISSING_RATE {
                Value::Null
            } else {
                Value::Float(v)
            });
        }
        if inline {
            row.push(Value::Integer(defaulted as i64));
        }
        labels.push((row[0].to_string(), defaulted as i64));
        rows.push(row);
    }

    let table = Table::new(columns, rows)?;
    let table_path = out_dir.join("train.parquet");
    write_table(&table, &table_path)?;

    if !inline {
        // Reverse order, so only a join by identifier lines labels up.
        let labels_path = out_dir.join("train_labels.csv");
        let mut writer = csv::Writer::from_path(&labels_path).context("creating labels CSV")?;
        writer.write_record(["customer_ID", "target"])?;
        for (id, target) in labels.iter().rev() {
            writer.write_record([id.as_str(), target.to_string().as_str()])?;
        }
        writer.flush()?;
        println!("Wrote {} labels to {}", labels.len(), labels_path.display());
    }

    println!("Wrote {CUSTOMERS} customers to {}", table_path.display());
    Ok(())
}
