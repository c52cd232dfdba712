//! Synthetic demo partitions.
//!
//! Stands in for the offline pipeline that carves a patient population into
//! per-hospital files. Hospital A gets a natural sample; Hospital B gets a
//! sample where senior patients die with 85% probability, which a local model
//! picks up as a strong age-group disparity.

use std::io;
use std::path::{Path, PathBuf};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::dataset::{Dataset, Record};

pub const FAIR_FILE: &str = "hospital_A_fair.csv";
pub const BIASED_FILE: &str = "hospital_B_biased.csv";
pub const FAIR_SEED: u64 = 42;
pub const BIASED_SEED: u64 = 99;
const INJECTED_SENIOR_MORTALITY: f64 = 0.85;

fn sample_patient(rng: &mut StdRng) -> Record {
    let age = f64::from(rng.gen_range(18u32..=90));
    let p = 0.02 + 0.001 * age;
    Record::new(age, u8::from(rng.gen_bool(p)))
}

pub fn fair_partition(size: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    Dataset::from_records((0..size).map(|_| sample_patient(&mut rng)).collect())
}

pub fn biased_partition(size: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..size).map(|_| {
        let mut r = sample_patient(&mut rng);
        if r.is_senior { r.mortality = u8::from(rng.gen_bool(INJECTED_SENIOR_MORTALITY)); }
        r
    }).collect();
    Dataset::from_records(records)
}

/// Writes whichever of the two partitions is missing under `dir`. Returns the files written.
pub fn ensure_demo_partitions(dir: &Path, size: usize) -> io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let plan: [(&str, fn(usize, u64) -> Dataset, u64); 2] = [(FAIR_FILE, fair_partition, FAIR_SEED), (BIASED_FILE, biased_partition, BIASED_SEED)];
    for (file, build, seed) in plan {
        let path = dir.join(file);
        if path.exists() { continue; }
        std::fs::write(&path, build(size, seed).to_csv())?;
        tracing::info!(path=%path.display(), rows=size, "demo_partition_written");
        written.push(path);
    }
    Ok(written)
}
