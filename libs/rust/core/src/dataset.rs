//! Per-client tabular data.
//!
//! A dataset is loaded once from a CSV file with a header row. Rows that fail
//! to parse are kept aside rather than rejected at load time; the owning
//! client refuses to train while any are present.
//!
//! Input is plain comma-separated text. Surrounding double quotes on a field
//! are dropped, but quoted fields may not contain commas; a row with more
//! fields than the header is reported as malformed.

use std::path::Path;
use serde::{Deserialize, Serialize};

pub const SENIOR_AGE: f64 = 65.0;
/// Position of `is_senior` in the feature vector produced by [`Dataset::features`].
pub const SENSITIVE_INDEX: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub age: f64,
    pub is_senior: bool,
    pub mortality: u8,
}

impl Record {
    pub fn new(age: f64, mortality: u8) -> Self { Self { age, is_senior: age > SENIOR_AGE, mortality } }
    pub fn features(&self) -> Vec<f64> { vec![self.age, if self.is_senior { 1.0 } else { 0.0 }] }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRow { pub line: usize, pub reason: String }

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    malformed: Vec<MalformedRow>,
}

struct Columns { width: usize, age: usize, mortality: usize, is_senior: Option<usize> }

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self { Self { records, malformed: Vec::new() } }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse_csv(&text))
    }

    pub fn parse_csv(text: &str) -> Self {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let Some((_, header)) = lines.next() else { return Self::default(); };
        let cols = match Columns::from_header(header) {
            Ok(c) => c,
            Err(reason) => return Self { records: Vec::new(), malformed: vec![MalformedRow { line: 1, reason }] },
        };
        let mut ds = Self::default();
        for (idx, line) in lines {
            match cols.parse_row(line) {
                Ok(r) => ds.records.push(r),
                Err(reason) => ds.malformed.push(MalformedRow { line: idx + 1, reason }),
            }
        }
        ds
    }

    pub fn records(&self) -> &[Record] { &self.records }
    pub fn malformed(&self) -> &[MalformedRow] { &self.malformed }
    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn features(&self) -> Vec<Vec<f64>> { self.records.iter().map(Record::features).collect() }
    pub fn labels(&self) -> Vec<u8> { self.records.iter().map(|r| r.mortality).collect() }

    /// Renders the dataset in the same CSV layout [`Dataset::parse_csv`] reads.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("age,is_senior,mortality\n");
        for r in &self.records { out.push_str(&format!("{},{},{}\n", r.age, r.is_senior as u8, r.mortality)); }
        out
    }
}

impl Columns {
    fn from_header(header: &str) -> Result<Self, String> {
        let names: Vec<String> = header.split(',').map(|h| h.trim().trim_matches('"').to_ascii_lowercase()).collect();
        let find = |want: &[&str]| names.iter().position(|n| want.iter().any(|w| n == w));
        let age = find(&["age"]).ok_or("missing column: age")?;
        let mortality = find(&["mortality"]).ok_or("missing column: mortality")?;
        Ok(Self { width: names.len(), age, mortality, is_senior: find(&["is_senior", "issenior"]) })
    }

    fn parse_row(&self, line: &str) -> Result<Record, String> {
        let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
        if fields.len() > self.width { return Err(format!("expected {} fields, found {}", self.width, fields.len())); }
        let get = |i: usize, name: &str| fields.get(i).copied().ok_or_else(|| format!("missing {name}"));
        let age = parse_age(get(self.age, "age")?)?;
        let mortality = parse_flag(get(self.mortality, "mortality")?).ok_or("mortality is not binary")?;
        let is_senior = match self.is_senior {
            Some(i) => parse_flag(get(i, "is_senior")?).ok_or("is_senior is not binary")? == 1,
            None => age > SENIOR_AGE,
        };
        Ok(Record { age, is_senior, mortality })
    }
}

// Ages above the export cap arrive as "> 89".
fn parse_age(raw: &str) -> Result<f64, String> {
    let age = match raw.strip_prefix('>') {
        Some(rest) => rest.trim().parse::<f64>().map(|a| a + 1.0),
        None => raw.parse::<f64>(),
    }.map_err(|_| format!("age {raw:?} is not numeric"))?;
    if !age.is_finite() || age < 0.0 { return Err(format!("age {raw:?} out of range")); }
    Ok(age)
}

fn parse_flag(raw: &str) -> Option<u8> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "expired" => Some(1),
        "0" | "0.0" | "false" | "alive" => Some(0),
        _ => None,
    }
}
