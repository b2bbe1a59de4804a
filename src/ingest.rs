//! Loading temporal objects from CSV files
//!
//! Each row is `object_id,timestamp,value` and the first line is a header.
//! Any malformed row aborts the loading.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use log::info;
use simple_error::SimpleError;

use crate::base::{BoxResult, Dataset, Len, ObjectId, Score, TemporalObject, Timestamp};

/// Reads a dataset from a CSV file
pub fn load_csv(path: &Path) -> BoxResult<Dataset> {
    let file = File::open(path)
        .map_err(|e| SimpleError::new(format!("cannot open {}: {}", path.display(), e)))?;
    let dataset = read_csv(BufReader::new(file))?;
    info!(
        "Loaded {} objects from {} (total time {})",
        dataset.len(),
        path.display(),
        dataset.total_time()
    );
    Ok(dataset)
}

/// Reads a dataset from CSV records; objects are kept in order of first
/// appearance
pub fn read_csv<R: BufRead>(reader: R) -> BoxResult<Dataset> {
    let mut objects: Vec<TemporalObject> = Vec::new();
    let mut positions: HashMap<ObjectId, usize> = HashMap::new();

    // Skips the header
    for (ix, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let line_number = ix + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(SimpleError::new(format!(
                "line {}: expected 3 fields (object_id,timestamp,value), got {}",
                line_number,
                fields.len()
            ))
            .into());
        }

        let id: ObjectId = parse_field(fields[0], "object_id", line_number)?;
        let t: Timestamp = parse_field(fields[1], "timestamp", line_number)?;
        let value: Score = parse_field(fields[2], "value", line_number)?;

        let position = *positions.entry(id).or_insert_with(|| {
            objects.push(TemporalObject::new(id));
            objects.len() - 1
        });
        objects[position]
            .insert(t, value)
            .map_err(|e| SimpleError::new(format!("line {}: {}", line_number, e)))?;
    }

    Ok(Dataset::new(objects)?)
}

fn parse_field<T: FromStr>(field: &str, name: &str, line_number: usize) -> BoxResult<T> {
    field.parse::<T>().map_err(|_| {
        SimpleError::new(format!(
            "line {}: invalid {} '{}'",
            line_number, name, field
        ))
        .into()
    })
}
