use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Error, Write};
use std::path::{Path, PathBuf};

pub fn write_script(dir: &Path, name: &str, lines: &[&str]) -> Result<PathBuf, Error> {
    let path = dir.join(name);
    let mut file = File::create(&path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(path)
}

pub fn write_config(dir: &Path, json: &str) -> Result<PathBuf, Error> {
    let path = dir.join("scanpay.json");
    fs::write(&path, json)?;
    Ok(path)
}

/// Every committed line of a JSONL transaction log.
pub fn read_log(path: &Path) -> Result<Vec<Value>, Error> {
    let file = File::open(path)?;
    BufReader::new(file)
        .lines()
        .map(|line| Ok(serde_json::from_str(&line?)?))
        .collect()
}
