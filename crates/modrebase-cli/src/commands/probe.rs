use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use modrebase_core::Strategy;
use std::path::Path;

pub fn run(dir: &Path, json: bool) -> Result<u8, String> {
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()));
    }
    let detected = Strategy::detect(dir);

    if json {
        let payload = serde_json::json!({
            "dir": dir.display().to_string(),
            "strategy": detected,
            "lock_file": detected.map(Strategy::lock_file_name),
            "checksum_file": detected.map(Strategy::checksum_file_name),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        match detected {
            Some(strategy) => println!(
                "{}: {strategy} ({}, {})",
                dir.display(),
                strategy.lock_file_name(),
                strategy.checksum_file_name()
            ),
            None => println!("{}: no supported manifest found", dir.display()),
        }
    }

    Ok(if detected.is_some() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
