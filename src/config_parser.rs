use std::fs::File;
use std::io::BufReader;

use crate::error::{Error, Result};
use crate::printer_config::Config;

pub fn read_config(file_name: &str) -> Result<Config>
{
    let file = match File::open(file_name) {
        Ok(file) => file,
        Err(e) => return Err(Error::Config(format!("Failed to open {}: {}", file_name, e)))
    };
    let reader = BufReader::new(file);

    let config: Config = match serde_json::from_reader(reader) {
        Ok(json) => json,
        Err(e) => return Err(Error::Config(format!("Failed to parse {}: {}", file_name, e)))
    };
    config.validate()?;
    Ok(config)
}

pub fn parse_config(json: &str) -> Result<Config>
{
    let config: Config = serde_json::from_str(json)
        .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}
