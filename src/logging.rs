//! Logger installation for the binary.
//!
//! `logging.format` takes the `%(field)s` placeholders used by the
//! printer's older tooling: `asctime`, `name`, `levelname` and `message`.
//! Anything else is copied through as written.

use std::fs::File;
use std::io::Write;

use crate::error::{Error, Result};
use crate::printer_config::LoggingConfig;

/// Render one record through a `%(field)s` format
pub fn render(format: &str, asctime: &str, name: &str, level: log::Level, message: &str) -> String
{
    let mut out = String::with_capacity(format.len() + message.len());
    let mut rest = format;
    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        let field = &rest[start + 2..];
        match field.find(")s") {
            Some(end) => {
                match &field[..end] {
                    "asctime" => out.push_str(asctime),
                    "name" => out.push_str(name),
                    "levelname" => out.push_str(level.as_str()),
                    "message" => out.push_str(message),
                    _ => out.push_str(&rest[start..start + 2 + end + 2])
                }
                rest = &field[end + 2..];
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn init(config: &LoggingConfig) -> Result<()>
{
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(file_name) = &config.file {
        let file = File::create(file_name)
            .map_err(|e| Error::Config(format!("Failed to open log file {}: {}", file_name, e)))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    if let Some(format) = config.format.clone() {
        builder.format(move |buf, record| {
            let asctime = buf.timestamp().to_string();
            let message = record.args().to_string();
            writeln!(buf, "{}", render(&format, &asctime, record.target(), record.level(), &message))
        });
    }
    builder.try_init()
        .map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}

#[test]
fn placeholders()
{
    let line = render("%(asctime)s - %(name)s - %(levelname)s - %(message)s",
                      "2024-05-01T10:00:00Z", "stream_printer::printer",
                      log::Level::Warn, "Command queue full");
    assert_eq!(line, "2024-05-01T10:00:00Z - stream_printer::printer - WARN - Command queue full");
    assert_eq!(render("[%(levelname)s] %(lineno)d %(message)s", "", "", log::Level::Info, "hi"),
               "[INFO] %(lineno)d hi");
    assert_eq!(render("plain %(message", "", "", log::Level::Info, "x"), "plain %(message");
}
