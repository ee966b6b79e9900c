use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::io::{Result as IoResult, Write};
use std::path::Path;

use chrono::Local;

pub const RUN_LOG_FILE: &str = "run_log.txt";

pub fn open_run_log(dir: &Path) -> IoResult<BufWriter<File>> {
    let logfile = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(RUN_LOG_FILE))?;
    Ok(BufWriter::new(logfile))
}

pub fn log_line<W: Write>(writer: &mut W, message: &str) -> IoResult<()> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(writer, "[{}] {}", now, message)?;
    writer.flush()?;
    Ok(())
}
