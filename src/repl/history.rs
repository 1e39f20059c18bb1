use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// A file path in the user's home directory, falling back to the current
/// directory when no home is known.
pub fn get_home_file(filename: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(filename)
}

/// Appends a line to the history file, creating it if needed.
///
/// # Errors
/// Returns an `io::Error` if the file cannot be opened or written to.
/// Callers treat history failures as non-fatal.
pub fn append_history(line: &str, path: &PathBuf) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", line.trim())?;
    writer.flush()?;
    Ok(())
}
