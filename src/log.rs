use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use once_cell::sync::Lazy;
use chrono::Local;

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Initialize logging to a timestamped file under `~/.infiniscroll/logs`
pub fn init() -> std::io::Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".infiniscroll")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("infiniscroll_{}.log", timestamp));
    init_at(&log_path)?;

    Ok(log_path)
}

/// Initialize logging to an explicit file path
pub fn init_at(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }

    log("=== infiniscroll started ===");

    Ok(())
}

/// Log a message with timestamp
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }
}

/// Log a pager diagnostic, tagged with the instance id
pub fn log_diagnostic(instance_id: u32, msg: &str) {
    log(&format!("[infscr {}] {}", instance_id, msg));
}

/// Log an outgoing fetch
pub fn log_fetch(instance_id: u32, url: &str) {
    let display = match url.char_indices().nth(500) {
        Some((cut, _)) => format!("{}... ({} bytes total)", &url[..cut], url.len()),
        None => url.to_string(),
    };
    log_diagnostic(instance_id, &format!("--> {}", display));
}

/// Log an event
pub fn log_event(event: &str) {
    log(&format!("[EVENT] {}", event));
}
