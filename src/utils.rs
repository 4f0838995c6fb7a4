use std::path::{Path, PathBuf};
use std::time::Duration;

/// Face model location relative to the executable's directory.
pub const DEFAULT_MODEL_RELATIVE_PATH: &str = "models/seeta_fd_frontal_v1.0.bin";

/// Input extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified (lowercase, dotless) extensions
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    match get_file_extension(path) {
        Some(ext) => extensions.contains(&ext),
        None => false,
    }
}

/// Parse a comma separated extension list (`".JPG, png"`) into lowercase,
/// dotless, de-duplicated entries.
pub fn parse_extensions(list: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();

    for ext in list.split(',') {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }

    extensions
}

/// Resolve the default face model path next to the running executable.
pub fn default_model_path() -> PathBuf {
    let base_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    base_dir.join(DEFAULT_MODEL_RELATIVE_PATH)
}

/// File name of `path` for log and console output.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
