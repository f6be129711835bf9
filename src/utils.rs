/// Shared utility functions for the weather ingestion service
use std::path::Path;

/// Widest station id the `site_id` columns hold (`VARCHAR(32)`)
pub const MAX_STATION_ID_LEN: usize = 32;

/// Derive a station id from a station file path
///
/// Station identity comes from the file's own name: the stem (file name without
/// extension) is the id, and it must start with the configured prefix. File
/// content is never consulted.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use wx_ingest::utils::station_id_from_path;
///
/// assert_eq!(station_id_from_path(Path::new("wx_data/USC00110072.txt"), "USC").unwrap(), "USC00110072");
/// assert_eq!(station_id_from_path(Path::new("USC00257715.txt"), "USC").unwrap(), "USC00257715");
/// assert!(station_id_from_path(Path::new("wx_data/README.txt"), "USC").is_err());
/// ```
pub fn station_id_from_path(path: &Path, prefix: &str) -> Result<String, &'static str> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or("File name is not valid UTF-8")?
        .trim();

    if !stem.starts_with(prefix) {
        return Err("File name does not start with the station prefix");
    }

    if stem.len() == prefix.len() {
        return Err("File name has no station identifier after the prefix");
    }

    if stem.len() > MAX_STATION_ID_LEN {
        return Err("Station identifier is longer than 32 characters");
    }

    if !stem
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("Station identifier contains unexpected characters");
    }

    Ok(stem.to_string())
}
