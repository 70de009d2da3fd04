//! File-backed settings store.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::{Settings, SettingsError};
use crate::paths::{expand_home, is_within};

/// Section marker that must head the settings file.
pub const SECTION_HEADER: &str = "[yt-dlp]";

const SECTION_NAME: &str = "yt-dlp";

/// Settings plus what the loader had to repair to produce them.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    /// Effective settings.
    pub settings: Settings,
    /// The file was missing or blank and was rewritten with defaults.
    pub regenerated: bool,
    /// The section header was missing and was inserted.
    pub header_repaired: bool,
    /// Human-readable notes about ignored or unparsable lines.
    pub warnings: Vec<String>,
}

/// Result of parsing settings text.
#[derive(Debug, Clone)]
pub struct ParsedSettings {
    pub settings: Settings,
    pub has_header: bool,
    pub warnings: Vec<String>,
}

/// Reads and writes [`Settings`] for a single file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    home: PathBuf,
}

impl SettingsStore {
    /// Creates a store for `path`, expanding `~` against `home`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            home: home.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, regenerating or repairing the file as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] when the file exists but cannot be read,
    /// and [`SettingsError::Write`] when a repair cannot be written back.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<LoadedSettings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if raw.trim().is_empty() {
            info!("settings file missing or blank, writing defaults");
            let settings = Settings::defaults(&self.home);
            self.save(&settings)?;
            return Ok(LoadedSettings {
                settings,
                regenerated: true,
                header_repaired: false,
                warnings: Vec::new(),
            });
        }

        let parsed = parse_settings(&raw, &self.home);
        let header_repaired = !parsed.has_header;
        if header_repaired {
            warn!("settings file has no {SECTION_HEADER} header, inserting it");
            self.write_raw(&format!("{SECTION_HEADER}\n{raw}"))?;
        }
        for warning in &parsed.warnings {
            warn!(%warning, "settings entry ignored");
        }

        Ok(LoadedSettings {
            settings: parsed.settings,
            regenerated: false,
            header_repaired,
            warnings: parsed.warnings,
        })
    }

    /// Writes all settings, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Write`] if the file or its directory cannot be written.
    #[instrument(skip(self, settings), fields(path = %self.path.display()))]
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.write_raw(&render_settings(settings))?;
        debug!("settings saved");
        Ok(())
    }

    fn write_raw(&self, contents: &str) -> Result<(), SettingsError> {
        let to_error = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        fs::write(&self.path, contents).map_err(to_error)
    }
}

/// Parses settings text. Missing keys and bad values fall back to defaults.
#[must_use]
pub fn parse_settings(raw: &str, home: &Path) -> ParsedSettings {
    let mut settings = Settings::defaults(home);
    let mut has_header = false;
    let mut in_section = true;
    let mut warnings = Vec::new();

    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = raw_line.trim();
        let line_no = line_index + 1;
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim() == SECTION_NAME;
            has_header |= in_section;
            if !in_section {
                warnings.push(format!("line {line_no}: unknown section [{}]", name.trim()));
            }
            continue;
        }
        if !in_section {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            warnings.push(format!("line {line_no}: expected key=value"));
            continue;
        };
        let key = raw_key.trim().to_ascii_lowercase();
        let value = raw_value.trim();

        if let Err(reason) = apply_entry(&mut settings, &key, value, home) {
            warnings.push(format!("line {line_no}: {reason}"));
        }
    }

    if is_within(&settings.download_dir, &settings.staging_dir) {
        warnings.push(format!(
            "download_directory {} is inside temp_download_directory {}; `start` with the temporary folder enabled will refuse to run",
            settings.download_dir.display(),
            settings.staging_dir.display()
        ));
    }

    ParsedSettings {
        settings,
        has_header,
        warnings,
    }
}

fn apply_entry(settings: &mut Settings, key: &str, value: &str, home: &Path) -> Result<(), String> {
    match key {
        "download_directory" => settings.download_dir = expand_home(value, home),
        "temp_download_directory" => settings.staging_dir = expand_home(value, home),
        "yt_dlp_options" => settings.tool_args = value.to_string(),
        "use_temp_folder" => settings.use_staging = parse_bool(key, value)?,
        "suppress_output" => settings.suppress_output = parse_bool(key, value)?,
        "debug" => settings.debug = parse_bool(key, value)?,
        "validate_urls" => settings.validate_urls = parse_bool(key, value)?,
        "check_links" => settings.check_links = parse_bool(key, value)?,
        "retry_delay" => {
            settings.retry_delay_minutes = value
                .parse::<u64>()
                .map_err(|_| format!("invalid `retry_delay` value '{value}', keeping default"))?;
        }
        "tool_binary" => {
            if value.is_empty() {
                return Err("empty `tool_binary`, keeping default".to_string());
            }
            settings.tool_binary = value.to_string();
        }
        // Written by older releases; has no effect.
        "pretty" => {}
        other => return Err(format!("unknown key `{other}`")),
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid `{key}` value '{value}', keeping default")),
    }
}

fn render_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Renders settings in file form, header first.
#[must_use]
pub fn render_settings(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{SECTION_HEADER}");
    let _ = writeln!(out, "download_directory={}", settings.download_dir.display());
    let _ = writeln!(
        out,
        "temp_download_directory={}",
        settings.staging_dir.display()
    );
    let _ = writeln!(out, "yt_dlp_options={}", settings.tool_args);
    let _ = writeln!(out, "use_temp_folder={}", render_bool(settings.use_staging));
    let _ = writeln!(out, "suppress_output={}", render_bool(settings.suppress_output));
    let _ = writeln!(out, "debug={}", render_bool(settings.debug));
    let _ = writeln!(out, "validate_urls={}", render_bool(settings.validate_urls));
    let _ = writeln!(out, "check_links={}", render_bool(settings.check_links));
    let _ = writeln!(out, "retry_delay={}", settings.retry_delay_minutes);
    let _ = writeln!(out, "tool_binary={}", settings.tool_binary);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn home() -> PathBuf {
        PathBuf::from("/home/ada")
    }

    #[test]
    fn test_parse_settings_reads_all_keys() {
        let raw = "[yt-dlp]\n\
                   download_directory=~/Videos\n\
                   temp_download_directory=/scratch/stage\n\
                   yt_dlp_options=-f best -N 4\n\
                   use_temp_folder=yes\n\
                   suppress_output=False\n\
                   debug=on\n\
                   validate_urls=0\n\
                   check_links=no\n\
                   retry_delay=3\n\
                   tool_binary=/opt/yt-dlp\n";
        let parsed = parse_settings(raw, &home());
        assert!(parsed.has_header);
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);

        let s = parsed.settings;
        assert_eq!(s.download_dir, PathBuf::from("/home/ada/Videos"));
        assert_eq!(s.staging_dir, PathBuf::from("/scratch/stage"));
        assert_eq!(s.tool_args, "-f best -N 4");
        assert!(s.use_staging);
        assert!(!s.suppress_output);
        assert!(s.debug);
        assert!(!s.validate_urls);
        assert!(!s.check_links);
        assert_eq!(s.retry_delay_minutes, 3);
        assert_eq!(s.tool_binary, "/opt/yt-dlp");
    }

    #[test]
    fn test_parse_settings_keeps_equals_in_value() {
        let raw = "[yt-dlp]\nyt_dlp_options=-o %(title)s.%(ext)s --postprocessor-args ffmpeg:-x=1\n";
        let parsed = parse_settings(raw, &home());
        assert_eq!(
            parsed.settings.tool_args,
            "-o %(title)s.%(ext)s --postprocessor-args ffmpeg:-x=1"
        );
    }

    #[test]
    fn test_parse_settings_bad_values_fall_back_to_defaults() {
        let raw = "[yt-dlp]\nretry_delay=soon\nuse_temp_folder=maybe\nmystery=1\n";
        let parsed = parse_settings(raw, &home());
        let defaults = Settings::defaults(&home());
        assert_eq!(parsed.settings, defaults);
        assert_eq!(parsed.warnings.len(), 3);
        assert!(parsed.warnings[0].contains("line 2"));
        assert!(parsed.warnings[2].contains("mystery"));
    }

    #[test]
    fn test_parse_settings_warns_when_download_dir_is_staging_dir() {
        let raw = "[yt-dlp]\ndownload_directory=~/Downloads\ntemp_download_directory=~/Downloads/\n";
        let parsed = parse_settings(raw, &home());
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("inside temp_download_directory"));
    }

    #[test]
    fn test_parse_settings_without_header_still_reads_keys() {
        let parsed = parse_settings("retry_delay=7\n", &home());
        assert!(!parsed.has_header);
        assert_eq!(parsed.settings.retry_delay_minutes, 7);
    }

    #[test]
    fn test_parse_settings_ignores_other_sections() {
        let raw = "[yt-dlp]\nretry_delay=7\n[other]\nretry_delay=99\n";
        let parsed = parse_settings(raw, &home());
        assert_eq!(parsed.settings.retry_delay_minutes, 7);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_render_then_parse_is_identity() {
        let mut settings = Settings::defaults(&home());
        settings.use_staging = true;
        settings.tool_args = "-x --audio-format mp3".to_string();
        settings.retry_delay_minutes = 0;
        let parsed = parse_settings(&render_settings(&settings), &home());
        assert_eq!(parsed.settings, settings);
        assert!(parsed.has_header);
    }

    #[test]
    fn test_render_starts_with_header() {
        let rendered = render_settings(&Settings::defaults(&home()));
        assert!(rendered.starts_with("[yt-dlp]\n"));
        assert!(rendered.contains("use_temp_folder=False\n"));
        assert!(rendered.contains("suppress_output=True\n"));
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cfg").join("options.conf");
        let store = SettingsStore::new(&path, temp.path());

        let loaded = store.load().unwrap();
        assert!(loaded.regenerated);
        assert_eq!(loaded.settings, Settings::defaults(temp.path()));
        assert!(fs::read_to_string(&path).unwrap().starts_with(SECTION_HEADER));
    }

    #[test]
    fn test_load_blank_file_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.conf");
        fs::write(&path, "  \n\n").unwrap();
        let loaded = SettingsStore::new(&path, temp.path()).load().unwrap();
        assert!(loaded.regenerated);
    }

    #[test]
    fn test_load_inserts_missing_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.conf");
        fs::write(&path, "retry_delay=4\n").unwrap();

        let loaded = SettingsStore::new(&path, temp.path()).load().unwrap();
        assert!(loaded.header_repaired);
        assert_eq!(loaded.settings.retry_delay_minutes, 4);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[yt-dlp]\nretry_delay=4\n"
        );
    }
}
