use filebuf::{Handle, Mode, OpenOptions};
use fs_runtime::FsRuntime;
use serde::Deserialize;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;
pub const BUFFER_SIZE_ENV: &str = "FILEBUF_BUFFER_SIZE";

/// Content of the `--config` JSON file.
///
/// ```json
/// { "buffer_size": 65536, "options": ["write", "create", "append"] }
/// ```
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub buffer_size: Option<usize>,
    /// Open options for output files, by name.
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

impl FileConfig {
    /// Parse JSON read from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are I/O errors reading from the provided reader
    /// - The JSON input is invalid or has unknown keys
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, String> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(format!("Failed to read config: {e:?}")),
            }
        }

        serde_json::from_slice(&buffer).map_err(|e| format!("Failed to parse config JSON: {e}"))
    }

    /// Read the file at `path` through a buffered handle.
    ///
    /// # Errors
    /// Open, read or parse failures.
    pub fn load<R: FsRuntime>(runtime: R, path: &str) -> Result<Self, String> {
        let mut handle = Handle::open(runtime, path, 1024, &OpenOptions::read())
            .map_err(|e| format!("{path}: {e}"))?;
        let config = Self::from_reader(&mut handle)?;
        handle.close().map_err(|e| format!("{path}: {e}"))?;
        Ok(config)
    }
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub buffer_size: usize,
    /// How `copy` opens its output. `stress` always truncates, since it
    /// verifies the file afterwards.
    pub output: OpenOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            output: OpenOptions::write().create(true).truncate(true),
        }
    }
}

fn parse_size(value: &str, source: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("{source}: expected a positive integer, got {value:?}")),
        Ok(n) => Ok(n),
    }
}

impl Config {
    /// Layer the sources; later ones win: defaults, config file, environment,
    /// command line.
    ///
    /// # Errors
    /// A non-positive or malformed size, or output options that do not
    /// decode to a write mode.
    pub fn resolve(
        file: Option<FileConfig>,
        env_buffer: Option<&str>,
        flag_buffer: Option<&str>,
    ) -> Result<Self, String> {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(size) = file.buffer_size {
                if size == 0 {
                    return Err("config: buffer_size must be positive".to_string());
                }
                config.buffer_size = size;
            }
            if let Some(names) = file.options {
                let output = OpenOptions::from_names(&names).map_err(|e| format!("config: {e}"))?;
                if output.mode != Mode::Write {
                    return Err("config: output options must include \"write\"".to_string());
                }
                config.output = output;
            }
        }
        if let Some(value) = env_buffer {
            config.buffer_size = parse_size(value, BUFFER_SIZE_ENV)?;
        }
        if let Some(value) = flag_buffer {
            config.buffer_size = parse_size(value, "--buffer")?;
        }
        Ok(config)
    }
}
