//! The load session: multi-file loading with extension dispatch,
//! zero-skip accumulation, and write-back.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::merge;
use crate::options::DecodeOptions;
use crate::registry::CodecRegistry;

/// A configuration load session for records of type `T`.
///
/// Each loaded source decodes into a partial record which is folded into
/// the accumulated value with zero-value skipping, so later sources only
/// override the fields they actually populate. The session owns the
/// accumulating record until the load completes; afterwards
/// [`config`](Self::config) hands out shared references freely.
///
/// ```ignore
/// let mut session = Stratum::<AppConfig>::new();
/// session.load_config_files(["base.json", "local.env"])?;
/// let config = session.config();
/// ```
pub struct Stratum<T> {
    decode_opts: DecodeOptions,
    config_files: Vec<PathBuf>,
    registry: CodecRegistry<T>,
    value: T,
}

impl<T> Stratum<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new() -> Self {
        Stratum {
            decode_opts: DecodeOptions::default(),
            config_files: Vec::new(),
            registry: CodecRegistry::new(),
            value: T::default(),
        }
    }

    /// Replace the codec registry, e.g. to add third-party formats.
    pub fn with_registry(mut self, registry: CodecRegistry<T>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the decode options applied to every subsequent load.
    pub fn decode_options(mut self, opts: DecodeOptions) -> Self {
        self.decode_opts = opts;
        self
    }

    /// Remember files to load ahead of any passed to
    /// [`load_config_files`](Self::load_config_files).
    pub fn set_config_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config_files = files.into_iter().map(Into::into).collect();
    }

    /// Load and merge configuration files, in order: first the ones set
    /// via [`set_config_files`](Self::set_config_files), then the given
    /// ones. An empty combined list falls back to `[".env"]`. The format
    /// is chosen by file extension.
    pub fn load_config_files<I, P>(&mut self, files: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut all = self.config_files.clone();
        all.extend(files.into_iter().map(|p| p.as_ref().to_path_buf()));
        if all.is_empty() {
            all.push(PathBuf::from(".env"));
        }
        for path in &all {
            let partial = self.load_file(path)?;
            merge::merge_records(&mut self.value, &partial)?;
        }
        Ok(())
    }

    /// Load one source from a reader in the named format and merge it.
    pub fn load_config<R: Read>(&mut self, mut src: R, format: &str) -> Result<(), Error> {
        let mut buf = Vec::new();
        src.read_to_end(&mut buf).map_err(|source| Error::Io {
            path: PathBuf::from("<stream>"),
            source,
        })?;
        let codec = self.registry.get(format)?;
        let partial = codec.decode(&buf, &self.decode_opts)?;
        merge::merge_records(&mut self.value, &partial)
    }

    fn load_file(&self, path: &Path) -> Result<T, Error> {
        let buf = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let codec = self.registry.get(&file_format(path)?)?;
        codec.decode(&buf, &self.decode_opts)
    }

    /// Encode a record to a writer in the named format.
    pub fn write_config<W: Write>(&self, mut out: W, format: &str, config: &T) -> Result<(), Error> {
        let codec = self.registry.get(format)?;
        let bytes = codec.encode(config)?;
        out.write_all(&bytes).map_err(|source| Error::Io {
            path: PathBuf::from("<stream>"),
            source,
        })
    }

    /// Encode a record to a file, format chosen by extension.
    pub fn write_config_file<P: AsRef<Path>>(&self, path: P, config: &T) -> Result<(), Error> {
        let path = path.as_ref();
        let codec = self.registry.get(&file_format(path)?)?;
        let bytes = codec.encode(config)?;
        std::fs::write(path, bytes).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Borrow the merged configuration.
    pub fn config(&self) -> &T {
        &self.value
    }

    /// Take ownership of the merged configuration.
    pub fn into_config(self) -> T {
        self.value
    }
}

impl<T> Default for Stratum<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The format of a file, from the last `.`-separated component of its
/// name. Dotfiles like `.env` count as having an extension.
fn file_format(path: &Path) -> Result<String, Error> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext.to_string()),
        _ => Err(Error::UnknownFormat(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::fixtures::test::{AppConfig, DbConfig};
    use crate::value::Value;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn file_format_uses_the_last_dot() {
        assert_eq!(file_format(Path::new("app.json")).unwrap(), "json");
        assert_eq!(file_format(Path::new(".env")).unwrap(), "env");
        assert_eq!(file_format(Path::new("dir/.example.env")).unwrap(), "env");
        assert!(file_format(Path::new("Makefile")).is_err());
    }

    #[test]
    fn loads_a_single_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "app.env",
            "SIMPLE_E=2\nDEBUG=true\nDATABASE_USER=dbtest\n",
        );
        let mut session = Stratum::<AppConfig>::new();
        session.load_config_files([&path]).unwrap();
        assert_eq!(session.config().simple_e, 2);
        assert!(session.config().debug);
        assert_eq!(session.config().database.user, "dbtest");
    }

    #[test]
    fn loads_a_single_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "app.json",
            r#"{"simple_e": 2, "database": {"pooling_max": 200}}"#,
        );
        let mut session = Stratum::<AppConfig>::new();
        session.load_config_files([&path]).unwrap();
        assert_eq!(session.config().simple_e, 2);
        assert_eq!(session.config().database.pooling_max, 200);
    }

    #[test]
    fn multi_file_merge_skips_zero_values() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = write(dir.path(), "a.env", "SIMPLE_E=2\nDEBUG=true\n");
        let file_b = write(dir.path(), "b.env", "DEBUG=false\nEXAMPLE_TYPE=senin\n");
        let mut session = Stratum::<AppConfig>::new();
        session.set_config_files([&file_a]);
        session.load_config_files([&file_b]).unwrap();
        assert_eq!(session.config().simple_e, 2);
        assert!(session.config().debug); // explicit false is the zero value
        assert_eq!(session.config().example_type, "senin");
    }

    #[test]
    fn formats_mix_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = write(dir.path(), "base.json", r#"{"simple_e": 7}"#);
        let file_b = write(dir.path(), "local.env", "DATABASE_POOLING_MAX=200\n");
        let mut session = Stratum::<AppConfig>::new();
        session.load_config_files([&file_a, &file_b]).unwrap();
        assert_eq!(session.config().simple_e, 7);
        assert_eq!(session.config().database.pooling_max, 200);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut session = Stratum::<AppConfig>::new();
        let err = session
            .load_config_files([Path::new("/no/such/file.env")])
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn unknown_extension_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.yaml", "a: 1\n");
        let mut session = Stratum::<AppConfig>::new();
        let err = session.load_config_files([&path]).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(f) if f == "yaml"));
    }

    #[test]
    fn custom_registry_dispatches_by_extension() {
        use std::sync::Arc;

        use crate::env::EnvCodec;

        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.dotenv", "SIMPLE_E=4\n");
        let registry = CodecRegistry::new();
        registry.register("dotenv", Arc::new(EnvCodec));
        let mut session = Stratum::<AppConfig>::new().with_registry(registry);
        session.load_config_files([&path]).unwrap();
        assert_eq!(session.config().simple_e, 4);
    }

    #[test]
    fn decode_options_apply_to_every_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.env", "SIMPLE_E=6\n");
        unsafe { std::env::set_var("EXAMPLE_TYPE", "from_env") };
        let mut session = Stratum::<AppConfig>::new().decode_options(DecodeOptions {
            automatic_env: true,
            ..DecodeOptions::default()
        });
        session.load_config_files([&path]).unwrap();
        assert_eq!(session.config().simple_e, 6);
        assert_eq!(session.config().example_type, "from_env");
        unsafe { std::env::remove_var("EXAMPLE_TYPE") };
    }

    #[test]
    fn load_config_reads_from_a_reader() {
        let mut session = Stratum::<AppConfig>::new();
        session
            .load_config(&b"SIMPLE_E=5\n"[..], "env")
            .unwrap();
        assert_eq!(session.config().simple_e, 5);
    }

    #[test]
    fn write_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            simple_c: "c".into(),
            simple_e: 100,
            debug: true,
            example_type: "hore".into(),
            database: DbConfig {
                user: "u".into(),
                server_port: "sp".into(),
                pooling_max: 9,
            },
        };
        let session = Stratum::<AppConfig>::new();

        for name in ["out.env", "out.json"] {
            let path = dir.path().join(name);
            session.write_config_file(&path, &config).unwrap();
            let mut reload = Stratum::<AppConfig>::new();
            reload.load_config_files([&path]).unwrap();
            assert_eq!(reload.config(), &config, "via {name}");
        }
    }

    #[test]
    fn write_config_to_a_writer() {
        let session = Stratum::<AppConfig>::new();
        let mut out = Vec::new();
        session
            .write_config(&mut out, "env", &AppConfig {
                simple_e: 1,
                ..AppConfig::default()
            })
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("SIMPLE_E=1\n"));
    }

    #[test]
    fn dynamic_sessions_accumulate_tables() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = write(dir.path(), "a.env", "SIMPLE_C=hore\n");
        let file_b = write(dir.path(), "b.env", "DB_POLING_MAX_POOL=200\n");
        let mut session = Stratum::<Value>::new();
        session.load_config_files([&file_a, &file_b]).unwrap();
        assert_eq!(
            session.config().get("SIMPLE_C"),
            Some(&Value::String("hore".into()))
        );
        assert_eq!(
            session.config().get("DB_POLING_MAX_POOL"),
            Some(&Value::Number(200.0))
        );
    }

    #[test]
    fn into_config_hands_over_the_value() {
        let mut session = Stratum::<AppConfig>::new();
        session.load_config(&b"SIMPLE_E=3\n"[..], "env").unwrap();
        let config = session.into_config();
        assert_eq!(config.simple_e, 3);
    }
}
