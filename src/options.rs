/// Flags controlling where decoded values come from during a line-format
/// load. The tree codec ignores them.
///
/// All flags default to off: read the file table only, touch nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Consult the process environment for names missing from (or, without
    /// [`prefer_file_over_env`](Self::prefer_file_over_env), overriding)
    /// the file table.
    pub automatic_env: bool,

    /// With [`automatic_env`](Self::automatic_env): the file table wins and
    /// the environment is only a fallback. Without it, a set and non-empty
    /// environment variable wins over the file.
    pub prefer_file_over_env: bool,

    /// Write every `NAME=value` pair parsed from file content into the
    /// process environment. Process-wide and never torn down; see the
    /// crate-level notes on the single-threaded load contract.
    pub persist_to_env: bool,
}
