/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` (with `#[serde(default = ...)]` for
/// optional settings) and call `Config::from_env()` at startup. Field names map
/// to upper-case env vars, e.g. `redis_queue_key` ← `REDIS_QUEUE_KEY`.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Deserialize from the process environment.
    fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Deserialize from an explicit set of key/value pairs (tests, tooling).
    fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
