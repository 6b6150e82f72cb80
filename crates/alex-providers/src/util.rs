use alex_domain::Error;

/// Converts a [`reqwest::Error`] into the domain error type, distinguishing
/// timeouts from other transport failures the way handlers need to.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolves an API key from the named environment variable.
pub(crate) fn resolve_api_key(env_var: &str) -> Result<String, Error> {
    std::env::var(env_var)
        .map_err(|_| Error::Config(format!("environment variable '{env_var}' not set")))
}
