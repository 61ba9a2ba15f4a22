#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {category} pattern for key `{key}` (`{pattern}`): {source}")]
    InvalidPattern {
        category: &'static str,
        key: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
