use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Syntax errors raised while compiling a pattern string.
///
/// Positions are byte offsets into the pattern source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("pattern must not be empty")]
    Empty,

    #[error("pattern must not contain whitespace (at {0})")]
    Whitespace(usize),

    #[error("unclosed optional group opened at {0}")]
    UnclosedGroup(usize),

    #[error("unexpected `)` at {0}")]
    UnexpectedClose(usize),

    #[error("empty optional group at {0}")]
    EmptyGroup(usize),

    #[error("dangling escape character at {0}")]
    DanglingEscape(usize),

    #[error("{names} parameter names for {groups} capture groups")]
    NameCount { names: usize, groups: usize },

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl From<serde_yaml::Error> for RouterError {
    fn from(e: serde_yaml::Error) -> Self {
        RouterError::Config(e.to_string())
    }
}
