use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store error: {0}")]
    Store(#[from] sled::Error),

    #[error("binary encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stage `{stage}` produced {actual} records for {expected} input documents")]
    StageCount { stage: &'static str, expected: usize, actual: usize },

    #[error("stage `{stage}` needs field `{field}` of document {document}; run the earlier stages first")]
    MissingField { stage: &'static str, document: String, field: &'static str },

    #[error("stage `{stage}` failed on document {document}: {source}")]
    InStage {
        stage: &'static str,
        document: String,
        #[source]
        source: Box<Error>,
    },

    #[error("no lemmatizer category for part-of-speech tag `{tag}` (prefix `{prefix}`)")]
    UnknownPosPrefix { tag: String, prefix: String },

    #[error("lemma counts of document {document} sum to {counted} but it has {tokens} normalized tokens")]
    CountMismatch { document: String, counted: usize, tokens: usize },

    #[error("invalid article at {path}:{line}: {message}")]
    InvalidArticle { path: String, line: usize, message: String },

    #[error("document id {0} appears more than once in the corpus")]
    DuplicateDocument(String),

    #[error("malformed index: {0}")]
    MalformedIndex(String),

    #[error("corrupt record store: {0}")]
    CorruptRecord(String),

    #[error("configuration error: {0}")]
    Config(String),
}
