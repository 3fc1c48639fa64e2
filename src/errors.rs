use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FieldgateError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(fieldgate::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(
        code(fieldgate::config),
        help("Check the settings file and any FIELDGATE__ environment overrides")
    )]
    Config(#[from] config::ConfigError),

    #[error("Invalid field registry: {0}")]
    #[diagnostic(
        code(fieldgate::registry),
        help("Field names must be unique per entity and every group member must be a canonical field")
    )]
    Registry(String),

    #[error("Unknown entity `{0}`")]
    #[diagnostic(
        code(fieldgate::unknown_entity),
        help("Known entities are `game`, `developer` and `character`")
    )]
    UnknownEntity(String),
}
