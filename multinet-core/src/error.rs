use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Unsupported unit '{unit}' for field {field}")]
    UnsupportedUnit { field: String, unit: String },
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Connectivity strategy '{0}' is not supported")]
    UnsupportedStrategy(String),
    #[error("Unsupported coordinate transformation from {from} to {to}")]
    UnsupportedTransform { from: String, to: String },
    #[error("The value '{value}' of field '{field}' is not a number for link {link_id}")]
    InvalidNumber {
        link_id: String,
        field: String,
        value: String,
    },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Nothing to export: {0}")]
    EmptyNetwork(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("OSM error: {0}")]
    OsmError(#[from] osmpbf::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Config write error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),
}
