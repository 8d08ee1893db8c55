use crate::types::AssetType;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid asset definition: {0}")]
    InvalidDefinition(String),

    #[error("{kind} '{name}' is not registered")]
    NotFound { kind: AssetType, name: String },

    #[error("No delivery state stored for this session")]
    MissingDeliveryState,

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("I/O error: {0}")]
    Io(String),
}
