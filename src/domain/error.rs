use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {entity} field `{field}`")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
    },
}

impl DomainError {
    pub fn invalid_field(entity: &'static str, field: &'static str) -> Self {
        Self::InvalidField { entity, field }
    }

    /// Field name carried by a validation failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
        }
    }
}
