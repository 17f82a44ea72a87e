use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("lead field `{0}` must not be empty")]
    EmptyLeadField(&'static str),
    #[error("phone number `{0}` does not look dialable")]
    InvalidPhone(String),
    #[error("unknown lead status `{0}` (expected new|contacted|closed)")]
    UnknownLeadStatus(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError};

    #[test]
    fn domain_errors_render_actionable_messages() {
        let empty = DomainError::EmptyLeadField("full_name");
        assert_eq!(empty.to_string(), "lead field `full_name` must not be empty");

        let phone = DomainError::InvalidPhone("abc".to_string());
        assert!(phone.to_string().contains("abc"));
    }

    #[test]
    fn domain_error_wraps_into_application_error() {
        let wrapped = ApplicationError::from(DomainError::UnknownLeadStatus("done".to_string()));
        assert!(matches!(wrapped, ApplicationError::Domain(_)));
        assert!(wrapped.to_string().contains("done"));
    }
}
