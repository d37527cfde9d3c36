use std::error::Error;

use rusoto_core::region::ParseRegionError;
use rusoto_core::RusotoError;
use rusoto_sts::AssumeRoleError;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::schema::FieldType;

#[derive(Debug)]
pub enum BlockError {
    UnknownOperation(String),
    MissingField(String),
    InvalidFieldType {
        field: String,
        expected: FieldType,
    },
    InvalidInput(String),
    InvalidRegion(ParseRegionError),
    AssumeRole(RusotoError<AssumeRoleError>),
    MissingAssumedCredentials,
    Api {
        operation: &'static str,
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    Serialization(serde_json::Error),
    Emit(String),
}

impl BlockError {
    /// Wraps an SDK failure of `operation`, keeping the typed error as the source.
    pub fn api<E>(operation: &'static str, error: RusotoError<E>) -> BlockError
    where
        E: Error + Send + Sync + 'static,
    {
        BlockError::Api {
            operation,
            source: Box::new(error),
        }
    }
}

impl Display for BlockError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            BlockError::UnknownOperation(ref name) => write!(f, "Unknown operation: {}", name),
            BlockError::MissingField(ref field) => {
                write!(f, "Missing required input field: {}", field)
            }
            BlockError::InvalidFieldType {
                ref field,
                ref expected,
            } => write!(f, "Input field {} must be of type {}", field, expected),
            BlockError::InvalidInput(ref message) => write!(f, "Invalid input: {}", message),
            BlockError::InvalidRegion(ref error) => Display::fmt(error, f),
            BlockError::AssumeRole(ref error) => write!(f, "Failed to assume role: {}", error),
            BlockError::MissingAssumedCredentials => {
                write!(f, "AssumeRole response did not contain credentials")
            }
            BlockError::Api {
                operation,
                ref source,
            } => write!(f, "{} failed: {}", operation, source),
            BlockError::Serialization(ref error) => {
                write!(f, "Failed to serialize response: {}", error)
            }
            BlockError::Emit(ref message) => write!(f, "Failed to emit event: {}", message),
        }
    }
}

impl Error for BlockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            BlockError::InvalidRegion(ref error) => Some(error),
            BlockError::AssumeRole(ref error) => Some(error),
            BlockError::Api { ref source, .. } => Some(source.as_ref()),
            BlockError::Serialization(ref error) => Some(error),
            _ => None,
        }
    }
}

impl From<ParseRegionError> for BlockError {
    fn from(e: ParseRegionError) -> BlockError {
        BlockError::InvalidRegion(e)
    }
}

impl From<RusotoError<AssumeRoleError>> for BlockError {
    fn from(e: RusotoError<AssumeRoleError>) -> BlockError {
        BlockError::AssumeRole(e)
    }
}

impl From<serde_json::Error> for BlockError {
    fn from(e: serde_json::Error) -> BlockError {
        BlockError::Serialization(e)
    }
}
