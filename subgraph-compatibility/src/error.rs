use std::path::PathBuf;

use apollo_compiler::Schema;
use apollo_compiler::ast::Document;
use apollo_compiler::validation::WithErrors;
use thiserror::Error;

use crate::diff::SchemaDiff;
use crate::link::LinkError;

/// Errors turning an SDL string into canonical subgraph SDL.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The input is not syntactically valid GraphQL SDL.
    #[error("Invalid GraphQL SDL:\n{message}")]
    Parse { message: String },
    /// The SDL parsed but does not form a schema (duplicate definitions and the like).
    #[error("Invalid GraphQL schema:\n{message}")]
    Build { message: String },
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl From<WithErrors<Document>> for NormalizeError {
    fn from(value: WithErrors<Document>) -> Self {
        NormalizeError::Parse {
            message: value.errors.to_string(),
        }
    }
}

impl From<WithErrors<Schema>> for NormalizeError {
    fn from(value: WithErrors<Schema>) -> Self {
        NormalizeError::Build {
            message: value.errors.to_string(),
        }
    }
}

/// Failures loading a reference schema.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Failures talking to the subgraph under test.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to subgraph failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Subgraph responded with HTTP {status}: {body}")]
    Status {
        status: http::StatusCode,
        body: String,
    },
    #[error("Subgraph response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Reasons a compatibility check did not pass.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response did not have the shape the check expects.
    #[error("Unexpected response shape: {0}")]
    Shape(String),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("Subgraph schema does not match the expected schema:\n{0}")]
    Mismatch(SchemaDiff),
}
