//! Errors and error-related utilities.

use std::{error, fmt, result};

/// The result type used throughout this library.
pub type Result<T> = result::Result<T, Box<dyn error::Error>>;

/// Invalid input.
#[derive(Debug)]
pub struct InvalidInput(pub String);

/// A source table that cannot be interpreted with its declared sheet
/// specification. Fatal: the run aborts before any output is written.
#[derive(Debug)]
pub struct SchemaError(pub String);

/// Two joinable tables carry differing non-empty values for the same
/// field of the same library. Fatal: the run aborts.
#[derive(Debug)]
pub struct ConflictError {
    pub field: String,
    pub library_id: String,
    pub left: String,
    pub right: String,
}

/// A collaborator could not deliver its data.
#[derive(Debug)]
pub struct FetchError(pub String);

/// The rendered manifest does not conform to the samplesheet schema.
/// Carries every violation found, not just the first. Fatal: nothing
/// is written.
#[derive(Debug)]
pub struct ValidationError(pub Vec<String>);

/// A failure scoped to one sample. The sample is excluded from the
/// manifest and reported; the run continues.
#[derive(Debug)]
pub enum SampleError {
    /// No delivered metrics for the project and no known latest
    /// version for the required tool.
    Resolution(String),
    /// The sample's library types map to no known command.
    CommandDerivation(String),
    /// Libraries of one sample disagree on a value that must be
    /// uniform across the sample.
    Consistency(String),
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid input: {}", self.0)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "schema error: {}", self.0)
    }
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "conflicting values for {} of library {}: '{}' vs. '{}'",
            self.field, self.library_id, self.left, self.right
        )
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fetch error: {}", self.0)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "manifest validation failed:")?;
        for violation in &self.0 {
            writeln!(f, "- {violation}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleError::Resolution(s) => write!(f, "resolution error: {s}"),
            SampleError::CommandDerivation(s) => write!(f, "command derivation error: {s}"),
            SampleError::Consistency(s) => write!(f, "consistency error: {s}"),
        }
    }
}

impl error::Error for InvalidInput {}

impl error::Error for SchemaError {}

impl error::Error for ConflictError {}

impl error::Error for FetchError {}

impl error::Error for ValidationError {}

impl error::Error for SampleError {}

/// A helper for constructing [InvalidInput].
pub fn invalid_input(s: String) -> Box<dyn error::Error> {
    InvalidInput(s).into()
}

/// A helper for constructing [InvalidInput].
pub fn invalid_input_ref(s: &str) -> Box<dyn error::Error> {
    InvalidInput(s.to_owned()).into()
}

/// A helper for constructing [SchemaError].
pub fn schema_error(s: String) -> Box<dyn error::Error> {
    SchemaError(s).into()
}

/// A helper for constructing [FetchError].
pub fn fetch_error(s: String) -> Box<dyn error::Error> {
    FetchError(s).into()
}
