pub mod config;
pub mod driver;
pub mod errors;
pub mod fastq;
pub mod grouping;
pub mod join;
pub mod local;
pub mod manifest;
pub mod metrics;
pub mod records;
pub mod source;
pub mod vocabulary;
