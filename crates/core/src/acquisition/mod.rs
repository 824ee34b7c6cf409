//! Product acquisition: download and extraction.
//!
//! Products are processed strictly one at a time. The archive of a product
//! is deleted as soon as it has been extracted so that disk usage peaks at
//! one archive plus the extracted data.

mod config;
mod error;
mod stage;
mod traits;
mod zip_extractor;

pub use config::{AcquisitionConfig, DecodeErrorPolicy};
pub use error::AcquireError;
pub use stage::{archive_file_name, sample_products, AcquiredProduct, AcquisitionStage};
pub use traits::{Downloader, Extractor};
pub use zip_extractor::ZipExtractor;
