pub mod bundle;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
pub mod partition;
pub mod pdf;
pub mod scratch;

pub use bundle::{write_bundle, OutputBundle, OutputDocument};
pub use error::DocumentError;
pub use partition::{partition, PageSource};
pub use pdf::PdfDocument;
pub use scratch::ScratchDir;
