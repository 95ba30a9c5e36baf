//! Object detector capability and backends.
//!
//! The detector is an opaque capability: given one RGB frame it returns
//! `(class, confidence, box)` tuples. Backends are loaded once into a
//! `BackendRegistry` and shared read-only across analysis runs.

mod backend;
mod backends;
pub mod coco;
mod registry;
mod result;

pub use backend::ObjectDetector;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, RawDetection};
