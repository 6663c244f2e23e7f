//! Builder for compact indexed method stores.
//!
//! Reads a method collection XML, converts each method to a fixed binary
//! record (device-encoded title, notation words, lead count, hunt bells),
//! and writes one store file per stage with a sparse prefix index over
//! normalized search keys. Also generates the C++ lookup header the
//! on-device reader compiles against.

pub mod build;
pub mod charset;
pub mod error;
pub mod format;
pub mod gen;
pub mod method;
pub mod ringing;
pub mod search;
pub mod source;
pub mod store;

pub use build::{build_stores, BuildReport};
pub use charset::DeviceCharset;
pub use error::{CcmlError, Result};
pub use method::Method;
pub use search::{Classifier, SearchKey};
pub use store::StoreWriter;
