mod filter;
mod xml;

pub use filter::{AllFilter, ClassificationFilter, MethodFilter, StageFilter, TitleFilter};
pub use xml::{read_methods, read_methods_from_path, Classification, RawMethod, VALID_CLASSES};
