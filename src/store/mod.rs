mod writer;

pub use writer::StoreWriter;
