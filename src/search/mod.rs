mod classify;
mod jump;

pub use classify::{Classifier, SearchKey};
pub use jump::{
    bucket_index, bucket_prefixes, bucket_space, JumpSymbol, JUMP_CHAR_COUNT, LETTER_COUNT,
    STOP_COUNT,
};
