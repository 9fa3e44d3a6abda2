mod bs;
pub(crate) mod cc;
mod op;
mod tk;
mod xs;

pub use bs::ByteSource;
pub use op::ObjectParser;
pub use tk::{Token, Tokenizer};
