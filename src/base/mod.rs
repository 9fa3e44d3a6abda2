pub mod types {
    /// Object number: type alias for `u64`.
    pub type ObjNum = u64;
    /// Object generation: type alias for `u16`.
    ///
    /// NB that cross-reference streams could technically encode larger
    /// generation numbers, but no real-world case is likely. Values not
    /// fitting into `u16` are reported as malformed.
    pub type ObjGen = u16;
    /// Offset within a file: type alias for `u64`.
    pub type Offset = u64;
}

mod name;
pub use name::*;

mod number;
pub use number::*;

mod dict;
pub use dict::*;

mod object;
pub use object::*;

mod stream;
pub use stream::*;

mod string;

mod xref;
pub use xref::*;

mod error;
pub use error::*;
