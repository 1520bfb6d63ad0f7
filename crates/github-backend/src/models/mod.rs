pub mod comment;
pub mod issue;

pub use comment::*;
pub use issue::*;
