pub mod access;
pub mod search;

pub use access::visible_polls;
pub use search::matching;
