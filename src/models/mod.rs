pub mod certificate;
pub mod document;
pub mod edit_log;
pub mod enums;

pub use certificate::*;
pub use document::*;
pub use edit_log::*;
pub use enums::*;
