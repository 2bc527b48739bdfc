mod key;
mod layout;
mod range;

pub use key::*;
pub use layout::*;
pub use range::*;
