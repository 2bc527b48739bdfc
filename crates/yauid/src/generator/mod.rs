mod file;
#[cfg(feature = "lock")]
mod mutex;
mod policy;
#[cfg(feature = "lock")]
mod shared;
mod state;

pub use file::*;
pub use policy::*;
#[cfg_attr(docsrs, doc(cfg(feature = "lock")))]
#[cfg(feature = "lock")]
pub use shared::*;
