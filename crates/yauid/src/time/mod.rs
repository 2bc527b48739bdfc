#[cfg(feature = "datetime")]
mod datetime;
mod interface;

#[cfg_attr(docsrs, doc(cfg(feature = "datetime")))]
#[cfg(feature = "datetime")]
pub use datetime::*;
pub use interface::*;
