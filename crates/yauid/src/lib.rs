#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
#[cfg(all(unix, feature = "generator"))]
mod generator;
mod key;
mod node;
mod time;

pub use crate::error::*;
#[cfg_attr(docsrs, doc(cfg(feature = "generator")))]
#[cfg(all(unix, feature = "generator"))]
pub use crate::generator::*;
pub use crate::key::*;
pub use crate::node::*;
pub use crate::time::*;
