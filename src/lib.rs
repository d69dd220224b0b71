#![cfg_attr(docsrs, feature(doc_cfg))]

//! Building blocks for chown-style tools: resolution of "user[:group]" ownership specifiers into numeric IDs
//! ([ownership]) and a symlink-aware, cycle-safe recursive filesystem walker ([walk]).

pub mod fs;

pub mod ownership;

#[cfg(feature = "runtime-util")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime-util")))]
pub mod runtime;

mod syscall;

pub mod walk;
