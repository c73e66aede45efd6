//! sitepush: build a small Markdown-and-template website and push it to a
//! web host over SSH.
//!
//! The pipeline is two halves:
//! - [`build`] renders `content/{posts,projects}/*.md` through [`markdown`]
//!   and [`render`] into an output tree, then writes the index, projects and
//!   contact pages with link lists from [`links`].
//! - [`deploy`] diffs that tree against the remote host through the
//!   [`contract::RemoteHost`] seam (implemented by [`ssh::SshRemote`]) and
//!   creates missing directories and copies changed files.
//!
//! [`tree`] is the recursive, regex-filtered listing both halves share.

pub mod build;
pub mod cli;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod links;
pub mod load_config;
pub mod markdown;
pub mod output;
pub mod render;
pub mod ssh;
pub mod tree;

pub use cli::{run, Cli, Commands};
