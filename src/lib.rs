//! # Arsc
//!
//! A library for decoding Android compiled resources: the `resources.arsc`
//! table and compiled binary XML files such as `AndroidManifest.xml`.
//!
//! ```no_run
//!  use arsc::ResourceFile;
//!
//!  let bytes = std::fs::read("resources.arsc").unwrap();
//!  let file = ResourceFile::from_bytes(&bytes).unwrap();
//!  if let Some(table) = file.table() {
//!      for package in table.packages() {
//!          println!("{} (0x{:02x})", package.package_name(), package.id());
//!      }
//!  }
//! ```
//!
pub mod arsc;
#[cfg(test)]
mod tests;

pub use crate::arsc::{ArscError, ArscResult, ResourceFile};
