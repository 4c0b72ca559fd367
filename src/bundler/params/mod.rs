//! Parameter resolution.
//!
//! A [`ParamDescriptor`] describes one configuration key; a [`ParamStore`]
//! holds the values of one packaging run and derives missing ones on demand.
//!
//! ```no_run
//! use runtime_bundler::bundler::params::{ParamStore, standard};
//!
//! # fn example() -> runtime_bundler::bundler::Result<()> {
//! let mut store = ParamStore::standard();
//! store.supply(&standard::MAIN_CLASS, "com.example.Main")?;
//! assert_eq!(store.fetch(&standard::APP_NAME)?.as_deref(), Some("Main"));
//! # Ok(())
//! # }
//! ```

mod descriptor;
mod launchers;
pub mod parse;
pub mod standard;
mod store;

pub use descriptor::{Deriver, ParamDescriptor, ParamInfo, ParamType, ParamValue, Parser, ValueType};
pub use launchers::{FileAssociation, SecondaryLauncher};
pub use store::{Origin, ParamState, ParamStore};
