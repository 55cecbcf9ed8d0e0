//! Built-in field processors
//!
//! The processors in this crate are registered by [`default_processors`]
//! under the ids used in reader configurations:
//!
//! | id | processor |
//! |----|-----------|
//! | `transpose` | [`Transpose`] |
//! | `select` | [`Select`] |
//! | `normalize` | [`Normalize`] |

mod normalize;
mod select;
mod transpose;

pub use normalize::Normalize;
pub use select::Select;
pub use transpose::Transpose;

use trkx_data_core::ProcessorRegistry;

/// Registry holding every built-in processor
pub fn default_processors() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Transpose::ID, Transpose);
    registry.register(Select::ID, Select);
    registry.register(Normalize::ID, Normalize);
    registry
}
