//! Run configuration: the platforms file and the library manifest

pub mod library_properties;
pub mod platforms_file;

pub use library_properties::{is_valid_library_name, LibraryProperties};
pub use platforms_file::load_platform_table;
