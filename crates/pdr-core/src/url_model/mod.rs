//! URL helpers: file-name and extension hints from a URL path.

mod path;

pub use path::{filename_from_url_path, path_extension, path_segments};
