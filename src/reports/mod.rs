mod console;
mod csv;
mod json;
mod rendered;

pub use console::generate as generate_console;
pub use rendered::{CSV_FILE_NAME, JSON_FILE_NAME, RenderedReport};
