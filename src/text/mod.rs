// Text utilities shared by every stage
// Template rendering and tag extraction

mod tags;
mod template;

pub use tags::{extract_code_fences, extract_tags};
pub use template::{render, render_file};
