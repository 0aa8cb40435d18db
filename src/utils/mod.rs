pub mod file_utils;

pub use file_utils::{collect_files, get_project_name};
