//! Policy guards
//!
//! Pure decision functions applying a compiled policy to one subject:
//! - `check_write` - file paths of Write/Edit operations
//! - `check_command` - shell commands of Bash operations

mod command_validator;
mod file_guard;

pub use command_validator::{check_command, SHELL_TOOLS};
pub use file_guard::{check_write, check_write_in, normalize_path, FILE_WRITE_TOOLS};
