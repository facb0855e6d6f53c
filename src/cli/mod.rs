mod commands;
mod handlers;
mod picker;

pub use commands::{parse_day, Cli, Commands};
pub use handlers::{
    handle_add, handle_delete, handle_edit, handle_export, handle_get, handle_import, handle_init,
    handle_list, handle_mark, handle_note, Context,
};
pub use picker::TerminalPicker;
