mod commands;
mod handlers;

pub use commands::{Cli, Commands, TriggersAction, TriggersCommand};
pub use handlers::{
    handle_add, handle_init, handle_list, handle_remove, handle_set_prefix, handle_set_threshold,
    handle_triggers_init, handle_triggers_show,
};
