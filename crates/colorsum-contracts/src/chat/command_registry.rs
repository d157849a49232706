#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "k",
        action: "set_color_count",
    },
    CommandSpec {
        command: "colors",
        action: "set_color_count",
    },
    CommandSpec {
        command: "max_side",
        action: "set_max_side",
    },
    CommandSpec {
        command: "copy",
        action: "copy_color",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "open",
    action: "select_image",
}];

pub(crate) const MULTI_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "drop",
    action: "drop_files",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "submit",
        action: "submit",
    },
    CommandSpec {
        command: "summarize",
        action: "submit",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "clear",
        action: "clear_image",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub(crate) const EXPORT_COMMAND: CommandSpec = CommandSpec {
    command: "export",
    action: "export",
};

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/open",
    "/drop",
    "/k",
    "/max_side",
    "/submit",
    "/status",
    "/export",
    "/copy",
    "/clear",
    "/help",
    "/quit",
];
