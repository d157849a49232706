use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, EXPORT_COMMAND, MULTI_PATH_COMMANDS, NO_ARG_COMMANDS, RAW_ARG_COMMANDS,
    SINGLE_PATH_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            command_args: BTreeMap::new(),
        }
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args.get(key).and_then(Value::as_str)
    }

    pub fn arg_list(&self, key: &str) -> Vec<String> {
        self.command_args
            .get(key)
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

/// `/export [json|css|all] [path]`; a lone argument that is not a format is a path.
fn parse_export_args(arg: &str) -> (String, Option<String>) {
    let mut parts = parse_path_args(arg);
    if parts.is_empty() {
        return ("all".to_string(), None);
    }
    let head = parts[0].to_ascii_lowercase();
    if matches!(head.as_str(), "json" | "css" | "all") {
        parts.remove(0);
        let path = (!parts.is_empty()).then(|| parts.join(" "));
        return (head, path);
    }
    ("all".to_string(), Some(parts.join(" ")))
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = if remainder.is_empty() {
                ""
            } else {
                remainder.trim()
            };

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent
                    .command_args
                    .insert("value".to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.command_args.insert(
                    "path".to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, MULTI_PATH_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.command_args.insert(
                    "paths".to_string(),
                    Value::Array(
                        parse_path_args(arg)
                            .into_iter()
                            .map(Value::String)
                            .collect(),
                    ),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            if command == EXPORT_COMMAND.command {
                let (format, path) = parse_export_args(arg);
                let mut intent = Intent::new(EXPORT_COMMAND.action, text);
                intent
                    .command_args
                    .insert("format".to_string(), Value::String(format));
                intent.command_args.insert(
                    "path".to_string(),
                    path.map(Value::String).unwrap_or(Value::Null),
                );
                return intent;
            }

            if looks_like_pasted_path(raw_trimmed, remainder) {
                return drop_intent(raw_trimmed, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    // Terminals paste a dragged file as its (often quoted) path.
    drop_intent(raw_trimmed, text)
}

fn drop_intent(paths: &str, raw: &str) -> Intent {
    let mut intent = Intent::new("drop_files", raw);
    intent.command_args.insert(
        "paths".to_string(),
        Value::Array(
            parse_path_args(paths)
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
    );
    intent
}

/// An unregistered `/word` is an absolute path when more segments follow
/// or when it names something on disk.
fn looks_like_pasted_path(raw: &str, remainder: &str) -> bool {
    if remainder.starts_with('/') {
        return true;
    }
    parse_path_args(raw)
        .first()
        .is_some_and(|first| Path::new(first).exists())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::parse_intent;

    #[test]
    fn parse_knob_commands_keep_raw_text() {
        let k = parse_intent("/k 8");
        assert_eq!(k.action, "set_color_count");
        assert_eq!(k.command_args["value"], json!("8"));

        let alias = parse_intent("/colors lots");
        assert_eq!(alias.action, "set_color_count");
        assert_eq!(alias.arg_str("value"), Some("lots"));

        let max_side = parse_intent("  /MAX_SIDE   1024 ");
        assert_eq!(max_side.action, "set_max_side");
        assert_eq!(max_side.command_args["value"], json!("1024"));

        let copy = parse_intent("/copy 2");
        assert_eq!(copy.action, "copy_color");
        assert_eq!(copy.arg_str("value"), Some("2"));
    }

    #[test]
    fn parse_open_quoted_path() {
        let intent = parse_intent("/open \"/tmp/my photo.png\"");
        assert_eq!(intent.action, "select_image");
        assert_eq!(intent.command_args["path"], json!("/tmp/my photo.png"));
    }

    #[test]
    fn parse_drop_multiple_paths() {
        let intent = parse_intent("/drop a.png 'b c.jpg'");
        assert_eq!(intent.action, "drop_files");
        assert_eq!(intent.arg_list("paths"), vec!["a.png", "b c.jpg"]);
    }

    #[test]
    fn bare_pasted_path_is_a_drop() {
        let intent = parse_intent("'/home/me/Pictures/sunset 1.jpg' ");
        assert_eq!(intent.action, "drop_files");
        assert_eq!(
            intent.command_args["paths"],
            json!(["/home/me/Pictures/sunset 1.jpg"])
        );
    }

    #[test]
    fn unquoted_absolute_path_is_a_drop() {
        let intent = parse_intent("/home/me/Pictures/sunset.jpg");
        assert_eq!(intent.action, "drop_files");
        assert_eq!(intent.arg_list("paths"), vec!["/home/me/Pictures/sunset.jpg"]);

        let two = parse_intent("/tmp/a.png /tmp/b.png");
        assert_eq!(two.arg_list("paths"), vec!["/tmp/a.png", "/tmp/b.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn existing_top_level_dir_is_a_drop() {
        let intent = parse_intent("/tmp");
        assert_eq!(intent.action, "drop_files");
        assert_eq!(intent.arg_list("paths"), vec!["/tmp"]);
    }

    #[test]
    fn registered_commands_win_over_paths() {
        assert_eq!(parse_intent("/open /tmp/a.png").action, "select_image");
        assert_eq!(parse_intent("/export /tmp/out").action, "export");
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/submit").action, "submit");
        assert_eq!(parse_intent("/summarize").action, "submit");
        assert_eq!(parse_intent("/status").action, "status");
        assert_eq!(parse_intent("/clear").action, "clear_image");
        assert_eq!(parse_intent("/exit").action, "quit");
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_export_variants() {
        let all = parse_intent("/export");
        assert_eq!(all.arg_str("format"), Some("all"));
        assert_eq!(all.command_args["path"], Value::Null);

        let css = parse_intent("/export CSS \"out dir/theme.css\"");
        assert_eq!(css.arg_str("format"), Some("css"));
        assert_eq!(css.arg_str("path"), Some("out dir/theme.css"));

        let dir_only = parse_intent("/export exports");
        assert_eq!(dir_only.arg_str("format"), Some("all"));
        assert_eq!(dir_only.arg_str("path"), Some("exports"));
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }
}
