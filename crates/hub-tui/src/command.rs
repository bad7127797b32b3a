//! `:` command line parsing.

use std::path::PathBuf;

use hub_client::upload::FormField;
use hub_proto::protocol::ResourceId;

use crate::action::Action;

/// Parse one command line (without the leading `:`).
pub fn parse(line: &str) -> Result<Action, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "q" | "quit" => Ok(Action::Quit),
        "like" => id_arg(rest, "like").map(Action::Like),
        "fav" | "favorite" => id_arg(rest, "fav").map(Action::Favorite),
        "comment" => match rest.split_once(char::is_whitespace) {
            Some((id, text)) => Ok(Action::Comment(ResourceId::from(id), text.trim().to_string())),
            None => Err("usage: comment <id> <text>".to_string()),
        },
        "upload" | "open" => {
            if rest.is_empty() {
                return Err("usage: upload <path>".to_string());
            }
            Ok(Action::SelectFile(expand_home(rest)))
        }
        "title" => Ok(Action::SetField(FormField::Title, rest.to_string())),
        "desc" | "description" => Ok(Action::SetField(FormField::Description, rest.to_string())),
        "tags" => Ok(Action::SetField(FormField::Tags, rest.to_string())),
        "submit" => Ok(Action::SubmitUpload),
        "reset" => Ok(Action::ResetUpload),
        "refresh" => Ok(Action::RefreshStats),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command: {}", other)),
    }
}

fn id_arg(rest: &str, cmd: &str) -> Result<ResourceId, String> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(ResourceId::from(id)),
        None => Err(format!("usage: {} <id>", cmd)),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
