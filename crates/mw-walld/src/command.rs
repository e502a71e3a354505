use anyhow::{Context, bail};
use mw_core::controller::ControllerAction;
use mw_model::LayoutMode;

/// Parse one operator line into a controller action.
///
/// Grammar (keywords case-insensitive):
/// - `start` | `stop` | `reset` | `show`
/// - `interval <seconds>`
/// - `products <text>`; a literal `\n` in the text becomes a newline
/// - `layout card|image`
/// - `production on|off`
pub fn parse_command(line: &str) -> anyhow::Result<ControllerAction> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let action = match word.to_ascii_lowercase().as_str() {
        "start" => ControllerAction::Start,
        "stop" => ControllerAction::Stop,
        "reset" => ControllerAction::Reset,
        "show" | "state" => ControllerAction::Snapshot,
        "interval" => {
            let secs = rest
                .parse::<i64>()
                .with_context(|| format!("interval expects whole seconds, got '{rest}'"))?;
            ControllerAction::SetInterval(secs)
        }
        "products" => ControllerAction::SetProducts(rest.replace("\\n", "\n")),
        "layout" => ControllerAction::SetLayout(rest.parse::<LayoutMode>()?),
        "production" => ControllerAction::SetProductionMode(parse_switch(rest)?),
        "" => bail!("empty command"),
        other => bail!("unknown command '{other}'"),
    };
    Ok(action)
}

fn parse_switch(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => bail!("expected on/off, got '{other}'"),
    }
}
