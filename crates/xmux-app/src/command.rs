// ABOUTME: Console command grammar.
// ABOUTME: Parses one input line into a workspace action; panels and tabs are addressed by 1-based index.

use anyhow::{anyhow, bail, Context, Result};
use xmux_core::ThemeChoice;
use xmux_layout::{Direction, Zone};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewTab,
    CloseTab(Option<usize>),
    SelectTab(usize),
    RenameTab(String),
    Split { direction: Direction, insert_after: bool },
    Close(Option<usize>),
    Focus(usize),
    Swap(usize, usize),
    Drop { source: usize, target: usize, zone: Zone },
    Resize { split: usize, first_percent: f64 },
    Send(String),
    Window { width: f32, height: f32 },
    Theme(ThemeChoice),
    FontSize(f32),
    Show,
    Screen(Option<usize>),
    Help,
    Quit,
}

pub const HELP: &str = "\
new-tab                       open a tab
close-tab [TAB]               close a tab (default: active)
tab TAB                       switch tab
rename TITLE                  rename the active tab
split h|v [before]            split the focused panel
close [PANEL]                 close a panel (default: focused)
focus PANEL                   focus a panel
swap PANEL PANEL              swap two panels
drop PANEL PANEL ZONE         drop a panel on another (top|bottom|left|right|center)
resize SPLIT PERCENT          set the first child's share of a split
send TEXT                     type a line into the focused panel
window WIDTH HEIGHT           resize the window in pixels
theme NAME                    switch theme
font SIZE                     set the font size
show                          print tabs and the active layout
screen [PANEL]                print a panel's screen (default: focused)
quit                          exit";

fn index(arg: Option<&str>, what: &str) -> Result<usize> {
    let arg = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    let n: usize = arg.parse().with_context(|| format!("invalid {what} '{arg}'"))?;
    if n == 0 {
        bail!("{what} numbers start at 1");
    }
    Ok(n)
}

fn optional_index(arg: Option<&str>, what: &str) -> Result<Option<usize>> {
    match arg {
        Some(_) => index(arg, what).map(Some),
        None => Ok(None),
    }
}

fn number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let arg = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    arg.parse().with_context(|| format!("invalid {what} '{arg}'"))
}

fn zone(arg: Option<&str>) -> Result<Zone> {
    match arg {
        Some("top") => Ok(Zone::Top),
        Some("bottom") => Ok(Zone::Bottom),
        Some("left") => Ok(Zone::Left),
        Some("right") => Ok(Zone::Right),
        Some("center") => Ok(Zone::Center),
        Some(other) => bail!("unknown zone '{other}'"),
        None => bail!("missing zone"),
    }
}

fn theme(name: &str) -> Result<ThemeChoice> {
    ThemeChoice::all()
        .iter()
        .copied()
        .find(|t| t.label().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("unknown theme '{name}'"))
}

impl Command {
    pub fn parse(line: &str) -> Result<Command> {
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        let command = match verb {
            "new-tab" => Command::NewTab,
            "close-tab" => Command::CloseTab(optional_index(args.next(), "tab")?),
            "tab" => Command::SelectTab(index(args.next(), "tab")?),
            "rename" if !rest.is_empty() => Command::RenameTab(rest.to_string()),
            "rename" => bail!("missing title"),
            "split" => {
                let direction = match args.next() {
                    Some("h") => Direction::Horizontal,
                    Some("v") => Direction::Vertical,
                    _ => bail!("split needs h or v"),
                };
                let insert_after = match args.next() {
                    None => true,
                    Some("before") => false,
                    Some(other) => bail!("unexpected '{other}'"),
                };
                Command::Split {
                    direction,
                    insert_after,
                }
            }
            "close" => Command::Close(optional_index(args.next(), "panel")?),
            "focus" => Command::Focus(index(args.next(), "panel")?),
            "swap" => Command::Swap(index(args.next(), "panel")?, index(args.next(), "panel")?),
            "drop" => Command::Drop {
                source: index(args.next(), "panel")?,
                target: index(args.next(), "panel")?,
                zone: zone(args.next())?,
            },
            "resize" => Command::Resize {
                split: index(args.next(), "split")?,
                first_percent: number(args.next(), "percent")?,
            },
            "send" => Command::Send(rest.to_string()),
            "window" => Command::Window {
                width: number(args.next(), "width")?,
                height: number(args.next(), "height")?,
            },
            "theme" => Command::Theme(theme(rest)?),
            "font" => Command::FontSize(number(args.next(), "font size")?),
            "show" => Command::Show,
            "screen" => Command::Screen(optional_index(args.next(), "panel")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => bail!("empty command"),
            other => bail!("unknown command '{other}', try 'help'"),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("new-tab", Command::NewTab)]
    #[test_case("close-tab", Command::CloseTab(None))]
    #[test_case("close-tab 2", Command::CloseTab(Some(2)))]
    #[test_case("tab 3", Command::SelectTab(3))]
    #[test_case("rename  build logs ", Command::RenameTab("build logs".to_string()))]
    #[test_case("split h", Command::Split { direction: Direction::Horizontal, insert_after: true })]
    #[test_case("split v before", Command::Split { direction: Direction::Vertical, insert_after: false })]
    #[test_case("close", Command::Close(None))]
    #[test_case("focus 1", Command::Focus(1))]
    #[test_case("swap 1 2", Command::Swap(1, 2))]
    #[test_case("drop 2 1 center", Command::Drop { source: 2, target: 1, zone: Zone::Center })]
    #[test_case("resize 1 30", Command::Resize { split: 1, first_percent: 30.0 })]
    #[test_case("send echo  hi", Command::Send("echo  hi".to_string()))]
    #[test_case("window 800 600", Command::Window { width: 800.0, height: 600.0 })]
    #[test_case("theme rosé pine", Command::Theme(ThemeChoice::RosePine) ; "theme with accent")]
    #[test_case("theme Gruvbox Dark", Command::Theme(ThemeChoice::GruvboxDark))]
    #[test_case("font 15.5", Command::FontSize(15.5))]
    #[test_case("screen 2", Command::Screen(Some(2)))]
    #[test_case("  quit  ", Command::Quit)]
    fn parses(line: &str, expected: Command) {
        assert_eq!(Command::parse(line).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("split x" ; "bad direction")]
    #[test_case("split h after" ; "bad insert flag")]
    #[test_case("focus 0" ; "zero index")]
    #[test_case("focus one" ; "word index")]
    #[test_case("drop 1 2 middle" ; "bad zone")]
    #[test_case("swap 1" ; "missing panel")]
    #[test_case("theme Solarized Medium" ; "unknown theme")]
    #[test_case("rename" ; "missing title")]
    #[test_case("explode" ; "unknown verb")]
    fn rejects(line: &str) {
        assert!(Command::parse(line).is_err());
    }
}
