//! Two-step operator menu: reload the subject list (y/n), then pick a subject
//! by number. Input is fed line by line so the flow can be driven by a script
//! as well as by a terminal.

use thiserror::Error;

pub const RELOAD_PROMPT: &str = "Load subjects again? (y/n): ";
pub const CHOICE_COMMENT: &str = "Choose a subject number";
pub const EXIT_COMMANDS: [&str; 2] = ["ex", "esc"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("Specified invalid answer, it must be only n or y. Try again...")]
    InvalidAnswer(String),
    #[error("You chose invalid answer \"{input}\", but you can only choose only value [0-{max}]")]
    InvalidChoice { input: String, max: usize },
    #[error("Menu is not waiting for input")]
    NotAwaitingInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Subject(usize),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    AwaitingYesNo,
    /// The answer is known; the caller loads the catalog and calls
    /// [`Menu::offer`].
    AwaitingCatalog { reload: bool },
    AwaitingChoice { names: Vec<String> },
    Resolved(Choice),
}

#[derive(Debug)]
pub struct Menu {
    state: State,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingYesNo,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Text to show before reading the next line, if input is expected.
    pub fn prompt(&self) -> Option<String> {
        match &self.state {
            State::AwaitingYesNo => Some(RELOAD_PROMPT.to_string()),
            State::AwaitingChoice { names } => Some(render_choices(names, CHOICE_COMMENT)),
            _ => None,
        }
    }

    /// Lists the subjects to choose from.
    pub fn offer(&mut self, names: Vec<String>) {
        self.state = State::AwaitingChoice { names };
    }

    /// Applies one line of operator input. Invalid input leaves the state
    /// unchanged so the same prompt can be shown again.
    pub fn feed(&mut self, input: &str) -> Result<&State, MenuError> {
        let input = input.trim_end_matches(['\r', '\n']);
        let next = match &self.state {
            State::AwaitingYesNo => State::AwaitingCatalog {
                reload: parse_yes_no(input)?,
            },
            State::AwaitingChoice { names } => State::Resolved(parse_choice(input, names.len())?),
            _ => return Err(MenuError::NotAwaitingInput),
        };
        self.state = next;
        Ok(&self.state)
    }
}

pub fn parse_yes_no(input: &str) -> Result<bool, MenuError> {
    match input {
        "y" => Ok(true),
        "n" => Ok(false),
        other => Err(MenuError::InvalidAnswer(other.to_string())),
    }
}

pub fn parse_choice(input: &str, count: usize) -> Result<Choice, MenuError> {
    if EXIT_COMMANDS.contains(&input) {
        return Ok(Choice::Exit);
    }

    let invalid = || MenuError::InvalidChoice {
        input: input.to_string(),
        max: count.saturating_sub(1),
    };
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    match input.parse::<usize>() {
        Ok(i) if i < count => Ok(Choice::Subject(i)),
        _ => Err(invalid()),
    }
}

pub fn render_choices(names: &[String], comment: &str) -> String {
    let lines: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}{}", i, if i < 10 { " " } else { "" }, name))
        .collect();
    format!("\n{}\n\n{}\n\n>>> ", comment, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Math".to_string(), "Physics".to_string(), "History".to_string()]
    }

    #[test]
    fn yes_no_is_case_sensitive_and_retries() {
        let mut menu = Menu::new();
        assert_eq!(menu.prompt().as_deref(), Some(RELOAD_PROMPT));

        for bad in ["Y", "yes", "", " n"] {
            assert_eq!(menu.feed(bad), Err(MenuError::InvalidAnswer(bad.to_string())));
            assert_eq!(menu.state(), &State::AwaitingYesNo);
        }
        assert_eq!(
            menu.feed("n\n").unwrap(),
            &State::AwaitingCatalog { reload: false }
        );
        assert!(menu.prompt().is_none());
        assert_eq!(menu.feed("y"), Err(MenuError::NotAwaitingInput));
    }

    #[test]
    fn out_of_range_choice_reprompts() {
        let mut menu = Menu::new();
        menu.feed("y").unwrap();
        menu.offer(names());

        assert_eq!(
            menu.feed("7"),
            Err(MenuError::InvalidChoice {
                input: "7".to_string(),
                max: 2
            })
        );
        assert!(matches!(menu.state(), State::AwaitingChoice { .. }));
        assert!(menu.feed("-1").is_err());
        assert!(menu.feed("one").is_err());
        assert!(menu.feed("99999999999999999999999").is_err());

        assert_eq!(menu.feed("2").unwrap(), &State::Resolved(Choice::Subject(2)));
    }

    #[test]
    fn exit_commands_resolve_to_exit() {
        for command in EXIT_COMMANDS {
            let mut menu = Menu::new();
            menu.feed("n").unwrap();
            menu.offer(names());
            assert_eq!(menu.feed(command).unwrap(), &State::Resolved(Choice::Exit));
        }
        assert!(parse_choice("EX", 3).is_err());
    }

    #[test]
    fn empty_catalog_only_accepts_exit() {
        assert!(parse_choice("0", 0).is_err());
        assert_eq!(parse_choice("esc", 0), Ok(Choice::Exit));
    }

    #[test]
    fn choices_render_zero_indexed() {
        let rendered = render_choices(&names(), CHOICE_COMMENT);
        assert_eq!(
            rendered,
            "\nChoose a subject number\n\n0.  Math\n1.  Physics\n2.  History\n\n>>> "
        );

        let many: Vec<String> = (0..11).map(|i| format!("s{i}")).collect();
        assert!(render_choices(&many, "c").contains("\n10. s10\n"));
    }
}
