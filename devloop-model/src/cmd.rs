use serde::Deserialize;
use std::fmt::{self, Display, Formatter};

// Used as a "shadow" type so a command can be written either as a single shell string or as an
// explicit argv array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CmdUnchecked {
    Shell(String),
    Exec(Vec<String>),
}

/// A command to run, stored as argv.
///
/// A command written as a plain string is wrapped in the shell standard form `sh -c <script>`.
///
/// # Examples
/// ```
/// use devloop_model::cmd::Cmd;
///
/// let cmd = Cmd::shell("make && ./app");
/// assert_eq!(cmd.argv(), ["sh", "-c", "make && ./app"]);
/// assert_eq!(cmd.shell_standard_script(), Some("make && ./app"));
///
/// let exec = Cmd::new(["echo", "hi"]);
/// assert!(!exec.is_shell_standard_form());
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(from = "CmdUnchecked")]
pub struct Cmd {
    argv: Vec<String>,
}

impl Cmd {
    pub fn new(argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(script: impl Into<String>) -> Self {
        Self {
            argv: vec![String::from("sh"), String::from("-c"), script.into()],
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn is_shell_standard_form(&self) -> bool {
        self.shell_standard_script().is_some()
    }

    /// The script of a command in shell standard form.
    pub fn shell_standard_script(&self) -> Option<&str> {
        match self.argv.as_slice() {
            [sh, c, script] if sh == "sh" && c == "-c" => Some(script.as_str()),
            _ => None,
        }
    }
}

impl From<CmdUnchecked> for Cmd {
    fn from(value: CmdUnchecked) -> Self {
        match value {
            CmdUnchecked::Shell(script) if script.trim().is_empty() => Cmd::default(),
            CmdUnchecked::Shell(script) => Cmd::shell(script),
            CmdUnchecked::Exec(argv) => Cmd { argv },
        }
    }
}

impl Display for Cmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.shell_standard_script() {
            Some(script) => f.write_str(script),
            None => write!(f, "{}", self.argv.join(" ")),
        }
    }
}
