use std::fmt;

const SHOWPID_NAME: &str = "showpid";
const PWD_NAME: &str = "pwd";
const CD_NAME: &str = "cd";
const JOBS_NAME: &str = "jobs";
const KILL_NAME: &str = "kill";
const FG_NAME: &str = "fg";
const BG_NAME: &str = "bg";
const QUIT_NAME: &str = "quit";
const DIFF_NAME: &str = "diff";

/// The closed set of commands implemented inside the shell process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    ShowPid,
    Pwd,
    Cd,
    Jobs,
    Kill,
    Fg,
    Bg,
    Quit,
    Diff,
}

impl Builtin {
    pub fn from_name<S: AsRef<str>>(name: S) -> Option<Builtin> {
        match name.as_ref() {
            SHOWPID_NAME => Some(Builtin::ShowPid),
            PWD_NAME => Some(Builtin::Pwd),
            CD_NAME => Some(Builtin::Cd),
            JOBS_NAME => Some(Builtin::Jobs),
            KILL_NAME => Some(Builtin::Kill),
            FG_NAME => Some(Builtin::Fg),
            BG_NAME => Some(Builtin::Bg),
            QUIT_NAME => Some(Builtin::Quit),
            DIFF_NAME => Some(Builtin::Diff),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::ShowPid => SHOWPID_NAME,
            Builtin::Pwd => PWD_NAME,
            Builtin::Cd => CD_NAME,
            Builtin::Jobs => JOBS_NAME,
            Builtin::Kill => KILL_NAME,
            Builtin::Fg => FG_NAME,
            Builtin::Bg => BG_NAME,
            Builtin::Quit => QUIT_NAME,
            Builtin::Diff => DIFF_NAME,
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Builtin(Builtin),
    External,
}

/// One simple command of a command line, plus the `&&`-linked rest of the
/// line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// `argv[0]` is the program name
    argv: Vec<String>,
    kind: CommandKind,
    background: bool,
    next: Option<Box<Command>>,
}

impl Command {
    /// # Panics
    /// Panics if `argv` is empty
    pub fn new(argv: Vec<String>, background: bool) -> Self {
        assert!(!argv.is_empty(), "a command needs at least a name");
        let kind = Builtin::from_name(&argv[0])
            .map(CommandKind::Builtin)
            .unwrap_or(CommandKind::External);
        Self {
            argv,
            kind,
            background,
            next: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// All tokens including the name.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Tokens after the name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self.kind {
            CommandKind::Builtin(builtin) => Some(builtin),
            CommandKind::External => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.builtin().is_some()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn next(&self) -> Option<&Command> {
        self.next.as_ref().map(|next| &**next)
    }

    pub fn set_next(&mut self, next: Option<Command>) {
        self.next = next.map(Box::new);
    }

    /// Copies this command without the rest of its chain. Jobs keep the copy
    /// after the parsed line has been dropped.
    pub fn detach(&self) -> Command {
        Command {
            argv: self.argv.clone(),
            kind: self.kind,
            background: self.background,
            next: None,
        }
    }

    /// Iterates over this command and its successors.
    pub fn chain(&self) -> Chain<'_> {
        Chain(Some(self))
    }
}

/// Reconstructs the command as typed: name, arguments and a trailing ` &` for
/// background commands. The chain is not included.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))?;
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Chain<'a>(Option<&'a Command>);

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Command;

    fn next(&mut self) -> Option<&'a Command> {
        let current = self.0.take()?;
        self.0 = current.next();
        Some(current)
    }
}
