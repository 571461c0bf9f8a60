//! The interactive session: confirm the skeleton key once, then print keys
//! for as many service/user pairs as the user asks for.
//!
//! Input goes through the [`Prompter`] trait so the whole flow can be driven
//! from a script in tests; output goes to any `io::Write`.

use anyhow::{Context, Result};
use skele_core::{strength, KeySource, SkeletonKey};
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use zeroize::Zeroizing;

use crate::config::Config;

const INPUT_MARK: &str = "> ";
const SKELETON_KEY_PROMPT: &str = "Please enter the skeleton key:";
const CONFIRM_PROMPT: &str = "Please re-enter the skeleton key to confirm:";
const MISMATCH_NOTICE: &str =
    "The skeleton key and its confirmation didn't match. Please re-enter.";
const SERVICE_PROMPT: &str = "Please enter the service name:";
const USER_PROMPT: &str = "Please enter the user name:";

/// Source of user input.
pub trait Prompter {
    /// Read one echoed line. `Ok(None)` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Read one line without echo. `Ok(None)` at end of input.
    fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Reads from stdin; secrets are read from the terminal with echo off.
pub struct TerminalPrompter<R> {
    input: R,
}

impl TerminalPrompter<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Why a session stopped. Both end the process with exit code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user entered an empty line.
    EmptyInput,
    /// Input ran out (Ctrl-D).
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub key_count: usize,
    pub show_fingerprint: bool,
    pub warn_weak_key: bool,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            key_count: config.derivation.key_count,
            show_fingerprint: config.display.show_fingerprint,
            warn_weak_key: config.display.warn_weak_key,
        }
    }
}

type Input = ControlFlow<SessionEnd, Zeroizing<String>>;

macro_rules! or_end {
    ($input:expr) => {
        match $input? {
            ControlFlow::Continue(value) => value,
            ControlFlow::Break(end) => return Ok(end),
        }
    };
}

/// Run the prompt loop until the user stops it.
pub fn run<P: Prompter, W: Write>(
    prompter: &mut P,
    out: &mut W,
    options: &SessionOptions,
) -> Result<SessionEnd> {
    let source = or_end!(open_key_source(prompter, out, options));
    log::debug!(
        "skeleton key confirmed, {} keys per request",
        source.count()
    );

    loop {
        let service = or_end!(read(prompter, out, SERVICE_PROMPT, false));
        let user = or_end!(read(prompter, out, USER_PROMPT, false));

        let keys = source.readable_keys(&service, &user)?;
        for (i, key) in keys.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, key)?;
        }
        out.flush()?;
        log::debug!("printed {} keys", keys.len());
    }
}

/// Ask for the skeleton key until the confirmation matches, then hash it.
fn open_key_source<P: Prompter, W: Write>(
    prompter: &mut P,
    out: &mut W,
    options: &SessionOptions,
) -> Result<ControlFlow<SessionEnd, KeySource>> {
    let passphrase = loop {
        let first = match read(prompter, out, SKELETON_KEY_PROMPT, true)? {
            ControlFlow::Continue(value) => value,
            ControlFlow::Break(end) => return Ok(ControlFlow::Break(end)),
        };
        let second = match read(prompter, out, CONFIRM_PROMPT, true)? {
            ControlFlow::Continue(value) => value,
            ControlFlow::Break(end) => return Ok(ControlFlow::Break(end)),
        };
        if *first == *second {
            break first;
        }
        writeln!(out, "{}", MISMATCH_NOTICE)?;
        log::debug!("skeleton key confirmation mismatch");
    };

    if options.warn_weak_key {
        warn_if_weak(out, &passphrase)?;
    }

    let source = KeySource::new(SkeletonKey::from_passphrase(&passphrase), options.key_count)?;
    if options.show_fingerprint {
        let fingerprint = source.skeleton_key().fingerprint_readable()?;
        writeln!(out, "The fingerprint of the skeleton key is {}", fingerprint)?;
    }
    Ok(ControlFlow::Continue(source))
}

fn warn_if_weak<W: Write>(out: &mut W, passphrase: &str) -> Result<()> {
    let estimate = strength::estimate(passphrase);
    if estimate.strength.is_recommended() {
        return Ok(());
    }
    writeln!(
        out,
        "Warning: the skeleton key looks {} (about {:.0} bits); every derived password is only as strong as it.",
        estimate.strength.label(),
        estimate.bits
    )?;
    for weakness in &estimate.weaknesses {
        writeln!(out, "  - {}", weakness.hint())?;
    }
    Ok(())
}

fn read<P: Prompter, W: Write>(
    prompter: &mut P,
    out: &mut W,
    prompt: &str,
    secret: bool,
) -> Result<Input> {
    writeln!(out, "{}", prompt)?;
    out.flush()?;

    let answer = if secret {
        prompter.ask_secret(INPUT_MARK)
    } else {
        prompter.ask(INPUT_MARK)
    }
    .context("Failed to read input")?;

    Ok(match answer.map(Zeroizing::new) {
        None => ControlFlow::Break(SessionEnd::EndOfInput),
        Some(value) if value.is_empty() => ControlFlow::Break(SessionEnd::EmptyInput),
        Some(value) => ControlFlow::Continue(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers; secrets and plain answers share one queue.
    struct Script {
        answers: VecDeque<&'static str>,
        secret_prompts: usize,
    }

    impl Script {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                secret_prompts: 0,
            }
        }
    }

    impl Prompter for Script {
        fn ask(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Ok(self.answers.pop_front().map(String::from))
        }

        fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.secret_prompts += 1;
            self.ask(prompt)
        }
    }

    struct Broken;

    impl Prompter for Broken {
        fn ask(&mut self, _prompt: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::Other, "terminal went away"))
        }

        fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.ask(prompt)
        }
    }

    fn quiet(key_count: usize) -> SessionOptions {
        SessionOptions {
            key_count,
            show_fingerprint: false,
            warn_weak_key: false,
        }
    }

    fn run_script(answers: &[&'static str], options: &SessionOptions) -> (SessionEnd, String, Script) {
        let mut script = Script::new(answers);
        let mut out = Vec::new();
        let end = run(&mut script, &mut out, options).unwrap();
        (end, String::from_utf8(out).unwrap(), script)
    }

    #[test]
    fn test_readme_transcript() {
        let (end, out, script) = run_script(
            &["foo bar baz", "foo bar baz", "example.com", "john"],
            &quiet(5),
        );
        assert_eq!(end, SessionEnd::EndOfInput);
        assert_eq!(script.secret_prompts, 2);
        assert_eq!(
            out,
            "Please enter the skeleton key:\n\
             Please re-enter the skeleton key to confirm:\n\
             Please enter the service name:\n\
             Please enter the user name:\n\
             1. Xr7w-Mmgv-Bzdz-Wr7q\n\
             2. 873S-Sj3y-653A-X6z1\n\
             3. 4Wzy-Kks2-Z98y-S5sn\n\
             4. Ajkc-6Cyk-Txnb-Mrtw\n\
             5. Dxmw-1Xmy-As0t-V2dc\n\
             Please enter the service name:\n"
        );
    }

    #[test]
    fn test_default_config_keeps_readme_transcript() {
        let options = SessionOptions::from(&Config::default());
        let (end, out, _) = run_script(
            &["foo bar baz", "foo bar baz", "example.com", "john"],
            &options,
        );
        assert_eq!(end, SessionEnd::EndOfInput);
        assert!(!out.contains("Warning"));
        assert!(!out.contains("fingerprint"));
        assert_eq!(
            out,
            "Please enter the skeleton key:\n\
             Please re-enter the skeleton key to confirm:\n\
             Please enter the service name:\n\
             Please enter the user name:\n\
             1. Xr7w-Mmgv-Bzdz-Wr7q\n\
             2. 873S-Sj3y-653A-X6z1\n\
             3. 4Wzy-Kks2-Z98y-S5sn\n\
             4. Ajkc-6Cyk-Txnb-Mrtw\n\
             5. Dxmw-1Xmy-As0t-V2dc\n\
             Please enter the service name:\n"
        );
    }

    #[test]
    fn test_mismatch_retries() {
        let (end, out, script) = run_script(
            &["foo bar baz", "foo bar bax", "foo bar baz", "foo bar baz", "example.com", "john", ""],
            &quiet(1),
        );
        assert_eq!(end, SessionEnd::EmptyInput);
        assert_eq!(script.secret_prompts, 4);
        assert_eq!(out.matches(MISMATCH_NOTICE).count(), 1);
        assert!(out.contains("1. Xr7w-Mmgv-Bzdz-Wr7q\n"));
        assert!(!out.contains("2. "));
    }

    #[test]
    fn test_empty_skeleton_key_ends_session() {
        let (end, out, _) = run_script(&[""], &quiet(5));
        assert_eq!(end, SessionEnd::EmptyInput);
        assert_eq!(out, "Please enter the skeleton key:\n");
    }

    #[test]
    fn test_eof_during_confirmation() {
        let (end, _, _) = run_script(&["foo bar baz"], &quiet(5));
        assert_eq!(end, SessionEnd::EndOfInput);
    }

    #[test]
    fn test_empty_user_name_ends_session() {
        let (end, out, _) = run_script(
            &["foo bar baz", "foo bar baz", "example.com", ""],
            &quiet(5),
        );
        assert_eq!(end, SessionEnd::EmptyInput);
        assert!(!out.contains("1. "));
    }

    #[test]
    fn test_multiple_requests_reuse_the_key() {
        let (_, out, script) = run_script(
            &["secret skeleton passphrase", "secret skeleton passphrase", "domain", "identity", "example.com", "john"],
            &quiet(1),
        );
        assert_eq!(script.secret_prompts, 2);
        assert!(out.contains("1. 5Wsc-X2mz-Csnc-4Vgc\n"));
        assert_eq!(out.matches("1. ").count(), 2);
    }

    #[test]
    fn test_fingerprint_shown() {
        let options = SessionOptions {
            show_fingerprint: true,
            ..quiet(1)
        };
        let (_, out, _) = run_script(&["foo bar baz", "foo bar baz"], &options);
        assert!(out.contains("The fingerprint of the skeleton key is 9Ygh1tcz\n"));
    }

    #[test]
    fn test_weak_key_warning() {
        let options = SessionOptions {
            warn_weak_key: true,
            ..quiet(1)
        };
        let (_, out, _) = run_script(&["hunter2", "hunter2"], &options);
        assert!(out.contains("Warning: the skeleton key looks dangerous"));
        assert!(out.contains("shorter than 12 characters"));

        let (_, out, _) = run_script(
            &["correct horse battery staple", "correct horse battery staple"],
            &options,
        );
        assert!(!out.contains("Warning"));
    }

    #[test]
    fn test_zero_key_count_is_an_error() {
        let mut script = Script::new(&["foo bar baz", "foo bar baz"]);
        let mut out = Vec::new();
        assert!(run(&mut script, &mut out, &quiet(0)).is_err());
    }

    #[test]
    fn test_io_errors_propagate() {
        let mut out = Vec::new();
        let err = run(&mut Broken, &mut out, &quiet(5)).unwrap_err();
        assert!(format!("{:#}", err).contains("terminal went away"));
    }

    #[test]
    fn test_terminal_prompter_reads_lines() {
        let mut prompter = TerminalPrompter {
            input: io::Cursor::new("example.com\r\njohn\n\nlast"),
        };
        assert_eq!(prompter.ask("").unwrap().as_deref(), Some("example.com"));
        assert_eq!(prompter.ask("").unwrap().as_deref(), Some("john"));
        assert_eq!(prompter.ask("").unwrap().as_deref(), Some(""));
        assert_eq!(prompter.ask("").unwrap().as_deref(), Some("last"));
        assert_eq!(prompter.ask("").unwrap(), None);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.derivation.key_count = 9;
        config.display.show_fingerprint = true;
        let options = SessionOptions::from(&config);
        assert_eq!(options.key_count, 9);
        assert!(options.show_fingerprint);
        assert!(!options.warn_weak_key);
    }
}
