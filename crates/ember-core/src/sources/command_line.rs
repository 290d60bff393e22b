//! Command-line tier: the flag table and how argv is split against it
//!
//! The table is a clap [`Command`]. Short flags can be combined (`-Iv`) and
//! option arguments can be attached (`-cpass`) or separate (`-c pass`).
//! Option parsing ends at `-c`, `-m`, `-`, `--` or the first non-option
//! token (the script). clap stops on its own at the script, `-` and `--`;
//! the `-c`/`-m` boundary is found before clap sees the tokens, since
//! everything after their argument belongs to the program.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::{Error, Signal, Status};

const ORIGIN: &str = "command line";

/// Help or version output requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyExit {
    Help,
    Version,
}

/// Everything the command line says, one `Option` per field so that an
/// absent flag never shadows a lower tier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    /// Raw `argv[0]`
    pub program_name: Option<String>,
    pub early_exit: Option<EarlyExit>,

    pub bytes_warning: Option<u32>,
    pub write_bytecode: Option<bool>,
    pub parser_debug: Option<u32>,
    pub use_environment: Option<bool>,
    pub inspect: Option<bool>,
    pub interactive: Option<bool>,
    pub isolated: Option<bool>,
    pub optimization_level: Option<u32>,
    pub quiet: Option<bool>,
    pub user_site: Option<bool>,
    pub site_import: Option<bool>,
    pub buffered_stdio: Option<bool>,
    pub verbose: Option<u32>,
    pub skip_source_first_line: Option<bool>,

    /// `-W` values in order
    pub warn_options: Vec<String>,
    /// `-X` values in order
    pub x_options: Vec<String>,

    pub run_command: Option<String>,
    pub run_module: Option<String>,
    pub run_filename: Option<String>,

    /// First element of the final argv: `-c`, `-m`, the script, `-` or empty
    pub argv0: String,
    /// Tokens after the run-mode boundary
    pub rest: Vec<String>,
}

impl CommandLine {
    /// Parse `args` (including `argv[0]`); unknown flags are errors
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Signal<Self> {
        Self::scan(args, true)
    }

    /// Parse `args`, skipping unknown flags.
    ///
    /// Used during pre-initialization, where only a handful of options
    /// matter and the full parse reports problems later.
    pub fn parse_lenient<S: AsRef<str>>(args: &[S]) -> Signal<Self> {
        Self::scan(args, false)
    }

    /// Value of the `-X name` or `-X name=value` option, last one wins.
    ///
    /// Returns `Some(None)` for a bare `-X name`.
    pub fn x_option(&self, name: &str) -> Option<Option<&str>> {
        self.x_options.iter().rev().find_map(|option| {
            match option.split_once('=') {
                Some((key, value)) if key == name => Some(Some(value)),
                None if option == name => Some(None),
                _ => None,
            }
        })
    }

    fn scan<S: AsRef<str>>(args: &[S], strict: bool) -> Signal<Self> {
        let table = flag_table();
        let Split { options, tail } = split_options(&table, args, strict)?;
        let matches = table.try_get_matches_from(options).map_err(parse_error)?;

        let mut cmdline = CommandLine {
            program_name: args.first().map(|arg| arg.as_ref().to_string()),
            early_exit: if matches.get_flag(id::HELP) {
                Some(EarlyExit::Help)
            } else if matches.get_flag(id::VERSION) {
                Some(EarlyExit::Version)
            } else {
                None
            },
            bytes_warning: count(&matches, id::BYTES_WARNING),
            write_bytecode: switch(&matches, id::DONT_WRITE_BYTECODE, false),
            parser_debug: count(&matches, id::PARSER_DEBUG),
            use_environment: switch(&matches, id::IGNORE_ENVIRONMENT, false),
            inspect: switch(&matches, id::INSPECT, true),
            interactive: switch(&matches, id::INSPECT, true),
            isolated: switch(&matches, id::ISOLATE, true),
            optimization_level: count(&matches, id::OPTIMIZE),
            quiet: switch(&matches, id::QUIET, true),
            user_site: switch(&matches, id::NO_USER_SITE, false),
            site_import: switch(&matches, id::NO_SITE, false),
            buffered_stdio: switch(&matches, id::UNBUFFERED, false),
            verbose: count(&matches, id::VERBOSE),
            skip_source_first_line: switch(&matches, id::SKIP_FIRST_LINE, true),
            warn_options: values(&matches, id::WARN),
            x_options: values(&matches, id::XOPTION),
            run_command: matches.get_one::<String>(id::COMMAND).cloned(),
            run_module: matches.get_one::<String>(id::MODULE).cloned(),
            ..Self::default()
        };

        if let Some((argv0, rest)) = tail {
            cmdline.argv0 = argv0.to_string();
            cmdline.rest = rest;
        } else {
            let mut target = values(&matches, id::TARGET).into_iter();
            if let Some(first) = target.next() {
                if first != "-" {
                    cmdline.run_filename = Some(first.clone());
                }
                cmdline.argv0 = first;
                cmdline.rest = target.collect();
            }
        }
        Ok(cmdline)
    }
}

/// Argument ids in the flag table
mod id {
    pub const BYTES_WARNING: &str = "bytes_warning";
    pub const DONT_WRITE_BYTECODE: &str = "dont_write_bytecode";
    pub const PARSER_DEBUG: &str = "parser_debug";
    pub const IGNORE_ENVIRONMENT: &str = "ignore_environment";
    pub const HELP: &str = "help";
    pub const INSPECT: &str = "inspect";
    pub const ISOLATE: &str = "isolate";
    pub const OPTIMIZE: &str = "optimize";
    pub const QUIET: &str = "quiet";
    pub const NO_USER_SITE: &str = "no_user_site";
    pub const NO_SITE: &str = "no_site";
    pub const UNBUFFERED: &str = "unbuffered";
    pub const VERBOSE: &str = "verbose";
    pub const VERSION: &str = "version";
    pub const SKIP_FIRST_LINE: &str = "skip_first_line";
    pub const WARN: &str = "warn";
    pub const XOPTION: &str = "xoption";
    pub const COMMAND: &str = "command";
    pub const MODULE: &str = "module";
    pub const TARGET: &str = "target";
}

/// Every option the launcher understands. Help and version are ordinary
/// switches so that printing them stays with the resolver.
fn flag_table() -> Command {
    Command::new("ember")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(counter('b', id::BYTES_WARNING))
        .arg(flag('B', id::DONT_WRITE_BYTECODE))
        .arg(counter('d', id::PARSER_DEBUG))
        .arg(flag('E', id::IGNORE_ENVIRONMENT))
        .arg(flag('h', id::HELP).visible_short_alias('?').long("help"))
        .arg(flag('i', id::INSPECT))
        .arg(flag('I', id::ISOLATE))
        .arg(counter('O', id::OPTIMIZE))
        .arg(flag('q', id::QUIET))
        .arg(flag('s', id::NO_USER_SITE))
        .arg(flag('S', id::NO_SITE))
        .arg(flag('u', id::UNBUFFERED))
        .arg(counter('v', id::VERBOSE))
        .arg(flag('V', id::VERSION).long("version"))
        .arg(flag('x', id::SKIP_FIRST_LINE))
        .arg(valued('W', id::WARN, ArgAction::Append))
        .arg(valued('X', id::XOPTION, ArgAction::Append))
        .arg(valued('c', id::COMMAND, ArgAction::Set))
        .arg(valued('m', id::MODULE, ArgAction::Set))
        .arg(
            Arg::new(id::TARGET)
                .num_args(1..)
                .trailing_var_arg(true)
                .action(ArgAction::Append),
        )
}

fn flag(short: char, id: &'static str) -> Arg {
    Arg::new(id).short(short).action(ArgAction::SetTrue)
}

fn counter(short: char, id: &'static str) -> Arg {
    Arg::new(id).short(short).action(ArgAction::Count)
}

fn valued(short: char, id: &'static str, action: ArgAction) -> Arg {
    Arg::new(id)
        .short(short)
        .action(action)
        .num_args(1)
        .allow_hyphen_values(true)
}

fn count(matches: &ArgMatches, id: &str) -> Option<u32> {
    match matches.get_count(id) {
        0 => None,
        n => Some(u32::from(n)),
    }
}

/// `Some(value)` when the switch was given
fn switch(matches: &ArgMatches, id: &str, value: bool) -> Option<bool> {
    matches.get_flag(id).then_some(value)
}

fn values(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Tokens for clap, plus what follows a `-c`/`-m` argument
struct Split {
    options: Vec<String>,
    tail: Option<(&'static str, Vec<String>)>,
}

/// Walk the option tokens up to the run-mode boundary.
///
/// In lenient mode unknown flags are dropped here so that clap only ever
/// sees options from the table.
fn split_options<S: AsRef<str>>(table: &Command, args: &[S], strict: bool) -> Signal<Split> {
    let mut options: Vec<String> = collect(&args[..args.len().min(1)]);
    let mut index = 1;

    'tokens: while index < args.len() {
        let token = args[index].as_ref();
        if token == "-" || token == "--" || !token.starts_with('-') {
            options.extend(collect(&args[index..]));
            break;
        }
        index += 1;

        if let Some(long) = token.strip_prefix("--") {
            if strict || table.get_arguments().any(|arg| arg.get_long() == Some(long)) {
                options.push(token.to_string());
            } else {
                tracing::trace!(option = token, "skipping unknown long option");
            }
            continue;
        }

        let flags = &token[1..];
        let mut kept = String::from("-");
        for (offset, flag) in flags.char_indices() {
            match short_arg(table, flag) {
                Some(arg) if arg.get_action().takes_values() => {
                    kept.push_str(&flags[offset..]);
                    options.push(kept);
                    if offset + flag.len_utf8() == flags.len() {
                        let value = args.get(index).ok_or_else(|| {
                            Error::config(ORIGIN, format!("argument expected for the -{} option", flag))
                        })?;
                        options.push(value.as_ref().to_string());
                        index += 1;
                    }
                    if let Some(argv0) = terminator(flag) {
                        return Ok(Split {
                            options,
                            tail: Some((argv0, collect(&args[index..]))),
                        });
                    }
                    continue 'tokens;
                }
                Some(_) => kept.push(flag),
                // clap reports it
                None if strict => kept.push(flag),
                None => tracing::trace!(%flag, "skipping unknown option"),
            }
        }
        if kept.len() > 1 {
            options.push(kept);
        }
    }

    Ok(Split { options, tail: None })
}

fn short_arg(table: &Command, flag: char) -> Option<&Arg> {
    table.get_arguments().find(|arg| {
        arg.get_short_and_visible_aliases()
            .is_some_and(|shorts| shorts.contains(&flag))
    })
}

/// The argv marker for options that end option parsing
fn terminator(flag: char) -> Option<&'static str> {
    match flag {
        'c' => Some("-c"),
        'm' => Some("-m"),
        _ => None,
    }
}

fn parse_error(err: clap::Error) -> Status {
    let message = match (err.kind(), err.get(ContextKind::InvalidArg)) {
        (ErrorKind::UnknownArgument, Some(ContextValue::String(option))) => {
            format!("unknown option {}", option)
        }
        _ => {
            let rendered = err.render().to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            first_line.trim_start_matches("error: ").to_string()
        }
    };
    Error::config(ORIGIN, message).into()
}

fn collect<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter().map(|arg| arg.as_ref().to_string()).collect()
}

/// Text printed for `-V`
pub fn version_text() -> String {
    format!("Ember {}", env!("CARGO_PKG_VERSION"))
}

/// Text printed for `-h`
pub fn usage(program: &str) -> String {
    format!(
        "usage: {program} [option] ... [-c cmd | -m mod | file | -] [arg] ...
Options:
-b     : warn about bytes/str comparisons (-bb: make them errors)
-B     : don't write bytecode files
-c cmd : program passed in as string (terminates option list)
-d     : parser debug output (repeat for more)
-E     : ignore EMBER_* environment variables
-h     : print this help message and exit (also -? or --help)
-i     : inspect interactively after running the program
-I     : isolate from the user's environment (implies -E and -s)
-m mod : run library module as a script (terminates option list)
-O     : raise the optimization level (repeat for more)
-q     : don't print version and copyright messages on interactive startup
-s     : don't add the user site directory to the search path
-S     : don't import the site module on startup
-u     : unbuffered binary stdout and stderr
-v     : verbose import tracing (repeat for more)
-V     : print the version number and exit (also --version)
-W arg : warning control
-x     : skip the first line of source
-X opt : implementation-specific option (dev, utf8, faulthandler,
         tracemalloc[=N], importtime, cache_prefix=PATH)
file   : program read from script file
-      : program read from stdin (default; interactive mode if a tty)
"
    )
}
