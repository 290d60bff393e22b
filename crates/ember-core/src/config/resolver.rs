//! Configuration resolution with per-field precedence
//!
//! Every field is merged from these tiers, highest first:
//!
//! 1. explicit value on the partial configuration
//! 2. command-line option
//! 3. environment variable
//! 4. layout file entry
//! 5. compiled-in default
//!
//! A few rules are applied on top of the merge: isolated mode switches the
//! environment and user site off, dev mode turns the fault handler on,
//! warning options are concatenated instead of overridden, and the
//! installation layout is computed last from the final program name, home
//! and prefixes.

use std::io::Write;

use super::resolved::ResolvedConfig;
use super::types::{ConfigView, HashSeed, ListField, TextField};
use crate::decode::Decoder;
use crate::host::{PathCalculator, PathInput};
use crate::preconfig::{LocaleCoercion, ResolvedPreConfig};
use crate::sources::{
    CommandLine, PATH_LIST_SEPARATOR, ConfigFileProvider, EarlyExit, EnvSource, Environment, FileEntries, usage,
    version_text, vars,
};
use crate::strlist::copy_text;
use crate::{Error, Signal, Status, StringList};

const ORIGIN: &str = "resolve config";
const DEFAULT_PROGRAM_NAME: &str = "ember";

/// Merges a partial configuration with every other source
pub struct ConfigResolver<'a> {
    env: &'a dyn EnvSource,
    file: &'a dyn ConfigFileProvider,
    paths: &'a dyn PathCalculator,
    console: &'a mut dyn Write,
}

impl<'a> ConfigResolver<'a> {
    /// `console` receives the help and version texts
    pub fn new(
        env: &'a dyn EnvSource,
        file: &'a dyn ConfigFileProvider,
        paths: &'a dyn PathCalculator,
        console: &'a mut dyn Write,
    ) -> Self {
        Self {
            env,
            file,
            paths,
            console,
        }
    }

    /// Produce the full configuration.
    ///
    /// `pre` must be the frozen pre-configuration and `decoder` the decoder
    /// it implies. Returns `Exit` for `-h` / `-V` before anything is merged.
    pub fn resolve(
        &mut self,
        partial: &dyn ConfigView,
        pre: &ResolvedPreConfig,
        decoder: &Decoder,
    ) -> Signal<ResolvedConfig> {
        let flags = partial.flags();
        let explicit_argv = partial.list(ListField::Argv);
        let parse_argv = flags.parse_argv.unwrap_or(pre.parse_argv);

        let cmdline = match explicit_argv {
            Some(argv) if parse_argv => {
                let tokens: Vec<&str> = argv.iter().collect();
                CommandLine::parse(&tokens)?
            }
            _ => CommandLine::default(),
        };
        if let Some(request) = cmdline.early_exit {
            return Err(self.early_exit(request, cmdline.program_name.as_deref()));
        }

        let isolated = flags.isolated.or(cmdline.isolated).unwrap_or(pre.isolated);
        let use_environment = !isolated
            && flags
                .use_environment
                .or(cmdline.use_environment)
                .unwrap_or(pre.use_environment);
        let dev_mode = flags
            .dev_mode
            .or(cmdline.x_option("dev").map(|_| true))
            .unwrap_or(pre.dev_mode);
        let env = Environment::new(self.env, use_environment);
        let entries = self.file.load()?;
        let file = FileTier(&entries);
        tracing::debug!(
            isolated,
            use_environment,
            dev_mode,
            file_keys = entries.len(),
            "resolving configuration"
        );

        let run = select_run_mode(partial, &cmdline, &env, decoder)?;

        let bytes_warning = flags.bytes_warning.or(cmdline.bytes_warning).unwrap_or(0);
        let user_site = !isolated
            && flags
                .user_site
                .or(cmdline.user_site)
                .or(env.enabled_flag(vars::NO_USER_SITE).map(|on| !on))
                .or(file.flag("user_site")?)
                .unwrap_or(true);

        let warn_options = warn_options(partial, &cmdline, &env, decoder, dev_mode, bytes_warning)?;
        let mut x_options = match partial.list(ListField::XOptions) {
            Some(explicit) => explicit.to_list()?,
            None => StringList::new(),
        };
        for option in &cmdline.x_options {
            x_options.append(option)?;
        }

        let explicit_argv = explicit_argv.map(|argv| argv.to_list()).transpose()?;
        let argv = final_argv(explicit_argv.as_ref(), &cmdline, parse_argv)?;

        let (stdio_encoding, stdio_errors) = stdio_encoding(partial, &env, pre)?;
        let (filesystem_encoding, filesystem_errors) = filesystem_encoding(partial, pre)?;

        let cache_prefix = match explicit_text(partial, TextField::CachePrefix)? {
            Some(prefix) => Some(prefix),
            None => match cmdline.x_option("cache_prefix") {
                Some(Some(prefix)) => Some(copy_text(prefix, ORIGIN)?),
                _ => env
                    .text(vars::CACHE_PREFIX, decoder)?
                    .or(file.text("cache_prefix")),
            },
        };

        // Paths last: they depend on the final program name, home and prefixes
        let program_name = match explicit_text(partial, TextField::ProgramName)? {
            Some(name) => name,
            None => explicit_argv
                .as_ref()
                .and_then(|argv| argv.get(0))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .or(file.text("program_name"))
                .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string()),
        };
        let home = match explicit_text(partial, TextField::Home)? {
            Some(home) => Some(home),
            None => env.text(vars::HOME, decoder)?.or(file.text("home")),
        };
        let executable = explicit_text(partial, TextField::Executable)?.or(file.text("executable"));
        let prefix = explicit_text(partial, TextField::Prefix)?.or(file.text("prefix"));
        let exec_prefix = explicit_text(partial, TextField::ExecPrefix)?.or(file.text("exec_prefix"));
        let explicit_search_paths = partial
            .list(ListField::ModuleSearchPaths)
            .map(|paths| paths.to_list())
            .transpose()?;

        let (executable, prefix, exec_prefix, module_search_paths) =
            match (executable, prefix, exec_prefix, explicit_search_paths) {
                (Some(executable), Some(prefix), Some(exec_prefix), Some(paths)) => {
                    tracing::debug!("all layout fields explicit, skipping path calculation");
                    (executable, prefix, exec_prefix, paths)
                }
                (executable, prefix, exec_prefix, paths) => {
                    let extra_paths = env
                        .list(vars::PATH, PATH_LIST_SEPARATOR, decoder)?
                        .unwrap_or_default();
                    let input = PathInput {
                        program_name: &program_name,
                        executable: executable.as_deref(),
                        home: home.as_deref(),
                        prefix: prefix.as_deref(),
                        exec_prefix: exec_prefix.as_deref(),
                        extra_paths: &extra_paths,
                    };
                    let layout = self.paths.calculate(&input).map_err(|status| match status {
                        Status::Error(err) => {
                            Error::config(ORIGIN, format!("path calculation failed: {}", err)).into()
                        }
                        exit => exit,
                    })?;
                    (
                        executable.unwrap_or(layout.executable),
                        prefix.unwrap_or(layout.prefix),
                        exec_prefix.unwrap_or(layout.exec_prefix),
                        paths.unwrap_or(layout.module_search_paths),
                    )
                }
            };

        let resolved = ResolvedConfig {
            quiet: flags.quiet.or(cmdline.quiet).unwrap_or(false),
            verbose: flags
                .verbose
                .or(cmdline.verbose)
                .or(env.level(vars::VERBOSE))
                .unwrap_or(0),
            interactive: flags.interactive.or(cmdline.interactive).unwrap_or(false),
            inspect: flags
                .inspect
                .or(cmdline.inspect)
                .or(env.enabled_flag(vars::INSPECT))
                .unwrap_or(false),
            optimization_level: flags
                .optimization_level
                .or(cmdline.optimization_level)
                .or(env.level(vars::OPTIMIZE))
                .or(file.number("optimization_level")?)
                .unwrap_or(0),
            write_bytecode: flags
                .write_bytecode
                .or(cmdline.write_bytecode)
                .or(env.enabled_flag(vars::DONT_WRITE_BYTECODE).map(|on| !on))
                .or(file.flag("write_bytecode")?)
                .unwrap_or(true),
            buffered_stdio: flags
                .buffered_stdio
                .or(cmdline.buffered_stdio)
                .or(env.enabled_flag(vars::UNBUFFERED).map(|on| !on))
                .unwrap_or(true),
            hash_seed: match flags.hash_seed {
                Some(seed) => seed,
                None => env_hash_seed(&env)?.unwrap_or(HashSeed::Random),
            },
            dev_mode,
            isolated,
            use_environment,
            user_site,
            site_import: flags.site_import.or(cmdline.site_import).unwrap_or(true),
            faulthandler: flags.faulthandler.unwrap_or_else(|| {
                dev_mode
                    || cmdline.x_option("faulthandler").is_some()
                    || env.flag(vars::FAULTHANDLER)
            }),
            tracemalloc: match flags.tracemalloc {
                Some(frames) => frames,
                None => match argv_tracemalloc(&cmdline)? {
                    Some(frames) => frames,
                    None => env.strict_u32(vars::TRACEMALLOC, ORIGIN)?.unwrap_or(0),
                },
            },
            import_time: flags
                .import_time
                .or(cmdline.x_option("importtime").map(|_| true))
                .or(env.enabled_flag(vars::PROFILE_IMPORT_TIME))
                .unwrap_or(false),
            bytes_warning,
            parser_debug: flags
                .parser_debug
                .or(cmdline.parser_debug)
                .or(env.level(vars::DEBUG))
                .unwrap_or(0),
            skip_source_first_line: flags
                .skip_source_first_line
                .or(cmdline.skip_source_first_line)
                .unwrap_or(false),
            parse_argv,

            program_name,
            executable,
            home,
            prefix,
            exec_prefix,
            filesystem_encoding,
            filesystem_errors,
            stdio_encoding,
            stdio_errors,
            cache_prefix,
            run_command: run.command,
            run_module: run.module,
            run_filename: run.filename,

            argv,
            module_search_paths,
            warn_options,
            x_options,
        };
        tracing::debug!(
            run_mode = ?resolved.run_mode(),
            search_paths = resolved.module_search_paths.len(),
            "configuration resolved"
        );
        Ok(resolved)
    }

    /// Print the requested text and turn it into an exit request
    fn early_exit(&mut self, request: EarlyExit, program: Option<&str>) -> Status {
        let text = match request {
            EarlyExit::Help => usage(program.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PROGRAM_NAME)),
            EarlyExit::Version => format!("{}\n", version_text()),
        };
        if let Err(err) = self.console.write_all(text.as_bytes()).and_then(|_| self.console.flush()) {
            tracing::warn!(%err, "could not write to console");
        }
        tracing::debug!(?request, "early exit requested on the command line");
        Status::exit(0)
    }
}

/// Layout-file tier accessors
struct FileTier<'e>(&'e FileEntries);

impl FileTier<'_> {
    fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn flag(&self, key: &str) -> Signal<Option<bool>> {
        match self.0.get(key).map(String::as_str) {
            None => Ok(None),
            Some("true" | "1") => Ok(Some(true)),
            Some("false" | "0") => Ok(Some(false)),
            Some(other) => Err(Error::config(
                ORIGIN,
                format!("layout file key {}: expected a boolean, got {:?}", key, other),
            )
            .into()),
        }
    }

    fn number(&self, key: &str) -> Signal<Option<u32>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => value.parse::<u32>().map(Some).map_err(|_| {
                Error::config(
                    ORIGIN,
                    format!("layout file key {}: expected a non-negative integer, got {:?}", key, value),
                )
                .into()
            }),
        }
    }
}

fn explicit_text(partial: &dyn ConfigView, field: TextField) -> Signal<Option<String>> {
    partial
        .text(field)
        .map(|value| copy_text(value, ORIGIN))
        .transpose()
}

/// Selected run-mode selectors; at most one is set
#[derive(Debug, Default)]
struct RunSelection {
    command: Option<String>,
    module: Option<String>,
    filename: Option<String>,
}

/// The highest tier that sets any selector wins; two selectors in that tier
/// conflict.
fn select_run_mode(
    partial: &dyn ConfigView,
    cmdline: &CommandLine,
    env: &Environment<'_>,
    decoder: &Decoder,
) -> Signal<RunSelection> {
    let tiers = [
        (
            "explicit",
            [
                explicit_text(partial, TextField::RunCommand)?,
                explicit_text(partial, TextField::RunModule)?,
                explicit_text(partial, TextField::RunFilename)?,
            ],
        ),
        (
            "command line",
            [
                cmdline.run_command.clone(),
                cmdline.run_module.clone(),
                cmdline.run_filename.clone(),
            ],
        ),
        (
            "environment",
            [
                env.text(vars::RUN_COMMAND, decoder)?,
                env.text(vars::RUN_MODULE, decoder)?,
                env.text(vars::RUN_FILE, decoder)?,
            ],
        ),
    ];
    let names = [
        TextField::RunCommand.name(),
        TextField::RunModule.name(),
        TextField::RunFilename.name(),
    ];

    for (tier, selectors) in tiers {
        let set: Vec<&str> = names
            .iter()
            .zip(&selectors)
            .filter(|(_, value)| value.is_some())
            .map(|(name, _)| *name)
            .collect();
        match set.len() {
            0 => continue,
            1 => {
                tracing::debug!(tier, selector = set[0], "run mode selected");
                let [command, module, filename] = selectors;
                return Ok(RunSelection {
                    command,
                    module,
                    filename,
                });
            }
            _ => {
                return Err(Error::config(
                    ORIGIN,
                    format!("conflicting run modes set at the {} level: {}", tier, set.join(", ")),
                )
                .into());
            }
        }
    }
    tracing::debug!("no run mode selected, falling back to interactive");
    Ok(RunSelection::default())
}

/// Lowest precedence first: dev mode default, bytes warnings, environment,
/// `-W`, explicit. Later entries override earlier ones when applied.
fn warn_options(
    partial: &dyn ConfigView,
    cmdline: &CommandLine,
    env: &Environment<'_>,
    decoder: &Decoder,
    dev_mode: bool,
    bytes_warning: u32,
) -> Signal<StringList> {
    let mut options = StringList::new();
    if dev_mode {
        options.append("default")?;
    }
    match bytes_warning {
        0 => {}
        1 => options.append("default::BytesWarning")?,
        _ => options.append("error::BytesWarning")?,
    }
    if let Some(from_env) = env.list(vars::WARNINGS, ',', decoder)? {
        options.extend(&from_env)?;
    }
    for option in &cmdline.warn_options {
        options.append(option)?;
    }
    if let Some(explicit) = partial.list(ListField::WarnOptions) {
        for option in explicit.iter() {
            options.append(option)?;
        }
    }
    Ok(options)
}

fn final_argv(
    explicit: Option<&StringList>,
    cmdline: &CommandLine,
    parse_argv: bool,
) -> Signal<StringList> {
    let mut argv = StringList::new();
    match explicit {
        Some(_) if parse_argv => {
            argv.append(&cmdline.argv0)?;
            for arg in &cmdline.rest {
                argv.append(arg)?;
            }
        }
        Some(explicit) if !explicit.is_empty() => argv.replace_all(explicit)?,
        _ => argv.append("")?,
    }
    Ok(argv)
}

fn argv_tracemalloc(cmdline: &CommandLine) -> Signal<Option<u32>> {
    match cmdline.x_option("tracemalloc") {
        None => Ok(None),
        Some(None) => Ok(Some(1)),
        Some(Some(frames)) => frames.parse::<u32>().map(Some).map_err(|_| {
            Error::config(
                ORIGIN,
                format!("-X tracemalloc=NFRAME: invalid number of frames {:?}", frames),
            )
            .into()
        }),
    }
}

fn env_hash_seed(env: &Environment<'_>) -> Signal<Option<HashSeed>> {
    let Some(value) = env.ascii(vars::HASHSEED) else {
        return Ok(None);
    };
    if value == "random" {
        return Ok(Some(HashSeed::Random));
    }
    value
        .parse::<u32>()
        .map(|seed| Some(HashSeed::Fixed(seed)))
        .map_err(|_| {
            Error::config(
                ORIGIN,
                format!(
                    "{} must be \"random\" or an integer in range [0; {}]",
                    vars::HASHSEED,
                    u32::MAX
                ),
            )
            .into()
        })
}

/// `EMBER_IO_ENCODING` is `encoding[:errors]`; either half may be empty
fn stdio_encoding(
    partial: &dyn ConfigView,
    env: &Environment<'_>,
    pre: &ResolvedPreConfig,
) -> Signal<(String, String)> {
    let (env_encoding, env_errors) = match env.ascii(vars::IO_ENCODING) {
        Some(value) => {
            let (encoding, errors) = value.split_once(':').unwrap_or((value.as_str(), ""));
            let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_string());
            (non_empty(encoding), non_empty(errors))
        }
        None => (None, None),
    };

    let encoding = match explicit_text(partial, TextField::StdioEncoding)? {
        Some(encoding) => encoding,
        None => env_encoding.unwrap_or_else(|| {
            if pre.utf8_mode {
                "utf-8".to_string()
            } else {
                pre.locale.encoding.clone()
            }
        }),
    };
    let errors = match explicit_text(partial, TextField::StdioErrors)? {
        Some(errors) => errors,
        None => env_errors.unwrap_or_else(|| {
            let escape = pre.utf8_mode
                || pre.locale.legacy
                || pre.coerce_c_locale == LocaleCoercion::Forced;
            let errors = if escape { "surrogateescape" } else { "strict" };
            errors.to_string()
        }),
    };
    Ok((encoding, errors))
}

fn filesystem_encoding(partial: &dyn ConfigView, pre: &ResolvedPreConfig) -> Signal<(String, String)> {
    let encoding = match explicit_text(partial, TextField::FilesystemEncoding)? {
        Some(encoding) => encoding,
        None if pre.utf8_mode => "utf-8".to_string(),
        None if pre.legacy_windows_fs_encoding => "mbcs".to_string(),
        None => pre.locale.encoding.clone(),
    };
    let errors = match explicit_text(partial, TextField::FilesystemErrors)? {
        Some(errors) => errors,
        None if pre.legacy_windows_fs_encoding && !pre.utf8_mode => "replace".to_string(),
        None => "surrogateescape".to_string(),
    };
    Ok((encoding, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StaticConfig};
    use crate::host::{LocaleInfo, PathLayout};
    use crate::preconfig::Allocator;
    use std::collections::BTreeMap;
    use std::ffi::OsString;

    struct Env(BTreeMap<&'static str, &'static str>);

    impl EnvSource for Env {
        fn var_os(&self, name: &str) -> Option<OsString> {
            self.0.get(name).map(|value| OsString::from(*value))
        }
    }

    struct Entries(FileEntries);

    impl ConfigFileProvider for Entries {
        fn load(&self) -> Signal<FileEntries> {
            Ok(self.0.clone())
        }
    }

    struct Fixed;

    impl PathCalculator for Fixed {
        fn calculate(&self, input: &PathInput<'_>) -> Signal<PathLayout> {
            let mut module_search_paths = input.extra_paths.clone();
            module_search_paths.append("/opt/ember/lib/ember")?;
            Ok(PathLayout {
                executable: "/opt/ember/bin/ember".to_string(),
                prefix: "/opt/ember".to_string(),
                exec_prefix: "/opt/ember".to_string(),
                module_search_paths,
            })
        }
    }

    fn pre() -> ResolvedPreConfig {
        ResolvedPreConfig {
            allocator: Allocator::Default,
            coerce_c_locale: LocaleCoercion::Off,
            coerce_c_locale_warn: false,
            dev_mode: false,
            isolated: false,
            use_environment: true,
            utf8_mode: false,
            legacy_windows_fs_encoding: false,
            parse_argv: true,
            locale: LocaleInfo::fallback(),
        }
    }

    fn resolve_with(
        env: &[(&'static str, &'static str)],
        file: &[(&str, &str)],
        partial: &dyn ConfigView,
    ) -> (Signal<ResolvedConfig>, String) {
        let env = Env(env.iter().copied().collect());
        let file = Entries(
            file.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
        let mut console = Vec::new();
        let result = ConfigResolver::new(&env, &file, &Fixed, &mut console).resolve(
            partial,
            &pre(),
            &Decoder::new(false),
        );
        (result, String::from_utf8_lossy(&console).into_owned())
    }

    #[test]
    fn defaults_fill_every_field() {
        let (resolved, _) = resolve_with(&[], &[], &Config::new());
        let resolved = resolved.unwrap();

        assert_eq!(resolved.program_name, "ember");
        assert_eq!(resolved.argv.as_slice(), [""]);
        assert_eq!(resolved.prefix, "/opt/ember");
        assert!(resolved.write_bytecode);
        assert!(resolved.user_site);
        assert_eq!(resolved.hash_seed, HashSeed::Random);
        assert_eq!(resolved.stdio_errors, "strict");
        assert_eq!(resolved.filesystem_errors, "surrogateescape");
    }

    #[test]
    fn tiers_apply_in_precedence_order() {
        let env = [(vars::OPTIMIZE, "2"), (vars::VERBOSE, "3")];
        let file = [("optimization_level", "1"), ("write_bytecode", "false")];
        let argv = ["ember", "-v"];
        let partial = StaticConfig {
            argv: Some(&argv[..]),
            ..StaticConfig::default()
        };
        let (resolved, _) = resolve_with(&env, &file, &partial);
        let resolved = resolved.unwrap();

        assert_eq!(resolved.verbose, 1);
        assert_eq!(resolved.optimization_level, 2);
        assert!(!resolved.write_bytecode);
    }

    #[test]
    fn version_option_prints_and_requests_exit() {
        let argv = ["ember", "-V"];
        let partial = StaticConfig {
            argv: Some(&argv[..]),
            ..StaticConfig::default()
        };
        let (result, console) = resolve_with(&[], &[], &partial);

        assert_eq!(result.unwrap_err().exit_code(), 0);
        assert!(console.starts_with("Ember "));
    }

    #[test]
    fn bad_layout_file_boolean_is_a_config_error() {
        let (result, _) = resolve_with(&[], &[("user_site", "maybe")], &Config::new());
        let status = result.unwrap_err();
        assert!(status.is_error());
        assert!(status.to_string().contains("user_site"));
    }
}
