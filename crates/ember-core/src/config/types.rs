//! Partial configuration records and the view the resolver reads them through
//!
//! Two ownership regimes exist, as two types:
//!
//! - [`StaticConfig`] borrows every text and list value from the caller and
//!   is populated by plain field assignment. Nothing allocates; nothing is
//!   released.
//! - [`Config`] owns every text and list value. It is populated through
//!   setters that copy (and, for bytes, decode) their input, and releases its
//!   storage with [`Config::clear`].
//!
//! The resolver only needs read access, through [`ConfigView`].

use serde::{Deserialize, Serialize};

use crate::decode::Decoder;
use crate::strlist::copy_text;
use crate::{Signal, StringList};

/// Hash randomization control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashSeed {
    /// A fresh random seed per process
    Random,
    /// A fixed seed; zero disables randomization
    Fixed(u32),
}

/// Scalar settings shared by both ownership regimes. `None` means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigFlags {
    pub quiet: Option<bool>,
    pub verbose: Option<u32>,
    pub interactive: Option<bool>,
    pub inspect: Option<bool>,
    pub optimization_level: Option<u32>,
    pub write_bytecode: Option<bool>,
    pub buffered_stdio: Option<bool>,
    pub hash_seed: Option<HashSeed>,
    pub dev_mode: Option<bool>,
    pub isolated: Option<bool>,
    pub use_environment: Option<bool>,
    pub user_site: Option<bool>,
    pub site_import: Option<bool>,
    pub faulthandler: Option<bool>,
    /// Number of frames to record; zero disables tracing
    pub tracemalloc: Option<u32>,
    pub import_time: Option<bool>,
    pub bytes_warning: Option<u32>,
    pub parser_debug: Option<u32>,
    pub skip_source_first_line: Option<bool>,
    pub parse_argv: Option<bool>,
}

/// Text fields of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextField {
    ProgramName,
    Executable,
    Home,
    Prefix,
    ExecPrefix,
    FilesystemEncoding,
    FilesystemErrors,
    StdioEncoding,
    StdioErrors,
    CachePrefix,
    RunCommand,
    RunModule,
    RunFilename,
}

impl TextField {
    pub const COUNT: usize = 13;

    pub const ALL: [TextField; Self::COUNT] = [
        Self::ProgramName,
        Self::Executable,
        Self::Home,
        Self::Prefix,
        Self::ExecPrefix,
        Self::FilesystemEncoding,
        Self::FilesystemErrors,
        Self::StdioEncoding,
        Self::StdioErrors,
        Self::CachePrefix,
        Self::RunCommand,
        Self::RunModule,
        Self::RunFilename,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ProgramName => "program_name",
            Self::Executable => "executable",
            Self::Home => "home",
            Self::Prefix => "prefix",
            Self::ExecPrefix => "exec_prefix",
            Self::FilesystemEncoding => "filesystem_encoding",
            Self::FilesystemErrors => "filesystem_errors",
            Self::StdioEncoding => "stdio_encoding",
            Self::StdioErrors => "stdio_errors",
            Self::CachePrefix => "cache_prefix",
            Self::RunCommand => "run_command",
            Self::RunModule => "run_module",
            Self::RunFilename => "run_filename",
        }
    }
}

/// List fields of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListField {
    Argv,
    ModuleSearchPaths,
    WarnOptions,
    XOptions,
}

impl ListField {
    pub const COUNT: usize = 4;

    pub const ALL: [ListField; Self::COUNT] = [
        Self::Argv,
        Self::ModuleSearchPaths,
        Self::WarnOptions,
        Self::XOptions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Argv => "argv",
            Self::ModuleSearchPaths => "module_search_paths",
            Self::WarnOptions => "warn_options",
            Self::XOptions => "x_options",
        }
    }
}

/// Read-only access to a list field, whoever owns it
#[derive(Debug, Clone, Copy)]
pub enum ListView<'a> {
    Owned(&'a StringList),
    Borrowed(&'a [&'a str]),
}

impl<'a> ListView<'a> {
    pub fn len(self) -> usize {
        match self {
            Self::Owned(list) => list.len(),
            Self::Borrowed(items) => items.len(),
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> impl Iterator<Item = &'a str> {
        let (owned, borrowed) = match self {
            Self::Owned(list) => (Some(list.as_slice().iter().map(String::as_str)), None),
            Self::Borrowed(items) => (None, Some(items.iter().copied())),
        };
        owned.into_iter().flatten().chain(borrowed.into_iter().flatten())
    }

    /// Copy into an owned list
    pub fn to_list(self) -> Signal<StringList> {
        let mut list = StringList::new();
        for item in self.iter() {
            list.append(item)?;
        }
        Ok(list)
    }
}

/// What the resolver can read from a partial configuration
pub trait ConfigView {
    fn flags(&self) -> &ConfigFlags;
    fn text(&self, field: TextField) -> Option<&str>;
    fn list(&self, field: ListField) -> Option<ListView<'_>>;
}

/// Dynamic configuration: owns every text and list value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub flags: ConfigFlags,
    texts: [Option<String>; TextField::COUNT],
    lists: [Option<StringList>; ListField::COUNT],
}

impl Config {
    /// Everything unset: the environment, argv and layout file all apply
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for embedders: isolated, no environment, argv kept verbatim
    pub fn isolated() -> Self {
        Self {
            flags: ConfigFlags {
                isolated: Some(true),
                use_environment: Some(false),
                user_site: Some(false),
                parse_argv: Some(false),
                ..ConfigFlags::default()
            },
            ..Self::default()
        }
    }

    /// Copy every explicit value of `view` into owned storage
    pub fn from_view(view: &dyn ConfigView) -> Signal<Self> {
        let mut config = Self {
            flags: *view.flags(),
            ..Self::default()
        };
        for field in TextField::ALL {
            if let Some(value) = view.text(field) {
                config.set_text(field, value)?;
            }
        }
        for field in ListField::ALL {
            if let Some(items) = view.list(field) {
                config.lists[field as usize] = Some(items.to_list()?);
            }
        }
        Ok(config)
    }

    pub fn set_text(&mut self, field: TextField, value: &str) -> Signal<()> {
        self.texts[field as usize] = Some(copy_text(value, "config setter")?);
        Ok(())
    }

    /// Decode `bytes` and store the result
    pub fn set_text_bytes(&mut self, decoder: &Decoder, field: TextField, bytes: &[u8]) -> Signal<()> {
        self.texts[field as usize] = Some(decoder.decode(bytes)?);
        Ok(())
    }

    pub fn unset_text(&mut self, field: TextField) {
        self.texts[field as usize] = None;
    }

    /// Replace a list field with copies of `items`
    pub fn set_list<S: AsRef<str>>(&mut self, field: ListField, items: &[S]) -> Signal<()> {
        let items = StringList::from_strs(items)?;
        match &mut self.lists[field as usize] {
            Some(list) => list.replace_all(&items),
            slot => {
                *slot = Some(items);
                Ok(())
            }
        }
    }

    /// Decode raw argv bytes into the argv list
    pub fn set_argv_bytes<B: AsRef<[u8]>>(&mut self, decoder: &Decoder, args: &[B]) -> Signal<()> {
        let mut argv = StringList::new();
        for arg in args {
            argv.push_owned(decoder.decode(arg.as_ref())?)?;
        }
        self.lists[ListField::Argv as usize] = Some(argv);
        Ok(())
    }

    /// Append to a list field, creating it when absent
    pub fn append(&mut self, field: ListField, item: &str) -> Signal<()> {
        self.lists[field as usize]
            .get_or_insert_with(StringList::new)
            .append(item)
    }

    pub fn unset_list(&mut self, field: ListField) {
        self.lists[field as usize] = None;
    }

    /// Release every text and list value.
    ///
    /// Safe on partially populated values and safe to call repeatedly.
    pub fn clear(&mut self) {
        for text in &mut self.texts {
            *text = None;
        }
        for list in &mut self.lists {
            if let Some(items) = list.as_mut() {
                items.clear();
            }
            *list = None;
        }
    }

    /// Whether no text or list value is held
    pub fn is_released(&self) -> bool {
        self.texts.iter().all(Option::is_none) && self.lists.iter().all(Option::is_none)
    }
}

impl ConfigView for Config {
    fn flags(&self) -> &ConfigFlags {
        &self.flags
    }

    fn text(&self, field: TextField) -> Option<&str> {
        self.texts[field as usize].as_deref()
    }

    fn list(&self, field: ListField) -> Option<ListView<'_>> {
        self.lists[field as usize].as_ref().map(ListView::Owned)
    }
}

/// Static configuration: every value borrowed from the caller.
///
/// ```
/// use ember_core::config::{ConfigView, StaticConfig, TextField};
///
/// static ARGV: [&str; 3] = ["ember", "-c", "pass"];
///
/// let config = StaticConfig {
///     program_name: Some("embedded-app"),
///     argv: Some(&ARGV),
///     ..StaticConfig::default()
/// };
/// assert_eq!(config.text(TextField::ProgramName), Some("embedded-app"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticConfig<'a> {
    pub flags: ConfigFlags,

    pub program_name: Option<&'a str>,
    pub executable: Option<&'a str>,
    pub home: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub exec_prefix: Option<&'a str>,
    pub filesystem_encoding: Option<&'a str>,
    pub filesystem_errors: Option<&'a str>,
    pub stdio_encoding: Option<&'a str>,
    pub stdio_errors: Option<&'a str>,
    pub cache_prefix: Option<&'a str>,
    pub run_command: Option<&'a str>,
    pub run_module: Option<&'a str>,
    pub run_filename: Option<&'a str>,

    pub argv: Option<&'a [&'a str]>,
    pub module_search_paths: Option<&'a [&'a str]>,
    pub warn_options: Option<&'a [&'a str]>,
    pub x_options: Option<&'a [&'a str]>,
}

impl ConfigView for StaticConfig<'_> {
    fn flags(&self) -> &ConfigFlags {
        &self.flags
    }

    fn text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::ProgramName => self.program_name,
            TextField::Executable => self.executable,
            TextField::Home => self.home,
            TextField::Prefix => self.prefix,
            TextField::ExecPrefix => self.exec_prefix,
            TextField::FilesystemEncoding => self.filesystem_encoding,
            TextField::FilesystemErrors => self.filesystem_errors,
            TextField::StdioEncoding => self.stdio_encoding,
            TextField::StdioErrors => self.stdio_errors,
            TextField::CachePrefix => self.cache_prefix,
            TextField::RunCommand => self.run_command,
            TextField::RunModule => self.run_module,
            TextField::RunFilename => self.run_filename,
        }
    }

    fn list(&self, field: ListField) -> Option<ListView<'_>> {
        let items = match field {
            ListField::Argv => self.argv,
            ListField::ModuleSearchPaths => self.module_search_paths,
            ListField::WarnOptions => self.warn_options,
            ListField::XOptions => self.x_options,
        };
        items.map(ListView::Borrowed)
    }
}
