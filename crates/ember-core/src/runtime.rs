//! The runtime handle
//!
//! A [`Runtime`] owns one lifecycle, the frozen pre-configuration, the
//! reference configuration and the collaborators every resolution step
//! delegates to. Handles are independent of each other.

use std::io::Write;

use crate::config::{ConfigResolver, ConfigView, ListField, ResolvedConfig};
use crate::decode::Decoder;
use crate::host::{InstallLayout, LocaleProbe, PathCalculator, SystemLocale};
use crate::lifecycle::{Lifecycle, LifecycleState, Transition};
use crate::preconfig::{PreConfig, PreConfigResolver, ResolvedPreConfig};
use crate::sources::{ConfigFileProvider, EnvSource, NoLayoutFile, OsEnvironment};
use crate::{Error, Signal};

/// External services the bootstrap delegates to
pub struct Collaborators {
    pub env: Box<dyn EnvSource>,
    pub locale: Box<dyn LocaleProbe>,
    pub layout_file: Box<dyn ConfigFileProvider>,
    pub paths: Box<dyn PathCalculator>,
    /// Receives the help and version texts
    pub console: Box<dyn Write + Send>,
}

impl Default for Collaborators {
    /// Process environment, system locale, no layout file, the standard
    /// install layout and stdout
    fn default() -> Self {
        Self {
            env: Box::new(OsEnvironment),
            locale: Box::new(SystemLocale),
            layout_file: Box::new(NoLayoutFile),
            paths: Box::new(InstallLayout),
            console: Box::new(std::io::stdout()),
        }
    }
}

/// Explicit context for one embedded runtime
pub struct Runtime {
    lifecycle: Lifecycle,
    preconfig: Option<ResolvedPreConfig>,
    config: Option<ResolvedConfig>,
    collaborators: Collaborators,
}

impl Runtime {
    /// Handle backed by the operating system
    pub fn new() -> Self {
        Self::with_collaborators(Collaborators::default())
    }

    pub fn with_collaborators(collaborators: Collaborators) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            preconfig: None,
            config: None,
            collaborators,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Frozen pre-configuration, once pre-initialized
    pub fn preconfig(&self) -> Option<&ResolvedPreConfig> {
        self.preconfig.as_ref()
    }

    /// Reference configuration, once initialized
    pub fn config(&self) -> Option<&ResolvedConfig> {
        self.config.as_ref()
    }

    /// Resolve and freeze the pre-configuration.
    ///
    /// A no-op when pre-initialization already happened; the first
    /// resolution stays in force until the handle is finalized.
    pub fn pre_initialize<B: AsRef<[u8]>>(
        &mut self,
        explicit: &PreConfig,
        args: Option<&[B]>,
    ) -> Signal<()> {
        if self.lifecycle.is_pre_initialized() {
            tracing::debug!(state = %self.state(), "already pre-initialized");
            return Ok(());
        }
        if self.state() == LifecycleState::Finalized {
            return Err(Error::state("pre-initialize", self.state(), "unconfigured").into());
        }

        let resolved = PreConfigResolver::new(
            self.collaborators.env.as_ref(),
            self.collaborators.locale.as_ref(),
        )
        .resolve(explicit, args)?;
        self.lifecycle.pre_initialize()?;
        self.preconfig = Some(resolved);
        Ok(())
    }

    /// Pre-initialize from the flags of a partial configuration.
    ///
    /// Only isolated, use-environment, dev mode and parse-argv carry over;
    /// argv pseudo-options are read from the partial's argv.
    pub fn pre_initialize_from_config(&mut self, partial: &dyn ConfigView) -> Signal<()> {
        let flags = partial.flags();
        let explicit = PreConfig {
            isolated: flags.isolated,
            use_environment: flags.use_environment,
            dev_mode: flags.dev_mode,
            parse_argv: flags.parse_argv,
            ..PreConfig::new()
        };
        let args: Option<Vec<&[u8]>> = partial
            .list(ListField::Argv)
            .map(|argv| argv.iter().map(str::as_bytes).collect());
        self.pre_initialize(&explicit, args.as_deref())
    }

    /// Decoder implied by the frozen pre-configuration
    pub fn decoder(&self) -> Signal<Decoder> {
        self.lifecycle.require_pre_initialized("decode")?;
        let utf8_mode = self.preconfig.as_ref().is_some_and(|pre| pre.utf8_mode);
        Ok(Decoder::new(utf8_mode))
    }

    /// Resolve `partial` without installing the result.
    ///
    /// Pre-initializes implicitly when needed; otherwise leaves the state
    /// alone.
    pub fn resolve_config(&mut self, partial: &dyn ConfigView) -> Signal<ResolvedConfig> {
        if !self.lifecycle.is_pre_initialized() {
            self.pre_initialize_from_config(partial)?;
        }
        let decoder = self.decoder()?;
        let pre = self
            .preconfig
            .as_ref()
            .ok_or_else(|| Error::state("resolve config", self.lifecycle.state(), "pre-initialized"))?;

        let collaborators = &mut self.collaborators;
        ConfigResolver::new(
            collaborators.env.as_ref(),
            collaborators.layout_file.as_ref(),
            collaborators.paths.as_ref(),
            collaborators.console.as_mut(),
        )
        .resolve(partial, pre, &decoder)
    }

    /// Resolve `partial` and install it as the reference configuration.
    ///
    /// On failure the previous state and reference configuration are kept.
    pub fn initialize(&mut self, partial: &dyn ConfigView) -> Signal<()> {
        if matches!(self.state(), LifecycleState::Running | LifecycleState::Finalized) {
            return Err(Error::state("initialize", self.state(), "pre-initialized").into());
        }
        let resolved = self.resolve_config(partial)?;
        if self.lifecycle.initialize()? == Transition::Unchanged {
            tracing::debug!("replacing the reference configuration");
        }
        self.config = Some(resolved);
        Ok(())
    }

    /// Enter the running state and hand out the reference configuration
    pub(crate) fn begin_run(&mut self) -> Signal<&ResolvedConfig> {
        self.lifecycle.run()?;
        self.config
            .as_ref()
            .ok_or_else(|| Error::state("run", self.lifecycle.state(), "initialized").into())
    }

    /// Release the reference configuration and pre-configuration
    pub fn finalize(&mut self) -> Transition {
        let transition = self.lifecycle.finalize();
        if transition == Transition::Applied {
            self.config = None;
            self.preconfig = None;
        }
        transition
    }

    /// Make a finalized handle usable again
    pub fn reinitialize(&mut self) -> Signal<()> {
        self.lifecycle.reinitialize()?;
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("state", &self.lifecycle.state())
            .field("preconfig", &self.preconfig)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
