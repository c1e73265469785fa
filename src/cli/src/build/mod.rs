//! Build configuration resolution.
//!
//! [`BuildResolver::resolve`] turns the raw flags of one build invocation and
//! its positional context argument into a [`BuildOptions`] value plus the
//! ordered list of build files. Cheap validation runs before anything touches
//! the network or the filesystem. Temporary paths go into the caller's
//! [`CleanupList`] as soon as they exist.

pub mod archive;
pub mod args;
pub mod cleanup;
pub mod containerfile;
pub mod context;
pub mod crypto;
pub mod fetch;
pub mod inputs;
pub mod precedence;

use std::time::Duration;

use chrono::TimeZone;

use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{BuildDefaults, BuildOptions, BuildOutput, BuildStreams, Compression};

use crate::parse;
use cleanup::CleanupList;
use fetch::{ContextFetcher, HttpFetcher};
use inputs::BuildInputs;
use parse::idmap::SubIdFiles;

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBuild {
    pub options: BuildOptions,
    /// Build files in the order given, or the single discovered one
    pub containerfiles: Vec<String>,
}

/// Resolves raw build inputs against configured defaults.
///
/// Holds no per-invocation state; one resolver can serve any number of
/// resolutions.
pub struct BuildResolver {
    defaults: BuildDefaults,
    fetcher: Box<dyn ContextFetcher>,
    env: EnvLookup,
    subid: SubIdFiles,
}

impl BuildResolver {
    /// Resolver that fetches remote contexts over the network and reads the
    /// process environment.
    pub fn new(defaults: BuildDefaults) -> Result<Self> {
        let fetcher = match defaults.fetch_timeout_secs {
            Some(secs) => HttpFetcher::with_timeout(Duration::from_secs(secs))
                .map_err(|e| BuildError::delegated("creating HTTP client", e))?,
            None => HttpFetcher::new(),
        };
        Ok(Self {
            defaults,
            fetcher: Box::new(fetcher),
            env: Box::new(|key| std::env::var(key).ok()),
            subid: SubIdFiles::default(),
        })
    }

    /// Replace the remote context fetcher.
    pub fn with_fetcher(mut self, fetcher: impl ContextFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Replace the environment lookup used for build args and secrets.
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    pub fn with_subid_files(mut self, files: SubIdFiles) -> Self {
        self.subid = files;
        self
    }

    pub fn defaults(&self) -> &BuildDefaults {
        &self.defaults
    }

    /// Resolve one build invocation.
    ///
    /// Fails on the first error. Whatever temporary paths were created up to
    /// that point are already in `cleanup`.
    pub async fn resolve(
        &self,
        positional: &[String],
        inputs: &BuildInputs,
        cleanup: &mut CleanupList,
    ) -> Result<ResolvedBuild> {
        let bud = &inputs.bud;
        let layer = &inputs.layer;
        let defaults = &self.defaults;
        let env = |key: &str| (self.env)(key);

        // Pure validation
        let (output, additional_tags) =
            precedence::split_tags(&bud.tag, bud.manifest.as_deref())?;
        let auth_file = bud.authfile.clone().or_else(|| defaults.auth_file.clone());
        parse::auth::check_auth_file(auth_file.as_deref())?;
        precedence::check_logsplit(bud)?;
        precedence::check_pull_flags(bud)?;
        precedence::check_rm_flags(layer, bud)?;

        let temp_root = defaults.temp_root();
        let auth_file = auth_file
            .map(|path| parse::auth::mirror_descriptor(&path, &temp_root, cleanup))
            .transpose()?;

        let cwd = std::env::current_dir()
            .map_err(|e| BuildError::acquisition("getting current working directory", e))?;
        let pull_policy = precedence::pull_policy(bud)?;
        let build_args = args::build_args(&bud.build_arg, env);
        let additional_build_contexts = args::build_contexts(&bud.build_context, &cwd)?;
        let mut containerfiles = containerfile::containerfiles(&bud.file);
        let output_format =
            parse::isolation::image_format(bud.format.as_deref(), &defaults.format)?;
        let layers = layer.layers.unwrap_or(defaults.layers);

        // Context
        let mut context_dir =
            context::acquire(positional, self.fetcher.as_ref(), &temp_root, cleanup).await?;
        if containerfiles.is_empty() {
            let found = containerfile::discover(&context_dir)?;
            if let Some(parent) = found.parent() {
                context_dir = parent.to_path_buf();
            }
            containerfiles.push(found.to_string_lossy().into_owned());
        }
        let context_directory = containerfile::resolve_context_dir(&context_dir)?;

        // Streams
        let build_output = bud
            .output
            .as_deref()
            .map(parse::output::build_output)
            .transpose()?;
        let mut streams = BuildStreams {
            stdin: bud.stdin,
            ..Default::default()
        };
        if let Some(ref log_file) = bud.logfile {
            streams = streams.redirect_to(log_file);
        }
        let quiet = bud.quiet || build_output.as_ref().is_some_and(BuildOutput::is_stdout);
        if quiet {
            streams = streams.quiet();
        }

        // Sub-configurations
        let platforms = parse::platform::platforms(bud)?;
        let system_context = parse::system::system_context(bud, auth_file, &platforms)
            .map_err(|e| BuildError::delegated("building system context", e))?;
        let isolation = parse::isolation::isolation(
            inputs.from_and_bud.isolation.as_deref(),
            defaults.isolation.as_deref(),
        )?;
        let runtime_args = bud.runtime_flag.iter().map(|f| format!("--{f}")).collect();
        let common_build_opts =
            parse::common::common_build_options(&inputs.from_and_bud, env, &cwd)?;

        if let Some(ref cache_from) = bud.cache_from {
            tracing::debug!(value = %cache_from, "Ignoring --cache-from");
        }
        if bud.compress {
            tracing::debug!("Ignoring --compress");
        }
        if bud.disable_content_trust {
            tracing::debug!("Ignoring --disable-content-trust");
        }

        let compression = if bud.disable_compression.unwrap_or(true) {
            Compression::Uncompressed
        } else {
            Compression::Gzip
        };

        let (mut namespace_options, configure_network) =
            parse::namespace::namespace_options(&inputs.namespace)?;
        let (userns, id_mapping_options) =
            parse::idmap::id_mapping_options(&inputs.userns, &self.subid)?;
        namespace_options.add_or_replace([userns]);

        let oci_decrypt_config = crypto::decrypt_config(&bud.decryption_key)?;
        let (oci_encrypt_config, oci_encrypt_layers) =
            crypto::encrypt_config(&bud.encryption_key, &bud.encrypt_layer)?;

        let excludes = match bud.ignorefile {
            Some(ref path) => parse::ignore::read_ignore_file(path)?,
            None => Vec::new(),
        };

        let timestamp = bud
            .timestamp
            .map(|secs| {
                chrono::Utc
                    .timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| BuildError::malformed("timestamp out of range", secs.to_string()))
            })
            .transpose()?;

        let pull_push_retry_delay = match bud.retry_delay.as_deref() {
            Some(value) => parse_duration(value)?,
            None => Duration::from_secs(defaults.retry_delay_secs),
        };

        let options = BuildOptions {
            context_directory,
            pull_policy,
            output,
            additional_tags,
            manifest: bud.manifest.clone(),
            args: build_args,
            additional_build_contexts,
            output_format,
            layers,
            no_cache: bud.no_cache.unwrap_or(false),
            remove_intermediate_ctrs: bud.rm.unwrap_or(true),
            force_rm_intermediate_ctrs: layer.force_rm.unwrap_or(false),
            compression,
            isolation,
            runtime: bud
                .runtime
                .clone()
                .unwrap_or_else(|| defaults.runtime.clone()),
            runtime_args,
            system_context,
            common_build_opts,
            namespace_options,
            configure_network,
            id_mapping_options,
            platforms,
            all_platforms: bud.all_platforms,
            oci_decrypt_config,
            oci_encrypt_config,
            oci_encrypt_layers,
            streams,
            quiet,
            timestamp,
            max_pull_push_retries: bud.retry.unwrap_or(defaults.retry),
            pull_push_retry_delay,
            excludes,
            ignore_file: bud.ignorefile.clone(),
            build_output,
            labels: bud.label.clone(),
            annotations: bud.annotation.clone(),
            add_capabilities: inputs.from_and_bud.cap_add.clone(),
            drop_capabilities: inputs.from_and_bud.cap_drop.clone(),
            devices: inputs.from_and_bud.device.clone(),
            iid_file: bud.iidfile.clone(),
            sign_by: bud.sign_by.clone(),
            signature_policy_path: bud.signature_policy.clone(),
            squash: bud.squash,
            target: bud.target.clone(),
            from: bud.from.clone(),
            transient_mounts: inputs.from_and_bud.volume.clone(),
            jobs: bud.jobs.unwrap_or(defaults.jobs),
            log_file: bud.logfile.clone(),
            log_split_by_platform: bud.logsplit.unwrap_or(false),
            log_rusage: bud.log_rusage,
            rusage_log_file: bud.rusage_logfile.clone(),
            cni_config_dir: inputs.from_and_bud.cni_config_dir.clone(),
            cni_plugin_path: inputs.from_and_bud.cni_plugin_path.clone(),
            blob_directory: inputs.from_and_bud.blob_cache.clone(),
            cpp_flags: bud.cpp_flag.clone(),
            envs: bud.env.clone(),
            unset_envs: bud.unsetenv.clone(),
            os_features: bud.os_feature.clone(),
            os_version: bud.os_version.clone(),
        };

        tracing::debug!(
            context = %options.context_directory.display(),
            containerfiles = ?containerfiles,
            pull_policy = %options.pull_policy,
            "Resolved build configuration"
        );

        Ok(ResolvedBuild {
            options,
            containerfiles,
        })
    }
}

/// Parse a duration such as `2s`, `500ms` or `1m30s`; a bare number is seconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let s = value.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| {
        BuildError::malformed(
            format!("unable to parse value provided as --retry-delay: {e}"),
            value,
        )
    })
}
