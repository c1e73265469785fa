//! Raw build inputs, grouped the way the flags are grouped on the command line.
//!
//! Every flag whose "explicitly set" state changes resolution is an `Option`:
//! `None` means the user did not pass it. Boolean presence flags accept
//! `--flag`, `--flag=true` and `--flag=false`.

use std::path::PathBuf;

use clap::Args;

/// Layer caching flags.
#[derive(Args, Debug, Default, Clone)]
pub struct LayerInputs {
    /// Always remove intermediate containers after a build, even on failure
    #[arg(long = "force-rm", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub force_rm: Option<bool>,

    /// Cache intermediate images during the build process
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub layers: Option<bool>,
}

/// Flags specific to `build`.
#[derive(Args, Debug, Default, Clone)]
pub struct BudInputs {
    /// Build images for all platforms the base image supports
    #[arg(long = "all-platforms")]
    pub all_platforms: bool,

    /// Add an image annotation (KEY=VALUE)
    #[arg(long)]
    pub annotation: Vec<String>,

    /// Path of the registry authentication file
    #[arg(long)]
    pub authfile: Option<PathBuf>,

    /// Build-time variable (KEY=VALUE, or KEY to take it from the environment)
    #[arg(long = "build-arg", value_name = "KEY[=VALUE]")]
    pub build_arg: Vec<String>,

    /// Additional named build context (NAME=VALUE)
    #[arg(long = "build-context", value_name = "NAME=VALUE")]
    pub build_context: Vec<String>,

    /// Images to consider as cache sources (ignored)
    #[arg(long = "cache-from")]
    pub cache_from: Option<String>,

    /// Directory of certificates used to access the registry
    #[arg(long = "cert-dir")]
    pub cert_dir: Option<PathBuf>,

    /// Compress the build context (ignored)
    #[arg(long)]
    pub compress: bool,

    /// Registry credentials (USERNAME:PASSWORD)
    #[arg(long)]
    pub creds: Option<String>,

    /// Flag passed to the C preprocessor for *.in build files
    #[arg(long = "cpp-flag")]
    pub cpp_flag: Vec<String>,

    /// Don't compress layers
    #[arg(short = 'D', long = "disable-compression", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub disable_compression: Option<bool>,

    /// Content trust (ignored)
    #[arg(long = "disable-content-trust")]
    pub disable_content_trust: bool,

    /// Key needed to decrypt base-image layers (PATH[:PASSWORD])
    #[arg(long = "decryption-key")]
    pub decryption_key: Vec<String>,

    /// Recipient the output layers are encrypted for (PROTOCOL:VALUE)
    #[arg(long = "encryption-key")]
    pub encryption_key: Vec<String>,

    /// Layer index to encrypt (negative counts from the top)
    #[arg(long = "encrypt-layer", allow_negative_numbers = true)]
    pub encrypt_layer: Vec<i32>,

    /// Environment variable for the image (KEY=VALUE)
    #[arg(long)]
    pub env: Vec<String>,

    /// Build description file ("-" reads from stdin)
    #[arg(short = 'f', long = "file")]
    pub file: Vec<String>,

    /// Image format: oci or docker
    #[arg(long)]
    pub format: Option<String>,

    /// Replace the first stage's base image
    #[arg(long)]
    pub from: Option<String>,

    /// Write the image ID to this file
    #[arg(long)]
    pub iidfile: Option<PathBuf>,

    /// Alternate ignore file
    #[arg(long = "ignorefile")]
    pub ignorefile: Option<PathBuf>,

    /// Number of stages to build in parallel
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Image label (KEY=VALUE)
    #[arg(long)]
    pub label: Vec<String>,

    /// Log build output to this file
    #[arg(long)]
    pub logfile: Option<PathBuf>,

    /// Split the log file per platform (requires --logfile)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub logsplit: Option<bool>,

    /// Log resource usage of each step
    #[arg(long = "log-rusage")]
    pub log_rusage: bool,

    /// Add the image to this manifest list
    #[arg(long)]
    pub manifest: Option<String>,

    /// Do not use cached images
    #[arg(long = "no-cache", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_cache: Option<bool>,

    /// Required OS feature for the image
    #[arg(long = "os-feature")]
    pub os_feature: Vec<String>,

    /// Required OS version for the image
    #[arg(long = "os-version")]
    pub os_version: Option<String>,

    /// Export target (PATH, "-", or type=local|tar,dest=PATH)
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Pull policy: true, false, always, never, missing, newer
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pull: Option<String>,

    /// Always pull the image
    #[arg(long = "pull-always", num_args = 0..=1, require_equals = true, default_missing_value = "true", hide = true)]
    pub pull_always: Option<bool>,

    /// Never pull the image
    #[arg(long = "pull-never", num_args = 0..=1, require_equals = true, default_missing_value = "true", hide = true)]
    pub pull_never: Option<bool>,

    /// Suppress the build progress report
    #[arg(short, long)]
    pub quiet: bool,

    /// Pull/push retry attempts
    #[arg(long)]
    pub retry: Option<u32>,

    /// Delay between retries (e.g. 2s, 500ms)
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<String>,

    /// Path to registries.conf
    #[arg(long = "registries-conf")]
    pub registries_conf: Option<PathBuf>,

    /// Remove intermediate containers after a successful build
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub rm: Option<bool>,

    /// OCI runtime binary
    #[arg(long)]
    pub runtime: Option<String>,

    /// Flag passed to the OCI runtime (without leading dashes)
    #[arg(long = "runtime-flag")]
    pub runtime_flag: Vec<String>,

    /// Write resource usage to this file
    #[arg(long = "rusage-logfile")]
    pub rusage_logfile: Option<PathBuf>,

    /// Sign the image with this GPG key
    #[arg(long = "sign-by")]
    pub sign_by: Option<String>,

    /// Signature policy file
    #[arg(long = "signature-policy")]
    pub signature_policy: Option<PathBuf>,

    /// Squash all new layers into one
    #[arg(long)]
    pub squash: bool,

    /// Pass stdin to RUN steps
    #[arg(long)]
    pub stdin: bool,

    /// Image name (first is the output, others are extra tags)
    #[arg(short = 't', long)]
    pub tag: Vec<String>,

    /// Final stage to build
    #[arg(long)]
    pub target: Option<String>,

    /// Creation timestamp, seconds since the epoch
    #[arg(long, allow_negative_numbers = true)]
    pub timestamp: Option<i64>,

    /// Require HTTPS and verify certificates
    #[arg(long = "tls-verify", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub tls_verify: Option<bool>,

    /// Unset an environment variable in the image
    #[arg(long)]
    pub unsetenv: Vec<String>,

    /// Target platform(s), OS/ARCH[/VARIANT], comma separated
    #[arg(long)]
    pub platform: Vec<String>,

    /// Override the target OS
    #[arg(long)]
    pub os: Option<String>,

    /// Override the target architecture
    #[arg(long)]
    pub arch: Option<String>,

    /// Override the target architecture variant
    #[arg(long)]
    pub variant: Option<String>,
}

/// Container settings shared with `from`.
#[derive(Args, Debug, Default, Clone)]
pub struct FromAndBudInputs {
    /// Custom host-to-IP mapping (HOST:IP)
    #[arg(long = "add-host")]
    pub add_host: Vec<String>,

    /// Directory for cached blobs
    #[arg(long = "blob-cache", hide = true)]
    pub blob_cache: Option<PathBuf>,

    /// Add a capability to RUN steps
    #[arg(long = "cap-add")]
    pub cap_add: Vec<String>,

    /// Drop a capability from RUN steps
    #[arg(long = "cap-drop")]
    pub cap_drop: Vec<String>,

    /// Parent cgroup for RUN containers
    #[arg(long = "cgroup-parent")]
    pub cgroup_parent: Option<String>,

    /// Directory of CNI configuration files
    #[arg(long = "cni-config-dir")]
    pub cni_config_dir: Option<PathBuf>,

    /// Path of CNI plugins
    #[arg(long = "cni-plugin-path")]
    pub cni_plugin_path: Option<String>,

    /// CPU CFS period (microseconds)
    #[arg(long = "cpu-period")]
    pub cpu_period: Option<u64>,

    /// CPU CFS quota (microseconds)
    #[arg(long = "cpu-quota", allow_negative_numbers = true)]
    pub cpu_quota: Option<i64>,

    /// CPU shares (relative weight)
    #[arg(short = 'c', long = "cpu-shares")]
    pub cpu_shares: Option<u64>,

    /// CPUs in which to allow execution (0-3, 0,1)
    #[arg(long = "cpuset-cpus")]
    pub cpuset_cpus: Option<String>,

    /// Memory nodes in which to allow execution
    #[arg(long = "cpuset-mems")]
    pub cpuset_mems: Option<String>,

    /// Host device to expose to RUN steps
    #[arg(long)]
    pub device: Vec<String>,

    /// DNS server ("none" disables /etc/resolv.conf)
    #[arg(long)]
    pub dns: Vec<String>,

    /// DNS option
    #[arg(long = "dns-option")]
    pub dns_option: Vec<String>,

    /// DNS search domain
    #[arg(long = "dns-search")]
    pub dns_search: Vec<String>,

    /// Pass through proxy environment variables
    #[arg(long = "http-proxy", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub http_proxy: Option<bool>,

    /// Add default identity label
    #[arg(long = "identity-label", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub identity_label: Option<bool>,

    /// Isolation type: oci, rootless or chroot
    #[arg(long)]
    pub isolation: Option<String>,

    /// Memory limit (e.g. 512m, 2g)
    #[arg(short = 'm', long)]
    pub memory: Option<String>,

    /// Memory plus swap limit, -1 for unlimited
    #[arg(long = "memory-swap", allow_hyphen_values = true)]
    pub memory_swap: Option<String>,

    /// Secret exposed to RUN steps (id=ID,src=PATH[,type=file|env])
    #[arg(long)]
    pub secret: Vec<String>,

    /// Security option (label=..., seccomp=..., apparmor=..., no-new-privileges)
    #[arg(long = "security-opt")]
    pub security_opt: Vec<String>,

    /// Size of /dev/shm
    #[arg(long = "shm-size")]
    pub shm_size: Option<String>,

    /// SSH agent socket or keys (default|ID[=SOCKET|KEY])
    #[arg(long)]
    pub ssh: Vec<String>,

    /// Resource limit (NAME=SOFT[:HARD])
    #[arg(long)]
    pub ulimit: Vec<String>,

    /// Bind mount for RUN steps (SRC:DST[:OPTS])
    #[arg(short = 'v', long)]
    pub volume: Vec<String>,
}

/// User namespace flags.
#[derive(Args, Debug, Default, Clone)]
pub struct UserNsInputs {
    /// User namespace: host, private/container, or a namespace path
    #[arg(long)]
    pub userns: Option<String>,

    /// UID mapping (CONTAINER:HOST:SIZE[,...])
    #[arg(long = "userns-uid-map")]
    pub userns_uid_map: Vec<String>,

    /// GID mapping (CONTAINER:HOST:SIZE[,...])
    #[arg(long = "userns-gid-map")]
    pub userns_gid_map: Vec<String>,

    /// Take the UID mapping from /etc/subuid entries for this user
    #[arg(long = "userns-uid-map-user")]
    pub userns_uid_map_user: Option<String>,

    /// Take the GID mapping from /etc/subgid entries for this group
    #[arg(long = "userns-gid-map-group")]
    pub userns_gid_map_group: Option<String>,
}

/// Namespace flags.
#[derive(Args, Debug, Default, Clone)]
pub struct NamespaceInputs {
    /// Cgroup namespace: host or private
    #[arg(long)]
    pub cgroupns: Option<String>,

    /// IPC namespace: host, private, or a path
    #[arg(long)]
    pub ipc: Option<String>,

    /// Network namespace: host, private, none, or a path
    #[arg(long, alias = "net")]
    pub network: Option<String>,

    /// PID namespace: host, private, or a path
    #[arg(long)]
    pub pid: Option<String>,

    /// UTS namespace: host, private, or a path
    #[arg(long)]
    pub uts: Option<String>,
}

/// All raw inputs of one build invocation.
#[derive(Args, Debug, Default, Clone)]
pub struct BuildInputs {
    #[command(flatten)]
    pub layer: LayerInputs,

    #[command(flatten)]
    pub bud: BudInputs,

    #[command(flatten)]
    pub from_and_bud: FromAndBudInputs,

    #[command(flatten)]
    pub userns: UserNsInputs,

    #[command(flatten)]
    pub namespace: NamespaceInputs,
}
