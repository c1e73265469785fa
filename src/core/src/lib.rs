//! A3S Build Core - typed build configuration model.
//!
//! The types here are what an image-build engine consumes once a build
//! invocation's raw flags have been resolved.

pub mod common;
pub mod config;
pub mod crypto;
pub mod error;
pub mod log;
pub mod namespace;
pub mod options;
pub mod reference;
pub mod system;

// Re-export commonly used types
pub use common::{CommonBuildOptions, SecretSource, Ulimit};
pub use config::BuildDefaults;
pub use crypto::{CryptoConfig, DecryptConfig, EncryptConfig};
pub use error::{BuildError, ErrorKind, Result};
pub use log::{BuildStreams, Sink};
pub use namespace::{IdMap, IdMappingOptions, NamespaceOption, NamespaceOptions, NetworkPolicy};
pub use options::{
    AdditionalBuildContext, BuildOptions, BuildOutput, Compression, ImageFormat, Isolation,
    PullPolicy,
};
pub use reference::ImageReference;
pub use system::{Platform, RegistryCredentials, SystemContext};

/// A3S Build version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
