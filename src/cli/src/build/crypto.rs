//! Translation of key specifiers into layer crypto configuration.

use a3s_build_core::crypto::{combine_crypto_configs, create_crypto_config};
use a3s_build_core::error::{BuildError, Result};
use a3s_build_core::{DecryptConfig, EncryptConfig};

/// Decryption configuration for `--decryption-key` values.
///
/// No keys yields the empty configuration.
pub fn decrypt_config(keys: &[String]) -> Result<DecryptConfig> {
    if keys.is_empty() {
        return Ok(DecryptConfig::default());
    }
    let config = create_crypto_config(&[], keys)
        .map_err(|e| BuildError::delegated("invalid decryption keys", e))?;
    let combined = combine_crypto_configs(&[config]);
    Ok(combined.decrypt_config.unwrap_or_default())
}

/// Encryption configuration and layer indices for `--encryption-key` values.
///
/// No keys yields `(None, None)`; `layers` is ignored in that case.
pub fn encrypt_config(
    keys: &[String],
    layers: &[i32],
) -> Result<(Option<EncryptConfig>, Option<Vec<i32>>)> {
    if keys.is_empty() {
        return Ok((None, None));
    }
    let config = create_crypto_config(keys, &[])
        .map_err(|e| BuildError::delegated("invalid encryption keys", e))?;
    let combined = combine_crypto_configs(&[config]);
    Ok((combined.encrypt_config, Some(layers.to_vec())))
}
