//! Tunables the original left hardcoded or delegated to the GUI's settings
//! dialog. Parsing an actual config file is out of scope; this is a plain
//! struct a caller fills in from whatever source it likes.

/// RSA key size used by [`qc_crypto::AsymmetricKeypair::generate`] when a
/// caller asks this crate to mint a fresh keypair.
///
/// Upgraded from the original's 1024-bit default; 1024-bit RSA is considered
/// weak by current standards.
pub const DEFAULT_RSA_KEY_BITS: usize = 2048;

/// Session-wide tunables.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Key size to use when generating a fresh RSA keypair.
    pub rsa_key_bits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { rsa_key_bits: DEFAULT_RSA_KEY_BITS }
    }
}
