/// Error types for script operations.
///
/// Covers chunk decoding, template extraction, builder arguments, and
/// address validation.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A push opcode claims more bytes than the script holds.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds the largest OP_PUSHDATA4 payload.
    #[error("data too big")]
    DataTooBig,

    /// Script is not of the template the caller asked about.
    #[error("script is not {0}")]
    TemplateMismatch(&'static str),

    #[error("invalid multisig threshold {threshold} for {keys} keys")]
    InvalidThreshold { threshold: usize, keys: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid address length for '{0}'")]
    InvalidAddressLength(String),

    /// Address version byte is not a known P2PKH/P2SH prefix.
    #[error("address not supported {0}")]
    UnsupportedAddress(String),

    #[error("checksum failed")]
    EncodingChecksumFailed,

    #[error("primitives error: {0}")]
    Primitives(#[from] txkit_primitives::PrimitivesError),
}
