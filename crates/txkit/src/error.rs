use crate::config::{DUST_AMOUNT, NLOCKTIME_BLOCKHEIGHT_LIMIT};

/// Error types for transaction operations.
///
/// Each variant is a distinct caller-facing condition. Policy failures found
/// by checked serialization are wrapped in `SerializationCheck`.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A constructor or mutator argument is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("output satoshis are invalid")]
    InvalidSatoshis,

    /// Outputs spend more than the inputs provide.
    #[error("output satoshis ({outputs}) exceed input satoshis ({inputs})")]
    InvalidOutputAmountSum { inputs: u128, outputs: u128 },

    /// An explicit fee was set and the actual unspent value differs from it.
    #[error("unspent value is {unspent} but the specified fee is {fee}")]
    FeeDifferent { fee: u64, unspent: i128 },

    #[error("fee is too large: expected less than {max} but got {unspent}")]
    FeeTooLarge { unspent: i128, max: u64 },

    #[error("fee is too small: expected more than {min} but got {unspent}")]
    FeeTooSmall { unspent: i128, min: u64 },

    /// Unspent value exceeds the fee bound and no change script would absorb it.
    #[error("fee is too large ({unspent} > {max}) and no change address was provided")]
    ChangeAddressMissing { unspent: i128, max: u64 },

    #[error("dust amount detected in output {index}: {satoshis} < {}", DUST_AMOUNT)]
    DustOutputs { index: usize, satoshis: u64 },

    #[error("some inputs have not been fully signed")]
    MissingSignatures,

    /// The input carries no spent output and none was supplied.
    #[error("need more information: {0}")]
    NeedMoreInfo(String),

    #[error(
        "unable to verify signature for input {index}: unrecognized script kind, or not enough \
         information to execute script (usually a transaction parsed from bytes)"
    )]
    UnableToVerifySignature { index: usize },

    #[error("unsupported script: {0}")]
    UnsupportedScript(String),

    #[error("invalid sorting: {0}")]
    InvalidSorting(String),

    #[error("index {index} out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("lock time {0} is too early, must be at least {}", NLOCKTIME_BLOCKHEIGHT_LIMIT)]
    LockTimeTooEarly(i64),

    #[error("block height {0} is too high, must be below {}", NLOCKTIME_BLOCKHEIGHT_LIMIT)]
    BlockHeightTooHigh(i64),

    #[error("lock time {0} is out of range")]
    LockTimeOutOfRange(i64),

    #[error("no previous output information for input {index}")]
    MissingPreviousOutput { index: usize },

    /// An internal consistency requirement does not hold.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Wire or JSON decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A policy check failed while serializing.
    #[error("{0}; use SerializeOptions to skip this check, or unchecked_serialize()")]
    SerializationCheck(Box<TransactionError>),

    #[error("script error: {0}")]
    Script(#[from] txkit_script::ScriptError),

    #[error("primitives error: {0}")]
    Primitives(#[from] txkit_primitives::PrimitivesError),
}
