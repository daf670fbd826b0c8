//! Data acquisition: upstream sources, retrying acquisition, normalization.

pub mod acquire;
pub mod normalize;
pub mod provider;
pub mod scripted;
pub mod synthetic;
pub mod yahoo;

pub use acquire::{
    AcquisitionController, AcquisitionError, AttemptFailure, NoSleep, RetryPolicy, Sleeper,
    ThreadSleeper,
};
pub use normalize::{missing_required_columns, normalize, RequiredColumn};
pub use provider::{RawField, RawTable, RawTimestamp, RawValue, UpstreamError, UpstreamSource};
pub use scripted::{ScriptedOutcome, ScriptedSource};
pub use synthetic::SyntheticSource;
pub use yahoo::YahooSource;
