use bulkload_core::TimestampPolicy;
use clap::ValueEnum;

/// CLI surface of the core timestamp recovery policy
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TimestampPolicyArg {
    /// Substitute the current date at midnight and continue (default)
    SubstituteNow,
    /// Skip the row and continue
    RejectRow,
    /// Abort the whole run
    FailRun,
}

impl From<TimestampPolicyArg> for TimestampPolicy {
    fn from(arg: TimestampPolicyArg) -> Self {
        match arg {
            TimestampPolicyArg::SubstituteNow => TimestampPolicy::SubstituteNow,
            TimestampPolicyArg::RejectRow => TimestampPolicy::RejectRow,
            TimestampPolicyArg::FailRun => TimestampPolicy::FailRun,
        }
    }
}

impl std::fmt::Display for TimestampPolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampPolicyArg::SubstituteNow => write!(f, "substitute-now"),
            TimestampPolicyArg::RejectRow => write!(f, "reject-row"),
            TimestampPolicyArg::FailRun => write!(f, "fail-run"),
        }
    }
}
