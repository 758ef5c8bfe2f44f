use std::{
    error::Error,
    fmt::{self, Display},
};

/// Returned whenever the other half of a channel has been dropped, so no message
/// can ever be delivered or received through it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the channel's peer half has been closed")
    }
}

impl Error for ChannelClosed {}
