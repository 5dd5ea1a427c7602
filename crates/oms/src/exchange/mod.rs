pub mod deribit;
pub mod rpc;
pub mod transport;

pub use deribit::DeribitClient;
pub use transport::{HttpTransport, RawResponse, Transport};

use crate::dispatch::Command;
use crate::Result;

/// The external operation behind every operator command.
///
/// `execute` blocks for the whole round trip and returns the lines to show
/// the operator.
pub trait Exchange: Send + Sync + 'static {
    fn execute(&self, command: &Command) -> Result<Vec<String>>;
}
