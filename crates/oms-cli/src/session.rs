use std::io::{BufRead, Write};

use oms::dispatch::MenuChoice;
use oms::exchange::Exchange;
use oms::{Dispatcher, Error};

use crate::prompt::Prompter;

/// Reads commands until the operator exits or input ends, then shuts the
/// pool down. Rejected input is shown to the operator and the loop goes on.
pub fn run<E, R, W>(dispatcher: &Dispatcher<E>, prompter: &mut Prompter<R, W>) -> anyhow::Result<()>
where
    E: Exchange,
    R: BufRead,
    W: Write,
{
    loop {
        let choice = match prompter.read_choice() {
            Ok(Some(MenuChoice::Exit)) | Ok(None) => break,
            Ok(Some(choice)) => choice,
            Err(err @ Error::Config(_)) => {
                prompter.report(&err)?;
                continue;
            }
            Err(err) => {
                dispatcher.shutdown();
                return Err(err.into());
            }
        };

        let command = match prompter.read_command(choice) {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(err @ Error::Config(_)) => {
                prompter.report(&err)?;
                continue;
            }
            Err(err) => {
                dispatcher.shutdown();
                return Err(err.into());
            }
        };

        match dispatcher.dispatch(command) {
            Ok(id) => tracing::debug!("Queued task {}", id),
            Err(err @ Error::Config(_)) => prompter.report(&err)?,
            Err(err) => {
                dispatcher.shutdown();
                return Err(err.into());
            }
        }
    }

    tracing::info!("Waiting for queued commands to finish");
    dispatcher.shutdown();
    Ok(())
}
