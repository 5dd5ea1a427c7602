use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::str::FromStr;

use oms::dispatch::{parse_field, MenuChoice, MENU};
use oms::{Command, Error, Result};

const INSTRUMENT_PROMPT: &str = "Enter instrument_name (BTC-PERPETUAL, ETH-PERPETUAL): ";

/// Reads whitespace-separated answers from the operator, one prompt at a
/// time.
pub struct Prompter<R, W>
where
    R: BufRead,
    W: Write,
{
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R, W> Prompter<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    /// Next token, or `None` once input is exhausted.
    fn next_token(&mut self) -> Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }

    fn ask<T>(&mut self, prompt: &str, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
    {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        match self.next_token()? {
            Some(token) => parse_field(name, &token).map(Some),
            None => Ok(None),
        }
    }

    pub fn read_choice(&mut self) -> Result<Option<MenuChoice>> {
        writeln!(self.output, "{MENU}")?;
        self.output.flush()?;

        match self.next_token()? {
            Some(token) => token.parse().map(Some),
            None => Ok(None),
        }
    }

    /// Asks for the fields `choice` needs. `None` means input ended midway.
    pub fn read_command(&mut self, choice: MenuChoice) -> Result<Option<Command>> {
        let command = match choice {
            MenuChoice::PlaceOrder => {
                let Some(instrument) = self.ask::<String>(INSTRUMENT_PROMPT, "instrument_name")? else {
                    return Ok(None);
                };
                let Some(price) = self.ask::<f64>("Enter price: ", "price")? else {
                    return Ok(None);
                };
                let Some(amount) = self.ask::<f64>("Enter amount: ", "amount")? else {
                    return Ok(None);
                };
                Command::PlaceOrder {
                    instrument,
                    price,
                    amount,
                }
            }
            MenuChoice::CancelOrder => {
                let Some(order_id) = self.ask::<String>("Enter order_id: ", "order_id")? else {
                    return Ok(None);
                };
                Command::CancelOrder { order_id }
            }
            MenuChoice::ModifyOrder => {
                let Some(order_id) = self.ask::<String>("Enter order_id: ", "order_id")? else {
                    return Ok(None);
                };
                let Some(price) = self.ask::<f64>("Enter price: ", "price")? else {
                    return Ok(None);
                };
                let Some(amount) = self.ask::<f64>("Enter amount: ", "amount")? else {
                    return Ok(None);
                };
                Command::ModifyOrder {
                    order_id,
                    price,
                    amount,
                }
            }
            MenuChoice::GetOrderBook => {
                let Some(instrument) = self.ask::<String>(INSTRUMENT_PROMPT, "instrument_name")? else {
                    return Ok(None);
                };
                let Some(depth) = self.ask::<u32>("Enter depth: ", "depth")? else {
                    return Ok(None);
                };
                Command::GetOrderBook { instrument, depth }
            }
            MenuChoice::GetPositions => {
                let Some(instrument) = self.ask::<String>(INSTRUMENT_PROMPT, "instrument_name")? else {
                    return Ok(None);
                };
                Command::GetPositions { instrument }
            }
            MenuChoice::GetOpenOrders => Command::GetOpenOrders,
            MenuChoice::Exit => {
                return Err(Error::Config("exit does not build a command".into()));
            }
        };
        Ok(Some(command))
    }

    /// Shows a rejected input to the operator and drops the rest of the line
    /// it came from.
    pub fn report(&mut self, err: &Error) -> Result<()> {
        self.pending.clear();
        writeln!(self.output, "{err}")?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.output
    }
}
