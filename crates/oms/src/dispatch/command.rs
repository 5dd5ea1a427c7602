use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Operator menu, in the order the codes are shown.
pub const MENU: &str = "To place order:1 \nTo cancel order:2 \nTo modify order:3 \nTo get orderbook:4 \nTo get current positions:5 \nGet Open Orders:6 \nTo exit:7";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    PlaceOrder,
    CancelOrder,
    ModifyOrder,
    GetOrderBook,
    GetPositions,
    GetOpenOrders,
    Exit,
}

impl MenuChoice {
    pub fn from_code(code: i64) -> Result<Self> {
        let choice = match code {
            1 => Self::PlaceOrder,
            2 => Self::CancelOrder,
            3 => Self::ModifyOrder,
            4 => Self::GetOrderBook,
            5 => Self::GetPositions,
            6 => Self::GetOpenOrders,
            7 => Self::Exit,
            _ => return Err(Error::Config(format!("unknown command code {code}"))),
        };
        Ok(choice)
    }
}

impl FromStr for MenuChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::Config(format!("`{}` is not a command code", s.trim())))?;
        Self::from_code(code)
    }
}

/// A fully specified operator request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlaceOrder {
        instrument: String,
        price: f64,
        amount: f64,
    },
    CancelOrder {
        order_id: String,
    },
    ModifyOrder {
        order_id: String,
        price: f64,
        amount: f64,
    },
    GetOrderBook {
        instrument: String,
        depth: u32,
    },
    GetPositions {
        instrument: String,
    },
    GetOpenOrders,
}

impl Command {
    /// Name under which the command's latency is recorded.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Command::PlaceOrder { .. } => "place_order",
            Command::CancelOrder { .. } => "cancel_order",
            Command::ModifyOrder { .. } => "modify_order",
            Command::GetOrderBook { .. } => "get_orderbook",
            Command::GetPositions { .. } => "get_current_positions",
            Command::GetOpenOrders => "get_open_orders",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Command::PlaceOrder {
                instrument,
                price,
                amount,
            } => {
                non_empty("instrument_name", instrument)?;
                positive("price", *price)?;
                positive("amount", *amount)
            }
            Command::CancelOrder { order_id } => non_empty("order_id", order_id),
            Command::ModifyOrder {
                order_id,
                price,
                amount,
            } => {
                non_empty("order_id", order_id)?;
                positive("price", *price)?;
                positive("amount", *amount)
            }
            Command::GetOrderBook { instrument, depth } => {
                non_empty("instrument_name", instrument)?;
                if *depth == 0 {
                    return Err(Error::Config("depth must be at least 1".into()));
                }
                Ok(())
            }
            Command::GetPositions { instrument } => non_empty("instrument_name", instrument),
            Command::GetOpenOrders => Ok(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PlaceOrder {
                instrument,
                price,
                amount,
            } => write!(f, "place_order {instrument} price={price} amount={amount}"),
            Command::CancelOrder { order_id } => write!(f, "cancel_order {order_id}"),
            Command::ModifyOrder {
                order_id,
                price,
                amount,
            } => write!(f, "modify_order {order_id} price={price} amount={amount}"),
            Command::GetOrderBook { instrument, depth } => {
                write!(f, "get_orderbook {instrument} depth={depth}")
            }
            Command::GetPositions { instrument } => write!(f, "get_current_positions {instrument}"),
            Command::GetOpenOrders => write!(f, "get_open_orders"),
        }
    }
}

/// Parses one operator-typed field, naming it in the error.
pub fn parse_field<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
{
    let raw = raw.trim();
    raw.parse::<T>()
        .map_err(|_| Error::Config(format!("invalid {name}: `{raw}`")))
}

fn non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} must not be empty")));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!("{name} must be a positive number")));
    }
    Ok(())
}
