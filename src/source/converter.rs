//! Frame payload decoding
//!
//! Each stream category has a converter turning one frame's MessagePack
//! payload into a local timestamp plus a typed payload. Anything that fails
//! to decode, carries trailing bytes or holds impossible values is rejected.

use std::io::Cursor;

use serde::de::DeserializeOwned;

use crate::config::MdCategory;
use crate::error::{ReplayError, Result};
use crate::parser::{DepthMessage, Level, MdPayload, SingleTradeMessage};

/// Decodes one frame payload
#[cfg_attr(test, mockall::automock)]
pub trait Converter {
    /// Local receive time in nanoseconds and the decoded payload
    fn load(&self, data: &[u8]) -> Result<(u64, MdPayload)>;
}

/// Converter for `single_trades` streams
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTradeConverter;

impl Converter for SingleTradeConverter {
    fn load(&self, data: &[u8]) -> Result<(u64, MdPayload)> {
        let msg: SingleTradeMessage = decode_exact(data)?;
        let trade = msg.message;

        check_level("trade", trade.price, trade.size)?;
        Ok((local_time_ns(msg.local_time_us)?, MdPayload::Trade(trade)))
    }
}

/// Converter for `depth` streams
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthMessageConverter;

impl Converter for DepthMessageConverter {
    fn load(&self, data: &[u8]) -> Result<(u64, MdPayload)> {
        let msg: DepthMessage = decode_exact(data)?;

        for Level { price, size } in msg.message.bids.iter().chain(&msg.message.asks) {
            check_level("depth level", *price, *size)?;
        }
        Ok((local_time_ns(msg.local_time_us)?, MdPayload::Depth(msg.message)))
    }
}

/// Converter matching a stream category
pub fn converter_for(category: MdCategory) -> Box<dyn Converter> {
    match category {
        MdCategory::Trade => Box::new(SingleTradeConverter),
        MdCategory::Depth => Box::new(DepthMessageConverter),
    }
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn load(&self, data: &[u8]) -> Result<(u64, MdPayload)> {
        (**self).load(data)
    }
}

fn decode_exact<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let mut cursor = Cursor::new(data);
    let msg = rmp_serde::decode::from_read(&mut cursor)?;

    let consumed = cursor.position() as usize;
    if consumed != data.len() {
        return Err(ReplayError::Verification(format!(
            "{} trailing bytes after message",
            data.len() - consumed
        )));
    }
    Ok(msg)
}

fn local_time_ns(local_time_us: i64) -> Result<u64> {
    u64::try_from(local_time_us)
        .ok()
        .and_then(|us| us.checked_mul(1000))
        .ok_or_else(|| {
            ReplayError::Verification(format!("Invalid local time {}us", local_time_us))
        })
}

fn check_level(what: &str, price: f64, size: f64) -> Result<()> {
    if !price.is_finite() || !size.is_finite() || size < 0.0 {
        return Err(ReplayError::Verification(format!(
            "Invalid {}: price {} size {}",
            what, price, size
        )));
    }
    Ok(())
}
