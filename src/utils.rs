use crate::prelude::*;

use nom::number::complete::{le_i16, le_u16, le_u32};
use nom::IResult;
use std::time::Duration;

pub struct Utils;

impl Utils {
    pub fn u16ify(array: &[u8], offset: usize) -> u16 {
        match array.get(offset..offset + 2) {
            Some(b) => u16::from_le_bytes([b[0], b[1]]),
            None => 0,
        }
    }

    pub fn round(x: f64, decimals: u32) -> f64 {
        let y = 10i32.pow(decimals) as f64;
        (x * y).round() / y
    }

    pub fn hex(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // nom helpers for the register bank structs

    pub fn le_u16_div10(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_u16(input)?;
        Ok((input, num as f64 / 10.0))
    }

    pub fn le_u16_div100(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_u16(input)?;
        Ok((input, num as f64 / 100.0))
    }

    pub fn le_u16_div1000(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_u16(input)?;
        Ok((input, num as f64 / 1000.0))
    }

    pub fn le_i16_div10(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_i16(input)?;
        Ok((input, num as f64 / 10.0))
    }

    pub fn le_i16_div100(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_i16(input)?;
        Ok((input, num as f64 / 100.0))
    }

    pub fn le_u32_div10(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_u32(input)?;
        Ok((input, num as f64 / 10.0))
    }

    // values above 1000 encode a leading power factor as 2000 - pf
    pub fn le_u16_power_factor(input: &[u8]) -> IResult<&[u8], f64> {
        let (input, num) = le_u16(input)?;
        let pf = if num <= 1000 {
            num as f64 / 1000.0
        } else {
            2000u16.saturating_sub(num) as f64 / 1000.0
        };
        Ok((input, pf))
    }

    /// Parses `20`, `20s`, `500ms`, `2min`, `2m` or `1h`. A bare number is seconds.
    pub fn parse_duration(input: &str) -> Result<Duration> {
        let s = input.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        if number.is_empty() {
            bail!("invalid duration '{}'", input);
        }
        let n: u64 = number
            .parse()
            .map_err(|err| anyhow!("invalid duration '{}': {}", input, err))?;

        let secs = match unit.trim() {
            "" | "s" | "sec" => Some(n),
            "ms" => return Ok(Duration::from_millis(n)),
            "m" | "min" => n.checked_mul(60),
            "h" => n.checked_mul(3600),
            other => bail!("invalid duration '{}': unknown unit '{}'", input, other),
        };

        match secs {
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => bail!("invalid duration '{}': too large", input),
        }
    }
}
