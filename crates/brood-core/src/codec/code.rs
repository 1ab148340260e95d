//! Self-delimiting text tokens.
//!
//! Every value is printed as a one-letter type prefix, the payload, and a
//! closing `|`. Reals are encoded by bit pattern so that a decode of an
//! encode is exact; the printed form is not meant to be pretty, it is meant
//! to survive a round trip through a text file.

use crate::Result;
use brood_error::brood_err;

pub fn encode_i32(value: i32) -> String {
    format!("i{}|", value)
}

pub fn encode_i64(value: i64) -> String {
    format!("l{}|", value)
}

pub fn encode_f32(value: f32) -> String {
    format!("f{}|", value.to_bits() as i32)
}

pub fn encode_f64(value: f64) -> String {
    format!("d{}|", value.to_bits() as i64)
}

pub fn encode_bool(value: bool) -> String {
    if value { "bT|".into() } else { "bF|".into() }
}

/// Sequential token reader over an encoded string.
pub struct Decoder<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a str) -> Self {
        Decoder { input, pos: 0 }
    }

    /// True when only whitespace remains.
    pub fn at_end(&self) -> bool {
        self.input[self.pos..].trim().is_empty()
    }

    fn token(&mut self, prefix: char) -> Result<&'a str> {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();

        let mut chars = trimmed.chars();
        match chars.next() {
            Some(c) if c == prefix => {}
            Some(c) => {
                return Err(brood_err!(Codec:
                    "expected '{}' token at position {}, found '{}'", prefix, self.pos, c));
            }
            None => {
                return Err(brood_err!(Codec:
                    "expected '{}' token at position {}, found end of input", prefix, self.pos));
            }
        }

        let body_start = self.pos + prefix.len_utf8();
        let Some(bar) = self.input[body_start..].find('|') else {
            return Err(brood_err!(Codec:
                "unterminated '{}' token at position {}", prefix, self.pos));
        };

        let body = &self.input[body_start..body_start + bar];
        self.pos = body_start + bar + 1;
        Ok(body)
    }

    pub fn decode_i32(&mut self) -> Result<i32> {
        let body = self.token('i')?;
        body.parse()
            .map_err(|_| brood_err!(Codec: "malformed integer token '{}'", body))
    }

    pub fn decode_i64(&mut self) -> Result<i64> {
        let body = self.token('l')?;
        body.parse()
            .map_err(|_| brood_err!(Codec: "malformed long token '{}'", body))
    }

    pub fn decode_f32(&mut self) -> Result<f32> {
        let body = self.token('f')?;
        let bits: i32 = body
            .parse()
            .map_err(|_| brood_err!(Codec: "malformed float token '{}'", body))?;
        Ok(f32::from_bits(bits as u32))
    }

    pub fn decode_f64(&mut self) -> Result<f64> {
        let body = self.token('d')?;
        let bits: i64 = body
            .parse()
            .map_err(|_| brood_err!(Codec: "malformed double token '{}'", body))?;
        Ok(f64::from_bits(bits as u64))
    }

    pub fn decode_bool(&mut self) -> Result<bool> {
        let body = self.token('b')?;
        match body {
            "T" => Ok(true),
            "F" => Ok(false),
            other => Err(brood_err!(Codec: "malformed boolean token '{}'", other)),
        }
    }
}
