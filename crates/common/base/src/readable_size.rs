// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Human readable byte sizes such as `512KiB` or `1MiB`, used for request
//! body limits in configuration.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use snafu::{OptionExt, ResultExt, Snafu};

const UNIT: u64 = 1;
const KIB: u64 = UNIT * 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ParseSizeError {
    #[snafu(display("Empty size string"))]
    Empty,

    #[snafu(display("Invalid size number in {input:?}"))]
    InvalidNumber {
        input:  String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("Unknown size unit {unit:?}"))]
    UnknownUnit { unit: String },

    #[snafu(display("Size {input:?} overflows u64"))]
    Overflow { input: String },
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From,
)]
pub struct ReadableSize(pub u64);

impl ReadableSize {
    #[must_use]
    pub const fn kb(count: u64) -> Self { Self(count * KIB) }

    #[must_use]
    pub const fn mb(count: u64) -> Self { Self(count * MIB) }

    #[must_use]
    pub const fn gb(count: u64) -> Self { Self(count * GIB) }

    #[must_use]
    pub const fn as_bytes(self) -> u64 { self.0 }

    #[must_use]
    pub const fn as_mb(self) -> u64 { self.0 / MIB }
}

impl fmt::Display for ReadableSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.0;
        if size == 0 {
            write!(f, "0B")
        } else if size % GIB == 0 {
            write!(f, "{}GiB", size / GIB)
        } else if size % MIB == 0 {
            write!(f, "{}MiB", size / MIB)
        } else if size % KIB == 0 {
            write!(f, "{}KiB", size / KIB)
        } else {
            write!(f, "{size}B")
        }
    }
}

impl FromStr for ReadableSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return EmptySnafu.fail();
        }

        let split_at = input
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(input.len());
        let (number, unit) = input.split_at(split_at);
        let number: u64 = number.parse().context(InvalidNumberSnafu { input })?;

        let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "b" => UNIT,
            "k" | "kb" | "kib" => KIB,
            "m" | "mb" | "mib" => MIB,
            "g" | "gb" | "gib" => GIB,
            other => return UnknownUnitSnafu { unit: other }.fail(),
        };

        number
            .checked_mul(multiplier)
            .map(Self)
            .context(OverflowSnafu { input })
    }
}

impl Serialize for ReadableSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReadableSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("1MiB".parse::<ReadableSize>().unwrap(), ReadableSize::mb(1));
        assert_eq!("512kb".parse::<ReadableSize>().unwrap(), ReadableSize::kb(512));
        assert_eq!("2 GiB".parse::<ReadableSize>().unwrap(), ReadableSize::gb(2));
        assert_eq!("100".parse::<ReadableSize>().unwrap(), ReadableSize(100));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "".parse::<ReadableSize>(),
            Err(ParseSizeError::Empty)
        ));
        assert!(matches!(
            "12parsecs".parse::<ReadableSize>(),
            Err(ParseSizeError::UnknownUnit { .. })
        ));
        assert!(matches!(
            "MiB".parse::<ReadableSize>(),
            Err(ParseSizeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "99999999999999GiB".parse::<ReadableSize>(),
            Err(ParseSizeError::Overflow { .. })
        ));
    }

    #[test]
    fn test_display_picks_largest_whole_unit() {
        assert_eq!(ReadableSize::mb(1).to_string(), "1MiB");
        assert_eq!(ReadableSize::kb(1536).to_string(), "1536KiB");
        assert_eq!(ReadableSize(1000).to_string(), "1000B");
        assert_eq!(ReadableSize(0).to_string(), "0B");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ReadableSize::mb(100)).unwrap();
        assert_eq!(json, "\"100MiB\"");
        let size: ReadableSize = serde_json::from_str("\"64KiB\"").unwrap();
        assert_eq!(size.as_bytes(), 64 * 1024);
    }
}
