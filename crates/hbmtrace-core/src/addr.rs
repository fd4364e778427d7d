use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Bit width of the row field.
pub const ROW_BITS: u32 = 14;
/// Bit width of the bank field.
pub const BANK_BITS: u32 = 2;
/// Bit width of the bank group field.
pub const BANK_GROUP_BITS: u32 = 2;
/// Bit width of the pseudo-channel field.
pub const PSEUDO_CHANNEL_BITS: u32 = 1;
/// Bit width of the column field.
pub const COLUMN_BITS: u32 = 5;
/// Bit width of the channel field.
pub const CHANNEL_BITS: u32 = 3;
/// Bit width of the transaction id field.
pub const TX_BITS: u32 = 5;

/// Bit position of the transaction id field (least significant).
pub const TX_SHIFT: u32 = 0;
/// Bit position of the channel field.
pub const CHANNEL_SHIFT: u32 = TX_SHIFT + TX_BITS;
/// Bit position of the column field.
pub const COLUMN_SHIFT: u32 = CHANNEL_SHIFT + CHANNEL_BITS;
/// Bit position of the pseudo-channel field.
pub const PSEUDO_CHANNEL_SHIFT: u32 = COLUMN_SHIFT + COLUMN_BITS;
/// Bit position of the bank group field.
pub const BANK_GROUP_SHIFT: u32 = PSEUDO_CHANNEL_SHIFT + PSEUDO_CHANNEL_BITS;
/// Bit position of the bank field.
pub const BANK_SHIFT: u32 = BANK_GROUP_SHIFT + BANK_GROUP_BITS;
/// Bit position of the row field (most significant).
pub const ROW_SHIFT: u32 = BANK_SHIFT + BANK_BITS;

/// Number of hex digits in a rendered address word.
pub const ADDR_HEX_DIGITS: usize = 9;

/// Returns the mask covering the lowest `bits` bits.
pub const fn field_mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

/// HBM address with channel, pseudo-channel, bank group, bank, row,
/// column, and transaction id components.
///
/// Represents the physical organization of an address in an HBM stack.
/// The components pack into a single 32-bit address word with the row in
/// the highest bits and the transaction id in the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HbmAddr {
    /// Row number
    pub row: u32,
    /// Bank number
    pub bank: u32,
    /// Bank group number
    pub bank_group: u32,
    /// Pseudo-channel number
    pub pseudo_channel: u32,
    /// Column number
    pub column: u32,
    /// Channel number
    pub channel: u32,
    /// Transaction id
    pub tx: u32,
}

impl HbmAddr {
    /// Packs the address components into a single 32-bit word.
    ///
    /// Component values must fit their declared bit widths; validated
    /// configurations guarantee this for every generated address.
    pub const fn pack(&self) -> u32 {
        (self.row << ROW_SHIFT)
            | (self.bank << BANK_SHIFT)
            | (self.bank_group << BANK_GROUP_SHIFT)
            | (self.pseudo_channel << PSEUDO_CHANNEL_SHIFT)
            | (self.column << COLUMN_SHIFT)
            | (self.channel << CHANNEL_SHIFT)
            | (self.tx << TX_SHIFT)
    }

    /// Decodes a packed 32-bit address word back into its components.
    pub const fn from_packed(addr: u32) -> HbmAddr {
        HbmAddr {
            row: (addr >> ROW_SHIFT) & field_mask(ROW_BITS),
            bank: (addr >> BANK_SHIFT) & field_mask(BANK_BITS),
            bank_group: (addr >> BANK_GROUP_SHIFT) & field_mask(BANK_GROUP_BITS),
            pseudo_channel: (addr >> PSEUDO_CHANNEL_SHIFT) & field_mask(PSEUDO_CHANNEL_BITS),
            column: (addr >> COLUMN_SHIFT) & field_mask(COLUMN_BITS),
            channel: (addr >> CHANNEL_SHIFT) & field_mask(CHANNEL_BITS),
            tx: (addr >> TX_SHIFT) & field_mask(TX_BITS),
        }
    }
}

impl Display for HbmAddr {
    /// Renders the packed word as `0x` plus 9 zero-padded lowercase hex
    /// digits, the address format of the trace file.
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "0x{:0width$x}", self.pack(), width = ADDR_HEX_DIGITS)
    }
}

/// Memory access type of a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    /// Read access, code `R`
    #[serde(rename = "R")]
    Read,
    /// Write access, code `W`
    #[serde(rename = "W")]
    Write,
}

impl AccessType {
    /// Returns the single-character code used in the trace file.
    pub const fn code(&self) -> char {
        match self {
            AccessType::Read => 'R',
            AccessType::Write => 'W',
        }
    }
}

impl Display for AccessType {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "{}", self.code())
    }
}

/// Error returned when parsing an access type code fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid access type {0:?}, expected R or W")]
pub struct ParseAccessTypeError(String);

impl FromStr for AccessType {
    type Err = ParseAccessTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" | "r" => Ok(AccessType::Read),
            "W" | "w" => Ok(AccessType::Write),
            other => Err(ParseAccessTypeError(other.to_string())),
        }
    }
}

/// A single trace record: packed address plus access type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    /// Address of the access
    pub addr: HbmAddr,
    /// Read or write
    pub access: AccessType,
}

impl Display for TraceEntry {
    /// Formats the entry as one trace-file record without the trailing
    /// newline: `<padded-hex> <code>`.
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "{} {}", self.addr, self.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_widths_cover_32_bits() {
        assert_eq!(ROW_SHIFT + ROW_BITS, 32);
    }

    #[test]
    fn pack_zero() {
        assert_eq!(HbmAddr::default().pack(), 0);
        assert_eq!(HbmAddr::default().to_string(), "0x000000000");
    }

    #[test]
    fn pack_channel_above_tx_bits() {
        let addr = HbmAddr {
            channel: 5,
            ..HbmAddr::default()
        };
        assert_eq!(addr.pack(), 5 << 5);
        assert_eq!(addr.to_string(), "0x0000000a0");
    }

    #[test]
    fn pack_round_trip() {
        let addr = HbmAddr {
            row: 0x3fff,
            bank: 3,
            bank_group: 2,
            pseudo_channel: 1,
            column: 31,
            channel: 7,
            tx: 17,
        };
        assert_eq!(HbmAddr::from_packed(addr.pack()), addr);
    }

    #[test]
    fn max_fields_fill_the_word() {
        let addr = HbmAddr {
            row: field_mask(ROW_BITS),
            bank: field_mask(BANK_BITS),
            bank_group: field_mask(BANK_GROUP_BITS),
            pseudo_channel: field_mask(PSEUDO_CHANNEL_BITS),
            column: field_mask(COLUMN_BITS),
            channel: field_mask(CHANNEL_BITS),
            tx: field_mask(TX_BITS),
        };
        assert_eq!(addr.pack(), u32::MAX);
        assert_eq!(addr.to_string(), "0x0ffffffff");
    }

    #[test]
    fn access_type_codes() {
        assert_eq!(AccessType::Read.to_string(), "R");
        assert_eq!(AccessType::Write.to_string(), "W");
        assert_eq!("R".parse(), Ok(AccessType::Read));
        assert_eq!("w".parse(), Ok(AccessType::Write));
        assert!("RW".parse::<AccessType>().is_err());
    }

    #[test]
    fn trace_entry_line_format() {
        let entry = TraceEntry {
            addr: HbmAddr {
                row: 1,
                ..HbmAddr::default()
            },
            access: AccessType::Write,
        };
        assert_eq!(entry.to_string(), "0x000040000 W");
        assert_eq!(entry.to_string().len(), 2 + ADDR_HEX_DIGITS + 2);
    }
}
