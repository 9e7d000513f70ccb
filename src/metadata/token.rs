//! Metadata tokens and the tables they address.
//!
//! Every element of a [`crate::metadata::module::Module`] is identified by a [`Token`]:
//! the high byte selects the table, the low 24 bits the 1-based row. Names are the
//! attribute being repaired, so tokens are the only stable identity an element has.

use std::fmt;

use strum::{Display, EnumIter};

/// The metadata tables an element token can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TableId {
    /// External type references (`System.Boolean`, `UnityEngine.Vector3`, ...)
    TypeRef,
    /// Types defined in the module
    TypeDef,
    /// Fields defined in the module
    Field,
    /// Methods defined in the module
    MethodDef,
    /// Method parameters
    Param,
    /// References to members of external types
    MemberRef,
    /// The user string heap (`ldstr` operands)
    UserString,
}

impl TableId {
    /// The table byte stored in the high 8 bits of a token.
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            TableId::TypeRef => 0x01,
            TableId::TypeDef => 0x02,
            TableId::Field => 0x04,
            TableId::MethodDef => 0x06,
            TableId::Param => 0x08,
            TableId::MemberRef => 0x0A,
            TableId::UserString => 0x70,
        }
    }

    /// Maps a table byte back to its [`TableId`].
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(TableId::TypeRef),
            0x02 => Some(TableId::TypeDef),
            0x04 => Some(TableId::Field),
            0x06 => Some(TableId::MethodDef),
            0x08 => Some(TableId::Param),
            0x0A => Some(TableId::MemberRef),
            0x70 => Some(TableId::UserString),
            _ => None,
        }
    }
}

/// Identity of one element of a module: table byte in the high 8 bits, 1-based row
/// in the low 24.
///
/// Tokens survive renaming, so scope slots and the rename tracker key on them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Builds the token for `row` (1-based) of `table`.
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token((u32::from(table.byte()) << 24) | (row & 0x00FF_FFFF))
    }

    /// Raw 32-bit value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Table byte.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table this token addresses, if it is one the facade models.
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_byte(self.table())
    }

    /// Returns `true` if the token points into `table`.
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table.byte()
    }

    /// 1-based row within the table.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the null token, which never addresses an element.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table_id() {
            Some(table) => write!(f, "Token({table}#{}, 0x{:08x})", self.row(), self.0),
            None => write!(f, "Token(0x{:08x})", self.0),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
