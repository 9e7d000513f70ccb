use thiserror::Error;

use crate::metadata::token::{TableId, Token};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors are returned by fallible facade operations (looking up an element, changing a
/// name) and by actions. The rename engine never propagates them out of a catalog run:
/// a failing action is turned into an error diagnostic for the rule that triggered it.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::Malformed`] - An internal invariant of a module or method body was violated
/// - [`Error::InvalidToken`] - A token does not address an element of the module
/// - [`Error::UnexpectedTable`] - A token addresses a different table than required
/// - [`Error::NoBody`] - A method without a body was asked for its instructions
///
/// ## Lookup Errors
/// - [`Error::TypeNotFound`] - No type with the given full name exists
///
/// ## Rename Errors
/// - [`Error::NameCollision`] - The requested name is already taken in the same scope
/// - [`Error::AlreadyRenamed`] - The element already received a different name in this run
///
/// # Examples
///
/// ```rust
/// use dotrename::{Error, metadata::builder::ModuleBuilder};
///
/// let module = ModuleBuilder::new("Demo").build()?;
/// match module.type_by_name("Game.World") {
///     Ok(_) => println!("found"),
///     Err(Error::TypeNotFound(name)) => eprintln!("missing type {}", name),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok::<(), dotrename::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An internal structure is damaged.
    ///
    /// Raised for inconsistent method bodies (branch targets that are not instruction
    /// boundaries) and element graphs whose cross references do not line up. Carries the
    /// source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The token does not address an element of the module.
    #[error("Invalid token - {0}")]
    InvalidToken(Token),

    /// The token addresses a table other than the one the operation requires.
    #[error("Token {token} points into {found:?}, expected {expected}")]
    UnexpectedTable {
        /// The offending token
        token: Token,
        /// The table the operation works on
        expected: TableId,
        /// The table the token actually addresses, if it is a known one
        found: Option<TableId>,
    },

    /// The method has no body to scan.
    #[error("Method {0} has no body")]
    NoBody(Token),

    /// No type with this full name exists in the module.
    #[error("Failed to find type - {0}")]
    TypeNotFound(String),

    /// Renaming would produce a duplicate name in the same scope.
    #[error("Name '{name}' is already used by {existing} in '{scope}'")]
    NameCollision {
        /// The requested name
        name: String,
        /// The scope the collision happened in (namespace or declaring type)
        scope: String,
        /// The element that already carries the name
        existing: Token,
    },

    /// The element was renamed to a different name earlier in the same run.
    #[error("{token} was already renamed to '{assigned}', refusing '{requested}'")]
    AlreadyRenamed {
        /// The element
        token: Token,
        /// The name given by the earlier rule
        assigned: String,
        /// The name requested now
        requested: String,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
