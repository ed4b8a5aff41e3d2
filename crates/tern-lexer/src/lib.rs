//! Tern lexer: cursor recognizers over the source bytes, plus the keyword
//! and operator tables.

pub mod lexer;
pub mod token;

pub use lexer::{unescape, Lexer};
pub use token::{
    lookup_keyword, ArgClass, Keyword, Number, NumberLit, OpInfo, OpToken, StrLit, Word,
    PREC_MARK, PREC_MAX,
};
