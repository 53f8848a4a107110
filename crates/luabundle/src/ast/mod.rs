/*!
    Syntax tree helpers for finding and rewriting `require` calls.
*/

mod require;
mod string;

pub use full_moon::ast::Expression;

pub use self::require::{find_requires, RequireArgument, RequireCall, REQUIRE_IDENTIFIER};
pub use self::string::{quote_string, unescape_string};
