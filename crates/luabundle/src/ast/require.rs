use std::ops::Range;

use full_moon::{
    ast::{Ast, Call, Expression, FunctionArgs, FunctionCall, Prefix, Suffix, VarExpression},
    node::Node,
    tokenizer::{StringLiteralQuoteType, TokenReference, TokenType},
    visitors::Visitor,
};

use super::string::unescape_string;

/**
    The global function name that declares a dependency on another module.
*/
pub const REQUIRE_IDENTIFIER: &str = "require";

/**
    The argument given to a `require` call.
*/
#[derive(Debug, Clone)]
pub enum RequireArgument {
    /// A string literal, with any escape sequences decoded.
    Literal(String),
    /// Any other expression, which can only be resolved by an expression handler.
    Expression(Expression),
    /// No argument at all, as in `require()`.
    Missing,
}

/**
    A single `require` call found in a syntax tree.

    Byte offsets refer to the source text that the tree was parsed from.
*/
#[derive(Debug, Clone)]
pub struct RequireCall {
    pub argument: RequireArgument,
    /// Byte offset just past the `require` name.
    pub callee_end: usize,
    /// Byte offset just past the closing token of the call.
    pub call_end: usize,
    /// Line of the `require` name, starting at 1.
    pub line: usize,
    /// Column of the `require` name, starting at 1.
    pub column: usize,
}

impl RequireCall {
    /**
        Checks if the given prefix and suffixes start with a `require` call.

        Both function calls such as `require("a"):new()` and variable
        expressions such as `require("a").value` start this way.
    */
    fn from_parts<'a>(
        prefix: &Prefix,
        mut suffixes: impl Iterator<Item = &'a Suffix>,
    ) -> Option<Self> {
        let Prefix::Name(name) = prefix else {
            return None;
        };
        if name.token().to_string() != REQUIRE_IDENTIFIER {
            return None;
        }

        // Only the first suffix belongs to the require call itself,
        // anything after it operates on the value returned by require
        let suffix = suffixes.next()?;
        let Suffix::Call(Call::AnonymousCall(args)) = suffix else {
            return None;
        };

        let argument = match args {
            FunctionArgs::Parentheses { arguments, .. } => match arguments.iter().next() {
                None => RequireArgument::Missing,
                Some(Expression::String(token)) => match string_literal(token) {
                    Some(literal) => RequireArgument::Literal(literal),
                    None => RequireArgument::Expression(Expression::String(token.clone())),
                },
                Some(expression) => RequireArgument::Expression(expression.clone()),
            },
            FunctionArgs::String(token) => match string_literal(token) {
                Some(literal) => RequireArgument::Literal(literal),
                None => RequireArgument::Missing,
            },
            FunctionArgs::TableConstructor(table) => {
                RequireArgument::Expression(Expression::TableConstructor(table.clone()))
            }
            _ => return None,
        };

        let start = name.token().start_position();
        let callee_end = name.token().end_position().bytes();
        let call_end = suffix.end_position()?.bytes();

        Some(Self {
            argument,
            callee_end,
            call_end,
            line: start.line(),
            column: start.character(),
        })
    }

    /**
        Returns the string literal passed to this call, if any.
    */
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        match &self.argument {
            RequireArgument::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /**
        The byte range covering everything after the `require` name up to
        the end of the call, such as `("name")` or ` "name"`.

        Replacing this range keeps the `require` name itself untouched.
    */
    #[must_use]
    pub fn arguments_range(&self) -> Range<usize> {
        self.callee_end..self.call_end
    }
}

fn string_literal(token: &TokenReference) -> Option<String> {
    match token.token_type() {
        TokenType::StringLiteral {
            literal,
            quote_type,
            ..
        } => Some(match quote_type {
            // Long bracket strings never contain escape sequences
            StringLiteralQuoteType::Brackets => literal.to_string(),
            _ => unescape_string(&literal.to_string()),
        }),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct RequireVisitor {
    calls: Vec<RequireCall>,
}

impl Visitor for RequireVisitor {
    fn visit_function_call(&mut self, node: &FunctionCall) {
        if let Some(call) = RequireCall::from_parts(node.prefix(), node.suffixes()) {
            self.calls.push(call);
        }
    }

    fn visit_var_expression(&mut self, node: &VarExpression) {
        if let Some(call) = RequireCall::from_parts(node.prefix(), node.suffixes()) {
            self.calls.push(call);
        }
    }
}

/**
    Finds all `require` calls in the given syntax tree, in source order.

    Both the parenthesized form `require("name")` and the string call
    form `require "name"` are found, as well as calls with arguments that
    are not string literals - those are reported as expressions.
*/
#[must_use]
pub fn find_requires(ast: &Ast) -> Vec<RequireCall> {
    let mut visitor = RequireVisitor::default();
    visitor.visit_ast(ast);

    let mut calls = visitor.calls;
    calls.sort_by_key(|call| call.callee_end);
    calls.dedup_by_key(|call| call.callee_end);
    calls
}
