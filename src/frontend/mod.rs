//! Lexing and parsing: turns source text into the syntax tree the IR
//! generator consumes.

pub mod lexer;

// Expose the LALRPOP-generated parser module under frontend::grammar
lalrpop_util::lalrpop_mod!(pub grammar, "/frontend/grammar.rs");

use crate::ast::Program;
use crate::CompileError;
use lexer::LineIndex;

pub fn parse(source: &str) -> Result<Program, CompileError> {
    let lines = LineIndex::new(source);
    let tokens = lexer::lex_adapter(source);

    grammar::ProgramParser::new().parse(&lines, tokens).map_err(|e| {
        use lalrpop_util::ParseError;

        /// Build a friendly comma-separated "expected" list
        fn fmt_expected(expected: &[String]) -> String {
            expected
                .iter()
                .map(|s| lexer::friendly_token_name(s))
                .collect::<Vec<_>>()
                .join(", ")
        }

        /// Helper: create CompileError::Parse with line/col from byte position
        fn make_parse_error(source: &str, position: usize, message: String) -> CompileError {
            let (line, col) = lexer::position_to_line_col(source, position);
            let context = lexer::get_error_context(source, position);
            CompileError::Parse {
                line,
                col,
                context,
                message,
            }
        }

        match e {
            ParseError::InvalidToken { location } => {
                make_parse_error(source, location, "Invalid token".to_string())
            }
            ParseError::UnrecognizedEof { location, expected } => make_parse_error(
                source,
                location,
                format!(
                    "Unexpected end of input. Expected one of: {}",
                    fmt_expected(&expected)
                ),
            ),
            ParseError::UnrecognizedToken {
                token: (start, tok, _end),
                expected,
            } => make_parse_error(
                source,
                start,
                format!(
                    "Unexpected token '{}'. Expected one of: {}",
                    tok,
                    fmt_expected(&expected)
                ),
            ),
            ParseError::ExtraToken {
                token: (start, tok, _end),
            } => make_parse_error(source, start, format!("Extra token '{}'", tok)),
            ParseError::User { error } => CompileError::Lexical(error),
        }
    })
}
