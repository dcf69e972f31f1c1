//! Syntax check for the skill entrypoint.
//!
//! The source is parsed as a CommonJS script. Nothing is evaluated.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parse `source` and return the first diagnostic on failure.
pub fn check_syntax(source: &str) -> Result<(), String> {
    // Hashbang lines are not accepted by the skill runtime loader.
    if source.starts_with("#!") {
        return Err("Unexpected character '#' (1:0)".to_string());
    }

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();

    if let Some(diagnostic) = ret.errors.first() {
        return Err(diagnostic.to_string());
    }
    if ret.panicked {
        return Err("Unexpected end of input".to_string());
    }
    Ok(())
}
