//! `{}`-placeholder message formatting
//!
//! Mirrors how the engine's logging façade renders parameterized messages:
//! each `{}` takes the next argument, `\{}` is a literal `{}`, `\\{}` is a
//! literal backslash followed by a substitution, and once the arguments run
//! out the rest of the template is copied verbatim.

use std::fmt::{Display, Write};

const PLACEHOLDER: &str = "{}";
const ESCAPE: char = '\\';

/// Render `template` against `args`; `None` when there is no template
pub fn format_message(template: Option<&str>, args: &[&dyn Display]) -> Option<String> {
    let template = template?;
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut args = args.iter().peekable();
    let mut rest = template;

    loop {
        if args.peek().is_none() {
            out.push_str(rest);
            break;
        }
        let Some(pos) = rest.find(PLACEHOLDER) else {
            out.push_str(rest);
            break;
        };

        let before = &rest[..pos];
        rest = &rest[pos + PLACEHOLDER.len()..];

        if let Some(stripped) = before.strip_suffix(ESCAPE) {
            if stripped.ends_with(ESCAPE) {
                // `\\{}`: keep one backslash, still substitute
                out.push_str(stripped);
            } else {
                out.push_str(stripped);
                out.push_str(PLACEHOLDER);
                continue;
            }
        } else {
            out.push_str(before);
        }

        if let Some(arg) = args.next() {
            let _ = write!(out, "{}", arg);
        }
    }

    Some(out)
}
