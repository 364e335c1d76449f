//! `${VAR}` expansion over raw config text, applied before parsing.

/// Config text after expansion, with the placeholders that had no value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// Unset variable names, in order of first appearance. Their
    /// placeholders stay in `text` verbatim.
    pub unresolved: Vec<String>,
}

/// Expand placeholders from the process environment.
pub fn expand_env(input: &str) -> Expanded {
    expand_with(input, |name| std::env::var(name).ok())
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> Expanded {
    let mut out = Expanded {
        text: String::with_capacity(input.len()),
        unresolved: Vec::new(),
    };
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.text.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let Some(end) = body.find('}') else {
            // unclosed: keep the tail as written
            out.text.push_str(&rest[start..]);
            return out;
        };
        let name = &body[..end];
        if !is_var_name(name) {
            out.text.push_str("${");
            rest = body;
            continue;
        }
        match lookup(name) {
            Some(value) => out.text.push_str(&value),
            None => {
                out.text.push_str(&rest[start..start + end + 3]);
                if !out.unresolved.iter().any(|n| n == name) {
                    out.unresolved.push(name.to_string());
                }
            },
        }
        rest = &body[end + 1..];
    }

    out.text.push_str(rest);
    out
}
