//! RPC method name → HTTP path.
//!
//! `SayHello` is exposed as `/say/hello`. Every ASCII uppercase letter after
//! the first character starts a new segment, and everything is lowercased.
//! Runs of capitals are not treated as acronyms: `GetURL` → `get/u/r/l`.

/// `SayHello` → `say/hello`.
pub fn method_to_path(method: &str) -> String {
    split_words(method, '/')
}

/// `SayHello` → `say_hello`.
pub fn method_to_snake(method: &str) -> String {
    split_words(method, '_')
}

fn split_words(method: &str, sep: char) -> String {
    let mut out = String::with_capacity(method.len() + 4);
    for (i, ch) in method.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push(sep);
        }
        out.extend(ch.to_lowercase());
    }
    out
}
