//! SQL identifier quoting.
//!
//! Table and column names are always rendered backtick-quoted. An embedded
//! backtick is escaped by doubling it; nothing else is validated.

/// Quote an identifier: `user` -> `` `user` ``.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(&mut out, name);
    out
}

pub(crate) fn write_ident(out: &mut String, name: &str) {
    out.push('`');
    for ch in name.chars() {
        if ch == '`' {
            out.push('`');
        }
        out.push(ch);
    }
    out.push('`');
}

/// Comma-separated list of quoted identifiers.
pub(crate) fn ident_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_ident(&mut out, name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        assert_eq!(quote_ident("users"), "`users`");
    }

    #[test]
    fn ident_escapes_backtick() {
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn ident_keeps_reserved_words() {
        assert_eq!(quote_ident("order"), "`order`");
    }

    #[test]
    fn ident_list_joins() {
        assert_eq!(ident_list(["id", "name"]), "`id`, `name`");
        assert_eq!(ident_list(Vec::<&str>::new()), "");
    }
}
