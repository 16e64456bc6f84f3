//! Per-dialect identifier quoting.
//!
//! Two concrete policies exist: backtick (MariaDB family) and ANSI
//! double-quote (Postgres, SQLite). Input that is already wrapped in either
//! quote character is passed through unchanged, so quoting is idempotent and
//! callers may pre-quote unusual identifiers themselves.

/// Identifier quoting style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"identifier"` (Postgres, SQLite).
    Ansi,
    /// `` `identifier` `` (MariaDB/MySQL).
    Backtick,
}

impl QuoteStyle {
    fn quote_char(&self) -> char {
        match self {
            QuoteStyle::Ansi => '"',
            QuoteStyle::Backtick => '`',
        }
    }
}

/// Escapes SQL identifiers for one dialect.
#[derive(Clone, Copy, Debug)]
pub struct Quoter {
    style: QuoteStyle,
}

impl Quoter {
    pub fn new(style: QuoteStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> QuoteStyle {
        self.style
    }

    /// Quote a single identifier (no dots).
    ///
    /// The dialect's quote character is doubled when it appears inside the
    /// identifier. Pre-quoted input is returned unchanged.
    pub fn ident(&self, ident: &str) -> String {
        let ident = ident.trim();
        if ident.is_empty() {
            return String::new();
        }

        if is_pre_quoted(ident) {
            return ident.to_string();
        }

        let q = self.style.quote_char();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for ch in ident.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }

    /// Quote a dotted identifier (`table.column`, `schema.table.column`).
    ///
    /// Each non-`*` segment is quoted individually; `*` segments stay bare so
    /// `t.*` keeps working.
    pub fn dotted(&self, ident: &str) -> String {
        let ident = ident.trim();
        if ident.is_empty() || ident == "*" {
            return ident.to_string();
        }

        let parts: Vec<&str> = ident.split('.').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return String::new();
        }

        parts
            .iter()
            .map(|p| if *p == "*" { "*".to_string() } else { self.ident(p) })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote an alias (SELECT/FROM/JOIN).
    pub fn alias(&self, alias: &str) -> String {
        self.ident(alias)
    }

    /// Quote a table name with an optional whitespace-separated alias.
    ///
    /// `users` → `"users"`, `users u` → `"users" AS "u"`,
    /// `schema.users u` → `"schema"."users" AS "u"`.
    pub fn table_with_optional_alias(&self, table: &str) -> String {
        let table = table.trim();
        if table.is_empty() {
            return String::new();
        }

        let mut parts = table.split_whitespace().filter(|p| !p.is_empty());
        let name = match parts.next() {
            Some(n) => n,
            None => return String::new(),
        };
        let alias = parts.next();

        let mut out = self.dotted(name);
        if let Some(alias) = alias {
            out.push_str(" AS ");
            out.push_str(&self.alias(alias));
        }
        out
    }
}

/// An identifier already wrapped in either dialect's quote character is left
/// alone, regardless of the active style.
fn is_pre_quoted(ident: &str) -> bool {
    ident.len() >= 2
        && ((ident.starts_with('`') && ident.ends_with('`'))
            || (ident.starts_with('"') && ident.ends_with('"')))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ansi() -> Quoter {
        Quoter::new(QuoteStyle::Ansi)
    }

    fn backtick() -> Quoter {
        Quoter::new(QuoteStyle::Backtick)
    }

    #[test]
    fn ident_simple() {
        assert_eq!(ansi().ident("users"), r#""users""#);
        assert_eq!(backtick().ident("users"), "`users`");
    }

    #[test]
    fn ident_passes_through_pre_quoted() {
        assert_eq!(ansi().ident(r#""users""#), r#""users""#);
        assert_eq!(backtick().ident("`users`"), "`users`");
    }

    #[test]
    fn ident_doubles_quote_char() {
        assert_eq!(ansi().ident(r#"a"b"#), r#""a""b""#);
        assert_eq!(backtick().ident("a`b"), "`a``b`");
    }

    #[test]
    fn dotted_quotes_each_segment() {
        assert_eq!(ansi().dotted("t.col"), r#""t"."col""#);
        assert_eq!(backtick().dotted("s.t.col"), "`s`.`t`.`col`");
    }

    #[test]
    fn dotted_keeps_star_segments() {
        assert_eq!(ansi().dotted("*"), "*");
        assert_eq!(ansi().dotted("t.*"), r#""t".*"#);
    }

    #[test]
    fn alias_with_spaces() {
        assert_eq!(ansi().alias("my alias"), r#""my alias""#);
    }

    #[test]
    fn table_with_alias() {
        assert_eq!(ansi().table_with_optional_alias("users"), r#""users""#);
        assert_eq!(ansi().table_with_optional_alias("users u"), r#""users" AS "u""#);
        assert_eq!(
            ansi().table_with_optional_alias("public.users u"),
            r#""public"."users" AS "u""#
        );
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(ansi().ident("  "), "");
        assert_eq!(ansi().dotted(""), "");
        assert_eq!(ansi().table_with_optional_alias(""), "");
    }
}
