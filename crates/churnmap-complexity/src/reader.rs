//! A Clojure s-expression reader.
//!
//! Produces a tagged [`Form`] tree rich enough to find definitions and
//! decision points. Metadata is read and dropped, `#_` discards are honoured,
//! and everything else keeps its shape so a visitor can walk it.

use churnmap_core::ChurnmapError;

/// Deepest form nesting accepted before a file is rejected.
pub const MAX_DEPTH: usize = 512;

/// Reader-macro prefixes that wrap exactly one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `'form`
    Quote,
    /// `` `form ``
    SyntaxQuote,
    /// `~form`
    Unquote,
    /// `~@form`
    UnquoteSplicing,
    /// `@form`
    Deref,
    /// `#'form`
    Var,
}

/// One node of a parsed source file.
///
/// # Examples
///
/// ```
/// use churnmap_complexity::reader::{read_forms, Form};
///
/// let forms = read_forms("(defn f [x] (inc x))").unwrap();
/// let Form::List(items) = &forms[0] else { panic!("expected a list") };
/// assert_eq!(items[0], Form::Symbol("defn".into()));
/// assert!(matches!(items[2], Form::Vector(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// `( ... )`
    List(Vec<Form>),
    /// `[ ... ]`
    Vector(Vec<Form>),
    /// `{ ... }`, including namespaced maps.
    Map(Vec<Form>),
    /// `#{ ... }`
    Set(Vec<Form>),
    /// `#( ... )`
    AnonFn(Vec<Form>),
    /// `#?( ... )` or `#?@( ... )`
    ReaderConditional(Vec<Form>),
    /// Symbols, including `nil`, `true`, `false` and `##Inf`-style values.
    Symbol(String),
    /// `:keyword` or `::keyword`
    Keyword(String),
    /// Numeric literal, kept as written.
    Number(String),
    /// String literal contents, escapes left as written.
    Str(String),
    /// `#"..."` pattern contents.
    Regex(String),
    /// `\c`, `\newline`, `é`
    Char(String),
    /// A reader-macro prefix applied to a form.
    Prefixed(Prefix, Box<Form>),
    /// `#tag form`
    Tagged(String, Box<Form>),
}

impl Form {
    /// Direct child forms, in source order.
    pub fn children(&self) -> &[Form] {
        match self {
            Form::List(items)
            | Form::Vector(items)
            | Form::Map(items)
            | Form::Set(items)
            | Form::AnonFn(items)
            | Form::ReaderConditional(items) => items,
            Form::Prefixed(_, inner) | Form::Tagged(_, inner) => std::slice::from_ref(inner),
            Form::Symbol(_)
            | Form::Keyword(_)
            | Form::Number(_)
            | Form::Str(_)
            | Form::Regex(_)
            | Form::Char(_) => &[],
        }
    }

    /// Symbol name if this form is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

/// Read every top-level form in `source`.
///
/// # Errors
///
/// Returns [`ChurnmapError::Parse`] for unbalanced or mismatched delimiters,
/// unterminated strings, reader macros with nothing to apply to, and forms
/// nested deeper than [`MAX_DEPTH`].
///
/// # Examples
///
/// ```
/// use churnmap_complexity::reader::read_forms;
///
/// let forms = read_forms("(ns demo) ; comment\n#_(ignored) (def x 1)").unwrap();
/// assert_eq!(forms.len(), 2);
/// assert!(read_forms("(defn broken [x]").is_err());
/// ```
pub fn read_forms(source: &str) -> Result<Vec<Form>, ChurnmapError> {
    let mut reader = Reader::new(source);
    let mut forms = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.peek().is_none() {
            return Ok(forms);
        }
        if let Some(form) = reader.read()? {
            forms.push(form);
        }
    }
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl std::fmt::Display) -> ChurnmapError {
        ChurnmapError::Parse(format!("line {}: {message}", self.line))
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' || (c == '#' && self.peek_second() == Some('!')) {
                self.skip_line();
            } else {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Read one form. `Ok(None)` means the input produced nothing (a discard).
    ///
    /// Every nested read passes through here, so the depth check bounds the
    /// recursion of the whole reader.
    fn read(&mut self) -> Result<Option<Form>, ChurnmapError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting too deep (limit {MAX_DEPTH})")));
        }
        self.depth += 1;
        let form = self.read_form();
        self.depth -= 1;
        form
    }

    fn read_form(&mut self) -> Result<Option<Form>, ChurnmapError> {
        self.skip_trivia();
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };

        let form = match c {
            '(' => {
                self.bump();
                Form::List(self.read_seq(')')?)
            }
            '[' => {
                self.bump();
                Form::Vector(self.read_seq(']')?)
            }
            '{' => {
                self.bump();
                Form::Map(self.read_seq('}')?)
            }
            ')' | ']' | '}' => return Err(self.error(format!("unmatched `{c}`"))),
            '"' => {
                self.bump();
                Form::Str(self.read_string()?)
            }
            '\'' => self.read_prefixed(Prefix::Quote, 1)?,
            '`' => self.read_prefixed(Prefix::SyntaxQuote, 1)?,
            '~' if self.peek_second() == Some('@') => {
                self.read_prefixed(Prefix::UnquoteSplicing, 2)?
            }
            '~' => self.read_prefixed(Prefix::Unquote, 1)?,
            '@' => self.read_prefixed(Prefix::Deref, 1)?,
            '^' => {
                self.bump();
                self.read_required()?;
                self.read_required()?
            }
            '\\' => {
                self.bump();
                Form::Char(self.read_char()?)
            }
            '#' => return self.read_dispatch(),
            ':' => Form::Keyword(self.read_token()),
            _ if starts_number(c, self.peek_second()) => Form::Number(self.read_token()),
            _ => Form::Symbol(self.read_token()),
        };
        Ok(Some(form))
    }

    /// Read forms until one is produced, skipping discards.
    fn read_required(&mut self) -> Result<Form, ChurnmapError> {
        loop {
            self.skip_trivia();
            if matches!(self.peek(), None | Some(')' | ']' | '}')) {
                return Err(self.error("reader macro is missing its form"));
            }
            if let Some(form) = self.read()? {
                return Ok(form);
            }
        }
    }

    fn read_prefixed(&mut self, prefix: Prefix, width: usize) -> Result<Form, ChurnmapError> {
        for _ in 0..width {
            self.bump();
        }
        Ok(Form::Prefixed(prefix, Box::new(self.read_required()?)))
    }

    fn read_seq(&mut self, close: char) -> Result<Vec<Form>, ChurnmapError> {
        let open_line = self.line;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    return Err(ChurnmapError::Parse(format!(
                        "line {open_line}: unclosed collection, expected `{close}`"
                    )))
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                Some(c @ (')' | ']' | '}')) => {
                    return Err(self.error(format!("expected `{close}`, found `{c}`")))
                }
                Some(_) => {
                    if let Some(form) = self.read()? {
                        items.push(form);
                    }
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<String, ChurnmapError> {
        let start_line = self.line;
        let start = self.pos;
        loop {
            match self.bump() {
                None => {
                    return Err(ChurnmapError::Parse(format!(
                        "line {start_line}: unterminated string"
                    )))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('"') => return Ok(self.src[start..self.pos - 1].to_string()),
                Some(_) => {}
            }
        }
    }

    fn read_char(&mut self) -> Result<String, ChurnmapError> {
        let start = self.pos;
        if self.bump().is_none() {
            return Err(self.error("unexpected end of input after `\\`"));
        }
        while self.peek().is_some_and(|c| !is_terminator(c)) {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn read_token(&mut self) -> String {
        let start = self.pos;
        // The first character is always consumed so `:` or `#` style leaders
        // never produce an empty token.
        self.bump();
        while self.peek().is_some_and(|c| !is_terminator(c)) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn read_dispatch(&mut self) -> Result<Option<Form>, ChurnmapError> {
        self.bump();
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input after `#`"));
        };

        let form = match c {
            '{' => {
                self.bump();
                Form::Set(self.read_seq('}')?)
            }
            '(' => {
                self.bump();
                Form::AnonFn(self.read_seq(')')?)
            }
            '"' => {
                self.bump();
                Form::Regex(self.read_string()?)
            }
            '\'' => self.read_prefixed(Prefix::Var, 1)?,
            '_' => {
                self.bump();
                self.read_required()?;
                return Ok(None);
            }
            '?' => {
                self.bump();
                if self.peek() == Some('@') {
                    self.bump();
                }
                if self.peek() != Some('(') {
                    return Err(self.error("reader conditional must be followed by `(`"));
                }
                self.bump();
                Form::ReaderConditional(self.read_seq(')')?)
            }
            ':' => {
                // Namespaced map: #:ns{...} or #::{...}
                self.read_token();
                self.skip_trivia();
                if self.peek() != Some('{') {
                    return Err(self.error("namespaced map must be followed by `{`"));
                }
                self.bump();
                Form::Map(self.read_seq('}')?)
            }
            '#' => {
                self.bump();
                Form::Symbol(format!("##{}", self.read_token()))
            }
            c if c.is_alphabetic() || c == '=' => {
                let tag = self.read_token();
                Form::Tagged(tag, Box::new(self.read_required()?))
            }
            other => return Err(self.error(format!("unsupported dispatch `#{other}`"))),
        };
        Ok(Some(form))
    }
}

fn is_terminator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            ',' | '"' | ';' | '@' | '^' | '`' | '~' | '(' | ')' | '[' | ']' | '{' | '}' | '\\'
        )
}

fn starts_number(c: char, next: Option<char>) -> bool {
    c.is_ascii_digit() || (matches!(c, '+' | '-') && next.is_some_and(|n| n.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Form {
        Form::Symbol(s.into())
    }

    fn read_one(src: &str) -> Form {
        let mut forms = read_forms(src).unwrap();
        assert_eq!(forms.len(), 1, "expected one form in {src:?}");
        forms.remove(0)
    }

    #[test]
    fn reads_nested_collections() {
        let form = read_one("(let [a {:k [1 2]} b #{3}] (f a b))");
        let Form::List(items) = form else {
            panic!("expected list")
        };
        assert_eq!(items[0], sym("let"));
        let Form::Vector(bindings) = &items[1] else {
            panic!("expected vector")
        };
        assert_eq!(bindings.len(), 4);
        assert!(matches!(bindings[1], Form::Map(_)));
        assert!(matches!(bindings[3], Form::Set(_)));
    }

    #[test]
    fn atoms_are_classified() {
        let forms = read_forms(r#":kw ::auto 42 -7 +3.5 -x "s \"q\"" #"\d+" \a \newline nil"#).unwrap();
        assert_eq!(
            forms,
            vec![
                Form::Keyword(":kw".into()),
                Form::Keyword("::auto".into()),
                Form::Number("42".into()),
                Form::Number("-7".into()),
                Form::Number("+3.5".into()),
                sym("-x"),
                Form::Str(r#"s \"q\""#.into()),
                Form::Regex(r"\d+".into()),
                Form::Char("a".into()),
                Form::Char("newline".into()),
                sym("nil"),
            ]
        );
    }

    #[test]
    fn delimiter_chars_read_as_chars() {
        let form = read_one(r"[\( \) \space]");
        assert_eq!(
            form,
            Form::Vector(vec![
                Form::Char("(".into()),
                Form::Char(")".into()),
                Form::Char("space".into()),
            ])
        );
    }

    #[test]
    fn comments_commas_and_discards_are_skipped() {
        let forms = read_forms("#!/usr/bin/env bb\n; header\n(a, b) #_(gone) #_ #_ x y (c)").unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0], Form::List(vec![sym("a"), sym("b")]));
        assert_eq!(forms[1], Form::List(vec![sym("c")]));
    }

    #[test]
    fn discard_inside_collection() {
        let form = read_one("[1 #_2 3]");
        assert_eq!(
            form,
            Form::Vector(vec![Form::Number("1".into()), Form::Number("3".into())])
        );
    }

    #[test]
    fn metadata_is_dropped() {
        let form = read_one("(defn ^:private ^{:doc \"x\"} helper [])");
        let Form::List(items) = form else {
            panic!("expected list")
        };
        assert_eq!(items[1], sym("helper"));
    }

    #[test]
    fn reader_macros_wrap_one_form() {
        let forms = read_forms("'a `(b ~c ~@d) @e #'f").unwrap();
        assert_eq!(forms[0], Form::Prefixed(Prefix::Quote, Box::new(sym("a"))));
        assert_eq!(forms[2], Form::Prefixed(Prefix::Deref, Box::new(sym("e"))));
        assert_eq!(forms[3], Form::Prefixed(Prefix::Var, Box::new(sym("f"))));
        let Form::Prefixed(Prefix::SyntaxQuote, inner) = &forms[1] else {
            panic!("expected syntax quote")
        };
        let children = inner.children();
        assert_eq!(children[1], Form::Prefixed(Prefix::Unquote, Box::new(sym("c"))));
        assert_eq!(
            children[2],
            Form::Prefixed(Prefix::UnquoteSplicing, Box::new(sym("d")))
        );
    }

    #[test]
    fn dispatch_forms() {
        let forms =
            read_forms("#(+ % 1) #?(:clj 1 :cljs 2) #?@(:clj [a]) #:user{:id 1} ##Inf #inst \"2024-01-01\"")
                .unwrap();
        assert!(matches!(forms[0], Form::AnonFn(_)));
        assert!(matches!(forms[1], Form::ReaderConditional(_)));
        assert!(matches!(forms[2], Form::ReaderConditional(_)));
        assert!(matches!(forms[3], Form::Map(_)));
        assert_eq!(forms[4], sym("##Inf"));
        assert_eq!(
            forms[5],
            Form::Tagged("inst".into(), Box::new(Form::Str("2024-01-01".into())))
        );
    }

    #[test]
    fn unicode_symbols_and_strings() {
        let forms = read_forms("(défn \"héllo→\")").unwrap();
        assert_eq!(
            forms[0],
            Form::List(vec![sym("défn"), Form::Str("héllo→".into())])
        );
    }

    #[test]
    fn unclosed_list_is_an_error() {
        let err = read_forms("(defn f [x]\n  (if x 1 2)").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 1"), "{msg}");
        assert!(msg.contains("unclosed"), "{msg}");
    }

    #[test]
    fn mismatched_delimiter_is_an_error() {
        assert!(read_forms("(a [b)]").is_err());
        assert!(read_forms("a)").is_err());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(read_forms("(str \"abc)").is_err());
    }

    #[test]
    fn dangling_reader_macro_is_an_error() {
        assert!(read_forms("(a ')").is_err());
        assert!(read_forms("#_").is_err());
        assert!(read_forms("^:meta").is_err());
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(read_forms(&ok).is_ok());

        let deep = "(".repeat(200_000);
        let msg = read_forms(&deep).unwrap_err().to_string();
        assert!(msg.contains("nesting too deep"), "{msg}");

        let quotes = format!("{}x", "'".repeat(MAX_DEPTH + 1));
        assert!(read_forms(&quotes).is_err());
    }

    #[test]
    fn children_of_atoms_are_empty() {
        assert!(sym("x").children().is_empty());
        assert_eq!(read_one("(a b)").children().len(), 2);
    }
}
