//! Lightweight lexical highlighter for code directives.
//!
//! Recognises comments, strings, numbers, keywords and builtins for a handful
//! of common languages and wraps them in token-class spans. Unknown languages
//! are escaped without markup.

use crate::core::config::SyntaxHighlight;
use crate::rst::html::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Keyword,
    Builtin,
    Str,
    Number,
    Comment,
    Text,
}

impl Token {
    fn class(self, mode: SyntaxHighlight) -> Option<&'static str> {
        match mode {
            SyntaxHighlight::None => None,
            SyntaxHighlight::Short => match self {
                Token::Keyword => Some("k"),
                Token::Builtin => Some("nb"),
                Token::Str => Some("s"),
                Token::Number => Some("m"),
                Token::Comment => Some("c"),
                Token::Text => None,
            },
            SyntaxHighlight::Long => match self {
                Token::Keyword => Some("keyword"),
                Token::Builtin => Some("name builtin"),
                Token::Str => Some("literal string"),
                Token::Number => Some("literal number"),
                Token::Comment => Some("comment"),
                Token::Text => None,
            },
        }
    }
}

struct Language {
    keywords: &'static [&'static str],
    builtins: &'static [&'static str],
    line_comments: &'static [&'static str],
    block_comment: Option<(&'static str, &'static str)>,
    quotes: &'static [char],
    triple_quotes: bool,
    case_insensitive: bool,
}

const PYTHON: Language = Language {
    keywords: &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
        "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
        "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
    ],
    builtins: &[
        "abs", "all", "any", "bool", "bytes", "dict", "enumerate", "filter", "float", "int", "isinstance", "len",
        "list", "map", "max", "min", "object", "open", "print", "range", "repr", "set", "sorted", "str", "sum",
        "super", "tuple", "type", "zip",
    ],
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    triple_quotes: true,
    case_insensitive: false,
};

const RUST: Language = Language {
    keywords: &[
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
        "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self",
        "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    ],
    builtins: &[
        "bool", "char", "str", "String", "Vec", "Option", "Result", "Some", "None", "Ok", "Err", "Box", "u8", "u16",
        "u32", "u64", "usize", "i8", "i16", "i32", "i64", "isize", "f32", "f64", "println", "format", "vec",
    ],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"'],
    triple_quotes: false,
    case_insensitive: false,
};

const JAVASCRIPT: Language = Language {
    keywords: &[
        "async", "await", "break", "case", "catch", "class", "const", "continue", "default", "delete", "do", "else",
        "export", "extends", "false", "finally", "for", "function", "if", "import", "in", "instanceof", "interface",
        "let", "new", "null", "return", "switch", "this", "throw", "true", "try", "type", "typeof", "undefined",
        "var", "void", "while", "yield",
    ],
    builtins: &[
        "Array", "Boolean", "Date", "Error", "JSON", "Map", "Math", "Number", "Object", "Promise", "Set", "String",
        "console", "document", "window",
    ],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\'', '`'],
    triple_quotes: false,
    case_insensitive: false,
};

const SHELL: Language = Language {
    keywords: &[
        "case", "do", "done", "elif", "else", "esac", "export", "fi", "for", "function", "if", "in", "local",
        "return", "then", "until", "while",
    ],
    builtins: &["cd", "echo", "exit", "printf", "pwd", "read", "set", "shift", "source", "test", "unset"],
    line_comments: &["#"],
    block_comment: None,
    quotes: &['"', '\''],
    triple_quotes: false,
    case_insensitive: false,
};

const C_FAMILY: Language = Language {
    keywords: &[
        "break", "case", "catch", "class", "const", "continue", "default", "do", "else", "enum", "extends", "false",
        "final", "for", "func", "go", "if", "import", "include", "namespace", "new", "nullptr", "package",
        "private", "protected", "public", "return", "static", "struct", "switch", "template", "this", "throw",
        "true", "try", "typedef", "var", "void", "while",
    ],
    builtins: &[
        "bool", "char", "double", "float", "int", "long", "short", "size_t", "string", "unsigned", "printf",
        "malloc", "free", "std",
    ],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    quotes: &['"', '\''],
    triple_quotes: false,
    case_insensitive: false,
};

const SQL: Language = Language {
    keywords: &[
        "select", "from", "where", "insert", "into", "values", "update", "set", "delete", "create", "table", "drop",
        "alter", "join", "left", "right", "inner", "outer", "on", "and", "or", "not", "null", "as", "group", "by",
        "order", "having", "limit", "primary", "key", "index", "distinct", "union",
    ],
    builtins: &["count", "sum", "avg", "min", "max", "coalesce", "integer", "text", "varchar", "timestamp"],
    line_comments: &["--"],
    block_comment: Some(("/*", "*/")),
    quotes: &['\''],
    triple_quotes: false,
    case_insensitive: true,
};

const JSON: Language = Language {
    keywords: &["true", "false", "null"],
    builtins: &[],
    line_comments: &[],
    block_comment: None,
    quotes: &['"'],
    triple_quotes: false,
    case_insensitive: false,
};

fn language(name: &str) -> Option<&'static Language> {
    match name.to_lowercase().as_str() {
        "python" | "py" | "python3" => Some(&PYTHON),
        "rust" | "rs" => Some(&RUST),
        "javascript" | "js" | "typescript" | "ts" => Some(&JAVASCRIPT),
        "bash" | "sh" | "shell" | "console" => Some(&SHELL),
        "c" | "cpp" | "c++" | "java" | "go" | "csharp" | "c#" => Some(&C_FAMILY),
        "sql" => Some(&SQL),
        "json" => Some(&JSON),
        _ => None,
    }
}

/// Whether the highlighter knows `name`.
pub(crate) fn is_supported(name: &str) -> bool {
    language(name).is_some()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn flush_text<'a>(tokens: &mut Vec<(Token, &'a str)>, code: &'a str, text_start: &mut Option<usize>, end: usize) {
    if let Some(start) = text_start.take()
        && start < end
    {
        tokens.push((Token::Text, &code[start..end]));
    }
}

fn tokenize<'a>(code: &'a str, lang: &Language) -> Vec<(Token, &'a str)> {
    let mut tokens: Vec<(Token, &str)> = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut pos = 0;

    while pos < code.len() {
        let rest = &code[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        let prev = code[..pos].chars().next_back();

        let token_end = if lang.line_comments.iter().any(|marker| rest.starts_with(marker)) {
            let len = rest.find('\n').unwrap_or(rest.len());
            Some((Token::Comment, pos + len))
        } else if let Some((open, close)) = lang.block_comment.filter(|(open, _)| rest.starts_with(open)) {
            let len = rest[open.len()..]
                .find(close)
                .map_or(rest.len(), |found| open.len() + found + close.len());
            Some((Token::Comment, pos + len))
        } else if lang.quotes.contains(&c) {
            let triple: String = std::iter::repeat_n(c, 3).collect();
            let len = if lang.triple_quotes && rest.starts_with(&triple) {
                rest[3..].find(&triple).map_or(rest.len(), |found| 3 + found + 3)
            } else {
                let mut escaped = false;
                let mut end = rest.len();
                for (offset, ch) in rest.char_indices().skip(1) {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == c {
                        end = offset + ch.len_utf8();
                        break;
                    } else if ch == '\n' && c != '`' {
                        end = offset;
                        break;
                    }
                }
                end
            };
            Some((Token::Str, pos + len))
        } else if c.is_ascii_digit() && !prev.is_some_and(is_ident_char) {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'))
                .unwrap_or(rest.len());
            Some((Token::Number, pos + len))
        } else if is_ident_start(c) && !prev.is_some_and(is_ident_char) {
            let len = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
            let word = &rest[..len];
            let matches = |list: &[&str]| {
                if lang.case_insensitive {
                    list.iter().any(|w| w.eq_ignore_ascii_case(word))
                } else {
                    list.contains(&word)
                }
            };
            let kind = if matches(lang.keywords) {
                Token::Keyword
            } else if matches(lang.builtins) {
                Token::Builtin
            } else {
                Token::Text
            };
            Some((kind, pos + len))
        } else {
            None
        };

        match token_end {
            Some((Token::Text, end)) => {
                text_start.get_or_insert(pos);
                pos = end;
            }
            Some((kind, end)) => {
                flush_text(&mut tokens, code, &mut text_start, pos);
                tokens.push((kind, &code[pos..end]));
                pos = end;
            }
            None => {
                text_start.get_or_insert(pos);
                pos += c.len_utf8();
            }
        }
    }
    flush_text(&mut tokens, code, &mut text_start, code.len());
    tokens
}

/// Render `code` as escaped HTML with token spans.
pub(crate) fn highlight(code: &str, language_name: Option<&str>, mode: SyntaxHighlight) -> String {
    let Some(lang) = language_name.and_then(language) else {
        return escape(code);
    };
    if mode == SyntaxHighlight::None {
        return escape(code);
    }

    let mut out = String::with_capacity(code.len() * 2);
    for (token, text) in tokenize(code, lang) {
        match token.class(mode) {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&escape(text));
                out.push_str("</span>");
            }
            None => out.push_str(&escape(text)),
        }
    }
    out
}
