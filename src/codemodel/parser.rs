//! Tokenizer and recursive descent parser for C++ type expressions and function signatures.
//!
//! The grammar is the subset that appears in declarations and in rule-database signatures:
//! cv-qualifiers, optionally `::` qualified names, nested template arguments, pointers,
//! references, function pointers and array dimensions. Multi-word builtin types such as
//! `unsigned long long` are folded into a single name segment.

use crate::{
    codemodel::{ReferenceType, TypeInfo},
    Error::RecursionLimit,
    Result,
};

/// Maximum nesting of template arguments and function pointer parameters
const MAX_RECURSION_DEPTH: usize = 50;

/// Words that combine into a single builtin type name
const BUILTIN_WORDS: &[&str] = &[
    "unsigned", "signed", "short", "long", "int", "char", "double", "float",
];

/// Elaborated type specifiers that carry no information for lookups
const ELABORATED_KEYWORDS: &[&str] = &["typename", "struct", "class", "enum", "union"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(String),
    Scope,
    Less,
    Greater,
    Comma,
    Star,
    Amp,
    AmpAmp,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Ellipsis,
    Other(char),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Ident(value) | Token::Number(value) => value.clone(),
            Token::Scope => "::".to_string(),
            Token::Less => "<".to_string(),
            Token::Greater => ">".to_string(),
            Token::Comma => ",".to_string(),
            Token::Star => "*".to_string(),
            Token::Amp => "&".to_string(),
            Token::AmpAmp => "&&".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Ellipsis => "...".to_string(),
            Token::Other(c) => c.to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        let current = chars[position];
        if current.is_whitespace() {
            position += 1;
            continue;
        }

        if current.is_alphabetic() || current == '_' {
            let start = position;
            while position < chars.len() && (chars[position].is_alphanumeric() || chars[position] == '_')
            {
                position += 1;
            }
            tokens.push(Token::Ident(chars[start..position].iter().collect()));
            continue;
        }

        if current.is_ascii_digit() || (current == '-' && chars.get(position + 1).is_some_and(char::is_ascii_digit)) {
            let start = position;
            position += 1;
            while position < chars.len() && (chars[position].is_alphanumeric() || chars[position] == '.') {
                position += 1;
            }
            tokens.push(Token::Number(chars[start..position].iter().collect()));
            continue;
        }

        let next = chars.get(position + 1).copied();
        let (token, width) = match (current, next) {
            (':', Some(':')) => (Token::Scope, 2),
            ('&', Some('&')) => (Token::AmpAmp, 2),
            ('.', Some('.')) => {
                if chars.get(position + 2) != Some(&'.') {
                    return Err(malformed_error!("Unexpected '..' in type '{}'", text));
                }
                (Token::Ellipsis, 3)
            }
            ('<', _) => (Token::Less, 1),
            ('>', _) => (Token::Greater, 1),
            (',', _) => (Token::Comma, 1),
            ('*', _) => (Token::Star, 1),
            ('&', _) => (Token::Amp, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (other, _) => (Token::Other(other), 1),
        };
        tokens.push(token);
        position += width;
    }

    Ok(tokens)
}

/// Recursive descent parser over a token stream
struct TypeParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn new(source: &'a str) -> Result<Self> {
        Ok(TypeParser {
            source,
            tokens: tokenize(source)?,
            position: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(malformed_error!(
                "Expected '{}' but found '{}' in '{}'",
                expected.text(),
                token.text(),
                self.source
            )),
            None => Err(malformed_error!(
                "Expected '{}' at end of '{}'",
                expected.text(),
                self.source
            )),
        }
    }

    fn parse_cv(&mut self, info: &mut TypeInfo) {
        while let Some(Token::Ident(word)) = self.peek() {
            match word.as_str() {
                "const" => info.is_const = true,
                "volatile" => info.is_volatile = true,
                _ => break,
            }
            self.position += 1;
        }
    }

    /// Pointer level cv-qualifiers (`T* const`) are accepted and dropped
    fn skip_cv(&mut self) {
        while matches!(self.peek(), Some(Token::Ident(word)) if word == "const" || word == "volatile")
        {
            self.position += 1;
        }
    }

    fn parse_type(&mut self) -> Result<TypeInfo> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let mut info = TypeInfo::default();
        self.parse_cv(&mut info);

        if matches!(self.peek(), Some(Token::Ident(word)) if ELABORATED_KEYWORDS.contains(&word.as_str()))
        {
            self.position += 1;
        }

        match self.peek().cloned() {
            Some(Token::Ellipsis) => {
                self.position += 1;
                info.qualified_name.push("...".to_string());
            }
            Some(Token::Number(value)) => {
                self.position += 1;
                info.qualified_name.push(value);
            }
            Some(Token::Ident(_) | Token::Scope) => self.parse_name(&mut info)?,
            Some(token) => {
                return Err(malformed_error!(
                    "Unexpected '{}' in type '{}'",
                    token.text(),
                    self.source
                ))
            }
            None => return Err(malformed_error!("Empty type expression '{}'", self.source)),
        }

        self.parse_cv(&mut info);

        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.position += 1;
                    info.indirections += 1;
                    self.skip_cv();
                }
                Some(Token::Amp) => {
                    self.position += 1;
                    info.reference = ReferenceType::LValueReference;
                }
                Some(Token::AmpAmp) => {
                    self.position += 1;
                    info.reference = ReferenceType::RValueReference;
                }
                _ => break,
            }
        }

        if self.peek() == Some(&Token::LParen) && self.peek_at(1) == Some(&Token::Star) {
            self.parse_function_pointer(&mut info)?;
        }

        while self.peek() == Some(&Token::LBracket) {
            self.position += 1;
            let mut dimension = String::new();
            loop {
                match self.advance() {
                    Some(Token::RBracket) => break,
                    Some(token) => {
                        if matches!(token, Token::Ident(_) | Token::Number(_))
                            && dimension.ends_with(|c: char| c.is_alphanumeric() || c == '_')
                        {
                            dimension.push(' ');
                        }
                        dimension.push_str(&token.text());
                    }
                    None => {
                        return Err(malformed_error!("Unterminated array in '{}'", self.source))
                    }
                }
            }
            info.array_elements.push(dimension);
        }

        self.depth -= 1;
        Ok(info)
    }

    fn parse_name(&mut self, info: &mut TypeInfo) -> Result<()> {
        if self.peek() == Some(&Token::Scope) {
            self.position += 1;
        }

        loop {
            let Some(Token::Ident(first)) = self.advance() else {
                return Err(malformed_error!("Expected identifier in '{}'", self.source));
            };

            let mut segment = first;
            if BUILTIN_WORDS.contains(&segment.as_str()) {
                while let Some(Token::Ident(word)) = self.peek() {
                    if !BUILTIN_WORDS.contains(&word.as_str()) {
                        break;
                    }
                    segment.push(' ');
                    segment.push_str(word);
                    self.position += 1;
                }
            }
            info.qualified_name.push(segment);

            if self.peek() == Some(&Token::Less) {
                self.position += 1;
                info.instantiations = self.parse_template_arguments()?;
            }

            if self.peek() == Some(&Token::Scope) {
                self.position += 1;
                // Arguments of an enclosing template do not survive into the nested name
                info.instantiations.clear();
                continue;
            }
            return Ok(());
        }
    }

    fn parse_template_arguments(&mut self) -> Result<Vec<TypeInfo>> {
        let mut arguments = Vec::new();
        if self.peek() == Some(&Token::Greater) {
            self.position += 1;
            return Ok(arguments);
        }

        loop {
            arguments.push(self.parse_type()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::Greater) => return Ok(arguments),
                Some(token) => {
                    return Err(malformed_error!(
                        "Unexpected '{}' in template arguments of '{}'",
                        token.text(),
                        self.source
                    ))
                }
                None => {
                    return Err(malformed_error!(
                        "Unterminated template arguments in '{}'",
                        self.source
                    ))
                }
            }
        }
    }

    fn parse_function_pointer(&mut self, info: &mut TypeInfo) -> Result<()> {
        self.expect(&Token::LParen)?;
        self.expect(&Token::Star)?;
        if matches!(self.peek(), Some(Token::Ident(_))) {
            self.position += 1;
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::LParen)?;

        info.function_pointer = true;
        if self.peek() == Some(&Token::RParen) {
            self.position += 1;
            return Ok(());
        }
        loop {
            info.arguments.push(self.parse_type()?);
            if matches!(self.peek(), Some(Token::Ident(_))) {
                self.position += 1;
            }
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(()),
                _ => {
                    return Err(malformed_error!(
                        "Malformed function pointer parameters in '{}'",
                        self.source
                    ))
                }
            }
        }
    }
}

/// Parse a complete type expression.
pub(crate) fn parse_type(text: &str) -> Result<TypeInfo> {
    let mut parser = TypeParser::new(text)?;
    let info = parser.parse_type()?;
    if let Some(token) = parser.peek() {
        return Err(malformed_error!(
            "Trailing '{}' after type '{}'",
            token.text(),
            text
        ));
    }
    Ok(info)
}

/// Parse a parameter declaration: a type optionally followed by a parameter name.
pub(crate) fn parse_declaration(text: &str) -> Result<(TypeInfo, Option<String>)> {
    let mut parser = TypeParser::new(text)?;
    let info = parser.parse_type()?;
    let name = match parser.advance() {
        Some(Token::Ident(name)) => Some(name),
        None => None,
        Some(token) => {
            return Err(malformed_error!(
                "Unexpected '{}' in declaration '{}'",
                token.text(),
                text
            ))
        }
    };
    if !parser.at_end() {
        return Err(malformed_error!("Trailing tokens in declaration '{}'", text));
    }
    Ok((info, name))
}

/// One parameter of a parsed signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedArgument {
    pub type_info: TypeInfo,
    pub name: Option<String>,
    pub default_value: Option<String>,
}

/// A function signature as written in the rule database, `name(T1 a, T2 b = v) const`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedSignature {
    pub name: String,
    pub arguments: Vec<ParsedArgument>,
    pub is_const: bool,
}

/// Split `text` on `separator` occurrences that are not nested in brackets.
fn split_top_level(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if c == separator && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Find the parenthesis closing the one at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    for (index, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a full function signature.
pub(crate) fn parse_signature(text: &str) -> Result<ParsedSignature> {
    let text = text.trim();
    let mut search_from = 0;
    if let Some(rest) = text.strip_prefix("operator") {
        if rest.trim_start().starts_with("()") {
            search_from = text.len() - rest.trim_start().len() + 2;
        }
    }

    let Some(open) = text[search_from..].find('(').map(|i| i + search_from) else {
        return Err(malformed_error!("Missing '(' in signature '{}'", text));
    };
    let Some(close) = matching_paren(text, open) else {
        return Err(malformed_error!("Unbalanced parentheses in signature '{}'", text));
    };

    let name = text[..open].trim().to_string();
    if name.is_empty() {
        return Err(malformed_error!("Missing function name in signature '{}'", text));
    }

    let trailer = text[close + 1..].trim();
    let is_const = match trailer {
        "" => false,
        "const" => true,
        other => {
            return Err(malformed_error!(
                "Unexpected '{}' after signature '{}'",
                other,
                text
            ))
        }
    };

    let mut arguments = Vec::new();
    let parameters = text[open + 1..close].trim();
    if !parameters.is_empty() {
        for parameter in split_top_level(parameters, ',') {
            let mut pieces = split_top_level(&parameter, '=').into_iter();
            let declaration = pieces.next().unwrap_or_default();
            let default_value = pieces
                .collect::<Vec<_>>()
                .join("=")
                .trim()
                .to_string();
            let (type_info, name) = parse_declaration(declaration.trim())?;
            arguments.push(ParsedArgument {
                type_info,
                name,
                default_value: (!default_value.is_empty()).then_some(default_value),
            });
        }
    }

    Ok(ParsedSignature {
        name,
        arguments,
        is_const,
    })
}

/// Remove insignificant whitespace from a signature so that textual comparison is stable.
///
/// `void foo ( const QString & s ) const` and `void foo(const QString&s)const` normalize to
/// the same text. Whitespace is kept only between two identifier characters.
#[must_use]
pub fn normalize_signature(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let previous_is_word = result.ends_with(|p: char| p.is_alphanumeric() || p == '_');
            if previous_is_word && (c.is_alphanumeric() || c == '_') {
                result.push(' ');
            }
            pending_space = false;
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let info = parse_type("int").unwrap();
        assert_eq!(info.qualified_name, vec!["int"]);
        assert_eq!(info.indirections, 0);
        assert!(!info.is_const);
    }

    #[test]
    fn test_parse_builtin_words() {
        let info = parse_type("const unsigned long long*").unwrap();
        assert_eq!(info.qualified_name, vec!["unsigned long long"]);
        assert!(info.is_const);
        assert_eq!(info.indirections, 1);
    }

    #[test]
    fn test_parse_qualified_template() {
        let info = parse_type("::std::map<int, std::vector<QString>>&&").unwrap();
        assert_eq!(info.qualified_name, vec!["std", "map"]);
        assert_eq!(info.reference, ReferenceType::RValueReference);
        assert_eq!(info.instantiations.len(), 2);
        assert_eq!(info.instantiations[1].qualified_name, vec!["std", "vector"]);
        assert_eq!(info.instantiations[1].instantiations[0].local_name(), "QString");
    }

    #[test]
    fn test_parse_non_type_argument() {
        let info = parse_type("Array<int, 4>").unwrap();
        assert_eq!(info.instantiations[1].qualified_name, vec!["4"]);
    }

    #[test]
    fn test_parse_trailing_const_and_pointer_const() {
        let info = parse_type("QString const &").unwrap();
        assert!(info.is_const);
        assert_eq!(info.reference, ReferenceType::LValueReference);

        let info = parse_type("char* const*").unwrap();
        assert!(!info.is_const);
        assert_eq!(info.indirections, 2);
    }

    #[test]
    fn test_parse_arrays() {
        let info = parse_type("const char[]").unwrap();
        assert_eq!(info.array_elements, vec![String::new()]);

        let info = parse_type("int[3][Size]").unwrap();
        assert_eq!(info.array_elements, vec!["3".to_string(), "Size".to_string()]);
    }

    #[test]
    fn test_parse_function_pointer() {
        let info = parse_type("void (*)(int, const char*)").unwrap();
        assert!(info.function_pointer);
        assert_eq!(info.arguments.len(), 2);
        assert_eq!(info.to_string(), "void (*)(int, const char*)");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_type("").is_err());
        assert!(parse_type("QList<int").is_err());
        assert!(parse_type("int )").is_err());
    }

    #[test]
    fn test_parse_declaration_with_name() {
        let (info, name) = parse_declaration("const QString& text").unwrap();
        assert_eq!(info.to_string(), "const QString&");
        assert_eq!(name.as_deref(), Some("text"));

        let (info, name) = parse_declaration("unsigned int").unwrap();
        assert_eq!(info.local_name(), "unsigned int");
        assert!(name.is_none());
    }

    #[test]
    fn test_parse_signature() {
        let signature = parse_signature("move(int dx, const QPoint& p = QPoint(0, 0)) const").unwrap();
        assert_eq!(signature.name, "move");
        assert!(signature.is_const);
        assert_eq!(signature.arguments.len(), 2);
        assert_eq!(signature.arguments[0].name.as_deref(), Some("dx"));
        assert_eq!(
            signature.arguments[1].default_value.as_deref(),
            Some("QPoint(0, 0)")
        );
    }

    #[test]
    fn test_parse_signature_operators() {
        let signature = parse_signature("operator()(int)").unwrap();
        assert_eq!(signature.name, "operator()");
        assert_eq!(signature.arguments.len(), 1);

        let signature = parse_signature("operator==(const Point&)").unwrap();
        assert_eq!(signature.name, "operator==");
    }

    #[test]
    fn test_normalize_signature() {
        assert_eq!(
            normalize_signature("foo ( const QString & s , unsigned  int ) const"),
            "foo(const QString&s,unsigned int)const"
        );
    }
}
