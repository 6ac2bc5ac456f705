//! Helper functions: a small sandboxed scripting language.
//!
//! Each entry of a template's `helpers:` section is a snippet defining
//! exactly one function with the entry's name:
//!
//! ```text
//! def add(a, b):
//!     joined = a.upper() + b
//!     return joined
//! ```
//!
//! Grammar (informal):
//! ```text
//! helper    = "def" IDENT "(" [IDENT ("," IDENT)*] ")" ":" statement+
//! statement = "return" [expr] | IDENT "=" expr | expr
//! expr      = postfix ("+" postfix)*
//! postfix   = primary ("." IDENT ["(" args ")"] | "[" expr "]")*
//! primary   = STRING | NUMBER | "True" | "False" | "None"
//!           | IDENT ["(" args ")"] | "(" expr ")" | "[" args "]"
//! ```
//!
//! Statements are separated by newlines or `;`. Indentation is not
//! significant since a snippet holds a single function. Nothing in the
//! language reaches the host: the only ambient bindings are `agent` (the
//! active agent) and `nexus` (agent and participant lookups).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use nexus_core::{Agent, Nexus};
use tracing::debug;

use crate::TemplateError;
use crate::engine::ask_agent;

/// Ambient bindings visible to helper code.
#[derive(Clone)]
pub struct HelperEnv {
    pub agent: Arc<dyn Agent>,
    pub nexus: Arc<dyn Nexus>,
    /// Bound on each `agent.get_semantic_response` call made by a helper.
    pub agent_timeout: Duration,
}

/// The helpers compiled for one template execution.
pub struct HelperSet {
    functions: HashMap<String, Function>,
    env: HelperEnv,
}

impl HelperSet {
    /// Compile every snippet. Fails on the first snippet that does not
    /// define exactly one function named after its key.
    pub fn compile(
        sources: &BTreeMap<String, String>,
        env: HelperEnv,
    ) -> Result<Self, TemplateError> {
        let mut functions = HashMap::with_capacity(sources.len());
        for (name, source) in sources {
            let function = compile_function(source).map_err(|reason| {
                TemplateError::HelperCompilation {
                    name: name.clone(),
                    reason,
                }
            })?;
            if &function.name != name {
                return Err(TemplateError::HelperCompilation {
                    name: name.clone(),
                    reason: format!("snippet defines '{}', expected '{name}'", function.name),
                });
            }
            functions.insert(name.clone(), function);
        }
        Ok(Self { functions, env })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Helper names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call a helper positionally. Missing trailing parameters bind to `""`.
    pub async fn call(&self, name: &str, args: Vec<String>) -> Result<String, TemplateError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| execution_error(name, "helper is not defined"))?;

        if args.len() > function.params.len() {
            return Err(execution_error(
                name,
                format!(
                    "{name}() takes {} positional argument(s) but {} were given",
                    function.params.len(),
                    args.len()
                ),
            ));
        }

        let mut locals = HashMap::new();
        locals.insert("agent".to_string(), Value::Agent(self.env.agent.clone()));
        locals.insert("nexus".to_string(), Value::Nexus);
        let mut args = args.into_iter();
        for param in &function.params {
            locals.insert(param.clone(), Value::Str(args.next().unwrap_or_default()));
        }

        let mut frame = Frame {
            helper: name,
            env: &self.env,
            locals,
        };
        let result = run(&mut frame, &function.body).await?;
        debug!(helper = name, result = %result, "Helper returned");
        Ok(result.to_string())
    }
}

fn execution_error(name: &str, reason: impl Into<String>) -> TemplateError {
    TemplateError::HelperExecution {
        name: name.to_string(),
        reason: reason.into(),
    }
}

// ─── Values ──────────────────────────────────────────────────────────

#[derive(Clone)]
enum Value {
    None,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    Agent(Arc<dyn Agent>),
    Nexus,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Num(_) => "number",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Agent(_) => "agent",
            Value::Nexus => "nexus",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Agent(agent) => f.write_str(agent.name()),
            Value::Nexus => f.write_str("nexus"),
        }
    }
}

// ─── Syntax tree ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Function {
    name: String,
    params: Vec<String>,
    body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
enum Stmt {
    Return(Expr),
    Assign(String, Expr),
    Expr(Expr),
}

#[derive(Debug, Clone)]
enum Expr {
    None,
    Bool(bool),
    Num(f64),
    Str(String),
    Name(String),
    List(Vec<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Attr(Box<Expr>, String),
    Call(String, Vec<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
}

// ─── Lexer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Def,
    Return,
    True,
    False,
    None,
    Ident(String),
    Str(String),
    Num(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Plus,
    Assign,
    Newline,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    // Newlines inside brackets do not end a statement.
    let mut nesting = 0usize;

    while let Some(&c) = chars.peek() {
        let token = match c {
            '\n' | ';' => {
                chars.next();
                if c == '\n' {
                    line += 1;
                }
                if nesting > 0 {
                    continue;
                }
                Token::Newline
            }
            ' ' | '\t' | '\r' => {
                chars.next();
                continue;
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
                continue;
            }
            '(' | '[' => {
                chars.next();
                nesting += 1;
                if c == '(' { Token::LParen } else { Token::LBracket }
            }
            ')' | ']' => {
                chars.next();
                nesting = nesting.saturating_sub(1);
                if c == ')' { Token::RParen } else { Token::RBracket }
            }
            ',' => {
                chars.next();
                Token::Comma
            }
            ':' => {
                chars.next();
                Token::Colon
            }
            '.' => {
                chars.next();
                Token::Dot
            }
            '+' => {
                chars.next();
                Token::Plus
            }
            '=' => {
                chars.next();
                Token::Assign
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(escaped) => s.push(escaped),
                            None => return Err(format!("unterminated string literal on line {line}")),
                        },
                        Some(ch) if ch == quote => break,
                        Some('\n') | None => {
                            return Err(format!("unterminated string literal on line {line}"));
                        }
                        Some(ch) => s.push(ch),
                    }
                }
                Token::Str(s)
            }
            _ if c.is_ascii_digit() || c == '-' => {
                let mut num_str = String::new();
                num_str.push(c);
                chars.next();
                while let Some(&nc) = chars.peek() {
                    if nc.is_ascii_digit() || nc == '.' {
                        num_str.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match num_str.parse::<f64>() {
                    Ok(n) => Token::Num(n),
                    Err(_) => return Err(format!("invalid number '{num_str}' on line {line}")),
                }
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&wc) = chars.peek() {
                    if wc.is_alphanumeric() || wc == '_' {
                        word.push(wc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "def" => Token::Def,
                    "return" => Token::Return,
                    "True" => Token::True,
                    "False" => Token::False,
                    "None" => Token::None,
                    _ => Token::Ident(word),
                }
            }
            _ => return Err(format!("unexpected character '{c}' on line {line}")),
        };
        tokens.push(Spanned { token, line });
    }

    Ok(tokens)
}

// ─── Parser ──────────────────────────────────────────────────────────

fn compile_function(source: &str) -> Result<Function, String> {
    let tokens = tokenize(source)?;
    let mut parser = ScriptParser { tokens, pos: 0 };
    parser.function()
}

struct ScriptParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ScriptParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        token
    }

    fn error(&self, expected: &str) -> String {
        match self.tokens.get(self.pos) {
            Some(s) => format!("expected {expected}, found {:?} on line {}", s.token, s.line),
            None => format!("expected {expected}, found end of input"),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), String> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    fn function(&mut self) -> Result<Function, String> {
        self.skip_newlines();
        match self.peek() {
            None => return Err("snippet does not define a function".into()),
            Some(Token::Def) => self.pos += 1,
            Some(_) => return Err(self.error("'def'")),
        }

        let name = self.ident()?;
        self.expect(Token::LParen, "'('")?;
        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                params.push(self.ident()?);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        self.expect(Token::Colon, "':'")?;

        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                None => break,
                Some(Token::Def) => {
                    return Err("snippet defines more than one function".into());
                }
                Some(_) => {
                    body.push(self.statement()?);
                    match self.peek() {
                        None | Some(Token::Newline) => {}
                        Some(_) => return Err(self.error("end of statement")),
                    }
                }
            }
        }

        if body.is_empty() {
            return Err(format!("function '{name}' has an empty body"));
        }

        Ok(Function { name, params, body })
    }

    fn statement(&mut self) -> Result<Stmt, String> {
        if self.peek() == Some(&Token::Return) {
            self.pos += 1;
            return match self.peek() {
                None | Some(Token::Newline) => Ok(Stmt::Return(Expr::None)),
                Some(_) => Ok(Stmt::Return(self.expr()?)),
            };
        }

        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (
            self.peek(),
            self.tokens.get(self.pos + 1).map(|s| &s.token),
        ) {
            let name = name.clone();
            self.pos += 2;
            return Ok(Stmt::Assign(name, self.expr()?));
        }

        Ok(Stmt::Expr(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut left = self.postfix()?;
        while self.peek() == Some(&Token::Plus) {
            self.pos += 1;
            let right = self.postfix()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if self.peek() == Some(&Token::LParen) {
                        self.pos += 1;
                        let args = self.args(Token::RParen)?;
                        expr = Expr::Method(Box::new(expr), name, args);
                    } else {
                        expr = Expr::Attr(Box::new(expr), name);
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let expected = self.error("an expression");
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::None) => Ok(Expr::None),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args(Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::LBracket) => Ok(Expr::List(self.args(Token::RBracket)?)),
            _ => Err(expected),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn args(&mut self, close: Token) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.pos += 1;
                return Ok(args);
            }
            args.push(self.expr()?);
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                Some(t) if *t == close => {}
                _ => return Err(self.error("',' or closing bracket")),
            }
        }
    }
}

// ─── Interpreter ─────────────────────────────────────────────────────

struct Frame<'e> {
    helper: &'e str,
    env: &'e HelperEnv,
    locals: HashMap<String, Value>,
}

async fn run(frame: &mut Frame<'_>, body: &[Stmt]) -> Result<Value, TemplateError> {
    for stmt in body {
        match stmt {
            Stmt::Return(expr) => return eval(frame, expr).await,
            Stmt::Assign(name, expr) => {
                let value = eval(frame, expr).await?;
                frame.locals.insert(name.clone(), value);
            }
            Stmt::Expr(expr) => {
                eval(frame, expr).await?;
            }
        }
    }
    Ok(Value::None)
}

fn eval<'f, 'e: 'f>(
    frame: &'f Frame<'e>,
    expr: &'f Expr,
) -> BoxFuture<'f, Result<Value, TemplateError>> {
    Box::pin(async move {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Name(name) => frame
                .locals
                .get(name)
                .cloned()
                .ok_or_else(|| frame.fail(format!("name '{name}' is not defined"))),
            Expr::List(items) => Ok(Value::List(eval_all(frame, items).await?)),
            Expr::Add(left, right) => {
                let left = eval(frame, left).await?;
                let right = eval(frame, right).await?;
                frame.add(left, right)
            }
            Expr::Index(target, index) => {
                let target = eval(frame, target).await?;
                let index = eval(frame, index).await?;
                frame.index(target, index)
            }
            Expr::Attr(target, name) => {
                let target = eval(frame, target).await?;
                frame.attr(target, name)
            }
            Expr::Call(name, args) => {
                let args = eval_all(frame, args).await?;
                frame.builtin(name, args)
            }
            Expr::Method(target, name, args) => {
                let target = eval(frame, target).await?;
                let args = eval_all(frame, args).await?;
                frame.method(target, name, args).await
            }
        }
    })
}

async fn eval_all(frame: &Frame<'_>, exprs: &[Expr]) -> Result<Vec<Value>, TemplateError> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        values.push(eval(frame, expr).await?);
    }
    Ok(values)
}

impl Frame<'_> {
    fn fail(&self, reason: impl Into<String>) -> TemplateError {
        execution_error(self.helper, reason)
    }

    fn add(&self, left: Value, right: Value) -> Result<Value, TemplateError> {
        match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (a, b) => Err(self.fail(format!(
                "unsupported operand types for +: '{}' and '{}'",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn index(&self, target: Value, index: Value) -> Result<Value, TemplateError> {
        let Value::Num(n) = index else {
            return Err(self.fail(format!("indices must be numbers, not {}", index.type_name())));
        };
        if n.fract() != 0.0 {
            return Err(self.fail("indices must be integers"));
        }
        let i = n as i64;
        let pick = |len: usize| -> Option<usize> {
            let idx = if i < 0 { len as i64 + i } else { i };
            (0..len as i64).contains(&idx).then_some(idx as usize)
        };

        match target {
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                pick(chars.len())
                    .map(|idx| Value::Str(chars[idx].to_string()))
                    .ok_or_else(|| self.fail("string index out of range"))
            }
            Value::List(items) => pick(items.len())
                .map(|idx| items[idx].clone())
                .ok_or_else(|| self.fail("list index out of range")),
            other => Err(self.fail(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    fn attr(&self, target: Value, name: &str) -> Result<Value, TemplateError> {
        match (&target, name) {
            (Value::Agent(agent), "name") => Ok(Value::Str(agent.name().to_string())),
            (Value::Agent(agent), "persona") => Ok(Value::Str(agent.persona().to_string())),
            _ => Err(self.fail(format!(
                "'{}' object has no attribute '{name}'",
                target.type_name()
            ))),
        }
    }

    fn builtin(&self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        match (name, args.as_slice()) {
            ("len", [Value::Str(s)]) => Ok(Value::Num(s.chars().count() as f64)),
            ("len", [Value::List(items)]) => Ok(Value::Num(items.len() as f64)),
            ("str", [value]) => Ok(Value::Str(value.to_string())),
            ("len" | "str", _) => Err(self.fail(format!(
                "{name}() got unsupported arguments ({})",
                describe(&args)
            ))),
            _ => Err(self.fail(format!("name '{name}' is not defined"))),
        }
    }

    async fn method(
        &self,
        target: Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, TemplateError> {
        match target {
            Value::Str(s) => self.str_method(&s, name, &args),
            Value::Agent(agent) => match (name, args.as_slice()) {
                ("get_semantic_response", [Value::Str(persona), Value::Str(prompt)]) => {
                    let reply =
                        ask_agent(agent.as_ref(), persona, prompt, self.env.agent_timeout).await?;
                    Ok(Value::Str(reply))
                }
                _ => Err(self.no_method("agent", name, &args)),
            },
            Value::Nexus => self.nexus_method(name, &args),
            other => Err(self.no_method(other.type_name(), name, &args)),
        }
    }

    fn str_method(&self, s: &str, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
        let value = match (name, args) {
            ("upper", []) => Value::Str(s.to_uppercase()),
            ("lower", []) => Value::Str(s.to_lowercase()),
            ("strip", []) => Value::Str(s.trim().to_string()),
            ("lstrip", []) => Value::Str(s.trim_start().to_string()),
            ("rstrip", []) => Value::Str(s.trim_end().to_string()),
            ("title", []) => Value::Str(title_case(s)),
            ("capitalize", []) => Value::Str(capitalize(s)),
            ("replace", [Value::Str(from), Value::Str(to)]) => {
                Value::Str(s.replace(from.as_str(), to))
            }
            ("split", []) => Value::List(
                s.split_whitespace()
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
            ),
            ("split", [Value::Str(sep)]) => {
                if sep.is_empty() {
                    return Err(self.fail("empty separator"));
                }
                Value::List(
                    s.split(sep.as_str())
                        .map(|part| Value::Str(part.to_string()))
                        .collect(),
                )
            }
            ("join", [Value::List(items)]) => Value::Str(
                items
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(s),
            ),
            ("startswith", [Value::Str(prefix)]) => Value::Bool(s.starts_with(prefix.as_str())),
            ("endswith", [Value::Str(suffix)]) => Value::Bool(s.ends_with(suffix.as_str())),
            _ => return Err(self.no_method("str", name, args)),
        };
        Ok(value)
    }

    fn nexus_method(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
        let nexus = &self.env.nexus;
        let strings = |items: Vec<String>| Value::List(items.into_iter().map(Value::Str).collect());

        match (name, args) {
            ("get_agent", [Value::Str(agent_name)]) => Ok(nexus
                .get_agent(agent_name)
                .map(Value::Agent)
                .unwrap_or(Value::None)),
            ("get_agent_names", []) => Ok(strings(nexus.agent_names())),
            ("get_participants", []) => Ok(strings(
                nexus.participants().into_iter().map(|p| p.username).collect(),
            )),
            ("get_participant_names", []) => Ok(strings(
                nexus
                    .participants()
                    .into_iter()
                    .map(|p| p.display_name)
                    .collect(),
            )),
            _ => Err(self.no_method("nexus", name, args)),
        }
    }

    fn no_method(&self, type_name: &str, name: &str, args: &[Value]) -> TemplateError {
        self.fail(format!(
            "'{type_name}' object has no method '{name}' taking ({})",
            describe(args)
        ))
    }
}

fn describe(args: &[Value]) -> String {
    args.iter()
        .map(Value::type_name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
