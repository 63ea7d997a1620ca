//! Source compiler for the mini8 processor.
//!
//! Accepts a tiny C-like language, one statement per `;`:
//!
//! ```text
//! int a = 5;        // declare a (next free register) and load it
//! a = 7;            // load an immediate
//! a = b;            // copy (LOAD a,#0 then ADD a,b)
//! a = a + b;        // ADD; the destination must be an operand
//! a = a - b;        // SUB; the destination must be the left operand
//! mem[2] = a;       // STORE
//! ```
//!
//! Instructions are laid out at consecutive word addresses from 0.

use std::collections::HashMap;

use super::encoding::{MAX_IMMEDIATE, Op, REGISTERS, WORD_BITS};
use crate::common::{CompileError, InstructionRecord, to_bit_string};

/// Kind of a lexical token.
#[derive(Clone, Debug, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Number(u64),
    Symbol(char),
}

/// A token with its 1-based source position.
#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

impl Token {
    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::at(message, self.line, self.column)
    }

    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(name) => format!("'{name}'"),
            TokenKind::Number(n) => format!("'{n}'"),
            TokenKind::Symbol(c) => format!("'{c}'"),
        }
    }
}

/// Splits source text into tokens, dropping whitespace and `//` comments.
fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();

    for (line_idx, line) in source.lines().enumerate() {
        let line_no = line_idx + 1;
        let code = line.find("//").map_or(line, |i| &line[..i]);
        let chars: Vec<(usize, char)> = code.char_indices().collect();
        let mut i = 0;

        while i < chars.len() {
            let (_, c) = chars[i];
            let column = i + 1;

            if c.is_whitespace() {
                i += 1;
            } else if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(ident),
                    line: line_no,
                    column,
                });
            } else if c.is_ascii_digit() {
                let start = i;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().map(|&(_, c)| c).collect();
                let value = digits.parse::<u64>().map_err(|_| {
                    CompileError::at(format!("number '{digits}' is too large"), line_no, column)
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    line: line_no,
                    column,
                });
            } else if "=+-;[]".contains(c) {
                tokens.push(Token {
                    kind: TokenKind::Symbol(c),
                    line: line_no,
                    column,
                });
                i += 1;
            } else {
                return Err(CompileError::at(
                    format!("unexpected character '{c}'"),
                    line_no,
                    column,
                ));
            }
        }
    }
    Ok(tokens)
}

/// Statement forms, chosen by the first token.
#[derive(Clone, Copy, Debug)]
enum Statement {
    Declaration,
    Store,
    Assignment,
}

/// Recursive-descent parser that emits mini8 operations directly.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Variable name → register number.
    vars: HashMap<String, u8>,
    memory_size: usize,
    ops: Vec<Op>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, CompileError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| self.eof_error())?;
        self.pos += 1;
        Ok(token)
    }

    fn eof_error(&self) -> CompileError {
        match self.tokens.last() {
            Some(last) => last.error("unexpected end of input"),
            None => CompileError::new("unexpected end of input"),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), CompileError> {
        let token = self.next()?;
        if token.kind == TokenKind::Symbol(symbol) {
            Ok(())
        } else {
            Err(token.error(format!("expected '{symbol}', found {}", token.describe())))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Token), CompileError> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Ident(name) => Ok((name.clone(), token.clone())),
            _ => Err(token.error(format!("expected a name, found {}", token.describe()))),
        }
    }

    fn expect_number(&mut self) -> Result<(u64, Token), CompileError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(n) => Ok((n, token)),
            _ => Err(token.error(format!("expected a number, found {}", token.describe()))),
        }
    }

    fn register_of(&self, name: &str, at: &Token) -> Result<u8, CompileError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| at.error(format!("undeclared variable '{name}'")))
    }

    fn immediate(value: u64, at: &Token) -> Result<u8, CompileError> {
        u8::try_from(value)
            .ok()
            .filter(|&v| v <= MAX_IMMEDIATE)
            .ok_or_else(|| at.error(format!("literal {value} is out of range 0..={MAX_IMMEDIATE}")))
    }

    fn parse_program(&mut self) -> Result<(), CompileError> {
        while let Some(token) = self.peek() {
            let statement = match &token.kind {
                TokenKind::Ident(word) if word == "int" => Statement::Declaration,
                TokenKind::Ident(word) if word == "mem" => Statement::Store,
                TokenKind::Ident(_) => Statement::Assignment,
                _ => {
                    return Err(token.error(format!(
                        "expected a statement, found {}",
                        token.describe()
                    )));
                }
            };
            match statement {
                Statement::Declaration => self.parse_declaration()?,
                Statement::Store => self.parse_store()?,
                Statement::Assignment => self.parse_assignment()?,
            }
        }
        Ok(())
    }

    /// `int NAME = NUMBER ;`
    fn parse_declaration(&mut self) -> Result<(), CompileError> {
        let _ = self.next()?;
        let (name, at) = self.expect_ident()?;
        if self.vars.contains_key(&name) {
            return Err(at.error(format!("variable '{name}' is already declared")));
        }
        let Ok(rd) = u8::try_from(self.vars.len()) else {
            return Err(at.error("out of registers"));
        };
        if rd as usize >= REGISTERS.len() {
            return Err(at.error(format!(
                "out of registers: only {} variables fit",
                REGISTERS.len()
            )));
        }
        let _ = self.vars.insert(name, rd);

        self.expect_symbol('=')?;
        let (value, at) = self.expect_number()?;
        let imm = Self::immediate(value, &at)?;
        self.expect_symbol(';')?;
        self.ops.push(Op::Load { rd, imm });
        Ok(())
    }

    /// `mem [ NUMBER ] = NAME ;`
    fn parse_store(&mut self) -> Result<(), CompileError> {
        let _ = self.next()?;
        self.expect_symbol('[')?;
        let (addr, at) = self.expect_number()?;
        if addr >= self.memory_size as u64 {
            return Err(at.error(format!(
                "address {addr} is outside memory of {} words",
                self.memory_size
            )));
        }
        self.expect_symbol(']')?;
        self.expect_symbol('=')?;
        let (name, at) = self.expect_ident()?;
        let rs = self.register_of(&name, &at)?;
        self.expect_symbol(';')?;
        self.ops.push(Op::Store {
            rs,
            addr: addr as u8,
        });
        Ok(())
    }

    /// `NAME = NUMBER ;` | `NAME = NAME ;` | `NAME = NAME (+|-) NAME ;`
    fn parse_assignment(&mut self) -> Result<(), CompileError> {
        let (dest, at) = self.expect_ident()?;
        let rd = self.register_of(&dest, &at)?;
        self.expect_symbol('=')?;

        let first = self.next()?;
        match &first.kind {
            TokenKind::Number(value) => {
                let imm = Self::immediate(*value, &first)?;
                self.expect_symbol(';')?;
                self.ops.push(Op::Load { rd, imm });
                Ok(())
            }
            TokenKind::Ident(lhs) => {
                let lhs_reg = self.register_of(lhs, &first)?;
                let op_token = self.next()?;
                match op_token.kind {
                    TokenKind::Symbol(';') => {
                        if lhs_reg != rd {
                            self.ops.push(Op::Load { rd, imm: 0 });
                            self.ops.push(Op::Add { rd, rs: lhs_reg });
                        }
                        Ok(())
                    }
                    TokenKind::Symbol(sym @ ('+' | '-')) => {
                        let (rhs, rhs_at) = self.expect_ident()?;
                        let rhs_reg = self.register_of(&rhs, &rhs_at)?;
                        self.expect_symbol(';')?;
                        let op = match sym {
                            '+' if lhs_reg == rd => Op::Add { rd, rs: rhs_reg },
                            '+' if rhs_reg == rd => Op::Add { rd, rs: lhs_reg },
                            '-' if lhs_reg == rd => Op::Sub { rd, rs: rhs_reg },
                            _ => {
                                return Err(first.error(format!(
                                    "'{dest}' must be the left operand of '{sym}'"
                                )));
                            }
                        };
                        self.ops.push(op);
                        Ok(())
                    }
                    _ => Err(op_token.error(format!(
                        "expected '+', '-' or ';', found {}",
                        op_token.describe()
                    ))),
                }
            }
            TokenKind::Symbol(_) => Err(first.error(format!(
                "expected a number or a name, found {}",
                first.describe()
            ))),
        }
    }
}

/// Compiles mini8 source into instruction records.
///
/// # Errors
///
/// Returns a `CompileError` with the line and column of the first problem.
pub fn compile(source: &str, memory_size: usize) -> Result<Vec<InstructionRecord>, CompileError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
        vars: HashMap::new(),
        memory_size,
        ops: Vec::new(),
    };
    parser.parse_program()?;

    Ok(parser
        .ops
        .iter()
        .enumerate()
        .map(|(address, op)| {
            InstructionRecord::new(
                address as u64,
                op.to_string(),
                to_bit_string(u64::from(op.encode()), WORD_BITS),
            )
        })
        .collect())
}
