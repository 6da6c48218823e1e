use super::lexer::{Spanned, Token, tokenize};
use crate::error::EvalError;

/// Deepest nesting a formula may use, counting parentheses, unary minus,
/// ternary branches, call arguments and chained binary operators
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Shl,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// Named helpers callable from a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Lsb,
    Msb,
    Bits,
    Signed16,
    Compose32,
    Round,
}

impl Helper {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "lsb" => Some(Helper::Lsb),
            "msb" => Some(Helper::Msb),
            "bits" => Some(Helper::Bits),
            "signed16" => Some(Helper::Signed16),
            "compose32" => Some(Helper::Compose32),
            "round" => Some(Helper::Round),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Helper::Lsb => "lsb",
            Helper::Msb => "msb",
            Helper::Bits => "bits",
            Helper::Signed16 => "signed16",
            Helper::Compose32 => "compose32",
            Helper::Round => "round",
        }
    }

    /// Accepted argument counts (inclusive)
    fn arity(self) -> (usize, usize) {
        match self {
            Helper::Lsb | Helper::Msb | Helper::Signed16 => (1, 1),
            Helper::Bits => (2, 3),
            Helper::Compose32 => (2, 2),
            Helper::Round => (1, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Register(u16),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(Helper, Vec<Expr>),
}

impl Expr {
    /// Collect every register the expression reads, in source order
    pub fn registers(&self, out: &mut Vec<u16>) {
        match self {
            Expr::Int(_) | Expr::Float(_) => {}
            Expr::Register(r) => out.push(*r),
            Expr::Neg(inner) => inner.registers(out),
            Expr::Binary(_, l, r) => {
                l.registers(out);
                r.registers(out);
            }
            Expr::Ternary(c, t, e) => {
                c.registers(out);
                t.registers(out);
                e.registers(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.registers(out)),
        }
    }
}

/// Parse formula text into an expression tree
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(EvalError::syntax(source, "empty formula"));
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek_spanned() {
        return Err(parser.error_at(extra.offset, "unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, offset: usize, message: &str) -> EvalError {
        EvalError::syntax(self.source, format!("{} at offset {}", message, offset))
    }

    fn error_here(&self, message: &str) -> EvalError {
        match self.peek_spanned() {
            Some(s) => self.error_at(s.offset, message),
            None => EvalError::syntax(self.source, format!("{} at end of input", message)),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(&format!("expected {}", what)))
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error_here("formula nested too deeply"));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let expr = self.ternary();
        self.depth -= 1;
        expr
    }

    fn ternary(&mut self) -> Result<Expr, EvalError> {
        let cond = self.compare()?;
        if self.peek() == Some(&Token::Question) {
            self.pos += 1;
            let then = self.expr()?;
            self.expect(Token::Colon, "':'")?;
            let otherwise = self.expr()?;
            return Ok(Expr::Ternary(
                Box::new(cond),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Ok(cond)
    }

    fn compare(&mut self) -> Result<Expr, EvalError> {
        let left = self.shift()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            Some(Token::EqEq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.shift()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn shift(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.additive()?;
        let mut chained = 0;
        while self.peek() == Some(&Token::Shl) {
            self.enter()?;
            chained += 1;
            self.pos += 1;
            let right = self.additive()?;
            left = Expr::Binary(BinOp::Shl, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.term()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.enter()?;
            chained += 1;
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        let mut chained = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.enter()?;
            chained += 1;
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        if self.peek() == Some(&Token::Minus) {
            self.enter()?;
            self.pos += 1;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let offset = self.peek_spanned().map(|s| s.offset);
        match self.advance() {
            Some(Token::Int(v)) => Ok(Expr::Int(v)),
            Some(Token::Float(v)) => Ok(Expr::Float(v)),
            Some(Token::Register(r)) => Ok(Expr::Register(r)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let offset = offset.unwrap_or_default();
                let helper = Helper::from_name(&name)
                    .ok_or_else(|| self.error_at(offset, &format!("unknown function '{}'", name)))?;
                self.call(helper, offset)
            }
            Some(_) => Err(self.error_at(offset.unwrap_or_default(), "unexpected token")),
            None => Err(self.error_here("unexpected end of formula")),
        }
    }

    fn call(&mut self, helper: Helper, offset: usize) -> Result<Expr, EvalError> {
        self.expect(Token::LParen, "'(' after function name")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.expr()?);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;

        let (min, max) = helper.arity();
        if args.len() < min || args.len() > max {
            return Err(self.error_at(
                offset,
                &format!(
                    "{}() takes {} argument(s), got {}",
                    helper.name(),
                    if min == max {
                        min.to_string()
                    } else {
                        format!("{}-{}", min, max)
                    },
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call(helper, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinOp, l: Expr, r: Expr) -> Expr {
        Expr::Binary(op, Box::new(l), Box::new(r))
    }

    #[test]
    fn test_precedence_mul_over_add() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            bin(
                BinOp::Add,
                Expr::Int(1),
                bin(BinOp::Mul, Expr::Int(2), Expr::Int(3))
            )
        );
    }

    #[test]
    fn test_shift_binds_looser_than_add() {
        // 1 << 2 + 1 == 1 << 3
        assert_eq!(
            parse("1 << 2 + 1").unwrap(),
            bin(
                BinOp::Shl,
                Expr::Int(1),
                bin(BinOp::Add, Expr::Int(2), Expr::Int(1))
            )
        );
    }

    #[test]
    fn test_left_associative_division() {
        assert_eq!(
            parse("8 / 4 / 2").unwrap(),
            bin(
                BinOp::Div,
                bin(BinOp::Div, Expr::Int(8), Expr::Int(4)),
                Expr::Int(2)
            )
        );
    }

    #[test]
    fn test_ternary_is_loosest() {
        let expr = parse("[4132] > 65000 ? 25 : [4132]/10").unwrap();
        assert!(matches!(expr, Expr::Ternary(..)));
    }

    #[test]
    fn test_collect_registers() {
        let expr = parse("round((([4350]<<16)+[4349])/60/60/24, 2)").unwrap();
        let mut regs = Vec::new();
        expr.registers(&mut regs);
        assert_eq!(regs, vec![4350, 4349]);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "",
            "1 +",
            "(1 + 2",
            "1 2",
            "foo(1)",
            "lsb()",
            "lsb(1, 2)",
            "bits(1)",
            "1 ? 2",
            "1 < 2 < 3",
        ] {
            let err = parse(bad).unwrap_err();
            assert_eq!(err.kind(), "FormulaSyntaxError", "formula {:?}", bad);
        }
    }

    #[test]
    fn test_depth_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_DEPTH - 1)).is_ok());
        assert_eq!(
            parse(&nested(MAX_DEPTH)).unwrap_err().kind(),
            "FormulaSyntaxError"
        );
        assert!(parse(&format!("{}1", "-".repeat(MAX_DEPTH * 2))).is_err());
    }
}
