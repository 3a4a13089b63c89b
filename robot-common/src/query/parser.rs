use chumsky::prelude::*;

use super::{CmpOp, Expr, Literal, Operand};

/// Parser for the search expression language
///
/// Precedence, loosest first: `or`, `and`, `not`, then parenthesised
/// expressions, boolean constants and `path op operand` comparisons.
pub(crate) fn parser() -> impl Parser<char, Expr, Error = Simple<char>> {
    let ident = text::ident::<char, Simple<char>>();

    let path = ident
        .clone()
        .separated_by(just('.'))
        .at_least(1)
        .padded()
        .labelled("field");

    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('t').to('\t'),
    )));

    let string = just('"')
        .ignore_then(
            filter(|c: &char| *c != '\\' && *c != '"')
                .or(escape)
                .repeated(),
        )
        .then_ignore(just('"'))
        .collect::<String>()
        .labelled("string");

    let number = just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .try_map(
            |((sign, int_part), frac): ((Option<char>, String), Option<String>), span| {
                let mut literal = String::new();
                if sign.is_some() {
                    literal.push('-');
                }
                literal.push_str(&int_part);
                if let Some(frac) = frac {
                    literal.push('.');
                    literal.push_str(&frac);
                }
                literal
                    .parse::<f64>()
                    .map_err(|_| Simple::custom(span, "invalid number literal"))
            },
        )
        .labelled("number");

    let param = just('$')
        .ignore_then(ident.or_not())
        .map(|name| Operand::Param(format!("${}", name.unwrap_or_default())))
        .labelled("parameter");

    let operand = choice((
        string.map(|s| Operand::Value(Literal::Str(s))),
        number.map(|n| Operand::Value(Literal::Num(n))),
        text::keyword("true").to(Operand::Value(Literal::Bool(true))),
        text::keyword("false").to(Operand::Value(Literal::Bool(false))),
        param,
    ))
    .padded();

    let op = choice((
        just("==").to(CmpOp::Eq),
        just("!=").to(CmpOp::Ne),
        just("<=").to(CmpOp::Le),
        just(">=").to(CmpOp::Ge),
        just('<').to(CmpOp::Lt),
        just('>').to(CmpOp::Gt),
    ))
    .padded()
    .labelled("comparison operator");

    let comparison = path
        .then(op)
        .then(operand)
        .map(|((path, op), value)| Expr::Compare { path, op, value });

    recursive(|expr| {
        let primary = choice((
            expr.delimited_by(just('(').padded(), just(')').padded()),
            text::keyword("true").padded().to(Expr::Const(true)),
            text::keyword("false").padded().to(Expr::Const(false)),
            comparison,
        ));

        let unary = text::keyword("not")
            .padded()
            .repeated()
            .then(primary)
            .foldr(|_not, e| Expr::Not(Box::new(e)));

        let and = unary
            .clone()
            .then(text::keyword("and").padded().ignore_then(unary).repeated())
            .foldl(|lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)));

        and.clone()
            .then(text::keyword("or").padded().ignore_then(and).repeated())
            .foldl(|lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)))
    })
    .padded()
    .then_ignore(end())
}
