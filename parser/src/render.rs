//! FILENAME: core/parser/src/render.rs
//! PURPOSE: Pretty-prints an `Expression` back into formula source text.
//! CONTEXT: `Cell::text()` for a formula cell is defined as `"=" + canonical_expression()`;
//! this module produces that canonical, minimally-parenthesized rendering.

use crate::ast::{BinaryOperator, Expression};

/// Renders `expr` as formula source, inserting parentheses only where the
/// grammar in `parser.rs` would otherwise re-associate the expression
/// differently.
pub fn render(expr: &Expression) -> String {
    render_at(expr, 0)
}

/// Binding power of an expression node: higher binds tighter. Matches the
/// precedence climb in `parser.rs` (comparison < additive < multiplicative
/// < unary-negate < power < atom).
fn level(expr: &Expression) -> u8 {
    match expr {
        Expression::Literal(_)
        | Expression::CellRef { .. }
        | Expression::Range { .. }
        | Expression::FunctionCall { .. } => 6,
        Expression::UnaryOp { .. } => 4,
        Expression::BinaryOp { op, .. } => binary_level(*op),
    }
}

fn binary_level(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterEqual => 1,
        BinaryOperator::Add | BinaryOperator::Subtract => 2,
        BinaryOperator::Multiply | BinaryOperator::Divide => 3,
        BinaryOperator::Power => 5,
    }
}

fn render_at(expr: &Expression, min_level: u8) -> String {
    let rendered = match expr {
        Expression::Literal(n) => format!("{}", n),
        Expression::CellRef { col, row } => format!("{}{}", col, row),
        Expression::Range { start, end } => {
            format!("{}:{}", render_at(start, 0), render_at(end, 0))
        }
        Expression::UnaryOp { op, operand } => format!("{}{}", op, render_at(operand, 4)),
        Expression::BinaryOp { left, op, right } => {
            let lvl = binary_level(*op);
            // `^` is right-associative: `a^b^c == a^(b^c)`, so the left
            // operand needs strictly tighter binding to render unparenthesized.
            let (left_req, right_req) = if matches!(op, BinaryOperator::Power) {
                (lvl + 1, lvl)
            } else {
                (lvl, lvl + 1)
            };
            format!(
                "{}{}{}",
                render_at(left, left_req),
                op,
                render_at(right, right_req)
            )
        }
        Expression::FunctionCall { func, args } => {
            let rendered_args: Vec<String> = args.iter().map(|a| render_at(a, 0)).collect();
            format!("{}({})", func.name(), rendered_args.join(","))
        }
    };

    if level(expr) < min_level {
        format!("({})", rendered)
    } else {
        rendered
    }
}
