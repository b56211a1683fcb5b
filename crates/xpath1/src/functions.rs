//! Built-in implementations of the XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;
use std::ops::RangeInclusive;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "last" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_size as f64))
        }
        "position" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Number(e_ctx.context_position as f64))
        }
        "count" => func_count(args),
        "local-name" => func_local_name(args, e_ctx),
        "name" => func_name(args, e_ctx),

        // String
        "string" => func_string(args, e_ctx),
        "concat" => func_concat(args),
        "starts-with" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.starts_with(&s2)))
        }
        "contains" => {
            let (s1, s2) = two_strings(name, args)?;
            Ok(XPathValue::Boolean(s1.contains(&s2)))
        }
        "substring-before" => {
            let (s1, s2) = two_strings(name, args)?;
            let before = s1.find(&s2).map(|i| &s1[..i]).unwrap_or_default();
            Ok(XPathValue::String(before.to_string()))
        }
        "substring-after" => {
            let (s1, s2) = two_strings(name, args)?;
            let after = s1.find(&s2).map(|i| &s1[i + s2.len()..]).unwrap_or_default();
            Ok(XPathValue::String(after.to_string()))
        }
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "not" => {
            let arg = single(name, args)?;
            Ok(XPathValue::Boolean(!arg.to_bool()))
        }
        "true" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(true))
        }
        "false" => {
            check_arity(name, &args, 0..=0)?;
            Ok(XPathValue::Boolean(false))
        }
        "boolean" => {
            let arg = single(name, args)?;
            Ok(XPathValue::Boolean(arg.to_bool()))
        }

        // Number
        "number" => func_number(args, e_ctx),
        "sum" => func_sum(args),
        "floor" => Ok(XPathValue::Number(single(name, args)?.to_number().floor())),
        "ceiling" => Ok(XPathValue::Number(single(name, args)?.to_number().ceil())),
        "round" => func_round(args),

        _ => Err(XPathError::function(name, "Unknown XPath function")),
    }
}

fn check_arity<N>(
    name: &str,
    args: &[XPathValue<N>],
    expected: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if expected.contains(&args.len()) {
        return Ok(());
    }
    let message = if expected.start() == expected.end() {
        format!("Expected {} argument(s), got {}", expected.start(), args.len())
    } else {
        format!(
            "Expected {} to {} arguments, got {}",
            expected.start(),
            expected.end(),
            args.len()
        )
    };
    Err(XPathError::function(name, message))
}

fn single<N>(name: &str, args: Vec<XPathValue<N>>) -> Result<XPathValue<N>, XPathError> {
    check_arity(name, &args, 1..=1)?;
    args.into_iter()
        .next()
        .ok_or_else(|| XPathError::function(name, "Missing argument"))
}

fn two_strings<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
) -> Result<(String, String), XPathError> {
    check_arity(name, &args, 2..=2)?;
    Ok((args[0].to_string(), args[1].to_string()))
}

/// The optional single argument of `string()`, `string-length()` and
/// `normalize-space()`, defaulting to the context node.
fn string_or_context<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<String, XPathError> {
    check_arity(name, &args, 0..=1)?;
    Ok(match args.into_iter().next() {
        Some(arg) => arg.to_string(),
        None => e_ctx.context_node.string_value(),
    })
}

/// The optional node-set argument of `name()` and `local-name()`: its first
/// node, or the context node.
fn node_or_context<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<Option<N>, XPathError> {
    check_arity(name, &args, 0..=1)?;
    match args.into_iter().next() {
        None => Ok(Some(e_ctx.context_node)),
        Some(arg) => {
            let nodes = arg.into_node_set(&format!("The argument of {}()", name))?;
            Ok(nodes.into_iter().min())
        }
    }
}

fn func_count<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let nodes = single("count", args)?.into_node_set("The argument of count()")?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_local_name<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let name = node_or_context("local-name", args, e_ctx)?
        .and_then(|n| n.name().map(|q| q.local_part.to_string()))
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

fn func_name<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let name = node_or_context("name", args, e_ctx)?
        .and_then(|n| {
            n.name().map(|q| match q.prefix {
                Some(prefix) => format!("{}:{}", prefix, q.local_part),
                None => q.local_part.to_string(),
            })
        })
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

fn func_string<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    Ok(XPathValue::String(string_or_context("string", args, e_ctx)?))
}

fn func_concat<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() < 2 {
        return Err(XPathError::function(
            "concat",
            format!("Expected at least 2 arguments, got {}", args.len()),
        ));
    }
    let result = args.iter().map(|v| v.to_string()).collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring", &args, 2..=3)?;
    let s = args[0].to_string();

    // Positions are rounded and compared as floats so NaN and infinities
    // select nothing or everything as XPath prescribes.
    let first = xpath_round(args[1].to_number());
    let last = match args.get(2) {
        Some(length) => first + xpath_round(length.to_number()),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64;
            (pos >= first && pos < last).then_some(c)
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_string_length<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = string_or_context("string-length", args, e_ctx)?;
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn func_normalize_space<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = string_or_context("normalize-space", args, e_ctx)?;
    Ok(XPathValue::String(
        s.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("translate", &args, 3..=3)?;
    let source = args[0].to_string();
    let from: Vec<char> = args[1].to_string().chars().collect();
    let to: Vec<char> = args[2].to_string().chars().collect();
    let result = source
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_number<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("number", &args, 0..=1)?;
    let n = match args.into_iter().next() {
        Some(arg) => arg.to_number(),
        None => string_to_number(&e_ctx.context_node.string_value()),
    };
    Ok(XPathValue::Number(n))
}

fn func_sum<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let nodes = single("sum", args)?.into_node_set("The argument of sum()")?;
    let sum = nodes
        .iter()
        .map(|node| string_to_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

fn func_round<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    Ok(XPathValue::Number(xpath_round(
        single("round", args)?.to_number(),
    )))
}

/// Rounds halves towards positive infinity, leaving NaN, infinities and zero untouched.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::engine::evaluate;
    use crate::parser::parse_expression;

    fn eval<'a>(tree: &'a MockTree, context: usize, xpath: &str) -> XPathValue<MockNode<'a>> {
        let ctx = EvaluationContext::new(tree.node(context), tree.root());
        evaluate(&parse_expression(xpath).unwrap(), &ctx).unwrap()
    }

    fn eval_str(tree: &MockTree, context: usize, xpath: &str) -> String {
        eval(tree, context, xpath).to_string()
    }

    #[test]
    fn test_string_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, 0, "concat('a', 'b', 1)"), "ab1");
        assert_eq!(eval_str(&tree, 0, "starts-with('connection', 'conn')"), "true");
        assert_eq!(eval_str(&tree, 0, "contains('connection', 'nect')"), "true");
        assert_eq!(eval_str(&tree, 0, "substring-before('1999/04/01', '/')"), "1999");
        assert_eq!(eval_str(&tree, 0, "substring-after('1999/04/01', '/')"), "04/01");
        assert_eq!(eval_str(&tree, 0, "translate('bar', 'abc', 'ABC')"), "BAr");
        assert_eq!(eval_str(&tree, 0, "translate('--aaa--', 'abc-', 'ABC')"), "AAA");
        assert_eq!(eval_str(&tree, 0, "normalize-space('  a   b ')"), "a b");
        assert_eq!(eval_str(&tree, 0, "string-length('héllo')"), "5");
    }

    #[test]
    fn test_substring_edge_cases() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, 0, "substring('12345', 2, 3)"), "234");
        assert_eq!(eval_str(&tree, 0, "substring('12345', 2)"), "2345");
        assert_eq!(eval_str(&tree, 0, "substring('12345', 1.5, 2.6)"), "234");
        assert_eq!(eval_str(&tree, 0, "substring('12345', 0, 3)"), "12");
        assert_eq!(eval_str(&tree, 0, "substring('12345', 0 div 0, 3)"), "");
        assert_eq!(eval_str(&tree, 0, "substring('12345', -42, 1 div 0)"), "12345");
    }

    #[test]
    fn test_context_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, 13, "name()"), "app:item");
        assert_eq!(eval_str(&tree, 13, "local-name()"), "item");
        assert_eq!(eval_str(&tree, 13, "string()"), "text");
        assert_eq!(eval_str(&tree, 0, "name(//add)"), "add");
        assert_eq!(eval_str(&tree, 0, "name(//nothing)"), "");
        assert_eq!(eval_str(&tree, 0, "count(//add)"), "2");
        assert_eq!(eval_str(&tree, 0, "//add[position() = last()]/@key"), "b");
    }

    #[test]
    fn test_number_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, 0, "sum(//add/@value)"), "3");
        assert_eq!(eval_str(&tree, 0, "number('12')"), "12");
        assert_eq!(eval_str(&tree, 0, "number('x')"), "NaN");
        assert_eq!(eval_str(&tree, 0, "floor(2.7)"), "2");
        assert_eq!(eval_str(&tree, 0, "ceiling(2.1)"), "3");
        assert_eq!(eval_str(&tree, 0, "round(2.5)"), "3");
        assert_eq!(eval_str(&tree, 0, "round(-2.5)"), "-2");
    }

    #[test]
    fn test_boolean_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, 0, "not(//nothing)"), "true");
        assert_eq!(eval_str(&tree, 0, "boolean(//add)"), "true");
        assert_eq!(eval_str(&tree, 0, "true() and not(false())"), "true");
    }

    #[test]
    fn test_function_errors() {
        let tree = create_test_tree();
        let ctx = EvaluationContext::new(tree.root(), tree.root());
        let run = |xpath: &str| evaluate(&parse_expression(xpath).unwrap(), &ctx);

        assert!(matches!(
            run("no-such-function()"),
            Err(XPathError::FunctionError { .. })
        ));
        assert!(matches!(
            run("contains('a')"),
            Err(XPathError::FunctionError { .. })
        ));
        assert!(matches!(run("count('a')"), Err(XPathError::TypeError(_))));
    }
}
