//! Parsing of the `Transform` and `Locator` directive attributes.
//!
//! Both attributes share one syntax: a name, optionally followed by an
//! argument list in parentheses, e.g. `Replace`, `Match(name, path)` or
//! `Condition(@key='a' and @value!='')`. Values are parsed once into closed
//! enums so that unknown names are rejected before anything is mutated.

use crate::error::TransformError;
use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{map_opt, opt, rest},
    sequence::{delimited, preceded},
};
use xdt_dom::Element;
use xdt_xpath1::{Expression, parse_expression};

/// The edit a transform element asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformAction {
    Insert,
    InsertIfMissing,
    /// Inserts before the nodes selected by the expression, or before the
    /// locator matches when there is none.
    InsertBefore(Option<Expression>),
    InsertAfter(Option<Expression>),
    Replace,
    Remove,
    RemoveAll,
    /// Copies the transform element's attributes, restricted to the listed
    /// names when the list is not empty.
    SetAttributes(Vec<String>),
    /// Removes the listed attributes, or the transform element's own
    /// attribute names when the list is empty.
    RemoveAttributes(Vec<String>),
}

impl TransformAction {
    pub fn name(&self) -> &'static str {
        match self {
            TransformAction::Insert => "Insert",
            TransformAction::InsertIfMissing => "InsertIfMissing",
            TransformAction::InsertBefore(_) => "InsertBefore",
            TransformAction::InsertAfter(_) => "InsertAfter",
            TransformAction::Replace => "Replace",
            TransformAction::Remove => "Remove",
            TransformAction::RemoveAll => "RemoveAll",
            TransformAction::SetAttributes(_) => "SetAttributes",
            TransformAction::RemoveAttributes(_) => "RemoveAttributes",
        }
    }
}

/// How a transform element finds its counterparts among the source candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    /// Candidates whose listed attributes equal the transform element's.
    Match(Vec<String>),
    /// Candidates for which the predicate holds.
    Condition(Expression),
    /// Elements selected by an expression evaluated from the source context.
    XPath(Expression),
}

/// The directives found on one transform element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directives {
    pub action: Option<TransformAction>,
    pub locator: Option<Locator>,
}

/// Reads and parses the directive attributes of `element`.
pub fn read_directives(element: &Element, namespace: &str) -> Result<Directives, TransformError> {
    let element_name = element.name.to_string();
    let directive = |local: &str| {
        element
            .attributes
            .iter()
            .find(|attr| attr.name.is_in_namespace(namespace) && attr.name.local == local)
            .map(|attr| attr.value.as_str())
    };

    let action = directive("Transform")
        .map(|value| parse_action(value, &element_name))
        .transpose()?;
    let locator = directive("Locator")
        .map(|value| parse_locator(value, &element_name))
        .transpose()?;
    Ok(Directives { action, locator })
}

struct RawDirective<'s> {
    name: &'s str,
    argument: Option<&'s str>,
}

fn raw_directive(input: &str) -> IResult<&str, RawDirective<'_>> {
    let (i, name) = delimited(
        multispace0,
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        multispace0,
    )
    .parse(input)?;
    // The argument runs to the last closing parenthesis, so nested calls
    // like `Condition(contains(@a,'x'))` stay intact.
    let (i, argument) = opt(preceded(
        char('('),
        map_opt(rest, |r: &str| r.trim_end().strip_suffix(')')),
    ))
    .parse(i)?;
    Ok((i, RawDirective { name, argument }))
}

fn split_directive(value: &str) -> Result<RawDirective<'_>, TransformError> {
    let invalid = |message: &str| TransformError::InvalidDirective {
        value: value.to_string(),
        message: message.to_string(),
    };
    match raw_directive(value) {
        Ok((rest, raw)) if rest.trim().is_empty() => Ok(raw),
        Ok((rest, _)) => Err(invalid(&format!("unexpected '{}'", rest.trim()))),
        Err(_) => Err(invalid("expected a name with an optional argument list")),
    }
}

/// Splits a comma-separated list of attribute names.
fn name_list(value: &str, argument: &str) -> Result<Vec<String>, TransformError> {
    let names: Vec<String> = argument.split(',').map(|n| n.trim().to_string()).collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(TransformError::InvalidDirective {
            value: value.to_string(),
            message: "empty name in argument list".to_string(),
        });
    }
    Ok(names)
}

fn expression(element: &str, argument: &str) -> Result<Expression, TransformError> {
    parse_expression(argument).map_err(|source| TransformError::XPath {
        element: element.to_string(),
        source,
    })
}

pub fn parse_action(value: &str, element: &str) -> Result<TransformAction, TransformError> {
    let raw = split_directive(value)?;
    let no_argument = |action: TransformAction| match raw.argument {
        None => Ok(action),
        Some(_) => Err(TransformError::InvalidDirective {
            value: value.to_string(),
            message: format!("{} takes no arguments", action.name()),
        }),
    };
    let optional_names = || match raw.argument {
        Some(argument) if !argument.trim().is_empty() => name_list(value, argument),
        _ => Ok(Vec::new()),
    };
    let optional_xpath = || match raw.argument {
        Some(argument) if !argument.trim().is_empty() => expression(element, argument).map(Some),
        _ => Ok(None),
    };

    match raw.name {
        "Insert" => no_argument(TransformAction::Insert),
        "InsertIfMissing" => no_argument(TransformAction::InsertIfMissing),
        "InsertBefore" => Ok(TransformAction::InsertBefore(optional_xpath()?)),
        "InsertAfter" => Ok(TransformAction::InsertAfter(optional_xpath()?)),
        "Replace" => no_argument(TransformAction::Replace),
        "Remove" => no_argument(TransformAction::Remove),
        "RemoveAll" => no_argument(TransformAction::RemoveAll),
        "SetAttributes" => Ok(TransformAction::SetAttributes(optional_names()?)),
        "RemoveAttributes" => Ok(TransformAction::RemoveAttributes(optional_names()?)),
        other => Err(TransformError::UnsupportedAction(other.to_string())),
    }
}

pub fn parse_locator(value: &str, element: &str) -> Result<Locator, TransformError> {
    let raw = split_directive(value)?;
    let argument = match raw.argument.map(str::trim) {
        Some(argument) if !argument.is_empty() => argument,
        _ if !matches!(raw.name, "Match" | "Condition" | "XPath") => {
            return Err(TransformError::UnsupportedLocator(raw.name.to_string()));
        }
        _ => {
            return Err(TransformError::InvalidDirective {
                value: value.to_string(),
                message: format!("{} needs an argument", raw.name),
            });
        }
    };

    match raw.name {
        "Match" => Ok(Locator::Match(name_list(value, argument)?)),
        "Condition" => Ok(Locator::Condition(expression(element, argument)?)),
        "XPath" => Ok(Locator::XPath(expression(element, argument)?)),
        other => Err(TransformError::UnsupportedLocator(other.to_string())),
    }
}
