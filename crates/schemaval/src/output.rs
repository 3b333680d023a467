//! Projections of the result tree into the standardized output formats.
//!
//! Formatting is pure: every projection reads the tree produced by a single
//! traversal and never re-evaluates. Serialized member order is fixed for
//! golden-file comparisons: `valid`, `evaluationPath`, `schemaLocation`,
//! `instanceLocation`, `errors`, `annotations`, `details`.
use std::str::FromStr;

use serde::ser::{SerializeMap, SerializeSeq};

use crate::result::{EvaluationNode, KeywordError};

/// The shape an evaluation report is projected into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single boolean.
    Flag,
    /// A flat, pre-order list of every unit carrying errors or annotations.
    #[default]
    Basic,
    /// The result tree with contentless passing interior nodes collapsed.
    Detailed,
    /// The full result tree, passing nodes included.
    Verbose,
}

impl FromStr for OutputFormat {
    type Err = UnknownOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flag" => Ok(OutputFormat::Flag),
            "basic" => Ok(OutputFormat::Basic),
            "detailed" => Ok(OutputFormat::Detailed),
            "verbose" => Ok(OutputFormat::Verbose),
            _ => Err(UnknownOutputFormat(s.to_string())),
        }
    }
}

/// A string that names no output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutputFormat(String);

impl std::fmt::Display for UnknownOutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' is not an output format (expected flag, basic, detailed or verbose)",
            self.0
        )
    }
}

impl std::error::Error for UnknownOutputFormat {}

/// The `flag` projection: validity and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagOutput {
    valid: bool,
}

impl FlagOutput {
    pub(crate) fn new(valid: bool) -> Self {
        FlagOutput { valid }
    }
    #[must_use]
    pub fn valid(&self) -> bool {
        self.valid
    }
}

impl serde::Serialize for FlagOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("valid", &self.valid)?;
        map.end()
    }
}

/// The `basic` projection: a flat pre-order list of output units.
#[derive(Debug, Clone, Copy)]
pub struct BasicOutput<'a> {
    root: &'a EvaluationNode,
}

impl<'a> BasicOutput<'a> {
    pub(crate) fn new(root: &'a EvaluationNode) -> Self {
        BasicOutput { root }
    }
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }
    /// The units of this output: every node carrying errors or annotations,
    /// in pre-order.
    #[must_use]
    pub fn units(&self) -> Vec<&'a EvaluationNode> {
        let mut units = Vec::new();
        collect_units(self.root, &mut units);
        units
    }
}

fn collect_units<'a>(node: &'a EvaluationNode, out: &mut Vec<&'a EvaluationNode>) {
    if !node.errors().is_empty() || !node.annotations().is_empty() {
        out.push(node);
    }
    for child in node.children() {
        collect_units(child, out);
    }
}

impl serde::Serialize for BasicOutput<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let units = self.units();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.root.valid())?;
        if !units.is_empty() {
            map.serialize_entry("details", &Units(&units))?;
        }
        map.end()
    }
}

struct Units<'a>(&'a [&'a EvaluationNode]);

impl serde::Serialize for Units<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for unit in self.0 {
            seq.serialize_element(&Unit(unit))?;
        }
        seq.end()
    }
}

struct Unit<'a>(&'a EvaluationNode);

impl serde::Serialize for Unit<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        serialize_common(&mut map, self.0)?;
        map.end()
    }
}

fn serialize_common<M: SerializeMap>(map: &mut M, node: &EvaluationNode) -> Result<(), M::Error> {
    map.serialize_entry("valid", &node.valid())?;
    map.serialize_entry("evaluationPath", node.evaluation_path())?;
    map.serialize_entry("schemaLocation", node.schema_location().as_str())?;
    map.serialize_entry("instanceLocation", node.instance_location())?;
    if !node.errors().is_empty() {
        map.serialize_entry("errors", &Errors(node.errors()))?;
    }
    if !node.annotations().is_empty() {
        map.serialize_entry("annotations", &Annotations(node))?;
    }
    Ok(())
}

struct Errors<'a>(&'a [KeywordError]);

impl serde::Serialize for Errors<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for error in self.0 {
            seq.serialize_element(&ErrorEntry(error))?;
        }
        seq.end()
    }
}

struct ErrorEntry<'a>(&'a KeywordError);

impl serde::Serialize for ErrorEntry<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if !self.0.keyword().is_empty() {
            map.serialize_entry("keyword", self.0.keyword())?;
        }
        map.serialize_entry("message", self.0.message())?;
        map.end()
    }
}

struct Annotations<'a>(&'a EvaluationNode);

impl serde::Serialize for Annotations<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let annotations = self.0.annotations();
        let mut map = serializer.serialize_map(Some(annotations.len()))?;
        for (keyword, value) in annotations {
            map.serialize_entry(keyword.as_ref(), value)?;
        }
        map.end()
    }
}

/// The `detailed` projection: the result tree with collapsing applied.
///
/// A node whose children are all valid and which carries neither errors nor
/// annotations is replaced by its children; a contentless leaf disappears.
#[derive(Debug, Clone, Copy)]
pub struct DetailedOutput<'a> {
    root: &'a EvaluationNode,
}

impl<'a> DetailedOutput<'a> {
    pub(crate) fn new(root: &'a EvaluationNode) -> Self {
        DetailedOutput { root }
    }
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }
}

impl serde::Serialize for DetailedOutput<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Node {
            node: self.root,
            collapse: true,
        }
        .serialize(serializer)
    }
}

/// The `verbose` projection: the full result tree, passes included.
#[derive(Debug, Clone, Copy)]
pub struct VerboseOutput<'a> {
    root: &'a EvaluationNode,
}

impl<'a> VerboseOutput<'a> {
    pub(crate) fn new(root: &'a EvaluationNode) -> Self {
        VerboseOutput { root }
    }
    #[must_use]
    pub fn valid(&self) -> bool {
        self.root.valid()
    }
}

impl serde::Serialize for VerboseOutput<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Node {
            node: self.root,
            collapse: false,
        }
        .serialize(serializer)
    }
}

struct Node<'a> {
    node: &'a EvaluationNode,
    collapse: bool,
}

fn collapsed<'a>(node: &'a EvaluationNode, out: &mut Vec<&'a EvaluationNode>) {
    for child in node.children() {
        if child.errors().is_empty()
            && child.annotations().is_empty()
            && child.children().iter().all(EvaluationNode::valid)
        {
            collapsed(child, out);
        } else {
            out.push(child);
        }
    }
}

impl serde::Serialize for Node<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        serialize_common(&mut map, self.node)?;
        let children: Vec<&EvaluationNode> = if self.collapse {
            let mut out = Vec::new();
            collapsed(self.node, &mut out);
            out
        } else {
            self.node.children().iter().collect()
        };
        if !children.is_empty() {
            map.serialize_entry(
                "details",
                &Details {
                    children: &children,
                    collapse: self.collapse,
                },
            )?;
        }
        map.end()
    }
}

struct Details<'a> {
    children: &'a [&'a EvaluationNode],
    collapse: bool,
}

impl serde::Serialize for Details<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.children.len()))?;
        for child in self.children {
            seq.serialize_element(&Node {
                node: child,
                collapse: self.collapse,
            })?;
        }
        seq.end()
    }
}
