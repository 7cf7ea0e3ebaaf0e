//! Schema validation.
//!
//! Each check focuses on a single concern and reports into a
//! [`ValidationReport`]. Errors make a schema unbuildable; warnings and
//! suggestions are advisory.

use std::collections::{HashMap, HashSet, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{SchemaError, SourceContext};
use crate::schema::parser::{parse_schema, GroupDecl, ProductionDecl, SchemaDecl, SlotTarget};
use crate::schema::{Production, Slot};
use crate::syntax::Kind;

// literal pattern
static SNAKE_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").unwrap());

// =====================
// Report
// =====================

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<SchemaError>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

pub trait ValidationReporter {
    fn report_error(&mut self, error: SchemaError);
    fn report_warning(&mut self, message: impl Into<String>);
    fn report_suggestion(&mut self, message: impl Into<String>);
}

impl ValidationReporter for ValidationReport {
    fn report_error(&mut self, error: SchemaError) {
        self.errors.push(error);
    }
    fn report_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
    fn report_suggestion(&mut self, message: impl Into<String>) {
        self.suggestions.push(message.into());
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// =====================
// Public API
// =====================

/// Parses and validates schema text, returning every diagnostic. Only a
/// syntax error short-circuits.
pub fn validate_schema_str(name: &str, text: &str) -> Result<ValidationReport, SchemaError> {
    let decl = parse_schema(&SourceContext::from_file(name, text))?;
    Ok(validate(&decl).0)
}

/// Runs every check and returns the report together with the flattened
/// productions, in declaration order. The productions are only meaningful
/// when the report has no errors.
pub(crate) fn validate(decl: &SchemaDecl) -> (ValidationReport, Vec<Production>) {
    let mut report = ValidationReport::new();

    let declared = SchemaValidators::check_duplicate_productions(decl, &mut report);
    let mut groups = GroupExpander::new(&decl.groups, &mut report);
    groups.expand_all(&mut report);

    let productions = SchemaValidators::expand_productions(decl, &declared, &mut groups, &mut report);

    SchemaValidators::check_root(decl, &declared, &mut report);
    SchemaValidators::check_required_cycles(&productions, &mut report);
    SchemaValidators::check_reachability(decl, &productions, &mut report);
    SchemaValidators::check_unused_groups(decl, &mut report);
    SchemaValidators::check_naming(decl, &mut report);

    (report, productions)
}

// =====================
// Validators
// =====================

pub struct SchemaValidators;

impl SchemaValidators {
    /// Returns the first declaration of every production; later ones are errors.
    fn check_duplicate_productions<'d>(
        decl: &'d SchemaDecl,
        report: &mut ValidationReport,
    ) -> HashMap<&'d str, &'d ProductionDecl> {
        let mut declared = HashMap::new();
        for production in &decl.productions {
            if declared.contains_key(production.name.as_str()) {
                report.report_error(SchemaError::DuplicateProduction {
                    name: production.name.clone(),
                    line: production.line,
                });
                continue;
            }
            declared.insert(production.name.as_str(), production);
        }
        declared
    }

    /// Flattens every production's slot list, checking kinds and duplicates.
    fn expand_productions(
        decl: &SchemaDecl,
        declared: &HashMap<&str, &ProductionDecl>,
        groups: &mut GroupExpander<'_>,
        report: &mut ValidationReport,
    ) -> Vec<Production> {
        let mut productions = Vec::with_capacity(declared.len());

        for production in &decl.productions {
            let is_first = declared
                .get(production.name.as_str())
                .is_some_and(|first| std::ptr::eq(*first, production));
            if !is_first {
                continue;
            }

            let name = Kind::new(&production.name);
            if production.token {
                productions.push(Production::new(name, true, Vec::new()));
                continue;
            }

            let mut slots: Vec<Slot> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();
            let mut undeclared: HashSet<String> = HashSet::new();

            for slot in &production.slots {
                let kinds = match &slot.target {
                    SlotTarget::Kind(kind) => vec![kind.clone()],
                    SlotTarget::Group(group) => match groups.expanded(group) {
                        Some(kinds) => kinds.to_vec(),
                        None => {
                            report.report_error(SchemaError::UndeclaredGroup {
                                owner: production.name.clone(),
                                group: group.clone(),
                            });
                            continue;
                        }
                    },
                };

                for kind in kinds {
                    if !declared.contains_key(kind.as_str()) {
                        if undeclared.insert(kind.clone()) {
                            report.report_error(SchemaError::UndeclaredKind {
                                production: production.name.clone(),
                                kind,
                            });
                        }
                        continue;
                    }
                    if !seen.insert(kind.clone()) {
                        report.report_error(SchemaError::DuplicateSlot {
                            production: production.name.clone(),
                            kind,
                        });
                        continue;
                    }
                    slots.push(Slot {
                        kind: Kind::new(&kind),
                        cardinality: slot.cardinality,
                    });
                }
            }

            productions.push(Production::new(name, false, slots));
        }

        productions
    }

    /// The root must be declared once and name a node production.
    fn check_root(
        decl: &SchemaDecl,
        declared: &HashMap<&str, &ProductionDecl>,
        report: &mut ValidationReport,
    ) {
        let Some((root, extra)) = decl.roots.split_first() else {
            report.report_error(SchemaError::MissingRoot);
            return;
        };

        for ignored in extra {
            report.report_warning(format!(
                "root '{}' on line {} ignored; '{}' is already the root",
                ignored.value, ignored.line, root.value
            ));
        }

        match declared.get(root.value.as_str()) {
            Some(production) if !production.token => {}
            _ => report.report_error(SchemaError::UnknownRoot {
                root: root.value.clone(),
            }),
        }
    }

    /// A chain of required slots leading back to its start can never be closed
    /// by a finite tree.
    fn check_required_cycles(productions: &[Production], report: &mut ValidationReport) {
        let by_name: HashMap<&str, &Production> =
            productions.iter().map(|p| (p.name().as_str(), p)).collect();
        let mut done: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();

        for production in productions {
            Self::walk_required(production.name().as_str(), &by_name, &mut done, &mut path, report);
        }
    }

    fn walk_required<'p>(
        name: &'p str,
        by_name: &HashMap<&'p str, &'p Production>,
        done: &mut HashSet<&'p str>,
        path: &mut Vec<&'p str>,
        report: &mut ValidationReport,
    ) {
        if done.contains(name) {
            return;
        }
        if let Some(start) = path.iter().position(|p| *p == name) {
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(name);
            report.report_error(SchemaError::RequiredCycle {
                cycle: cycle.join(" -> "),
            });
            return;
        }
        let Some(&production) = by_name.get(name) else {
            return;
        };

        path.push(name);
        for slot in production.required_slots() {
            Self::walk_required(slot.kind.as_str(), by_name, done, path, report);
        }
        path.pop();
        done.insert(name);
    }

    /// Productions no tree rooted at the root can contain.
    fn check_reachability(
        decl: &SchemaDecl,
        productions: &[Production],
        report: &mut ValidationReport,
    ) {
        let Some(root) = decl.roots.first() else {
            return;
        };
        let by_name: HashMap<&str, &Production> =
            productions.iter().map(|p| (p.name().as_str(), p)).collect();
        if !by_name.contains_key(root.value.as_str()) {
            return;
        }

        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([root.value.as_str()]);
        while let Some(name) = queue.pop_front() {
            if !reached.insert(name) {
                continue;
            }
            if let Some(production) = by_name.get(name) {
                queue.extend(production.slots().iter().map(|s| s.kind.as_str()));
            }
        }

        for production in productions {
            if reached.contains(production.name().as_str()) {
                continue;
            }
            report.report_warning(format!(
                "production '{}' is unreachable from root '{}'",
                production.name(),
                root.value
            ));
        }
    }

    /// Groups no production splices, directly or through another group.
    fn check_unused_groups(decl: &SchemaDecl, report: &mut ValidationReport) {
        let by_name: HashMap<&str, &GroupDecl> =
            decl.groups.iter().map(|g| (g.name.as_str(), g)).collect();
        let mut used: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = decl
            .productions
            .iter()
            .flat_map(|p| p.slots.iter())
            .filter_map(|s| match &s.target {
                SlotTarget::Group(group) => Some(group.as_str()),
                SlotTarget::Kind(_) => None,
            })
            .collect();

        while let Some(name) = queue.pop_front() {
            if !used.insert(name) {
                continue;
            }
            if let Some(group) = by_name.get(name) {
                queue.extend(group.items.iter().filter_map(|item| match item {
                    SlotTarget::Group(inner) => Some(inner.as_str()),
                    SlotTarget::Kind(_) => None,
                }));
            }
        }

        for group in &decl.groups {
            if !used.contains(group.name.as_str()) {
                report.report_warning(format!(
                    "group '{}' (line {}) is never spliced",
                    group.name, group.line
                ));
            }
        }
    }

    /// Accessor names derive from kind names, so they should be snake_case.
    fn check_naming(decl: &SchemaDecl, report: &mut ValidationReport) {
        let names = decl
            .productions
            .iter()
            .map(|p| (p.name.as_str(), p.line, "production"))
            .chain(decl.groups.iter().map(|g| (g.name.as_str(), g.line, "group")));

        for (name, line, what) in names {
            if SNAKE_CASE.is_match(name) {
                continue;
            }
            report.report_suggestion(format!(
                "{what} '{name}' (line {line}) is not snake_case"
            ));
        }
    }
}

// =====================
// Group expansion
// =====================

/// Expands groups into flat kind lists, memoized, detecting self-inclusion.
struct GroupExpander<'d> {
    groups: HashMap<&'d str, &'d GroupDecl>,
    expanded: HashMap<&'d str, Vec<String>>,
}

impl<'d> GroupExpander<'d> {
    /// Indexes groups by name; a redeclared group is an error and only the
    /// first declaration is expanded.
    fn new(groups: &'d [GroupDecl], report: &mut ValidationReport) -> Self {
        let mut by_name = HashMap::new();
        for group in groups {
            if by_name.contains_key(group.name.as_str()) {
                report.report_error(SchemaError::DuplicateGroup {
                    name: group.name.clone(),
                    line: group.line,
                });
                continue;
            }
            by_name.insert(group.name.as_str(), group);
        }
        Self {
            groups: by_name,
            expanded: HashMap::new(),
        }
    }

    fn expand_all(&mut self, report: &mut ValidationReport) {
        let mut names: Vec<(&'d str, usize)> = self
            .groups
            .values()
            .map(|&g| (g.name.as_str(), g.line))
            .collect();
        names.sort_by_key(|(_, line)| *line);
        for (name, _) in names {
            let mut stack = Vec::new();
            self.expand(name, &mut stack, report);
        }
    }

    /// Kinds of an already-expanded group, `None` when undeclared.
    fn expanded(&self, name: &str) -> Option<&[String]> {
        self.expanded.get(name).map(Vec::as_slice)
    }

    fn expand(&mut self, name: &'d str, stack: &mut Vec<&'d str>, report: &mut ValidationReport) -> Vec<String> {
        if let Some(kinds) = self.expanded.get(name) {
            return kinds.clone();
        }
        if stack.contains(&name) {
            report.report_error(SchemaError::RecursiveGroup {
                group: name.to_string(),
            });
            return Vec::new();
        }
        let Some(group) = self.groups.get(name).copied() else {
            return Vec::new();
        };

        stack.push(name);
        let mut kinds = Vec::new();
        for item in &group.items {
            match item {
                SlotTarget::Kind(kind) => kinds.push(kind.clone()),
                SlotTarget::Group(inner) if self.groups.contains_key(inner.as_str()) => {
                    kinds.extend(self.expand(inner.as_str(), stack, report));
                }
                SlotTarget::Group(inner) => report.report_error(SchemaError::UndeclaredGroup {
                    owner: name.to_string(),
                    group: inner.clone(),
                }),
            }
        }
        stack.pop();

        self.expanded.insert(name, kinds.clone());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Cardinality;

    fn report(text: &str) -> ValidationReport {
        validate_schema_str("test.schema", text).unwrap()
    }

    #[test]
    fn test_undeclared_kind_is_error() {
        let report = report("root a;\nnode a { b!; }\n");
        assert!(!report.is_valid());
        assert!(matches!(
            &report.errors[0],
            SchemaError::UndeclaredKind { production, kind } if production == "a" && kind == "b"
        ));
    }

    #[test]
    fn test_duplicate_slot_through_groups() {
        let report = report("root a;\ntoken x;\ngroup g = x;\nnode a { x?; ..g*; }\n");
        assert!(matches!(
            &report.errors[0],
            SchemaError::DuplicateSlot { kind, .. } if kind == "x"
        ));
    }

    #[test]
    fn test_recursive_group_is_error() {
        let report = report("root a;\ntoken x;\ngroup g = x, ..h;\ngroup h = ..g;\nnode a { ..g*; }\n");
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::RecursiveGroup { .. })));
    }

    #[test]
    fn test_required_cycle_is_error() {
        let report = report("root a;\nnode a { b!; }\nnode b { a!; }\n");
        let cycle = report.errors.iter().find_map(|e| match e {
            SchemaError::RequiredCycle { cycle } => Some(cycle.clone()),
            _ => None,
        });
        assert_eq!(cycle.as_deref(), Some("a -> b -> a"));
    }

    #[test]
    fn test_optional_self_reference_is_fine() {
        let report = report("root a;\ntoken x;\nnode a { a?; x!; }\n");
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_root_checks() {
        assert!(matches!(report("token x;\n").errors[0], SchemaError::MissingRoot));
        assert!(matches!(
            &report("root x;\ntoken x;\n").errors[0],
            SchemaError::UnknownRoot { root } if root == "x"
        ));
    }

    #[test]
    fn test_unreachable_and_unused_are_warnings() {
        let report = report("root a;\ntoken x;\ntoken y;\ngroup spare = y;\nnode a { x*; }\n");
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("'y' is unreachable")));
        assert!(report.warnings.iter().any(|w| w.contains("group 'spare'")));
    }

    #[test]
    fn test_naming_suggestion() {
        let report = report("root a;\ntoken OrOp;\nnode a { OrOp!; }\n");
        assert!(report.is_valid());
        assert_eq!(report.suggestions.len(), 1);
        assert!(report.suggestions[0].contains("'OrOp'"));
    }

    #[test]
    fn test_duplicate_production_is_error() {
        let report = report("root a;\ntoken x;\ntoken x;\nnode a { x!; }\n");
        assert!(matches!(
            &report.errors[0],
            SchemaError::DuplicateProduction { name, line: 3 } if name == "x"
        ));
    }

    #[test]
    fn test_duplicate_group_is_error() {
        let report = report("root a;\ntoken x;\ntoken y;\ngroup g = x;\ngroup g = y;\nnode a { ..g*; }\n");
        assert!(!report.is_valid());
        assert!(matches!(
            &report.errors[0],
            SchemaError::DuplicateGroup { name, line: 5 } if name == "g"
        ));
    }

    #[test]
    fn test_cardinality_is_kept_through_expansion() {
        let decl = parse_schema(&SourceContext::from_file(
            "t",
            "root a;\ntoken x;\ntoken y;\ngroup g = x, y;\nnode a { ..g*; }\n",
        ))
        .unwrap();
        let (_, productions) = validate(&decl);
        let a = productions.iter().find(|p| p.name() == "a").unwrap();
        assert!(a.slots().iter().all(|s| s.cardinality == Cardinality::Repeated));
        assert_eq!(a.slots().len(), 2);
    }
}
