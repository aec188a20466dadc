use indexmap::map::Entry;
use indexmap::IndexMap;

use super::types::{TestCase, TestSuiteUnit};

/// An ordered, override-aware collection of suite units.
///
/// Units are keyed by `describe`, tests inside a unit by `name`. Both levels
/// go through an insertion-ordered map, so overlaying replaces an existing
/// entry where it stands and appends a new one at the end.
///
/// An overriding test keeps the position of the test it replaces. Authors who
/// expect an override to move the test to its new document position will be
/// surprised; ordering only ever reflects first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    units: IndexMap<String, TestSuiteUnit>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a corpus from the units of one document.
    ///
    /// Repeated `describe` labels or test names inside the document collapse
    /// the same way they would across documents.
    pub fn from_units(units: impl IntoIterator<Item = TestSuiteUnit>) -> Self {
        let mut corpus = Self::new();
        for unit in units {
            corpus.merge_unit(unit);
        }
        corpus
    }

    /// Units in order of first appearance.
    pub fn units(&self) -> impl ExactSizeIterator<Item = &TestSuiteUnit> {
        self.units.values()
    }

    pub fn units_mut(&mut self) -> impl ExactSizeIterator<Item = &mut TestSuiteUnit> {
        self.units.values_mut()
    }

    pub fn unit(&self, describe: &str) -> Option<&TestSuiteUnit> {
        self.units.get(describe)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn tests(&self) -> impl Iterator<Item = (&TestSuiteUnit, &TestCase)> {
        self.units
            .values()
            .flat_map(|unit| unit.tests.iter().map(move |case| (unit, case)))
    }

    /// Folds a later corpus into this one.
    pub fn merge(&mut self, other: Corpus) {
        for unit in other.units.into_values() {
            self.merge_unit(unit);
        }
    }

    /// Folds one unit in: same-label units overlay their tests, new labels append.
    pub fn merge_unit(&mut self, unit: TestSuiteUnit) {
        match self.units.entry(unit.describe.clone()) {
            Entry::Occupied(mut slot) => overlay_unit(slot.get_mut(), unit),
            Entry::Vacant(slot) => {
                let mut fresh = TestSuiteUnit::new(unit.describe.clone());
                overlay_unit(&mut fresh, unit);
                slot.insert(fresh);
            }
        }
    }
}

fn overlay_unit(existing: &mut TestSuiteUnit, incoming: TestSuiteUnit) {
    existing.extra.extend(incoming.extra);
    overlay_tests(&mut existing.tests, incoming.tests);
}

/// Replaces same-named tests in place and appends new ones.
fn overlay_tests(existing: &mut Vec<TestCase>, incoming: Vec<TestCase>) {
    let ordered: IndexMap<String, TestCase> = existing
        .drain(..)
        .chain(incoming)
        .map(|case| (case.name.clone(), case))
        .collect();
    *existing = ordered.into_values().collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(describe: &str, tests: Vec<TestCase>) -> TestSuiteUnit {
        let mut unit = TestSuiteUnit::new(describe);
        unit.tests = tests;
        unit
    }

    fn case(name: &str, expect: &str) -> TestCase {
        TestCase::new(name).with_expect(expect)
    }

    #[test]
    fn test_override_keeps_position_and_appends_new() {
        let mut corpus = Corpus::from_units(vec![unit("X", vec![case("t1", "a")])]);
        corpus.merge(Corpus::from_units(vec![unit(
            "X",
            vec![case("t1", "b"), case("t2", "c")],
        )]));

        let units: Vec<_> = corpus.units().cloned().collect();
        assert_eq!(units, vec![unit("X", vec![case("t1", "b"), case("t2", "c")])]);
    }

    #[test]
    fn test_override_does_not_move_the_test() {
        let mut corpus = Corpus::from_units(vec![unit(
            "X",
            vec![case("t1", "a"), case("t2", "b")],
        )]);
        corpus.merge(Corpus::from_units(vec![unit(
            "X",
            vec![case("t3", "c"), case("t1", "z")],
        )]));

        let x = corpus.unit("X").unwrap();
        let names: Vec<_> = x.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t1", "t2", "t3"]);
        assert_eq!(x.tests[0], case("t1", "z"));
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let original = Corpus::from_units(vec![
            unit("A", vec![case("t1", "a"), case("t2", "b")]),
            unit("B", vec![case("t1", "c")]),
        ]);
        let mut merged = original.clone();
        merged.merge(original.clone());
        assert_eq!(merged, original);
        let labels: Vec<_> = merged.units().map(|u| u.describe.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn test_unit_order_is_first_appearance() {
        let mut corpus = Corpus::from_units(vec![unit("A", vec![]), unit("B", vec![])]);
        corpus.merge(Corpus::from_units(vec![
            unit("C", vec![]),
            unit("A", vec![case("late", "x")]),
        ]));

        let labels: Vec<_> = corpus.units().map(|u| u.describe.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(corpus.unit("A").unwrap().tests.len(), 1);
    }

    #[test]
    fn test_duplicates_inside_one_document_collapse() {
        let corpus = Corpus::from_units(vec![
            unit("A", vec![case("t", "first"), case("t", "second")]),
            unit("A", vec![case("u", "x")]),
        ]);
        assert_eq!(corpus.units().len(), 1);
        assert_eq!(
            corpus.unit("A").unwrap().tests,
            vec![case("t", "second"), case("u", "x")]
        );
    }
}
