use super::types::{CitationItemSet, Expectation, TestCase};

/// Label given to a locator that has none.
pub const DEFAULT_LOCATOR_LABEL: &str = "page";

/// Normalizes one test case in place.
pub fn normalize_case(case: &mut TestCase) {
    if let Some(expect) = case.expect.as_mut() {
        trim_expectation(expect);
    }
    if let Some(items) = case.single.as_mut() {
        backfill_labels(items);
    }
    for cluster in case.sequence.iter_mut().flatten() {
        backfill_labels(cluster);
    }
}

pub fn trim_expectation(expect: &mut Expectation) {
    match expect {
        Expectation::Text(text) => trim_in_place(text),
        Expectation::Sequence(lines) => lines.iter_mut().for_each(trim_in_place),
    }
}

/// Gives every locator-bearing item without a label the default label.
pub fn backfill_labels(items: &mut CitationItemSet) {
    for item in items.iter_mut() {
        if item.locator.is_some() && item.label.is_none() {
            item.label = Some(DEFAULT_LOCATOR_LABEL.to_string());
        }
    }
}

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::types::CitationItemRef;

    #[test]
    fn test_expect_is_trimmed() {
        let mut case = TestCase::new("t").with_expect("  X  ");
        normalize_case(&mut case);
        assert_eq!(case.expect, Some(Expectation::from("X")));

        let mut case = TestCase::new("t").with_expect(vec!["  a ", " b"]);
        normalize_case(&mut case);
        assert_eq!(case.expect, Some(Expectation::from(vec!["a", "b"])));

        let mut case = TestCase::new("t");
        normalize_case(&mut case);
        assert_eq!(case.expect, None);
    }

    #[test]
    fn test_label_backfill() {
        let mut case = TestCase::new("t").with_single(vec![
            CitationItemRef::new("r1").with_locator("5"),
            CitationItemRef::new("r2").with_locator("3").with_label("section"),
            CitationItemRef::new("r3"),
        ]);
        normalize_case(&mut case);

        let items = case.single.unwrap();
        assert_eq!(items[0], CitationItemRef::new("r1").with_locator("5").with_label("page"));
        assert_eq!(items[1].label.as_deref(), Some("section"));
        assert_eq!(items[2].label, None);
    }

    #[test]
    fn test_label_backfill_reaches_every_cluster() {
        let mut case = TestCase::new("t").with_sequence(vec![
            vec![CitationItemRef::new("a")],
            vec![CitationItemRef::new("b").with_locator("12")],
        ]);
        normalize_case(&mut case);

        let clusters = case.sequence.unwrap();
        assert_eq!(clusters[0][0].label, None);
        assert_eq!(clusters[1][0].label.as_deref(), Some("page"));
    }
}
