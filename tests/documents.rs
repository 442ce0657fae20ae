//! Integration tests over the document fixtures.

use std::path::{Path, PathBuf};

use reqkit::{
    Data, Document, LabelExpression, StatementType, Syntax, export::to_reqsml, storage,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(ToString::to_string).collect())
}

#[test]
fn reqsml_fixture_is_canonical() {
    let path = fixture("valid.requirements");
    let text = std::fs::read_to_string(&path).unwrap();
    let document = storage::load(&path).unwrap();

    let exported = to_reqsml(&document);
    assert_eq!(exported, text);

    let reparsed = Document::parse(&path, Syntax::ReqsMl, &exported).unwrap();
    assert_eq!(reparsed, document);
}

#[test]
fn reqsml_fixture_model() {
    let document = storage::load(&fixture("valid.requirements")).unwrap();
    assert_eq!(document.syntax, Syntax::ReqsMl);
    assert_eq!(document.requirements.len(), 4);

    let adding = &document.requirements[0];
    assert_eq!(adding.identifier.as_deref(), Some("calc-1"));
    assert_eq!(
        adding.comments,
        strings(&["Arithmetic requirements for the calculator."])
    );
    assert_eq!(adding.examples[0].identifier.as_deref(), Some("add-basic"));
    assert_eq!(adding.examples[0].labels, strings(&["maths", "core"]));
    assert_eq!(adding.examples[1].labels, strings(&["edge", "maths", "core"]));
    assert_eq!(adding.examples[1].explicit_labels, strings(&["edge"]));
    let kinds: Vec<_> = adding.examples[1]
        .statements
        .iter()
        .map(|statement| statement.kind)
        .collect();
    assert_eq!(
        kinds,
        [
            StatementType::If,
            StatementType::If,
            StatementType::When,
            StatementType::Expect
        ]
    );

    let history = &document.requirements[1].examples[0];
    let table = history.statements[0].data.as_ref().and_then(Data::as_table).unwrap();
    assert_eq!(table[1]["result"], "20");
    assert_eq!(
        history.statements[2].data,
        Some(Data::Text("2 + 3 = 5\n\n4 * 5 = 20".to_string()))
    );

    let multiplying = &document.requirements[2];
    assert_eq!(multiplying.examples.len(), 3);
    let large = &multiplying.examples[1];
    assert_eq!(large.identifier.as_deref(), Some("large"));
    assert_eq!(large.labels, strings(&["x", "table", "slow"]));
    assert_eq!(large.description.as_deref(), Some("multiplying 100 by 200"));
    assert_eq!(large.statements[1].description, "the product is 20000");
    let settings = &multiplying.examples[2];
    let pairs = settings.statements[0]
        .data
        .as_ref()
        .and_then(Data::as_key_values)
        .unwrap();
    assert_eq!(pairs["mode"], "degrees");
    let grid = settings.statements[1]
        .data
        .as_ref()
        .and_then(Data::as_matrix)
        .unwrap();
    assert_eq!(grid["pi"]["cos"], "-1");

    let division = &document.requirements[3];
    let descriptions: Vec<_> = division
        .examples
        .iter()
        .map(|example| example.description.as_deref())
        .collect();
    assert_eq!(descriptions, [Some("whole division"), Some("decimal division")]);
    assert_eq!(division.examples[1].statements[1].description, "0.25");
}

#[test]
fn gherkin_fixture_model() {
    let document = storage::load(&fixture("valid.feature")).unwrap();
    assert_eq!(document.syntax, Syntax::Gherkin);
    assert_eq!(document.description.as_deref(), Some("Shopping basket"));
    assert_eq!(document.comments, strings(&["Shopping basket behaviour"]));
    assert_eq!(document.labels, strings(&["shop"]));
    assert_eq!(document.requirements.len(), 2);

    let discounts = &document.requirements[0];
    assert_eq!(discounts.labels, strings(&["pricing", "shop"]));
    assert_eq!(discounts.explicit_labels, strings(&["pricing"]));
    let labels: Vec<_> = discounts
        .examples
        .iter()
        .map(|example| example.labels.clone())
        .collect();
    assert_eq!(
        labels,
        [
            strings(&["fast", "pricing", "shop"]),
            strings(&["pricing", "shop"]),
            strings(&["large", "pricing", "shop"]),
        ]
    );
    let big = &discounts.examples[2];
    assert_eq!(big.description.as_deref(), Some("big"));
    assert_eq!(big.statements[0].description, "a basket worth 200");
    assert_eq!(big.statements[2].description, "they pay 180");
    assert_eq!(big.statements[2].line, Some(18));

    let contents = &document.requirements[1];
    assert_eq!(contents.labels, strings(&["shop"]));
    let statements = &contents.examples[0].statements;
    let kinds: Vec<_> = statements.iter().map(|statement| statement.kind).collect();
    assert_eq!(
        kinds,
        [
            StatementType::If,
            StatementType::If,
            StatementType::When,
            StatementType::Expect,
            StatementType::Expect
        ]
    );
    let products = statements[1].data.as_ref().and_then(Data::as_table).unwrap();
    assert_eq!(products[0]["price"], "1");
    assert_eq!(statements[3].data, Some(Data::Text("apple".to_string())));
}

#[test]
fn gherkin_exports_to_parseable_reqsml() {
    let document = storage::load(&fixture("valid.feature")).unwrap();
    let exported = to_reqsml(&document);
    let reqsml = Document::parse("basket.requirements", Syntax::ReqsMl, &exported).unwrap();

    assert_eq!(reqsml.requirements.len(), document.requirements.len());
    for (exported, original) in reqsml.requirements.iter().zip(&document.requirements) {
        assert_eq!(exported.description, original.description);
        assert_eq!(exported.explicit_labels, original.explicit_labels);
        assert_eq!(exported.examples.len(), original.examples.len());
        for (exported, original) in exported.examples.iter().zip(&original.examples) {
            assert_eq!(exported.description, original.description);
            assert_eq!(exported.statements, original.statements);
        }
    }
}

#[test]
fn discovers_fixtures() {
    let paths = storage::discover(&fixture(""));
    assert_eq!(
        paths,
        [fixture("valid.feature"), fixture("valid.requirements")]
    );
    assert!(storage::load_all(&paths).iter().all(Result::is_ok));
}

#[test]
fn label_expressions_select_cases() {
    let document = storage::load(&fixture("valid.feature")).unwrap();
    let filter: LabelExpression = "pricing and not large".parse().unwrap();
    let selected: Vec<_> = document
        .cases(Some(&filter))
        .filter(|case| case.included)
        .map(|case| case.test_name())
        .collect();
    assert_eq!(selected, ["TenPercentOff", "Small"]);

    let nothing = LabelExpression::label("missing");
    assert!(!document.has_included_examples(Some(&nothing)));
}

#[test]
fn reports_the_failing_line() {
    let text = "Requirement: R\n  If: <a>\n  Examples:\n    | a   |\n    | --- |\n    | 1   | 2   |\n";
    let error = Document::parse("bad.requirements", Syntax::ReqsMl, text).unwrap_err();
    assert_eq!(error.line, 6);
    assert_eq!(error.kind, reqkit::ErrorKind::Validation);
}
