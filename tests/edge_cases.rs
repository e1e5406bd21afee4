use ruletree::{
    attr, combine, combine_nodes, evaluate, parse, BoolOp, Branch, CombineError, Engine,
    EngineConfig, MutationError, Node, ParseError, Record, RuleError, ValidationMode,
};

#[test]
fn single_comparison_round_trips() {
    let node = parse("experience == 0").unwrap();
    assert!(node.is_leaf());
    assert_eq!(node.depth(), 1);
    assert_eq!(Node::from_json(&node.to_json().unwrap()).unwrap(), node);
}

#[test]
fn unicode_string_literal() {
    let node = parse("department == 'Forschung & Entwicklung – München'").unwrap();
    assert_eq!(node, attr("department").eq("Forschung & Entwicklung – München"));

    let record = Record::new().set("department", "Forschung & Entwicklung – München");
    assert_eq!(evaluate(&node, &record), Ok(true));
    assert_eq!(Node::from_json(&node.to_json().unwrap()).unwrap(), node);
}

#[test]
fn unicode_outside_literal_is_rejected() {
    assert!(matches!(
        parse("âge > 3"),
        Err(ParseError::Syntax { position: 0, .. })
    ));
}

#[test]
fn empty_string_literal() {
    let node = parse("department == ''").unwrap();
    assert_eq!(evaluate(&node, &Record::new().set("department", "")), Ok(true));
}

#[test]
fn boolean_literal_round_trips() {
    let node = attr("age").eq(true);
    assert_eq!(node.to_string(), "age == True");
    assert_eq!(parse(&node.to_string()).unwrap(), node);
    assert_eq!(parse("age == False").unwrap(), attr("age").eq(false));
}

#[test]
fn extreme_integers() {
    let node = parse(&format!("age > {}", i64::MIN)).unwrap();
    assert_eq!(evaluate(&node, &Record::new().set("age", 0_i64)), Ok(true));
    assert!(matches!(
        parse("age > 9223372036854775808"),
        Err(ParseError::Syntax { .. })
    ));
}

#[test]
fn non_finite_record_values() {
    let node = parse("salary > 1").unwrap();
    let record = Record::new().set("salary", f64::NAN);
    assert_eq!(evaluate(&node, &record), Ok(false));

    let record = Record::new().set("age", f64::INFINITY);
    let node = parse("age > 1").unwrap();
    assert!(evaluate(&node, &record).is_err());
}

#[test]
fn combine_thousand_rules() {
    let rules: Vec<String> = (0..1000).map(|i| format!("age > {i}")).collect();
    let node = combine(&rules, BoolOp::Or).unwrap();
    assert_eq!(node.leaves().len(), 1000);
    assert_eq!(node.depth(), 1000);

    assert_eq!(evaluate(&node, &Record::new().set("age", 1_i64)), Ok(true));
    assert_eq!(evaluate(&node, &Record::new().set("age", 0_i64)), Ok(false));

    let json = node.to_json().unwrap();
    assert_eq!(Node::from_json(&json).unwrap(), node);
}

#[test]
fn hundred_thousand_leaf_chain() {
    let leaves: Vec<Node> = (0..100_000_i64).map(|i| attr("age").gt(i)).collect();
    let node = combine_nodes(leaves, BoolOp::And).unwrap();
    assert_eq!(node.depth(), 100_000);
    assert_eq!(node.leaves().len(), 100_000);

    let source = node.to_string();
    assert!(source.starts_with("age > 0 AND age > 1 AND "));
    assert!(source.ends_with(" AND age > 99999"));
    assert_eq!(evaluate(&node, &Record::new().set("age", 100_000_i64)), Ok(true));
    drop(node);
}

#[test]
fn combine_reports_first_bad_rule() {
    let err = combine(&["age > 1", "salary >= 2", "bogus"], BoolOp::And).unwrap_err();
    assert!(matches!(
        err,
        CombineError::InvalidRule {
            index: 1,
            source: ParseError::UnsupportedOperator { .. }
        }
    ));
}

#[test]
fn combine_does_not_consume_inputs() {
    let a = parse("age > 1").unwrap();
    let b = parse("age < 9").unwrap();
    let combined = combine_nodes([a.clone(), b.clone()], BoolOp::And).unwrap();
    assert_eq!(combined.left(), Some(&a));
    assert_eq!(combined.right(), Some(&b));
}

#[test]
fn complex_nested_rule() {
    let source = "((age > 30 AND department == 'Sales') OR (age < 25 AND department == 'Marketing')) \
                  AND (salary > 50000 OR experience > 5)";
    let node = parse(source).unwrap();
    assert_eq!(node.depth(), 4);

    let cases = [
        (35_i64, "Sales", 60_000.0, 1_i64, true),
        (35, "Sales", 10_000.0, 1, false),
        (35, "Sales", 10_000.0, 6, true),
        (22, "Marketing", 0.0, 9, true),
        (22, "Sales", 90_000.0, 9, false),
        (28, "Marketing", 90_000.0, 9, false),
    ];
    for (age, department, salary, experience, expected) in cases {
        let record = Record::new()
            .set("age", age)
            .set("department", department)
            .set("salary", salary)
            .set("experience", experience);
        assert_eq!(
            evaluate(&node, &record),
            Ok(expected),
            "age={age} department={department} salary={salary} experience={experience}"
        );
    }
}

#[test]
fn mutation_keeps_shape() {
    let mut node = parse("(age > 30 OR age < 20) AND department == 'IT'").unwrap();
    let depth = node.depth();
    node.set_operator_at(&[Branch::Left], BoolOp::And).unwrap();
    node.set_operand_at(&[Branch::Right], "department == 'HR'").unwrap();
    assert_eq!(node.depth(), depth);
    assert_eq!(node.to_string(), "age > 30 AND age < 20 AND department == 'HR'");

    assert_eq!(
        node.set_operand_at(&[Branch::Left], "age > 1"),
        Err(MutationError::NotAnOperandNode)
    );
    assert_eq!(
        node.set_operator_at(&[Branch::Right], BoolOp::Or),
        Err(MutationError::NotAnOperatorNode)
    );
}

#[test]
fn substring_engine_accepts_lookalikes_but_still_parses() {
    let engine = Engine::new(EngineConfig::default().with_validation(ValidationMode::Substring));
    assert!(engine.build("age_bracket > 3").is_ok());
    assert!(matches!(engine.build("nothing > 3"), Err(RuleError::Validation(_))));
    assert!(matches!(engine.build("salary >> 3"), Err(RuleError::Parse(_))));
}
