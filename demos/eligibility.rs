use ruletree::{combine, evaluate, parse, validate, BoolOp, Record, ValidationMode};

fn main() {
    let rule = parse("(age > 30 AND department == 'Sales') OR (age < 25 AND department == 'Marketing')")
        .expect("failed to parse rule");
    println!("rule: {rule}");

    let candidates = [
        ("alice", 35_i64, "Sales"),
        ("bob", 22, "Marketing"),
        ("carol", 28, "Sales"),
    ];
    for (name, age, department) in candidates {
        let record = Record::new().set("age", age).set("department", department);
        println!("  {name}: {:?}", evaluate(&rule, &record));
    }

    let combined = combine(
        &["age > 30", "salary > 50000", "experience > 5"],
        BoolOp::And,
    )
    .expect("failed to combine rules");
    println!("combined: {combined}");
    println!("json: {}", combined.to_json().expect("failed to encode"));

    for source in ["age_bracket > 3", "unknown_attr > 1"] {
        println!(
            "{source:?}: structural={:?} substring={:?}",
            validate(source, ValidationMode::Structural),
            validate(source, ValidationMode::Substring),
        );
    }
}
