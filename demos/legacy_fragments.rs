use ruletree::{evaluate, validate_node, Engine, EngineConfig, LeafMode, Node, Record};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ruletree=info".into()),
        )
        .init();

    // Trees persisted by the older build mode keep raw comparison text.
    let stored = r#"{
        "type": "operator", "value": "AND",
        "left": {"type": "operand", "value": "age > 30"},
        "right": {"type": "operand", "value": "custom_function(salary)"}
    }"#;
    let node = Node::from_json(stored).expect("failed to decode legacy tree");
    println!("decoded: {node}");
    println!("valid: {:?}", validate_node(&node));

    let record = Record::new().set("age", 41_i64).set("salary", "1500.0");
    println!("eval: {:?}", evaluate(&node, &record));

    let hostile = Node::Operand("__import__('os').system('true')".into());
    println!("hostile: {:?}", evaluate(&hostile, &record));

    let engine = Engine::new(EngineConfig::default().with_leaf_mode(LeafMode::Fragment));
    let rebuilt = engine
        .build("age > 30 AND department == 'IT'")
        .expect("failed to build rule");
    println!("fragment mode: {}", rebuilt.to_json().expect("failed to encode"));
}
