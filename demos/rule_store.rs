use std::sync::Arc;
use std::thread;

use ruletree::{BoolOp, Branch, RuleStore};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ruletree=debug".into()),
        )
        .init();

    let store = Arc::new(RuleStore::new());
    let senior = store
        .create_rule("age > 30 AND department == 'Sales'")
        .expect("failed to create rule");
    let paid = store
        .create_rule("salary > 50000 OR experience > 5")
        .expect("failed to create rule");
    let eligible = store
        .combine_rules(&[senior, paid], BoolOp::And)
        .expect("failed to combine rules");

    let handles: Vec<_> = (0..4_i64)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let data = json!({
                    "age": 28 + i * 2,
                    "department": "Sales",
                    "salary": 40_000 + i * 5_000,
                    "experience": 4,
                });
                let result = store.evaluate_rule_json(eligible, &data);
                println!("thread {i}: {result:?}");
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    store
        .modify_operand(eligible, &[Branch::Left, Branch::Left], "age > 25")
        .expect("failed to modify rule");
    store
        .modify_operator(eligible, &[Branch::Right], BoolOp::And)
        .expect("failed to modify rule");

    for rule in store.rules() {
        println!("#{}: {}", rule.id, rule.source);
    }
    if let Err(err) = store.get(99) {
        println!("lookup: {err}");
    }
}
